//! Route handlers, one module per resource

pub mod alerts;
pub mod health;
pub mod nodes;
pub mod prices;
pub mod stats;
