use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use tracing::level_filters::LevelFilter;

const GRIDSPACE_PORT: &str = "GRIDSPACE_PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_port() -> Option<u16> {
    std::env::var(GRIDSPACE_PORT).ok()?.parse().ok()
}

const GRIDSPACE_ADDR: &str = "GRIDSPACE_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

pub fn get_default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(DEFAULT_ADDR), DEFAULT_PORT)
}

pub fn get_addr() -> Option<IpAddr> {
    std::env::var(GRIDSPACE_ADDR).ok()?.parse().ok()
}

const GRIDSPACE_TOKEN: &str = "GRIDSPACE_TOKEN";

pub fn get_token() -> Option<String> {
    std::env::var(GRIDSPACE_TOKEN).ok()
}

const GRIDSPACE_LOG: &str = "GRIDSPACE_LOG";

pub fn get_log_level() -> LevelFilter {
    std::env::var(GRIDSPACE_LOG)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::DEBUG)
}

/// Wall-clock time in Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
