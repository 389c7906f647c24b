use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_API_PORT: u16 = 8000;

/// Settings that affect how a program's built-ins reach the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Address `create_api` binds to.
    pub api_addr: SocketAddr,
    /// Whether console output is styled with ANSI colours.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_API_PORT)),
            color: true,
        }
    }
}

impl Config {
    pub fn with_api_addr(mut self, api_addr: SocketAddr) -> Self {
        self.api_addr = api_addr;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}
