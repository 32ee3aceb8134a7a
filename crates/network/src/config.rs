pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
    /// SOCKS5 proxy for relayer traffic; `None` connects directly.
    pub socks_addr: Option<String>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socks_addr: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }
}

impl Config {
    pub fn with_socks_addr(mut self, addr: &str) -> Self {
        self.socks_addr = Some(addr.to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn without_tls_verification(mut self) -> Self {
        self.verify_tls = false;
        self
    }
}
