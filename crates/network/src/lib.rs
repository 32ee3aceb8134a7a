//! JSON-over-HTTP transport for the AMR pool client, with optional SOCKS5
//! proxying for users who route relayer traffic through an anonymizing proxy.
//!
//! ```rust,no_run
//! use amr_net::{Config, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> amr_net::Result<()> {
//!     let config = Config::default().with_socks_addr("127.0.0.1:9050");
//!     let client = HttpClient::new(config)?;
//!
//!     let status: serde_json::Value = client.get_json("https://relayer.example/status").await?;
//!     println!("{status}");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http_client;

pub use config::{Config, DEFAULT_TIMEOUT_SECS};
pub use error::{NetError, Result};
pub use http_client::HttpClient;

pub fn direct_client() -> Result<HttpClient> {
    HttpClient::new(Config::default())
}
