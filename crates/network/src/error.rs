use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetError>;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response; the body is kept so callers can surface a
    /// structured error payload when the peer sends one.
    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },
}
