use std::fmt;

/// Failure of a remote call made by the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Transport failure, non-2xx data response, or undecodable body.
    Network(String),
    /// The identity provider rejected or cancelled a sign-in/out.
    Auth(String),
    /// An authenticated call was attempted without a credential.
    AuthRequired,
    /// An authenticated call reached the server and was refused.
    Request { status: u16, message: String },
}

impl ClientError {
    pub fn http_status(status: u16, url: &str) -> Self {
        ClientError::Network(format!("HTTP error {status} fetching from {url}"))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(message) => write!(f, "{message}"),
            ClientError::Auth(message) => write!(f, "sign-in failed: {message}"),
            ClientError::AuthRequired => write!(f, "User not authenticated"),
            ClientError::Request { status, message } if message.is_empty() => {
                write!(f, "request failed with HTTP {status}")
            }
            ClientError::Request { status, message } => {
                write!(f, "request failed with HTTP {status}: {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<gloo_net::Error> for ClientError {
    fn from(e: gloo_net::Error) -> Self {
        ClientError::Network(format!("fetch error: {e}"))
    }
}
