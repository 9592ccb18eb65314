use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Status { code: u16, message: String },
    /// Status payload lacked a required field. Carries the raw JSON.
    InvalidStatus(String),
    OverrideOutOfRange(f64),
    Protocol(String),
    Io(std::io::Error),
}

impl Error {
    /// HTTP status associated with a transport failure. Network errors
    /// report 500, the same code the gateway driver records for them.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(e) => Some(e.status().map_or(500, |s| s.as_u16())),
            Error::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Status { code, message } => write!(f, "gateway returned {code}: {message}"),
            Error::InvalidStatus(raw) => write!(f, "invalid status payload: {raw}"),
            Error::OverrideOutOfRange(t) => write!(
                f,
                "override temperature {t} outside {}..={}",
                crate::types::MIN_OVERRIDE_TEMP,
                crate::types::MAX_OVERRIDE_TEMP
            ),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
