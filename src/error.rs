use std::fmt;

use thiserror::Error as ThisError;

#[derive(ThisError, Eq, PartialEq, Debug)]
pub enum Error {
    #[error("missing separator \"{0}\"")]
    MissingSeparator(char),
    #[error("too many parts")]
    TooManyParts,
    #[error("wildcards are not allowed in available options")]
    InvalidWildcard,
    #[error("parameters not allowed")]
    ParamsNotAllowed,
    #[error("invalid token \"{0}\"")]
    InvalidToken(String),
    #[error("no available options configured for {0}")]
    NoAvailableOptions(&'static str),
    #[error("invalid header value \"{0}\"")]
    InvalidHeaderValue(String),
    #[error("not acceptable: {}", DisplayRejections(.0))]
    NotAcceptable(Vec<Rejection>),
}

impl Error {
    /// Whether the error is the expected client-facing outcome (406) rather
    /// than a server configuration problem.
    pub fn is_not_acceptable(&self) -> bool {
        matches!(self, Error::NotAcceptable(_))
    }

    #[cfg(feature = "http")]
    pub fn status_code(&self) -> http::StatusCode {
        if self.is_not_acceptable() {
            http::StatusCode::NOT_ACCEPTABLE
        } else {
            http::StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub(crate) fn not_acceptable(rejection: Rejection) -> Self {
        Error::NotAcceptable(vec![rejection])
    }
}

/// One dimension that could not be satisfied.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Rejection {
    pub header_name: &'static str,
    pub header: String,
    pub available: Vec<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" matches none of [{}]",
            self.header_name,
            self.header,
            self.available.join(", ")
        )
    }
}

struct DisplayRejections<'a>(&'a [Rejection]);

impl fmt::Display for DisplayRejections<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rejection) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{rejection}")?;
        }
        Ok(())
    }
}
