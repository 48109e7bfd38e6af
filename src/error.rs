//! Error types for figma-icon-export
//!
//! Every fallible operation in the export pipeline returns [`Result`]. Variants carry
//! enough context (page, frame, icon name, URL) to print a useful diagnostic before
//! the process exits.

use thiserror::Error;

/// Result type alias for figma-icon-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for figma-icon-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fileId")
        key: Option<String>,
    },

    /// The selected page does not exist in the document
    #[error("cannot find page '{page}', check your settings")]
    PageNotFound {
        /// Name of the page that was requested
        page: String,
    },

    /// The selected frame does not exist inside the page
    #[error("cannot find frame '{frame}' in page '{page}', check your settings")]
    FrameNotFound {
        /// Last segment of the requested frame path
        frame: String,
        /// Page that was searched
        page: String,
    },

    /// The remote API answered with an error status or an error payload
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Error message reported by the API
        message: String,
    },

    /// Fetching an icon image failed
    #[error("failed to download '{name}' from {url}: {reason}")]
    Download {
        /// Icon name (after `removeFromName` was applied)
        name: String,
        /// URL that was requested, empty if the icon had no resolved URL
        url: String,
        /// The reason the fetch failed
        reason: String,
    },

    /// The run was cancelled before it could finish
    #[error("export cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid URL (API base URL or resolved image URL)
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Process exit code used by the CLI for this error
    ///
    /// Configuration problems exit with 2, a cancelled run with 130 (as for SIGINT),
    /// everything else with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config { .. } => 2,
            Error::Cancelled => 130,
            _ => 1,
        }
    }

    /// Whether this error should stop sibling downloads
    ///
    /// `Cancelled` is the echo of another failure, not a cause of its own.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_helper_records_key() {
        let err = Error::config("fileId", "missing required setting");
        match &err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("fileId"));
                assert_eq!(message, "missing required setting");
            }
            other => panic!("expected Config, got {other:?}"),
        }
        assert_eq!(err.to_string(), "configuration error: missing required setting");
    }

    #[test]
    fn exit_codes_by_variant() {
        assert_eq!(Error::config("page", "x").exit_code(), 2);
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(
            Error::PageNotFound {
                page: "Icons".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(
            Error::Io(std::io::Error::other("disk full")).exit_code(),
            1
        );
    }

    #[test]
    fn lookup_errors_name_the_missing_node() {
        let page = Error::PageNotFound {
            page: "Icons".into(),
        };
        assert_eq!(page.to_string(), "cannot find page 'Icons', check your settings");

        let frame = Error::FrameNotFound {
            frame: "Outline".into(),
            page: "Icons".into(),
        };
        assert!(frame.to_string().contains("'Outline'"));
        assert!(frame.to_string().contains("'Icons'"));
    }

    #[test]
    fn only_cancelled_is_a_cancellation() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(
            !Error::Download {
                name: "a/b/c".into(),
                url: "http://x".into(),
                reason: "404".into(),
            }
            .is_cancellation()
        );
    }
}
