//! Error taxonomy shared by the library and the binary.
//! Every variant is fatal and maps to a distinct process exit code.

use std::io;
use std::path::PathBuf;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to the operator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No key provided. Set TRANSLATOR_KEY or pass --key.")]
    CredentialMissing,

    #[error("Invalid language pair '{0}', expected source:target (for example en:de)")]
    InvalidLanguages(String),

    #[error("Cannot open input file {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read input: {0}")]
    Read(#[source] io::Error),

    #[error("Cannot open output file {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),

    #[error("API error: {0}")]
    Remote(String),
}

impl Error {
    /// Exit status reported for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::CredentialMissing => 10,
            Error::InputUnreadable { .. } | Error::Read(_) => 11,
            Error::OutputUnwritable { .. } | Error::Write(_) => 12,
            Error::Remote(_) => 20,
            Error::InvalidLanguages(_) => 2,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_class() {
        let codes = [
            Error::CredentialMissing.exit_code(),
            Error::Read(io::Error::other("x")).exit_code(),
            Error::Write(io::Error::other("x")).exit_code(),
            Error::Remote("x".into()).exit_code(),
        ];
        assert_eq!(codes, [10, 11, 12, 20]);
    }

    #[test]
    fn remote_message_is_prefixed() {
        let err = Error::Remote("The request is not authorized".into());
        assert_eq!(err.to_string(), "API error: The request is not authorized");
    }
}
