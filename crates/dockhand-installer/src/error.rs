use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while planning or applying installation steps.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to launch `{program}`")]
    CommandLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with status {code}")]
    CommandFailed {
        command: String,
        code: i32,
        /// Captured diagnostics, already forwarded to the reporter where a
        /// streaming step produced them.
        stderr: String,
    },

    #[error("failed to write installer script to '{path}'")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove '{path}'")]
    FileRemove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("installation cancelled by user")]
    Cancelled,

    #[error("host platform '{0}' is not supported")]
    UnsupportedPlatform(String),
}

pub type Result<T> = std::result::Result<T, InstallError>;
