use dockhand_installer::InstallError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("installation did not complete")]
    InstallFailed,
}

pub type Result<T> = std::result::Result<T, CliError>;
