use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to the user while the dialog stays open.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Could not convert '{0}' to the local encoding")]
    Encoding(String),

    #[error("Could not run command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not open location '{uri}': {source}")]
    Display {
        uri: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not save launcher to {path:?}: {source}")]
    LauncherFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RunError>;
