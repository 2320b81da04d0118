use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the [`ServicePatcher`](crate::ServicePatcher).
///
/// Failures of the patch call itself are not represented here; they are
/// reported through [`PatchOutcome`](crate::PatchOutcome) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The cluster API rejected or failed a read.
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    /// The namespace could not be read from the service account file.
    #[error("failed to read namespace from {}: {source}", path.display())]
    Namespace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("port {name} must be between 1 and 65535")]
    InvalidPort { name: String },
    #[error("port name {name} is used more than once")]
    DuplicatePortName { name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
