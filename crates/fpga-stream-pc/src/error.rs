use std::path::PathBuf;

use fpga_stream_core::SessionError;

use crate::assets::AssetError;
use crate::transport::SimError;

/// Errors that end a host run.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error("cannot open input script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write memory dump {path}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session error: {0}")]
    Session(#[from] SessionError<SimError, AssetError>),
}
