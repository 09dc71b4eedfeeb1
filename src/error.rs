//! Error type shared by the loader, scanner, settings store and host API.

use std::path::PathBuf;

use thiserror::Error;

use crate::plugin::InstanceId;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to open module {path:?}: {reason}")]
    ModuleOpen { path: PathBuf, reason: String },

    #[error("not a valid LADSPA module: {0:?}")]
    MissingEntryPoint(PathBuf),

    #[error("failed to read folder {path:?}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings I/O error on {path:?}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file: {0}")]
    SettingsFormat(#[from] serde_json::Error),

    #[error("instance {0} is no longer enabled")]
    StaleInstance(InstanceId),

    #[error("instance {id} has no control {control}")]
    NoSuchControl { id: InstanceId, control: usize },
}

pub type Result<T> = std::result::Result<T, HostError>;
