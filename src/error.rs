//! Error types for device acquisition, capability walking and monitoring.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening and validating a device handle.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The node exists but this process may not open it.
    #[error("{}: permission denied (are you root?)", path.display())]
    PermissionDenied { path: PathBuf },

    /// The node could not be opened for a reason other than permissions.
    /// Path resolution treats this as "try the next candidate".
    #[error("{}: open failed: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No candidate path for a device argument could be opened.
    #[error("can't find event device '{0}'")]
    NotFound(String),

    /// More devices were requested than the configured limit allows.
    #[error("can't specify more than {limit} devices")]
    TooManyDevices { limit: usize },

    /// An identity or version query failed.
    #[error("{}: {query} failed: {source}", path.display())]
    Query {
        path: PathBuf,
        query: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{}: unsupported event version {version:#x}", path.display())]
    UnsupportedVersion { path: PathBuf, version: i32 },
}

/// Reasons a single device's capability walk is abandoned.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("{}: open failed: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {query} failed: {source}", path.display())]
    Query {
        path: PathBuf,
        query: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{}: unexpected stack version {version:#x}", path.display())]
    UnsupportedVersion { path: PathBuf, version: i32 },

    /// The class bitset query returned a different byte count than requested.
    #[error("{}: EVIOCGBIT(0) returned {got} bytes, expected {expected}", path.display())]
    BitsetSize {
        path: PathBuf,
        expected: usize,
        got: usize,
    },
}

/// Fatal conditions that end monitoring for every device.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("poll failed: {0}")]
    Wait(#[source] io::Error),

    #[error("poll returned without a ready device")]
    NothingReady,

    #[error("{device} read failed: {source}")]
    Read {
        device: String,
        #[source]
        source: io::Error,
    },

    /// A read returned a byte count other than one full record or packet.
    #[error("{device} read failed: got {got} bytes, expected {expected}")]
    ShortRead {
        device: String,
        expected: usize,
        got: usize,
    },

    #[error("failed to write event: {0}")]
    Output(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
