use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("device not found: no input device is named {0:?}")]
    DeviceNotFound(String),
    #[error("failed to grab {}: {source}", path.display())]
    GrabFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("device {0:?} disconnected")]
    DeviceDisconnected(String),
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(u16),
    #[error("ignored EV_KEY value: {0}")]
    IgnoredKeyValue(i32),
    #[error("invalid timestamp: {0}s {1}us")]
    InvalidTimestamp(i64, i64),
}
