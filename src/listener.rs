use crate::error::ListenerError;
use crate::keyboard::{InputDevice, InputEvent};
use crate::locator::find_device;
use crate::printer::print_key_events;
use crate::ListenerResult;
use futures::Stream;
use std::io::Write;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// The name of the keyboard listened to when none is given.
pub const DEFAULT_DEVICE_NAME: &str = "Usb KeyBoard Usb KeyBoard";

const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// What to listen to, and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The exact name of the device to listen to.
    pub device_name: String,
    /// The directory holding the `eventN` nodes.
    pub input_dir: PathBuf,
    /// Whether to grab the device, hiding its events from every other reader.
    pub grab: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_owned(),
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            grab: true,
        }
    }
}

impl Config {
    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    pub fn with_input_dir(mut self, input_dir: impl Into<PathBuf>) -> Self {
        self.input_dir = input_dir.into();
        self
    }

    pub fn with_grab(mut self, grab: bool) -> Self {
        self.grab = grab;
        self
    }
}

/// Why a listener stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shutdown {
    /// The process was asked to terminate (`SIGINT` or `SIGTERM`).
    Signal(&'static str),
}

pub struct Listener {
    config: Config,
}

impl Listener {
    /// Create a new `Listener`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Locate and grab the configured device, then print its key transitions to `out`.
    ///
    /// This only returns `Ok` when a termination signal arrives. A missing device, a failed grab,
    /// a read error or the device going away are all errors.
    pub async fn run<W: Write>(self, out: &mut W) -> ListenerResult<Shutdown> {
        let node = find_device(&self.config.input_dir, &self.config.device_name)?;
        let mut device = InputDevice::try_from(node)?;

        if self.config.grab {
            device.grab()?;
        } else {
            warn!("not grabbing {}, other readers will see its events too", device.path().display());
        }

        self.listen(&mut device, out).await
    }

    /// Print the key transitions of `events` to `out` until the stream ends or the process is
    /// signalled.
    pub async fn listen<S, W>(&self, events: S, out: &mut W) -> ListenerResult<Shutdown>
    where
        S: Stream<Item = ListenerResult<InputEvent>> + Unpin,
        W: Write,
    {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        info!("listening to {:?}", self.config.device_name);

        let shutdown = tokio::select! {
            res = print_key_events(events, out) => {
                res?;
                return Err(ListenerError::DeviceDisconnected(self.config.device_name.clone()));
            }
            _ = sigint.recv() => Shutdown::Signal("SIGINT"),
            _ = sigterm.recv() => Shutdown::Signal("SIGTERM"),
        };

        let Shutdown::Signal(name) = shutdown;
        info!("stopping: received {name}");

        Ok(shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::os::unix::fs::symlink;
    use std::time::Duration;
    use std::{env, fs, io, process};

    #[test]
    fn default_config_targets_the_usb_keyboard() {
        let config = Config::default();

        assert_eq!(config.device_name, "Usb KeyBoard Usb KeyBoard");
        assert_eq!(config.input_dir, PathBuf::from("/dev/input"));
        assert!(config.grab);
    }

    #[test]
    fn setters_override_defaults() {
        let config = Config::default()
            .with_device_name("Foo")
            .with_input_dir("/tmp/input")
            .with_grab(false);

        assert_eq!(config.device_name, "Foo");
        assert_eq!(config.input_dir, PathBuf::from("/tmp/input"));
        assert!(!config.grab);
    }

    #[tokio::test]
    async fn end_of_stream_is_a_disconnect() {
        let listener = Listener::new(Config::default());
        let events: Vec<ListenerResult<InputEvent>> = vec![Ok(InputEvent::new(1, 30, 1))];
        let mut out = Vec::new();

        let err = listener
            .listen(stream::iter(events), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, ListenerError::DeviceDisconnected(ref name) if name == DEFAULT_DEVICE_NAME));
        assert_eq!(out, b"button 30 is down\n");
    }

    #[tokio::test]
    async fn read_error_is_returned() {
        let listener = Listener::new(Config::default());
        let events: Vec<ListenerResult<InputEvent>> =
            vec![Err(io::Error::from_raw_os_error(libc::EIO).into())];
        let mut out = Vec::new();

        let err = listener
            .listen(stream::iter(events), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, ListenerError::Io(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn pending_stream_keeps_listening() {
        let listener = Listener::new(Config::default());
        let mut out = Vec::new();

        let res = tokio::time::timeout(
            Duration::from_millis(50),
            listener.listen(stream::pending::<ListenerResult<InputEvent>>(), &mut out),
        )
        .await;

        assert!(res.is_err(), "listener returned without a signal or disconnect");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unreadable_input_dir_fails_before_listening() {
        let listener = Listener::new(Config::default().with_input_dir("/nonexistent/input"));
        let mut out = Vec::new();

        assert!(matches!(listener.run(&mut out).await, Err(ListenerError::Io(_))));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn no_matching_device_is_not_found() {
        // A char device that rejects EVIOCGNAME, so the scan opens it and skips it.
        let input_dir = env::temp_dir().join(format!("keygrab-input-{}", process::id()));
        fs::create_dir_all(&input_dir).unwrap();
        let _ = fs::remove_file(input_dir.join("event0"));
        symlink("/dev/null", input_dir.join("event0")).unwrap();

        let listener = Listener::new(Config::default().with_input_dir(&input_dir));
        let mut out = Vec::new();
        let res = listener.run(&mut out).await;

        fs::remove_dir_all(&input_dir).unwrap();

        assert!(matches!(res, Err(ListenerError::DeviceNotFound(ref name)) if name == DEFAULT_DEVICE_NAME));
        assert!(out.is_empty());
    }
}
