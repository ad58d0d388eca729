mod device;
mod event_codes;

use crate::error::ListenerError;
use crate::locator::NamedDevice;
use crate::ListenerResult;
use chrono::naive::NaiveDateTime;
use chrono::DateTime;
use futures::{ready, Stream};
use std::collections::VecDeque;
use std::convert::TryFrom;
use std::fmt;
use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::unix::AsyncFd;
use tracing::{debug, info, warn};

use event_codes::{EV_KEY, EV_KEY_PRESS, EV_KEY_RELEASE};

pub(crate) use device::find_event_nodes;

/// An opened evdev node whose name has been read, not yet set up for reading events.
#[derive(Debug)]
pub struct DeviceNode {
    name: String,
    path: PathBuf,
    file: File,
}

impl DeviceNode {
    /// Open the input device at `path` and read its name.
    pub fn open(path: impl Into<PathBuf>) -> ListenerResult<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let name = device::read_name(&file)?;

        Ok(Self { name, path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NamedDevice for DeviceNode {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An input device being listened to.
///
/// `InputDevice` is a [`Stream`] of [`InputEvent`]s. The stream ends when the device goes away.
/// If the device was grabbed, the grab is released when it is dropped.
#[derive(Debug)]
pub struct InputDevice {
    /// The name of the device.
    name: String,
    /// The path of the input device (e.g. `/dev/input/event0`).
    path: PathBuf,
    /// The file descriptor of the open input device file.
    async_fd: AsyncFd<File>,
    /// Events read from the device but not yet yielded.
    pending: VecDeque<InputEvent>,
    grabbed: bool,
    disconnected: bool,
}

impl TryFrom<DeviceNode> for InputDevice {
    type Error = ListenerError;

    fn try_from(node: DeviceNode) -> Result<Self, Self::Error> {
        device::set_nonblocking(&node.file)?;

        Ok(InputDevice {
            name: node.name,
            path: node.path,
            async_fd: AsyncFd::new(node.file)?,
            pending: VecDeque::new(),
            grabbed: false,
            disconnected: false,
        })
    }
}

impl InputDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Request exclusive delivery of this device's events.
    pub fn grab(&mut self) -> ListenerResult<()> {
        device::set_grab(self.async_fd.get_ref(), true).map_err(|source| {
            ListenerError::GrabFailed {
                path: self.path.clone(),
                source,
            }
        })?;

        self.grabbed = true;
        info!("grabbed {:?} ({})", self.name, self.path.display());

        Ok(())
    }
}

impl Drop for InputDevice {
    fn drop(&mut self) {
        if !self.grabbed {
            return;
        }

        match device::set_grab(self.async_fd.get_ref(), false) {
            Ok(()) => debug!("released grab on {}", self.path.display()),
            Err(e) => warn!("failed to release grab on {}: {e}", self.path.display()),
        }
    }
}

impl Stream for InputDevice {
    type Item = ListenerResult<InputEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if this.disconnected {
                return Poll::Ready(None);
            }

            let mut guard = ready!(this.async_fd.poll_read_ready(cx))?;

            match guard.try_io(|inner| device::read_input_events(inner.as_raw_fd())) {
                Ok(Ok(events)) if events.is_empty() => this.disconnected = true,
                Ok(Ok(events)) => {
                    for ev in &events {
                        let event = InputEvent::try_from(ev).unwrap_or_else(|e| {
                            warn!("{e}, keeping the event with an epoch timestamp");
                            InputEvent::new(ev.type_, ev.code, ev.value)
                        });
                        this.pending.push_back(event);
                    }
                }
                Ok(Err(e)) if e.raw_os_error() == Some(libc::ENODEV) => this.disconnected = true,
                Ok(Err(e)) => return Poll::Ready(Some(Err(e.into()))),
                Err(_would_block) => continue,
            }
        }
    }
}

/// A raw input event, as delivered by the kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputEvent {
    /// The timestamp of the event.
    pub ts: NaiveDateTime,
    /// The event category (`EV_KEY`, `EV_SYN`, `EV_MSC`, ...).
    pub ty: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// Build an event with an epoch timestamp.
    pub fn new(ty: u16, code: u16, value: i32) -> Self {
        Self {
            ts: NaiveDateTime::default(),
            ty,
            code,
            value,
        }
    }
}

impl TryFrom<&libc::input_event> for InputEvent {
    type Error = ListenerError;

    fn try_from(ev: &libc::input_event) -> Result<Self, Self::Error> {
        let (sec, usec) = (ev.time.tv_sec as i64, ev.time.tv_usec as i64);

        let ts = u32::try_from(usec * 1000)
            .ok()
            .and_then(|nsec| DateTime::from_timestamp(sec, nsec))
            .ok_or(ListenerError::InvalidTimestamp(sec, usec))?
            .naive_utc();

        Ok(Self {
            ts,
            ty: ev.type_,
            code: ev.code,
            value: ev.value,
        })
    }
}

/// A key transition (an `EV_KEY` press or release).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code of the key that changed state.
    pub code: u16,
    pub state: KeyState,
}

/// The state a key moved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    /// The key was pressed.
    Down,
    /// The key was released.
    Up,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Down => f.write_str("down"),
            KeyState::Up => f.write_str("up"),
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {} is {}", self.code, self.state)
    }
}

impl TryFrom<&InputEvent> for KeyEvent {
    type Error = ListenerError;

    fn try_from(ev: &InputEvent) -> Result<Self, Self::Error> {
        if ev.ty != EV_KEY {
            return Err(ListenerError::UnsupportedEventType(ev.ty));
        }

        // Autorepeat (2) is not a transition.
        let state = match ev.value {
            EV_KEY_PRESS => KeyState::Down,
            EV_KEY_RELEASE => KeyState::Up,
            n => return Err(ListenerError::IgnoredKeyValue(n)),
        };

        Ok(Self {
            code: ev.code,
            state,
        })
    }
}
