//! This crate listens to a single, named keyboard on Linux and reports its key transitions.
//!
//! The device is found by name among the `/dev/input/eventN` nodes with [`find_device`], grabbed
//! so no other process sees its input, and read as a [`Stream`](futures::Stream) of
//! [`InputEvent`]s. Each press or release is printed as `button <code> is <down|up>`.
//!
//! # Example
//!
//! Print the transitions of the default keyboard to stdout. Note the listener needs permission to
//! open the device, which usually means root or membership of the `input` group.
//!
//! ```no_run
//! use keygrab::{Config, Listener, ListenerError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ListenerError> {
//!     let listener = Listener::new(Config::default());
//!     let shutdown = listener.run(&mut std::io::stdout()).await?;
//!
//!     eprintln!("{shutdown:?}");
//!
//!     Ok(())
//! }
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("This crate only works on Linux");

mod error;
mod keyboard;
mod listener;
mod locator;
mod printer;

pub use error::ListenerError;
pub use keyboard::{DeviceNode, InputDevice, InputEvent, KeyEvent, KeyState};
pub use listener::{Config, Listener, Shutdown, DEFAULT_DEVICE_NAME};
pub use locator::{find_device, locate, NamedDevice};
pub use printer::{print_event, print_key_events};

pub type ListenerResult<T> = Result<T, ListenerError>;
