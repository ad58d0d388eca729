use crate::ListenerResult;
use std::fs::{self, File};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

const IOC_NRBITS: libc::c_ulong = 8;
const IOC_TYPEBITS: libc::c_ulong = 8;
const IOC_SIZEBITS: libc::c_ulong = 14;
const IOC_NRSHIFT: libc::c_ulong = 0;
const IOC_TYPESHIFT: libc::c_ulong = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: libc::c_ulong = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: libc::c_ulong = IOC_SIZESHIFT + IOC_SIZEBITS;
const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;

/// Read a batch of [`libc::input_event`s](libc::input_event) from the specified file descriptor.
///
/// An empty batch means the read hit end-of-file.
pub(crate) fn read_input_events(fd: RawFd) -> io::Result<Vec<libc::input_event>> {
    const MAX_INPUT_EV: usize = 128;

    let mut input_events = [mem::MaybeUninit::<libc::input_event>::uninit(); MAX_INPUT_EV];

    let n = unsafe {
        libc::read(
            fd,
            input_events.as_mut_ptr() as *mut _,
            mem::size_of_val(&input_events),
        )
    };

    if n < 0 {
        return Err(io::Error::last_os_error());
    }

    let n = (n as usize) / mem::size_of::<libc::input_event>();

    // The first n elements of the array are initialized:
    Ok(input_events[..n]
        .iter()
        .map(|e| unsafe { e.assume_init() })
        .collect())
}

/// Set the `O_NONBLOCK` flag for the specified file descriptor.
pub(crate) fn set_nonblocking(f: &File) -> ListenerResult<()> {
    let res = unsafe { libc::fcntl(f.as_raw_fd(), libc::F_SETFL, libc::O_NONBLOCK) };

    if res < 0 {
        return Err(io::Error::last_os_error().into());
    }

    Ok(())
}

/// Read the name of the specified input device using the `EVIOCGNAME` ioctl.
pub(crate) fn read_name(f: &File) -> ListenerResult<String> {
    const DEVICE_NAME_MAX_LEN: usize = 512;

    let mut device_name = [0u8; DEVICE_NAME_MAX_LEN];

    let eviocgname = (IOC_READ << IOC_DIRSHIFT)
        | (('E' as libc::c_ulong) << IOC_TYPESHIFT)
        | (0x06 << IOC_NRSHIFT)
        | ((device_name.len() as libc::c_ulong) << IOC_SIZESHIFT);

    ioctl(
        f.as_raw_fd(),
        eviocgname,
        device_name.as_mut_ptr() as *mut libc::c_void,
    )?;

    Ok(name_from_bytes(&device_name))
}

/// Grab (or release) exclusive access to the device using the `EVIOCGRAB` ioctl.
pub(crate) fn set_grab(f: &File, grab: bool) -> io::Result<()> {
    let eviocgrab = (IOC_WRITE << IOC_DIRSHIFT)
        | (('E' as libc::c_ulong) << IOC_TYPESHIFT)
        | (0x90 << IOC_NRSHIFT)
        | ((mem::size_of::<libc::c_int>() as libc::c_ulong) << IOC_SIZESHIFT);

    // EVIOCGRAB takes its argument by value, not through a pointer.
    let res = unsafe { libc::ioctl(f.as_raw_fd(), eviocgrab as _, libc::c_int::from(grab)) };

    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Get the `eventN` character devices from `input_dir`, ordered by `N`.
pub(crate) fn find_event_nodes(input_dir: &Path) -> ListenerResult<Vec<PathBuf>> {
    let nodes = fs::read_dir(input_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let file_type = fs::metadata(entry.path()).ok()?.file_type();

            if file_type.is_char_device() {
                Some(entry.path())
            } else {
                None
            }
        })
        .collect();

    Ok(sort_event_nodes(nodes))
}

/// Keep the `eventN` paths and order them numerically, so `event10` sorts after `event9`.
pub(crate) fn sort_event_nodes(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut indexed = paths
        .into_iter()
        .filter_map(|p| Some((event_index(&p)?, p)))
        .collect::<Vec<_>>();

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, p)| p).collect()
}

fn event_index(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("event")?
        .parse()
        .ok()
}

fn name_from_bytes(buf: &[u8]) -> String {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());

    String::from_utf8_lossy(&buf[..len]).into_owned()
}

fn ioctl(fd: RawFd, request: libc::c_ulong, buf: *mut libc::c_void) -> ListenerResult<()> {
    let res = unsafe { libc::ioctl(fd, request as _, buf) };

    if res < 0 {
        Err(io::Error::last_os_error().into())
    } else {
        Ok(())
    }
}
