use crate::error::ListenerError;
use crate::keyboard::{find_event_nodes, DeviceNode};
use crate::ListenerResult;
use std::path::Path;
use tracing::{debug, info};

/// Anything that has a device name to match against.
pub trait NamedDevice {
    fn name(&self) -> &str;
}

/// Return the first of `devices` whose name is exactly `target`.
///
/// Devices after the first match are never inspected.
pub fn locate<D, I>(devices: I, target: &str) -> ListenerResult<D>
where
    D: NamedDevice,
    I: IntoIterator<Item = D>,
{
    devices
        .into_iter()
        .find(|d| d.name() == target)
        .ok_or_else(|| ListenerError::DeviceNotFound(target.to_owned()))
}

/// Scan the `eventN` nodes of `input_dir` in order and open the first one named `target`.
///
/// Nodes that can't be opened or queried are skipped. Nodes that don't match are closed as soon
/// as their name has been read.
pub fn find_device(input_dir: &Path, target: &str) -> ListenerResult<DeviceNode> {
    let nodes = find_event_nodes(input_dir)?;

    debug!("scanning {} input devices in {}", nodes.len(), input_dir.display());

    let opened = nodes.into_iter().filter_map(|path| match DeviceNode::open(&path) {
        Ok(node) => {
            debug!("{}: {:?}", path.display(), node.name());
            Some(node)
        }
        Err(e) => {
            debug!("skipping {}: {e}", path.display());
            None
        }
    });

    let node = locate(opened, target)?;
    info!("found {target:?} at {}", node.path().display());

    Ok(node)
}
