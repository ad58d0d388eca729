use crate::keyboard::{InputEvent, KeyEvent};
use crate::ListenerResult;
use futures::{Stream, StreamExt};
use std::io::{self, Write};
use tracing::{debug, trace};

/// Write the transition line for `event` to `out`, if it is a key press or release.
///
/// Returns whether a line was written.
pub fn print_event<W: Write>(out: &mut W, event: &InputEvent) -> io::Result<bool> {
    match KeyEvent::try_from(event) {
        Ok(key) => {
            writeln!(out, "{key}")?;
            out.flush()?;
            Ok(true)
        }
        Err(e) => {
            trace!("skipping event: {e}");
            Ok(false)
        }
    }
}

/// Print a line per key transition until `events` runs out.
///
/// Returns `Ok(())` once the stream has ended, or the first read or write error.
pub async fn print_key_events<S, W>(mut events: S, out: &mut W) -> ListenerResult<()>
where
    S: Stream<Item = ListenerResult<InputEvent>> + Unpin,
    W: Write,
{
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| {
            debug!("failed to read input event: {e}");
            e
        })?;

        print_event(out, &event)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;
    use futures::stream;

    fn printed(events: Vec<ListenerResult<InputEvent>>) -> (ListenerResult<()>, String) {
        let mut out = Vec::new();
        let res = futures::executor::block_on(print_key_events(stream::iter(events), &mut out));

        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn press_prints_down() {
        let mut out = Vec::new();

        assert!(print_event(&mut out, &InputEvent::new(1, 42, 1)).unwrap());
        assert_eq!(out, b"button 42 is down\n");
    }

    #[test]
    fn release_prints_up() {
        let mut out = Vec::new();

        assert!(print_event(&mut out, &InputEvent::new(1, 42, 0)).unwrap());
        assert_eq!(out, b"button 42 is up\n");
    }

    #[test]
    fn repeat_and_other_types_print_nothing() {
        let mut out = Vec::new();

        assert!(!print_event(&mut out, &InputEvent::new(1, 42, 2)).unwrap());
        assert!(!print_event(&mut out, &InputEvent::new(0, 0, 0)).unwrap());
        assert!(!print_event(&mut out, &InputEvent::new(4, 4, 458_756)).unwrap());
        assert!(!print_event(&mut out, &InputEvent::new(3, 0, 1)).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn filters_a_mixed_stream() {
        let (res, out) = printed(vec![
            Ok(InputEvent::new(4, 4, 458_756)),
            Ok(InputEvent::new(1, 30, 1)),
            Ok(InputEvent::new(0, 0, 0)),
            Ok(InputEvent::new(1, 30, 2)),
            Ok(InputEvent::new(1, 30, 2)),
            Ok(InputEvent::new(1, 30, 0)),
            Ok(InputEvent::new(0, 0, 0)),
        ]);

        res.unwrap();
        assert_eq!(out, "button 30 is down\nbutton 30 is up\n");
    }

    #[test]
    fn read_error_stops_after_earlier_lines() {
        let (res, out) = printed(vec![
            Ok(InputEvent::new(1, 16, 1)),
            Err(io::Error::from_raw_os_error(libc::EIO).into()),
            Ok(InputEvent::new(1, 16, 0)),
        ]);

        assert!(matches!(res, Err(ListenerError::Io(_))));
        assert_eq!(out, "button 16 is down\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_error_is_reported() {
        let events: Vec<ListenerResult<InputEvent>> = vec![Ok(InputEvent::new(1, 2, 1))];
        let res = futures::executor::block_on(print_key_events(
            stream::iter(events),
            &mut ClosedPipe,
        ));

        assert!(matches!(res, Err(ListenerError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
