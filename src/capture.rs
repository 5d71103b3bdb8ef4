//! Scoped capture of command output.
//!
//! Commands write through [`stdout()`]. While an [`OutputCapture`] guard is
//! alive on the current thread, everything written lands in the guard's
//! buffer instead of the process stdout. Guards nest, and dropping one always
//! restores the sink that was active before it, whether the scope ended
//! normally, through `?`, or by unwinding.
//!
//! The sink stack is thread-local, so two commands running on two blocking
//! threads never see each other's output.

use std::any::Any;
use std::cell::RefCell;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;

thread_local! {
    static SINKS: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

/// Writer routed to the innermost active capture, or to the real stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapturedStdout;

pub fn stdout() -> CapturedStdout {
    CapturedStdout
}

/// True when a capture is active on this thread.
pub fn is_capturing() -> bool {
    SINKS.with(|sinks| !sinks.borrow().is_empty())
}

impl Write for CapturedStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let captured = SINKS.with(|sinks| match sinks.borrow_mut().last_mut() {
            Some(sink) => {
                sink.extend_from_slice(buf);
                true
            }
            None => false,
        });
        if captured {
            Ok(buf.len())
        } else {
            io::stdout().write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if is_capturing() {
            Ok(())
        } else {
            io::stdout().flush()
        }
    }
}

/// Guard for one capture scope. Not `Send`: it belongs to the thread whose
/// sink stack it pushed onto.
#[must_use = "output is only captured while the guard is alive"]
pub struct OutputCapture {
    depth: usize,
    finished: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl OutputCapture {
    pub fn begin() -> Self {
        let depth = SINKS.with(|sinks| {
            let mut sinks = sinks.borrow_mut();
            sinks.push(Vec::new());
            sinks.len()
        });
        Self {
            depth,
            finished: false,
            _thread_bound: PhantomData,
        }
    }

    /// Text captured so far, without ending the scope.
    pub fn contents(&self) -> String {
        SINKS.with(|sinks| {
            sinks
                .borrow()
                .get(self.depth - 1)
                .map(|buf| String::from_utf8_lossy(buf).into_owned())
                .unwrap_or_default()
        })
    }

    /// Ends the scope and returns everything written inside it.
    pub fn finish(mut self) -> String {
        self.finished = true;
        let buf = self.restore();
        String::from_utf8_lossy(&buf).into_owned()
    }

    // Drops this level and anything a leaked inner guard left above it.
    fn restore(&self) -> Vec<u8> {
        SINKS.with(|sinks| {
            let mut sinks = sinks.borrow_mut();
            if sinks.len() < self.depth {
                return Vec::new();
            }
            let mut above = sinks.split_off(self.depth - 1);
            std::mem::take(&mut above[0])
        })
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        if !self.finished {
            self.restore();
        }
    }
}

/// Runs `f` inside a capture and returns the captured text together with
/// its result. The text is returned on every path; a panic inside `f` is
/// turned into an error.
pub fn capture_output<T>(f: impl FnOnce() -> anyhow::Result<T>) -> (String, anyhow::Result<T>) {
    let capture = OutputCapture::begin();
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("command panicked: {}", panic_message(payload.as_ref()))),
    };
    (capture.finish(), result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_collects_writes() {
        let capture = OutputCapture::begin();
        write!(stdout(), "hello ").unwrap();
        writeln!(stdout(), "world").unwrap();
        assert_eq!(capture.contents(), "hello world\n");
        assert_eq!(capture.finish(), "hello world\n");
        assert!(!is_capturing());
    }

    #[test]
    fn test_nested_captures_restore_outer_sink() {
        let outer = OutputCapture::begin();
        write!(stdout(), "a").unwrap();
        {
            let inner = OutputCapture::begin();
            write!(stdout(), "b").unwrap();
            assert_eq!(inner.finish(), "b");
        }
        write!(stdout(), "c").unwrap();
        assert_eq!(outer.finish(), "ac");
    }

    #[test]
    fn test_dropped_guard_restores_sink() {
        let outer = OutputCapture::begin();
        {
            let _inner = OutputCapture::begin();
            write!(stdout(), "lost").unwrap();
        }
        write!(stdout(), "kept").unwrap();
        assert_eq!(outer.finish(), "kept");
    }

    #[test]
    fn test_capture_output_keeps_text_on_error() {
        let (text, result) = capture_output(|| -> anyhow::Result<()> {
            writeln!(stdout(), "step 1 done")?;
            anyhow::bail!("step 2 failed")
        });
        assert_eq!(text, "step 1 done\n");
        assert_eq!(result.unwrap_err().to_string(), "step 2 failed");
        assert!(!is_capturing());
    }

    #[test]
    fn test_capture_output_survives_panic() {
        let (text, result) = capture_output(|| -> anyhow::Result<()> {
            write!(stdout(), "partial").unwrap();
            panic!("boom");
        });
        assert_eq!(text, "partial");
        assert!(result.unwrap_err().to_string().contains("boom"));
        assert!(!is_capturing());
    }

    #[test]
    fn test_threads_do_not_share_sinks() {
        let capture = OutputCapture::begin();
        std::thread::spawn(|| {
            let (text, _) = capture_output(|| {
                write!(stdout(), "other thread")?;
                Ok(())
            });
            assert_eq!(text, "other thread");
        })
        .join()
        .unwrap();
        write!(stdout(), "this thread").unwrap();
        assert_eq!(capture.finish(), "this thread");
    }
}
