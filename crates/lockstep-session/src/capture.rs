use std::io::Read;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use regex::Regex;

/// Shared buffer for one child's stdout, filled by a reader thread.
///
/// The consumer side is strictly synchronous: the harness blocks in
/// [`OutputCapture::wait_for_match`] between commands, so a plain
/// `Mutex` + `Condvar` pair is all the coordination needed.
#[derive(Clone)]
pub(crate) struct OutputCapture {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<CaptureState>,
    wakeup: Condvar,
}

#[derive(Default)]
struct CaptureState {
    text: String,
    eof: bool,
}

pub(crate) enum WaitOutcome {
    /// Pattern matched; `end` is the byte offset just past the match.
    Matched { end: usize, captured: String },
    /// Reader observed end-of-stream before the pattern appeared.
    Eof { partial: String },
    TimedOut { partial: String },
}

impl OutputCapture {
    /// Start consuming `reader` on a background thread.
    pub(crate) fn start<R: Read + Send + 'static>(reader: R) -> Self {
        let capture = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CaptureState::default()),
                wakeup: Condvar::new(),
            }),
        };
        let writer = capture.clone();
        thread::spawn(move || writer.consume_reader(reader));
        capture
    }

    fn consume_reader<R: Read>(&self, mut reader: R) {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let mut state = self.lock();
                    state.text.push_str(&String::from_utf8_lossy(&chunk[..n]));
                    drop(state);
                    self.inner.wakeup.notify_all();
                }
            }
        }
        self.lock().eof = true;
        self.inner.wakeup.notify_all();
    }

    /// Block until `pattern` matches the buffer at or after `from`, the
    /// stream ends, or `deadline` passes. The returned capture spans
    /// everything from `from` through the end of the match.
    pub(crate) fn wait_for_match(
        &self,
        pattern: &Regex,
        from: usize,
        deadline: Instant,
    ) -> WaitOutcome {
        let mut state = self.lock();
        loop {
            if let Some(m) = pattern.find(&state.text[from..]) {
                let end = from + m.end();
                return WaitOutcome::Matched {
                    end,
                    captured: state.text[from..end].to_string(),
                };
            }
            if state.eof {
                return WaitOutcome::Eof {
                    partial: state.text[from..].to_string(),
                };
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut {
                    partial: state.text[from..].to_string(),
                };
            }
            let (next, _) = self
                .inner
                .wakeup
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = next;
        }
    }

    /// Everything captured so far, for abort diagnostics.
    pub(crate) fn snapshot(&self) -> String {
        self.lock().text.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
