//! Warning sinks for non-fatal translation diagnostics.
//!
//! Cyclic references, unknown `type` strings, unsupported model properties,
//! `Bytes` translation and non-portable regex escapes are reported here and
//! translation continues.

use std::sync::Mutex;

/// Receives non-fatal diagnostics.
///
/// Implementations must tolerate concurrent calls: one sink is shared by
/// every translation running on a [`crate::Translator`].
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Default sink: forwards each message to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "shape_schema", "{}", message);
    }
}

/// Buffers messages in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

impl<F> WarningSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn warn(&self, message: &str) {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.warn("first");
        sink.warn("second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }

    #[test]
    fn collecting_sink_take_drains() {
        let sink = CollectingSink::new();
        sink.warn("only");
        assert_eq!(sink.take(), vec!["only"]);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn closure_is_a_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = move |_: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
        };
        sink.warn("a");
        sink.warn("b");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn collecting_sink_across_threads() {
        let sink = Arc::new(CollectingSink::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || sink.warn(&format!("thread {}", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.messages().len(), 4);
    }
}
