//! Signal sink that echoes every signal as a JSON line.

use message_fetch_coordinator::MemorySessionStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use sync_types::{SignalSink, SyncSignal};

#[derive(Serialize)]
struct SignalLine<'a> {
    at: String,
    signal: &'a SyncSignal,
}

/// Applies each signal to the session store, then prints it.
///
/// The store is updated first so state reads made after `emit` returns
/// already see the signal.
pub struct PrintingSink {
    store: Arc<MemorySessionStore>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl PrintingSink {
    pub fn new(store: Arc<MemorySessionStore>, out: Box<dyn Write + Send>) -> Self {
        Self {
            store,
            out: Mutex::new(out),
        }
    }

    pub fn stdout(store: Arc<MemorySessionStore>) -> Self {
        Self::new(store, Box::new(std::io::stdout()))
    }
}

impl SignalSink for PrintingSink {
    fn emit(&self, signal: SyncSignal) {
        self.store.emit(signal.clone());

        let line = SignalLine {
            at: chrono::Utc::now().to_rfc3339(),
            signal: &signal,
        };
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, &line)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            tracing::warn!(signal = signal.name(), error = %e, "Failed to print signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::SessionStateReader;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_signal_reaches_store_and_output() {
        let store = Arc::new(MemorySessionStore::new());
        let buf = SharedBuf::default();
        let sink = PrintingSink::new(store.clone(), Box::new(buf.clone()));

        sink.emit(SyncSignal::InitialFetchStart);
        sink.emit(SyncSignal::FlushOutbox);

        assert!(store.initial_fetch_in_progress());
        assert_eq!(store.outbox_flushes(), 1);

        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["signal"]["type"], "initial_fetch_start");
        assert_eq!(lines[1]["signal"]["type"], "flush_outbox");
        assert!(lines[0]["at"].as_str().is_some());
    }
}
