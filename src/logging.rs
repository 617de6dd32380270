use std::io::{self, Write};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "stormdash.log";
const DEFAULT_FILTER: &str = "stormdash=info";

/// Keeps the file writer alive and hands out the status line feed.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
    status_rx: Option<Receiver<String>>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Formatted log lines meant for the status bar. Only the first caller
    /// gets the receiver.
    pub fn take_status_rx(&mut self) -> Option<Receiver<String>> {
        self.status_rx.take()
    }
}

/// Collects one event's output and sends it line by line when dropped.
struct StatusWriter {
    buf: Vec<u8>,
    tx: Sender<String>,
}

impl Write for StatusWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for StatusWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let _ = self.tx.send(line.trim().to_string());
        }
    }
}

#[derive(Clone)]
struct StatusMakeWriter {
    tx: Sender<String>,
}

impl<'a> MakeWriter<'a> for StatusMakeWriter {
    type Writer = StatusWriter;

    fn make_writer(&'a self) -> Self::Writer {
        StatusWriter {
            buf: Vec::with_capacity(128),
            tx: self.tx.clone(),
        }
    }
}

/// Install the global subscriber: a daily rolling file in `log_dir` plus a
/// compact feed for the status bar. Nothing is ever written to stdout.
pub fn init(log_dir: &Path) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let (status_tx, status_rx) = mpsc::channel::<String>();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .with_writer(StatusMakeWriter { tx: status_tx }),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    std::panic::set_hook(logging_panic_hook(std::panic::take_hook()));

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Ok(LoggingGuard {
        _guard: guard,
        log_dir: log_dir.to_path_buf(),
        status_rx: Some(status_rx),
    })
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Log the panic, then hand it to `previous`.
fn logging_panic_hook(previous: PanicHook) -> PanicHook {
    Box::new(move |info| {
        tracing::error!(panic = %info, "panic");
        previous(info);
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn status_writer_sends_each_line_on_drop() {
        let (tx, rx) = mpsc::channel();
        let make = StatusMakeWriter { tx };
        {
            let mut w = make.make_writer();
            w.write_all(b" INFO first\n").unwrap();
            w.write_all(b"\n WARN second\n").unwrap();
            assert!(rx.try_recv().is_err());
        }
        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines, ["INFO first", "WARN second"]);
    }

    #[test]
    fn empty_writer_sends_nothing() {
        let (tx, rx) = mpsc::channel();
        drop(StatusMakeWriter { tx }.make_writer());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn panic_hook_chains_to_the_previous_one() {
        static SEEN: AtomicUsize = AtomicUsize::new(0);

        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {
            SEEN.fetch_add(1, Ordering::SeqCst);
        }));
        std::panic::set_hook(logging_panic_hook(std::panic::take_hook()));

        let result = std::panic::catch_unwind(|| -> u8 { panic!("boom") });
        std::panic::set_hook(original);

        assert!(result.is_err());
        assert!(SEEN.load(Ordering::SeqCst) >= 1);
    }
}
