//! Stream-based data source.
//!
//! Receives metric snapshots from an async byte stream, typically the TCP
//! connection a monitor's TCP output writes to.

use std::sync::Arc;

use islandwatch_sdk::from_portable_format;
use islandwatch_types::MetricSnapshot;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::DataSource;

/// A data source that receives snapshots from an async stream.
///
/// This source spawns a background task that reads newline-delimited
/// portable JSON from the provided reader and makes snapshots available via
/// `poll()`. Lines that fail to parse are skipped.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use islandwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let stream = Cursor::new(Vec::new());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<MetricSnapshot>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    disconnected: bool,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match from_portable_format(line) {
                            Ok(snapshot) => {
                                *error_handle.lock() = None;
                                if tx.send(snapshot).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "skipping malformed snapshot line");
                                *error_handle.lock() = Some(e.to_string());
                            }
                        }
                    }
                    Ok(None) => {
                        *error_handle.lock() = Some("Connection closed".to_string());
                        break;
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
            disconnected: false,
        }
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<MetricSnapshot> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn is_finished(&self) -> bool {
        self.disconnected
    }
}
