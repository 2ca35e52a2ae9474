//! Output backends for emitting snapshots.

use std::path::PathBuf;

use islandwatch_types::MetricSnapshot;

/// Output destination for snapshots.
///
/// Configure where the monitor should emit snapshots.
#[derive(Debug)]
pub enum Output {
    /// Write snapshots to a file in the portable format.
    ///
    /// The file is overwritten with each snapshot.
    File(PathBuf),

    /// Send snapshots to a TCP server.
    ///
    /// Each snapshot is sent as one line of compact portable JSON.
    Tcp(String),

    /// Send snapshots through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    #[cfg(feature = "tokio")]
    Channel(tokio::sync::mpsc::Sender<MetricSnapshot>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use islandwatch_sdk::Output;
    ///
    /// let output = Output::file("metrics.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    ///
    /// ```rust
    /// use islandwatch_sdk::Output;
    ///
    /// let output = Output::tcp("localhost:9190");
    /// ```
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// This is how a dashboard or test subscribes to live snapshots.
    ///
    /// ```rust
    /// use islandwatch_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive snapshots
    /// // while let Some(snapshot) = rx.recv().await {
    /// //     println!("{} islands hydrated", snapshot.len());
    /// // }
    /// ```
    #[cfg(feature = "tokio")]
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<MetricSnapshot>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Short description for log messages.
    pub fn describe(&self) -> String {
        match self {
            Output::File(path) => format!("file: {}", path.display()),
            Output::Tcp(addr) => format!("tcp: {}", addr),
            #[cfg(feature = "tokio")]
            Output::Channel(_) => "channel".to_string(),
        }
    }

    /// Emit a snapshot to this output.
    #[cfg(feature = "tokio")]
    pub(crate) async fn emit(&self, snapshot: &MetricSnapshot) -> std::io::Result<()> {
        use crate::export::{to_portable_format, to_portable_format_pretty};

        match self {
            Output::File(path) => {
                let json = to_portable_format_pretty(snapshot).map_err(std::io::Error::other)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Tcp(addr) => {
                use tokio::io::AsyncWriteExt;
                use tokio::net::TcpStream;

                let json = to_portable_format(snapshot).map_err(std::io::Error::other)?;
                let mut stream = TcpStream::connect(addr).await?;
                stream.write_all(json.as_bytes()).await?;
                stream.write_all(b"\n").await?;
            }
            Output::Channel(tx) => {
                // Don't block the emitter if the consumer is slow.
                if let Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) = tx.try_send(snapshot.clone()) {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "snapshot receiver dropped",
                    ));
                }
            }
        }
        Ok(())
    }
}
