//! JSONL sink for `chat-throttle`. Writes one gate event per line.
//! Always appends; bring your own path.

use chat_throttle::telemetry::{GateEvent, TelemetrySink};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Clone, Debug)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl tower_service::Service<GateEvent> for JsonlSink {
    type Response = ();
    type Error = io::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<(), Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: GateEvent) -> Self::Future {
        let path = self.path.clone();
        let line = serde_json::to_string(&event).map(|mut line| {
            line.push('\n');
            line
        });
        Box::pin(async move {
            use tokio::io::AsyncWriteExt;
            let line = line.map_err(io::Error::from)?;
            let mut file =
                tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await?;
            if let Err(err) = file.write_all(line.as_bytes()).await {
                tracing::warn!(target: "chat_throttle::jsonl", path = %path.display(), error = %err, "write failed");
                return Err(err);
            }
            file.flush().await?;
            Ok(())
        })
    }
}

impl TelemetrySink for JsonlSink {
    type SinkError = io::Error;
}
