use facematch_core::{ComparisonPipeline, ComparisonResult, FaceEmbedder, MatchPolicy};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Compare {
        aadhaar: String,
        live: String,
        reply: oneshot::Sender<ComparisonResult>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Queue a comparison and wait for its result.
    ///
    /// Waits for queue space when `queue_depth` comparisons are already pending.
    pub async fn compare(&self, aadhaar: String, live: String) -> Result<ComparisonResult, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Compare {
                aadhaar,
                live,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the embedder, so comparisons run strictly one at a time
/// in arrival order. The embedder must already be loaded: model load
/// failures surface at startup, not on the first request.
pub fn spawn_engine<E>(
    embedder: E,
    policy: MatchPolicy,
    queue_depth: usize,
) -> Result<EngineHandle, EngineError>
where
    E: FaceEmbedder + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(queue_depth.max(1));
    let mut pipeline = ComparisonPipeline::new(embedder, policy);

    std::thread::Builder::new()
        .name("facematch-engine".into())
        .spawn(move || {
            tracing::info!(threshold = pipeline.policy().threshold, "engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Compare {
                        aadhaar,
                        live,
                        reply,
                    } => {
                        let result = pipeline.compare(&aadhaar, &live);
                        if reply.send(result).is_err() {
                            tracing::debug!("caller went away before the comparison finished");
                        }
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use facematch_core::{EmbedderError, Embedding, PixelImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns the same embedding for every image and counts overlapping calls.
    struct CountingEmbedder {
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
    }

    impl FaceEmbedder for CountingEmbedder {
        fn embed(&mut self, _image: &PixelImage) -> Result<Option<Embedding>, EmbedderError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(Embedding::new(vec![1.0, 2.0, 3.0])))
        }
    }

    fn tiny_png() -> String {
        use base64::Engine;
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    #[tokio::test]
    async fn test_engine_serializes_comparisons() {
        let max_active = Arc::new(AtomicUsize::new(0));
        let embedder = CountingEmbedder {
            active: Arc::new(AtomicUsize::new(0)),
            max_active: max_active.clone(),
        };
        let handle = spawn_engine(embedder, MatchPolicy::default(), 2).unwrap();
        let img = tiny_png();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                let img = img.clone();
                tokio::spawn(async move { handle.compare(img.clone(), img).await })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert!(result.is_success(), "{result:?}");
        }
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_reports_failures_as_results() {
        let embedder = CountingEmbedder {
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        };
        let handle = spawn_engine(embedder, MatchPolicy::default(), 1).unwrap();
        let result = handle.compare("garbage!".into(), tiny_png()).await.unwrap();
        match result {
            ComparisonResult::Failure { reason } => assert!(reason.starts_with("invalid image format")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
