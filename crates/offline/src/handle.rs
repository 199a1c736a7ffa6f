//! Message-channel handle to the worker task.
//!
//! The worker runs as its own task and shares no memory with consumers;
//! everything goes over an mpsc channel, fetches answered on a oneshot.
//! Dropping every handle closes the channel and the worker drains and
//! exits.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};
use url::Url;

use crate::fetcher::NetworkFetcher;
use crate::storage::CacheStorage;
use crate::worker::{AssetRequest, ClientMessage, FetchOutcome, OfflineCacheError, OfflineWorker};

enum WorkerCommand {
    Fetch {
        request: AssetRequest,
        respond_to: oneshot::Sender<Result<FetchOutcome, OfflineCacheError>>,
    },
    Message(ClientMessage),
}

/// Cloneable handle to a running offline worker.
#[derive(Clone)]
pub struct OfflineCacheHandle {
    tx: mpsc::Sender<WorkerCommand>,
}

impl OfflineCacheHandle {
    /// Start a worker over the given storage and network, install and
    /// activate it, and return the handle consumers fetch through.
    #[must_use]
    pub fn spawn(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn NetworkFetcher>,
        origin: Url,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<WorkerCommand>(32);

        tokio::spawn(async move {
            let mut worker = OfflineWorker::new(storage, fetcher, origin);
            worker.install().await;
            worker.activate().await;

            while let Some(command) = rx.recv().await {
                match command {
                    WorkerCommand::Fetch {
                        request,
                        respond_to,
                    } => {
                        let outcome = worker.handle_fetch(&request).await;
                        // Caller gave up waiting; nothing to clean up.
                        let _ = respond_to.send(outcome);
                    }
                    WorkerCommand::Message(message) => worker.handle_message(message),
                }
            }
            info!("offline worker shutting down");
        });

        Self { tx }
    }

    /// Ask the worker to answer one fetch.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineCacheError::ChannelClosed`] if the worker task is
    /// gone, or [`OfflineCacheError::Unavailable`] from the worker itself.
    #[instrument(skip(self), fields(url = %request.url))]
    pub async fn fetch(&self, request: AssetRequest) -> Result<FetchOutcome, OfflineCacheError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(WorkerCommand::Fetch {
                request,
                respond_to,
            })
            .await
            .map_err(|_| OfflineCacheError::ChannelClosed)?;
        response.await.map_err(|_| OfflineCacheError::ChannelClosed)?
    }

    /// Send a control message; silently dropped if the worker is gone.
    pub async fn message(&self, message: ClientMessage) {
        if self.tx.send(WorkerCommand::Message(message)).await.is_err() {
            debug!("offline worker gone, control message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::fetcher::FetchError;
    use crate::storage::{CachedResponse, MemoryCacheStorage};

    use super::*;

    /// Serves every URL with a body echoing its path.
    struct EchoFetcher;

    #[async_trait]
    impl NetworkFetcher for EchoFetcher {
        async fn get(&self, url: &Url) -> Result<CachedResponse, FetchError> {
            Ok(CachedResponse {
                status: 200,
                content_type: Some("text/html".to_string()),
                body: Bytes::copy_from_slice(url.path().as_bytes()),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_through_handle() {
        let origin = Url::parse("http://localhost:3000").expect("origin");
        let handle = OfflineCacheHandle::spawn(
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(EchoFetcher),
            origin.clone(),
        );

        let request = AssetRequest::get(origin.join("/orders").expect("url"));
        let outcome = handle.fetch(request).await.expect("fetch");
        match outcome {
            FetchOutcome::Response(response) => {
                assert_eq!(response.body, Bytes::from_static(b"/orders"));
            }
            FetchOutcome::PassThrough => panic!("expected a response"),
        }

        // Control messages are accepted while running.
        handle.message(ClientMessage::SkipWaiting).await;
    }
}
