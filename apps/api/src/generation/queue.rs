//! Generation queue: carries Application ids from the request path to the worker.
//!
//! Messages hold the id only; the worker reloads everything else from the database.
//! Two backends:
//! - `InProcessQueue`: tokio channel, lives and dies with the process.
//! - `RedisQueue`: Redis list, survives restarts of the web process.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::generation::worker::GenerationWorker;

const REDIS_QUEUE_KEY: &str = "tailor:generation";
/// Seconds a BRPOP waits before looping.
const REDIS_POP_TIMEOUT_SECS: u64 = 5;

/// Producer side of the queue. Held in `AppState` as `Arc<dyn JobQueue>`.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, application_id: Uuid) -> Result<()>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process backend
// ────────────────────────────────────────────────────────────────────────────

pub struct InProcessQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl InProcessQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for InProcessQueue {
    async fn enqueue(&self, application_id: Uuid) -> Result<()> {
        self.tx
            .send(application_id)
            .context("Generation worker is not running")
    }

    fn backend(&self) -> &'static str {
        "in-process"
    }
}

/// Consumes the channel until every sender is dropped.
pub fn spawn_in_process_consumer(
    mut rx: mpsc::UnboundedReceiver<Uuid>,
    worker: GenerationWorker,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Generation worker started (in-process queue)");
        while let Some(application_id) = rx.recv().await {
            worker.dispatch(application_id);
        }
        info!("Generation queue closed, worker stopping");
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisQueue {
    conn: MultiplexedConnection,
}

impl RedisQueue {
    pub async fn connect(client: &redis::Client) -> Result<Self> {
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn enqueue(&self, application_id: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        let _len: i64 = redis::cmd("LPUSH")
            .arg(REDIS_QUEUE_KEY)
            .arg(application_id.to_string())
            .query_async(&mut conn)
            .await
            .context("Failed to push generation job to Redis")?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Pops ids with BRPOP on a dedicated connection, reconnecting on errors.
pub fn spawn_redis_consumer(client: redis::Client, worker: GenerationWorker) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Generation worker started (redis queue '{REDIS_QUEUE_KEY}')");
        loop {
            let mut conn = match client.get_multiplexed_tokio_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Generation worker cannot reach Redis: {e}");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            loop {
                let popped: redis::RedisResult<Option<(String, String)>> = redis::cmd("BRPOP")
                    .arg(REDIS_QUEUE_KEY)
                    .arg(REDIS_POP_TIMEOUT_SECS)
                    .query_async(&mut conn)
                    .await;

                match popped {
                    Ok(Some((_key, raw_id))) => match raw_id.parse::<Uuid>() {
                        Ok(application_id) => worker.dispatch(application_id),
                        Err(_) => warn!("Dropping malformed generation job id '{raw_id}'"),
                    },
                    Ok(None) => continue,
                    Err(e) => {
                        error!("Redis BRPOP failed, reconnecting: {e}");
                        break;
                    }
                }
            }

            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    })
}

/// Queues one Application. When the queue rejects it, `mark_failed` is called with
/// the reason before the enqueue error is returned, so no row waits on a message
/// that was never sent.
pub async fn enqueue_or_fail<F, Fut>(
    queue: &dyn JobQueue,
    application_id: Uuid,
    mark_failed: F,
) -> Result<()>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let Err(e) = queue.enqueue(application_id).await else {
        return Ok(());
    };
    error!("Could not queue application {application_id}: {e:#}");
    if let Err(mark_err) = mark_failed(format!("Could not queue generation: {e}")).await {
        error!("Could not mark application {application_id} as failed: {mark_err:#}");
    }
    Err(e)
}

/// Re-enqueues Applications left unfinished by a previous run.
pub async fn requeue_unfinished(pool: &sqlx::PgPool, queue: &dyn JobQueue) -> Result<usize> {
    let ids = crate::generation::applications::list_unfinished(pool).await?;
    for id in &ids {
        queue.enqueue(*id).await?;
    }
    if !ids.is_empty() {
        info!("Re-enqueued {} unfinished applications", ids.len());
    }
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct RejectingQueue;

    #[async_trait]
    impl JobQueue for RejectingQueue {
        async fn enqueue(&self, _application_id: Uuid) -> Result<()> {
            anyhow::bail!("redis unreachable")
        }

        fn backend(&self) -> &'static str {
            "rejecting"
        }
    }

    fn recorder() -> Arc<Mutex<Option<String>>> {
        Arc::new(Mutex::new(None))
    }

    #[tokio::test]
    async fn test_in_process_queue_delivers_in_order() {
        let (queue, mut rx) = InProcessQueue::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        queue.enqueue(first).await.unwrap();
        queue.enqueue(second).await.unwrap();

        assert_eq!(rx.recv().await, Some(first));
        assert_eq!(rx.recv().await, Some(second));
    }

    #[tokio::test]
    async fn test_enqueue_fails_once_consumer_is_gone() {
        let (queue, rx) = InProcessQueue::new();
        drop(rx);
        assert!(queue.enqueue(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_enqueue_marks_application_failed() {
        let marked = recorder();
        let sink = marked.clone();
        let result = enqueue_or_fail(&RejectingQueue, Uuid::new_v4(), |message| async move {
            *sink.lock().unwrap() = Some(message);
            Ok(true)
        })
        .await;

        assert!(result.is_err());
        let message = marked.lock().unwrap().clone().unwrap();
        assert!(message.contains("redis unreachable"));
    }

    #[tokio::test]
    async fn test_enqueue_error_survives_a_failed_status_update() {
        let result = enqueue_or_fail(&RejectingQueue, Uuid::new_v4(), |_| async {
            Err(anyhow::anyhow!("database down"))
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("redis unreachable"));
    }

    #[tokio::test]
    async fn test_accepted_enqueue_leaves_status_alone() {
        let (queue, mut rx) = InProcessQueue::new();
        let marked = recorder();
        let sink = marked.clone();
        let id = Uuid::new_v4();

        enqueue_or_fail(&queue, id, |message| async move {
            *sink.lock().unwrap() = Some(message);
            Ok(true)
        })
        .await
        .unwrap();

        assert_eq!(rx.recv().await, Some(id));
        assert!(marked.lock().unwrap().is_none());
    }
}
