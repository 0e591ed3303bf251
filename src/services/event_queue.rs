//! Bounded worker pool for Slack Events API callbacks.
//!
//! Slack expects the events endpoint to answer within a few seconds, so
//! callbacks are acknowledged immediately and handled here off the request
//! path. The queue is bounded; events submitted beyond capacity are dropped
//! with a warning rather than backpressuring the HTTP handler.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::models::EventsConfig;
use crate::infrastructure::slack::{slack_mention, SlackClient, SlackEvent};
use crate::services::commands::CommandHandler;

enum Job {
    Event(Value),
    Shutdown,
}

/// Fixed pool of workers draining a shared queue of event payloads.
pub struct EventQueue {
    sender: mpsc::Sender<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl EventQueue {
    pub fn new(
        config: &EventsConfig,
        handler: Arc<CommandHandler>,
        slack: Arc<SlackClient>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                let slack = Arc::clone(&slack);
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(Job::Event(payload)) => {
                                handle_event(&handler, &slack, payload).await;
                            }
                            Some(Job::Shutdown) | None => break,
                        }
                    }
                    debug!(worker, "event worker stopped");
                })
            })
            .collect();

        Self {
            sender,
            workers: Mutex::new(workers),
        }
    }

    /// Queue an `event_callback` payload for asynchronous handling.
    pub fn enqueue(&self, payload: Value) {
        if let Err(e) = self.sender.try_send(Job::Event(payload)) {
            warn!("dropping Slack event: {e}");
        }
    }

    /// Drain queued events and stop the workers. Each worker exits after
    /// taking one shutdown job, so everything queued before the shutdown
    /// jobs is still handled.
    pub async fn shutdown(&self) {
        info!("shutting down Slack event queue");
        let mut workers = self.workers.lock().await;
        for _ in workers.iter() {
            if self.sender.send(Job::Shutdown).await.is_err() {
                break;
            }
        }
        for worker in workers.drain(..) {
            if let Err(e) = worker.await {
                warn!("event worker exited abnormally: {e}");
            }
        }
    }
}

async fn handle_event(handler: &CommandHandler, slack: &SlackClient, payload: Value) {
    let event = match SlackEvent::from_json(&payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("failed to parse Slack event: {e:#}");
            return;
        }
    };

    if event.event_type != "app_mention" {
        debug!(
            event_type = %event.event_type,
            "ignoring Slack event with unsupported type"
        );
        return;
    }

    // Only respond when the message starts by mentioning the bot.
    let mention = slack_mention(&event.authorized_user_id);
    let mut tokens = event.text.split_whitespace();
    if tokens.next() != Some(mention.as_str()) {
        return;
    }
    let text = tokens.collect::<Vec<_>>().join(" ");

    let response = handler.handle(&mention, &text, &event.context).await;
    slack
        .post_message(&response.text, &event.context, event.thread_ts.as_deref())
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{HaikuLine, Poem, SlackConfig, SyllableCount};
    use crate::domain::ports::{LineRepository, LineTally, PoemRepository, SampleFilter};
    use crate::services::{BlameTracker, PoemComposer, Sampler, StatsAggregator};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Repository whose sampling never completes, pinning any worker that
    /// picks up a composition job.
    struct StalledRepo;

    #[async_trait]
    impl LineRepository for StalledRepo {
        async fn add(&self, _line: &HaikuLine) -> Result<()> {
            unimplemented!()
        }

        async fn find(
            &self,
            _text: &str,
            _syllables: SyllableCount,
            _team_id: &str,
        ) -> Result<Option<HaikuLine>> {
            unimplemented!()
        }

        async fn remove(
            &self,
            _text: &str,
            _syllables: SyllableCount,
            _team_id: &str,
        ) -> Result<u64> {
            unimplemented!()
        }

        async fn claim(
            &self,
            _text: &str,
            _syllables: SyllableCount,
            _team_id: &str,
            _new_owner: &str,
        ) -> Result<bool> {
            unimplemented!()
        }

        async fn sample(&self, _filter: &SampleFilter, _n: usize) -> Result<Vec<HaikuLine>> {
            std::future::pending().await
        }

        async fn tally(&self, _team_id: &str, _owner: Option<&str>) -> Result<LineTally> {
            unimplemented!()
        }
    }

    struct NoPoems;

    #[async_trait]
    impl PoemRepository for NoPoems {
        async fn insert(&self, _poem: &Poem) -> Result<()> {
            unimplemented!()
        }

        async fn latest(&self, _team_id: &str, _channel_id: &str) -> Result<Option<Poem>> {
            unimplemented!()
        }

        async fn count(&self, _team_id: &str, _contributor: Option<&str>) -> Result<i64> {
            unimplemented!()
        }
    }

    fn stalled_handler() -> Arc<CommandHandler> {
        let lines: Arc<dyn LineRepository> = Arc::new(StalledRepo);
        let poems: Arc<dyn PoemRepository> = Arc::new(NoPoems);
        let composer = PoemComposer::new(Sampler::new(lines.clone()), poems.clone());
        let stats = StatsAggregator::new(lines.clone(), poems.clone());
        let blame = BlameTracker::new(poems);
        Arc::new(CommandHandler::new(lines, composer, stats, blame))
    }

    fn mention_payload() -> Value {
        json!({
            "type": "event_callback",
            "team_id": "T1",
            "authorizations": [{"user_id": "UBOT"}],
            "event": {
                "type": "app_mention",
                "user": "U1",
                "channel": "C1",
                "text": "<@UBOT>"
            }
        })
    }

    #[tokio::test]
    async fn test_enqueue_past_capacity_drops_without_blocking() {
        let slack = Arc::new(SlackClient::new(&SlackConfig::default()).expect("client"));
        let config = EventsConfig {
            workers: 1,
            queue_capacity: 1,
        };
        let queue = EventQueue::new(&config, stalled_handler(), slack);

        // Let the single worker take the first job and stall on it.
        queue.enqueue(mention_payload());
        tokio::time::sleep(Duration::from_millis(50)).await;

        // One more fills the queue slot; everything past that must be
        // dropped immediately instead of blocking the caller.
        let overflow = async {
            for _ in 0..16 {
                queue.enqueue(mention_payload());
            }
        };
        tokio::time::timeout(Duration::from_secs(1), overflow)
            .await
            .expect("enqueue must not block on a full queue");
    }
}
