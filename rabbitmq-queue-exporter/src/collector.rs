//! Scrape-driven collection of RabbitMQ queue metrics.
//!
//! Every scrape runs one independent cycle: fetch `/api/queues`, decode it and
//! turn each queue into three gauge observations. Nothing is cached between
//! cycles, and a failed cycle yields an empty metric set for that scrape only.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::broker::BrokerApi;
use crate::config::BrokerConfig;
use crate::error::ScrapeError;
use crate::exposition::encode_observations;
use crate::mapping::{
    MetricObservation, QueueDescriptors, QueueSnapshot, decode_queues, observations,
};

/// Collects queue metrics from one broker.
///
/// Holds only immutable state, so a single instance serves concurrent scrapes.
pub struct QueueCollector {
    /// Broker connection settings.
    config: BrokerConfig,
    /// Client used for management API calls.
    api: Arc<dyn BrokerApi>,
    /// Metric families declared for this collector.
    descriptors: Arc<QueueDescriptors>,
}

impl QueueCollector {
    /// Create a collector for `config` using `api` for HTTP calls.
    pub fn new(config: BrokerConfig, api: Arc<dyn BrokerApi>) -> Self {
        Self {
            config,
            api,
            descriptors: Arc::new(QueueDescriptors::new()),
        }
    }

    /// Broker connection settings.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Declared metric families.
    pub fn descriptors(&self) -> &QueueDescriptors {
        &self.descriptors
    }

    /// Fetch and decode the queue list.
    pub async fn fetch(&self) -> Result<Vec<QueueSnapshot>, ScrapeError> {
        let url = self.config.queues_url();
        let response = self
            .api
            .get(&url, &self.config.username, &self.config.password)
            .await?;

        if response.status != 200 {
            return Err(ScrapeError::Status(response.status));
        }

        decode_queues(&response.body)
    }

    /// Run one collection cycle.
    ///
    /// Failures are logged and produce no observations.
    pub async fn collect(&self) -> Vec<MetricObservation> {
        let started = Instant::now();

        match self.fetch().await {
            Ok(queues) => {
                debug!(
                    host = %self.config.host,
                    queues = queues.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Collected queue metrics"
                );
                observations(&self.config.host, &queues)
            }
            Err(e) => {
                warn!(
                    host = %self.config.host,
                    error_kind = e.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "{}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Run one collection cycle and encode it for the scrape response.
    pub async fn render(&self) -> Result<String, std::fmt::Error> {
        let observations = self.collect().await;
        encode_observations(&self.descriptors, observations)
    }
}

/// Create a shareable collector handle.
pub type SharedCollector = Arc<QueueCollector>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::broker::BrokerResponse;
    use crate::mapping::MetricKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Broker double answering every call with the same canned result.
    pub(crate) struct FakeBroker {
        answer: Result<BrokerResponse, String>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeBroker {
        pub(crate) fn ok(body: &str) -> Arc<Self> {
            Self::status(200, body)
        }

        pub(crate) fn status(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(BrokerResponse::new(status, body)),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                answer: Err("connection refused".to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BrokerApi for FakeBroker {
        async fn get(
            &self,
            url: &str,
            username: &str,
            password: &str,
        ) -> Result<BrokerResponse, ScrapeError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                username.to_string(),
                password.to_string(),
            ));
            self.answer.clone().map_err(ScrapeError::transport)
        }
    }

    pub(crate) const ONE_QUEUE: &str = r#"[{"name":"q1","vhost":"/","messages":5,"messages_ready":3,"messages_unacknowledged":2}]"#;

    pub(crate) fn make_collector(api: Arc<FakeBroker>) -> QueueCollector {
        QueueCollector::new(BrokerConfig::new("h", "guest", "guest"), api)
    }

    #[tokio::test]
    async fn test_fetch_uses_queues_url_and_credentials() {
        let broker = FakeBroker::ok("[]");
        let collector = QueueCollector::new(
            BrokerConfig::new("rabbit:15672", "monitor", "s3cret"),
            broker.clone(),
        );

        collector.fetch().await.unwrap();

        assert_eq!(
            broker.calls(),
            vec![(
                "http://rabbit:15672/api/queues".to_string(),
                "monitor".to_string(),
                "s3cret".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_collect_three_observations_per_queue() {
        let body = r#"[
            {"name":"a","vhost":"/","messages":5,"messages_ready":3,"messages_unacknowledged":2},
            {"name":"b","vhost":"/","messages":0,"messages_ready":0,"messages_unacknowledged":0},
            {"name":"a","vhost":"staging","messages":8,"messages_ready":8,"messages_unacknowledged":0},
            {"name":"c","vhost":"/","messages":1,"messages_ready":0,"messages_unacknowledged":1}
        ]"#;
        let collector = make_collector(FakeBroker::ok(body));

        let obs = collector.collect().await;

        assert_eq!(obs.len(), 12);
        for kind in MetricKind::ALL {
            assert_eq!(obs.iter().filter(|o| o.kind == kind).count(), 4);
        }
        assert!(obs.iter().all(|o| o.labels.host == "h"));
        assert!(
            obs.iter()
                .any(|o| o.labels.vhost == "staging" && o.labels.name == "a" && o.value == 8.0)
        );
    }

    #[tokio::test]
    async fn test_collect_server_error_yields_nothing() {
        let collector = make_collector(FakeBroker::status(500, "internal error"));

        assert!(collector.collect().await.is_empty());
        assert!(matches!(
            collector.fetch().await,
            Err(ScrapeError::Status(500))
        ));
    }

    #[tokio::test]
    async fn test_collect_non_ok_success_status_yields_nothing() {
        let collector = make_collector(FakeBroker::status(204, ""));

        assert!(matches!(
            collector.fetch().await,
            Err(ScrapeError::Status(204))
        ));
        assert!(collector.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_collect_unauthorized_yields_nothing() {
        let collector = make_collector(FakeBroker::status(
            401,
            r#"{"error":"not_authorised","reason":"Login failed"}"#,
        ));

        assert!(collector.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_collect_malformed_body_yields_nothing() {
        let collector = make_collector(FakeBroker::ok(r#"{"queues": []}"#));

        assert!(collector.collect().await.is_empty());
        assert!(matches!(
            collector.fetch().await,
            Err(ScrapeError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_transport_error_yields_nothing() {
        let collector = make_collector(FakeBroker::unreachable());

        assert!(collector.collect().await.is_empty());
        assert!(matches!(
            collector.fetch().await,
            Err(ScrapeError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_cycle_does_not_affect_next() {
        let broker = FakeBroker::unreachable();
        let collector = make_collector(broker.clone());

        assert!(collector.collect().await.is_empty());
        assert!(collector.collect().await.is_empty());
        assert_eq!(broker.calls().len(), 2, "Every scrape must hit the broker");
    }

    #[tokio::test]
    async fn test_render_example_queue() {
        let collector = make_collector(FakeBroker::ok(ONE_QUEUE));

        let body = collector.render().await.unwrap();

        assert!(body.contains(
            "rabbitmq_individual_queue_messages{host=\"h\",vhost=\"/\",name=\"q1\"} 5"
        ));
        assert!(body.contains(
            "rabbitmq_individual_queue_messages_ready{host=\"h\",vhost=\"/\",name=\"q1\"} 3"
        ));
        assert!(body.contains(
            "rabbitmq_individual_queue_messages_unacknowledged{host=\"h\",vhost=\"/\",name=\"q1\"} 2"
        ));
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let collector = make_collector(FakeBroker::ok(ONE_QUEUE));

        let first = collector.render().await.unwrap();
        let second = collector.render().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_descriptors_are_stable_across_scrapes() {
        let collector = make_collector(FakeBroker::ok(ONE_QUEUE));
        let before = collector.descriptors().clone();

        collector.render().await.unwrap();

        assert_eq!(collector.descriptors(), &before);
    }

    #[tokio::test]
    async fn test_concurrent_scrapes() {
        let collector: SharedCollector = Arc::new(make_collector(FakeBroker::ok(ONE_QUEUE)));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let collector = collector.clone();
                tokio::spawn(async move { collector.collect().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 3);
        }
    }
}
