//! Mapping from RabbitMQ queue records to Prometheus gauge observations.

use serde::Deserialize;

use crate::error::ScrapeError;

/// One queue record from `GET /api/queues`.
///
/// Only the fields the exporter needs are decoded; the management API returns
/// many more and they are ignored. Message counters are absent for queues
/// whose stats have not been computed yet, so they default to zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vhost: String,
    #[serde(default, rename = "messages")]
    pub messages_total: f64,
    #[serde(default)]
    pub messages_ready: f64,
    #[serde(default)]
    pub messages_unacknowledged: f64,
}

/// Decode a management API response body.
pub fn decode_queues(body: &str) -> Result<Vec<QueueSnapshot>, ScrapeError> {
    Ok(serde_json::from_str(body)?)
}

/// The three per-queue gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Total,
    Ready,
    Unacknowledged,
}

impl MetricKind {
    /// All kinds, in exposition order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Total,
        MetricKind::Ready,
        MetricKind::Unacknowledged,
    ];

    /// Exposed metric name.
    pub fn metric_name(&self) -> &'static str {
        match self {
            MetricKind::Total => "rabbitmq_individual_queue_messages",
            MetricKind::Ready => "rabbitmq_individual_queue_messages_ready",
            MetricKind::Unacknowledged => "rabbitmq_individual_queue_messages_unacknowledged",
        }
    }

    /// HELP text for the metric family.
    pub fn help(&self) -> &'static str {
        match self {
            MetricKind::Total => "Total number of messages in RabbitMQ queue",
            MetricKind::Ready => "Total number of ready messages in RabbitMQ queue",
            MetricKind::Unacknowledged => {
                "Total number of unacknowledged messages in RabbitMQ queue"
            }
        }
    }

    /// Pick this kind's counter out of a queue record.
    pub fn value_of(&self, queue: &QueueSnapshot) -> f64 {
        match self {
            MetricKind::Total => queue.messages_total,
            MetricKind::Ready => queue.messages_ready,
            MetricKind::Unacknowledged => queue.messages_unacknowledged,
        }
    }
}

/// A declared gauge family: fixed name, help text and label schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub name: &'static str,
    pub help: &'static str,
}

impl MetricDescriptor {
    /// Label names every sample of this family carries, in order.
    pub const LABELS: [&'static str; 3] = ["host", "vhost", "name"];

    fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            name: kind.metric_name(),
            help: kind.help(),
        }
    }
}

/// The descriptor set, declared once when a collector is built and reused on
/// every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptors {
    descriptors: [MetricDescriptor; 3],
}

impl QueueDescriptors {
    pub fn new() -> Self {
        Self {
            descriptors: MetricKind::ALL.map(MetricDescriptor::new),
        }
    }

    /// Descriptor for `kind`.
    pub fn get(&self, kind: MetricKind) -> &MetricDescriptor {
        match kind {
            MetricKind::Total => &self.descriptors[0],
            MetricKind::Ready => &self.descriptors[1],
            MetricKind::Unacknowledged => &self.descriptors[2],
        }
    }

    /// Iterate descriptors in exposition order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter()
    }
}

impl Default for QueueDescriptors {
    fn default() -> Self {
        Self::new()
    }
}

/// Label set identifying one queue within a scrape.
///
/// Values are kept as the broker reported them; escaping happens at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueLabels {
    pub host: String,
    pub vhost: String,
    pub name: String,
}

/// One gauge sample produced by a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricObservation {
    pub kind: MetricKind,
    pub labels: QueueLabels,
    pub value: f64,
}

/// Turn decoded queues into observations, three per queue in input order.
pub fn observations(host: &str, queues: &[QueueSnapshot]) -> Vec<MetricObservation> {
    let mut result = Vec::with_capacity(queues.len() * MetricKind::ALL.len());

    for queue in queues {
        let labels = QueueLabels {
            host: host.to_string(),
            vhost: queue.vhost.clone(),
            name: queue.name.clone(),
        };

        for kind in MetricKind::ALL {
            result.push(MetricObservation {
                kind,
                labels: labels.clone(),
                value: kind.value_of(queue),
            });
        }
    }

    result
}
