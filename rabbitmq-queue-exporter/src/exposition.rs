//! Text exposition of one scrape's observations.
//!
//! Each scrape gets a fresh [`Registry`] holding a scrape-scoped collector, so
//! nothing survives from one scrape to the next. The descriptors come from the
//! long-lived [`QueueDescriptors`].

use std::sync::Arc;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{DescriptorEncoder, EncodeLabelSet, EncodeMetric};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;

use crate::mapping::{MetricObservation, QueueDescriptors, QueueLabels};

/// Content type of the encoded body.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Label set as written to the wire.
///
/// The text format requires `\`, `"` and newlines inside label values to be
/// escaped, and broker names may contain any of them.
#[derive(Debug, Clone, PartialEq, Eq, EncodeLabelSet)]
struct SampleLabels {
    host: String,
    vhost: String,
    name: String,
}

impl From<&QueueLabels> for SampleLabels {
    fn from(labels: &QueueLabels) -> Self {
        Self {
            host: escape_label_value(&labels.host),
            vhost: escape_label_value(&labels.vhost),
            name: escape_label_value(&labels.name),
        }
    }
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Observations of a single scrape, bound to the declared descriptors.
#[derive(Debug)]
struct ScrapeSamples {
    descriptors: Arc<QueueDescriptors>,
    observations: Vec<MetricObservation>,
}

impl Collector for ScrapeSamples {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        for descriptor in self.descriptors.iter() {
            let mut family = encoder.encode_descriptor(
                descriptor.name,
                descriptor.help,
                None,
                MetricType::Gauge,
            )?;

            for obs in self
                .observations
                .iter()
                .filter(|o| o.kind == descriptor.kind)
            {
                let labels = SampleLabels::from(&obs.labels);
                let gauge = ConstGauge::new(obs.value);
                gauge.encode(family.encode_family(&labels)?)?;
            }
        }
        Ok(())
    }
}

/// Encode `observations` under `descriptors`.
///
/// Families appear in descriptor order and samples in the order given. An
/// empty slice still declares the three families, with no samples.
pub fn encode_observations(
    descriptors: &Arc<QueueDescriptors>,
    observations: Vec<MetricObservation>,
) -> Result<String, std::fmt::Error> {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(ScrapeSamples {
        descriptors: Arc::clone(descriptors),
        observations,
    }));

    let mut body = String::new();
    encode(&mut body, &registry)?;
    Ok(body)
}
