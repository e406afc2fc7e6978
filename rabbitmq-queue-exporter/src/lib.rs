//! Prometheus exporter for RabbitMQ queue depths.
//!
//! On every scrape the exporter queries the RabbitMQ management API for its
//! queue list and exposes three gauges per queue, labelled with the broker
//! host, the vhost and the queue name:
//!
//! - `rabbitmq_individual_queue_messages`
//! - `rabbitmq_individual_queue_messages_ready`
//! - `rabbitmq_individual_queue_messages_unacknowledged`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  RabbitMQ API   │<────│    Collector    │<────│   HTTP Server   │
//! │  (/api/queues)  │────>│ (per scrape)    │────>│   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Broker errors never fail a scrape: they are logged and the affected scrape
//! simply carries no queue samples.
//!
//! # Usage
//!
//! ```bash
//! RABBITMQ_HOST=localhost:15672 RABBITMQ_USER=guest RABBITMQ_PASSWORD=guest \
//!     rabbitmq-queue-exporter --port 8000
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod broker;
pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod http;
pub mod mapping;

pub use broker::{BrokerApi, BrokerResponse, HttpBroker};
pub use collector::{QueueCollector, SharedCollector};
pub use config::{BrokerConfig, ConfigError, ExporterConfig};
pub use error::{ScrapeError, ServerError};
pub use http::HttpServer;
pub use mapping::{MetricKind, MetricObservation, QueueSnapshot};
