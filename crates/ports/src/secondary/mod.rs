pub mod alert_sink;
pub mod feed_transport;
pub mod metrics_port;
