#![forbid(unsafe_code)]

pub mod aggregator;
pub mod flow_classifier;
pub mod refresh_scheduler;
pub mod source;
