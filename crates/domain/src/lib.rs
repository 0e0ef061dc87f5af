#![forbid(unsafe_code)]

pub mod common;
pub mod flow;
pub mod intel;
