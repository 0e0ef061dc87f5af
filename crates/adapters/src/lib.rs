#![deny(unsafe_code)]

pub mod alert;
pub mod flow;
pub mod intel;
