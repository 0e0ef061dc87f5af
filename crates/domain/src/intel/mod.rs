pub mod entity;
pub mod index;
pub mod parser;
