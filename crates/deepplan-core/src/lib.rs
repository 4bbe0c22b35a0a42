pub mod acquire;
pub mod config;
pub mod consolidate;
pub mod errors;
pub mod extract;
pub mod ids;
pub mod manifest;
pub mod pipeline;
pub mod publish;
pub mod storage;
pub mod tables;
pub mod validate;
