pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
