pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod observability;
pub mod pipeline;
pub mod repository;
pub mod server;

// Application and infrastructure boundaries
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;
