//! Core library for the `swvbench` CLI.
//!
//! A fixed pool of workers sends batches of HTTP requests at one endpoint.
//! Every outcome lands in a shared [`metrics::StatsAggregator`], and a
//! [`metrics::Reporter`] samples it once per tick into a `stat-*.log` file.
//! The binary wires these together; the pieces are exposed here so they can
//! be driven and tested on their own.
pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
