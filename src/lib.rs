pub mod analyzer;
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod host;
pub mod models;
pub mod queue;
pub mod scan;
pub mod scoring;
pub mod server;
