//! Scrape job service: Axum routes and environment configuration.

pub mod config;
pub mod server;
