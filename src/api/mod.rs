//! HTTP API Module
//!
//! Serves the cluster observation, clock, and file relay routes.

mod http;

pub use http::HttpServer;
