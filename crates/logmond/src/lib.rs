//! Logmon daemon library - exposes modules for testing.

pub mod logging;
pub mod routes;
pub mod server;
