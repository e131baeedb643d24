// Library crate for integration tests.
// main.rs uses these modules through the library.

pub mod config;
pub mod error;
pub mod integrity;
pub mod not_found;
pub mod notifier;
pub mod recipients;
pub mod report;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod sources;
pub mod state;
pub mod store;
pub mod trigger;
