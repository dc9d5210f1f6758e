//! Progress reporting for deployment runs

mod handler;
mod logging;

pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
