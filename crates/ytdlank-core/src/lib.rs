pub mod config;
pub mod logging;

pub mod backend;
pub mod checksum;
pub mod error;
pub mod filename;
pub mod loading;
pub mod model;
pub mod orchestrator;
pub mod present;
pub mod sse;

pub use error::ClientError;
