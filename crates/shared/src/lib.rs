pub mod config;
pub mod draft;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pins;
pub mod selection;
pub mod session;
pub mod time;
pub mod viewport;
