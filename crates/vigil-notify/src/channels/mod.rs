pub mod host;
pub mod log;
pub mod webhook;
