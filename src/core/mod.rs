//! Core engine: everything a scan needs, with no UI concerns.

pub mod blur;
pub mod cache;
pub mod decode;
pub mod duplicate;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod similar;
pub mod state;
