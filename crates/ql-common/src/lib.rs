//! Quill Common
//!
//! Runtime helpers shared by every Quill binary.

pub mod logging;

pub use logging::init_logging;
