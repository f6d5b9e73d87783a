//! Observability for the publish/subscribe client
//!
//! Structured logging to standard output with span macros for MQTT
//! operations and the publish loop lifecycle.

pub mod logging;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macros for structured logging
pub use logging::{lifecycle_span, mqtt_span};
