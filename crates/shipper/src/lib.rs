// Domain-driven module structure for the tailship log shipper.

// Core infrastructure
pub mod config;
pub mod error;

// Pipeline stages
pub mod source;
pub mod parser;
pub mod sink;
pub mod pipeline;

// Process lifecycle
pub mod runtime;
