//! # pokesync-operator
//!
//! Loads configuration, initializes logging and runs the controller with
//! its garbage collector over in-memory stores.

pub mod config;
pub mod observability;
mod operator;

pub use config::{AppConfig, ConfigError};
pub use operator::{Operator, OperatorError};
