//! CLI command implementations.

pub mod spending;

pub use spending::SpendingCommand;
