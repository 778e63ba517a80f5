//! Domain model for go-stack-profile
//!
//! This module contains core domain types and errors that provide:
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{round_up_to_next_pow2, FuncIndex, StackCapacity, MIN_STACK_SIZE};

pub use errors::{ImageError, ProfileError};
