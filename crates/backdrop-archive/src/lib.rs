//! Flat image extraction from zip uploads.
//!
//! # Architecture
//!
//! - `filter.rs` - Entry admission rules (images only, no metadata shadows)
//! - `extract.rs` - Sequential entry walk with collision handling
//! - `error.rs` - Shared error type
//!
//! Archives are flattened: directory structure inside the container is
//! discarded and every surviving entry lands directly in the destination
//! directory, with numeric suffixes resolving leaf-name collisions.

pub use error::{Error, Result};
pub use extract::extract;
pub use filter::keep_entry;

mod error;
mod extract;
mod filter;
