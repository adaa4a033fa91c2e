//! Session storage for uploaded image archives.
//!
//! # Architecture
//!
//! - `layout.rs` - Directory layout under the storage root
//! - `ingest.rs` - Upload orchestration (validate, extract, bound, address)
//! - `address.rs` - Public address encoding and traversal-safe resolution
//! - `mime.rs` - Extension-derived MIME types
//!
//! One upload produces one session: a uniquely named directory holding the
//! extracted images, reachable only through percent-encoded public
//! addresses that can never escape the storage root.

pub use address::{ADDRESS_PREFIX, encode_address, resolve_address, serve_image};
pub use error::{Error, Result};
pub use ingest::{DEFAULT_MAX_IMAGES, IngestOutcome, Ingestor};
pub use layout::{StoreLayout, StoreLayoutBuilder, ensure_layout};
pub use mime::mime_for;

mod address;
mod error;
mod ingest;
mod layout;
mod mime;
