//! pprof profile handling
//!
//! - **`proto`**: prost message types for `profile.proto`
//! - **`tables`**: validated id lookups and string interning
//! - **`codec`**: gzip + protobuf reading and writing
//! - **`rewrite`**: goroutine profile → stack space profile

pub mod codec;
pub mod proto;
pub mod rewrite;
pub mod tables;

pub use codec::{decode_profile, encode_profile, read_profile, write_profile};
pub use proto::Profile;
pub use rewrite::{rewrite, rewrite_with_stats, RewriteStats, SpDeltaSource};
pub use tables::ProfileTables;
