//! Reading and writing pprof files
//!
//! Go writes profiles as gzip-compressed protobuf. Input may be compressed
//! or not; output is always compressed.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use prost::Message;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use super::proto::Profile;
use super::tables::ProfileTables;
use crate::domain::ProfileError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read and validate the profile at `path`
///
/// # Errors
/// Returns an error if the file cannot be read or does not hold a valid profile.
pub fn read_profile<P: AsRef<Path>>(path: P) -> Result<Profile, ProfileError> {
    let path = path.as_ref();
    let data = fs::read(path)
        .map_err(|source| ProfileError::Io { path: path.to_path_buf(), source })?;
    decode_profile(&data)
}

/// Decode a profile, decompressing it first if it is gzipped
///
/// # Errors
/// Returns an error on a broken gzip stream, malformed protobuf, or a
/// profile with dangling references.
pub fn decode_profile(data: &[u8]) -> Result<Profile, ProfileError> {
    let profile = if data.starts_with(&GZIP_MAGIC) {
        let mut raw = Vec::new();
        GzDecoder::new(data).read_to_end(&mut raw).map_err(ProfileError::Decompress)?;
        debug!("Decompressed profile: {} -> {} bytes", data.len(), raw.len());
        Profile::decode(raw.as_slice())?
    } else {
        Profile::decode(data)?
    };
    ProfileTables::new(&profile)?;
    Ok(profile)
}

/// Encode a profile as gzip-compressed protobuf
///
/// # Errors
/// Returns an error if compression fails.
pub fn encode_profile(profile: &Profile) -> Result<Vec<u8>, ProfileError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&profile.encode_to_vec()).map_err(ProfileError::Write)?;
    encoder.finish().map_err(ProfileError::Write)
}

/// Encode `profile` fully, then write it to `out`
///
/// Nothing reaches `out` if encoding fails.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_profile<W: Write>(profile: &Profile, mut out: W) -> Result<(), ProfileError> {
    let bytes = encode_profile(profile)?;
    out.write_all(&bytes).map_err(ProfileError::Write)?;
    out.flush().map_err(ProfileError::Write)
}
