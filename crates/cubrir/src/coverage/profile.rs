//! Indexed execution profile reader.
//!
//! The indexed profile stores, per instrumented function, a structural hash
//! and the counter values recorded during execution. The loader joins these
//! counters against the per-object coverage mappings; a function whose
//! mapping hash differs from the profile's stored hash is reported as a
//! mismatch and keeps zero counters.
//!
//! ## Layout (`*.cprof`, little-endian)
//!
//! ```text
//! u64 magic      b"cubprof\x81"
//! u32 version    currently 1
//! u32 record_count
//! record: u32 name_len, name bytes, u64 structural_hash,
//!         u32 counter_count, u64 counters[counter_count]
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::coverage::wire::ByteCursor;
use crate::result::{CubrirError, CubrirResult};

/// File magic for the indexed profile container.
pub(crate) const PROFILE_MAGIC: u64 = u64::from_le_bytes(*b"cubprof\x81");

/// Container version this build understands.
pub(crate) const PROFILE_VERSION: u32 = 1;

/// Counters recorded for one instrumented function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Structural hash of the function the counters were recorded against
    pub structural_hash: u64,
    /// Raw execution counters, indexed by counter id
    pub counters: Vec<u64>,
}

/// Per-function hashed execution counters decoded from an indexed profile
#[derive(Debug, Default)]
pub struct ProfileData {
    records: HashMap<String, ProfileRecord>,
}

impl ProfileData {
    /// Read and decode an indexed profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is structurally
    /// malformed; both are fatal for the whole load.
    pub fn load(path: &Path) -> CubrirResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode an indexed profile from raw bytes.
    pub fn parse(bytes: &[u8]) -> CubrirResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let magic = cursor.read_u64("profile magic")?;
        if magic != PROFILE_MAGIC {
            return Err(CubrirError::BadMagic { what: "profile" });
        }
        let version = cursor.read_u32("profile version")?;
        if version != PROFILE_VERSION {
            return Err(CubrirError::UnsupportedVersion {
                what: "profile",
                found: version,
                expected: PROFILE_VERSION,
            });
        }

        let record_count = cursor.read_u32("profile record count")? as usize;
        let mut records = HashMap::with_capacity(record_count.min(1 << 16));
        for _ in 0..record_count {
            let name = cursor.read_string("profile function name")?;
            let structural_hash = cursor.read_u64("profile structural hash")?;
            let counter_count = cursor.read_u32("profile counter count")? as usize;
            if counter_count * 8 > cursor.remaining() {
                return Err(CubrirError::Truncated {
                    what: "profile counters",
                    offset: cursor.pos(),
                });
            }
            let mut counters = Vec::with_capacity(counter_count);
            for _ in 0..counter_count {
                counters.push(cursor.read_u64("profile counter")?);
            }
            records.insert(
                name,
                ProfileRecord {
                    structural_hash,
                    counters,
                },
            );
        }
        tracing::debug!(functions = records.len(), "decoded indexed profile");
        Ok(Self { records })
    }

    /// Look up the counters recorded for `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ProfileRecord> {
        self.records.get(name)
    }

    /// Number of functions in the profile
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the profile holds no functions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(records: &[(&str, u64, &[u64])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&PROFILE_MAGIC.to_le_bytes());
        buf.extend_from_slice(&PROFILE_VERSION.to_le_bytes());
        buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for (name, hash, counters) in records {
            buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(&hash.to_le_bytes());
            buf.extend_from_slice(&(counters.len() as u32).to_le_bytes());
            for c in *counters {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf
    }

    #[test]
    fn decodes_records_by_name() {
        let bytes = encode(&[("main", 0xabc, &[5, 0, 3]), ("helper", 0xdef, &[2])]);
        let profile = ProfileData::parse(&bytes).unwrap();
        assert_eq!(profile.len(), 2);
        let main = profile.lookup("main").unwrap();
        assert_eq!(main.structural_hash, 0xabc);
        assert_eq!(main.counters, vec![5, 0, 3]);
        assert!(profile.lookup("absent").is_none());
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = encode(&[]);
        bytes[0] ^= 0xff;
        assert!(ProfileData::parse(&bytes).is_err());
    }

    #[test]
    fn rejects_future_version() {
        let mut bytes = encode(&[]);
        bytes[8..12].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            ProfileData::parse(&bytes),
            Err(CubrirError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn oversized_counter_count_is_truncation_not_allocation() {
        let mut bytes = encode(&[("main", 1, &[])]);
        // Rewrite the counter count field (last 4 bytes) to a huge value.
        let len = bytes.len();
        bytes[len - 4..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            ProfileData::parse(&bytes),
            Err(CubrirError::Truncated { what: "profile counters", .. })
        ));
    }
}
