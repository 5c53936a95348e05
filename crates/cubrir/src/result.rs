//! Result and error types for Cubrir.

use thiserror::Error;

/// Result type for Cubrir operations
pub type CubrirResult<T> = Result<T, CubrirError>;

/// Errors that can occur in Cubrir
///
/// The loader resolves every variant locally to either "continue with
/// partial data" or "abort, return empty result plus message"; nothing here
/// crosses a public entry point as a panic.
#[derive(Debug, Error)]
pub enum CubrirError {
    /// Profile missing/corrupt, or an object file unparseable for a
    /// structural reason. Fatal for the whole load.
    #[error("failed to load coverage: {message}: {path}")]
    FatalLoad {
        /// Path of the offending file
        path: String,
        /// Error message
        message: String,
        /// Underlying parse or I/O failure, when one exists
        #[source]
        source: Option<Box<CubrirError>>,
    },

    /// The file does not start with the expected container magic.
    ///
    /// For coverage mappings this doubles as the recoverable "no coverage
    /// data found" case; the loader downgrades it to a warning and the
    /// batch continues.
    #[error("bad magic for {what}")]
    BadMagic {
        /// Container being decoded
        what: &'static str,
    },

    /// Input ended before a field could be fully decoded
    #[error("truncated {what} at byte {offset}")]
    Truncated {
        /// Field being decoded
        what: &'static str,
        /// Byte offset where decoding stopped
        offset: usize,
    },

    /// A decoded string was not valid UTF-8
    #[error("invalid utf-8 in {what} at byte {offset}")]
    InvalidUtf8 {
        /// Field being decoded
        what: &'static str,
        /// Byte offset of the string
        offset: usize,
    },

    /// Unsupported container version
    #[error("unsupported {what} version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Container being decoded
        what: &'static str,
        /// Version found in the file
        found: u32,
        /// Version this build understands
        expected: u32,
    },

    /// A table index in the coverage mapping points outside its table
    #[error("{what} index {index} out of range (limit {limit})")]
    BadIndex {
        /// Table being indexed
        what: &'static str,
        /// Index found in the file
        index: u32,
        /// Number of entries in the table
        limit: usize,
    },

    /// An object file's embedded architecture does not match the one
    /// requested for it
    #[error("architecture mismatch for {path}: requested {requested}, found {found}")]
    ArchMismatch {
        /// Object file path
        path: String,
        /// Architecture requested by the caller
        requested: String,
        /// Architecture recorded in the file
        found: String,
    },

    /// The architecture list must be empty or name one entry per object
    #[error("expected {objects} architectures (one per object), got {architectures}")]
    ArchitectureCount {
        /// Number of object files
        objects: usize,
        /// Number of architectures supplied
        architectures: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CubrirError {
    /// Wrap a structural failure as a fatal load error naming `path`.
    pub(crate) fn fatal(path: &std::path::Path, source: CubrirError) -> Self {
        Self::FatalLoad {
            path: path.display().to_string(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_load_names_the_offending_path() {
        let inner = CubrirError::Truncated {
            what: "profile record",
            offset: 12,
        };
        let err = CubrirError::fatal(std::path::Path::new("/tmp/default.cprof"), inner);
        let message = err.to_string();
        assert!(message.contains("/tmp/default.cprof"));
        assert!(message.contains("truncated profile record"));
    }

    #[test]
    fn io_errors_convert() {
        fn load() -> CubrirResult<Vec<u8>> {
            Ok(std::fs::read("/definitely/not/a/real/path.cprof")?)
        }
        assert!(matches!(load(), Err(CubrirError::Io(_))));
    }
}
