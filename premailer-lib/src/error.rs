use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PremailerError {
    /// A `<style>` block could not be parsed.
    #[error("failed to parse style block {block_index}: {message}")]
    Parse { block_index: usize, message: String },

    #[error("failed to serialize document")]
    Serialization(#[source] io::Error),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
