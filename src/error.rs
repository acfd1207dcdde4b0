use std::collections::TryReserveError;
use std::io;
use std::io::ErrorKind;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The codec refused to compress a block. The stream is unusable afterwards.
    #[error("failed to compress block of {original_len} bytes: {source}")]
    Compression {
        original_len: usize,
        #[source]
        source: io::Error,
    },

    /// Malformed payload, a header that contradicts the codec bound,
    /// or a codec that did not consume/produce the declared lengths.
    #[error(
        "corrupt frame at offset {offset} (original {original_len}, compressed {compressed_len}): {source}"
    )]
    Decompression {
        offset: u64,
        original_len: u32,
        compressed_len: u32,
        #[source]
        source: io::Error,
    },

    /// The source ended inside a frame.
    #[error("stream truncated at offset {offset}: expected {expected} bytes, got {actual}")]
    Truncated {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("failed to allocate a buffer of {requested} bytes: {source}")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("unknown codec: {0:?}")]
    UnknownCodec(String),

    #[error("frame of {needed} bytes does not fit into an output buffer of {available} bytes")]
    OutputTooSmall { needed: usize, available: usize },

    #[error("invalid block size {0}")]
    InvalidBlockSize(usize),

    #[error("stream is closed")]
    Closed,

    #[error("stream is unusable after an earlier failure")]
    Poisoned,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match e {
            Error::Io(inner) => return inner,
            Error::Truncated { .. } => ErrorKind::UnexpectedEof,
            Error::Decompression { .. } => ErrorKind::InvalidData,
            Error::Allocation { .. } => ErrorKind::OutOfMemory,
            Error::OutputTooSmall { .. } | Error::InvalidBlockSize(_) => ErrorKind::InvalidInput,
            Error::UnknownCodec(_) => ErrorKind::NotFound,
            Error::Compression { .. } | Error::Closed | Error::Poisoned => ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_pass_through_unchanged() {
        let original = io::Error::new(ErrorKind::BrokenPipe, "pipe");
        let converted: io::Error = Error::Io(original).into();
        assert_eq!(converted.kind(), ErrorKind::BrokenPipe);
        assert_eq!(converted.to_string(), "pipe");
    }

    #[test]
    fn truncation_maps_to_unexpected_eof() {
        let e = Error::Truncated {
            offset: 8,
            expected: 10,
            actual: 3,
        };
        assert_eq!(
            e.to_string(),
            "stream truncated at offset 8: expected 10 bytes, got 3"
        );
        let converted: io::Error = e.into();
        assert_eq!(converted.kind(), ErrorKind::UnexpectedEof);
    }
}
