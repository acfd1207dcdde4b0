//! Block-framed streaming compression.
//!
//! Any single-shot block codec (see [`codec::Encoder`] and [`codec::Decoder`]) becomes a
//! byte-stream codec: [`BlockCompressStream`] buffers writes into fixed-size blocks and
//! emits each as a length-prefixed frame, [`BlockDecompressStream`] parses the frames back.
//!
//! ```
//! use blockframe::CodecRegistry;
//! use std::io::Read;
//!
//! let registry = CodecRegistry::with_builtin();
//! let mut compressed = Vec::new();
//! let mut writer = registry.get_compression_stream("lz4", &mut compressed, 64 * 1024)?;
//! writer.write(b"hello, hello, hello")?;
//! writer.close()?;
//! drop(writer);
//!
//! let mut reader = registry.get_decompression_stream("lz4", &compressed[..], 64 * 1024)?;
//! let mut plain = Vec::new();
//! reader.read_to_end(&mut plain)?;
//! assert_eq!(plain, b"hello, hello, hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod discard;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod registry;

pub use codec::Algorithm;
pub use decoder::BlockDecompressStream;
pub use encoder::BlockCompressStream;
pub use error::{Error, Result};
pub use registry::{CodecRegistry, CodecSpec};

/// Block size used when the caller has no better idea.
pub const DEFAULT_BUFFER_SIZE_HINT: usize = 128 * 1024;

/// Largest block a decompress stream accepts unless told otherwise.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;
