use crate::codec::{expect_len, Decoder, Encoder};
use lz4::block::CompressionMode;
use std::io;

/// LZ4 block format, no size prefix; the frame header carries the original length.
pub struct Lz4Compressor(pub CompressionMode);

impl Default for Lz4Compressor {
    fn default() -> Self {
        Lz4Compressor(CompressionMode::DEFAULT)
    }
}

pub struct Lz4Decompressor;

fn bound(uncompressed_len: usize) -> usize {
    lz4::block::compress_bound(uncompressed_len).unwrap_or(usize::MAX)
}

impl Encoder for Lz4Compressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        lz4::block::compress_to_buffer(src, Some(self.0), false, dest)
    }
}

impl Decoder for Lz4Decompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let expected = dest.len();
        let size = i32::try_from(expected)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "block too large for lz4"))?;
        let count = lz4::block::decompress_to_buffer(src, Some(size), dest)?;
        expect_len("lz4", count, expected)
    }
}
