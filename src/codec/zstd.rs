use crate::codec::{expect_len, Decoder, Encoder};
use std::io;
use zstd::zstd_safe;

pub struct ZstdCompressor(zstd::bulk::Compressor<'static>);

impl ZstdCompressor {
    pub fn new() -> io::Result<ZstdCompressor> {
        Ok(ZstdCompressor(zstd::bulk::Compressor::new(
            zstd::DEFAULT_COMPRESSION_LEVEL,
        )?))
    }
}

pub struct ZstdDecompressor(zstd::bulk::Decompressor<'static>);

impl ZstdDecompressor {
    pub fn new() -> io::Result<ZstdDecompressor> {
        Ok(ZstdDecompressor(zstd::bulk::Decompressor::new()?))
    }
}

impl Encoder for ZstdCompressor {
    fn compressed_len_bound(&self, src_len: usize) -> usize {
        zstd_safe::compress_bound(src_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        self.0.compress_to_buffer(src, dest)
    }
}

impl Decoder for ZstdDecompressor {
    fn compressed_len_bound(&self, src_len: usize) -> usize {
        zstd_safe::compress_bound(src_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let expected = dest.len();
        let count = self.0.decompress_to_buffer(src, dest)?;
        expect_len("zstd", count, expected)
    }
}
