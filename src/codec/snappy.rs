use crate::codec::{expect_len, invalid_data, Decoder, Encoder};
use std::io;
use std::io::ErrorKind;

fn bound(uncompressed_len: usize) -> usize {
    match snap::raw::max_compress_len(uncompressed_len) {
        0 if uncompressed_len > 0 => usize::MAX,
        n => n,
    }
}

impl Encoder for snap::raw::Encoder {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        snap::raw::Encoder::compress(self, src, dest)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))
    }
}

impl Decoder for snap::raw::Decoder {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        // snappy stores the decoded length up front; check it before touching dest
        let declared = snap::raw::decompress_len(src).map_err(|e| invalid_data(e.to_string()))?;
        expect_len("snappy", declared, dest.len())?;
        let count = snap::raw::Decoder::decompress(self, src, dest)
            .map_err(|e| invalid_data(e.to_string()))?;
        expect_len("snappy", count, dest.len())
    }
}
