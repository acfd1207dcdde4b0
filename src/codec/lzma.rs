use crate::codec::{invalid_data, Decoder, Encoder};
use lzma_sys::lzma_stream_buffer_bound;
use std::io;
use std::io::{Cursor, Read, Write};

const PRESET: u32 = 6;

pub struct LzmaCompressor(pub u32);

impl Default for LzmaCompressor {
    fn default() -> Self {
        LzmaCompressor(PRESET)
    }
}

pub struct LzmaDecompressor;

fn bound(uncompressed_len: usize) -> usize {
    match unsafe { lzma_stream_buffer_bound(uncompressed_len) } {
        0 => usize::MAX,
        n => n,
    }
}

impl Encoder for LzmaCompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let w = Cursor::new(dest);
        let mut encoder = xz2::write::XzEncoder::new(w, self.0);
        encoder.write_all(src)?;
        let w = encoder.finish()?;
        Ok(w.position() as usize)
    }
}

impl Decoder for LzmaDecompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let mut decoder = xz2::read::XzDecoder::new(src);
        decoder.read_exact(dest)?;
        if decoder.read(&mut [0u8; 1])? != 0 {
            return Err(invalid_data("xz block holds more data than the frame declares"));
        }
        if decoder.total_in() != src.len() as u64 {
            return Err(invalid_data(format!(
                "xz consumed {} of {} payload bytes",
                decoder.total_in(),
                src.len()
            )));
        }
        Ok(dest.len())
    }
}
