use crate::codec::{invalid_data, Decoder, Encoder};
use std::io;

/// Stores blocks verbatim. Useful as a baseline and for inspecting the framing.
pub struct Copy;

impl Encoder for Copy {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        uncompressed_len
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        if dest.len() < src.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "destination too small"));
        }
        dest[0..src.len()].copy_from_slice(src);
        Ok(src.len())
    }
}

impl Decoder for Copy {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        uncompressed_len
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        if src.len() != dest.len() {
            return Err(invalid_data(format!(
                "stored block of {} bytes, frame declares {}",
                src.len(),
                dest.len()
            )));
        }
        dest.copy_from_slice(src);
        Ok(src.len())
    }
}
