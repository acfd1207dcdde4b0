use crate::codec::{expect_len, invalid_data, Decoder, Encoder};
use std::ffi::c_int;
use std::io;
use std::io::ErrorKind;

pub struct LzavCompressor;

pub struct LzavDecompressor;

fn bound(uncompressed_len: usize) -> usize {
    match c_int::try_from(uncompressed_len) {
        Ok(len) => unsafe { lzav::compress_bound(len) as usize },
        Err(_) => usize::MAX,
    }
}

fn c_len(len: usize) -> io::Result<c_int> {
    c_int::try_from(len)
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "block too large for lzav"))
}

impl Encoder for LzavCompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let count = unsafe {
            lzav::compress_default(
                src.as_ptr() as *const _,
                dest.as_mut_ptr() as *mut _,
                c_len(src.len())?,
                c_len(dest.len())?,
            )
        };
        if count <= 0 && !src.is_empty() {
            Err(io::Error::new(ErrorKind::Other, "lzav compress failed"))
        } else {
            Ok(count.max(0) as usize)
        }
    }
}

impl Decoder for LzavDecompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let count = unsafe {
            lzav::decompress(
                src.as_ptr() as *const _,
                dest.as_mut_ptr() as *mut _,
                c_len(src.len())?,
                c_len(dest.len())?,
            )
        };
        if count < 0 {
            return Err(invalid_data(format!("lzav decompress failed ({})", count)));
        }
        expect_len("lzav", count as usize, dest.len())
    }
}
