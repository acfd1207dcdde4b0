use crate::codec::{expect_len, invalid_data, Decoder, Encoder};
use brotlic_sys::{
    BrotliDecoderDecompress, BrotliDecoderResult_BROTLI_DECODER_RESULT_SUCCESS,
    BrotliEncoderCompress, BrotliEncoderMaxCompressedSize, BrotliEncoderMode_BROTLI_MODE_GENERIC,
    BROTLI_DEFAULT_WINDOW,
};
use std::ffi::c_int;
use std::io;
use std::io::ErrorKind;

const QUALITY: c_int = 5;

pub struct BrotliCompressor(pub c_int);

impl Default for BrotliCompressor {
    fn default() -> Self {
        BrotliCompressor(QUALITY)
    }
}

pub struct BrotliDecompressor;

fn bound(uncompressed_len: usize) -> usize {
    match unsafe { BrotliEncoderMaxCompressedSize(uncompressed_len) } {
        0 => usize::MAX,
        n => n,
    }
}

impl Encoder for BrotliCompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let input_ptr = src.as_ptr();
        let input_len = src.len();
        let output_ptr = dest.as_mut_ptr();
        let mut output_len = dest.len();

        let result = unsafe {
            BrotliEncoderCompress(
                self.0,
                BROTLI_DEFAULT_WINDOW as c_int,
                BrotliEncoderMode_BROTLI_MODE_GENERIC,
                input_len,
                input_ptr,
                &mut output_len,
                output_ptr,
            )
        };
        if result != 0 {
            Ok(output_len)
        } else {
            Err(io::Error::new(ErrorKind::Other, "brotli compress failed"))
        }
    }
}

impl Decoder for BrotliDecompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let input_ptr = src.as_ptr();
        let input_len = src.len();
        let output_ptr = dest.as_mut_ptr();
        let mut output_len = dest.len();

        let result =
            unsafe { BrotliDecoderDecompress(input_len, input_ptr, &mut output_len, output_ptr) };
        if result == BrotliDecoderResult_BROTLI_DECODER_RESULT_SUCCESS {
            expect_len("brotli", output_len, dest.len())
        } else {
            Err(invalid_data("brotli decompress failed"))
        }
    }
}
