use crate::codec::{expect_len, invalid_data, Decoder, Encoder};
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io;
use std::io::{Cursor, Read, Write};

// gzip header and trailer
const GZIP_WRAPPER: usize = 18;

pub struct GzipCompressor(pub Compression);

impl Default for GzipCompressor {
    fn default() -> Self {
        GzipCompressor(Compression::default())
    }
}

pub struct GzipDecompressor;

fn bound(len: usize) -> usize {
    // zlib's conservative deflateBound, valid for any deflate backend
    let overhead = (len >> 3) + (len >> 6) + 2 + 5 + GZIP_WRAPPER;
    len.checked_add(overhead).unwrap_or(usize::MAX)
}

impl Encoder for GzipCompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let mut encoder = GzEncoder::new(Cursor::new(dest), self.0);
        encoder.write_all(src)?;
        let w = encoder.finish()?;
        Ok(w.position() as usize)
    }
}

impl Decoder for GzipDecompressor {
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize {
        bound(uncompressed_len)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize> {
        let mut remaining = src;
        let count = {
            // the bufread decoder consumes only what the member uses
            let mut decoder = GzDecoder::new(&mut remaining);
            decoder.read_exact(dest)?;
            if decoder.read(&mut [0u8; 1])? != 0 {
                return Err(invalid_data("gzip member holds more data than the frame declares"));
            }
            dest.len()
        };
        if !remaining.is_empty() {
            return Err(invalid_data(format!(
                "gzip left {} of {} payload bytes unread",
                remaining.len(),
                src.len()
            )));
        }
        expect_len("gzip", count, dest.len())
    }
}
