use clap::ValueEnum;
use serde::Serialize;
use std::io;

pub mod brotli;
pub mod copy;
pub mod gzip;
pub mod lz4;
pub mod lzav;
pub mod lzma;
pub mod snappy;
pub mod zstd;

/// Single-shot block compressor.
pub trait Encoder {
    /// Upper bound on the compressed size of any input of `uncompressed_len` bytes.
    /// Returns `usize::MAX` if the codec cannot handle inputs that large.
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize;

    /// Compresses all of `src` into `dest` and returns the number of bytes written.
    /// `dest` is at least `compressed_len_bound(src.len())` bytes long.
    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize>;
}

/// Single-shot block decompressor.
pub trait Decoder {
    /// Same bound as the matching [`Encoder`]; used to reject implausible frame headers.
    fn compressed_len_bound(&self, uncompressed_len: usize) -> usize;

    /// Decompresses `src` into `dest`, which is exactly as long as the original block.
    ///
    /// Fails if `src` is malformed, if `src` is not consumed completely,
    /// or if fewer than `dest.len()` bytes come out.
    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> io::Result<usize>;
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Copy,
    Lz4,
    Zstd,
    Brotli,
    Snappy,
    Lzma,
    Lzav,
    Gzip,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::Copy,
        Algorithm::Lz4,
        Algorithm::Zstd,
        Algorithm::Brotli,
        Algorithm::Snappy,
        Algorithm::Lzma,
        Algorithm::Lzav,
        Algorithm::Gzip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Copy => "copy",
            Algorithm::Lz4 => "lz4",
            Algorithm::Zstd => "zstd",
            Algorithm::Brotli => "brotli",
            Algorithm::Snappy => "snappy",
            Algorithm::Lzma => "lzma",
            Algorithm::Lzav => "lzav",
            Algorithm::Gzip => "gzip",
        }
    }

    /// Alternative identifiers, mostly Hadoop codec class names.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Algorithm::Lz4 => &["org.apache.hadoop.io.compress.Lz4Codec"],
            Algorithm::Zstd => &["org.apache.hadoop.io.compress.ZStandardCodec"],
            Algorithm::Snappy => &["org.apache.hadoop.io.compress.SnappyCodec", "sz"],
            Algorithm::Gzip => &["org.apache.hadoop.io.compress.GzipCodec", "gz"],
            Algorithm::Brotli => &["br"],
            Algorithm::Lzma => &["xz"],
            Algorithm::Copy | Algorithm::Lzav => &[],
        }
    }

    /// File extensions, the first one being used for newly created files.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Algorithm::Copy => &["bak"],
            Algorithm::Zstd => &["zstd", "zst"],
            Algorithm::Lz4 => &["lz4"],
            Algorithm::Brotli => &["br"],
            Algorithm::Snappy => &["sz", "snappy"],
            Algorithm::Lzma => &["xz"],
            Algorithm::Lzav => &["lzav"],
            Algorithm::Gzip => &["gz"],
        }
    }

    pub fn encoder(&self) -> io::Result<Box<dyn Encoder>> {
        Ok(match self {
            Algorithm::Copy => Box::new(copy::Copy),
            Algorithm::Lz4 => Box::new(lz4::Lz4Compressor::default()),
            Algorithm::Zstd => Box::new(zstd::ZstdCompressor::new()?),
            Algorithm::Brotli => Box::new(brotli::BrotliCompressor::default()),
            Algorithm::Snappy => Box::new(snap::raw::Encoder::new()),
            Algorithm::Lzma => Box::new(lzma::LzmaCompressor::default()),
            Algorithm::Lzav => Box::new(lzav::LzavCompressor),
            Algorithm::Gzip => Box::new(gzip::GzipCompressor::default()),
        })
    }

    pub fn decoder(&self) -> io::Result<Box<dyn Decoder>> {
        Ok(match self {
            Algorithm::Copy => Box::new(copy::Copy),
            Algorithm::Lz4 => Box::new(lz4::Lz4Decompressor),
            Algorithm::Zstd => Box::new(zstd::ZstdDecompressor::new()?),
            Algorithm::Brotli => Box::new(brotli::BrotliDecompressor),
            Algorithm::Snappy => Box::new(snap::raw::Decoder::new()),
            Algorithm::Lzma => Box::new(lzma::LzmaDecompressor),
            Algorithm::Lzav => Box::new(lzav::LzavDecompressor),
            Algorithm::Gzip => Box::new(gzip::GzipDecompressor),
        })
    }
}

pub(crate) fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Checks the output count reported by a primitive against the declared block length.
pub(crate) fn expect_len(codec: &str, produced: usize, expected: usize) -> io::Result<usize> {
    if produced == expected {
        Ok(produced)
    } else {
        Err(invalid_data(format!(
            "{} produced {} bytes, frame declares {}",
            codec, produced, expected
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..4000u32 {
            data.extend_from_slice(format!("key-{:05} value-{}\n", i % 97, i).as_bytes());
        }
        data
    }

    #[test]
    fn every_algorithm_round_trips_a_block() {
        let data = sample();
        for algorithm in Algorithm::ALL {
            let mut encoder = algorithm.encoder().unwrap();
            let mut decoder = algorithm.decoder().unwrap();
            let mut compressed = vec![0; encoder.compressed_len_bound(data.len())];
            let n = encoder.compress(&data, &mut compressed).unwrap();
            assert!(n <= compressed.len(), "{}", algorithm.name());
            let mut output = vec![0; data.len()];
            let produced = decoder.decompress(&compressed[..n], &mut output).unwrap();
            assert_eq!(produced, data.len(), "{}", algorithm.name());
            assert_eq!(output, data, "{}", algorithm.name());
        }
    }

    #[test]
    fn bounds_agree_and_grow_with_input() {
        for algorithm in Algorithm::ALL {
            let encoder = algorithm.encoder().unwrap();
            let decoder = algorithm.decoder().unwrap();
            let mut previous = 0;
            for len in [0usize, 1, 7, 100, 4096, 65536, 1 << 20] {
                let bound = encoder.compressed_len_bound(len);
                assert_eq!(bound, decoder.compressed_len_bound(len), "{}", algorithm.name());
                assert!(bound >= len, "{}", algorithm.name());
                assert!(bound >= previous, "{}", algorithm.name());
                previous = bound;
            }
        }
    }

    #[test]
    fn incompressible_input_fits_the_bound() {
        // xorshift keeps the data free of repetitions
        let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
        let data: Vec<u8> = (0..10_000)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                x as u8
            })
            .collect();
        for algorithm in Algorithm::ALL {
            let mut encoder = algorithm.encoder().unwrap();
            let mut compressed = vec![0; encoder.compressed_len_bound(data.len())];
            encoder.compress(&data, &mut compressed).unwrap();
        }
    }

    #[test]
    fn decoders_reject_short_output() {
        let data = sample();
        for algorithm in Algorithm::ALL {
            let mut encoder = algorithm.encoder().unwrap();
            let mut decoder = algorithm.decoder().unwrap();
            let mut compressed = vec![0; encoder.compressed_len_bound(data.len())];
            let n = encoder.compress(&data, &mut compressed).unwrap();
            let mut output = vec![0; data.len() + 10];
            assert!(
                decoder.decompress(&compressed[..n], &mut output).is_err(),
                "{}",
                algorithm.name()
            );
        }
    }

    #[test]
    fn extensions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for algorithm in Algorithm::ALL {
            for ext in algorithm.extensions() {
                assert!(seen.insert(*ext), "duplicate extension {}", ext);
            }
        }
    }
}
