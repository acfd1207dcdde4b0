use blockframe::frame::{FrameHeader, HEADER_LEN};
use blockframe::{Algorithm, CodecRegistry, Error};
use std::io::Read;

const BLOCK: usize = 4096;

fn text(len: usize) -> Vec<u8> {
    let words = ["alpha ", "beta ", "gamma ", "delta ", "epsilon\n"];
    let mut data = Vec::with_capacity(len);
    let mut i = 0;
    while data.len() < len {
        data.extend_from_slice(words[i % words.len()].as_bytes());
        i += 7;
    }
    data.truncate(len);
    data
}

fn compress(registry: &CodecRegistry, codec: &str, data: &[u8], block: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut stream = registry.get_compression_stream(codec, &mut out, block).unwrap();
    for chunk in data.chunks(1000) {
        stream.write(chunk).unwrap();
    }
    stream.close().unwrap();
    drop(stream);
    out
}

fn decompress_blocks(
    registry: &CodecRegistry,
    codec: &str,
    compressed: &[u8],
    block: usize,
) -> Vec<u8> {
    let mut stream = registry
        .get_decompression_stream(codec, compressed, block)
        .unwrap();
    let mut dst = vec![0u8; block];
    let mut out = Vec::new();
    while let Some(n) = stream.read_block(&mut dst).unwrap() {
        out.extend_from_slice(&dst[..n]);
    }
    out
}

fn headers(mut bytes: &[u8]) -> Vec<FrameHeader> {
    let mut result = Vec::new();
    while !bytes.is_empty() {
        let raw: [u8; HEADER_LEN] = bytes[..HEADER_LEN].try_into().unwrap();
        let header = FrameHeader::read_from(&raw);
        bytes = &bytes[header.frame_len() as usize..];
        result.push(header);
    }
    result
}

#[test]
fn every_codec_round_trips_boundary_lengths() {
    let registry = CodecRegistry::with_builtin();
    for algorithm in Algorithm::ALL {
        let codec = algorithm.name();
        for len in [0, 1, BLOCK, 3 * BLOCK, 2 * BLOCK + 123] {
            let data = text(len);
            let compressed = compress(&registry, codec, &data, BLOCK);
            assert_eq!(
                decompress_blocks(&registry, codec, &compressed, BLOCK),
                data,
                "{} with {} bytes",
                codec,
                len
            );
        }
    }
}

#[test]
fn frames_describe_the_whole_stream() {
    let registry = CodecRegistry::with_builtin();
    let data = text(2 * BLOCK + 123);
    let compressed = compress(&registry, "zstd", &data, BLOCK);
    let headers = headers(&compressed);
    let lens: Vec<u32> = headers.iter().map(|h| h.original_len).collect();
    assert_eq!(lens, vec![BLOCK as u32, BLOCK as u32, 123]);
    let total: u64 = headers.iter().map(|h| h.original_len as u64).sum();
    assert_eq!(total, data.len() as u64);
}

#[test]
fn small_blocks_reassemble_exactly() {
    let registry = CodecRegistry::with_builtin();
    let mut out = Vec::new();
    {
        let mut stream = registry.get_compression_stream("copy", &mut out, 4).unwrap();
        stream.write(b"abcdefgh").unwrap();
        stream.write(b"ij").unwrap();
        stream.flush().unwrap();
    }
    let lens: Vec<u32> = headers(&out).iter().map(|h| h.original_len).collect();
    assert_eq!(lens, vec![4, 4, 2]);
    assert_eq!(decompress_blocks(&registry, "copy", &out, 4), b"abcdefghij");

    let mut lz4 = Vec::new();
    {
        let mut stream = registry.get_compression_stream("lz4", &mut lz4, 4).unwrap();
        stream.write(b"abcdefgh").unwrap();
        stream.write(b"ij").unwrap();
        stream.flush().unwrap();
    }
    let mut reader = registry.get_decompression_stream("lz4", &lz4[..], 1).unwrap();
    let mut plain = Vec::new();
    reader.read_to_end(&mut plain).unwrap();
    assert_eq!(plain, b"abcdefghij");
}

#[test]
fn truncated_payload_is_not_a_short_read() {
    let registry = CodecRegistry::with_builtin();
    let data = text(BLOCK);
    let compressed = compress(&registry, "snappy", &data, BLOCK);
    let cut = &compressed[..HEADER_LEN + 5];
    let mut stream = registry.get_decompression_stream("snappy", cut, BLOCK).unwrap();
    let mut dst = vec![0u8; BLOCK];
    match stream.read_block(&mut dst) {
        Err(Error::Truncated {
            offset, actual, ..
        }) => {
            assert_eq!(offset, HEADER_LEN as u64);
            assert_eq!(actual, 5);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn truncation_surfaces_through_io_read() {
    let registry = CodecRegistry::with_builtin();
    let data = text(3 * BLOCK);
    let compressed = compress(&registry, "gzip", &data, BLOCK);
    let cut = &compressed[..compressed.len() - 1];
    let mut stream = registry.get_decompression_stream("gzip", cut, BLOCK).unwrap();
    let mut plain = Vec::new();
    let e = stream.read_to_end(&mut plain).unwrap_err();
    assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof);
    assert_eq!(plain.len(), 2 * BLOCK);
}

#[test]
fn payload_from_another_codec_is_corruption() {
    let registry = CodecRegistry::with_builtin();
    let data = text(BLOCK);
    let compressed = compress(&registry, "lz4", &data, BLOCK);
    let mut stream = registry
        .get_decompression_stream("zstd", &compressed[..], BLOCK)
        .unwrap();
    let mut dst = vec![0u8; BLOCK];
    assert!(matches!(
        stream.read_block(&mut dst),
        Err(Error::Decompression { offset: 0, .. })
    ));
}

#[test]
fn scratch_capacity_tracks_largest_frame() {
    let registry = CodecRegistry::with_builtin();
    let data = text(5 * BLOCK);
    let compressed = compress(&registry, "copy", &data, BLOCK);
    let mut stream = registry.get_decompression_stream("copy", &compressed[..], 16).unwrap();
    let mut dst = vec![0u8; BLOCK];
    let mut previous = stream.scratch_capacity();
    while stream.read_block(&mut dst).unwrap().is_some() {
        let capacity = stream.scratch_capacity();
        assert!(capacity >= previous);
        assert!(capacity >= BLOCK);
        previous = capacity;
    }
    assert_eq!(previous, BLOCK);
}

#[test]
fn both_streams_close_twice() {
    let registry = CodecRegistry::with_builtin();
    let mut out = Vec::new();
    let mut writer = registry.get_compression_stream("brotli", &mut out, BLOCK).unwrap();
    writer.write(&text(100)).unwrap();
    writer.close().unwrap();
    writer.close().unwrap();
    drop(writer);

    let mut reader = registry.get_decompression_stream("brotli", &out[..], BLOCK).unwrap();
    reader.close();
    reader.close();
    assert!(matches!(reader.read_block(&mut [0u8; 8]), Err(Error::Closed)));
}

#[test]
fn max_compressed_length_matches_on_both_sides() {
    let registry = CodecRegistry::with_builtin();
    for algorithm in Algorithm::ALL {
        let writer = registry
            .get_compression_stream(algorithm.name(), std::io::sink(), BLOCK)
            .unwrap();
        let reader = registry
            .get_decompression_stream(algorithm.name(), std::io::empty(), BLOCK)
            .unwrap();
        for len in [0u64, 1, 100, BLOCK as u64] {
            assert_eq!(writer.max_compressed_length(len), reader.max_compressed_length(len));
            assert!(writer.max_compressed_length(len) >= len);
        }
    }
}
