//! Wire header of a single compressed block.
//!
//! ```text
//! offset 0..3:  original length   (u32, big-endian)
//! offset 4..7:  compressed length (u32, big-endian)
//! offset 8..:   payload[compressed length]
//! ```
//!
//! A stream is a plain concatenation of frames. There is no stream header and
//! no trailer; the end of the stream is the end of the source at a frame boundary.

use byteorder::{BigEndian, ByteOrder};

pub const HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub original_len: u32,
    pub compressed_len: u32,
}

impl FrameHeader {
    pub fn new(original_len: u32, compressed_len: u32) -> FrameHeader {
        FrameHeader {
            original_len,
            compressed_len,
        }
    }

    /// Writes the header into the first [`HEADER_LEN`] bytes of `dest`.
    pub fn write_to(&self, dest: &mut [u8]) {
        BigEndian::write_u32(&mut dest[0..4], self.original_len);
        BigEndian::write_u32(&mut dest[4..8], self.compressed_len);
    }

    pub fn read_from(src: &[u8; HEADER_LEN]) -> FrameHeader {
        FrameHeader {
            original_len: BigEndian::read_u32(&src[0..4]),
            compressed_len: BigEndian::read_u32(&src[4..8]),
        }
    }

    /// Total number of bytes this frame occupies on the wire.
    pub fn frame_len(&self) -> u64 {
        HEADER_LEN as u64 + self.compressed_len as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_big_endian() {
        let mut buf = [0u8; HEADER_LEN];
        FrameHeader::new(0x0102_0304, 0x0A0B_0C0D).write_to(&mut buf);
        assert_eq!(buf, [1, 2, 3, 4, 0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn header_leaves_payload_untouched() {
        let mut buf = [0xFFu8; 12];
        FrameHeader::new(5, 3).write_to(&mut buf);
        assert_eq!(&buf[8..], &[0xFF; 4]);
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&buf[..HEADER_LEN]);
        let parsed = FrameHeader::read_from(&header);
        assert_eq!(parsed, FrameHeader::new(5, 3));
        assert_eq!(parsed.frame_len(), 11);
    }
}
