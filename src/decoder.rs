use crate::buffer::ScratchBuffer;
use crate::codec::Decoder;
use crate::error::{Error, Result};
use crate::frame::{FrameHeader, HEADER_LEN};
use crate::DEFAULT_MAX_BLOCK_SIZE;
use std::io;
use std::io::{ErrorKind, Read};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Open,
    Failed,
    Closed,
}

/// Reads frames from a source and hands back one decompressed block per call.
///
/// The scratch buffer holding compressed payloads starts at the size hint and
/// grows to fit the largest frame seen. It never shrinks until the stream is closed.
pub struct BlockDecompressStream<R: Read> {
    decoder: Box<dyn Decoder>,
    source: R,
    scratch: ScratchBuffer,
    /// Last block decoded through the `io::Read` impl and how much of it was served.
    block: Vec<u8>,
    block_pos: usize,
    max_block_size: usize,
    compressed_bytes: u64,
    uncompressed_bytes: u64,
    state: State,
}

impl<R: Read> BlockDecompressStream<R> {
    pub fn new(decoder: Box<dyn Decoder>, source: R, buffer_size_hint: usize) -> Result<Self> {
        debug!(buffer_size_hint, "creating block decompress stream");
        Ok(BlockDecompressStream {
            decoder,
            source,
            scratch: ScratchBuffer::with_capacity(buffer_size_hint)?,
            block: Vec::new(),
            block_pos: 0,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            compressed_bytes: 0,
            uncompressed_bytes: 0,
            state: State::Open,
        })
    }

    /// Largest `originalLength` a frame may declare. Frames above it are treated as corrupt.
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Frame bytes consumed so far, headers included. Equals the offset of the next frame.
    pub fn compressed_bytes_read(&self) -> u64 {
        self.compressed_bytes
    }

    pub fn uncompressed_bytes_read(&self) -> u64 {
        self.uncompressed_bytes
    }

    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    pub fn max_compressed_length(&self, orig_len: u64) -> u64 {
        usize::try_from(orig_len)
            .map(|len| self.decoder.compressed_len_bound(len) as u64)
            .unwrap_or(u64::MAX)
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Failed => Err(Error::Poisoned),
            State::Closed => Err(Error::Closed),
        }
    }

    /// Decompresses the next frame into the front of `dst`.
    ///
    /// Returns `Ok(None)` when the source ends exactly at a frame boundary.
    /// `dst` must be able to hold the whole block; the block size used by the
    /// producer is the natural choice. Any error leaves the stream unusable.
    pub fn read_block(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        self.check_open()?;
        let result = self.decode_next(dst);
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    fn decode_next(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };
        let original_len = header.original_len as usize;
        if original_len > dst.len() {
            return Err(Error::OutputTooSmall {
                needed: original_len,
                available: dst.len(),
            });
        }
        self.read_payload(header)?;
        self.decode_frame(header, &mut dst[..original_len])?;
        Ok(Some(original_len))
    }

    /// Releases the scratch buffer. The source is left to the caller.
    /// Calling it again does nothing.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        self.state = State::Closed;
        self.scratch.release();
        self.block = Vec::new();
        self.block_pos = 0;
        debug!(
            compressed = self.compressed_bytes,
            uncompressed = self.uncompressed_bytes,
            "closed block decompress stream"
        );
    }

    /// Reads and validates the next header. Nothing is allocated for a header that fails.
    fn read_header(&mut self) -> Result<Option<FrameHeader>> {
        let offset = self.compressed_bytes;
        let mut raw = [0u8; HEADER_LEN];
        let n = read_fully(&mut self.source, &mut raw)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_LEN {
            return Err(Error::Truncated {
                offset,
                expected: HEADER_LEN,
                actual: n,
            });
        }
        let header = FrameHeader::read_from(&raw);
        let corrupt = |reason: String| Error::Decompression {
            offset,
            original_len: header.original_len,
            compressed_len: header.compressed_len,
            source: io::Error::new(ErrorKind::InvalidData, reason),
        };
        if header.original_len as u64 > self.max_block_size as u64 {
            return Err(corrupt(format!(
                "original length exceeds maximum block size of {}",
                self.max_block_size
            )));
        }
        // the encoder never frames an empty block, so an empty frame carries no payload
        if header.original_len == 0 && header.compressed_len != 0 {
            return Err(corrupt("payload in an empty frame".to_owned()));
        }
        let bound = self.max_compressed_length(header.original_len as u64);
        if header.compressed_len as u64 > bound {
            return Err(corrupt(format!(
                "compressed length exceeds codec bound of {}",
                bound
            )));
        }
        Ok(Some(header))
    }

    /// Reads the payload announced by `header` into the scratch buffer.
    fn read_payload(&mut self, header: FrameHeader) -> Result<()> {
        let offset = self.compressed_bytes;
        let compressed_len = header.compressed_len as usize;
        if compressed_len > self.scratch.capacity() {
            debug!(
                from = self.scratch.capacity(),
                to = compressed_len,
                "growing scratch buffer"
            );
            self.scratch.ensure_capacity(compressed_len)?;
        }
        let payload = self.scratch.as_mut_slice(compressed_len);
        let n = read_fully(&mut self.source, payload)?;
        if n < compressed_len {
            return Err(Error::Truncated {
                offset: offset + HEADER_LEN as u64,
                expected: compressed_len,
                actual: n,
            });
        }
        trace!(
            offset,
            original_len = header.original_len,
            compressed_len = header.compressed_len,
            "read frame"
        );
        Ok(())
    }

    /// Decompresses the payload sitting in the scratch buffer into `dst`,
    /// which is exactly `header.original_len` bytes long.
    fn decode_frame(&mut self, header: FrameHeader, dst: &mut [u8]) -> Result<()> {
        let offset = self.compressed_bytes;
        let src = self.scratch.as_slice(header.compressed_len as usize);
        let corrupt = |source: io::Error| Error::Decompression {
            offset,
            original_len: header.original_len,
            compressed_len: header.compressed_len,
            source,
        };
        if !dst.is_empty() {
            let produced = self.decoder.decompress(src, dst).map_err(corrupt)?;
            if produced != dst.len() {
                return Err(corrupt(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("codec produced {} bytes", produced),
                )));
            }
        }
        self.compressed_bytes += header.frame_len();
        self.uncompressed_bytes += dst.len() as u64;
        Ok(())
    }

    /// Replaces the served block with the next one. `false` at the end of the source.
    fn refill(&mut self) -> Result<bool> {
        let Some(header) = self.read_header()? else {
            return Ok(false);
        };
        self.read_payload(header)?;
        let original_len = header.original_len as usize;
        let mut block = std::mem::take(&mut self.block);
        self.block_pos = 0;
        block.clear();
        block
            .try_reserve_exact(original_len)
            .map_err(|source| Error::Allocation {
                requested: original_len,
                source,
            })?;
        block.resize(original_len, 0);
        self.decode_frame(header, &mut block)?;
        self.block = block;
        Ok(true)
    }
}

impl<R: Read> Read for BlockDecompressStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        // empty frames are legal, keep going until data or the end of the source
        while self.block_pos == self.block.len() {
            match self.refill() {
                Ok(true) => {}
                Ok(false) => return Ok(0),
                Err(e) => {
                    self.state = State::Failed;
                    return Err(e.into());
                }
            }
        }
        let n = buf.len().min(self.block.len() - self.block_pos);
        buf[..n].copy_from_slice(&self.block[self.block_pos..self.block_pos + n]);
        self.block_pos += n;
        Ok(n)
    }
}

/// Like `read_exact`, but reports how many bytes arrived before the source ran dry.
fn read_fully<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
