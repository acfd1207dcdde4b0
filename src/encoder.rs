use crate::codec::Encoder;
use crate::error::{Error, Result};
use crate::frame::{FrameHeader, HEADER_LEN};
use std::cmp::min;
use std::io;
use std::io::Write;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Open,
    Failed,
    Closed,
}

/// Buffers written bytes into fixed-size blocks and emits each block as one frame.
///
/// The sink is borrowed, not owned: [`BlockCompressStream::close`] flushes it
/// but never closes it. Pass `&mut W` to keep using the sink after the stream
/// is gone.
///
/// Dropping an unclosed stream closes it. Errors during that implicit close
/// are only logged, so call [`BlockCompressStream::close`] to observe them.
pub struct BlockCompressStream<W: Write> {
    encoder: Box<dyn Encoder>,
    sink: W,
    /// Plaintext staging; its length is the block size and never changes.
    block: Vec<u8>,
    buffered: usize,
    /// Header followed by room for the worst-case payload of a full block.
    frame: Vec<u8>,
    state: State,
    uncompressed_bytes: u64,
    compressed_bytes: u64,
}

impl<W: Write> BlockCompressStream<W> {
    pub fn new(encoder: Box<dyn Encoder>, sink: W, block_size: usize) -> Result<Self> {
        let bound = encoder.compressed_len_bound(block_size);
        if block_size == 0 || block_size > u32::MAX as usize || bound > u32::MAX as usize {
            return Err(Error::InvalidBlockSize(block_size));
        }
        debug!(block_size, bound, "creating block compress stream");
        Ok(BlockCompressStream {
            encoder,
            sink,
            block: vec![0; block_size],
            buffered: 0,
            frame: vec![0; HEADER_LEN + bound],
            state: State::Open,
            uncompressed_bytes: 0,
            compressed_bytes: 0,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Number of bytes accepted but not yet emitted as a frame.
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    /// Frame bytes handed to the sink so far, headers included.
    pub fn compressed_bytes_written(&self) -> u64 {
        self.compressed_bytes
    }

    pub fn uncompressed_bytes_written(&self) -> u64 {
        self.uncompressed_bytes
    }

    /// Worst-case payload size the codec may produce for `orig_len` bytes of input.
    /// Inputs spanning several blocks need one bound plus one header per block.
    pub fn max_compressed_length(&self, orig_len: u64) -> u64 {
        usize::try_from(orig_len)
            .map(|len| self.encoder.compressed_len_bound(len) as u64)
            .unwrap_or(u64::MAX)
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Failed => Err(Error::Poisoned),
            State::Closed => Err(Error::Closed),
        }
    }

    /// Appends `data`, emitting a frame every time the block buffer overflows.
    pub fn write(&mut self, mut data: &[u8]) -> Result<()> {
        self.check_open()?;
        let block_size = self.block.len();
        while !data.is_empty() {
            if self.buffered == block_size {
                self.flush_block()?;
            }
            if self.buffered == 0 && data.len() > block_size {
                // whole blocks skip the staging copy
                let (head, tail) = data.split_at(block_size);
                self.write_frame(head)?;
                data = tail;
                continue;
            }
            let n = min(data.len(), block_size - self.buffered);
            self.block[self.buffered..self.buffered + n].copy_from_slice(&data[..n]);
            self.buffered += n;
            self.uncompressed_bytes += n as u64;
            data = &data[n..];
        }
        Ok(())
    }

    /// Emits the buffered bytes as one frame, if there are any, then flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        self.flush_block()?;
        self.sink.flush().map_err(|e| self.fail(e.into()))
    }

    /// Flushes remaining data and the sink. Calling it again does nothing.
    ///
    /// A stream that failed earlier is closed without emitting anything further.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::Closed => return Ok(()),
            State::Failed => {
                self.state = State::Closed;
                return Ok(());
            }
            State::Open => {}
        }
        let result = self.flush();
        self.state = State::Closed;
        debug!(
            uncompressed = self.uncompressed_bytes,
            compressed = self.compressed_bytes,
            "closed block compress stream"
        );
        result
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.buffered == 0 {
            return Ok(());
        }
        let block = std::mem::take(&mut self.block);
        let result = self.emit(&block[..self.buffered]);
        self.block = block;
        self.buffered = 0;
        result
    }

    fn write_frame(&mut self, plain: &[u8]) -> Result<()> {
        self.emit(plain)?;
        self.uncompressed_bytes += plain.len() as u64;
        Ok(())
    }

    fn emit(&mut self, plain: &[u8]) -> Result<()> {
        let compressed_len = match self.encoder.compress(plain, &mut self.frame[HEADER_LEN..]) {
            Ok(0) => {
                let e = io::Error::new(io::ErrorKind::Other, "codec produced no output");
                return Err(self.fail(Error::Compression {
                    original_len: plain.len(),
                    source: e,
                }));
            }
            Ok(n) => n,
            Err(source) => {
                return Err(self.fail(Error::Compression {
                    original_len: plain.len(),
                    source,
                }))
            }
        };
        let header = FrameHeader::new(plain.len() as u32, compressed_len as u32);
        header.write_to(&mut self.frame[..HEADER_LEN]);
        let frame_len = HEADER_LEN + compressed_len;
        if let Err(e) = self.sink.write_all(&self.frame[..frame_len]) {
            return Err(self.fail(e.into()));
        }
        trace!(
            offset = self.compressed_bytes,
            original_len = header.original_len,
            compressed_len = header.compressed_len,
            "wrote frame"
        );
        self.compressed_bytes += frame_len as u64;
        Ok(())
    }

    fn fail(&mut self, e: Error) -> Error {
        self.state = State::Failed;
        e
    }
}

impl<W: Write> Write for BlockCompressStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        BlockCompressStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        BlockCompressStream::flush(self)?;
        Ok(())
    }
}

impl<W: Write> Drop for BlockCompressStream<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close block compress stream on drop");
        }
    }
}
