use crate::error::{Error, Result};

/// Growth-only staging area for compressed payloads.
///
/// Any slice previously obtained from the buffer is invalid after a call to
/// [`ScratchBuffer::ensure_capacity`] that grows it; the borrow checker
/// enforces this for safe callers. Contents are not preserved across growth.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    pub fn with_capacity(capacity: usize) -> Result<ScratchBuffer> {
        let mut scratch = ScratchBuffer::default();
        scratch.ensure_capacity(capacity)?;
        Ok(scratch)
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Makes room for at least `n` bytes. Grows to exactly `n` when growing.
    pub fn ensure_capacity(&mut self, n: usize) -> Result<()> {
        if n <= self.buf.len() {
            return Ok(());
        }
        let mut grown = Vec::new();
        grown
            .try_reserve_exact(n)
            .map_err(|source| Error::Allocation {
                requested: n,
                source,
            })?;
        grown.resize(n, 0);
        self.buf = grown;
        Ok(())
    }

    pub fn as_mut_slice(&mut self, len: usize) -> &mut [u8] {
        &mut self.buf[..len]
    }

    pub fn as_slice(&self, len: usize) -> &[u8] {
        &self.buf[..len]
    }

    pub fn release(&mut self) {
        self.buf = Vec::new();
    }
}
