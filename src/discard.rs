use std::io;
use std::io::{ErrorKind, Seek, SeekFrom, Write};

/// Sink that drops everything written to it but keeps track of the position,
/// so throughput can be measured without touching the disk.
#[derive(Default)]
pub struct Discard {
    pos: u64,
    end: u64,
}

impl Discard {
    /// Largest position ever written to.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pos += buf.len() as u64;
        self.end = self.end.max(self.pos);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Discard {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(count) => (count, 0),
            SeekFrom::End(count) => (self.end, count),
            SeekFrom::Current(count) => (self.pos, count),
        };
        self.pos = base.checked_add_signed(offset).ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;
        Ok(self.pos)
    }
}
