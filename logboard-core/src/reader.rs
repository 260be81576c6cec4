use crate::{masked_crc32c, proto, LogboardError, Result};
use prost::Message;
use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
};

/// Reads framed records sequentially, verifying both checksums of every record.
///
/// The reader stops at the first clean end of file. A record cut short or a checksum
/// mismatch is reported as [`LogboardError::Corrupt`].
///
/// ```no_run
/// use logboard_core::EventFileReader;
///
/// # fn main() -> logboard_core::Result<()> {
/// for event in EventFileReader::open("runs/exp1/events.out.tfevents.1700000000.000000.host")? {
///     println!("{:?}", event?.step);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EventFileReader<R> {
    inner: R,
}

impl EventFileReader<BufReader<File>> {
    /// Opens an event file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> EventFileReader<R> {
    /// Creates a reader over `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the payload of the next record, or `None` at the end of the stream.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; 12];
        if !self.read_header(&mut header)? {
            return Ok(None);
        }

        let mut len = [0u8; 8];
        len.copy_from_slice(&header[..8]);
        if read_u32(&header[8..]) != masked_crc32c(&len) {
            return Err(LogboardError::Corrupt("length checksum mismatch".to_string()));
        }
        let len = u64::from_le_bytes(len) as usize;

        let mut payload = vec![0u8; len];
        let mut crc = [0u8; 4];
        self.inner
            .read_exact(&mut payload)
            .and_then(|_| self.inner.read_exact(&mut crc))
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => {
                    LogboardError::Corrupt("truncated record".to_string())
                }
                _ => LogboardError::Io(e),
            })?;
        if read_u32(&crc) != masked_crc32c(&payload) {
            return Err(LogboardError::Corrupt("payload checksum mismatch".to_string()));
        }

        Ok(Some(payload))
    }

    /// Reads and decodes the next event, or `None` at the end of the stream.
    pub fn read_event(&mut self) -> Result<Option<proto::Event>> {
        match self.read_record()? {
            Some(payload) => Ok(Some(proto::Event::decode(payload.as_slice())?)),
            None => Ok(None),
        }
    }

    /// Fills `header`. Returns `false` if the stream ends before the first byte.
    fn read_header(&mut self, header: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < header.len() {
            match self.inner.read(&mut header[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(LogboardError::Corrupt("truncated header".to_string()));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for EventFileReader<R> {
    type Item = Result<proto::Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_event().transpose()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}
