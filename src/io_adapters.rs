use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Result as IoResult, Write};

/// Memory-backed reader handed to the next stage of a pipe.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

/// Owned, growable byte sink that captures one pipe stage or one command substitution.
///
/// Ownership moves from the writing stage to the reading stage via [`MemWriter::into_reader`],
/// so no two stages ever share a buffer.
#[derive(Debug, Default)]
pub struct MemWriter {
    buf: Vec<u8>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the collected bytes into the next stage's stdin.
    pub fn into_reader(self) -> MemReader {
        MemReader::new(self.buf)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// A call's input: either the stream it was given or a redirected file.
pub enum InputStream<'a> {
    Inherited(&'a mut dyn Read),
    File(BufReader<File>),
}

impl Read for InputStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match self {
            InputStream::Inherited(r) => r.read(buf),
            InputStream::File(f) => f.read(buf),
        }
    }
}

/// A call's output: either the stream it was given or a redirected file.
pub enum OutputStream<'a> {
    Inherited(&'a mut dyn Write),
    File(BufWriter<File>),
}

impl OutputStream<'_> {
    /// Flush and release the stream, surfacing any write error a drop would swallow.
    pub fn finish(mut self) -> IoResult<()> {
        self.flush()
    }
}

impl Write for OutputStream<'_> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        match self {
            OutputStream::Inherited(w) => w.write(buf),
            OutputStream::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> IoResult<()> {
        match self {
            OutputStream::Inherited(w) => w.flush(),
            OutputStream::File(f) => f.flush(),
        }
    }
}
