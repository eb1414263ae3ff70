//! Log writer that masks secrets before bytes reach the sink

use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

use super::masker::SecretMasker;

/// Wraps a [`MakeWriter`] so every formatted log line passes through the masker.
pub struct MaskingMakeWriter<M> {
    inner: M,
    masker: SecretMasker,
}

impl<M> MaskingMakeWriter<M> {
    pub fn new(inner: M, masker: SecretMasker) -> Self {
        Self { inner, masker }
    }
}

impl<'a, M> MakeWriter<'a> for MaskingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = MaskingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        MaskingWriter::new(self.inner.make_writer(), self.masker.clone())
    }
}

pub struct MaskingWriter<W> {
    inner: W,
    masker: SecretMasker,
}

impl<W> MaskingWriter<W> {
    pub fn new(inner: W, masker: SecretMasker) -> Self {
        Self { inner, masker }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for MaskingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The fmt layer hands over one complete event per write call.
        let text = String::from_utf8_lossy(buf);
        let masked = self.masker.mask(&text);
        self.inner.write_all(masked.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
