use promtext_core::ExpositionError;
use std::fmt;

/// Append-only text sink over one growable byte buffer.
///
/// Every append either lands completely or fails with the buffer untouched;
/// nothing already written is read back or rewritten. Appends return
/// `&mut Self` so lines can be chained with `?`.
pub struct TextStream<'a> {
    buf: &'a mut Vec<u8>,
    max_capacity: usize,
}

impl<'a> TextStream<'a> {
    /// Stream appending after whatever `buf` already holds.
    pub fn new(buf: &'a mut Vec<u8>, max_capacity: usize) -> Self {
        Self { buf, max_capacity }
    }

    pub fn write_str(&mut self, s: &str) -> Result<&mut Self, ExpositionError> {
        self.append(s.as_bytes())?;
        Ok(self)
    }

    pub fn write_char(&mut self, c: char) -> Result<&mut Self, ExpositionError> {
        let mut utf8 = [0u8; 4];
        self.append(c.encode_utf8(&mut utf8).as_bytes())?;
        Ok(self)
    }

    /// Backs `write!(stream, ...)`. A growth failure inside formatting is
    /// returned as-is.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<&mut Self, ExpositionError> {
        if let Some(s) = args.as_str() {
            return self.write_str(s);
        }

        struct Adapter<'s, 'a> {
            stream: &'s mut TextStream<'a>,
            error: Option<ExpositionError>,
        }

        impl fmt::Write for Adapter<'_, '_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.stream.append(s.as_bytes()).map_err(|e| {
                    self.error = Some(e);
                    fmt::Error
                })
            }
        }

        let mut adapter = Adapter {
            stream: &mut *self,
            error: None,
        };
        let result = fmt::write(&mut adapter, args);
        let error = adapter.error.take();
        match result {
            Ok(()) => Ok(self),
            Err(_) => Err(error.unwrap_or_else(|| {
                ExpositionError::Io(std::io::Error::other("formatter returned an error"))
            })),
        }
    }

    /// Bytes written so far.
    pub fn writer_index(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), ExpositionError> {
        let requested = self.buf.len().saturating_add(bytes.len());
        if requested > self.max_capacity {
            return Err(ExpositionError::CapacityExceeded {
                requested,
                max: self.max_capacity,
            });
        }
        self.buf.try_reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

impl fmt::Debug for TextStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStream")
            .field("writer_index", &self.writer_index())
            .field("capacity", &self.capacity())
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_appends() {
        let mut buf = Vec::new();
        let mut stream = TextStream::new(&mut buf, usize::MAX);
        stream
            .write_str("# TYPE up gauge")
            .unwrap()
            .write_char('\n')
            .unwrap();
        assert_eq!(stream.writer_index(), 16);
        assert_eq!(buf, b"# TYPE up gauge\n");
    }

    #[test]
    fn appends_after_existing_content() {
        let mut buf = b"abc".to_vec();
        let mut stream = TextStream::new(&mut buf, 16);
        stream.write_str("def").unwrap();
        assert_eq!(buf, b"abcdef");
    }

    #[test]
    fn multibyte_char() {
        let mut buf = Vec::new();
        let mut stream = TextStream::new(&mut buf, 16);
        stream.write_char('é').unwrap();
        assert_eq!(stream.writer_index(), 2);
        assert_eq!(String::from_utf8(buf).unwrap(), "é");
    }

    #[test]
    fn write_macro() {
        let mut buf = Vec::new();
        let mut stream = TextStream::new(&mut buf, 64);
        write!(stream, "{} {}\n", "x_total", 3).unwrap();
        write!(stream, "static\n").unwrap();
        assert_eq!(buf, b"x_total 3\nstatic\n");
    }

    #[test]
    fn growth_is_transparent() {
        let mut buf = Vec::with_capacity(1);
        let mut stream = TextStream::new(&mut buf, 1 << 20);
        for _ in 0..1000 {
            stream.write_str("0123456789").unwrap();
        }
        assert_eq!(stream.writer_index(), 10_000);
        assert!(stream.capacity() >= 10_000);
    }

    #[test]
    fn exceeding_max_capacity_fails_without_partial_append() {
        let mut buf = Vec::new();
        let mut stream = TextStream::new(&mut buf, 8);
        stream.write_str("12345").unwrap();
        let err = stream.write_str("6789").unwrap_err();
        assert!(matches!(
            err,
            ExpositionError::CapacityExceeded { requested: 9, max: 8 }
        ));
        assert_eq!(stream.writer_index(), 5);
        stream.write_str("678").unwrap();
        assert_eq!(buf, b"12345678");
    }

    #[test]
    fn write_macro_surfaces_capacity_error() {
        let mut buf = Vec::new();
        let mut stream = TextStream::new(&mut buf, 4);
        let err = write!(stream, "{}", "toolong").unwrap_err();
        assert!(matches!(err, ExpositionError::CapacityExceeded { .. }));
    }
}
