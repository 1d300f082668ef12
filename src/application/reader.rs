//! Echoing line reader.
//!
//! Every line read from the tool is forwarded byte-for-byte to the echo sink
//! as soon as it is read, so a non-interactive consumer sees the original
//! output regardless of what the tree builder does with it.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::domain::Line;

pub struct EchoLines<R, W> {
    reader: R,
    echo: W,
    buf: Vec<u8>,
}

impl<R: BufRead, W: Write> EchoLines<R, W> {
    pub fn new(reader: R, echo: W) -> Self {
        Self {
            reader,
            echo,
            buf: Vec::new(),
        }
    }

    /// Forward all remaining input to the echo sink unmodified.
    pub fn drain(&mut self) -> io::Result<u64> {
        let copied = io::copy(&mut self.reader, &mut self.echo)?;
        self.echo.flush()?;
        debug!(bytes = copied, "drained remaining output");
        Ok(copied)
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.echo)
    }

    fn read_line(&mut self) -> io::Result<Option<Line>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            self.echo.flush()?;
            return Ok(None);
        }
        self.echo.write_all(&self.buf)?;
        self.echo.flush()?;

        let mut end = self.buf.len();
        if end > 0 && self.buf[end - 1] == b'\n' {
            end -= 1;
            if end > 0 && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
        }
        let text = String::from_utf8_lossy(&self.buf[..end]);
        Ok(Some(Line::from_colored(text)))
    }
}

impl<R: BufRead, W: Write> Iterator for EchoLines<R, W> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
