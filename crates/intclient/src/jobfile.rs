//! Line-numbered iteration over a job source.
//!
//! Lines are read as raw bytes. A line that is not UTF-8 is still yielded and
//! numbered, so the caller can reject that one line and carry on.

use std::io::{self, BufRead};

const COMMENT_PREFIX: u8 = b'#';

/// A non-comment line with its 1-based position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    /// 1-based line number, counting comment lines.
    pub number: usize,
    /// Line content without its terminator.
    pub bytes: Vec<u8>,
}

impl NumberedLine {
    /// The line as text, or `None` when it is not valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Iterator over the job lines of a reader, skipping comments.
///
/// Comment lines advance the line counter so later diagnostics point at the
/// right line, but are never yielded. Only read failures surface as errors.
#[derive(Debug)]
pub struct JobLines<R> {
    reader: R,
    number: usize,
}

impl<R: BufRead> JobLines<R> {
    /// Wraps `reader`.
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self { reader, number: 0 }
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for JobLines<R> {
    type Item = io::Result<NumberedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = match self.read_line() {
                Ok(line) => line?,
                Err(error) => return Some(Err(error)),
            };
            self.number += 1;
            if bytes.first() == Some(&COMMENT_PREFIX) {
                continue;
            }
            return Some(Ok(NumberedLine {
                number: self.number,
                bytes,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn collect(source: &[u8]) -> Vec<NumberedLine> {
        JobLines::new(Cursor::new(source.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .expect("read lines")
    }

    fn numbered(number: usize, text: &str) -> NumberedLine {
        NumberedLine {
            number,
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn comments_advance_numbering_but_are_skipped() {
        let lines = collect(b"# header\nx,0,1,10,2\n#x,0,1,10,2\nx*x,0,1,10,5\n");
        assert_eq!(
            lines,
            vec![numbered(2, "x,0,1,10,2"), numbered(4, "x*x,0,1,10,5")]
        );
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let lines = collect(b"x,0,1,10,2\r\n");
        assert_eq!(lines.first().and_then(NumberedLine::text), Some("x,0,1,10,2"));
    }

    #[test]
    fn blank_lines_are_yielded() {
        let lines = collect(b"\nx,0,1,10,2");
        assert_eq!(lines, vec![numbered(1, ""), numbered(2, "x,0,1,10,2")]);
    }

    #[test]
    fn undecodable_line_keeps_its_number() {
        let lines = collect(b"\xff,0,1,10,2\nx,0,1,10,2\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().map(|line| line.number), Some(1));
        assert_eq!(lines.first().and_then(NumberedLine::text), None);
        assert_eq!(lines.get(1), Some(&numbered(2, "x,0,1,10,2")));
    }
}
