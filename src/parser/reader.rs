//! Lazy character source over a buffered reader
//!
//! Reads one line at a time so an interactive lexer only blocks for the line
//! it is currently looking at.

use std::borrow::Cow;
use std::io::BufRead;
use std::vec;

/// Iterator of `char`s pulled from a [`BufRead`] line by line.
///
/// Bytes that are not UTF-8 become U+FFFD and the line is kept. A read error
/// ends the stream; the error is logged, not returned.
pub struct ReaderChars<R: BufRead> {
    reader: R,
    line: vec::IntoIter<char>,
    done: bool,
}

impl<R: BufRead> ReaderChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new().into_iter(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ReaderChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.line.next() {
                return Some(ch);
            }
            if self.done {
                return None;
            }

            let mut buf = Vec::new();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let Cow::Owned(_) = line {
                        log::warn!("replaced invalid UTF-8 in input line: {:?}", line.trim_end());
                    }
                    self.line = line.chars().collect::<Vec<_>>().into_iter();
                }
                Err(e) => {
                    log::error!("failed to read input: {}", e);
                    self.done = true;
                }
            }
        }
    }
}
