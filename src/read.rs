//! The reading half of the cursor.
//!
//! A [`JsonReader`] is built over one block of input. Every token it hands out
//! is complete: when a string, number or literal is cut off by the end of the
//! block the reader leaves its index where the token started, records how many
//! more bytes it needs at minimum and returns `None`. The caller keeps the
//! unconsumed tail, appends more input and resumes with a new reader.

use crate::error::{Error, ErrorCode, Result};
use core::{cmp, str};

/// A line and column pair, both one-based, as reported in errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A complete scalar token.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar<'s> {
    /// An unescaped string.
    String(&'s str),
    /// The literal text of a number, already checked against the JSON grammar.
    Number(&'s str),
    Bool(bool),
    Null,
}

impl<'s> Scalar<'s> {
    /// Describes the token for "invalid type" errors.
    pub fn unexpected(&self) -> serde::de::Unexpected<'s> {
        match *self {
            Scalar::String(s) => serde::de::Unexpected::Str(s),
            Scalar::Number(_) => serde::de::Unexpected::Other("number"),
            Scalar::Bool(b) => serde::de::Unexpected::Bool(b),
            Scalar::Null => serde::de::Unexpected::Unit,
        }
    }
}

/// Cursor over one block of JSON input.
pub struct JsonReader<'a> {
    slice: &'a [u8],
    index: usize,
    is_final_block: bool,
    size_needed: usize,
    scratch: Vec<u8>,
}

impl<'a> JsonReader<'a> {
    /// Creates a reader over `slice`. When `is_final_block` is false, running
    /// out of input suspends; when it is true, it is an EOF error.
    pub fn new(slice: &'a [u8], is_final_block: bool) -> Self {
        JsonReader {
            slice,
            index: 0,
            is_final_block,
            size_needed: 0,
            scratch: Vec::new(),
        }
    }

    /// Number of bytes fully consumed so far. Everything after this offset must
    /// be presented again on the next call.
    pub fn consumed(&self) -> usize {
        self.index
    }

    /// The bytes that have not been consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.slice[self.index..]
    }

    pub fn is_final_block(&self) -> bool {
        self.is_final_block
    }

    /// Minimum number of additional bytes required before the reader can make
    /// progress. Only meaningful after a read returned `None`.
    pub fn size_needed(&self) -> usize {
        self.size_needed
    }

    /// Line and column of the current offset.
    pub fn position(&self) -> Position {
        self.position_of_index(self.index)
    }

    fn position_of_index(&self, i: usize) -> Position {
        let start_of_line = match memchr::memrchr(b'\n', &self.slice[..i]) {
            Some(position) => position + 1,
            None => 0,
        };
        Position {
            line: 1 + memchr::memchr_iter(b'\n', &self.slice[..start_of_line]).count(),
            column: i - start_of_line,
        }
    }

    /// Builds a syntax error located at the current offset.
    #[cold]
    pub fn error(&self, code: ErrorCode) -> Error {
        let position = self.position();
        Error::syntax(code, position.line, position.column)
    }

    /// Builds a syntax error located at the next unread byte.
    #[cold]
    pub fn peek_error(&self, code: ErrorCode) -> Error {
        self.error_at(cmp::min(self.slice.len(), self.index + 1), code)
    }

    #[cold]
    fn error_at(&self, index: usize, code: ErrorCode) -> Error {
        let position = self.position_of_index(index);
        Error::syntax(code, position.line, position.column)
    }

    fn need(&mut self, size: usize) {
        self.size_needed = size;
    }

    /// Skips whitespace and consumes the next byte.
    pub fn try_read_next_skip_whitespace(&mut self) -> Option<u8> {
        while let Some(&ch) = self.slice.get(self.index) {
            self.index += 1;
            match ch {
                b' ' | b'\n' | b'\t' | b'\r' => {}
                _ => return Some(ch),
            }
        }
        self.need(1);
        None
    }

    /// Un-reads the byte returned by the last successful
    /// [`try_read_next_skip_whitespace`](Self::try_read_next_skip_whitespace).
    pub fn back_one(&mut self) {
        debug_assert!(self.index > 0);
        self.index -= 1;
    }

    /// Like `try_read_next_skip_whitespace` but running out of input in the
    /// final block is reported as `eof`.
    pub fn next_token(&mut self, eof: ErrorCode) -> Result<Option<u8>> {
        match self.try_read_next_skip_whitespace() {
            Some(ch) => Ok(Some(ch)),
            None if self.is_final_block => Err(self.error(eof)),
            None => Ok(None),
        }
    }

    /// Returns the next significant byte without consuming it.
    pub fn peek_token(&mut self, eof: ErrorCode) -> Result<Option<u8>> {
        let next = tri!(self.next_token(eof));
        if next.is_some() {
            self.back_one();
        }
        Ok(next)
    }

    /// Reads the rest of a string whose opening quote was just consumed.
    ///
    /// On `None` the reader is positioned back on the opening quote.
    pub fn try_read_str<'s>(&'s mut self) -> Result<Option<&'s str>> {
        let quote = self.index - 1;
        let slice = self.slice;
        self.scratch.clear();

        // Index of the first byte not yet copied into the scratch space.
        let mut start = self.index;

        loop {
            let rest = &slice[self.index..];
            let run = memchr::memchr2(b'"', b'\\', rest).unwrap_or(rest.len());
            if let Some(offset) = rest[..run].iter().position(|&b| b < 0x20) {
                return Err(self.error_at(
                    self.index + offset + 1,
                    ErrorCode::ControlCharacterWhileParsingString,
                ));
            }
            self.index += run;

            if self.index == slice.len() {
                return self.incomplete_string(quote);
            }

            if slice[self.index] == b'"' {
                let end = self.index;
                self.index += 1;
                if self.scratch.is_empty() {
                    // No escapes, so the string is a slice of the input.
                    return match str::from_utf8(&slice[start..end]) {
                        Ok(s) => Ok(Some(s)),
                        Err(_) => Err(self.error(ErrorCode::InvalidUnicodeCodePoint)),
                    };
                }
                self.scratch.extend_from_slice(&slice[start..end]);
                return match str::from_utf8(&self.scratch) {
                    Ok(s) => Ok(Some(s)),
                    Err(_) => Err(self.error(ErrorCode::InvalidUnicodeCodePoint)),
                };
            }

            self.scratch.extend_from_slice(&slice[start..self.index]);
            self.index += 1;
            if !tri!(self.parse_escape()) {
                return self.incomplete_string(quote);
            }
            start = self.index;
        }
    }

    fn incomplete_string<T>(&mut self, quote: usize) -> Result<Option<T>> {
        if self.is_final_block {
            return Err(self.error_at(self.slice.len(), ErrorCode::EofWhileParsingString));
        }
        self.index = quote;
        self.need(1);
        Ok(None)
    }

    /// Parses a JSON escape sequence and appends it into the scratch space.
    /// Assumes the previous byte read was a backslash. Returns false when the
    /// block ends inside the escape.
    fn parse_escape(&mut self) -> Result<bool> {
        let ch = match self.slice.get(self.index) {
            Some(&ch) => ch,
            None => return Ok(false),
        };
        self.index += 1;

        match ch {
            b'"' => self.scratch.push(b'"'),
            b'\\' => self.scratch.push(b'\\'),
            b'/' => self.scratch.push(b'/'),
            b'b' => self.scratch.push(b'\x08'),
            b'f' => self.scratch.push(b'\x0c'),
            b'n' => self.scratch.push(b'\n'),
            b'r' => self.scratch.push(b'\r'),
            b't' => self.scratch.push(b'\t'),
            b'u' => return self.parse_unicode_escape(),
            _ => return Err(self.error(ErrorCode::InvalidEscape)),
        }

        Ok(true)
    }

    /// Parses a JSON \u escape, including a trailing surrogate escape when the
    /// first one is a leading surrogate. Assumes `\u` has just been read.
    #[cold]
    fn parse_unicode_escape(&mut self) -> Result<bool> {
        let n1 = match tri!(self.decode_hex_escape()) {
            Some(n) => n,
            None => return Ok(false),
        };

        if (0xDC00..=0xDFFF).contains(&n1) {
            return Err(self.error(ErrorCode::LoneLeadingSurrogateInHexEscape));
        }

        let codepoint = if (0xD800..=0xDBFF).contains(&n1) {
            let slice = self.slice;
            match slice[self.index..] {
                [b'\\', b'u', ..] => self.index += 2,
                [] | [b'\\'] => return Ok(false),
                _ => return Err(self.error(ErrorCode::LoneLeadingSurrogateInHexEscape)),
            }
            let n2 = match tri!(self.decode_hex_escape()) {
                Some(n) => n,
                None => return Ok(false),
            };
            if !(0xDC00..=0xDFFF).contains(&n2) {
                return Err(self.error(ErrorCode::LoneLeadingSurrogateInHexEscape));
            }
            ((((n1 - 0xD800) as u32) << 10) | (n2 - 0xDC00) as u32) + 0x1_0000
        } else {
            n1 as u32
        };

        match char::from_u32(codepoint) {
            Some(c) => {
                let mut buf = [0; 4];
                self.scratch
                    .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                Ok(true)
            }
            None => Err(self.error(ErrorCode::InvalidUnicodeCodePoint)),
        }
    }

    fn decode_hex_escape(&mut self) -> Result<Option<u16>> {
        let slice = self.slice;
        match slice[self.index..] {
            [a, b, c, d, ..] => match decode_four_hex_digits(a, b, c, d) {
                Some(val) => {
                    self.index += 4;
                    Ok(Some(val))
                }
                None => Err(self.error_at(self.index + 4, ErrorCode::InvalidEscape)),
            },
            _ => Ok(None),
        }
    }

    /// Reads one complete scalar token: a string, number, `true`, `false` or
    /// `null`. Leading whitespace is skipped.
    pub fn try_read_scalar(&mut self) -> Result<Option<Scalar<'_>>> {
        let ch = match tri!(self.next_token(ErrorCode::EofWhileParsingValue)) {
            Some(ch) => ch,
            None => return Ok(None),
        };
        match ch {
            b'"' => Ok(tri!(self.try_read_str()).map(Scalar::String)),
            b'-' | b'0'..=b'9' => {
                self.back_one();
                Ok(tri!(self.try_read_number()).map(Scalar::Number))
            }
            b't' => {
                self.back_one();
                Ok(tri!(self.try_read_literal(b"true")).map(|()| Scalar::Bool(true)))
            }
            b'f' => {
                self.back_one();
                Ok(tri!(self.try_read_literal(b"false")).map(|()| Scalar::Bool(false)))
            }
            b'n' => {
                self.back_one();
                Ok(tri!(self.try_read_literal(b"null")).map(|()| Scalar::Null))
            }
            _ => Err(self.error(ErrorCode::ExpectedSomeValue)),
        }
    }

    fn try_read_number(&mut self) -> Result<Option<&'a str>> {
        let slice = self.slice;
        let rest = &slice[self.index..];
        let len = rest
            .iter()
            .position(|b| !matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'))
            .unwrap_or(rest.len());
        if len == rest.len() && !self.is_final_block {
            // More digits may follow in the next block.
            self.need(1);
            return Ok(None);
        }
        let text = &rest[..len];
        if !is_json_number(text) {
            return Err(self.error_at(self.index + len, ErrorCode::InvalidNumber));
        }
        match str::from_utf8(text) {
            Ok(number) => {
                self.index += len;
                Ok(Some(number))
            }
            Err(_) => Err(self.error(ErrorCode::InvalidNumber)),
        }
    }

    fn try_read_literal(&mut self, literal: &'static [u8]) -> Result<Option<()>> {
        let rest = &self.slice[self.index..];
        let available = rest.len().min(literal.len());
        if let Some(offset) = (0..available).find(|&i| rest[i] != literal[i]) {
            return Err(self.error_at(self.index + offset + 1, ErrorCode::ExpectedSomeIdent));
        }
        if available < literal.len() {
            if self.is_final_block {
                return Err(self.error_at(self.slice.len(), ErrorCode::EofWhileParsingValue));
            }
            self.need(literal.len() - available);
            return Ok(None);
        }
        self.index += literal.len();
        Ok(Some(()))
    }
}

/// `-? (0 | [1-9][0-9]*) (\.[0-9]+)? ([eE][+-]?[0-9]+)?`
fn is_json_number(text: &[u8]) -> bool {
    fn digits(text: &[u8], mut i: usize) -> usize {
        while i < text.len() && text[i].is_ascii_digit() {
            i += 1;
        }
        i
    }

    let mut i = 0;
    if text.first() == Some(&b'-') {
        i += 1;
    }
    match text.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits(text, i + 1),
        _ => return false,
    }
    if text.get(i) == Some(&b'.') {
        let end = digits(text, i + 1);
        if end == i + 1 {
            return false;
        }
        i = end;
    }
    if let Some(b'e' | b'E') = text.get(i) {
        i += 1;
        if let Some(b'+' | b'-') = text.get(i) {
            i += 1;
        }
        let end = digits(text, i);
        if end == i {
            return false;
        }
        i = end;
    }
    i == text.len()
}

const fn decode_hex_val_slow(val: u8) -> Option<u8> {
    match val {
        b'0'..=b'9' => Some(val - b'0'),
        b'A'..=b'F' => Some(val - b'A' + 10),
        b'a'..=b'f' => Some(val - b'a' + 10),
        _ => None,
    }
}

const fn build_hex_table(shift: usize) -> [i16; 256] {
    let mut table = [0; 256];
    let mut ch = 0;
    while ch < 256 {
        table[ch] = match decode_hex_val_slow(ch as u8) {
            Some(val) => (val as i16) << shift,
            None => -1,
        };
        ch += 1;
    }
    table
}

static HEX0: [i16; 256] = build_hex_table(0);
static HEX1: [i16; 256] = build_hex_table(4);

fn decode_four_hex_digits(a: u8, b: u8, c: u8, d: u8) -> Option<u16> {
    let a = HEX1[a as usize] as i32;
    let b = HEX0[b as usize] as i32;
    let c = HEX1[c as usize] as i32;
    let d = HEX0[d as usize] as i32;

    let codepoint = ((a | b) << 8) | c | d;

    // A single sign bit check.
    if codepoint >= 0 {
        Some(codepoint as u16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_string(input: &str, is_final_block: bool) -> Result<Option<String>> {
        let mut reader = JsonReader::new(input.as_bytes(), is_final_block);
        assert_eq!(reader.try_read_next_skip_whitespace(), Some(b'"'));
        Ok(tri!(reader.try_read_str()).map(str::to_owned))
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            read_string(r#""a\"b\\c\/\né😀""#, true).unwrap(),
            Some("a\"b\\c/\n\u{e9}\u{1f600}".to_owned())
        );
    }

    #[test]
    fn test_string_cut_inside_escape() {
        for input in [r#""ab\"#, r#""ab\u00"#, r#""\ud83d"#, r#""\ud83d\"#, r#""\ud83d\ude0"#] {
            let mut reader = JsonReader::new(input.as_bytes(), false);
            assert_eq!(reader.try_read_next_skip_whitespace(), Some(b'"'));
            assert_eq!(reader.try_read_str().unwrap(), None, "{}", input);
            assert_eq!(reader.consumed(), 0);
            assert_eq!(reader.size_needed(), 1);
        }
    }

    #[test]
    fn test_string_eof_in_final_block() {
        let err = read_string(r#""abc"#, true).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_lone_surrogate() {
        let err = read_string(r#""\ude00""#, true).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::LoneLeadingSurrogateInHexEscape);
    }

    #[test]
    fn test_number_needs_more_unless_final() {
        let mut reader = JsonReader::new(b" 123", false);
        assert_eq!(reader.try_read_scalar().unwrap(), None);
        assert_eq!(reader.consumed(), 1);

        let mut reader = JsonReader::new(b" 123", true);
        assert_eq!(reader.try_read_scalar().unwrap(), Some(Scalar::Number("123")));

        let mut reader = JsonReader::new(b"123,", false);
        assert_eq!(reader.try_read_scalar().unwrap(), Some(Scalar::Number("123")));
        assert_eq!(reader.remaining(), b",");
    }

    #[test]
    fn test_number_grammar() {
        for ok in ["0", "-0", "1.5", "-12e+3", "7E9", "0.25e-1"] {
            assert!(is_json_number(ok.as_bytes()), "{}", ok);
        }
        for bad in ["01", "-", "1.", ".5", "1e", "1e+", "+1", "1-2"] {
            assert!(!is_json_number(bad.as_bytes()), "{}", bad);
        }
    }

    #[test]
    fn test_literal_needs_remaining() {
        let mut reader = JsonReader::new(b"tr", false);
        assert_eq!(reader.try_read_scalar().unwrap(), None);
        assert_eq!(reader.size_needed(), 2);
        assert_eq!(reader.consumed(), 0);

        let mut reader = JsonReader::new(b"tx", false);
        let err = reader.try_read_scalar().unwrap_err();
        assert_eq!(*err.code(), ErrorCode::ExpectedSomeIdent);
        assert_eq!(err.column(), 2);
    }

    #[test]
    fn test_error_position() {
        let mut reader = JsonReader::new(b"[\n  1,\n  x]", true);
        while let Some(ch) = reader.try_read_next_skip_whitespace() {
            if ch == b'x' {
                break;
            }
        }
        let err = reader.error(ErrorCode::ExpectedSomeValue);
        assert_eq!((err.line(), err.column()), (3, 3));
    }
}
