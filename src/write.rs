//! The writing half of the cursor.
//!
//! A [`JsonWriter`] fills a caller-provided byte buffer. Tokens are written
//! whole or not at all: when a token does not fit in the room that is left,
//! nothing is written, the number of bytes the token needs is recorded and the
//! method returns false.

/// Cursor over one block of output.
pub struct JsonWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
    size_needed: usize,
}

impl<'a> JsonWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        JsonWriter {
            buffer,
            position: 0,
            size_needed: 0,
        }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.position
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Size of the token that did not fit. Only meaningful after a write
    /// returned false.
    pub fn size_needed(&self) -> usize {
        self.size_needed
    }

    fn room(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Writes `bytes` as a single token.
    pub fn try_write_bytes(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.room() {
            self.size_needed = bytes.len();
            return false;
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        true
    }

    pub fn try_write_open_brace(&mut self) -> bool {
        self.try_write_bytes(b"{")
    }

    pub fn try_write_close_brace(&mut self) -> bool {
        self.try_write_bytes(b"}")
    }

    pub fn try_write_open_bracket(&mut self) -> bool {
        self.try_write_bytes(b"[")
    }

    pub fn try_write_close_bracket(&mut self) -> bool {
        self.try_write_bytes(b"]")
    }

    /// Writes `{}` as one token.
    pub fn try_write_empty_brace(&mut self) -> bool {
        self.try_write_bytes(b"{}")
    }

    /// Writes `[]` as one token.
    pub fn try_write_empty_bracket(&mut self) -> bool {
        self.try_write_bytes(b"[]")
    }

    pub fn try_write_comma(&mut self) -> bool {
        self.try_write_bytes(b",")
    }

    pub fn try_write_null(&mut self) -> bool {
        self.try_write_bytes(b"null")
    }

    pub fn try_write_bool(&mut self, value: bool) -> bool {
        self.try_write_bytes(if value { b"true" } else { b"false" })
    }

    /// Writes an escaped, quoted string.
    pub fn try_write_string(&mut self, value: &str) -> bool {
        let len = escaped_len(value) + 2;
        if len > self.room() {
            self.size_needed = len;
            return false;
        }
        self.buffer[self.position] = b'"';
        self.position += 1;
        self.position += write_escaped(&mut self.buffer[self.position..], value);
        self.buffer[self.position] = b'"';
        self.position += 1;
        true
    }

    /// Writes `"name":` with `name` escaped, as one token.
    pub fn try_write_property_name(&mut self, name: &str) -> bool {
        let len = escaped_len(name) + 3;
        if len > self.room() {
            self.size_needed = len;
            return false;
        }
        self.buffer[self.position] = b'"';
        self.position += 1;
        self.position += write_escaped(&mut self.buffer[self.position..], name);
        self.buffer[self.position..self.position + 2].copy_from_slice(b"\":");
        self.position += 2;
        true
    }

    /// Writes a property name segment that was escaped ahead of time.
    pub fn try_write_name(&mut self, name: &JsonName) -> bool {
        self.try_write_bytes(&name.segment)
    }

    pub fn try_write_integer<I: itoa::Integer>(&mut self, value: I) -> bool {
        let mut buffer = itoa::Buffer::new();
        let s = buffer.format(value);
        self.try_write_bytes(s.as_bytes())
    }

    /// Writes a finite float in its shortest round-trip form, and `null` for NaN
    /// and the infinities.
    pub fn try_write_f64(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return self.try_write_null();
        }
        let mut buffer = zmij::Buffer::new();
        let s = buffer.format_finite(value);
        self.try_write_bytes(s.as_bytes())
    }

    pub fn try_write_f32(&mut self, value: f32) -> bool {
        if !value.is_finite() {
            return self.try_write_null();
        }
        let mut buffer = zmij::Buffer::new();
        let s = buffer.format_finite(value);
        self.try_write_bytes(s.as_bytes())
    }
}

/// A property name with its quotes, escapes and trailing colon already
/// applied, built once when a converter is set up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonName {
    name: Box<str>,
    segment: Box<[u8]>,
}

impl JsonName {
    pub fn new(name: &str) -> Self {
        let mut segment = vec![0; escaped_len(name) + 3];
        segment[0] = b'"';
        let len = write_escaped(&mut segment[1..], name);
        segment[len + 1] = b'"';
        segment[len + 2] = b':';
        JsonName {
            name: name.into(),
            segment: segment.into_boxed_slice(),
        }
    }

    /// The unescaped name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The bytes written for this name, `"name":`.
    pub fn segment(&self) -> &[u8] {
        &self.segment
    }
}

fn escaped_len(value: &str) -> usize {
    value
        .bytes()
        .map(|byte| match ESCAPE[byte as usize] {
            0 => 1,
            U => 6,
            _ => 2,
        })
        .sum()
}

/// Writes the escaped form of `value` at the start of `out`, which must be at
/// least `escaped_len(value)` long. Returns the number of bytes written.
fn write_escaped(out: &mut [u8], value: &str) -> usize {
    static HEX_DIGITS: [u8; 16] = *b"0123456789abcdef";

    let bytes = value.as_bytes();
    let mut written = 0;
    let mut start = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let escape = ESCAPE[byte as usize];
        if escape == 0 {
            continue;
        }

        if start < i {
            out[written..written + i - start].copy_from_slice(&bytes[start..i]);
            written += i - start;
        }

        if escape == U {
            out[written..written + 6].copy_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_DIGITS[(byte >> 4) as usize],
                HEX_DIGITS[(byte & 0xF) as usize],
            ]);
            written += 6;
        } else {
            out[written..written + 2].copy_from_slice(&[b'\\', escape]);
            written += 2;
        }

        start = i + 1;
    }

    if start != bytes.len() {
        out[written..written + bytes.len() - start].copy_from_slice(&bytes[start..]);
        written += bytes.len() - start;
    }

    written
}

const BB: u8 = b'b'; // \x08
const TT: u8 = b't'; // \x09
const NN: u8 = b'n'; // \x0A
const FF: u8 = b'f'; // \x0C
const RR: u8 = b'r'; // \x0D
const QU: u8 = b'"'; // \x22
const BS: u8 = b'\\'; // \x5C
const U: u8 = b'u'; // \x00...\x1F except the ones above

// Lookup table of escape sequences. A value of b'x' at index i means that byte
// i is escaped as "\x" in JSON. A value of 0 means that byte i is not escaped.
#[rustfmt::skip]
static ESCAPE: [u8; 256] = [
    //  1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    U,  U,  U,  U,  U,  U,  U,  U, BB, TT, NN,  U, FF, RR,  U,  U, // 0
    U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U,  U, // 1
    0,  0, QU,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 2
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 3
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 4
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, BS,  0,  0,  0, // 5
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 6
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 7
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 8
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 9
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // A
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // B
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // C
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // D
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // E
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // F
];
