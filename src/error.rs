//! When reading or writing JSON goes wrong.
//!
//! Running out of input or output room is not an error: converters report it
//! through their return value together with the number of units needed.
//! Everything in this module is fatal for the operation that raised it, and the
//! state of that operation must be discarded afterwards.

use core::fmt::{self, Debug, Display};
use core::result;
use core::str::FromStr;
use serde::de;
use std::error;
use std::io;

/// This type represents all possible errors that can occur when reading or
/// writing JSON through the converter engine.
pub struct Error {
    /// This `Box` allows us to keep the size of `Error` as small as possible. A
    /// larger `Error` type was substantially slower due to all the functions
    /// that pass around `Result<T, Error>`.
    err: Box<ErrorImpl>,
}

/// Alias for a `Result` with the error type `resumable_json::Error`.
pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// One-based line number at which the error was detected.
    ///
    /// Line numbers are relative to the buffer that was being read when the
    /// error was raised, which for chunked input is the unconsumed tail plus
    /// the newest chunk.
    pub fn line(&self) -> usize {
        self.err.line
    }

    /// One-based column number at which the error was detected.
    ///
    /// Zero when the error is not tied to an input position, for example a
    /// configuration error or an error raised while writing.
    pub fn column(&self) -> usize {
        self.err.column
    }

    /// Specifies the cause of this error.
    pub fn code(&self) -> &ErrorCode {
        &self.err.code
    }

    /// Categorizes the cause of this error.
    ///
    /// - `Category::Io` - failure to read or write bytes on an IO stream
    /// - `Category::Syntax` - input that is not syntactically valid JSON
    /// - `Category::Data` - input whose shape does not match the target type
    /// - `Category::Eof` - the final block ended in the middle of a value
    /// - `Category::Config` - the target type cannot be converted at all
    pub fn classify(&self) -> Category {
        match self.err.code {
            ErrorCode::Message(_)
            | ErrorCode::InvalidType(_, _)
            | ErrorCode::InvalidValue(_, _)
            | ErrorCode::MissingField(_) => Category::Data,
            ErrorCode::Io(_) => Category::Io,
            ErrorCode::EofWhileParsingList
            | ErrorCode::EofWhileParsingObject
            | ErrorCode::EofWhileParsingString
            | ErrorCode::EofWhileParsingValue => Category::Eof,
            ErrorCode::ExpectedColon
            | ErrorCode::ExpectedListCommaOrEnd
            | ErrorCode::ExpectedObjectCommaOrEnd
            | ErrorCode::ExpectedSomeIdent
            | ErrorCode::ExpectedSomeValue
            | ErrorCode::InvalidEscape
            | ErrorCode::InvalidNumber
            | ErrorCode::NumberOutOfRange
            | ErrorCode::InvalidUnicodeCodePoint
            | ErrorCode::ControlCharacterWhileParsingString
            | ErrorCode::KeyMustBeAString
            | ErrorCode::LoneLeadingSurrogateInHexEscape
            | ErrorCode::TrailingComma
            | ErrorCode::TrailingCharacters
            | ErrorCode::RecursionLimitExceeded => Category::Syntax,
            ErrorCode::UnknownElementTypes(_) | ErrorCode::ForeignState => Category::Config,
        }
    }

    /// Returns true if this error was caused by a failure to read or write
    /// bytes on an IO stream.
    pub fn is_io(&self) -> bool {
        self.classify() == Category::Io
    }

    /// Returns true if this error was caused by input that was not
    /// syntactically valid JSON.
    pub fn is_syntax(&self) -> bool {
        self.classify() == Category::Syntax
    }

    /// Returns true if this error was caused by input data whose shape does not
    /// match the target type.
    ///
    /// For example, a JSON string where a dictionary was expected while
    /// `error_on_type_mismatch` is enabled.
    pub fn is_data(&self) -> bool {
        self.classify() == Category::Data
    }

    /// Returns true if this error was caused by the final block of input
    /// ending in the middle of a value.
    ///
    /// Blocks that are not marked final never produce this error; the engine
    /// suspends and asks for more input instead.
    pub fn is_eof(&self) -> bool {
        self.classify() == Category::Eof
    }

    /// Returns true if this error was caused by a target type that the engine
    /// cannot convert regardless of the input.
    pub fn is_config(&self) -> bool {
        self.classify() == Category::Config
    }
}

/// Categorizes the cause of a `resumable_json::Error`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Category {
    /// The error was caused by a failure to read or write bytes on an IO
    /// stream.
    Io,

    /// The error was caused by input that was not syntactically valid JSON.
    Syntax,

    /// The error was caused by input data that was semantically incorrect.
    Data,

    /// The error was caused by the final block ending in the middle of a value.
    Eof,

    /// The error was caused by a target type the engine cannot convert.
    Config,
}

#[allow(clippy::fallible_impl_from)]
impl From<Error> for io::Error {
    /// Convert a `resumable_json::Error` into an `io::Error`.
    ///
    /// JSON syntax, data and configuration errors are turned into
    /// `InvalidData` IO errors. EOF errors are turned into `UnexpectedEof` IO
    /// errors.
    fn from(j: Error) -> Self {
        if let ErrorCode::Io(err) = j.err.code {
            err
        } else {
            match j.classify() {
                Category::Io => unreachable!(),
                Category::Syntax | Category::Data | Category::Config => {
                    io::Error::new(io::ErrorKind::InvalidData, j)
                }
                Category::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, j),
            }
        }
    }
}

struct ErrorImpl {
    code: ErrorCode,
    line: usize,
    column: usize,
}

/// This type describe all possible errors that can occur when reading or
/// writing JSON.
pub enum ErrorCode {
    /// Catchall for error messages
    Message(Box<str>),

    /// Different JSON shape than the target type expects
    InvalidType(Box<str>, Box<str>),

    /// Value of the right shape but wrong for some other reason
    InvalidValue(Box<str>, Box<str>),

    /// A key/value pair object was missing its `Key` or `Value` member
    MissingField(Box<str>),

    /// Some IO error occurred while reading or writing.
    Io(io::Error),

    /// EOF while parsing a list.
    EofWhileParsingList,

    /// EOF while parsing an object.
    EofWhileParsingObject,

    /// EOF while parsing a string.
    EofWhileParsingString,

    /// EOF while parsing a JSON value.
    EofWhileParsingValue,

    /// Expected this character to be a `':'`.
    ExpectedColon,

    /// Expected this character to be either a `','` or a `']'`.
    ExpectedListCommaOrEnd,

    /// Expected this character to be either a `','` or a `'}'`.
    ExpectedObjectCommaOrEnd,

    /// Expected to parse either a `true`, `false`, or a `null`.
    ExpectedSomeIdent,

    /// Expected this character to start a JSON value.
    ExpectedSomeValue,

    /// Invalid hex escape code.
    InvalidEscape,

    /// Invalid number.
    InvalidNumber,

    /// Number is bigger than the maximum value of its type.
    NumberOutOfRange,

    /// Invalid unicode code point.
    InvalidUnicodeCodePoint,

    /// Control character found while parsing a string.
    ControlCharacterWhileParsingString,

    /// Object key is not a string.
    KeyMustBeAString,

    /// Lone leading surrogate in hex escape.
    LoneLeadingSurrogateInHexEscape,

    /// JSON has a comma after the last value in an array or map.
    TrailingComma,

    /// JSON has non-whitespace trailing characters after the value.
    TrailingCharacters,

    /// Encountered nesting of JSON maps and arrays deeper than the configured
    /// limit.
    RecursionLimitExceeded,

    /// The target is a dictionary whose key and value types were erased, so
    /// no element converters can be chosen.
    UnknownElementTypes(Box<str>),

    /// A state was resumed by a converter that did not suspend it.
    ForeignState,
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Io(_) => f.debug_tuple("Io").finish(),
            error_code => f.write_str(&error_code.to_string()),
        }
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorCode::Message(l0), ErrorCode::Message(r0)) => l0 == r0,
            (ErrorCode::InvalidType(l0, l1), ErrorCode::InvalidType(r0, r1)) => {
                l0 == r0 && l1 == r1
            }
            (ErrorCode::InvalidValue(l0, l1), ErrorCode::InvalidValue(r0, r1)) => {
                l0 == r0 && l1 == r1
            }
            (ErrorCode::MissingField(l0), ErrorCode::MissingField(r0)) => l0 == r0,
            (ErrorCode::UnknownElementTypes(l0), ErrorCode::UnknownElementTypes(r0)) => l0 == r0,
            (ErrorCode::Io(_), ErrorCode::Io(_)) => true,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Error {
    #[cold]
    pub(crate) fn syntax(code: ErrorCode, line: usize, column: usize) -> Self {
        Error {
            err: Box::new(ErrorImpl { code, line, column }),
        }
    }

    #[cold]
    pub(crate) fn io(error: io::Error) -> Self {
        Error {
            err: Box::new(ErrorImpl {
                code: ErrorCode::Io(error),
                line: 0,
                column: 0,
            }),
        }
    }

    /// An error raised away from the reader. Callers that have one attach
    /// its position later with `fix_position`.
    #[cold]
    pub(crate) fn unpositioned(code: ErrorCode) -> Self {
        Error {
            err: Box::new(ErrorImpl {
                code,
                line: 0,
                column: 0,
            }),
        }
    }

    /// An error that does not depend on the input, such as an unconvertible
    /// target type.
    #[cold]
    pub(crate) fn config(code: ErrorCode) -> Self {
        debug_assert!(matches!(
            code,
            ErrorCode::UnknownElementTypes(_) | ErrorCode::ForeignState
        ));
        Error::unpositioned(code)
    }

    #[cold]
    pub(crate) fn fix_position<F>(self, f: F) -> Self
    where
        F: FnOnce(ErrorCode) -> Error,
    {
        if self.err.line == 0 {
            f(self.err.code)
        } else {
            self
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorCode::Message(ref msg) => f.write_str(msg),
            ErrorCode::InvalidType(unexp, exp) => {
                write!(f, "invalid type: {}, expected {}", unexp, exp)
            }
            ErrorCode::InvalidValue(unexp, exp) => {
                write!(f, "invalid value: {}, expected {}", unexp, exp)
            }
            ErrorCode::MissingField(ref field) => write!(f, "missing field `{}`", field),
            ErrorCode::Io(ref err) => Display::fmt(err, f),
            ErrorCode::EofWhileParsingList => f.write_str("EOF while parsing a list"),
            ErrorCode::EofWhileParsingObject => f.write_str("EOF while parsing an object"),
            ErrorCode::EofWhileParsingString => f.write_str("EOF while parsing a string"),
            ErrorCode::EofWhileParsingValue => f.write_str("EOF while parsing a value"),
            ErrorCode::ExpectedColon => f.write_str("expected `:`"),
            ErrorCode::ExpectedListCommaOrEnd => f.write_str("expected `,` or `]`"),
            ErrorCode::ExpectedObjectCommaOrEnd => f.write_str("expected `,` or `}`"),
            ErrorCode::ExpectedSomeIdent => f.write_str("expected ident"),
            ErrorCode::ExpectedSomeValue => f.write_str("expected value"),
            ErrorCode::InvalidEscape => f.write_str("invalid escape"),
            ErrorCode::InvalidNumber => f.write_str("invalid number"),
            ErrorCode::NumberOutOfRange => f.write_str("number out of range"),
            ErrorCode::InvalidUnicodeCodePoint => f.write_str("invalid unicode code point"),
            ErrorCode::ControlCharacterWhileParsingString => {
                f.write_str("control character (\\u0000-\\u001F) found while parsing a string")
            }
            ErrorCode::KeyMustBeAString => f.write_str("key must be a string"),
            ErrorCode::LoneLeadingSurrogateInHexEscape => {
                f.write_str("lone leading surrogate in hex escape")
            }
            ErrorCode::TrailingComma => f.write_str("trailing comma"),
            ErrorCode::TrailingCharacters => f.write_str("trailing characters"),
            ErrorCode::RecursionLimitExceeded => f.write_str("recursion limit exceeded"),
            ErrorCode::UnknownElementTypes(ref name) => write!(
                f,
                "cannot determine target element types for `{}`",
                name
            ),
            ErrorCode::ForeignState => {
                f.write_str("state was suspended by a different converter")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.err.code {
            ErrorCode::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&*self.err, f)
    }
}

impl Display for ErrorImpl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            Display::fmt(&self.code, f)
        } else {
            write!(
                f,
                "{} at line {} column {}",
                self.code, self.line, self.column
            )
        }
    }
}

// Remove two layers of verbosity from the debug representation. Humans often
// end up seeing this representation because it is what unwrap() shows.
impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Error({:?}, line: {}, column: {})",
            self.err.code.to_string(),
            self.err.line,
            self.err.column
        )
    }
}

impl de::Error for Error {
    #[cold]
    fn custom<T: Display>(msg: T) -> Error {
        make_error(msg.to_string())
    }

    #[cold]
    fn invalid_type(unexp: de::Unexpected, exp: &dyn de::Expected) -> Self {
        Error::unpositioned(ErrorCode::InvalidType(
            if unexp == de::Unexpected::Unit {
                "null".into()
            } else {
                unexp.to_string().into_boxed_str()
            },
            exp.to_string().into_boxed_str(),
        ))
    }

    #[cold]
    fn invalid_value(unexp: de::Unexpected, exp: &dyn de::Expected) -> Self {
        Error::unpositioned(ErrorCode::InvalidValue(
            unexp.to_string().into_boxed_str(),
            exp.to_string().into_boxed_str(),
        ))
    }

    #[cold]
    fn missing_field(field: &'static str) -> Self {
        Error::unpositioned(ErrorCode::MissingField(field.into()))
    }
}

// Parse our own error message that looks like "{} at line {} column {}" so that
// an error passed through `de::Error::custom` keeps its position.
fn make_error(mut msg: String) -> Error {
    let (line, column) = parse_line_col(&mut msg).unwrap_or((0, 0));
    Error {
        err: Box::new(ErrorImpl {
            code: ErrorCode::Message(msg.into_boxed_str()),
            line,
            column,
        }),
    }
}

fn parse_line_col(msg: &mut String) -> Option<(usize, usize)> {
    let start_of_suffix = msg.rfind(" at line ")?;

    // Find start and end of line number.
    let start_of_line = start_of_suffix + " at line ".len();
    let mut end_of_line = start_of_line;
    while starts_with_digit(&msg[end_of_line..]) {
        end_of_line += 1;
    }

    if !msg[end_of_line..].starts_with(" column ") {
        return None;
    }

    // Find start and end of column number.
    let start_of_column = end_of_line + " column ".len();
    let mut end_of_column = start_of_column;
    while starts_with_digit(&msg[end_of_column..]) {
        end_of_column += 1;
    }

    if end_of_column < msg.len() {
        return None;
    }

    // Parse numbers.
    let line = usize::from_str(&msg[start_of_line..end_of_line]).ok()?;
    let column = usize::from_str(&msg[start_of_column..end_of_column]).ok()?;

    msg.truncate(start_of_suffix);
    Some((line, column))
}

fn starts_with_digit(slice: &str) -> bool {
    match slice.as_bytes().first() {
        None => false,
        Some(&byte) => byte.is_ascii_digit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn custom_message_keeps_position() {
        let err = Error::custom("bad key at line 3 column 14");
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 14);
        assert_eq!(err.to_string(), "bad key at line 3 column 14");
    }

    #[test]
    fn unknown_element_types_is_config() {
        let err = Error::config(ErrorCode::UnknownElementTypes("AnyDictionary".into()));
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "cannot determine target element types for `AnyDictionary`"
        );
    }

    #[test]
    fn unpositioned_errors_keep_their_category() {
        let err = Error::unpositioned(ErrorCode::NumberOutOfRange);
        assert!(err.is_syntax());
        assert_eq!(err.line(), 0);
        let err = Error::missing_field("Key");
        assert!(err.is_data());
        assert!(!err.is_config());
    }

    #[test]
    fn invalid_type_null() {
        let err = Error::invalid_type(de::Unexpected::Unit, &"a map");
        assert!(err.is_data());
        assert_eq!(err.to_string(), "invalid type: null, expected a map");
    }
}
