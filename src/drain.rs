use crate::error::{ErrorCode, Result};
use crate::read::JsonReader;

/// What the innermost open container accepts next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    /// After `[`: a value or `]`.
    ElementOrEnd,
    /// After `,` in an array.
    Element,
    /// After `{`: a string key or `}`.
    KeyOrEnd,
    /// After `,` in an object.
    Key,
    Colon,
    /// After `:`.
    MemberValue,
    /// After a complete element or member.
    CommaOrEnd { object: bool },
}

/// Progress through a JSON value that is being skipped.
///
/// Skipping checks the full grammar of the value, token by token, and keeps
/// only what each open container expects next, so it can stop at any token
/// boundary and continue with the next block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainState {
    open: Vec<Expect>,
}

impl DrainState {
    pub fn new() -> Self {
        DrainState::default()
    }

    /// Consumes the rest of one complete value. Returns false when the block
    /// ran out first.
    pub fn drain(&mut self, reader: &mut JsonReader<'_>) -> Result<bool> {
        loop {
            let expect = self.open.last().copied();
            let eof = match expect {
                None => ErrorCode::EofWhileParsingValue,
                Some(Expect::ElementOrEnd | Expect::Element | Expect::CommaOrEnd { object: false }) => {
                    ErrorCode::EofWhileParsingList
                }
                Some(_) => ErrorCode::EofWhileParsingObject,
            };
            let ch = match tri!(reader.next_token(eof)) {
                Some(ch) => ch,
                None => return Ok(false),
            };

            match (expect, ch) {
                (Some(Expect::ElementOrEnd), b']') | (Some(Expect::KeyOrEnd), b'}') => {
                    self.open.pop();
                }
                (Some(Expect::Element), b']') | (Some(Expect::Key), b'}') => {
                    return Err(reader.error(ErrorCode::TrailingComma));
                }
                (Some(Expect::KeyOrEnd | Expect::Key), b'"') => {
                    reader.back_one();
                    if tri!(reader.try_read_scalar()).is_none() {
                        return Ok(false);
                    }
                    self.set_top(Expect::Colon);
                    continue;
                }
                (Some(Expect::KeyOrEnd | Expect::Key), _) => {
                    return Err(reader.error(ErrorCode::KeyMustBeAString));
                }
                (Some(Expect::Colon), b':') => {
                    self.set_top(Expect::MemberValue);
                    continue;
                }
                (Some(Expect::Colon), _) => return Err(reader.error(ErrorCode::ExpectedColon)),
                (Some(Expect::CommaOrEnd { object }), b',') => {
                    self.set_top(if object { Expect::Key } else { Expect::Element });
                    continue;
                }
                (Some(Expect::CommaOrEnd { object: false }), b']')
                | (Some(Expect::CommaOrEnd { object: true }), b'}') => {
                    self.open.pop();
                }
                (Some(Expect::CommaOrEnd { object: false }), _) => {
                    return Err(reader.error(ErrorCode::ExpectedListCommaOrEnd));
                }
                (Some(Expect::CommaOrEnd { object: true }), _) => {
                    return Err(reader.error(ErrorCode::ExpectedObjectCommaOrEnd));
                }
                // A value is expected from here on.
                (_, b'[') => {
                    self.value_started();
                    self.open.push(Expect::ElementOrEnd);
                    continue;
                }
                (_, b'{') => {
                    self.value_started();
                    self.open.push(Expect::KeyOrEnd);
                    continue;
                }
                (_, b',' | b':' | b']' | b'}') => {
                    return Err(reader.error(ErrorCode::ExpectedSomeValue));
                }
                _ => {
                    reader.back_one();
                    if tri!(reader.try_read_scalar()).is_none() {
                        return Ok(false);
                    }
                    self.value_started();
                }
            }

            if self.open.is_empty() {
                return Ok(true);
            }
        }
    }

    fn set_top(&mut self, expect: Expect) {
        if let Some(top) = self.open.last_mut() {
            *top = expect;
        }
    }

    /// The enclosing container expects a comma or its closer once the value
    /// that just started is complete.
    fn value_started(&mut self) {
        let object = self.open.last() == Some(&Expect::MemberValue);
        self.set_top(Expect::CommaOrEnd { object });
    }
}
