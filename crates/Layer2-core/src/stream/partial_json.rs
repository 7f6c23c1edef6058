//! Best-effort partial JSON parsing
//!
//! Streaming tool arguments are incomplete JSON most of the time. This
//! parser returns the value the text describes so far: open strings,
//! arrays and objects are closed implicitly, a key without a value is
//! omitted, and a truncated literal or number is completed when its
//! prefix is unambiguous. Syntax errors before the end of the text yield
//! `None`. The parser never panics.

use serde_json::{Map, Value};

/// 최대 중첩 깊이
const MAX_DEPTH: usize = 256;

/// 불완전한 JSON 텍스트를 최선으로 파싱
///
/// Returns `None` for empty, whitespace-only or malformed input.
pub fn parse_partial(text: &str) -> Option<Value> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.at_end() {
        return None;
    }

    let parsed = parser.value(0).ok()?;
    if parsed.complete {
        parser.skip_ws();
        if !parser.at_end() {
            return None;
        }
    }
    parsed.value
}

#[derive(Debug)]
struct Malformed;

#[derive(Debug)]
struct Parsed {
    value: Option<Value>,
    /// false면 텍스트가 값 중간에서 끝남
    complete: bool,
}

impl Parsed {
    fn complete(value: Value) -> Self {
        Self {
            value: Some(value),
            complete: true,
        }
    }

    fn partial(value: Option<Value>) -> Self {
        Self {
            value,
            complete: false,
        }
    }
}

type Step = std::result::Result<Parsed, Malformed>;

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn value(&mut self, depth: usize) -> Step {
        if depth > MAX_DEPTH {
            return Err(Malformed);
        }
        self.skip_ws();
        match self.peek() {
            None => Ok(Parsed::partial(None)),
            Some(b'{') => self.object(depth),
            Some(b'[') => self.array(depth),
            Some(b'"') => {
                let (text, complete) = self.string()?;
                Ok(Parsed {
                    value: Some(Value::String(text)),
                    complete,
                })
            }
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b't' | b'f' | b'n') => self.literal(),
            Some(_) => Err(Malformed),
        }
    }

    fn object(&mut self, depth: usize) -> Step {
        self.pos += 1;
        let mut map = Map::new();

        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Parsed::complete(Value::Object(map)));
        }

        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(Parsed::partial(Some(Value::Object(map)))),
                Some(b'"') => {}
                Some(_) => return Err(Malformed),
            }

            let (key, key_complete) = self.string()?;
            if !key_complete {
                return Ok(Parsed::partial(Some(Value::Object(map))));
            }

            self.skip_ws();
            match self.bump() {
                None => return Ok(Parsed::partial(Some(Value::Object(map)))),
                Some(b':') => {}
                Some(_) => return Err(Malformed),
            }

            let member = self.value(depth + 1)?;
            if let Some(value) = member.value {
                map.insert(key, value);
            }
            if !member.complete {
                return Ok(Parsed::partial(Some(Value::Object(map))));
            }

            self.skip_ws();
            match self.bump() {
                None => return Ok(Parsed::partial(Some(Value::Object(map)))),
                Some(b',') => continue,
                Some(b'}') => return Ok(Parsed::complete(Value::Object(map))),
                Some(_) => return Err(Malformed),
            }
        }
    }

    fn array(&mut self, depth: usize) -> Step {
        self.pos += 1;
        let mut items = Vec::new();

        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Parsed::complete(Value::Array(items)));
        }

        loop {
            let item = self.value(depth + 1)?;
            if let Some(value) = item.value {
                items.push(value);
            }
            if !item.complete {
                return Ok(Parsed::partial(Some(Value::Array(items))));
            }

            self.skip_ws();
            match self.bump() {
                None => return Ok(Parsed::partial(Some(Value::Array(items)))),
                Some(b',') => continue,
                Some(b']') => return Ok(Parsed::complete(Value::Array(items))),
                Some(_) => return Err(Malformed),
            }
        }
    }

    /// 문자열 파싱: (내용, 닫힘 여부)
    ///
    /// An escape sequence cut off by the end of the text is dropped.
    fn string(&mut self) -> std::result::Result<(String, bool), Malformed> {
        self.pos += 1;
        let mut buf: Vec<u8> = Vec::new();

        loop {
            let Some(b) = self.bump() else {
                return Ok((String::from_utf8_lossy(&buf).into_owned(), false));
            };
            match b {
                b'"' => return Ok((String::from_utf8_lossy(&buf).into_owned(), true)),
                b'\\' => {
                    let Some(esc) = self.bump() else {
                        return Ok((String::from_utf8_lossy(&buf).into_owned(), false));
                    };
                    let ch = match esc {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'/' => '/',
                        b'b' => '\u{0008}',
                        b'f' => '\u{000C}',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        b'u' => match self.unicode_escape()? {
                            Some(ch) => ch,
                            None => {
                                return Ok((String::from_utf8_lossy(&buf).into_owned(), false))
                            }
                        },
                        _ => return Err(Malformed),
                    };
                    let mut tmp = [0u8; 4];
                    buf.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
                }
                other => buf.push(other),
            }
        }
    }

    /// `\u` 뒤의 코드 포인트 (텍스트가 끝나면 None)
    fn unicode_escape(&mut self) -> std::result::Result<Option<char>, Malformed> {
        let Some(high) = self.hex4()? else {
            return Ok(None);
        };

        if !(0xD800..=0xDBFF).contains(&high) {
            return Ok(Some(char::from_u32(high).unwrap_or('\u{FFFD}')));
        }

        // 서로게이트 쌍
        match (self.peek(), self.bytes.get(self.pos + 1).copied()) {
            (None, _) | (Some(b'\\'), None) => return Ok(None),
            (Some(b'\\'), Some(b'u')) => {}
            _ => return Ok(Some('\u{FFFD}')),
        }
        let save = self.pos;
        self.pos += 2;
        let Some(low) = self.hex4()? else {
            return Ok(None);
        };
        if (0xDC00..=0xDFFF).contains(&low) {
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            Ok(Some(char::from_u32(code).unwrap_or('\u{FFFD}')))
        } else {
            self.pos = save;
            Ok(Some('\u{FFFD}'))
        }
    }

    fn hex4(&mut self) -> std::result::Result<Option<u32>, Malformed> {
        let mut code = 0u32;
        for _ in 0..4 {
            let Some(b) = self.bump() else {
                return Ok(None);
            };
            let digit = (b as char).to_digit(16).ok_or(Malformed)?;
            code = code * 16 + digit;
        }
        Ok(Some(code))
    }

    fn number(&mut self) -> Step {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|_| Malformed)?;

        if !self.at_end() {
            return serde_json::from_str::<Value>(text)
                .map(Parsed::complete)
                .map_err(|_| Malformed);
        }

        // 텍스트 끝: 숫자가 이어질 수 있으므로 부분 값
        let trimmed = text.trim_end_matches(|c| matches!(c, '.' | 'e' | 'E' | '+' | '-'));
        let value = serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_number);
        Ok(Parsed::partial(value))
    }

    fn literal(&mut self) -> Step {
        let start = self.pos;
        while matches!(self.peek(), Some(b'a'..=b'z')) {
            self.pos += 1;
        }
        let word = &self.bytes[start..self.pos];

        for (text, value) in [
            (&b"true"[..], Value::Bool(true)),
            (&b"false"[..], Value::Bool(false)),
            (&b"null"[..], Value::Null),
        ] {
            if word == text {
                return Ok(Parsed::complete(value));
            }
            if self.at_end() && !word.is_empty() && text.starts_with(word) {
                return Ok(Parsed::partial(Some(value)));
            }
        }
        Err(Malformed)
    }
}
