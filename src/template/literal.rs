//! Parser for the single-quoted literal dicts found in legacy template rows,
//! e.g. `{'content': 'Hi {name}', 'reply_relay': None}`.
//!
//! Supports dicts, lists, tuples (as arrays), quoted strings with backslash
//! escapes, integers, floats, `True`, `False` and `None`. Produces a
//! `serde_json::Value`; anything else is a parse failure.

use serde_json::{Map, Number, Value};

pub(crate) fn parse_literal(input: &str) -> Option<Value> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos == parser.chars.len() {
        Some(value)
    } else {
        None
    }
}

/// Resolve backslash escapes the way a quoted literal would.
///
/// Unknown escapes are kept verbatim.
pub(crate) fn unescape(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let (decoded, consumed) = decode_escape(&chars[i + 1..]);
        match decoded {
            Some(d) => {
                out.push(d);
                i += 1 + consumed;
            }
            None => {
                out.push('\\');
                i += 1;
            }
        }
    }
    out
}

/// Decode one escape body (the chars after `\`). Returns the char and how many chars were used.
fn decode_escape(rest: &[char]) -> (Option<char>, usize) {
    let Some(&head) = rest.first() else {
        return (None, 0);
    };
    match head {
        'n' => (Some('\n'), 1),
        't' => (Some('\t'), 1),
        'r' => (Some('\r'), 1),
        '0' => (Some('\0'), 1),
        '\\' => (Some('\\'), 1),
        '\'' => (Some('\''), 1),
        '"' => (Some('"'), 1),
        'x' => (hex_char(rest.get(1..3)), 3),
        'u' => (hex_char(rest.get(1..5)), 5),
        'U' => (hex_char(rest.get(1..9)), 9),
        _ => (None, 0),
    }
}

fn hex_char(digits: Option<&[char]>) -> Option<char> {
    let text: String = digits?.iter().collect();
    u32::from_str_radix(&text, 16).ok().and_then(char::from_u32)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '{' => self.dict(),
            '[' => self.sequence('[', ']'),
            '(' => self.sequence('(', ')'),
            '\'' | '"' => self.string().map(Value::String),
            c if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() => self.keyword(),
            _ => None,
        }
    }

    fn dict(&mut self) -> Option<Value> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            if self.eat('}') {
                return Some(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if !self.eat(':') {
                return None;
            }
            let value = self.value()?;
            map.insert(key, value);
            if !self.eat(',') {
                return self.eat('}').then_some(Value::Object(map));
            }
        }
    }

    fn sequence(&mut self, _open: char, close: char) -> Option<Value> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(Value::Array(items));
            }
            items.push(self.value()?);
            if !self.eat(',') {
                return self.eat(close).then_some(Value::Array(items));
            }
        }
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.peek()?;
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == quote {
                return Some(out);
            }
            if c == '\\' {
                let (decoded, consumed) = decode_escape(&self.chars[self.pos..]);
                match decoded {
                    Some(d) => {
                        out.push(d);
                        self.pos += consumed;
                    }
                    None => out.push('\\'),
                }
                continue;
            }
            out.push(c);
        }
        None
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Number(i.into()));
        }
        let f = text.parse::<f64>().ok()?;
        Number::from_f64(f).map(Value::Number)
    }

    fn keyword(&mut self) -> Option<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            "None" => Some(Value::Null),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_quoted_dict() {
        let parsed =
            parse_literal("{'content': 'Hi {name}', 'reply_relay': 'http://r.example'}").unwrap();
        assert_eq!(
            parsed,
            json!({"content": "Hi {name}", "reply_relay": "http://r.example"})
        );
    }

    #[test]
    fn test_keywords_numbers_and_nesting() {
        let parsed =
            parse_literal("{'a': True, 'b': None, 'c': -3, 'd': 1.5, 'e': [1, (2, 3)], }").unwrap();
        assert_eq!(
            parsed,
            json!({"a": true, "b": null, "c": -3, "d": 1.5, "e": [1, [2, 3]]})
        );
    }

    #[test]
    fn test_escapes_and_mixed_quotes() {
        let parsed = parse_literal(r#"{"content": 'It\'s\n"fine"'}"#).unwrap();
        assert_eq!(parsed["content"], "It's\n\"fine\"");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_literal("{'a': }").is_none());
        assert!(parse_literal("{'a': 1").is_none());
        assert!(parse_literal("{'a': 1} trailing").is_none());
        assert!(parse_literal("{'a': os.system}").is_none());
        assert!(parse_literal("plain text").is_none());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"line\nnext\ttab"), "line\nnext\ttab");
        assert_eq!(unescape(r"\u26a1 zap"), "⚡ zap");
        assert_eq!(unescape(r"keep \q and \u26a1"), "keep \\q and ⚡");
        assert_eq!(unescape("trailing \\"), "trailing \\");
    }
}
