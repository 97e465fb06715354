//! Lexer for single path segments.
//!
//! A segment is an identifier optionally followed by a parenthesised part:
//! operation parameters `add(a=1,b=@x)` or a key predicate `flights(1)` /
//! `flights(id=1)`. Parameter values are returned as raw literal text; typing
//! them is left to the argument that consumes them.

use indexmap::IndexMap;

/// The segment text did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lexer error at position {position}: {message}")]
pub struct LexerError {
    pub position: usize,
    pub message: String,
}

/// Parenthesised key of an entity set segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPredicate {
    /// `flights(1)`
    Single(String),
    /// `flights(id=1)`
    Named(IndexMap<String, String>),
}

/// Cursor over one segment.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    pub fn remaining(&self) -> &'a str {
        &self.text[self.position..]
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Consume a (possibly namespace-qualified) identifier
    pub fn identifier(&mut self) -> Result<String, LexerError> {
        let start = self.position;
        loop {
            self.simple_identifier()?;
            let rest = self.remaining();
            let continues = rest.starts_with('.')
                && rest[1..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphabetic() || c == '_');
            if !continues {
                break;
            }
            self.position += 1;
        }
        Ok(self.text[start..self.position].to_string())
    }

    /// Consume optional inline parameters; the segment must end afterwards.
    ///
    /// `()` and an absent parameter list both yield an empty map.
    pub fn operation_parameters(&mut self) -> Result<IndexMap<String, String>, LexerError> {
        let mut parameters = IndexMap::new();
        if self.is_finished() {
            return Ok(parameters);
        }

        self.expect('(')?;
        self.skip_whitespace();
        if self.eat(')') {
            return self.finish(parameters);
        }

        loop {
            self.skip_whitespace();
            let name = self.simple_identifier()?;
            self.skip_whitespace();
            self.expect('=')?;
            let value = self.value()?;
            if value.is_empty() {
                return Err(self.error("Expected a parameter value"));
            }
            if parameters.insert(name.clone(), value).is_some() {
                return Err(self.error(format!("Duplicate parameter '{name}'")));
            }
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return self.finish(parameters);
        }
    }

    /// Consume an optional key predicate; the segment must end afterwards.
    pub fn key_predicate(&mut self) -> Result<Option<KeyPredicate>, LexerError> {
        if self.is_finished() {
            return Ok(None);
        }

        self.expect('(')?;
        let checkpoint = self.position;
        self.skip_whitespace();

        let named = self.simple_identifier().is_ok() && {
            self.skip_whitespace();
            self.eat('=')
        };

        if !named {
            self.position = checkpoint;
            let value = self.value()?;
            if value.is_empty() {
                return Err(self.error("Expected a key value"));
            }
            self.expect(')')?;
            return self.finish(Some(KeyPredicate::Single(value)));
        }

        self.position = checkpoint;
        let mut keys = IndexMap::new();
        loop {
            self.skip_whitespace();
            let name = self.simple_identifier()?;
            self.skip_whitespace();
            self.expect('=')?;
            let value = self.value()?;
            keys.insert(name, value);
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return self.finish(Some(KeyPredicate::Named(keys)));
        }
    }

    fn simple_identifier(&mut self) -> Result<String, LexerError> {
        let rest = self.remaining();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error("Expected an identifier")),
        }
        let end = chars
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(index, _)| index);
        self.position += end;
        Ok(rest[..end].to_string())
    }

    /// Raw value up to the next top-level `,` or `)`, honouring quotes
    fn value(&mut self) -> Result<String, LexerError> {
        let rest = self.remaining();
        let mut in_quotes = false;
        let mut depth = 0usize;
        let mut end = None;

        for (index, c) in rest.char_indices() {
            match c {
                '\'' => in_quotes = !in_quotes,
                _ if in_quotes => {}
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth > 0 => depth -= 1,
                ',' | ')' => {
                    end = Some(index);
                    break;
                }
                _ => {}
            }
        }

        if in_quotes {
            return Err(self.error("Unterminated string literal"));
        }
        let end = end.ok_or_else(|| self.error("Expected ',' or ')'"))?;
        self.position += end;
        Ok(rest[..end].trim().to_string())
    }

    fn finish<T>(&self, value: T) -> Result<T, LexerError> {
        if self.is_finished() {
            Ok(value)
        } else {
            Err(self.error(format!("Unexpected trailing text '{}'", self.remaining())))
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.remaining().starts_with(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LexerError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{expected}'")))
        }
    }

    fn error(&self, message: impl Into<String>) -> LexerError {
        LexerError {
            position: self.position,
            message: message.into(),
        }
    }
}
