//! Line-oriented reader shared by both text schemas.
//!
//! Every schema line is either a **header line** (`Token: v1 v2 …`, the
//! first whitespace-separated token must equal the header exactly) or a
//! **row** of whitespace-separated numbers.  Blank lines are skipped but
//! still counted, so reported line numbers match the file.

use std::str::FromStr;

use crate::error::ParseError;

pub(crate) struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    /// Number of the last line handed out (0 before the first).
    line:  usize,
}

/// Tokens of one line after its header (or all tokens for a row).
pub(crate) struct Tokens<'a> {
    pub line:   usize,
    pub tokens: Vec<&'a str>,
}

impl<'a> LineReader<'a> {
    pub fn new(text: &'a str) -> Self {
        LineReader { lines: text.lines().enumerate(), line: 0 }
    }

    /// Next non-blank line, or `Truncated` naming what was expected.
    fn next_line(&mut self, expected: &str) -> Result<(usize, &'a str), ParseError> {
        for (i, raw) in self.lines.by_ref() {
            self.line = i + 1;
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Ok((self.line, trimmed));
            }
        }
        Err(ParseError::Truncated { line: self.line, expected: expected.to_string() })
    }

    /// Read a header line and return the tokens that follow the header.
    pub fn header(&mut self, header: &'static str) -> Result<Tokens<'a>, ParseError> {
        let (line, text) = self.next_line(&format!("`{}`", header))?;
        let mut parts = text.split_whitespace();
        match parts.next() {
            Some(first) if first == header => Ok(Tokens { line, tokens: parts.collect() }),
            _ => Err(ParseError::HeaderMismatch {
                line,
                expected: header,
                found:    text.to_string(),
            }),
        }
    }

    /// Read a header line that must carry no values.
    pub fn bare_header(&mut self, header: &'static str) -> Result<(), ParseError> {
        self.header(header)?.expect_count(header, 0)
    }

    /// Read a numeric row.  `field` names the row in error messages.
    pub fn row(&mut self, field: &str) -> Result<Tokens<'a>, ParseError> {
        let (line, text) = self.next_line(field)?;
        Ok(Tokens { line, tokens: text.split_whitespace().collect() })
    }

    /// Line number of the first non-blank line left unread, if any.
    pub fn trailing_content(&mut self) -> Option<usize> {
        self.next_line("").ok().map(|(line, _)| line)
    }
}

impl<'a> Tokens<'a> {
    pub fn expect_count(&self, field: &str, expected: usize) -> Result<(), ParseError> {
        if self.tokens.len() != expected {
            return Err(ParseError::FieldCount {
                line:  self.line,
                field: field.to_string(),
                expected,
                found: self.tokens.len(),
            });
        }
        Ok(())
    }

    /// Parse exactly `expected` values.
    pub fn values<T: FromStr>(&self, field: &str, expected: usize) -> Result<Vec<T>, ParseError> {
        self.expect_count(field, expected)?;
        self.all_values(field)
    }

    /// Parse every token, however many there are.
    pub fn all_values<T: FromStr>(&self, field: &str) -> Result<Vec<T>, ParseError> {
        self.tokens
            .iter()
            .map(|tok| {
                tok.parse::<T>().map_err(|_| ParseError::MalformedToken {
                    line:  self.line,
                    field: field.to_string(),
                    token: tok.to_string(),
                })
            })
            .collect()
    }

    /// Parse exactly one value.
    pub fn single<T: FromStr>(&self, field: &str) -> Result<T, ParseError> {
        let mut v = self.values(field, 1)?;
        Ok(v.remove(0))
    }
}
