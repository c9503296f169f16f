/// Structural parser: token stream to Event tree.
/// No semantic interpretation happens here; verbs, numbers and aliases are
/// all plain atoms until a coercion looks at them.
use crate::error::ParseError;
use crate::event::Event;
use crate::lexer::{lex, Spanned, Token};

// ──────────────────────────────────────────────
// Single line
// ──────────────────────────────────────────────

/// Parse one command line into a top-level `Event::List`.
///
/// A line holding a single atom still yields a one-element list so the
/// dispatcher always sees positional tokens.
pub fn parse_event(src: &str) -> Result<Event, ParseError> {
    parse_event_at(src, 1)
}

pub(crate) fn parse_event_at(src: &str, line: u32) -> Result<Event, ParseError> {
    let tokens = lex(src, line)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let items = parser.parse_items(None)?;
    Ok(Event::List(items))
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parse items until the matching `)` for `open` (or end of input when
    /// `open` is `None`).
    fn parse_items(&mut self, open: Option<&Spanned>) -> Result<Vec<Event>, ParseError> {
        let tokens = self.tokens;
        let mut items = Vec::new();
        while let Some(s) = tokens.get(self.pos) {
            self.pos += 1;
            match &s.token {
                Token::Word(w) => items.push(Event::Atom(w.clone())),
                Token::Str(v) => items.push(Event::Atom(v.clone())),
                Token::LParen => {
                    let nested = self.parse_items(Some(s))?;
                    items.push(Event::List(nested));
                }
                Token::RParen => {
                    if open.is_some() {
                        return Ok(items);
                    }
                    return Err(ParseError::new(s.line, s.column, "unbalanced ')'"));
                }
            }
        }
        match open {
            Some(o) => Err(ParseError::new(o.line, o.column, "unclosed '('")),
            None => Ok(items),
        }
    }
}

// ──────────────────────────────────────────────
// Whole scripts
// ──────────────────────────────────────────────

/// One executable line of a scenario script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the script text.
    pub line: u32,
    /// The line as written, trimmed.
    pub source: String,
    pub event: Event,
}

/// Whether a script line carries nothing to execute.
pub fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

/// Split a scenario script into executable lines. Blank lines and lines
/// starting with `--` are skipped. The first malformed line aborts the
/// whole parse.
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ParseError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if is_comment_or_blank(raw) {
            continue;
        }
        let line = idx as u32 + 1;
        let event = parse_event_at(raw, line)?;
        lines.push(ScriptLine {
            line,
            source: raw.trim().to_string(),
            event,
        });
    }
    Ok(lines)
}
