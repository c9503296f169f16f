//! The Event tree: the only structure the parser produces.
//!
//! An Event is either an atomic token or an ordered list of Events. Events
//! are immutable once parsed; coercions and the dispatcher only read them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    Atom(String),
    List(Vec<Event>),
}

impl Event {
    pub fn atom(s: impl Into<String>) -> Self {
        Event::Atom(s.into())
    }

    /// Build a list of atoms, mostly for tests and programmatic events.
    pub fn words(words: &[&str]) -> Self {
        Event::List(words.iter().map(|w| Event::atom(*w)).collect())
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Event::Atom(s) => Some(s),
            Event::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Event]> {
        match self {
            Event::List(items) => Some(items),
            Event::Atom(_) => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Event::Atom(_))
    }

    /// The event viewed as positional tokens: a list yields its items, an
    /// atom yields itself as a one-token list.
    pub fn tokens(&self) -> &[Event] {
        match self {
            Event::List(items) => items,
            Event::Atom(_) => std::slice::from_ref(self),
        }
    }

    /// First token when it is an atom.
    pub fn head(&self) -> Option<&str> {
        self.tokens().first().and_then(Event::as_atom)
    }

    /// Strip redundant wrapping: `((Exactly 1))` becomes `(Exactly 1)`.
    pub fn unwrapped(&self) -> &Event {
        let mut current = self;
        while let Event::List(items) = current {
            match items.as_slice() {
                [inner @ Event::List(_)] => current = inner,
                _ => break,
            }
        }
        current
    }

    /// Render a top-level event the way it would be written on a scenario
    /// line, without the outer parentheses.
    pub fn render_line(&self) -> String {
        match self {
            Event::List(items) => items
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            Event::Atom(_) => self.to_string(),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'))
}

fn write_atom(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if !needs_quotes(s) {
        return f.write_str(s);
    }
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

/// Canonical printer. Re-parsing the output yields an equal tree.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Atom(s) => write_atom(f, s),
            Event::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Event {
    fn from(s: &str) -> Self {
        Event::Atom(s.to_string())
    }
}
