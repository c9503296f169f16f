//! scenario-core: the surface language of scenario scripts.
//!
//! Turns command text into [`Event`] trees. This crate is the only place
//! that reasons about surface text; everything downstream works on Events.
//!
//! - [`parse_event()`] -- one command line to an Event
//! - [`parse_script()`] -- a whole script to numbered [`ScriptLine`]s
//! - [`Event`] -- atom or ordered list, with a canonical printer
//! - [`ParseError`] -- unbalanced parentheses or quotes, with position

pub mod error;
pub mod event;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use event::Event;
pub use parser::{is_comment_or_blank, parse_event, parse_script, ScriptLine};
