use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare run of non-delimiter characters
    Word(String),
    /// Quoted literal (content without quotes, escapes resolved)
    Str(String),
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"'
}

/// Split one command line into tokens.
///
/// Delimiters are whitespace, `(`, `)` and `"`. A quoted literal may
/// contain any character including newlines; `\"` and `\\` are the only
/// escapes, every other backslash sequence is kept as written.
pub fn lex(src: &str, line: u32) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        let column = pos as u32 + 1;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Spanned {
                    token: Token::LParen,
                    line,
                    column,
                });
                pos += 1;
            }
            ')' => {
                tokens.push(Spanned {
                    token: Token::RParen,
                    line,
                    column,
                });
                pos += 1;
            }
            '"' => {
                pos += 1;
                let mut s = String::new();
                loop {
                    if pos >= chars.len() {
                        return Err(ParseError::new(
                            line,
                            column,
                            "unterminated quoted literal",
                        ));
                    }
                    let sc = chars[pos];
                    if sc == '"' {
                        pos += 1;
                        break;
                    }
                    if sc == '\\' && pos + 1 < chars.len() {
                        match chars[pos + 1] {
                            '"' => s.push('"'),
                            '\\' => s.push('\\'),
                            other => {
                                s.push('\\');
                                s.push(other);
                            }
                        }
                        pos += 2;
                        continue;
                    }
                    s.push(sc);
                    pos += 1;
                }
                tokens.push(Spanned {
                    token: Token::Str(s),
                    line,
                    column,
                });
            }
            _ => {
                let start = pos;
                while pos < chars.len() && !is_delimiter(chars[pos]) {
                    pos += 1;
                }
                tokens.push(Spanned {
                    token: Token::Word(chars[start..pos].iter().collect()),
                    line,
                    column,
                });
            }
        }
    }

    Ok(tokens)
}
