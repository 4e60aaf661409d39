//! SPF macro-string syntax (RFC 7208 Section 7.1).
//!
//! Records are generated, never evaluated, so macros are only checked and
//! re-rendered here. Nothing is expanded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How macros are written back into a normalized `exists` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroStyle {
    /// `%{i}` is written as `%i`. Macros with transformers keep their braces.
    #[default]
    Compact,
    /// Every macro is written as `%{...}`.
    Braced,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    #[error("trailing % in macro string")]
    TrailingPercent,
    #[error("unclosed macro expression")]
    Unclosed,
    #[error("unexpected '}}' outside a macro expression")]
    StrayBrace,
    #[error("empty macro expression")]
    EmptyBody,
    #[error("unknown macro letter: {0}")]
    UnknownLetter(char),
    #[error("macro %{{{0}}} only allowed in exp= context")]
    ExplanationOnly(char),
    #[error("invalid macro transformer: {0}")]
    InvalidTransformer(String),
}

/// One lexical piece of a macro string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'a> {
    Literal(&'a str),
    /// `%%`, `%_` or `%-`; holds the character after `%`.
    Escape(char),
    Macro { letter: char, transformers: &'a str },
}

impl Piece<'_> {
    fn render(&self, style: MacroStyle, out: &mut String) {
        match self {
            Piece::Literal(s) => out.push_str(s),
            Piece::Escape(c) => {
                out.push('%');
                out.push(*c);
            }
            Piece::Macro { letter, transformers } => {
                if style == MacroStyle::Compact && transformers.is_empty() {
                    out.push('%');
                    out.push(*letter);
                } else {
                    out.push_str("%{");
                    out.push(*letter);
                    out.push_str(transformers);
                    out.push('}');
                }
            }
        }
    }
}

const DELIMITERS: &[u8] = b".-+,/_=";

/// Check a macro letter for use in a domain-spec (not exp=).
fn check_letter(letter: char) -> Result<(), MacroError> {
    match letter.to_ascii_lowercase() {
        's' | 'l' | 'o' | 'd' | 'i' | 'p' | 'h' | 'v' => Ok(()),
        'c' | 'r' | 't' => Err(MacroError::ExplanationOnly(letter)),
        _ => Err(MacroError::UnknownLetter(letter)),
    }
}

/// Check transformers: [digits][r][delimiters]. Digits must be nonzero.
fn check_transformers(rest: &str) -> Result<(), MacroError> {
    let bytes = rest.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        let n: usize = rest[..digits]
            .parse()
            .map_err(|_| MacroError::InvalidTransformer(rest.to_string()))?;
        if n == 0 {
            return Err(MacroError::InvalidTransformer(rest.to_string()));
        }
    }

    let mut i = digits;
    if matches!(bytes.get(i), Some(b'r') | Some(b'R')) {
        i += 1;
    }

    if bytes[i..].iter().all(|b| DELIMITERS.contains(b)) {
        Ok(())
    } else {
        Err(MacroError::InvalidTransformer(rest.to_string()))
    }
}

/// Split a macro string into pieces, rejecting malformed macro syntax.
pub fn parse(input: &str) -> Result<Vec<Piece<'_>>, MacroError> {
    let mut pieces = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut literal_start = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'}' => return Err(MacroError::StrayBrace),
            b'%' => {
                if literal_start < i {
                    pieces.push(Piece::Literal(&input[literal_start..i]));
                }
                let next = match input[i + 1..].chars().next() {
                    Some(c) => c,
                    None => return Err(MacroError::TrailingPercent),
                };
                match next {
                    '%' | '_' | '-' => {
                        pieces.push(Piece::Escape(next));
                        i += 2;
                    }
                    '{' => {
                        let start = i + 2;
                        let end = match bytes[start..].iter().position(|&b| b == b'}') {
                            Some(pos) => start + pos,
                            None => return Err(MacroError::Unclosed),
                        };
                        let body = &input[start..end];
                        let mut chars = body.chars();
                        let letter = chars.next().ok_or(MacroError::EmptyBody)?;
                        check_letter(letter)?;
                        let transformers = chars.as_str();
                        check_transformers(transformers)?;
                        pieces.push(Piece::Macro { letter, transformers });
                        i = end + 1;
                    }
                    c => {
                        check_letter(c)?;
                        pieces.push(Piece::Macro { letter: c, transformers: "" });
                        i += 1 + c.len_utf8();
                    }
                }
                literal_start = i;
            }
            _ => i += 1,
        }
    }

    if literal_start < len {
        pieces.push(Piece::Literal(&input[literal_start..]));
    }
    Ok(pieces)
}

/// Render pieces back to text in the given style.
pub fn render(pieces: &[Piece<'_>], style: MacroStyle) -> String {
    let mut out = String::new();
    for piece in pieces {
        piece.render(style, &mut out);
    }
    out
}

/// Replace every macro and escape with a one-letter label placeholder so the
/// surrounding literal text can be checked with the ordinary domain rules.
pub fn placeholder(pieces: &[Piece<'_>]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Literal(s) => *s,
            Piece::Escape(_) | Piece::Macro { .. } => "x",
        })
        .collect()
}

/// True if any piece is a macro or escape.
pub fn has_macros(pieces: &[Piece<'_>]) -> bool {
    pieces.iter().any(|p| !matches!(p, Piece::Literal(_)))
}
