//! Placeholder scanner for template expressions.
//!
//! Token grammar:
//! - `{0}`, `{1}`, ... positional argument
//! - `{name}` named argument (ASCII identifier)
//! - `{@}` the expression's own column
//! - `{{` and `}}` literal braces; a lone `}` is kept as text

use thiserror::Error as ThisError;

///
/// Segment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment<'a> {
    Text(String),
    Positional(usize),
    Named(&'a str),
    Column,
}

///
/// TemplateError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub(crate) enum TemplateError {
    #[error("unclosed '{{' at byte {position}")]
    Unclosed { position: usize },

    #[error("invalid placeholder '{{{token}}}' at byte {position}")]
    InvalidToken { token: String, position: usize },
}

/// Split a template into literal text and placeholder tokens.
pub(crate) fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = template.char_indices().peekable();

    while let Some((pos, c)) = rest.next() {
        match c {
            '{' if matches!(rest.peek(), Some((_, '{'))) => {
                rest.next();
                text.push('{');
            }
            '}' if matches!(rest.peek(), Some((_, '}'))) => {
                rest.next();
                text.push('}');
            }
            '{' => {
                let start = pos + 1;
                let end = template[start..]
                    .find('}')
                    .map(|off| start + off)
                    .ok_or(TemplateError::Unclosed { position: pos })?;
                let token = classify(&template[start..end], pos)?;

                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(token);

                while rest.peek().is_some_and(|(i, _)| *i <= end) {
                    rest.next();
                }
            }
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}

fn classify(token: &str, position: usize) -> Result<Segment<'_>, TemplateError> {
    let invalid = || TemplateError::InvalidToken {
        token: token.to_string(),
        position,
    };

    if token == "@" {
        return Ok(Segment::Column);
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().map(Segment::Positional).map_err(|_| invalid());
    }

    let mut chars = token.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if is_ident {
        Ok(Segment::Named(token))
    } else {
        Err(invalid())
    }
}

///
/// TESTS
///
