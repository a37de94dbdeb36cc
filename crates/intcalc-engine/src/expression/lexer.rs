//! Tokenisation of expression source text.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LeftParen,
    RightParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) position: usize,
}

impl Token {
    /// Source-like rendering used in diagnostics.
    pub(crate) fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number(value) => value.to_string(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Plus => "+".to_owned(),
            TokenKind::Minus => "-".to_owned(),
            TokenKind::Star => "*".to_owned(),
            TokenKind::Slash => "/".to_owned(),
            TokenKind::Percent => "%".to_owned(),
            TokenKind::Caret => "^".to_owned(),
            TokenKind::LeftParen => "(".to_owned(),
            TokenKind::RightParen => ")".to_owned(),
            TokenKind::Comma => ",".to_owned(),
        }
    }
}

/// Splits `source` into tokens, skipping whitespace.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut chars = source.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(position, character)) = chars.peek() {
        if character.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = if character.is_ascii_digit() || character == '.' {
            read_number(&mut chars, position)?
        } else if character.is_ascii_alphabetic() || character == '_' {
            read_identifier(&mut chars)
        } else {
            chars.next();
            match character {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '^' => TokenKind::Caret,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                ',' => TokenKind::Comma,
                other => {
                    return Err(ExpressionError::UnexpectedCharacter {
                        character: other,
                        position,
                    });
                }
            }
        };
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

fn read_number(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
) -> Result<TokenKind, ExpressionError> {
    let mut text = String::new();
    take_digits(chars, &mut text);
    if matches!(chars.peek(), Some(&(_, '.'))) {
        text.push('.');
        chars.next();
        take_digits(chars, &mut text);
    }

    // The exponent is only consumed when digits follow, so `2e` stays a
    // number followed by the constant `e` and is rejected by the parser.
    if matches!(chars.peek(), Some(&(_, 'e' | 'E'))) {
        let mut lookahead = chars.clone();
        lookahead.next();
        let sign = match lookahead.peek() {
            Some(&(_, sign @ ('+' | '-'))) => {
                lookahead.next();
                Some(sign)
            }
            _ => None,
        };
        if matches!(lookahead.peek(), Some(&(_, digit)) if digit.is_ascii_digit()) {
            text.push('e');
            if let Some(sign) = sign {
                text.push(sign);
            }
            *chars = lookahead;
            take_digits(chars, &mut text);
        }
    }

    text.parse::<f64>()
        .map(TokenKind::Number)
        .map_err(|_| ExpressionError::InvalidNumber { text, position })
}

fn take_digits(chars: &mut Peekable<CharIndices<'_>>, text: &mut String) {
    while let Some(&(_, digit)) = chars.peek() {
        if !digit.is_ascii_digit() {
            break;
        }
        text.push(digit);
        chars.next();
    }
}

fn read_identifier(chars: &mut Peekable<CharIndices<'_>>) -> TokenKind {
    let mut name = String::new();
    while let Some(&(_, character)) = chars.peek() {
        if !(character.is_ascii_alphanumeric() || character == '_') {
            break;
        }
        name.push(character);
        chars.next();
    }
    TokenKind::Identifier(name)
}
