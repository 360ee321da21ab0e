//! Tokenizer for RQL text.
//!
//! The heavy lifting is done by the pest grammar in `rql.pest`, which splits
//! the input into flat tokens. This module turns those pairs into [`Token`]s,
//! resolves operator mnemonics against the shared operator table and decides
//! which bare words are field paths (a word directly followed by an operator).

use pest::Parser as PestParser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::trace;

use crate::error::{Result, RqlError};
use crate::operator::Operator;

#[derive(Parser)]
#[grammar = "rql.pest"]
struct RqlGrammar;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A field path such as `address.city`.
    Field(String),
    Operator(Operator),
    /// A pseudo-operator such as `select(`, name only.
    Directive(String),
    /// A literal that was written within quotes, unescaped.
    Quoted(String),
    /// A literal written without quotes, verbatim.
    Bare(String),
    Comma,
    CloseParen,
    /// `;` or `&`
    Separator,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Field(f) => format!("field '{f}'"),
            Token::Operator(op) => format!("operator '{op}'"),
            Token::Directive(d) => format!("'{d}('"),
            Token::Quoted(s) => format!("quoted literal \"{s}\""),
            Token::Bare(s) => format!("literal '{s}'"),
            Token::Comma => "','".to_owned(),
            Token::CloseParen => "')'".to_owned(),
            Token::Separator => "separator".to_owned(),
        }
    }
}

/// A token together with the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

fn lexical_error(message: String, pair: &Pair<Rule>) -> RqlError {
    let span = pair.as_span();
    let (line, col) = span.start_pos().line_col();
    RqlError::Parse {
        message,
        clause: None,
        text: Some(span.as_str().to_owned()),
        position: Some(span.start()),
        line: Some(line),
        col: Some(col),
    }
}

fn unescape(raw: &str) -> String {
    let mut unescaped = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                unescaped.push(escaped);
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}

/// Splits RQL text into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Spanned>> {
    let mut pairs = RqlGrammar::parse(Rule::tokens, text).map_err(|e| {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos(p) => p,
            pest::error::LineColLocation::Span(p, _) => p,
        };
        let position = match e.location {
            pest::error::InputLocation::Pos(p) => p,
            pest::error::InputLocation::Span((p, _)) => p,
        };
        RqlError::Parse {
            message: e.variant.message().into_owned(),
            clause: None,
            text: None,
            position: Some(position),
            line: Some(line),
            col: Some(col),
        }
    })?;
    let mut tokens: Vec<Spanned> = Vec::new();
    let Some(root) = pairs.next() else {
        return Ok(tokens);
    };
    for pair in root.into_inner() {
        let span = pair.as_span();
        let token = match pair.as_rule() {
            Rule::directive => {
                let name = pair.as_str().trim_end_matches('(').to_ascii_lowercase();
                Token::Directive(name)
            }
            Rule::operator => {
                let mnemonic = pair.as_str().trim_matches('=');
                let operator = Operator::from_mnemonic(mnemonic).ok_or_else(|| {
                    lexical_error(format!("Unknown operator '={mnemonic}='"), &pair)
                })?;
                // the operator needs a field name right before it
                match tokens.last_mut().map(|last| &mut last.token) {
                    Some(Token::Bare(word)) => {
                        let field = std::mem::take(word);
                        if let Some(last) = tokens.last_mut() {
                            last.token = Token::Field(field);
                        }
                    }
                    Some(Token::Quoted(_)) => (),
                    _ => {
                        return Err(lexical_error(
                            format!("Empty field name before '={mnemonic}='"),
                            &pair,
                        ));
                    }
                }
                Token::Operator(operator)
            }
            Rule::separator => Token::Separator,
            Rule::comma => Token::Comma,
            Rule::close => Token::CloseParen,
            Rule::quoted => {
                let inner = pair.clone().into_inner().next().map(|p| p.as_str()).unwrap_or("");
                Token::Quoted(unescape(inner))
            }
            Rule::word => Token::Bare(pair.as_str().to_owned()),
            Rule::unterminated => {
                return Err(lexical_error("Unterminated quoted literal".to_owned(), &pair));
            }
            Rule::stray => {
                return Err(lexical_error(
                    format!("Unexpected character '{}'", pair.as_str()),
                    &pair,
                ));
            }
            _ => continue,
        };
        trace!(?token, start = span.start(), "token");
        tokens.push(Spanned {
            token,
            start: span.start(),
            end: span.end(),
        });
    }
    Ok(tokens)
}
