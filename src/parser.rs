//! Single-pass parser from RQL tokens to a [`CriteriaTree`].
//!
//! Grammar (clauses separated by `;` or `&`):
//!
//! ```text
//! clause    := predicate | directive
//! predicate := FIELD OPERATOR [value ("," value)*]
//! directive := "select(" FIELD ("," FIELD)* ")"
//!            | "sort(" ["+"|"-"]FIELD ("," ["+"|"-"]FIELD)* ")"
//!            | "limit(" COUNT ["," OFFSET] ")"
//! ```
//!
//! The next token always decides the production, so no backtracking is needed.

use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::datatype::Value;
use crate::error::{Result, RqlError};
use crate::lexer::{Spanned, Token, tokenize};
use crate::operator::Arity;
use crate::predicate::{CriteriaTree, Page, Predicate, SortKey, Target};
use crate::settings::RqlSettings;

lazy_static! {
    static ref DEFAULT_SETTINGS: RqlSettings = RqlSettings::default();
}

/// Parses RQL text with default settings.
pub fn parse_criteria(text: &str) -> Result<CriteriaTree> {
    Parser::new(&DEFAULT_SETTINGS).parse(text)
}

pub struct Parser<'s> {
    settings: &'s RqlSettings,
}

impl<'s> Parser<'s> {
    pub fn new(settings: &'s RqlSettings) -> Self {
        Self { settings }
    }

    pub fn parse(&self, text: &str) -> Result<CriteriaTree> {
        if text.len() > self.settings.max_length {
            return Err(RqlError::parse(format!(
                "Query is {} bytes long, the limit is {}",
                text.len(),
                self.settings.max_length
            )));
        }
        if text.trim().is_empty() {
            return Ok(CriteriaTree::new());
        }
        let result = tokenize(text).and_then(|tokens| {
            Clauses {
                input: text,
                tokens: &tokens,
                pos: 0,
                settings: self.settings,
                tree: Parsed::default(),
            }
            .parse()
        });
        match &result {
            Ok(tree) => debug!(
                predicates = tree.criteria().len(),
                projection = tree.projection().len(),
                "parsed criteria"
            ),
            Err(e) => warn!(error = %e, "rejected criteria"),
        }
        result
    }
}

#[derive(Default)]
struct Parsed {
    projection: Option<Vec<Target>>,
    criteria: Vec<Predicate>,
    sort: Option<Vec<SortKey>>,
    page: Option<Page>,
}

// `-field` sorts descending, `field` and `+field` ascending
fn sort_key(word: &str) -> Result<SortKey> {
    match word.strip_prefix('-') {
        Some(field) => Ok(SortKey::descending(Target::parse(field)?)),
        None => Ok(SortKey::ascending(Target::parse(
            word.strip_prefix('+').unwrap_or(word),
        )?)),
    }
}

struct Clauses<'t> {
    input: &'t str,
    tokens: &'t [Spanned],
    pos: usize,
    settings: &'t RqlSettings,
    tree: Parsed,
}

impl<'t> Clauses<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'t Spanned> {
        let spanned = self.tokens.get(self.pos);
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.start)
            .unwrap_or(self.input.len())
    }

    // the raw text of the clause starting at token `first`
    fn clause_text(&self, first: usize) -> &'t str {
        let start = self.tokens.get(first).map(|s| s.start).unwrap_or(self.input.len());
        let end = self.tokens[first..]
            .iter()
            .find(|s| s.token == Token::Separator)
            .map(|s| s.start)
            .unwrap_or(self.input.len());
        self.input[start..end].trim()
    }

    fn parse(mut self) -> Result<CriteriaTree> {
        let mut index = 0;
        while let Some(token) = self.peek() {
            if *token == Token::Separator {
                // empty clauses are tolerated
                self.advance();
                continue;
            }
            if index >= self.settings.max_clauses {
                return Err(RqlError::parse(format!(
                    "More than {} clauses",
                    self.settings.max_clauses
                ))
                .at(self.offset()));
            }
            let first = self.pos;
            self.clause()
                .map_err(|e| e.in_clause(index, self.clause_text(first)))?;
            index += 1;
        }
        let Parsed { projection, criteria, sort, page } = self.tree;
        let mut tree = CriteriaTree::new()
            .with_projection(projection.unwrap_or_default())
            .with_sort(sort.unwrap_or_default())
            .with_page(page);
        for predicate in criteria {
            tree = tree.with_predicate(predicate);
        }
        Ok(tree)
    }

    fn clause(&mut self) -> Result<()> {
        match self.advance() {
            Some(Spanned { token: Token::Field(field), start, .. }) => {
                let target = Target::parse(field).map_err(|e| e.at(*start))?;
                self.predicate(target)?;
            }
            Some(Spanned { token: Token::Directive(name), start, .. }) => {
                self.directive(name, *start)?;
            }
            Some(Spanned { token: Token::Quoted(_), start, .. }) => {
                return Err(RqlError::parse("Field names cannot be quoted").at(*start));
            }
            Some(Spanned { token, start, .. }) => {
                return Err(RqlError::parse(format!(
                    "Expected a field name or a directive, found {}",
                    token.describe()
                ))
                .at(*start));
            }
            None => return Err(RqlError::parse("Unexpected end of query")),
        }
        // a clause ends at a separator or at the end of the input
        match self.peek() {
            None | Some(Token::Separator) => Ok(()),
            Some(token) => Err(RqlError::parse(format!(
                "Expected ';' or '&' after clause, found {}",
                token.describe()
            ))
            .at(self.offset())),
        }
    }

    fn predicate(&mut self, target: Target) -> Result<()> {
        let operator = match self.advance() {
            Some(Spanned { token: Token::Operator(op), .. }) => *op,
            _ => return Err(RqlError::parse(format!("Expected an operator after '{target}'"))),
        };
        let mut values = Vec::new();
        if operator.arity() == Arity::Unary {
            if let Some(Token::Quoted(_) | Token::Bare(_)) = self.peek() {
                return Err(RqlError::parse(format!(
                    "Operator '{operator}' takes no value"
                ))
                .at(self.offset()));
            }
        } else {
            values.push(self.value()?);
            while let Some(Token::Comma) = self.peek() {
                self.advance();
                values.push(self.value()?);
                if values.len() > self.settings.max_values {
                    return Err(RqlError::parse(format!(
                        "More than {} values for '{target}'",
                        self.settings.max_values
                    ))
                    .at(self.offset()));
                }
            }
        }
        let offset = self.offset();
        let predicate =
            Predicate::from_literals(target, operator, values).map_err(|e| e.at(offset))?;
        self.tree.criteria.push(predicate);
        Ok(())
    }

    // a literal, with its text when it was written bare
    fn value(&mut self) -> Result<(Value, Option<String>)> {
        match self.advance() {
            Some(Spanned { token: Token::Quoted(s), .. }) => Ok((Value::String(s.clone()), None)),
            Some(Spanned { token: Token::Bare(s), .. }) => Ok((Value::infer(s), Some(s.clone()))),
            Some(Spanned { token, start, .. }) => Err(RqlError::parse(format!(
                "Expected a value, found {}",
                token.describe()
            ))
            .at(*start)),
            None => Err(RqlError::parse("Expected a value, found end of query").at(self.input.len())),
        }
    }

    // the words between a directive's parentheses
    fn arguments(&mut self, name: &str) -> Result<Vec<(&'t str, usize)>> {
        let mut arguments = Vec::new();
        loop {
            match self.advance() {
                Some(Spanned { token: Token::Bare(word) | Token::Field(word), start, .. }) => {
                    arguments.push((word.as_str(), *start));
                }
                Some(Spanned { token: Token::CloseParen, start, .. }) if arguments.is_empty() => {
                    return Err(RqlError::parse(format!("Empty {name}(...) clause")).at(*start));
                }
                Some(Spanned { token, start, .. }) => {
                    return Err(RqlError::parse(format!(
                        "Expected an argument to {name}(...), found {}",
                        token.describe()
                    ))
                    .at(*start));
                }
                None => {
                    return Err(RqlError::parse(format!("Unclosed {name}(...) clause"))
                        .at(self.input.len()));
                }
            }
            match self.advance() {
                Some(Spanned { token: Token::Comma, .. }) => continue,
                Some(Spanned { token: Token::CloseParen, .. }) => return Ok(arguments),
                Some(Spanned { token, start, .. }) => {
                    return Err(RqlError::parse(format!(
                        "Expected ',' or ')' in {name}(...), found {}",
                        token.describe()
                    ))
                    .at(*start));
                }
                None => {
                    return Err(RqlError::parse(format!("Unclosed {name}(...) clause"))
                        .at(self.input.len()));
                }
            }
        }
    }

    fn directive(&mut self, name: &str, start: usize) -> Result<()> {
        match name {
            "select" => {
                if self.tree.projection.is_some() {
                    return Err(RqlError::parse("Duplicate select(...) clause").at(start));
                }
                let fields = self
                    .arguments(name)?
                    .into_iter()
                    .map(|(word, at)| Target::parse(word).map_err(|e| e.at(at)))
                    .collect::<Result<Vec<_>>>()?;
                self.tree.projection = Some(fields);
            }
            "sort" => {
                if self.tree.sort.is_some() {
                    return Err(RqlError::parse("Duplicate sort(...) clause").at(start));
                }
                let keys = self
                    .arguments(name)?
                    .into_iter()
                    .map(|(word, at)| sort_key(word).map_err(|e| e.at(at)))
                    .collect::<Result<Vec<_>>>()?;
                self.tree.sort = Some(keys);
            }
            "limit" => {
                if self.tree.page.is_some() {
                    return Err(RqlError::parse("Duplicate limit(...) clause").at(start));
                }
                let arguments = self.arguments(name)?;
                let numbers = arguments
                    .iter()
                    .map(|(word, at)| {
                        word.parse::<usize>().map_err(|_| {
                            RqlError::parse(format!("'{word}' is not a valid count in limit(...)"))
                                .at(*at)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let page = match numbers.as_slice() {
                    [limit] => Page { limit: *limit, offset: 0 },
                    [limit, offset] => Page { limit: *limit, offset: *offset },
                    _ => {
                        return Err(RqlError::parse(
                            "limit(...) takes a count and an optional offset",
                        )
                        .at(start));
                    }
                };
                self.tree.page = Some(page);
            }
            other => {
                return Err(RqlError::parse(format!("Unknown directive '{other}(...)'")).at(start));
            }
        }
        Ok(())
    }
}
