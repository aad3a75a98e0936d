//! Statement parser using Pest

use crate::query::ast::Statement;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "query/statement.pest"]
struct StatementParser;

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] Box<pest::error::Error<Rule>>),

    /// Well-formed input the parser still cannot use
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a statement string
pub fn parse_statement(input: &str) -> ParseResult<Statement> {
    let mut pairs = StatementParser::parse(Rule::statement, input).map_err(Box::new)?;
    let statement = pairs
        .next()
        .ok_or_else(|| ParseError::SemanticError("empty statement".to_string()))?;

    let mut primary_type = None;
    let mut predicate = None;

    for inner in statement.into_inner() {
        match inner.as_rule() {
            Rule::type_ref => primary_type = Some(first_inner_str(inner)?),
            Rule::predicate => predicate = Some(parse_predicate(inner)?),
            _ => {}
        }
    }

    let primary_type =
        primary_type.ok_or_else(|| ParseError::SemanticError("missing type".to_string()))?;
    let (property, value) =
        predicate.ok_or_else(|| ParseError::SemanticError("missing predicate".to_string()))?;

    Ok(Statement {
        primary_type: primary_type.trim().to_string(),
        property,
        value,
    })
}

fn parse_predicate(pair: Pair<Rule>) -> ParseResult<(String, String)> {
    let mut property = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::property_ref => property = Some(first_inner_str(inner)?),
            Rule::string_literal => value = Some(first_inner_str(inner)?.replace("''", "'")),
            _ => {}
        }
    }

    match (property, value) {
        (Some(property), Some(value)) => Ok((property, value)),
        _ => Err(ParseError::SemanticError("incomplete predicate".to_string())),
    }
}

fn first_inner_str(pair: Pair<Rule>) -> ParseResult<String> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParseError::SemanticError(format!("empty {:?}", rule)))
}
