//! A `nom`-based parser for function calls such as `core:concat('a', ${b}, core:trim(' c '))`.

use super::ResolveError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, separated_pair},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// `library:function`
    pub name: String,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(String),
    Call(FunctionCall),
}

/// Parses a string that consists of exactly one function call.
pub fn parse_function_call(input: &str) -> Result<FunctionCall, ResolveError> {
    match function_call(input.trim()) {
        Ok(("", call)) => Ok(call),
        Ok((rem, _)) => Err(ResolveError::MalformedCall(format!(
            "'{}' has trailing content '{}'",
            input, rem
        ))),
        Err(e) => Err(ResolveError::MalformedCall(format!("'{}': {}", input, e))),
    }
}

/// Parses a function call at the start of `input`, returning the unconsumed remainder.
pub fn parse_leading_call(input: &str) -> Option<(&str, FunctionCall)> {
    function_call(input).ok()
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

fn function_name(input: &str) -> IResult<&str, &str> {
    recognize(separated_pair(identifier, char(':'), identifier)).parse(input)
}

fn function_call(input: &str) -> IResult<&str, FunctionCall> {
    map(
        pair(
            function_name,
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), ws(argument)),
                char(')'),
            ),
        ),
        |(name, args)| FunctionCall {
            name: name.to_string(),
            args,
        },
    )
    .parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_while(|c| c != '\''), char('\'')).parse(input)
}

/// A bare token runs up to the next separator and is trimmed.
fn bare(input: &str) -> IResult<&str, &str> {
    map(take_while1(|c| c != ',' && c != ')'), str::trim).parse(input)
}

fn argument(input: &str) -> IResult<&str, Argument> {
    alt((
        map(function_call, Argument::Call),
        map(quoted, |s: &str| Argument::Literal(s.to_string())),
        map(bare, |s: &str| Argument::Literal(s.to_string())),
    ))
    .parse(input)
}
