use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    error::context,
    multi::separated_list0,
    sequence::{delimited, pair, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Boolean(bool),
    List(Vec<f64>),
}

// 123, 123., 123.45, .45
fn parse_mantissa(input: &str) -> ParserResult<&str> {
    alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ))(input)
}

fn parse_exponent(input: &str) -> ParserResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_signed_number(input: &str) -> ParserResult<f64> {
    context(
        "signed number",
        map_res(
            recognize(tuple((opt(char('-')), parse_mantissa, opt(parse_exponent)))),
            |s: &str| s.parse::<f64>(),
        ),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_unsigned_number(input: &str) -> ParserResult<f64> {
    context(
        "number",
        map_res(
            recognize(pair(parse_mantissa, opt(parse_exponent))),
            |s: &str| s.parse::<f64>(),
        ),
    )(input)
}

/// `[a, b, c]` where every element is a signed number. `[]` is allowed.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_list_literal(input: &str) -> ParserResult<Vec<f64>> {
    context(
        "list literal",
        delimited(
            pair(char('['), multispace0),
            separated_list0(
                delimited(multispace0, char(','), multispace0),
                parse_signed_number,
            ),
            pair(multispace0, char(']')),
        ),
    )(input)
}

/// Parses a number or list literal. `signed` allows a leading `-` on a
/// number, which the tokenizer only permits where an operand is expected.
pub fn parse_literal(input: &str, signed: bool) -> ParserResult<Token> {
    let number = if signed {
        parse_signed_number
    } else {
        parse_unsigned_number
    };
    context(
        "literal",
        map(
            alt((
                map(parse_list_literal, Literal::List),
                map(number, Literal::Number),
            )),
            Token::Literal,
        ),
    )(input)
}
