//! A general expression parser.
//!
//! This accepts more than conditions allow: arithmetic, unary
//! operators, calls, attribute access, subscripts, lists and tuples
//! all parse, and are left for [`grammar`](crate::grammar) to
//! reject. Precedence, loosest first, is `or`, `and`, `not`,
//! comparisons (which chain), `+ -`, `* / // %`, unary `- + ~`, `**`,
//! then calls, attributes and subscripts.
//!
//! Keywords (`and`, `or`, `not`, `in`, `is`) and the booleans `true` and
//! `false` are matched without regard to case. Strings may use single
//! or double quotes, with backslash escapes. Numbers keep the text they
//! were written with.

use thiserror::Error;
use winnow::{
    ascii::{digit0, digit1, multispace0, Caseless},
    combinator::{alt, delimited, eof, not, opt, preceded, repeat, separated, terminated},
    error::{ContextError, StrContext},
    prelude::*,
    token::{literal, one_of, take_while},
};

use crate::ast::{BinOperator, BoolOperator, CmpOp, Expression, Literal, Node, UnaryOperator};

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected input at position {offset}")]
    Unexpected { offset: usize },
    #[error("{message} at position {offset}")]
    Invalid { offset: usize, message: String },
}

type Input<'a> = &'a str;
type ParserResult<T> = winnow::Result<T>;

const RESERVED: &[&str] = &["and", "or", "not", "in", "is", "true", "false"];

fn label(text: &'static str) -> ContextError {
    let mut context = ContextError::new();
    context.push(StrContext::Label(text));
    context
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ws(input: &mut Input<'_>) -> ParserResult<()> {
    let _ = multispace0.parse_next(input)?;
    Ok(())
}

/// Matches `word` in any case, provided it isn't the start of a longer identifier.
fn keyword<'a>(word: &'static str) -> impl Parser<Input<'a>, &'a str, ContextError> {
    terminated(literal(Caseless(word)), not(one_of(is_ident_continue)))
}

fn parse_boolean(input: &mut Input<'_>) -> ParserResult<Literal> {
    alt((
        keyword("true").value(Literal::Bool(true)),
        keyword("false").value(Literal::Bool(false)),
    ))
    .parse_next(input)
}

fn parse_number(input: &mut Input<'_>) -> ParserResult<Literal> {
    let start = *input;
    let _ = (
        opt(one_of(['+', '-'])),
        digit1,
        opt(('.', digit0)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .parse_next(input)?;
    let consumed = start.len() - input.len();
    Ok(Literal::Number(start[..consumed].to_string()))
}

fn parse_string(input: &mut Input<'_>) -> ParserResult<Literal> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    let text: &str = *input;
    let mut value = String::new();
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            *input = &text[i + c.len_utf8()..];
            return Ok(Literal::Str(value));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            }
        } else {
            value.push(c);
        }
    }
    Err(label("unterminated string"))
}

fn parse_literal(input: &mut Input<'_>) -> ParserResult<Literal> {
    alt((parse_boolean, parse_number, parse_string)).parse_next(input)
}

fn parse_identifier<'a>(input: &mut Input<'a>) -> ParserResult<&'a str> {
    let start = *input;
    let _ = (one_of(is_ident_start), take_while(0.., is_ident_continue)).parse_next(input)?;
    let ident = &start[..start.len() - input.len()];
    if RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(ident)) {
        return Err(label("keyword used as identifier"));
    }
    Ok(ident)
}

fn parse_elements(input: &mut Input<'_>) -> ParserResult<(Vec<Node>, bool)> {
    let elts: Vec<Node> = separated(0.., parse_test, (ws, ',', ws)).parse_next(input)?;
    let trailing = opt((ws, ',')).parse_next(input)?.is_some();
    Ok((elts, trailing))
}

/// A parenthesised group, or a tuple if there is a comma.
fn parse_group(input: &mut Input<'_>) -> ParserResult<Node> {
    let (mut elts, trailing) = delimited(('(', ws), parse_elements, (ws, ')')).parse_next(input)?;
    if elts.len() == 1 && !trailing {
        if let Some(inner) = elts.pop() {
            return Ok(inner);
        }
    }
    Ok(Node::Tuple { elts })
}

fn parse_list(input: &mut Input<'_>) -> ParserResult<Node> {
    let (elts, _) = delimited(('[', ws), parse_elements, (ws, ']')).parse_next(input)?;
    Ok(Node::List { elts })
}

fn parse_atom(input: &mut Input<'_>) -> ParserResult<Node> {
    alt((
        parse_group,
        parse_list,
        parse_literal.map(Node::Constant),
        parse_identifier.map(Node::name),
    ))
    .parse_next(input)
}

enum Trailer {
    Call(Vec<Node>),
    Attribute(String),
    Subscript(Node),
}

fn parse_trailer(input: &mut Input<'_>) -> ParserResult<Trailer> {
    preceded(
        ws,
        alt((
            delimited(('(', ws), parse_elements, (ws, ')')).map(|(args, _)| Trailer::Call(args)),
            preceded(('.', ws), parse_identifier).map(|attr| Trailer::Attribute(attr.to_string())),
            delimited(('[', ws), parse_test, (ws, ']')).map(Trailer::Subscript),
        )),
    )
    .parse_next(input)
}

fn parse_postfix(input: &mut Input<'_>) -> ParserResult<Node> {
    let atom = parse_atom.parse_next(input)?;
    let trailers: Vec<Trailer> = repeat(0.., parse_trailer).parse_next(input)?;
    Ok(trailers
        .into_iter()
        .fold(atom, |value, trailer| match trailer {
            Trailer::Call(args) => Node::Call {
                func: Box::new(value),
                args,
            },
            Trailer::Attribute(attr) => Node::Attribute {
                value: Box::new(value),
                attr,
            },
            Trailer::Subscript(slice) => Node::Subscript {
                value: Box::new(value),
                slice: Box::new(slice),
            },
        }))
}

fn binop(left: Node, op: BinOperator, right: Node) -> Node {
    Node::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn parse_power(input: &mut Input<'_>) -> ParserResult<Node> {
    let base = parse_postfix.parse_next(input)?;
    let exponent = opt(preceded((ws, "**", ws), parse_factor)).parse_next(input)?;
    Ok(match exponent {
        Some(exponent) => binop(base, BinOperator::Pow, exponent),
        None => base,
    })
}

fn parse_factor(input: &mut Input<'_>) -> ParserResult<Node> {
    alt((
        parse_power,
        (
            alt((
                '-'.value(UnaryOperator::USub),
                '+'.value(UnaryOperator::UAdd),
                '~'.value(UnaryOperator::Invert),
            )),
            ws,
            parse_factor,
        )
            .map(|(op, _, operand)| Node::UnaryOp {
                op,
                operand: Box::new(operand),
            }),
    ))
    .parse_next(input)
}

fn parse_term(input: &mut Input<'_>) -> ParserResult<Node> {
    let first = parse_factor.parse_next(input)?;
    let rest: Vec<(BinOperator, Node)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt((
                    "//".value(BinOperator::FloorDiv),
                    "/".value(BinOperator::Div),
                    terminated("*", not('*')).value(BinOperator::Mult),
                    "%".value(BinOperator::Mod),
                )),
            ),
            preceded(ws, parse_factor),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |left, (op, right)| binop(left, op, right)))
}

fn parse_arith(input: &mut Input<'_>) -> ParserResult<Node> {
    let first = parse_term.parse_next(input)?;
    let rest: Vec<(BinOperator, Node)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt(('+'.value(BinOperator::Add), '-'.value(BinOperator::Sub))),
            ),
            preceded(ws, parse_term),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |left, (op, right)| binop(left, op, right)))
}

fn parse_cmp_op(input: &mut Input<'_>) -> ParserResult<CmpOp> {
    alt((
        "==".value(CmpOp::Eq),
        "!=".value(CmpOp::NotEq),
        "<=".value(CmpOp::LtE),
        ">=".value(CmpOp::GtE),
        "<".value(CmpOp::Lt),
        ">".value(CmpOp::Gt),
        (keyword("not"), ws, keyword("in")).value(CmpOp::NotIn),
        keyword("in").value(CmpOp::In),
        (keyword("is"), ws, keyword("not")).value(CmpOp::IsNot),
        keyword("is").value(CmpOp::Is),
    ))
    .parse_next(input)
}

fn parse_comparison(input: &mut Input<'_>) -> ParserResult<Node> {
    let left = parse_arith.parse_next(input)?;
    let rest: Vec<(CmpOp, Node)> =
        repeat(0.., (delimited(ws, parse_cmp_op, ws), parse_arith)).parse_next(input)?;
    if rest.is_empty() {
        return Ok(left);
    }
    let (ops, comparators) = rest.into_iter().unzip();
    Ok(Node::Compare {
        left: Box::new(left),
        ops,
        comparators,
    })
}

fn parse_not(input: &mut Input<'_>) -> ParserResult<Node> {
    alt((
        preceded((keyword("not"), ws), parse_not).map(|operand| Node::UnaryOp {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
        }),
        parse_comparison,
    ))
    .parse_next(input)
}

fn parse_and(input: &mut Input<'_>) -> ParserResult<Node> {
    let first = parse_not.parse_next(input)?;
    let rest: Vec<Node> =
        repeat(0.., preceded((ws, keyword("and"), ws), parse_not)).parse_next(input)?;
    Ok(Node::bool_op(BoolOperator::And, first, rest))
}

fn parse_or(input: &mut Input<'_>) -> ParserResult<Node> {
    let first = parse_and.parse_next(input)?;
    let rest: Vec<Node> =
        repeat(0.., preceded((ws, keyword("or"), ws), parse_and)).parse_next(input)?;
    Ok(Node::bool_op(BoolOperator::Or, first, rest))
}

fn parse_test(input: &mut Input<'_>) -> ParserResult<Node> {
    parse_or.parse_next(input)
}

/// Parse `text` as a single expression.
///
/// Nesting is not limited here. Text from users should be checked
/// with [`ConditionConfig::check`](crate::config::ConditionConfig::check) first.
pub fn parse(text: &str) -> Result<Expression, ParseError> {
    let mut full_expression_parser = delimited(ws, parse_test, (ws, eof));

    full_expression_parser
        .parse(text)
        .map(|body| Expression { body })
        .map_err(|err| {
            let offset = err.offset();
            let message = err.inner().to_string();
            if message.is_empty() {
                ParseError::Unexpected { offset }
            } else {
                ParseError::Invalid { offset, message }
            }
        })
}
