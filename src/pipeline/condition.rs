//! Literal boolean filter expressions.
//!
//! `filter_rows` accepts a condition string such as
//! ``score > 5 and (`first name` != 'Ann' or city in ('Oslo', 'Rome'))``. Keywords are case
//! insensitive; `&`, `|` and `~` are accepted for `and`, `or` and `not`. Any comparison
//! involving a null cell, or values of incomparable types, is false.

use std::cmp::Ordering;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{alpha1, char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, verify},
    error::ErrorKind,
    multi::{separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, Frame, Value};

/// Deepest allowed nesting of parentheses and `not`.
pub const MAX_DEPTH: usize = 32;

const KEYWORDS: [&str; 8] = ["and", "or", "not", "is", "in", "null", "true", "false"];

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Value),
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Operand, CmpOp, Operand),
    IsNull { column: String, negated: bool },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Not(Box<Condition>),
    /// All terms hold. Chains are kept flat, so `a and b and c` is one `And` of three terms.
    And(Vec<Condition>),
    /// At least one term holds.
    Or(Vec<Condition>),
}

impl Condition {
    /// Parse a condition string.
    ///
    /// Fails with [`PipelineError::Config`] if `text` is not a complete expression, or if
    /// parentheses and `not` nest more than [`MAX_DEPTH`] levels deep.
    pub fn parse(text: &str) -> PipelineResult<Self> {
        match all_consuming(ws(|i| expr(i, 0)))(text) {
            Ok((_, condition)) => Ok(condition),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(PipelineError::config(
                format!("invalid filter condition: nested more than {MAX_DEPTH} levels deep"),
            )),
            Err(e) => Err(PipelineError::config(format!(
                "invalid filter condition '{text}': {e}"
            ))),
        }
    }

    /// Column labels referenced by the expression, in order of appearance.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare(left, _, right) => {
                for side in [left, right] {
                    if let Operand::Column(name) = side {
                        out.push(name);
                    }
                }
            }
            Self::IsNull { column, .. } | Self::In { column, .. } => out.push(column),
            Self::Not(inner) => inner.collect_columns(out),
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_columns(out);
                }
            }
        }
    }

    /// Evaluate the expression for every row of `frame`.
    ///
    /// Fails with [`PipelineError::MissingColumn`] if a referenced column does not exist.
    pub fn evaluate(&self, frame: &Frame) -> PipelineResult<Vec<bool>> {
        let widened;
        let ds = match frame {
            Frame::Table(ds) => ds,
            Frame::Column(col) => {
                widened = col.clone().into_dataset();
                &widened
            }
        };

        for name in self.columns() {
            if ds.schema.index_of(name).is_none() {
                return Err(PipelineError::missing_column(name, ds.schema.names()));
            }
        }

        Ok(ds.rows.iter().map(|row| self.matches(ds, row)).collect())
    }

    fn matches(&self, ds: &DataSet, row: &[Value]) -> bool {
        match self {
            Self::Compare(left, op, right) => operand_value(ds, row, left)
                .compare(operand_value(ds, row, right))
                .is_some_and(|ord| op.holds(ord)),
            Self::IsNull { column, negated } => cell(ds, row, column).is_null() != *negated,
            Self::In {
                column,
                values,
                negated,
            } => {
                let v = cell(ds, row, column);
                if v.is_null() {
                    return false;
                }
                values.iter().any(|candidate| v.loose_eq(candidate)) != *negated
            }
            Self::Not(inner) => !inner.matches(ds, row),
            Self::And(terms) => terms.iter().all(|t| t.matches(ds, row)),
            Self::Or(terms) => terms.iter().any(|t| t.matches(ds, row)),
        }
    }
}

static NULL: Value = Value::Null;

fn cell<'r>(ds: &DataSet, row: &'r [Value], name: &str) -> &'r Value {
    ds.schema
        .index_of(name)
        .and_then(|i| row.get(i))
        .unwrap_or(&NULL)
}

fn operand_value<'r>(ds: &DataSet, row: &'r [Value], operand: &'r Operand) -> &'r Value {
    match operand {
        Operand::Column(name) => cell(ds, row, name),
        Operand::Literal(v) => v,
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

// Keyword that is not the prefix of a longer identifier (`in` must not match `index`).
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(kw), not(satisfy(is_ident_char)))
}

fn bare_identifier(input: &str) -> IResult<&str, String> {
    map(
        verify(
            recognize(pair(alt((alpha1, tag("_"))), take_while(is_ident_char))),
            |s: &str| !KEYWORDS.contains(&s.to_ascii_lowercase().as_str()),
        ),
        str::to_owned,
    )(input)
}

fn quoted_identifier(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('`'), take_while1(|c| c != '`'), char('`')),
        str::to_owned,
    )(input)
}

fn column(input: &str) -> IResult<&str, String> {
    alt((quoted_identifier, bare_identifier))(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        str::to_owned,
    )(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(keyword("null"), |_| Value::Null),
        map(keyword("true"), |_| Value::Bool(true)),
        map(keyword("false"), |_| Value::Bool(false)),
        map(string_literal, Value::Utf8),
        map_res(
            recognize(tuple((opt(char('-')), digit1, char('.'), digit1))),
            |s: &str| s.parse::<f64>().map(Value::Float64),
        ),
        map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
            s.parse::<i64>().map(Value::Int64)
        }),
    ))(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((map(literal, Operand::Literal), map(column, Operand::Column)))(input)
}

fn cmp_op(input: &str) -> IResult<&str, CmpOp> {
    alt((
        map(tag("=="), |_| CmpOp::Eq),
        map(tag("!="), |_| CmpOp::Ne),
        map(tag("<>"), |_| CmpOp::Ne),
        map(tag("<="), |_| CmpOp::Le),
        map(tag(">="), |_| CmpOp::Ge),
        map(tag("<"), |_| CmpOp::Lt),
        map(tag(">"), |_| CmpOp::Gt),
        map(tag("="), |_| CmpOp::Eq),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, Condition> {
    alt((
        // col IS [NOT] NULL
        map(
            tuple((
                ws(column),
                ws(keyword("is")),
                opt(ws(keyword("not"))),
                ws(keyword("null")),
            )),
            |(column, _, negated, _)| Condition::IsNull {
                column,
                negated: negated.is_some(),
            },
        ),
        // col [NOT] IN (v, ...)
        map(
            tuple((
                ws(column),
                opt(ws(keyword("not"))),
                ws(keyword("in")),
                delimited(
                    ws(char('(')),
                    separated_list0(ws(char(',')), ws(literal)),
                    ws(char(')')),
                ),
            )),
            |(column, negated, _, values)| Condition::In {
                column,
                values,
                negated: negated.is_some(),
            },
        ),
        map(
            tuple((ws(operand), ws(cmp_op), ws(operand))),
            |(left, op, right)| Condition::Compare(left, op, right),
        ),
    ))(input)
}

fn too_deep(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, ErrorKind::TooLarge))
}

fn unary(input: &str, depth: usize) -> IResult<&str, Condition> {
    if depth > MAX_DEPTH {
        return Err(too_deep(input));
    }
    alt((
        map(
            preceded(ws(alt((keyword("not"), tag("~")))), |i| unary(i, depth + 1)),
            |inner| Condition::Not(Box::new(inner)),
        ),
        delimited(ws(char('(')), |i| expr(i, depth + 1), ws(char(')'))),
        predicate,
    ))(input)
}

fn conjunction(input: &str, depth: usize) -> IResult<&str, Condition> {
    map(
        separated_list1(ws(alt((keyword("and"), tag("&")))), |i| unary(i, depth)),
        |mut terms: Vec<Condition>| match terms.len() {
            1 => terms.remove(0),
            _ => Condition::And(terms),
        },
    )(input)
}

fn expr(input: &str, depth: usize) -> IResult<&str, Condition> {
    map(
        separated_list1(ws(alt((keyword("or"), tag("|")))), |i| conjunction(i, depth)),
        |mut terms: Vec<Condition>| match terms.len() {
            1 => terms.remove(0),
            _ => Condition::Or(terms),
        },
    )(input)
}
