use std::rc::Rc;
use std::sync::LazyLock;

use pest::Parser as _;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::ast::{BinaryOp, Compiled, Expr, UnaryOp};
use crate::error::ParseError;
use crate::eval::{ExprCompiler, Expression};
use crate::globals::Globals;
use crate::value::Value;

#[derive(pest_derive::Parser)]
#[grammar = "expr.pest"]
struct ExprGrammar;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::nullish, Assoc::Left))
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not)
            | Op::prefix(Rule::neg)
            | Op::prefix(Rule::pos)
            | Op::prefix(Rule::type_of))
        .op(Op::postfix(Rule::member) | Op::postfix(Rule::index) | Op::postfix(Rule::call))
});

/// Parse expression text into an AST.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let mut pairs = ExprGrammar::parse(Rule::expression, source).map_err(|e| {
        ParseError::Syntax {
            expr: source.to_string(),
            message: e.to_string(),
        }
    })?;
    let root = pairs.next().ok_or_else(|| ParseError::Syntax {
        expr: source.to_string(),
        message: "empty expression".into(),
    })?;
    let ternary = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::ternary)
        .ok_or_else(|| ParseError::Syntax {
            expr: source.to_string(),
            message: "empty expression".into(),
        })?;
    Ok(build_ternary(ternary))
}

fn build_ternary(pair: Pair<'_, Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let test = match inner.next() {
        Some(p) => build_binary(p.into_inner()),
        None => return Expr::Literal(Value::Undefined),
    };
    match (inner.next(), inner.next()) {
        (Some(then), Some(otherwise)) => Expr::Conditional(
            Box::new(test),
            Box::new(build_ternary(then)),
            Box::new(build_ternary(otherwise)),
        ),
        _ => test,
    }
}

fn build_binary(pairs: Pairs<'_, Rule>) -> Expr {
    PRATT
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::not => UnaryOp::Not,
                Rule::neg => UnaryOp::Neg,
                Rule::pos => UnaryOp::Pos,
                _ => UnaryOp::TypeOf,
            };
            Expr::Unary(op, Box::new(rhs))
        })
        .map_postfix(|lhs, op| match op.as_rule() {
            Rule::member => {
                let name = op.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
                Expr::Member(Box::new(lhs), name.to_string())
            }
            Rule::index => {
                let key = op
                    .into_inner()
                    .next()
                    .map(build_ternary)
                    .unwrap_or(Expr::Literal(Value::Undefined));
                Expr::Index(Box::new(lhs), Box::new(key))
            }
            _ => Expr::Call(Box::new(lhs), op.into_inner().map(build_ternary).collect()),
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::nullish => BinaryOp::Nullish,
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::strict_eq => BinaryOp::StrictEq,
                Rule::strict_ne => BinaryOp::StrictNe,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            Expr::Binary(op, Box::new(lhs), Box::new(rhs))
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<'_, Rule>) -> Expr {
    match pair.as_rule() {
        Rule::number => Expr::Literal(Value::Number(pair.as_str().parse().unwrap_or(f64::NAN))),
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
            Expr::Literal(Value::from(unescape(raw)))
        }
        Rule::array => Expr::Array(pair.into_inner().map(build_ternary).collect()),
        Rule::true_lit => Expr::Literal(Value::Bool(true)),
        Rule::false_lit => Expr::Literal(Value::Bool(false)),
        Rule::null_lit => Expr::Literal(Value::Null),
        Rule::undefined_lit => Expr::Literal(Value::Undefined),
        Rule::this => Expr::This,
        Rule::ident => Expr::Ident(pair.as_str().to_string()),
        Rule::ternary => build_ternary(pair),
        rule => unreachable!("unexpected primary {rule:?}"),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// The default expression compiler: a small AST interpreter over [`Value`].
#[derive(Debug, Clone)]
pub struct Parser {
    globals: Rc<Globals>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Globals::standard())
    }
}

impl Parser {
    pub fn new(globals: Globals) -> Self {
        Self {
            globals: Rc::new(globals),
        }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }
}

impl ExprCompiler for Parser {
    fn compile(&self, source: &str, _free_vars: &[String]) -> Result<Rc<dyn Expression>, ParseError> {
        let ast = parse_expr(source)?;
        Ok(Rc::new(Compiled {
            source: source.trim().to_string(),
            ast,
            globals: self.globals.clone(),
        }))
    }
}
