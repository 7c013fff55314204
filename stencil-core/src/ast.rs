use std::rc::Rc;

use crate::error::EvalError;
use crate::eval::Scope;
use crate::globals::Globals;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Nullish,
    Or,
    And,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    This,
    Array(Vec<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self, scope: &Scope<'_>, globals: &Globals) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Ident(name) => scope
                .lookup(name)
                .or_else(|| globals.get(name))
                .ok_or_else(|| EvalError::Unbound(name.clone())),
            Expr::This => Ok(scope.model().snapshot()),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|e| e.eval(scope, globals))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::from(values))
            }
            Expr::Member(target, key) => {
                let target = target.eval(scope, globals)?;
                read_property(&target, key)
            }
            Expr::Index(target, key) => {
                let target = target.eval(scope, globals)?;
                let key = key.eval(scope, globals)?;
                read_property(&target, &key.to_text())
            }
            Expr::Call(callee, args) => {
                let func = callee.eval(scope, globals)?;
                let args = args
                    .iter()
                    .map(|e| e.eval(scope, globals))
                    .collect::<Result<Vec<_>, _>>()?;
                match func {
                    Value::Function(f) => f.call(scope.model(), &args),
                    Value::Handler(h) => h.call(&args),
                    other => Err(EvalError::NotCallable(describe(callee, &other))),
                }
            }
            Expr::Unary(op, operand) => {
                let v = operand.eval(scope, globals)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!v.truthy()),
                    UnaryOp::Neg => Value::Number(-v.to_number()),
                    UnaryOp::Pos => Value::Number(v.to_number()),
                    UnaryOp::TypeOf => Value::str(v.type_name()),
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval(scope, globals)?;
                match op {
                    BinaryOp::Nullish if !l.is_nullish() => return Ok(l),
                    BinaryOp::Or if l.truthy() => return Ok(l),
                    BinaryOp::And if !l.truthy() => return Ok(l),
                    BinaryOp::Nullish | BinaryOp::Or | BinaryOp::And => {
                        return rhs.eval(scope, globals);
                    }
                    _ => {}
                }
                let r = rhs.eval(scope, globals)?;
                Ok(binary(*op, &l, &r))
            }
            Expr::Conditional(test, then, otherwise) => {
                if test.eval(scope, globals)?.truthy() {
                    then.eval(scope, globals)
                } else {
                    otherwise.eval(scope, globals)
                }
            }
        }
    }
}

fn read_property(target: &Value, key: &str) -> Result<Value, EvalError> {
    target.property(key).ok_or_else(|| EvalError::Property {
        property: key.to_string(),
        target: target.to_text(),
    })
}

fn describe(callee: &Expr, value: &Value) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member(_, key) => key.clone(),
        _ => value.to_text(),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match op {
        BinaryOp::StrictEq => Value::Bool(l.strict_eq(r)),
        BinaryOp::StrictNe => Value::Bool(!l.strict_eq(r)),
        BinaryOp::Eq => Value::Bool(l.loose_eq(r)),
        BinaryOp::Ne => Value::Bool(!l.loose_eq(r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, l, r),
        BinaryOp::Add => match (l, r) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Value::from(format!("{}{}", l.to_text(), r.to_text()))
            }
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                Value::from(format!("{}{}", l.to_text(), r.to_text()))
            }
            _ => Value::Number(l.to_number() + r.to_number()),
        },
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Nullish | BinaryOp::Or | BinaryOp::And => unreachable!("short-circuit operators"),
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Value {
    let ordering = match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => l.to_number().partial_cmp(&r.to_number()),
    };
    let Some(ord) = ordering else {
        return Value::Bool(false);
    };
    Value::Bool(match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Le => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    })
}

/// A parsed expression together with the globals it resolves against.
pub struct Compiled {
    pub(crate) source: String,
    pub(crate) ast: Expr,
    pub(crate) globals: Rc<Globals>,
}

impl crate::eval::Expression for Compiled {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, EvalError> {
        self.ast.eval(scope, &self.globals)
    }

    fn source(&self) -> &str {
        &self.source
    }
}
