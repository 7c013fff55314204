//! Values, data objects and the expression machinery shared by the compiler
//! and the renderer.

pub mod ast;
pub mod error;
pub mod eval;
pub mod extract;
pub mod globals;
mod json;
pub mod model;
pub mod parse;
pub mod value;

pub use error::{EvalError, ParseError};
pub use eval::{BindCache, Batch, CompiledExpr, ExprCompiler, Expression, OutputKind, Scope};
pub use extract::{ExtractOptions, free_variables, is_dynamic, segments};
pub use globals::Globals;
pub use model::{ITEM, ItemScope, Model};
pub use parse::{Parser, parse_expr};
pub use value::{Function, Handler, Object, Value};
