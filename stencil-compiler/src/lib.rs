//! Template Compiler: turns a template element into a flat binding list over
//! a stripped clone source, plus the strategy its directives select.

mod compile;
pub mod error;
pub mod options;
pub mod path;
pub mod registry;
pub mod template;

pub use error::CompileError;
pub use options::CompileOptions;
pub use path::PathAddress;
pub use registry::{TemplateHandle, TemplateRegistry};
pub use template::{Binding, BindingKind, Branch, CompiledTemplate, Strategy};
