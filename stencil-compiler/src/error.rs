use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("expected a <{expected}> element, found {found}")]
    NotATemplate { expected: String, found: String },
}
