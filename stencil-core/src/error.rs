use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error in `{expr}`: {message}")]
    Syntax { expr: String, message: String },

    #[error("unterminated `${{` in `{0}`")]
    Unterminated(String),
}

/// Failure while evaluating a single expression. Recovered by the batch
/// evaluator; never aborts a render pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("`{0}` is not defined")]
    Unbound(String),

    #[error("cannot read property `{property}` of {target}")]
    Property { property: String, target: String },

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("{0}")]
    Thrown(String),
}
