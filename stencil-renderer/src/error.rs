use stencil_compiler::PathAddress;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The cloned content no longer has the shape the template was compiled
    /// against.
    #[error("binding path {path} does not resolve in the cloned content")]
    Unresolved { path: PathAddress },
}
