//! In-memory host tree used by the renderer and its tests.

pub mod document;
pub mod host;
pub mod html;
pub mod markup;
pub mod sketch;

pub use document::{Document, Mutation, NodeId};
pub use host::{Host, NodeKind};
pub use html::{inner_html, to_html};
pub use markup::{MarkupError, parse_fragment};
pub use sketch::{Sketch, el, placeholder, template, txt};
