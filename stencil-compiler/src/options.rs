use serde::Deserialize;
use stencil_core::{ExtractOptions, OutputKind};

/// Directive and attribute names recognised by the compiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub repeat_attr: String,
    pub if_attr: String,
    pub else_attr: String,
    /// `on-click="${...}"` binds a `click` listener.
    pub event_prefix: String,
    pub template_tag: String,
    pub token_list_attrs: Vec<String>,
    pub key_value_attrs: Vec<String>,
    pub extract: ExtractOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            repeat_attr: "repeat".into(),
            if_attr: "if".into(),
            else_attr: "else".into(),
            event_prefix: "on-".into(),
            template_tag: "template".into(),
            token_list_attrs: vec!["class".into()],
            key_value_attrs: vec!["style".into()],
            extract: ExtractOptions::default(),
        }
    }
}

impl CompileOptions {
    pub fn output_kind(&self, attr: &str) -> OutputKind {
        if self.token_list_attrs.iter().any(|a| a == attr) {
            OutputKind::TokenList
        } else if self.key_value_attrs.iter().any(|a| a == attr) {
            OutputKind::KeyValue
        } else {
            OutputKind::Raw
        }
    }

    /// Event name for an event-binding attribute, if `attr` is one.
    pub fn event_name<'a>(&self, attr: &'a str) -> Option<&'a str> {
        attr.strip_prefix(self.event_prefix.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn is_directive(&self, attr: &str) -> bool {
        attr == self.repeat_attr || attr == self.if_attr || attr == self.else_attr
    }
}
