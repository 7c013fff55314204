use thiserror::Error;

use crate::document::{Document, NodeId};
use crate::host::Host;
use crate::html::VOID_ELEMENTS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("closing tag </{tag}> at byte {at} has no matching open tag")]
    UnmatchedClose { tag: String, at: usize },

    #[error("<{0}> is never closed")]
    Unclosed(String),

    #[error("unterminated {what} starting at byte {at}")]
    Unterminated { what: &'static str, at: usize },
}

/// Small hand-rolled HTML reader with support for:
/// - nested elements, void elements and self-closing tags (`<input/>`)
/// - quoted, unquoted and boolean attributes
/// - text, where `${ ... }` spans are opaque (they may contain `<`)
/// - comments, which are dropped
///
/// Whitespace-only text containing a line break is indentation and is dropped.
pub fn parse_fragment(doc: &mut Document, input: &str) -> Result<NodeId, MarkupError> {
    let mark = doc.journal().len();
    let root = doc.create_fragment();
    let bytes = input.as_bytes();
    let mut stack: Vec<(String, NodeId)> = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let parent = stack.last().map(|(_, n)| *n).unwrap_or(root);

        if input[i..].starts_with("<!--") {
            let end = input[i + 4..]
                .find("-->")
                .ok_or(MarkupError::Unterminated { what: "comment", at: i })?;
            i += 4 + end + 3;
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let at = i;
            i += 2;
            let tag = read_name(bytes, &mut i);
            skip_ws(bytes, &mut i);
            if i < bytes.len() && bytes[i] == b'>' {
                i += 1;
            }
            let Some(pos) = stack.iter().rposition(|(t, _)| *t == tag) else {
                return Err(MarkupError::UnmatchedClose { tag, at });
            };
            if pos + 1 != stack.len() {
                return Err(MarkupError::Unclosed(stack[stack.len() - 1].0.clone()));
            }
            stack.pop();
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_alphabetic() {
            let start = i;
            i += 1;
            let tag = read_name(bytes, &mut i).to_ascii_lowercase();
            let el = doc.create_element(tag.clone());
            let mut self_closing = false;

            loop {
                skip_ws(bytes, &mut i);
                if i >= bytes.len() {
                    return Err(MarkupError::Unterminated { what: "tag", at: start });
                }
                match bytes[i] {
                    b'/' => {
                        self_closing = true;
                        i += 1;
                    }
                    b'>' => {
                        i += 1;
                        break;
                    }
                    _ => {
                        let name = read_name(bytes, &mut i);
                        if name.is_empty() {
                            // stray byte inside a tag
                            i += 1;
                            continue;
                        }
                        skip_ws(bytes, &mut i);
                        let mut value = String::new();
                        if i < bytes.len() && bytes[i] == b'=' {
                            i += 1;
                            skip_ws(bytes, &mut i);
                            value = read_value(input, &mut i)?;
                        }
                        doc.set_attribute(&el, &name, &decode_entities(&value));
                    }
                }
            }

            doc.append_child(&parent, &el);
            if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                stack.push((tag, el));
            }
            continue;
        }

        // text until the next tag, skipping over `${ ... }` spans
        let start = i;
        while i < bytes.len() {
            if bytes[i] == b'<' && i > start {
                break;
            }
            if bytes[i] == b'<' {
                // a lone `<` that does not open a tag is text
                i += 1;
                continue;
            }
            if input[i..].starts_with("${") {
                match input[i + 2..].find('}') {
                    Some(close) => i += 2 + close + 1,
                    None => i = bytes.len(),
                }
                continue;
            }
            i += 1;
        }
        let text = &input[start..i];
        if !(text.trim().is_empty() && text.contains('\n')) {
            let t = doc.create_text(decode_entities(text));
            doc.append_child(&parent, &t);
        }
    }

    if let Some((tag, _)) = stack.pop() {
        return Err(MarkupError::Unclosed(tag));
    }
    // building the initial tree is not a mutation of a live tree
    doc.truncate_journal(mark);
    Ok(root)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_name(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b':' | b'@' | b'.') {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).into_owned()
}

fn read_value(input: &str, i: &mut usize) -> Result<String, MarkupError> {
    let bytes = input.as_bytes();
    if *i >= bytes.len() {
        return Ok(String::new());
    }
    let quote = bytes[*i];
    if quote == b'"' || quote == b'\'' {
        let start = *i;
        let close = input[start + 1..]
            .find(quote as char)
            .ok_or(MarkupError::Unterminated { what: "attribute value", at: start })?;
        *i = start + 1 + close + 1;
        return Ok(input[start + 1..start + 1 + close].to_string());
    }
    let start = *i;
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    Ok(input[start..*i].to_string())
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&#39;", "'"),
            ("&apos;", "'"),
            ("&nbsp;", "\u{a0}"),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match decoded {
            Some((entity, ch)) => {
                out.push_str(ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::inner_html;

    #[test]
    fn round_trips_simple_markup() {
        let mut doc = Document::new();
        let src = r#"<div class="app"><span>hi</span><input value="x"></div>"#;
        let root = parse_fragment(&mut doc, src).unwrap();
        assert_eq!(inner_html(&doc, root), src);
    }

    #[test]
    fn spans_may_contain_angle_brackets() {
        let mut doc = Document::new();
        let root = parse_fragment(&mut doc, "<p>${ a < b ? 'x' : 'y' }</p>").unwrap();
        let p = doc.child(&root, 0).unwrap();
        assert_eq!(doc.text(&p), "${ a < b ? 'x' : 'y' }");
    }

    #[test]
    fn indentation_is_dropped() {
        let mut doc = Document::new();
        let root = parse_fragment(&mut doc, "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>").unwrap();
        let ul = doc.child(&root, 0).unwrap();
        assert_eq!(doc.child_count(&ul), 2);
    }

    #[test]
    fn entities_are_decoded() {
        let mut doc = Document::new();
        let root = parse_fragment(&mut doc, "<b title=\"a&quot;b\">x &amp; y</b>").unwrap();
        let b = doc.child(&root, 0).unwrap();
        assert_eq!(doc.attribute(&b, "title").as_deref(), Some("a\"b"));
        assert_eq!(doc.text(&b), "x & y");
    }

    #[test]
    fn mismatched_tags_are_errors() {
        let mut doc = Document::new();
        assert!(matches!(
            parse_fragment(&mut doc, "<div></span>"),
            Err(MarkupError::UnmatchedClose { .. })
        ));
        assert!(matches!(
            parse_fragment(&mut doc, "<div><p></div>"),
            Err(MarkupError::Unclosed(_))
        ));
        assert!(matches!(parse_fragment(&mut doc, "<div>"), Err(MarkupError::Unclosed(_))));
    }
}
