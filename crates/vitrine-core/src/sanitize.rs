//! Rich-text sanitizer
//!
//! Reduces untrusted markup to a small allow-list: basic text formatting,
//! hyperlinks (forced `rel="nofollow"`, safe schemes only), and `img`
//! elements restricted to their `src` attribute. Disallowed elements are
//! flattened into their cleaned children so text content survives; comments
//! and script/style bodies are dropped outright.
//!
//! The `src` value of a kept `img` is never altered — inline data URIs,
//! bare ids, and links all pass through byte-for-byte.

use std::cell::RefCell;

use html5ever::{local_name, namespace_url, ns, Attribute, QualName};
use markup5ever_rcdom::{Handle, NodeData};

use crate::markup;

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "cite", "code", "dd", "dl", "dt", "em", "i", "img", "li", "ol",
    "p", "pre", "q", "small", "span", "strike", "strong", "sub", "sup", "u", "ul",
];

/// Elements whose whole subtree is discarded rather than flattened
const DROPPED_SUBTREES: &[&str] = &["script", "style"];

const LINK_SCHEMES: &[&str] = &["http:", "https:", "ftp:", "mailto:"];

fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href"],
        "blockquote" | "q" => &["cite"],
        "img" => &["src"],
        _ => &[],
    }
}

/// Sanitize one rich-text field. Pure and total: malformed markup degrades
/// to a best-effort parse and comes back cleaned, never as an error.
pub fn sanitize(markup_in: &str) -> String {
    let dom = markup::parse_dom(markup_in);
    match markup::find_body(&dom.document) {
        Some(body) => {
            clean_children(&body);
            markup::serialize_children(&body)
        }
        None => String::new(),
    }
}

fn clean_children(node: &Handle) {
    let original: Vec<Handle> = node.children.borrow().clone();
    let mut kept: Vec<Handle> = Vec::new();

    for child in original {
        match child.data {
            NodeData::Text { .. } => kept.push(child.clone()),
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let tag = name.local.as_ref().to_string();
                if DROPPED_SUBTREES.contains(&tag.as_str()) {
                    continue;
                }
                clean_children(&child);
                if ALLOWED_TAGS.contains(&tag.as_str()) {
                    clean_attributes(&tag, attrs);
                    kept.push(child.clone());
                } else {
                    // flatten: splice the cleaned children into the parent
                    kept.extend(child.children.borrow().iter().cloned());
                }
            }
            // comments, doctypes, processing instructions
            _ => {}
        }
    }

    *node.children.borrow_mut() = kept;
}

fn clean_attributes(tag: &str, attrs: &RefCell<Vec<Attribute>>) {
    let keep = allowed_attributes(tag);
    let mut attrs = attrs.borrow_mut();
    attrs.retain(|attr| keep.contains(&attr.name.local.as_ref()));

    if tag == "a" {
        attrs.retain(|attr| attr.name.local.as_ref() != "href" || safe_link(&attr.value));
        attrs.push(Attribute {
            name: QualName::new(None, ns!(), local_name!("rel")),
            value: "nofollow".into(),
        });
    }
}

/// Hyperlinks must carry an explicit safe scheme; everything else
/// (javascript:, data:, scheme-relative, relative) loses its href.
fn safe_link(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    LINK_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme))
}
