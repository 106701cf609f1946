//! Rich-text field scanning and rewriting
//!
//! A rich-text field is parsed once into a DOM; its `img` elements are
//! recorded in document order so their `src` attributes can be read and
//! rewritten individually; the body content is then serialized back out with
//! all other markup untouched.
//!
//! Malformed markup never fails here — the HTML5 tree builder produces a
//! best-effort tree for any input.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_document, Attribute, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// A parsed rich-text field
///
/// Holds the DOM and the handles of every `img` element found, in document
/// order. Attribute rewrites go through interior mutability on the DOM, so
/// scanning and rewriting share one parse.
pub struct RichText {
    dom: RcDom,
    images: Vec<Handle>,
}

impl RichText {
    /// Parse a field's markup
    pub fn parse(markup: &str) -> Self {
        let dom = parse_dom(markup);
        let mut images = Vec::new();
        if let Some(body) = find_body(&dom.document) {
            collect_images(&body, &mut images);
        }
        RichText { dom, images }
    }

    /// Number of `img` elements in the field
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// The `src` value of the `img` element at `index`, in document order.
    /// An element without a `src` attribute reads as the empty string.
    pub fn image_src(&self, index: usize) -> String {
        let Some(node) = self.images.get(index) else {
            return String::new();
        };
        if let NodeData::Element { ref attrs, .. } = node.data {
            for attr in attrs.borrow().iter() {
                if attr.name.local.as_ref() == "src" {
                    return attr.value.to_string();
                }
            }
        }
        String::new()
    }

    /// All `src` values in document order
    pub fn image_srcs(&self) -> Vec<String> {
        (0..self.images.len()).map(|i| self.image_src(i)).collect()
    }

    /// Replace the `src` of exactly the `img` element at `index`
    pub fn set_image_src(&self, index: usize, src: &str) {
        let Some(node) = self.images.get(index) else {
            return;
        };
        if let NodeData::Element { ref attrs, .. } = node.data {
            let mut attrs = attrs.borrow_mut();
            for attr in attrs.iter_mut() {
                if attr.name.local.as_ref() == "src" {
                    attr.value = src.into();
                    return;
                }
            }
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), local_name!("src")),
                value: src.into(),
            });
        }
    }

    /// Serialize the body content back to markup
    pub fn html(&self) -> String {
        match find_body(&self.dom.document) {
            Some(body) => serialize_children(&body),
            None => String::new(),
        }
    }
}

/// Parse markup into a best-effort HTML5 tree
pub(crate) fn parse_dom(markup: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(markup)
}

/// Locate the `body` element the tree builder always constructs
pub(crate) fn find_body(document: &Handle) -> Option<Handle> {
    let html = child_element(document, "html")?;
    child_element(&html, "body")
}

/// Serialize a node's children (its inner markup)
pub(crate) fn serialize_children(node: &Handle) -> String {
    let mut buf = Vec::new();
    let handle: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut buf, &handle, opts).expect("serializing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

fn child_element(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| element_name(child) == Some(tag.to_string()))
        .cloned()
}

fn element_name(node: &Handle) -> Option<String> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

fn collect_images(node: &Handle, images: &mut Vec<Handle>) {
    if element_name(node).as_deref() == Some("img") {
        images.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect_images(child, images);
    }
}
