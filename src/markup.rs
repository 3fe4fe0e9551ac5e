//! Owned markup tree built from a lenient HTML parse.
//!
//! Pages are parsed once with `scraper` and copied into plain values, so the
//! extractors never hold references into the parser's arena and every record
//! they build owns its text.

use scraper::{ElementRef, Html, Node};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

/// Parse a full document and return its root `<html>` element.
pub fn parse(html: &str) -> Element {
    let doc = Html::parse_document(html);
    convert(doc.root_element())
}

fn convert(el: ElementRef<'_>) -> Element {
    let mut children = Vec::new();
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            children.push(MarkupNode::Element(convert(child_el)));
        } else if let Node::Text(text) = child.value() {
            children.push(MarkupNode::Text(text.to_string()));
        }
    }

    let value = el.value();
    Element {
        tag: value.name().to_string(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(el) => Some(el),
            MarkupNode::Text(_) => None,
        }
    }
}

impl Element {
    #[cfg(test)]
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// `Some(n)` for `<h1>`..`<h6>`.
    pub fn heading_level(&self) -> Option<u8> {
        let digit = self.tag.strip_prefix('h')?;
        match digit.parse::<u8>() {
            Ok(n @ 1..=6) => Some(n),
            _ => None,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text(&self) -> String {
        self.text_where(|_| true)
    }

    /// Like [`Element::text`], but skips whole subtrees whose element carries
    /// `class` (e.g. the "[edit]" affordance next to wiki headings).
    pub fn text_without_class(&self, class: &str) -> String {
        self.text_where(|el| !el.has_class(class))
    }

    fn text_where<F>(&self, keep: F) -> String
    where
        F: Fn(&Element) -> bool,
    {
        let mut out = String::new();
        let mut stack: Vec<&MarkupNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                MarkupNode::Text(t) => out.push_str(t),
                MarkupNode::Element(el) if keep(el) => stack.extend(el.children.iter().rev()),
                MarkupNode::Element(_) => {}
            }
        }
        out
    }

    /// Pre-order walk over this element and all descendant elements.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.walk().find(|el| el.id() == Some(id))
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let el = self.stack.pop()?;
        self.stack
            .extend(el.children.iter().rev().filter_map(MarkupNode::as_element));
        Some(el)
    }
}

// ── Tests ──
