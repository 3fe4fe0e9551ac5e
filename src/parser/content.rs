use serde::{Deserialize, Serialize};

use crate::markup::{Element, MarkupNode};

pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Page chrome that never contributes content.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

const TEXT_TAG: &str = "text";

/// Simplified, depth-bounded copy of a markup subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub tag: String,
    pub text: String,
    #[serde(default)]
    pub children: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ContentNode {
    fn text_leaf(text: String) -> Self {
        ContentNode {
            tag: TEXT_TAG.to_string(),
            text,
            children: Vec::new(),
            heading_level: None,
            id: None,
            href: None,
        }
    }
}

/// Convert `node` into a [`ContentNode`], descending at most `max_depth`
/// levels below `current_depth`.
///
/// Returns `None` past the depth bound, for excluded chrome tags, and for
/// nodes that would end up with neither text nor children.
pub fn extract_content(
    node: &MarkupNode,
    max_depth: usize,
    current_depth: usize,
) -> Option<ContentNode> {
    if current_depth > max_depth {
        return None;
    }

    match node {
        MarkupNode::Text(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                None
            } else {
                Some(ContentNode::text_leaf(text.to_string()))
            }
        }
        MarkupNode::Element(el) => extract_element(el, max_depth, current_depth),
    }
}

fn extract_element(el: &Element, max_depth: usize, current_depth: usize) -> Option<ContentNode> {
    if EXCLUDED_TAGS.contains(&el.tag.as_str()) {
        return None;
    }

    let heading_level = el.heading_level();
    let id = heading_level.map(|_| el.id().unwrap_or_default().to_string());
    let href = if el.is("a") {
        el.attr("href").map(str::to_string)
    } else {
        None
    };

    let children: Vec<ContentNode> = el
        .children
        .iter()
        .filter_map(|child| extract_content(child, max_depth, current_depth + 1))
        .collect();

    let text = el.text().trim().to_string();
    if text.is_empty() && children.is_empty() {
        return None;
    }

    Some(ContentNode {
        tag: el.tag.clone(),
        text,
        children,
        heading_level,
        id,
        href,
    })
}

// ── Tests ──
