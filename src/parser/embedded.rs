use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::markup::Element;

static DEFAULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)default[:\s]+([^.]+)").unwrap());

const BLOCK_CODE_TAG: &str = "pre";
const INLINE_CODE_TAG: &str = "code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeExample {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub param_type: String,
    #[serde(default)]
    pub default: String,
}

/// Pull code samples out of `root` and everything below it.
///
/// Two passes: `<pre>` blocks that mention one of `keywords`
/// (case-insensitive), then every `<code>` not sitting directly inside a
/// `<pre>`. Results are therefore grouped by kind rather than in strict
/// document order.
pub fn extract_code_examples(root: &Element, keywords: &[String]) -> Vec<CodeExample> {
    let mut examples: Vec<CodeExample> = root
        .walk()
        .filter(|el| el.is(BLOCK_CODE_TAG))
        .filter_map(|pre| {
            let code = pre.text().trim().to_string();
            mentions_keyword(&code, keywords).then_some(CodeExample {
                code,
                kind: CodeKind::Block,
            })
        })
        .collect();

    let mut stack: Vec<(&Element, Option<&str>)> = vec![(root, None)];
    while let Some((el, parent)) = stack.pop() {
        if el.is(INLINE_CODE_TAG) && parent != Some(BLOCK_CODE_TAG) {
            examples.push(CodeExample {
                code: el.text().trim().to_string(),
                kind: CodeKind::Inline,
            });
        }
        let children: Vec<&Element> = el.element_children().collect();
        stack.extend(children.into_iter().rev().map(|c| (c, Some(el.tag.as_str()))));
    }

    examples
}

fn mentions_keyword(code: &str, keywords: &[String]) -> bool {
    let lower = code.to_lowercase();
    keywords.iter().any(|kw| lower.contains(&kw.to_lowercase()))
}

/// Pull parameter descriptions out of `root`: parameter tables first, then
/// definition lists.
pub fn extract_parameters(root: &Element) -> Vec<Parameter> {
    let mut params = Vec::new();

    for table in root.walk().filter(|el| el.is("table")) {
        params.extend(table_parameters(table));
    }

    // Definition lists pair each <dt> with the next <dd> in document order,
    // which may lie past the end of its own list.
    let order: Vec<&Element> = root.walk().collect();
    for (i, dl) in order.iter().enumerate().filter(|(_, el)| el.is("dl")) {
        let end = i + dl.walk().count();
        for (j, dt) in order.iter().enumerate().take(end).skip(i + 1) {
            if !dt.is("dt") {
                continue;
            }
            let Some(dd) = order[j + 1..].iter().find(|el| el.is("dd")) else {
                continue;
            };
            params.push(Parameter {
                name: dt.text().trim().to_string(),
                description: dd.text().trim().to_string(),
                param_type: String::new(),
                default: String::new(),
            });
        }
    }

    params
}

fn table_parameters(table: &Element) -> Vec<Parameter> {
    let header_text = table
        .walk()
        .filter(|el| el.is("th"))
        .map(|th| th.text().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if !header_text.contains("parameter") && !header_text.contains("name") {
        return Vec::new();
    }

    table
        .walk()
        .filter(|el| el.is("tr"))
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .walk()
                .filter(|el| el.is("td") || el.is("th"))
                .map(|cell| cell.text().trim().to_string())
                .collect();
            if cells.len() < 2 {
                return None;
            }
            Some(Parameter {
                default: default_value(&cells[1]),
                name: cells[0].clone(),
                description: cells[1].clone(),
                param_type: cells.get(2).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// "Default: 10mm. See also scale." -> "10mm"
pub fn default_value(description: &str) -> String {
    DEFAULT_RE
        .captures(description)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

// ── Tests ──
