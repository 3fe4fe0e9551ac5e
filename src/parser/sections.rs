use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::content::{extract_content, ContentNode};
use super::embedded::{extract_code_examples, extract_parameters, CodeExample, Parameter};
use crate::markup::{Element, MarkupNode};
use crate::settings::SiteProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub id: String,
    pub content: Vec<ContentNode>,
    pub code_examples: Vec<CodeExample>,
    pub parameters: Vec<Parameter>,
}

/// A heading that opens a section, plus the sibling run that follows it.
#[derive(Debug, Clone, Copy)]
pub struct HeadingAnchor<'a> {
    pub heading: &'a Element,
    pub level: u8,
    /// Wrapper element holding only the heading and its chrome, when the
    /// heading does not sit directly in the sibling run.
    pub container: Option<&'a Element>,
    /// Siblings after the heading (or its wrapper), in document order.
    pub following: &'a [MarkupNode],
}

/// Splits a page into sections at headings within `levels`.
pub struct Segmenter<'a> {
    profile: &'a SiteProfile,
    levels: RangeInclusive<u8>,
    max_depth: usize,
    skip_boilerplate: bool,
}

impl<'a> Segmenter<'a> {
    /// Manual pages: `<h2>`..`<h5>` nest, boilerplate sections are dropped.
    pub fn nested(profile: &'a SiteProfile, max_depth: usize) -> Self {
        Segmenter {
            profile,
            levels: 2..=5,
            max_depth,
            skip_boilerplate: true,
        }
    }

    /// Single-page layouts: every `<h2>` runs until the next `<h2>`.
    pub fn flat(profile: &'a SiteProfile, max_depth: usize) -> Self {
        Segmenter {
            profile,
            levels: 2..=2,
            max_depth,
            skip_boilerplate: false,
        }
    }

    /// Collect section anchors below `root`, in document order.
    pub fn find_anchors<'t>(&self, root: &'t Element) -> Vec<HeadingAnchor<'t>> {
        let mut anchors = Vec::new();
        let mut stack: Vec<(&'t Element, Option<(&'t Element, usize)>)> = vec![(root, None)];

        while let Some((el, slot)) = stack.pop() {
            if let Some((parent, index)) = slot {
                let following = &parent.children[index + 1..];
                if el.has_class(&self.profile.heading_wrapper_class) {
                    if let Some((heading, level)) = self.wrapped_heading(el) {
                        anchors.push(HeadingAnchor {
                            heading,
                            level,
                            container: Some(el),
                            following,
                        });
                        continue;
                    }
                } else if let Some(level) = self.anchor_level(el) {
                    anchors.push(HeadingAnchor {
                        heading: el,
                        level,
                        container: None,
                        following,
                    });
                }
            }

            stack.extend(
                el.children
                    .iter()
                    .enumerate()
                    .rev()
                    .filter_map(|(i, child)| child.as_element().map(|c| (c, Some((el, i))))),
            );
        }

        anchors
    }

    /// Build one [`Section`] per anchor, skipping boilerplate titles.
    pub fn segment_sections(&self, anchors: &[HeadingAnchor<'_>]) -> Vec<Section> {
        anchors
            .iter()
            .filter_map(|anchor| self.build_section(anchor))
            .collect()
    }

    fn build_section(&self, anchor: &HeadingAnchor<'_>) -> Option<Section> {
        let title = anchor
            .heading
            .text_without_class(&self.profile.edit_section_class)
            .trim()
            .to_string();
        if self.skip_boilerplate && self.profile.skip_titles.contains(&title) {
            debug!("Skipping boilerplate section {:?}", title);
            return None;
        }

        let keywords = &self.profile.code_keywords;
        let (mut code_examples, mut parameters) = match anchor.container {
            Some(wrapper) => (
                extract_code_examples(wrapper, keywords),
                extract_parameters(wrapper),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let mut content = Vec::new();

        for node in anchor.following {
            if self.level_of(node).is_some_and(|level| level <= anchor.level) {
                break;
            }
            let MarkupNode::Element(el) = node else {
                continue;
            };
            // records only come from siblings that produce content
            if let Some(c) = extract_content(node, self.max_depth, 0) {
                content.push(c);
                code_examples.extend(extract_code_examples(el, keywords));
                parameters.extend(extract_parameters(el));
            }
        }

        Some(Section {
            title,
            id: anchor.heading.id().unwrap_or_default().to_string(),
            content,
            code_examples,
            parameters,
        })
    }

    fn anchor_level(&self, el: &Element) -> Option<u8> {
        el.heading_level().filter(|l| self.levels.contains(l))
    }

    fn wrapped_heading<'t>(&self, wrapper: &'t Element) -> Option<(&'t Element, u8)> {
        wrapper
            .element_children()
            .find_map(|h| self.anchor_level(h).map(|level| (h, level)))
    }

    /// Heading level of a sibling, looking through heading wrappers.
    fn level_of(&self, node: &MarkupNode) -> Option<u8> {
        let el = node.as_element()?;
        if el.has_class(&self.profile.heading_wrapper_class) {
            return self.wrapped_heading(el).map(|(_, level)| level);
        }
        self.anchor_level(el)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;
    use crate::parser::embedded::CodeKind;

    fn sections(html: &str, nested: bool) -> Vec<Section> {
        let profile = SiteProfile::default();
        let root = parse(html);
        let seg = if nested {
            Segmenter::nested(&profile, 3)
        } else {
            Segmenter::flat(&profile, 3)
        };
        let anchors = seg.find_anchors(&root);
        seg.segment_sections(&anchors)
    }

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn cube_section() {
        let s = sections(
            "<body><h2 id=\"cube\">cube()</h2><p>Creates a cube.</p><pre>cube(10);</pre><h2>next</h2></body>",
            true,
        );
        assert_eq!(s.len(), 2);
        let cube = &s[0];
        assert_eq!(cube.title, "cube()");
        assert_eq!(cube.id, "cube");
        assert_eq!(cube.content[0].text, "Creates a cube.");
        assert_eq!(
            cube.code_examples,
            vec![CodeExample { code: "cube(10);".into(), kind: CodeKind::Block }]
        );
        assert!(cube.parameters.is_empty());
        assert_eq!(s[1].id, "");
    }

    #[test]
    fn stops_at_same_or_higher_level() {
        let s = sections(
            "<body><h3>a</h3><p>1</p><h4>b</h4><p>2</p><h3>c</h3><p>3</p><h2>d</h2><p>4</p></body>",
            true,
        );
        assert_eq!(titles(&s), vec!["a", "b", "c", "d"]);
        // a contains its own paragraph plus the nested h4 and its paragraph
        let a: Vec<&str> = s[0].content.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(a, vec!["1", "b", "2"]);
        assert_eq!(s[1].content.len(), 1);
        assert_eq!(s[2].content.len(), 1);
        assert_eq!(s[2].content[0].text, "3");
        assert_eq!(s[3].content[0].text, "4");
    }

    #[test]
    fn out_of_range_headings_do_not_terminate() {
        let s = sections("<body><h2>a</h2><h6>minor</h6><p>x</p><h1>big</h1><p>y</p></body>", true);
        assert_eq!(titles(&s), vec!["a"]);
        assert_eq!(s[0].content.len(), 4);
    }

    #[test]
    fn boilerplate_sections_are_skipped() {
        let s = sections(
            "<body><h2>Usage</h2><p>x</p><h2>See also</h2><p>links</p><h2>see also</h2></body>",
            true,
        );
        assert_eq!(titles(&s), vec!["Usage", "see also"]);
    }

    #[test]
    fn flat_mode_keeps_boilerplate_and_ignores_h3() {
        let s = sections("<body><h2>See also</h2><h3>sub</h3><p>x</p><h2>b</h2></body>", false);
        assert_eq!(titles(&s), vec!["See also", "b"]);
        assert_eq!(s[0].content.len(), 2);
    }

    #[test]
    fn chrome_and_empty_siblings_add_no_records() {
        let s = sections(
            "<body><h2>a</h2><p>x</p>\
             <nav><code>navcode</code><table><tr><th>Name</th><th>Description</th></tr>\
             <tr><td>chrome</td><td>menu</td></tr></table></nav>\
             <p><code></code></p></body>",
            true,
        );
        assert_eq!(s[0].content.len(), 1);
        assert!(s[0].code_examples.is_empty());
        assert!(s[0].parameters.is_empty());
    }

    #[test]
    fn text_siblings_are_not_content() {
        let s = sections("<body><h2>a</h2>loose text<p>x</p></body>", true);
        assert_eq!(s[0].content.len(), 1);
    }

    #[test]
    fn wrapped_headings() {
        let html = "<body><div class=\"mw-heading mw-heading2\"><h2 id=\"Cube\">Cube</h2>\
            <span class=\"mw-editsection\">[<a href=\"/w/index.php?action=edit\">edit</a>]</span></div>\
            <p>Cube text <code>center</code></p>\
            <div class=\"mw-heading mw-heading3\"><h3 id=\"Sub\">Sub</h3></div><p>sub text</p>\
            <div class=\"mw-heading mw-heading2\"><h2 id=\"Sphere\">Sphere</h2></div><p>Sphere text</p></body>";
        let s = sections(html, true);
        assert_eq!(titles(&s), vec!["Cube", "Sub", "Sphere"]);
        assert_eq!(s[0].id, "Cube");
        // Cube runs through the nested h3 wrapper and stops at the next h2 wrapper
        assert_eq!(s[0].content.len(), 3);
        assert_eq!(s[0].code_examples.len(), 1);
        assert_eq!(s[2].content[0].text, "Sphere text");
    }

    #[test]
    fn wrapper_records_come_first() {
        let html = "<body><div class=\"mw-heading\"><h2>a</h2><code>wrapped</code></div>\
            <p><code>sibling</code></p></body>";
        let s = sections(html, true);
        let codes: Vec<&str> = s[0].code_examples.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["wrapped", "sibling"]);
    }

    #[test]
    fn edit_affordance_removed_from_title() {
        let s = sections(
            "<body><h2>Title<span class=\"mw-editsection\">[edit]</span></h2><p>x</p></body>",
            true,
        );
        assert_eq!(s[0].title, "Title");
    }

    #[test]
    fn nested_containers() {
        let s = sections(
            "<body><div><h2>inner</h2><p>x</p></div><p>outside</p></body>",
            true,
        );
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].content.len(), 1);
        assert_eq!(s[0].content[0].text, "x");
    }

    #[test]
    fn primitives_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/wiki_primitives.html").unwrap();
        let s = sections(&html, true);
        let t = titles(&s);
        assert!(t.contains(&"cube"));
        assert!(t.contains(&"sphere"));
        assert!(!t.contains(&"See also"));
        let cube = s.iter().find(|s| s.title == "cube").unwrap();
        assert!(cube.code_examples.iter().any(|c| c.kind == CodeKind::Block && c.code.starts_with("cube(")));
        assert!(cube.parameters.iter().any(|p| p.name == "size"));
        let sphere = s.iter().find(|s| s.title == "sphere").unwrap();
        assert!(sphere.parameters.iter().any(|p| p.name == "r"));
    }
}
