pub mod content;
pub mod embedded;
pub mod sections;

use crate::markup::Element;
use sections::{Section, Segmenter};

/// Two-pass pipeline: markup → heading anchors → sections.
pub fn segment_page(root: &Element, segmenter: &Segmenter<'_>) -> Vec<Section> {
    let anchors = segmenter.find_anchors(root);
    segmenter.segment_sections(&anchors)
}
