use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::parser::sections::Section;
use crate::store::{Aggregate, Category};

pub const TRAINING_FILE: &str = "openscad_training_data.txt";
const CODE_FENCE: &str = "scad";

/// Order in which wiki categories appear after the cheat sheet.
const PAGE_ORDER: [Category; 4] = [
    Category::LanguageReference,
    Category::UserManual,
    Category::Tutorials,
    Category::Examples,
];

/// Flatten the aggregate into markdown-like plain text.
pub fn render(aggregate: &Aggregate) -> String {
    let mut out = String::from("# OpenSCAD Documentation Training Data\n\n");

    out.push_str("## CHEATSHEET\n\n");
    if let Some(cheatsheet) = &aggregate.cheatsheet {
        for section in &cheatsheet.sections {
            write_section(&mut out, "###", section);
        }
    }

    for category in PAGE_ORDER {
        out.push_str(&format!("## {}\n\n", category.dir_name().to_uppercase()));
        for page in aggregate.pages(category) {
            out.push_str(&format!("### {}\n\n", page.title));
            for section in &page.sections {
                write_section(&mut out, "####", section);
            }
        }
    }

    out
}

fn write_section(out: &mut String, marker: &str, section: &Section) {
    out.push_str(&format!("{} {}\n\n", marker, section.title));

    for node in section.content.iter().filter(|n| !n.text.is_empty()) {
        out.push_str(&format!("{}\n\n", node.text));
    }

    for example in &section.code_examples {
        out.push_str(&format!("```{}\n{}\n```\n\n", CODE_FENCE, example.code));
    }

    for param in &section.parameters {
        out.push_str(&format!("- {}: {}", param.name, param.description));
        if !param.param_type.is_empty() {
            out.push_str(&format!(" (Type: {})", param.param_type));
        }
        if !param.default.is_empty() {
            out.push_str(&format!(" (Default: {})", param.default));
        }
        out.push('\n');
    }
    out.push('\n');
}

pub fn write_training_file(root: &Path, aggregate: &Aggregate) -> Result<PathBuf> {
    let path = root.join(TRAINING_FILE);
    fs::write(&path, render(aggregate)).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Training data saved to {:?}", path);
    Ok(path)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::crawl::Document;
    use crate::parser::content::ContentNode;
    use crate::parser::embedded::{CodeExample, CodeKind, Parameter};

    fn node(text: &str) -> ContentNode {
        ContentNode {
            tag: "p".to_string(),
            text: text.to_string(),
            children: Vec::new(),
            heading_level: None,
            id: None,
            href: None,
        }
    }

    fn section(title: &str) -> Section {
        Section {
            title: title.to_string(),
            id: String::new(),
            content: vec![node("Creates a cube.")],
            code_examples: vec![CodeExample {
                code: "cube(10);".to_string(),
                kind: CodeKind::Block,
            }],
            parameters: vec![
                Parameter {
                    name: "size".to_string(),
                    description: "Edge length. Default: 1.".to_string(),
                    param_type: "number".to_string(),
                    default: "1".to_string(),
                },
                Parameter {
                    name: "center".to_string(),
                    description: "Centre it".to_string(),
                    param_type: String::new(),
                    default: String::new(),
                },
            ],
        }
    }

    fn aggregate() -> Aggregate {
        let page = |title: &str| Document {
            title: title.to_string(),
            url: String::new(),
            sections: vec![section("cube")],
        };
        Aggregate {
            title: "OpenSCAD Complete Documentation".to_string(),
            generated_at: Utc::now(),
            cheatsheet: Some(page("OpenSCAD Cheat Sheet")),
            user_manual: vec![page("Primitive Solids")],
            language_reference: vec![page("The OpenSCAD Language")],
            tutorials: Vec::new(),
            examples: Vec::new(),
        }
    }

    #[test]
    fn section_layout() {
        let mut out = String::new();
        write_section(&mut out, "####", &section("cube"));
        assert_eq!(
            out,
            "#### cube\n\nCreates a cube.\n\n```scad\ncube(10);\n```\n\n\
             - size: Edge length. Default: 1. (Type: number) (Default: 1)\n\
             - center: Centre it\n\n"
        );
    }

    #[test]
    fn empty_content_is_skipped() {
        let mut s = section("x");
        s.content = vec![node(""), node("kept")];
        s.code_examples.clear();
        s.parameters.clear();
        let mut out = String::new();
        write_section(&mut out, "###", &s);
        assert_eq!(out, "### x\n\nkept\n\n\n");
    }

    #[test]
    fn category_order() {
        let text = render(&aggregate());
        assert!(text.starts_with("# OpenSCAD Documentation Training Data\n\n## CHEATSHEET\n\n### cube\n\n"));
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("## LANGUAGE_REFERENCE") < pos("## USER_MANUAL"));
        assert!(pos("## USER_MANUAL") < pos("## TUTORIALS"));
        assert!(pos("## TUTORIALS") < pos("## EXAMPLES"));
        assert!(pos("### The OpenSCAD Language") < pos("### Primitive Solids"));
        assert!(text.contains("### Primitive Solids\n\n#### cube\n\n"));
    }

    #[test]
    fn missing_cheatsheet_keeps_header() {
        let mut agg = aggregate();
        agg.cheatsheet = None;
        let text = render(&agg);
        assert!(text.contains("## CHEATSHEET\n\n## LANGUAGE_REFERENCE"));
    }

    #[test]
    fn writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_training_file(tmp.path(), &aggregate()).unwrap();
        assert!(path.ends_with(TRAINING_FILE));
        assert_eq!(fs::read_to_string(path).unwrap(), render(&aggregate()));
    }
}
