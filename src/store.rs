use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crawl::Document;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]+").unwrap());

pub const AGGREGATE_FILE: &str = "openscad_complete_documentation.json";
const AGGREGATE_TITLE: &str = "OpenSCAD Complete Documentation";
const CHEATSHEET_FILE: &str = "cheatsheet.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cheatsheet,
    UserManual,
    LanguageReference,
    Tutorials,
    Examples,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cheatsheet,
        Category::UserManual,
        Category::LanguageReference,
        Category::Tutorials,
        Category::Examples,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Cheatsheet => "cheatsheet",
            Category::UserManual => "user_manual",
            Category::LanguageReference => "language_reference",
            Category::Tutorials => "tutorials",
            Category::Examples => "examples",
        }
    }

    /// Route a wiki page by keywords in its title.
    pub fn for_title(title: &str, fallback: Category) -> Category {
        if title.contains("Tutorial") {
            Category::Tutorials
        } else if title.contains("Language") {
            Category::LanguageReference
        } else if title.contains("Example") {
            Category::Examples
        } else {
            fallback
        }
    }
}

/// All scraped documents merged into one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub cheatsheet: Option<Document>,
    pub user_manual: Vec<Document>,
    pub language_reference: Vec<Document>,
    pub tutorials: Vec<Document>,
    pub examples: Vec<Document>,
}

impl Aggregate {
    pub fn pages(&self, category: Category) -> &[Document] {
        match category {
            Category::Cheatsheet => self.cheatsheet.as_slice(),
            Category::UserManual => &self.user_manual,
            Category::LanguageReference => &self.language_reference,
            Category::Tutorials => &self.tutorials,
            Category::Examples => &self.examples,
        }
    }
}

/// Create the output root and one directory per category.
pub fn setup_directories(root: &Path) -> Result<()> {
    for category in Category::ALL {
        let dir = root.join(category.dir_name());
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    Ok(())
}

/// "OpenSCAD User Manual/The OpenSCAD Language" -> "openscad_user_manual_the_openscad_language"
pub fn file_stem(title: &str) -> String {
    NON_WORD_RE.replace_all(title, "_").to_lowercase()
}

pub fn save_document(root: &Path, category: Category, doc: &Document) -> Result<PathBuf> {
    let name = match category {
        Category::Cheatsheet => CHEATSHEET_FILE.to_string(),
        _ => format!("{}.json", file_stem(&doc.title)),
    };
    let path = root.join(category.dir_name()).join(name);
    write_json(&path, doc)?;
    info!("Saved {} to {:?}", doc.title, path);
    Ok(path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

fn load_document(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed document {:?}", path))
}

/// `*.json` files of one category directory, sorted by name. A missing
/// directory has no documents.
fn category_files(root: &Path, category: Category) -> Result<Vec<PathBuf>> {
    let dir = root.join(category.dir_name());
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("Failed to list {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_category(root: &Path, category: Category) -> Result<Vec<Document>> {
    category_files(root, category)?
        .par_iter()
        .map(|p| load_document(p))
        .collect()
}

/// Read every saved document back from disk into one [`Aggregate`].
pub fn collect(root: &Path) -> Result<Aggregate> {
    Ok(Aggregate {
        title: AGGREGATE_TITLE.to_string(),
        generated_at: Utc::now(),
        cheatsheet: load_category(root, Category::Cheatsheet)?.pop(),
        user_manual: load_category(root, Category::UserManual)?,
        language_reference: load_category(root, Category::LanguageReference)?,
        tutorials: load_category(root, Category::Tutorials)?,
        examples: load_category(root, Category::Examples)?,
    })
}

/// Merge all per-document files into the aggregate JSON file.
pub fn merge(root: &Path) -> Result<(Aggregate, PathBuf)> {
    let aggregate = collect(root)?;
    let path = root.join(AGGREGATE_FILE);
    write_json(&path, &aggregate)?;
    info!("Complete documentation saved to {:?}", path);
    Ok((aggregate, path))
}

// ── Tests ──
