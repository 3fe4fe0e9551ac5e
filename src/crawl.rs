use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::fetch::Fetch;
use crate::markup::{self, Element};
use crate::parser::sections::{Section, Segmenter};
use crate::parser::segment_page;
use crate::settings::SiteProfile;

/// One fetched page, split into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub sections: Vec<Section>,
}

/// URL paths already scheduled for fetching during one crawl. Only grows.
#[derive(Debug, Default)]
pub struct VisitedSet {
    paths: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Returns `false` if `path` was already present.
    pub fn insert(&mut self, path: &str) -> bool {
        self.paths.insert(path.to_string())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

/// What every page strategy needs besides the fetcher.
pub struct CrawlContext<'a> {
    pub profile: &'a SiteProfile,
    /// Relative links are resolved against this.
    pub base: Url,
    pub max_depth: usize,
}

impl<'a> CrawlContext<'a> {
    pub fn new(profile: &'a SiteProfile, base: &str, max_depth: usize) -> Result<Self, ScrapeError> {
        let base = Url::parse(base).map_err(|e| ScrapeError::invalid_url(base, e))?;
        Ok(CrawlContext {
            profile,
            base,
            max_depth,
        })
    }
}

pub struct CrawlStats {
    pub fetched: usize,
    pub saved: usize,
    pub skipped: usize,
}

// ── Flat single-page strategy ──

/// Fetch the cheat sheet. A failed fetch is logged and yields `None`.
pub fn scrape_cheatsheet<F: Fetch>(fetcher: &mut F, url: &str, ctx: &CrawlContext<'_>) -> Option<Document> {
    info!("Scraping cheat sheet from {}", url);
    match fetcher.fetch(url) {
        Ok(html) => Some(parse_cheatsheet(&html, url, ctx)),
        Err(e) => {
            warn!("Skipping cheat sheet: {}", e);
            None
        }
    }
}

/// Every `<h2>` in the page opens a section that runs to the next `<h2>`.
pub fn parse_cheatsheet(html: &str, url: &str, ctx: &CrawlContext<'_>) -> Document {
    let root = markup::parse(html);
    let segmenter = Segmenter::flat(ctx.profile, ctx.max_depth);
    Document {
        title: ctx.profile.cheatsheet_title.clone(),
        url: url.to_string(),
        sections: segment_page(&root, &segmenter),
    }
}

// ── Recursive multi-page strategy ──

pub struct WikiPage {
    pub document: Document,
    /// Absolute URLs of followable links, in document order.
    pub links: Vec<String>,
}

/// Crawl the wiki depth-first from `start_url`, handing each page to
/// `persist` before any of its links are visited.
///
/// Pages are taken from an explicit stack; a page's links are pushed in
/// reverse so they pop in document order, which visits pages in the same
/// order as following each link recursively. The visited set is the only
/// termination guarantee: a path is marked before it is fetched and is never
/// fetched again.
pub fn crawl_wiki<F, P>(
    fetcher: &mut F,
    start_url: &str,
    visited: &mut VisitedSet,
    ctx: &CrawlContext<'_>,
    mut persist: P,
) -> Result<CrawlStats>
where
    F: Fetch,
    P: FnMut(&Document) -> Result<()>,
{
    let mut stats = CrawlStats {
        fetched: 0,
        saved: 0,
        skipped: 0,
    };
    let mut pending = vec![start_url.to_string()];

    while let Some(url) = pending.pop() {
        let path = match Url::parse(&url) {
            Ok(u) => u.path().to_string(),
            Err(e) => {
                warn!("Skipping {}: {}", url, ScrapeError::invalid_url(&url, e));
                stats.skipped += 1;
                continue;
            }
        };
        if !visited.insert(&path) {
            continue;
        }

        info!("Scraping wiki page: {}", url);
        stats.fetched += 1;
        let html = match fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                stats.skipped += 1;
                continue;
            }
        };

        let page = match parse_wiki_page(&html, &url, visited, ctx) {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                stats.skipped += 1;
                continue;
            }
        };

        debug!(
            "{}: {} sections, {} links",
            page.document.title,
            page.document.sections.len(),
            page.links.len()
        );
        persist(&page.document)?;
        stats.saved += 1;
        pending.extend(page.links.into_iter().rev());
    }

    Ok(stats)
}

/// Extract one wiki page: title, nested sections and followable links.
pub fn parse_wiki_page(
    html: &str,
    url: &str,
    visited: &VisitedSet,
    ctx: &CrawlContext<'_>,
) -> Result<WikiPage, ScrapeError> {
    let profile = ctx.profile;
    let root = markup::parse(html);

    let container = root
        .find_by_id(&profile.content_container_id)
        .ok_or_else(|| ScrapeError::MissingContentContainer {
            url: url.to_string(),
            container: profile.content_container_id.clone(),
        })?;

    let title = root
        .find_by_id(&profile.title_heading_id)
        .filter(|h| h.is("h1"))
        .map(|h| h.text().trim().to_string())
        .unwrap_or_else(|| fallback_title(url));

    let segmenter = Segmenter::nested(profile, ctx.max_depth);
    let sections = segment_page(container, &segmenter);
    let links = discover_links(container, visited, ctx);

    Ok(WikiPage {
        document: Document {
            title,
            url: url.to_string(),
            sections,
        },
        links,
    })
}

fn discover_links(container: &Element, visited: &VisitedSet, ctx: &CrawlContext<'_>) -> Vec<String> {
    container
        .walk()
        .filter(|el| el.is("a"))
        .filter_map(|a| a.attr("href"))
        .filter(|href| is_followable(href, visited, ctx.profile))
        .filter_map(|href| match ctx.base.join(href) {
            Ok(mut u) => {
                u.set_fragment(None);
                Some(u.to_string())
            }
            Err(e) => {
                debug!("Unresolvable link {}: {}", href, e);
                None
            }
        })
        .collect()
}

/// Same-site content link that is neither visited nor excluded.
pub fn is_followable(href: &str, visited: &VisitedSet, profile: &SiteProfile) -> bool {
    if !href.starts_with(&profile.link_prefix) {
        return false;
    }
    let path = href.split(|c: char| c == '#' || c == '?').next().unwrap_or(href);
    if visited.contains(path) {
        return false;
    }
    !profile
        .link_exclusions
        .iter()
        .any(|pattern| href.contains(pattern.as_str()))
}

/// Last path segment, used when a page has no title heading.
fn fallback_title(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

// ── Tests ──
