mod crawl;
mod error;
mod fetch;
mod markup;
mod parser;
mod settings;
mod store;
mod training;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crawl::{CrawlContext, VisitedSet};
use fetch::HttpFetcher;
use settings::{Settings, SiteProfile};
use store::Category;

const OUTPUT_DIR: &str = "openscad_docs";

#[derive(Parser)]
#[command(name = "scad_docs", about = "Scrape the OpenSCAD documentation into JSON and training text")]
struct Cli {
    /// Output directory
    #[arg(long, default_value = OUTPUT_DIR)]
    output: PathBuf,
    /// Skip scraping the cheat sheet
    #[arg(long)]
    skip_cheatsheet: bool,
    /// Skip scraping the wiki pages
    #[arg(long)]
    skip_wiki: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load();
    let profile = SiteProfile::default();
    info!(settings = ?settings, "Starting documentation scrape");

    store::setup_directories(&cli.output)?;
    let mut fetcher = HttpFetcher::new(&settings)?;
    let ctx = CrawlContext::new(&profile, &settings.wiki_base, settings.max_depth)?;

    if !cli.skip_cheatsheet {
        if let Some(doc) = crawl::scrape_cheatsheet(&mut fetcher, &settings.cheatsheet_url, &ctx) {
            let path = store::save_document(&cli.output, Category::Cheatsheet, &doc)?;
            println!("Cheat sheet: {} sections -> {}", doc.sections.len(), path.display());
        }
    }

    if !cli.skip_wiki {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} pages {wide_msg}")?,
        );
        pb.enable_steady_tick(Duration::from_millis(120));

        let mut visited = VisitedSet::new();
        let output = cli.output.clone();
        let stats = crawl::crawl_wiki(
            &mut fetcher,
            &settings.manual_url,
            &mut visited,
            &ctx,
            |doc| {
                let category = Category::for_title(&doc.title, Category::UserManual);
                store::save_document(&output, category, doc)?;
                pb.inc(1);
                pb.set_message(doc.title.clone());
                Ok(())
            },
        )?;
        pb.finish_and_clear();
        println!(
            "Wiki: {} pages fetched ({} saved, {} skipped), {} paths visited.",
            stats.fetched,
            stats.saved,
            stats.skipped,
            visited.len()
        );
    }

    let (aggregate, merged) = store::merge(&cli.output)?;
    let training = training::write_training_file(&cli.output, &aggregate)?;
    println!("Merged documentation: {}", merged.display());
    println!("Training data:        {}", training.display());

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
