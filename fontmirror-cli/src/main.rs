//! `fontmirror` CLI — inspect the catalog, mirror families, render markup.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;

use fontmirror_core::{FamilyQuery, FontMirror, HttpFetcher, MirrorConfig, MirrorError, SourceMode};
use fontmirror_fields::{
    aggregate_fields, collect_all_fields, ContentContext, ContentStore, LinkType, Renderer,
};

#[derive(Parser)]
#[command(version, about = "Mirror web font stylesheets locally")]
struct Cli {
    /// Root directory for the catalog cache, stylesheets and fonts
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Provider API key (overrides FONTMIRROR_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Font source: "local" or "remote"
    #[arg(long, global = true, value_parser = SourceMode::from_str)]
    source: Option<SourceMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every family in the catalog
    Families,
    /// Print the CSS2 request URL for a family
    Query { family: String },
    /// Mirror a family's stylesheet and font files
    Mirror {
        family: String,
        /// Re-fetch even if the stylesheet is already on disk
        #[arg(long)]
        force: bool,
    },
    /// Render stylesheet markup for a JSON field dump
    Stylesheet {
        /// Field values, or a content store dump with `objects` / `options`
        fields_json: PathBuf,
        /// "link" (default) or "style"
        #[arg(long, default_value = "link")]
        link_type: String,
        /// Content object to render (content store dumps only)
        #[arg(long)]
        post_id: Option<u64>,
    },
}

fn config_from(cli: &Cli) -> MirrorConfig {
    let mut config = MirrorConfig::from_env();
    if let Some(root) = &cli.root {
        config.root_dir = root.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(source) = cli.source {
        config.source = source;
    }
    config
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = config_from(&cli);
    info!("fontmirror root: {}", config.root_dir.display());

    let mirror = FontMirror::new(config, HttpFetcher::new());
    if let Err(e) = run(&cli.command, &mirror) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: &Command, mirror: &FontMirror<HttpFetcher>) -> Result<(), MirrorError> {
    match command {
        Command::Families => {
            for family in mirror.family_names() {
                println!("{family}");
            }
        }
        Command::Query { family } => {
            let entry = mirror
                .entry(family)
                .ok_or_else(|| MirrorError::UnknownFamily(family.clone()))?;
            println!("{}", FamilyQuery::for_entry(&entry).url(&mirror.config().css2_url));
        }
        Command::Mirror { family, force: true } => {
            let report = mirror.mirror_family(family)?;
            println!("{}", report.stylesheet.display());
            println!(
                "downloaded {}, reused {}, rewritten {} lines",
                report.downloaded, report.reused, report.lines_rewritten
            );
            for url in &report.failed {
                eprintln!("Warning: still remote: {url}");
            }
        }
        Command::Mirror { family, force: false } => {
            let path = mirror.try_stylesheet(family)?;
            println!("{}", path.display());
        }
        Command::Stylesheet { fields_json, link_type, post_id } => {
            let json: Value = serde_json::from_str(&fs::read_to_string(fields_json)?)?;
            let is_store = json
                .as_object()
                .is_some_and(|map| map.contains_key("objects") || map.contains_key("options"));
            let fields = if is_store {
                let store: ContentStore = serde_json::from_value(json)?;
                let ctx = ContentContext::site().with_override(*post_id);
                collect_all_fields(&store, ctx)
            } else {
                vec![json]
            };
            let link_type: LinkType = link_type.parse().unwrap_or_default();
            let markup = Renderer::new(mirror).stylesheet_markup(&aggregate_fields(&fields), link_type);
            println!("{markup}");
        }
    }
    Ok(())
}
