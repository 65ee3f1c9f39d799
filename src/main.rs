use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use adsweep::classify::http::{HttpClassifierConfig, HttpTextClassifier, DEFAULT_CLASSIFIER_URL};
use adsweep::fusion::{wire, FusionEngine, TableFusionEngine};
use adsweep::pipeline::{analyze_page, export_report, resolve_request, ResolveRequest};
use adsweep::{PageReport, PageSnapshot, RenderedTree, ResolverConfig, Settings};

#[derive(Parser, Debug)]
#[command(name = "adsweep")]
#[command(version, about = "Fuse ad classifier signals and remove matching page elements without breaking layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fuse detector boxes with text classifications into ad decisions
    Fuse {
        /// Detector output (array or workflow response)
        #[arg(long)]
        detections: PathBuf,

        /// Text classifier results, index-aligned with detections
        #[arg(long)]
        texts: PathBuf,
    },

    /// Resolve ad regions against a page snapshot and remove matching nodes
    Resolve {
        /// Page snapshot JSON
        #[arg(long)]
        tree: PathBuf,

        /// Ad regions in page coordinates
        #[arg(long)]
        regions: PathBuf,

        /// Settings file holding the placeholder preference
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Resolver tuning overrides (scoring weights and thresholds)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Hide removed nodes without leaving a spacer
        #[arg(long)]
        no_placeholders: bool,

        /// Write report, debug view and mutated snapshot here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify text fragments, fuse with detections and resolve in one pass
    Analyze {
        /// Page snapshot JSON
        #[arg(long)]
        tree: PathBuf,

        /// Detector output (array or workflow response)
        #[arg(long)]
        detections: PathBuf,

        /// Text fragments extracted from the screenshot
        #[arg(long)]
        fragments: PathBuf,

        /// Text classification endpoint
        #[arg(long, env = "ADSWEEP_CLASSIFIER_URL", default_value = DEFAULT_CLASSIFIER_URL)]
        classifier_url: String,

        /// Per-request classifier timeout in seconds
        #[arg(long, default_value_t = 30)]
        classifier_timeout: u64,

        /// Settings file holding the placeholder preference
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Resolver tuning overrides (scoring weights and thresholds)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write report, debug view and mutated snapshot here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change stored settings
    Settings {
        /// Settings file
        #[arg(long)]
        file: PathBuf,

        /// Turn layout-preserving placeholders on or off
        #[arg(long, value_enum)]
        placeholders: Option<Toggle>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fuse { detections, texts } => fuse(&detections, &texts),
        Commands::Resolve {
            tree,
            regions,
            settings,
            config,
            no_placeholders,
            output,
        } => resolve(
            &tree,
            &regions,
            settings.as_deref(),
            config.as_deref(),
            no_placeholders,
            output.as_deref(),
        ),
        Commands::Analyze {
            tree,
            detections,
            fragments,
            classifier_url,
            classifier_timeout,
            settings,
            config,
            output,
        } => {
            let classifier = HttpClassifierConfig::new(classifier_url)
                .with_timeout(Duration::from_secs(classifier_timeout));
            analyze(
                &tree,
                &detections,
                &fragments,
                classifier,
                settings.as_deref(),
                config.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Commands::Settings { file, placeholders } => update_settings(&file, placeholders),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn read_json(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_tree(path: &Path) -> Result<PageSnapshot> {
    let data = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    PageSnapshot::from_json(&data).with_context(|| format!("invalid page snapshot: {}", path.display()))
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ResolverConfig> {
    match path {
        Some(path) => ResolverConfig::load(path),
        None => Ok(ResolverConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn finish(report: &PageReport, tree: &PageSnapshot, output: Option<&Path>) -> Result<()> {
    if let Some(output) = output {
        export_report(report, output)?;
        let snapshot = tree.to_json()?;
        fs::write(output.join("tree.json"), snapshot)
            .with_context(|| format!("failed to write snapshot to {}", output.display()))?;
    }
    print_json(&report.resolution)
}

fn fuse(detections: &Path, texts: &Path) -> Result<()> {
    let detections = wire::parse_detections(&read_json(detections)?);
    let texts = wire::parse_text_outcomes(&read_json(texts)?);

    let decisions = TableFusionEngine::new().fuse(&detections, &texts);
    print_json(&decisions)
}

fn resolve(
    tree_path: &Path,
    regions: &Path,
    settings: Option<&Path>,
    config: Option<&Path>,
    no_placeholders: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut settings = load_settings(settings)?;
    if no_placeholders {
        settings = settings.with_placeholders(false);
    }

    let mut tree = read_tree(tree_path)?;
    let request = ResolveRequest::from_value(&read_json(regions)?, settings)
        .with_context(|| format!("rejected region list: {}", regions.display()))?;
    let resolution = resolve_request(&mut tree, &request, load_config(config)?)
        .with_context(|| format!("rejected region list: {}", regions.display()))?;

    let report = PageReport {
        url: tree.page_url().map(str::to_string),
        viewport: tree.viewport(),
        decisions: Vec::new(),
        regions: request.regions,
        resolution,
    };
    finish(&report, &tree, output)
}

async fn analyze(
    tree_path: &Path,
    detections: &Path,
    fragments: &Path,
    classifier: HttpClassifierConfig,
    settings: Option<&Path>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let config = load_config(config)?;
    let mut tree = read_tree(tree_path)?;
    let detections = wire::parse_detections(&read_json(detections)?);
    let fragments = wire::parse_fragments(&read_json(fragments)?);

    let classifier = HttpTextClassifier::new(classifier);
    info!(url = classifier.url(), fragments = fragments.len(), "classifying text fragments");
    let report = analyze_page(
        &classifier,
        &mut tree,
        &detections,
        &fragments,
        settings,
        config,
    )
    .await
    .with_context(|| format!("failed to analyze {}", tree_path.display()))?;

    finish(&report, &tree, output)
}

fn update_settings(file: &Path, placeholders: Option<Toggle>) -> Result<()> {
    let mut settings = Settings::load(file)?;
    if let Some(toggle) = placeholders {
        settings = settings.with_placeholders(toggle == Toggle::On);
        settings.save(file)?;
    }
    print_json(&settings)
}
