use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use profile_archive::{
    BrowserlessRenderer, ExtractorSet, HttpPageClient, PageRenderer, PlatformClassifier,
    PlatformRules, RoutingMode,
};
use profile_common::{DirectoryRow, HarvestConfig, PlatformTag, ProfileRecord, SkipRecord};
use profile_harvest::orchestrator::{FetchOrchestrator, PassOptions, PassReport};
use profile_harvest::policy::{self, RescrapeHoldPolicy};
use profile_harvest::{filter, ingest, merge, report, store, style_join, tagging, triage};

#[derive(Parser)]
#[command(name = "profile-harvest", about = "Acquire and enrich profile documents")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Command,
}

/// CLI values win over environment values.
#[derive(Args)]
struct ConfigOverrides {
    /// Minimum word-count gain for fetched text to replace stored text
    #[arg(long, global = true)]
    min_gain: Option<usize>,

    /// Politeness delay between requests, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Browserless base URL for headless rendering
    #[arg(long, global = true)]
    browserless_url: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut HarvestConfig) {
        if let Some(v) = self.min_gain {
            config.min_gain = v;
        }
        if let Some(v) = self.delay_ms {
            config.request_delay_ms = v;
        }
        if let Some(v) = self.timeout_secs {
            config.timeout_secs = v;
        }
        if let Some(v) = self.browserless_url {
            config.browserless_url = Some(v);
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Assign ids to directory rows and fold them into the canonical store
    IngestDirectory {
        #[arg(long)]
        rows: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Existing store whose enriched fields are preserved
        #[arg(long)]
        existing: Option<PathBuf>,
        /// Bucket file of closed profiles (repeatable); their rows are not re-added
        #[arg(long = "bucket")]
        buckets: Vec<PathBuf>,
        #[arg(long)]
        skipped: Option<PathBuf>,
    },
    /// Fetch document text for every record
    FetchDetails {
        #[command(flatten)]
        io: PassIo,
        /// Write each raw body to <dir>/profile_<id>.html
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },
    /// Re-fetch records whose text is shorter than --min-words
    RescrapeShort {
        #[command(flatten)]
        io: PassIo,
        #[arg(long, default_value_t = 100)]
        min_words: usize,
    },
    /// Re-fetch records on client-rendered platforms through the headless renderer
    RescrapeJs {
        #[command(flatten)]
        io: PassIo,
        #[arg(long)]
        min_words: Option<usize>,
        /// Render every selected record, whatever its platform
        #[arg(long)]
        render_all: bool,
        /// Platforms that need rendering (repeatable)
        #[arg(long = "platform", value_parser = parse_platform, default_value = "notion")]
        platforms: Vec<PlatformTag>,
    },
    /// Merge an updates store into a base store by id, through the merge gate
    MergeFulltext {
        #[arg(long)]
        base: PathBuf,
        #[arg(long)]
        updates: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write profiles_accessible.json without the rows listed in profiles_skipped.json
    FilterUnusable { base_dir: PathBuf },
    /// Close a profile: move it from the active store into a bucket file
    MoveToBucket {
        #[arg(long)]
        id: String,
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        bucket: PathBuf,
        #[arg(long)]
        reason: String,
        /// Where to write the updated source (default: in place)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Set docPlatform on every record and print per-platform counts
    TagPlatform {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Join dating-style rows into the store by canonical profile URL
    JoinStyle {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        styles: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List records that improved between two stores
    ReportChanges {
        before: PathBuf,
        after: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args)]
struct PassIo {
    #[arg(long)]
    input: PathBuf,
    /// Output store (default: in place)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Skip ledger path (default: <out>_skipped.json)
    #[arg(long)]
    skipped: Option<PathBuf>,
}

impl PassIo {
    fn out(&self) -> &Path {
        self.out.as_deref().unwrap_or(&self.input)
    }

    fn skipped(&self) -> PathBuf {
        self.skipped
            .clone()
            .unwrap_or_else(|| sibling_with_suffix(self.out(), "_skipped"))
    }
}

fn parse_platform(s: &str) -> Result<PlatformTag, String> {
    PlatformTag::from_str_opt(s).ok_or_else(|| format!("unknown platform tag: {s}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let mut config = HarvestConfig::from_env()?;
    cli.overrides.apply(&mut config);
    config.log_redacted();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the last completed row");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::IngestDirectory {
            rows,
            out,
            existing,
            buckets,
            skipped,
        } => {
            let rows: Vec<DirectoryRow> = store::load_json(&rows)?;
            let existing = match existing {
                Some(path) => store::load_store(&path)?,
                None => Vec::new(),
            };
            let buckets = buckets
                .iter()
                .map(|path| store::load_json_or_empty::<ProfileRecord>(path))
                .collect::<Result<Vec<_>, _>>()?;
            let outcome = ingest::ingest(rows, existing, &ingest::closed_ids(&buckets));
            store::write_json(&out, &outcome.records)?;
            if let Some(path) = skipped {
                outcome.ledger.save(&path)?;
            }
            println!(
                "Ingest: {} added, {} refreshed, {} closed, {} rejected, {} total",
                outcome.added,
                outcome.refreshed,
                outcome.closed,
                outcome.ledger.len(),
                outcome.records.len()
            );
        }

        Command::FetchDetails { io, raw_dir } => {
            let mut records = store::load_store(&io.input)?;
            let extractors =
                build_extractors(&config, PlatformRules::standard(), RoutingMode::ByPlatform)?;
            let mut options = pass_options(&config);
            options.raw_dir = raw_dir;
            let all: Vec<usize> = (0..records.len()).collect();
            let report = run_pass(&extractors, options, &cancel, &mut records, &all).await;
            finish_pass(&io, &records, &report)?;
        }

        Command::RescrapeShort { io, min_words } => {
            let mut records = store::load_store(&io.input)?;
            let selection =
                policy::select_short(&records, min_words, &RescrapeHoldPolicy::standard());
            info!(
                selected = selection.indices.len(),
                held = selection.held,
                min_words,
                "Selected short profiles"
            );
            println!("Held by policy (not rescraped): {}", selection.held);
            let extractors =
                build_extractors(&config, PlatformRules::standard(), RoutingMode::ByPlatform)?;
            let report = run_pass(
                &extractors,
                pass_options(&config),
                &cancel,
                &mut records,
                &selection.indices,
            )
            .await;
            finish_pass(&io, &records, &report)?;
        }

        Command::RescrapeJs {
            io,
            min_words,
            render_all,
            platforms,
        } => {
            let mut records = store::load_store(&io.input)?;
            let rules = PlatformRules::standard().with_render_platforms(platforms);
            let mode = if render_all {
                RoutingMode::RenderAll
            } else {
                RoutingMode::ByPlatform
            };
            let extractors = build_extractors(&config, rules, mode)?;
            let selection = if render_all {
                policy::select_render_all(&records, min_words, &RescrapeHoldPolicy::standard())
            } else {
                policy::select_render(&records, extractors.classifier(), min_words)
            };
            info!(
                selected = selection.indices.len(),
                held = selection.held,
                render_all,
                "Selected profiles for rendering"
            );
            let report = run_pass(
                &extractors,
                pass_options(&config),
                &cancel,
                &mut records,
                &selection.indices,
            )
            .await;
            finish_pass(&io, &records, &report)?;
        }

        Command::MergeFulltext { base, updates, out } => {
            let mut records = store::load_store(&base)?;
            let updates: Vec<ProfileRecord> = store::load_json(&updates)?;
            let stats = merge::merge_by_id(&mut records, &updates, config.min_gain, Utc::now());
            store::write_json(&out, &records)?;
            println!("{stats}");
        }

        Command::FilterUnusable { base_dir } => {
            let records = store::load_store(&base_dir.join("profiles.json"))?;
            let skipped_path = base_dir.join("profiles_skipped.json");
            let skipped: Vec<SkipRecord> = if skipped_path.exists() {
                store::load_json(&skipped_path)?
            } else {
                warn!(path = %skipped_path.display(), "No skip ledger, keeping every profile");
                Vec::new()
            };
            let (kept, dropped) = filter::filter_unusable(records, &skipped);
            store::write_json(&base_dir.join("profiles_accessible.json"), &kept)?;
            println!("Filter: {} kept, {} dropped", kept.len(), dropped);
        }

        Command::MoveToBucket {
            id,
            source,
            bucket,
            reason,
            out,
            dry_run,
        } => {
            let outcome = triage::move_in_files(
                &id,
                &source,
                &bucket,
                out.as_deref(),
                &reason,
                Utc::now(),
                dry_run,
            )?;
            if outcome.duplicate_in_bucket {
                println!("Warning: {id} was already in {}; not duplicated", bucket.display());
            }
            let verb = if dry_run { "Dry run: would move" } else { "Moved" };
            println!(
                "{verb} {id}: {} active, {} in bucket",
                outcome.source_len, outcome.bucket_len
            );
        }

        Command::TagPlatform { input, out } => {
            let mut records = store::load_store(&input)?;
            let classifier = PlatformClassifier::new(PlatformRules::standard());
            let counts = tagging::tag_platforms(&mut records, &classifier);
            store::write_json(out.as_deref().unwrap_or(&input), &records)?;
            for (tag, n) in tagging::ranked(&counts) {
                println!("{n:>6}  {tag}");
            }
        }

        Command::JoinStyle { input, styles, out } => {
            let mut records = store::load_store(&input)?;
            let rows: Vec<style_join::StyleRow> = store::load_json(&styles)?;
            let report = style_join::join_styles(&mut records, &rows);
            store::write_json(out.as_deref().unwrap_or(&input), &records)?;
            println!("{report}");
            for url in &report.unmatched {
                println!("  unmatched: {url}");
            }
        }

        Command::ReportChanges { before, after, out } => {
            let before: Vec<ProfileRecord> = store::load_json(&before)?;
            let after: Vec<ProfileRecord> = store::load_json(&after)?;
            let rows = report::report_changes(&before, &after, config.min_gain);
            store::write_json(&out, &rows)?;
            println!("{} changed profiles written to {}", rows.len(), out.display());
            for row in rows.iter().take(10) {
                println!(
                    "  {} | {:+} words | {} | {}",
                    row.id,
                    row.delta_words,
                    row.doc_platform.map(|t| t.as_str()).unwrap_or("-"),
                    row.profile_url.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("profile_harvest=info".parse()?)
        .add_directive("profile_archive=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn build_extractors(
    config: &HarvestConfig,
    rules: PlatformRules,
    mode: RoutingMode,
) -> Result<ExtractorSet> {
    let client = HttpPageClient::new(config).context("Failed to build HTTP client")?;
    let renderer =
        BrowserlessRenderer::from_config(config).context("Failed to build render client")?;
    if renderer.is_none() {
        warn!("BROWSERLESS_URL not set, render platforms will be skipped as unsupported");
    }
    Ok(ExtractorSet::new(
        PlatformClassifier::new(rules),
        Arc::new(client),
        renderer.map(|r| Arc::new(r) as Arc<dyn PageRenderer>),
        config.timeout(),
    )
    .with_mode(mode))
}

fn pass_options(config: &HarvestConfig) -> PassOptions {
    PassOptions::builder()
        .delay(config.request_delay())
        .min_gain(config.min_gain)
        .row_timeout(row_timeout(config))
        .build()
}

/// Covers shortener expansion, one plain fetch and both render attempts.
fn row_timeout(config: &HarvestConfig) -> Duration {
    config.timeout() * 2 + (config.render_timeout() + config.render_settle()) * 2
}

async fn run_pass(
    extractors: &ExtractorSet,
    options: PassOptions,
    cancel: &CancellationToken,
    records: &mut [ProfileRecord],
    indices: &[usize],
) -> PassReport {
    FetchOrchestrator::new(extractors, options)
        .with_cancellation(cancel.clone())
        .run(policy::subset_mut(records, indices))
        .await
}

/// Write the store and ledger once, at the end of the pass, interrupted or not.
fn finish_pass(io: &PassIo, records: &[ProfileRecord], report: &PassReport) -> Result<()> {
    store::write_json(io.out(), records)?;
    report.ledger.save(&io.skipped())?;
    println!("{}", report.summary);
    if report.interrupted {
        println!("Pass interrupted; store reflects the last completed row.");
    }
    Ok(())
}

/// `dir/profiles.json` + `_skipped` → `dir/profiles_skipped.json`.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profiles".to_string());
    path.with_file_name(format!("{stem}{suffix}.json"))
}
