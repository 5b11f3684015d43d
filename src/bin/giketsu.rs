//! CLI binary for giketsu.
//!
//! A thin shim over the library crate: each subcommand maps its flags to a
//! library call and prints a summary on stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use giketsu::links::{build_link_map, merge_links, suggest_links, SuggestReport};
use giketsu::{
    classify, crawl_to_file, extract, CrawlConfig, CrawlProgressCallback, ProgressCallback,
    ThemeConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar for `scrape`: a spinner while the year pages are walked,
/// then one tick per document.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Discovering");
        bar.set_message("Reading index and year pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Parsing");
        self.bar.reset_eta();
    }
}

impl CrawlProgressCallback for CliProgressCallback {
    fn on_crawl_start(&self, year_pages: usize, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "{total_documents} documents found across {year_pages} year pages"
            ))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, session_name: &str) {
        self.bar.set_message(session_name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, item_count: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{item_count:>3} items")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_crawl_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} documents parsed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents parsed  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Crawl every session and write the index
  giketsu scrape -o public/data/giketsu_index.json

  # Check how one PDF comes out
  giketsu extract https://www.shintoku-town.jp/.../r7_teirei1.pdf

  # Try the classifier on a title
  giketsu classify "地域医療の確保を求める意見書"

  # Link workflow
  giketsu suggest           # → data/gikai_links_suggested.csv (review it)
  giketsu merge             # append reviewed rows to data/gikai_links.csv
  giketsu build             # → public/data/gikai_links.json

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. giketsu=debug)
  GIKETSU_INDEX_URL       Index page listing the year pages
  GIKETSU_INDEX_FILE      Session index JSON path
  GIKETSU_LINKS_MASTER    Reviewed link CSV
  GIKETSU_LINKS_SUGGESTED Suggestion CSV
  GIKETSU_LINKS_JSON      Compiled link map
  GIKETSU_THEMES          Theme table JSON overriding the built-in one
"#;

/// Extract council resolutions from 議決結果 PDFs and tag them with themes.
#[derive(Parser, Debug)]
#[command(
    name = "giketsu",
    version,
    about = "Extract council resolutions from 議決結果 PDFs and tag them with themes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GIKETSU_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "GIKETSU_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every session PDF and write the session index JSON.
    Scrape(ScrapeArgs),
    /// Parse one PDF (path or URL) and print its items as JSON.
    Extract(ExtractArgs),
    /// Classify titles given as arguments, or one per line on stdin.
    Classify(ClassifyArgs),
    /// Regenerate the suggestion CSV from the session index.
    Suggest(SuggestArgs),
    /// Append reviewed suggestions to the master link CSV.
    Merge(MergeArgs),
    /// Compile the master link CSV into the JSON lookup map.
    Build(BuildArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Index page listing the year pages.
    #[arg(long, env = "GIKETSU_INDEX_URL", default_value = giketsu::config::DEFAULT_INDEX_URL)]
    index_url: String,

    /// Timeout for the index and year pages, in seconds.
    #[arg(long, env = "GIKETSU_INDEX_TIMEOUT", default_value_t = 30)]
    index_timeout: u64,

    /// Timeout per PDF download, in seconds.
    #[arg(long, env = "GIKETSU_PDF_TIMEOUT", default_value_t = 120)]
    pdf_timeout: u64,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Where to write the session index.
    #[arg(
        short,
        long,
        env = "GIKETSU_INDEX_FILE",
        default_value = "public/data/giketsu_index.json"
    )]
    output: PathBuf,

    /// Documents fetched at once. Output order does not depend on it.
    #[arg(short, long, env = "GIKETSU_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Disable the progress bar.
    #[arg(long, env = "GIKETSU_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Local PDF path or HTTP/HTTPS URL.
    input: String,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Titles to classify. Reads stdin when empty.
    titles: Vec<String>,

    /// Theme table JSON overriding the built-in one.
    #[arg(long, env = "GIKETSU_THEMES")]
    themes: Option<PathBuf>,

    /// Print the full classification (winners and rejections) as JSON lines.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Session index written by `scrape`.
    #[arg(long, env = "GIKETSU_INDEX_FILE", default_value = "public/data/giketsu_index.json")]
    index: PathBuf,

    /// Reviewed link CSV; keys already in it are not suggested again.
    #[arg(long, env = "GIKETSU_LINKS_MASTER", default_value = "data/gikai_links.csv")]
    master: PathBuf,

    /// Suggestion CSV to (re)generate.
    #[arg(
        short,
        long,
        env = "GIKETSU_LINKS_SUGGESTED",
        default_value = "data/gikai_links_suggested.csv"
    )]
    output: PathBuf,

    /// Theme table JSON overriding the built-in one.
    #[arg(long, env = "GIKETSU_THEMES")]
    themes: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[arg(long, env = "GIKETSU_LINKS_MASTER", default_value = "data/gikai_links.csv")]
    master: PathBuf,

    #[arg(
        long,
        env = "GIKETSU_LINKS_SUGGESTED",
        default_value = "data/gikai_links_suggested.csv"
    )]
    suggested: PathBuf,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[arg(long, env = "GIKETSU_LINKS_MASTER", default_value = "data/gikai_links.csv")]
    master: PathBuf,

    #[arg(
        short,
        long,
        env = "GIKETSU_LINKS_JSON",
        default_value = "public/data/gikai_links.json"
    )]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would tear the progress bar; keep them at error
    // while it is shown.
    let show_progress = match &cli.command {
        Command::Scrape(args) => !cli.quiet && !args.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Scrape(args) => run_scrape(args, show_progress, cli.quiet).await,
        Command::Extract(args) => run_extract(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Suggest(args) => run_suggest(args, cli.quiet),
        Command::Merge(args) => run_merge(args, cli.quiet),
        Command::Build(args) => run_build(args, cli.quiet),
    }
}

/// Map fetch flags to `CrawlConfig`.
fn build_config(
    fetch: &FetchArgs,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> Result<CrawlConfig> {
    let mut builder = CrawlConfig::builder()
        .index_url(&fetch.index_url)
        .index_timeout_secs(fetch.index_timeout)
        .pdf_timeout_secs(fetch.pdf_timeout)
        .concurrency(concurrency);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn load_themes(path: Option<&Path>) -> Result<ThemeConfig> {
    match path {
        Some(p) => ThemeConfig::from_json_file(p)
            .with_context(|| format!("Failed to load theme table from {}", p.display())),
        None => Ok(ThemeConfig::default()),
    }
}

async fn run_scrape(args: ScrapeArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn CrawlProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.fetch, args.concurrency, progress_cb)?;

    let output = crawl_to_file(&args.output, &config)
        .await
        .context("Scrape failed")?;

    if !quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} year pages ({} failed)  {}/{} documents  {}ms  →  {}",
            if stats.documents_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.year_pages,
            stats.year_pages_failed,
            stats.documents_succeeded,
            stats.documents_found,
            stats.total_duration_ms,
            bold(&args.output.display().to_string()),
        );
        eprintln!(
            "   {} items  /  {} without title  /  {} cross-session duplicates dropped",
            stats.total_items, stats.empty_titles, stats.duplicate_items_dropped
        );
        for failure in &output.failures {
            eprintln!("   {} {}", red("✗"), failure);
        }
    }
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let config = build_config(&args.fetch, 1, None)?;
    let parsed = extract(&args.input, &config)
        .await
        .with_context(|| format!("Failed to extract {}", args.input))?;

    let json = serde_json::to_string_pretty(&parsed).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let themes = load_themes(args.themes.as_deref())?;

    let titles: Vec<String> = if args.titles.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read titles from stdin")?
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    } else {
        args.titles
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for title in &titles {
        let result = classify(title, &themes);
        if args.json {
            let line = serde_json::json!({ "title": title, "classification": result });
            writeln!(out, "{line}").context("Failed to write to stdout")?;
        } else {
            let refs: Vec<String> = result
                .winners
                .iter()
                .map(|m| format!("{}({})", m.reference(), m.score))
                .collect();
            let tag = if refs.is_empty() {
                "-".to_string()
            } else {
                refs.join(" ")
            };
            writeln!(out, "{tag}\t{title}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn run_suggest(args: SuggestArgs, quiet: bool) -> Result<()> {
    let themes = load_themes(args.themes.as_deref())?;
    let report = suggest_links(&args.index, &args.master, &args.output, &themes)
        .context("Suggest failed")?;

    if !quiet {
        print_suggest_report(&report, &args.output);
    }
    Ok(())
}

fn print_suggest_report(report: &SuggestReport, output: &Path) {
    eprintln!(
        "{}  {} rows suggested  →  {}",
        green("✔"),
        bold(&report.adopted.to_string()),
        bold(&output.display().to_string())
    );
    eprintln!(
        "   {} below threshold  /  {} score-1 not on allow-list ({} weak)  /  {} multi-theme",
        report.below_threshold,
        report.allowlist_excluded,
        report.weak_excluded,
        report.multi_theme_items
    );
    eprintln!(
        "   {} already in master  /  {} without title",
        report.skipped_existing, report.empty_titles
    );
    for (theme, tally) in &report.per_theme {
        eprintln!(
            "   {:<12} {:>4}  {}",
            theme,
            tally.adopted,
            dim(&format!("score-1: {}", tally.score1))
        );
    }
    for (keyword, count) in &report.weak_keyword_counts {
        eprintln!("   {}", dim(&format!("weak '{keyword}': {count}")));
    }
}

fn run_merge(args: MergeArgs, quiet: bool) -> Result<()> {
    let report = merge_links(&args.master, &args.suggested).context("Merge failed")?;
    if !quiet {
        eprintln!(
            "{}  {} appended  /  {} skipped  /  {} invalid  →  {}",
            if report.invalid == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&report.appended.to_string()),
            report.skipped,
            report.invalid,
            bold(&args.master.display().to_string()),
        );
    }
    Ok(())
}

fn run_build(args: BuildArgs, quiet: bool) -> Result<()> {
    let report = build_link_map(&args.master, &args.output).context("Build failed")?;
    if !quiet {
        eprintln!(
            "{}  {} keys  /  {} refs  →  {}",
            green("✔"),
            bold(&report.keys.to_string()),
            report.refs,
            bold(&args.output.display().to_string()),
        );
    }
    Ok(())
}
