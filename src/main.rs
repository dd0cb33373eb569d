mod config;
mod error;
mod parser;
mod record;
mod tree;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::{ExtractArgs, ExtractConfig};
use record::{ExtractionRecord, Outcome, PageCapture};

#[derive(Parser)]
#[command(
    name = "policy_section",
    about = "Extract the section between two marker headings of a rendered page as Markdown"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one page capture (JSON tree) to Markdown
    Convert {
        /// Capture file (default: stdin)
        file: Option<PathBuf>,
        /// Print the full extraction record as JSON instead of bare Markdown
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Convert every *.json capture in a directory, in parallel
    Batch {
        /// Directory holding page captures
        input: PathBuf,
        /// Directory receiving one <name>.md per capture
        #[arg(short, long)]
        out: PathBuf,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Normalize the whitespace of a Markdown file (default: stdin)
    Normalize {
        /// Markdown file (default: stdin)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert { file, json, extract } => {
            let config = extract.into_config()?;
            let capture = read_capture(file.as_deref())?;
            if json {
                let (record, _) = ExtractionRecord::from_capture(&capture, &config);
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                let section = parser::extract_section(&capture.root, &config)?;
                println!("{}", section.as_output());
            }
            Ok(())
        }
        Commands::Batch { input, out, extract } => {
            let config = extract.into_config()?;
            let files = list_captures(&input)?;
            if files.is_empty() {
                println!("No *.json captures found in {}", input.display());
                return Ok(());
            }
            fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            println!("Converting {} captures...", files.len());
            let counts = convert_batch(&files, &out, &config)?;
            counts.print();
            Ok(())
        }
        Commands::Normalize { file } => {
            let text = read_input(file.as_deref())?;
            println!("{}", parser::whitespace::normalize(&text));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Debug, Default)]
struct BatchCounts {
    converted: usize,
    no_start: usize,
    empty: usize,
    failed: usize,
}

impl BatchCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Converted => self.converted += 1,
            Outcome::NoStartMarker => self.no_start += 1,
            Outcome::NoContent => self.empty += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    fn print(&self) {
        println!(
            "Done: {} converted, {} without start marker, {} empty, {} failed.",
            self.converted, self.no_start, self.empty, self.failed,
        );
    }
}

const WORKER_STACK_BYTES: usize = 8 * 1024 * 1024;

fn convert_batch(files: &[PathBuf], out_dir: &Path, config: &ExtractConfig) -> Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    // Conversion recurses once per nesting level, so workers get the same
    // stack as the main thread.
    let pool = rayon::ThreadPoolBuilder::new()
        .stack_size(WORKER_STACK_BYTES)
        .build()?;
    let outcomes: Vec<Outcome> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let outcome = match convert_one(path, out_dir, config) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Capture {} failed: {:#}", path.display(), e);
                        Outcome::Failed
                    }
                };
                pb.inc(1);
                outcome
            })
            .collect()
    });

    pb.finish_and_clear();

    let mut counts = BatchCounts::default();
    for outcome in outcomes {
        counts.record(outcome);
    }
    info!(
        "Converted {} captures ({} ok, {} failed)",
        files.len(),
        counts.converted,
        counts.failed
    );
    Ok(counts)
}

/// Convert one capture file and write `<stem>.md` into `out_dir`.
fn convert_one(path: &Path, out_dir: &Path, config: &ExtractConfig) -> Result<Outcome> {
    let capture = read_capture(Some(path))?;
    let (record, outcome) = ExtractionRecord::from_capture(&capture, config);
    if let Some(err) = &record.error {
        warn!("Capture {} not converted: {}", path.display(), err);
        return Ok(outcome);
    }
    let markdown = record.markdown.unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("capture");
    let target = out_dir.join(format!("{}.md", stem));
    fs::write(&target, format!("{}\n", markdown))
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(outcome)
}

fn list_captures(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_capture(path: Option<&Path>) -> Result<PageCapture> {
    let raw = read_input(path)?;
    let source = path.map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    PageCapture::from_json(&raw).with_context(|| format!("Invalid page capture in {}", source))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => {
            fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
