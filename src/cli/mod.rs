//! # CLI Module
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! # Scan a directory
//! photo-triage scan ~/Photos
//!
//! # Frequency-domain blur scoring with a custom threshold
//! photo-triage scan ~/Photos --blur-algorithm frequency --blur-threshold 0.3
//!
//! # Resume an interrupted scan
//! photo-triage scan ~/Photos --resume
//!
//! # JSON output, exported to a file
//! photo-triage scan ~/Photos --output json --export results.json
//!
//! # Drop the caches and checkpoint for a directory
//! photo-triage clear-cache ~/Photos
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_triage::config::{BlurAlgorithm, ScanSettings, SimilarityMode};
use photo_triage::core::cache::CacheStore;
use photo_triage::core::report::{self, ScanResults};
use photo_triage::core::state;
use photo_triage::core::orchestrator::{ScanOrchestrator, ScanStatus};
use photo_triage::error::Result;
use photo_triage::events::{Event, EventChannel, ScanEvent};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::thread;

/// Photo Triage - find the photos not worth keeping
#[derive(Parser, Debug)]
#[command(name = "photo-triage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory for blurry, duplicate and similar photos
    Scan {
        /// Directory to scan
        directory: PathBuf,

        /// Blur scoring algorithm
        #[arg(long, default_value = "local-variance")]
        blur_algorithm: BlurAlgorithmArg,

        /// Blur cutoff in the algorithm's own units
        /// (default: 100 for local-variance, 0.3 for frequency)
        #[arg(long)]
        blur_threshold: Option<f64>,

        /// Low-frequency disk radius as a fraction of the short edge
        /// (frequency algorithm only)
        #[arg(long, default_value = "0.05")]
        radius_ratio: f64,

        /// Similarity detection mode
        #[arg(short, long, default_value = "combined")]
        mode: SimilarityModeArg,

        /// Maximum Hamming distance (0-64) for the perceptual-hash stage
        #[arg(long, default_value = "5")]
        hash_threshold: u32,

        /// Maximum keypoints per image for descriptor matching
        #[arg(long, default_value = "1000")]
        features: usize,

        /// Ratio-test acceptance bound for descriptor matching
        #[arg(long, default_value = "0.75")]
        ratio: f32,

        /// Minimum good-match count for a similar pair
        #[arg(long, default_value = "30")]
        min_matches: usize,

        /// Do not recurse into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Do not read or write the per-directory cache
        #[arg(long)]
        no_cache: bool,

        /// Resume from a checkpoint left by an interrupted scan
        #[arg(short, long)]
        resume: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Also write the results to this JSON file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show a previously exported results file
    Show {
        /// Path to a results JSON file written with --export
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Remove the caches and checkpoint stored inside a directory
    ClearCache {
        /// Directory whose caches should be removed
        directory: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BlurAlgorithmArg {
    /// Spectral energy outside a low-frequency disk, scored in [0, 1]
    Frequency,
    /// Variance of the Laplacian response (default)
    LocalVariance,
}

impl From<BlurAlgorithmArg> for BlurAlgorithm {
    fn from(arg: BlurAlgorithmArg) -> Self {
        match arg {
            BlurAlgorithmArg::Frequency => BlurAlgorithm::Frequency,
            BlurAlgorithmArg::LocalVariance => BlurAlgorithm::LocalVariance,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SimilarityModeArg {
    /// Perceptual hash only - fastest
    HashOnly,
    /// Descriptor matching over every pair - most precise
    DescriptorOnly,
    /// Hash prefilter plus descriptor confirmation (default)
    Combined,
}

impl From<SimilarityModeArg> for SimilarityMode {
    fn from(arg: SimilarityModeArg) -> Self {
        match arg {
            SimilarityModeArg::HashOnly => SimilarityMode::HashOnly,
            SimilarityModeArg::DescriptorOnly => SimilarityMode::DescriptorOnly,
            SimilarityModeArg::Combined => SimilarityMode::Combined,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            directory,
            blur_algorithm,
            blur_threshold,
            radius_ratio,
            mode,
            hash_threshold,
            features,
            ratio,
            min_matches,
            no_recursive,
            no_cache,
            resume,
            output,
            export,
            verbose,
        } => {
            let blur_algorithm: BlurAlgorithm = blur_algorithm.into();
            let settings = ScanSettings {
                blur_algorithm,
                blur_threshold: blur_threshold.unwrap_or(match blur_algorithm {
                    BlurAlgorithm::Frequency => 0.3,
                    BlurAlgorithm::LocalVariance => 100.0,
                }),
                radius_ratio,
                similarity_mode: mode.into(),
                hash_threshold,
                n_features: features,
                ratio_threshold: ratio,
                min_good_matches: min_matches,
                recursive: !no_recursive,
                cache_enabled: !no_cache,
                ..Default::default()
            };
            run_scan(directory, settings, resume, output, export, verbose)
        }
        Commands::Show { file, output } => run_show(&file, output),
        Commands::ClearCache { directory } => run_clear_cache(&directory),
    }
}

fn run_scan(
    directory: PathBuf,
    settings: ScanSettings,
    resume: bool,
    output: OutputFormat,
    export: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photo Triage").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let (sender, receiver) = EventChannel::new();
    let orchestrator = ScanOrchestrator::new(settings.clone(), sender)?;

    // Ctrl+C requests a graceful cancellation; the scan checkpoints and
    // exits cleanly so --resume can pick it up.
    let cancel = orchestrator.cancel_flag();
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::Relaxed);
    })
    .ok();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::Preparing { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message("Enumerating photos".to_string());
                    }
                }
                Event::Scan(ScanEvent::Resumed { already_processed }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.println(format!(
                            "Resuming: {} items already processed",
                            already_processed
                        ));
                    }
                }
                Event::Scan(ScanEvent::PhaseStarted { phase, total }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total as u64);
                        pb.set_position(0);
                        pb.set_message(phase.label().to_string());
                    }
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.current as u64);
                    }
                }
                Event::Scan(ScanEvent::ItemError { path, message }) => {
                    if verbose {
                        if let Some(ref pb) = progress_clone {
                            pb.println(format!("skipped {}: {}", path.display(), message));
                        }
                    }
                }
                Event::Scan(
                    ScanEvent::Completed | ScanEvent::Cancelled | ScanEvent::Failed { .. },
                ) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
            }
        }
    });

    let outcome = orchestrator.run(&directory, resume);
    drop(orchestrator);
    event_thread.join().ok();

    if let Some(export_path) = export {
        report::save_results(&export_path, &directory, &settings, &outcome.results)?;
        if matches!(output, OutputFormat::Pretty) {
            term.write_line(&format!(
                "  results written to {}",
                style(export_path.display()).cyan()
            ))
            .ok();
        }
    }

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, outcome.status, &outcome.results, verbose),
        OutputFormat::Json => print_json_results(outcome.status, &outcome.results),
    }

    if outcome.status == ScanStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_show(file: &Path, output: OutputFormat) -> Result<()> {
    let document = report::load_results(file)?;
    let term = Term::stderr();

    match output {
        OutputFormat::Pretty => {
            term.write_line(&format!(
                "{} (saved {})",
                style(document.scanned_directory.display()).bold().cyan(),
                style(document.saved_at.format("%Y-%m-%d %H:%M UTC")).dim()
            ))
            .ok();
            print_pretty_results(&term, ScanStatus::Completed, &document.results, false);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&document).unwrap());
        }
    }
    Ok(())
}

fn run_clear_cache(directory: &Path) -> Result<()> {
    state::delete(directory)?;
    CacheStore::clear_all(directory)?;
    let term = Term::stderr();
    term.write_line(&format!(
        "{} cleared caches under {}",
        style("✓").green().bold(),
        style(directory.display()).cyan()
    ))
    .ok();
    Ok(())
}

fn print_pretty_results(term: &Term, status: ScanStatus, results: &ScanResults, verbose: bool) {
    term.write_line("").ok();
    match status {
        ScanStatus::Completed => {
            term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
                .ok();
        }
        ScanStatus::Cancelled => {
            term.write_line(&format!(
                "{} Scan cancelled - run again with --resume to continue",
                style("◼").yellow().bold()
            ))
            .ok();
        }
        ScanStatus::Failed => {
            term.write_line(&format!("{} Scan failed", style("✗").red().bold()))
                .ok();
        }
    }
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} blurry photos",
        style(results.blurry.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} exact-duplicate groups",
        style(results.duplicates.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} similar pairs",
        style(results.similar.len()).cyan()
    ))
    .ok();
    if !results.errors.is_empty() {
        term.write_line(&format!(
            "  {} files skipped with errors",
            style(results.errors.len()).yellow()
        ))
        .ok();
    }
    term.write_line("").ok();

    if !results.blurry.is_empty() {
        term.write_line(&format!("{}", style("Blurry:").bold().underlined()))
            .ok();
        for blur in &results.blurry {
            term.write_line(&format!(
                "  {} {} ({}: {:.2})",
                style("○").dim(),
                blur.path.display(),
                blur.algorithm,
                blur.score
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    if !results.duplicates.is_empty() {
        term.write_line(&format!(
            "{}",
            style("Duplicate Groups:").bold().underlined()
        ))
        .ok();
        for (i, group) in results.duplicates.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} photos)",
                style(format!("Group {}:", i + 1)).bold(),
                group.paths.len()
            ))
            .ok();
            for path in &group.paths {
                term.write_line(&format!("    {} {}", style("○").dim(), path.display()))
                    .ok();
            }
        }
        term.write_line("").ok();
    }

    if !results.similar.is_empty() {
        term.write_line(&format!("{}", style("Similar Pairs:").bold().underlined()))
            .ok();
        for pair in &results.similar {
            term.write_line(&format!(
                "  {} {} ↔ {} (score {})",
                style("○").dim(),
                pair.first.display(),
                pair.second.display(),
                pair.score
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    if verbose && !results.errors.is_empty() {
        term.write_line(&format!("{}", style("Skipped:").bold().underlined()))
            .ok();
        for error in &results.errors {
            term.write_line(&format!("  {}", style(&error.message).dim())).ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("Remember: nothing was deleted. Review the findings before acting.").dim()
    ))
    .ok();
}

fn print_json_results(status: ScanStatus, results: &ScanResults) {
    let status = match status {
        ScanStatus::Completed => "completed",
        ScanStatus::Cancelled => "cancelled",
        ScanStatus::Failed => "failed",
    };
    let output = serde_json::json!({
        "status": status,
        "blurry": results.blurry,
        "duplicate_groups": results.duplicates,
        "similar_pairs": results.similar,
        "errors": results.errors,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
