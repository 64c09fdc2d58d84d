//! kindle-annotate: put Kindle highlights and notes back into the book's PDF.
//!
//! `kindle-annotate [book.pdf] [My Clippings.txt] [-o out.pdf] [--options]`
//!
//! Both inputs default to files on the Desktop; the output defaults to
//! `<book>_annotated.pdf` next to the input PDF.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use clip_core::options::{AnnotateOptions, NotePlacement, NoteTextSource};
use clip_core::report::{describe_entry, describe_unprocessed};
use clip_core::target::ProgressReporter;
use clip_input_kindle::read_clippings;
use clip_match::match_entries;
use clip_output_pdf::annotate_pdf;

/// Longest excerpt shown for an entry that could not be processed.
const EXCERPT_CHARS: usize = 100;

#[derive(Parser)]
#[command(
    name = "kindle-annotate",
    version,
    about = "Annotate a PDF with highlights and notes from a Kindle clippings export"
)]
struct Cli {
    /// PDF to annotate (default: ~/Desktop/book.pdf)
    pdf: Option<PathBuf>,

    /// Kindle "My Clippings.txt" export (default: ~/Desktop/Clippings.txt)
    clippings: Option<PathBuf>,

    /// Output PDF (default: <pdf stem>_annotated.pdf next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only use clippings whose book title contains this text
    #[arg(long = "book")]
    book_title: Option<String>,

    /// Encoding of the clippings file (auto-detected by default)
    #[arg(long)]
    input_encoding: Option<String>,

    /// Which lines of a clipping become its text: all-lines, last-line
    #[arg(long)]
    note_text: Option<String>,

    /// Where note markers go: above, right
    #[arg(long)]
    placement: Option<String>,

    /// Print the matched highlights as JSON and leave the PDF alone
    #[arg(long)]
    dry_run: bool,

    /// Dump effective merged config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

/// Load config from global and project-local TOML files.
/// Later files override earlier ones. Missing files are silently ignored.
///
/// Runs before the logger exists (the config decides verbosity), so
/// problems are collected into `warnings` instead of logged.
fn load_config(warnings: &mut Vec<String>) -> AnnotateOptions {
    let mut opts = AnnotateOptions::default();

    // 1. Global config: ~/.config/kindle-annotate/config.toml
    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("kindle-annotate").join("config.toml");
        if let Some(parsed) = read_config_file(&global_path, warnings) {
            opts = parsed;
        }
    }

    // 2. Project-local config: ./.kindle-annotate.toml
    // serde(default) fills missing fields, so this fully replaces the global file
    if let Some(parsed) = read_config_file(Path::new(".kindle-annotate.toml"), warnings) {
        opts = parsed;
    }

    opts
}

fn read_config_file(path: &Path, warnings: &mut Vec<String>) -> Option<AnnotateOptions> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AnnotateOptions>(&contents) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warnings.push(format!("Failed to parse {}: {}", path.display(), e));
            None
        }
    }
}

/// Apply CLI flags on top of config-loaded options.
/// Only overrides when the CLI flag was explicitly provided.
fn apply_cli_overrides(opts: &mut AnnotateOptions, cli: &Cli, warnings: &mut Vec<String>) {
    if cli.verbose > 0 {
        opts.verbose = cli.verbose;
    }

    if cli.book_title.is_some() {
        opts.book_title = cli.book_title.clone();
    }

    if cli.input_encoding.is_some() {
        opts.input_encoding = cli.input_encoding.clone();
    }

    if let Some(ref mode) = cli.note_text {
        match parse_note_text(mode) {
            Some(source) => opts.note_text = source,
            None => warnings.push(format!(
                "Unknown --note-text '{}', keeping {:?}",
                mode, opts.note_text
            )),
        }
    }

    if let Some(ref placement) = cli.placement {
        match parse_placement(placement) {
            Some(p) => opts.note_placement = p,
            None => warnings.push(format!(
                "Unknown --placement '{}', keeping {:?}",
                placement, opts.note_placement
            )),
        }
    }
}

fn parse_note_text(s: &str) -> Option<NoteTextSource> {
    match s {
        "all-lines" | "all" => Some(NoteTextSource::AllLines),
        "last-line" | "last" => Some(NoteTextSource::LastLine),
        _ => None,
    }
}

fn parse_placement(s: &str) -> Option<NotePlacement> {
    match s {
        "above" => Some(NotePlacement::Above),
        "right" => Some(NotePlacement::Right),
        _ => None,
    }
}

/// Default log filter for a verbosity level; `RUST_LOG` still wins.
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() {
    let cli = Cli::parse();

    let mut warnings = Vec::new();
    let mut options = load_config(&mut warnings);
    apply_cli_overrides(&mut options, &cli, &mut warnings);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(options.verbose)),
    )
    .init();

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    // Handle --dump-config
    if cli.dump_config {
        match toml::to_string_pretty(&options) {
            Ok(s) => {
                println!("{}", s);
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = run(&cli, &options) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, options: &AnnotateOptions) -> Result<()> {
    let desktop = desktop_dir();
    let pdf = cli.pdf.clone().unwrap_or_else(|| desktop.join("book.pdf"));
    let clippings = cli
        .clippings
        .clone()
        .unwrap_or_else(|| desktop.join("Clippings.txt"));

    if !cli.dry_run && !pdf.is_file() {
        anyhow::bail!("File not found: {}", pdf.display());
    }

    let entries = read_clippings(&clippings, options)
        .with_context(|| format!("Failed to read clippings from {}", clippings.display()))?;
    println!("Found {} highlights/notes in {}", entries.len(), clippings.display());

    let outcome = match_entries(entries);

    if cli.dry_run {
        let json = serde_json::to_string_pretty(&outcome.highlights)
            .context("Failed to serialize matched highlights")?;
        println!("{}", json);
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&pdf, &options.output_suffix));

    log::info!("Annotating {} -> {}", pdf.display(), output.display());

    let progress: ProgressReporter = Box::new(|frac, msg| {
        if frac < 1.0 {
            log::info!("[{:3.0}%] {}", frac * 100.0, msg);
        } else {
            log::info!("Done!");
        }
    });

    let report = annotate_pdf(&pdf, &output, &outcome.highlights, options, Some(progress))
        .with_context(|| format!("Failed to annotate {}", pdf.display()))?;

    println!("Annotated PDF saved as: {}", output.display());
    println!(
        "Total highlights added: {}, total notes added: {}",
        report.highlights_added, report.notes_added
    );

    let mut unprocessed: Vec<String> = report
        .unprocessed()
        .into_iter()
        .map(|(kind, text)| describe_unprocessed(kind, text, EXCERPT_CHARS))
        .collect();
    unprocessed.extend(
        outcome
            .unmatched_notes
            .iter()
            .map(|note| describe_entry(note, EXCERPT_CHARS)),
    );

    if !unprocessed.is_empty() {
        println!("\nCouldn't process these entries:");
        for line in unprocessed {
            println!("{}", line);
        }
    }

    Ok(())
}

fn desktop_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<dir>/<stem><suffix>.pdf` for an input PDF at `<dir>/<stem>.pdf`.
fn default_output_path(pdf: &Path, suffix: &str) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "book".to_string());
    pdf.with_file_name(format!("{}{}.pdf", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/books/Moby Dick.pdf"), "_annotated"),
            PathBuf::from("/books/Moby Dick_annotated.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("book.pdf"), "-notes"),
            PathBuf::from("book-notes.pdf")
        );
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "kindle-annotate",
            "in.pdf",
            "clips.txt",
            "--book",
            "Moby",
            "--note-text",
            "last-line",
            "--placement",
            "right",
            "-vv",
        ]);
        let mut opts = AnnotateOptions::default();
        let mut warnings = Vec::new();
        apply_cli_overrides(&mut opts, &cli, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(cli.pdf, Some(PathBuf::from("in.pdf")));
        assert_eq!(opts.book_title.as_deref(), Some("Moby"));
        assert_eq!(opts.note_text, NoteTextSource::LastLine);
        assert_eq!(opts.note_placement, NotePlacement::Right);
        assert_eq!(opts.verbose, 2);
    }

    #[test]
    fn test_unknown_override_keeps_config() {
        let cli = Cli::parse_from(["kindle-annotate", "--placement", "sideways"]);
        let mut opts = AnnotateOptions {
            note_placement: NotePlacement::Right,
            ..Default::default()
        };
        let mut warnings = Vec::new();
        apply_cli_overrides(&mut opts, &cli, &mut warnings);
        assert_eq!(opts.note_placement, NotePlacement::Right);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sideways"));
        assert!(cli.pdf.is_none());
    }

    #[test]
    fn test_config_verbosity_drives_log_filter() {
        let cli = Cli::parse_from(["kindle-annotate"]);
        let mut opts = AnnotateOptions {
            verbose: 2,
            ..Default::default()
        };
        apply_cli_overrides(&mut opts, &cli, &mut Vec::new());
        assert_eq!(opts.verbose, 2);
        assert_eq!(log_filter(opts.verbose), "trace");

        let cli = Cli::parse_from(["kindle-annotate", "-v"]);
        apply_cli_overrides(&mut opts, &cli, &mut Vec::new());
        assert_eq!(log_filter(opts.verbose), "debug");
        assert_eq!(log_filter(0), "info");
    }

    #[test]
    fn test_config_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "note_spacing = 22.5\nnote_placement = \"right\"\n").unwrap();

        let mut warnings = Vec::new();
        let opts = read_config_file(&path, &mut warnings).unwrap();
        assert_eq!(opts.note_spacing, 22.5);
        assert_eq!(opts.note_placement, NotePlacement::Right);
        assert_eq!(opts.output_suffix, "_annotated");

        std::fs::write(&path, "note_spacing = \"wide\"\n").unwrap();
        assert!(read_config_file(&path, &mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
        // A missing file is not worth a warning
        assert!(read_config_file(&dir.path().join("absent.toml"), &mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }
}
