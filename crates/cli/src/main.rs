//! CLI tool for compiling changelog article markdown into slide decks.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use updeck_core::config::parse_date;
use updeck_core::{
    discover_articles, output_file_name, parse_files, ArticleParser, Batch, ConfigError, DeckBuilder, Error,
    FormatLimits, OutputFormat, PandocFormatter, PandocTarget, RenderConfig, RenderError,
};
use updeck_pptx::{DeckReader, PptxWriter};

/// Compile dated changelog articles into a slide deck.
#[derive(Parser, Debug)]
#[command(name = "updeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inclusive lower date bound (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<String>,

    /// Inclusive upper date bound (YYYY-MM-DD, default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    to: Option<String>,

    /// Article root containing YYYY/MM/*.md
    #[arg(long, default_value = "updates")]
    root: PathBuf,

    /// Directory for generated decks
    #[arg(long, default_value = "pptx")]
    out_dir: PathBuf,

    /// Output file name (placed in --out-dir unless it contains a directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Speaker-note languages: all, merged, or a language code such as "it"
    #[arg(short, long, default_value = "all")]
    notes: String,

    /// Advisory format caps: ignore, warn or truncate
    #[arg(long, default_value = "warn")]
    limits: String,

    /// Output format: pptx or pandoc
    #[arg(short, long, default_value = "pptx")]
    format: String,

    /// Pandoc writer the markdown is meant for: beamer, revealjs or slidy
    #[arg(long, default_value = "beamer")]
    pandoc_target: String,

    /// Add a cover slide with the article image before each content slide
    #[arg(long)]
    cover_slides: bool,

    /// Title of the first slide
    #[arg(long)]
    title: Option<String>,

    /// Render the valid articles even if some fail to parse
    #[arg(long)]
    skip_invalid: bool,

    /// List the selected articles without writing a deck
    #[arg(long)]
    dry_run: bool,

    /// Print --dry-run or --inspect output as JSON
    #[arg(long)]
    json: bool,

    /// Print the slides and notes of an existing .pptx and exit
    #[arg(long, value_name = "PPTX")]
    inspect: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Settings derived from the command line.
#[derive(Debug)]
struct Options {
    config: RenderConfig,
    format: OutputFormat,
    pandoc_target: PandocTarget,
    output: PathBuf,
}

impl Options {
    fn from_args(args: &Args) -> std::result::Result<Self, ConfigError> {
        let from = args.from.as_deref().ok_or(ConfigError::MissingFrom)?;
        let from = parse_date("--from", from)?;
        let to = args.to.as_deref().map(|v| parse_date("--to", v)).transpose()?;
        if let Some(to) = to {
            if from > to {
                return Err(ConfigError::InvertedRange { from, to });
            }
        }

        let limits = FormatLimits {
            policy: args.limits.parse()?,
            ..Default::default()
        };
        let mut config = RenderConfig::new(from)
            .with_to(to)
            .with_languages(args.notes.parse()?)
            .with_limits(limits)
            .with_cover_slides(args.cover_slides);
        if let Some(title) = &args.title {
            config = config.with_deck_title(title.clone());
        }

        let format: OutputFormat = args.format.parse()?;
        let output = match &args.output {
            Some(out) if out.parent().is_some_and(|p| !p.as_os_str().is_empty()) => out.clone(),
            Some(out) => args.out_dir.join(out),
            None => args.out_dir.join(output_file_name(from, to, format)),
        };

        Ok(Self {
            config,
            format,
            pandoc_target: args.pandoc_target.parse()?,
            output,
        })
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if let Some(path) = &args.inspect {
        return inspect(path, args.json);
    }

    let options = Options::from_args(args)?;
    let batch = load_articles(&args.root, args.skip_invalid)?;
    let builder = DeckBuilder::new(options.config.clone());

    if args.dry_run {
        return dry_run(&builder, &batch, args.json);
    }

    let deck = builder.build(&batch.records)?;
    for slide in deck.content_slides() {
        log::info!("Added slide: {}", slide.title);
    }

    match options.format {
        OutputFormat::Pptx => PptxWriter::new().write_to_path(&deck, &options.output)?,
        OutputFormat::Pandoc => PandocFormatter::new()
            .with_target(options.pandoc_target)
            .write_to_path(&deck, &options.output)?,
    }
    log::info!("Saved {} deck to {}", options.format, options.output.display());

    println!(
        "Wrote {} slides for {} article(s) to {}",
        deck.slides.len(),
        deck.article_count,
        options.output.display()
    );
    Ok(())
}

/// Discover and parse every article under `root`.
///
/// Every failure is reported once; unless `skip_invalid` is set, the first
/// one then stops the run.
fn load_articles(root: &Path, skip_invalid: bool) -> Result<Batch> {
    let paths = discover_articles(root)?;
    let mut batch = parse_files(&paths, &ArticleParser::new());

    for (file, warning) in &batch.warnings {
        log::warn!("{}: {}", file.display(), warning);
    }

    let count = batch.failures.len();
    let (reported, fatal) = split_failures(std::mem::take(&mut batch.failures), skip_invalid);
    for failure in reported {
        eprintln!("Error: {:#}", anyhow::Error::new(failure));
    }
    if let Some(first) = fatal {
        return Err(anyhow::Error::new(first).context(format!("{} article(s) failed to parse", count)));
    }
    if count > 0 {
        log::warn!("Skipped {} invalid article(s)", count);
    }

    Ok(batch)
}

/// Split failures into those printed directly and the one returned as the
/// run's error, which `main` prints.
fn split_failures(mut failures: Vec<Error>, skip_invalid: bool) -> (Vec<Error>, Option<Error>) {
    if skip_invalid || failures.is_empty() {
        return (failures, None);
    }
    let first = failures.remove(0);
    (failures, Some(first))
}

fn dry_run(builder: &DeckBuilder, batch: &Batch, json: bool) -> Result<()> {
    let selected = builder.select(&batch.records)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    for record in &selected {
        println!("{}  {}", record.date, record.title);
    }
    println!(
        "{} article(s) from {} to {}",
        selected.len(),
        builder.config().from,
        builder.config().upper_bound()
    );
    Ok(())
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let deck = DeckReader::new()
        .read_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
        return Ok(());
    }

    for slide in &deck.slides {
        println!("--- Slide {} ---", slide.number);
        for line in &slide.lines {
            println!("{}", line.text);
        }
        if let Some(notes) = slide.notes.as_deref().filter(|n| !n.is_empty()) {
            println!("[Notes]");
            println!("{}", notes);
        }
        println!();
    }
    Ok(())
}

/// Distinct exit codes per failure kind.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    if let Some(e) = err.downcast_ref::<RenderError>() {
        return render_exit_code(e);
    }
    match err.downcast_ref::<Error>() {
        Some(Error::Config(_)) => 2,
        Some(Error::InputDirectory(_)) => 3,
        Some(Error::Parse { .. }) => 4,
        Some(Error::Render(e)) => render_exit_code(e),
        Some(Error::Io { .. }) | None => 1,
    }
}

fn render_exit_code(err: &RenderError) -> u8 {
    match err {
        RenderError::EmptySelection { .. } => 5,
        RenderError::WriteFailed { .. } | RenderError::Package(_) => 6,
    }
}
