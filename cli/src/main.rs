//! datainsight CLI - document extraction through the Polaris AI DataInsight API

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use datainsight::{
    extract::chunk_kinds, load_response_file, ApiKey, ClientOptions, DataInsight, Extraction,
    JsonFormat, PageSelection, RenderOptions,
};

#[derive(Parser)]
#[command(name = "datainsight")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract text, tables, and chunks from documents with Polaris AI DataInsight", long_about = None)]
struct Cli {
    /// Input document (or saved response with --response)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the extraction comes from.
#[derive(Args, Clone)]
struct SourceArgs {
    /// Treat FILE as a saved response archive instead of uploading it
    #[arg(long, global = true)]
    response: bool,

    /// API key
    #[arg(long, env = "DATAINSIGHT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Save the raw response archive to this path
    #[arg(long, value_name = "PATH", global = true)]
    save_response: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document to all formats (Markdown, text, tables, chunks, JSON)
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Extract a document to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Table rendering mode
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Include page headers and footers
        #[arg(long)]
        headers_footers: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Extract the plain text of a document
    Text {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Extract tables as CSV files
    Tables {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory (stdout if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Build retrieval chunks as JSON
    Chunks {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Extract the normalized document as JSON
    Json {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Save the images returned with a document
    Images {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Extract several documents, one output directory each
    Batch {
        /// Input documents
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "datainsight_output")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Markdown pipe tables built from the CSV
    Markdown,
    /// HTML tables as returned by the service
    Html,
    /// Fenced CSV blocks
    Csv,
}

impl From<TableMode> for datainsight::TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => datainsight::TableFallback::Markdown,
            TableMode::Html => datainsight::TableFallback::Html,
            TableMode::Csv => datainsight::TableFallback::Csv,
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let source = cli.source;

    let result = match cli.command {
        Some(Commands::Convert { input, output }) => cmd_convert(&source, &input, output.as_deref()),
        Some(Commands::Markdown {
            input,
            output,
            frontmatter,
            table_mode,
            headers_footers,
            pages,
        }) => cmd_markdown(
            &source,
            &input,
            output.as_deref(),
            frontmatter,
            table_mode,
            headers_footers,
            pages.as_deref(),
        ),
        Some(Commands::Text {
            input,
            output,
            pages,
        }) => cmd_text(&source, &input, output.as_deref(), pages.as_deref()),
        Some(Commands::Tables { input, output }) => cmd_tables(&source, &input, output.as_deref()),
        Some(Commands::Chunks {
            input,
            output,
            compact,
        }) => cmd_chunks(&source, &input, output.as_deref(), compact),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&source, &input, output.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&source, &input),
        Some(Commands::Images { input, output }) => cmd_images(&source, &input, output.as_deref()),
        Some(Commands::Batch { inputs, output }) => cmd_batch(&source, &inputs, &output),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&source, &input, cli.output.as_deref())
            } else {
                println!("{}", "Usage: datainsight <FILE> [OUTPUT]".yellow());
                println!("       datainsight --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        if let Some(e) = e.downcast_ref::<datainsight::Error>() {
            if e.is_auth() {
                eprintln!(
                    "{}",
                    "Check the API key (--api-key or DATAINSIGHT_API_KEY).".yellow()
                );
            } else if e.is_retryable() {
                eprintln!("{}", "The request may succeed if retried later.".yellow());
            }
        }
        std::process::exit(1);
    }
}

fn build_client(source: &SourceArgs) -> Result<DataInsight, datainsight::Error> {
    let api_key = match source.api_key.as_deref() {
        Some(key) => ApiKey::new(key)?,
        None => ApiKey::from_env()?,
    };
    let mut options = ClientOptions::new(api_key);
    if let Some(secs) = source.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }
    DataInsight::new(options)
}

/// Upload the file (or load a saved response) with a spinner.
fn load(source: &SourceArgs, input: &Path) -> Result<Extraction, Box<dyn std::error::Error>> {
    let extraction = if source.response {
        load_response_file(input)?
    } else {
        let client = build_client(source)?;
        let spinner = spinner(format!("Extracting {}...", file_label(input)));
        let result = client.extract(input);
        spinner.finish_and_clear();
        result?
    };

    debug!(
        "{}: {} pages, assets {:?}",
        input.display(),
        extraction.document().page_count(),
        extraction.assets()
    );

    if let Some(path) = source.save_response.as_deref() {
        extraction.save_response(path)?;
        eprintln!("{} {}", "Response saved to".green(), path.display());
    }
    Ok(extraction)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> CmdResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(source: &SourceArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    let extraction = load(source, input)?;
    write_outputs(&extraction, &output_dir)?;

    println!("\n{}", "Output files:".green().bold());
    println!("  {} extract.md", "├─".dimmed());
    println!("  {} extract.txt", "├─".dimmed());
    println!("  {} tables/", "├─".dimmed());
    println!("  {} chunks.json", "├─".dimmed());
    println!("  {} document.json", "├─".dimmed());
    println!("  {} images/", "└─".dimmed());

    Ok(())
}

/// Write every output format of one extraction into `output_dir`.
fn write_outputs(extraction: &Extraction, output_dir: &Path) -> CmdResult {
    fs::create_dir_all(output_dir)?;

    let render_options = RenderOptions::new().with_frontmatter(true);
    fs::write(
        output_dir.join("extract.md"),
        extraction.to_markdown(&render_options)?,
    )?;
    fs::write(
        output_dir.join("extract.txt"),
        extraction.to_text(&RenderOptions::default())?,
    )?;

    write_tables(extraction, &output_dir.join("tables"))?;

    let chunks = datainsight::render::chunks_to_json(&extraction.chunks(), JsonFormat::Pretty)?;
    fs::write(output_dir.join("chunks.json"), chunks)?;
    fs::write(
        output_dir.join("document.json"),
        extraction.to_json(JsonFormat::Pretty)?,
    )?;

    write_images(extraction, output_dir)?;
    Ok(())
}

fn write_tables(extraction: &Extraction, dir: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let tables = extraction.tables();
    if tables.is_empty() {
        return Ok(0);
    }
    fs::create_dir_all(dir)?;
    for (i, csv) in tables.iter().enumerate() {
        fs::write(dir.join(format!("table_{:03}.csv", i + 1)), csv)?;
    }
    Ok(tables.len())
}

/// Write archive assets under `dir`, keeping their relative paths so links in
/// the Markdown output resolve.
fn write_images(extraction: &Extraction, dir: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let mut count = 0;
    for name in extraction.assets() {
        let Some(relative) = asset_path(name) else {
            debug!("skipping asset with unusable name '{}'", name);
            continue;
        };
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, extraction.read_asset(name)?)?;
        count += 1;
    }
    Ok(count)
}

/// Relative output path for an archive member: only plain path segments are
/// kept, so `..`, roots, and drive prefixes cannot leave the output directory.
fn asset_path(name: &str) -> Option<PathBuf> {
    let path: PathBuf = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

fn cmd_markdown(
    source: &SourceArgs,
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    table_mode: TableMode,
    headers_footers: bool,
    pages: Option<&str>,
) -> CmdResult {
    let render_options = RenderOptions::new()
        .with_frontmatter(frontmatter)
        .with_table_fallback(table_mode.into())
        .with_headers_footers(headers_footers)
        .with_pages(page_selection(pages)?);

    let extraction = load(source, input)?;
    let markdown = extraction.to_markdown(&render_options)?;
    write_or_print(output, &markdown)
}

fn cmd_text(
    source: &SourceArgs,
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
) -> CmdResult {
    let render_options = RenderOptions::new().with_pages(page_selection(pages)?);

    let extraction = load(source, input)?;
    let text = extraction.to_text(&render_options)?;
    write_or_print(output, &text)
}

fn cmd_tables(source: &SourceArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let extraction = load(source, input)?;

    match output {
        Some(dir) => {
            let count = write_tables(&extraction, dir)?;
            println!(
                "\n{} {} tables written to {}",
                "Done!".green().bold(),
                count,
                dir.display()
            );
        }
        None => {
            for (i, csv) in extraction.tables().iter().enumerate() {
                println!("{}", format!("# table {}", i + 1).cyan());
                println!("{}\n", csv.trim_end());
            }
        }
    }
    Ok(())
}

fn cmd_chunks(source: &SourceArgs, input: &Path, output: Option<&Path>, compact: bool) -> CmdResult {
    let extraction = load(source, input)?;
    let json = datainsight::render::chunks_to_json(&extraction.chunks(), json_format(compact))?;
    write_or_print(output, &json)
}

fn cmd_json(source: &SourceArgs, input: &Path, output: Option<&Path>, compact: bool) -> CmdResult {
    let extraction = load(source, input)?;
    let json = extraction.to_json(json_format(compact))?;
    write_or_print(output, &json)
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_info(source: &SourceArgs, input: &Path) -> CmdResult {
    let extraction = load(source, input)?;
    let doc = extraction.document();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Name".bold(), doc.name);
    println!("{}: {}", "Pages".bold(), doc.total_pages);
    if let Some(page) = doc.pages.first() {
        println!(
            "{}: {} x {}",
            "Page size".bold(),
            page.width,
            page.height
        );
    }

    println!();
    println!("{}", "Elements".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (tag, count) in doc.summary() {
        println!("{}: {}", tag.as_str().bold(), count);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = extraction.texts().join("\n");
    let chunks = extraction.chunks();
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!("{}: {}", "Tables".bold(), extraction.tables().len());
    println!("{}: {}", "Images".bold(), extraction.assets().len());
    println!("{}: {}", "Chunks".bold(), chunks.len());
    for (kind, count) in chunk_kinds(&chunks) {
        println!("  {} {}: {}", "·".dimmed(), kind, count);
    }

    Ok(())
}

fn cmd_images(source: &SourceArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let extraction = load(source, input)?;

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let count = write_images(&extraction, &output_dir)?;
    for name in extraction.assets() {
        println!("{} {}", "Extracted".green(), name);
    }

    println!("\n{} {} images extracted", "Done!".green().bold(), count);

    Ok(())
}

fn cmd_batch(source: &SourceArgs, inputs: &[PathBuf], output: &Path) -> CmdResult {
    let pb = ProgressBar::new(inputs.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let client = if source.response {
        None
    } else {
        Some(build_client(source)?)
    };

    let mut failed = 0;
    for input in inputs {
        pb.set_message(file_label(input));
        let result = match &client {
            Some(client) => client.extract(input),
            None => load_response_file(input),
        };

        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let written = result
            .map_err(Box::<dyn std::error::Error>::from)
            .and_then(|extraction| write_outputs(&extraction, &output.join(stem.as_ref())));

        match written {
            Ok(()) => pb.println(format!("{} {}", "✓".green(), input.display())),
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", "✗".red(), input.display(), e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let succeeded = inputs.len() - failed;
    println!(
        "\n{} {} succeeded, {} failed",
        "Done!".green().bold(),
        succeeded,
        failed
    );

    if failed > 0 {
        return Err(format!("{} of {} documents failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "datainsight".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Polaris AI DataInsight document extraction client");
    println!();
    println!("License: MIT");
}
