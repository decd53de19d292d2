use clap::{Parser, Subcommand};
use pict_paste::config::{self, PasteConfig};
use pict_paste::export::{export_images, summarize};
use pict_paste::object_url::DirectoryLoader;
use pict_paste::{ImageFilter, output};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "pict-paste")]
#[command(about = "Inline pictures from RTF clipboard payloads into HTML")]
#[command(long_about = "\
Inline pictures from RTF clipboard payloads into HTML

Word processors put two flavors of a copied document on the clipboard. The
HTML flavor points at local picture files nobody else can read; the RTF
flavor carries the picture bytes. pict-paste pairs them by position and
rewrites every <img> as a data: URL.

  clipboard.html   <img src=\"file:///C:/.../clip_image001.png\">
  clipboard.rtf    {\\pict\\pngblip 89504e47...}
        │
        ▼
  <img src=\"data:image/png;base64,iVBORw0...\">

Without an RTF flavor, blob: object URLs can be resolved from a directory
of saved blobs (--blob-dir), named by the last segment of each URL.

Run 'pict-paste gen-config' to generate a documented pict-paste.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "pict-paste.toml", global = true)]
    config: PathBuf,

    /// Log collector decisions and skipped pictures
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inline RTF pictures into an HTML clipboard payload
    Rewrite {
        /// HTML flavor of the paste
        #[arg(long)]
        html: PathBuf,
        /// RTF flavor of the paste
        #[arg(long)]
        rtf: Option<PathBuf>,
        /// Directory holding the bytes behind blob: URLs
        #[arg(long)]
        blob_dir: Option<PathBuf>,
        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the pictures found in an RTF payload
    Inspect {
        #[arg(long)]
        rtf: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the pictures of an RTF payload to a directory
    Extract {
        #[arg(long)]
        rtf: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a stock pict-paste.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Rewrite {
            html,
            rtf,
            blob_dir,
            output: out_path,
        } => {
            let config = config::load_config(&cli.config)?;
            let html_in = std::fs::read_to_string(&html)?;
            let rtf_in = rtf.as_deref().map(std::fs::read_to_string).transpose()?;
            let loader = blob_dir.map(DirectoryLoader::new);

            let mut filter = ImageFilter::from_config(&config)?;
            if let Some(loader) = &loader {
                filter = filter.with_loader(loader);
            }
            let outcome = filter.apply(&html_in, rtf_in.as_deref());

            match out_path {
                Some(path) => std::fs::write(path, &outcome.html)?,
                None => print!("{}", outcome.html),
            }
            output::print_issues(&outcome.issues);
        }
        Command::Inspect { rtf, json } => {
            let config = config::load_config(&cli.config)?;
            let images = collect(&config, &rtf)?;
            let summaries = summarize(&images);
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                output::print_inspect(&summaries);
            }
        }
        Command::Extract { rtf, out } => {
            let config = config::load_config(&cli.config)?;
            let images = collect(&config, &rtf)?;
            let results = export_images(&images, &config.images.supported_types, &out)?;
            output::print_export(&results);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read an RTF file and collect its pictures with the configured collector.
fn collect(
    config: &PasteConfig,
    rtf: &Path,
) -> Result<pict_paste::rtf::ImageSequence, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(rtf)?;
    let filter = ImageFilter::from_config(config)?;
    Ok(filter.collector().collect(&content))
}

/// Log to stderr: warnings by default, collector decisions with `-v`.
fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
