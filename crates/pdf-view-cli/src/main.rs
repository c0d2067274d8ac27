mod logger;
mod surface;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_view::pdfium::PdfiumProvider;
use pdf_view::{
    DocumentHandle, DocumentProvider, FitMode, HookSet, PageHandle, Permissive, Size,
    ViewController, ViewOptions,
};
use pdf_view_runtime::{ViewCommand, ViewUpdate, spawn_view};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logger::CliLogger;
use crate::surface::PngSurface;

#[derive(Parser)]
#[command(name = "pdfv", about = "Page-at-a-time PDF viewer", version)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory containing the pdfium shared library
    #[arg(long, global = true)]
    pdfium_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and natural page sizes
    Info {
        /// Input PDF file
        input: PathBuf,
    },

    /// Render a single page to PNG
    Render {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Render scale (overrides the config file)
        #[arg(short, long)]
        scale: Option<f64>,

        /// Fit the page to the container after navigating
        #[arg(long, value_enum)]
        fit: Option<FitArg>,

        /// Container size as WIDTHxHEIGHT
        #[arg(long, default_value = "620x805", value_parser = parse_size)]
        container: Size,

        /// JSON view options
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a sequence of navigation steps, writing each presented frame
    Browse {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for frame-NNN.png files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Comma-separated steps: next, prev, goto:N, scale:F, fit:MODE, resize:WxH
        #[arg(long, value_delimiter = ',', value_parser = parse_step)]
        steps: Vec<ViewCommand>,

        /// Container size as WIDTHxHEIGHT
        #[arg(long, default_value = "620x805", value_parser = parse_size)]
        container: Size,

        /// Refit on load and on every resize step
        #[arg(long)]
        auto_fit: bool,

        /// JSON view options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this long without updates once no render is running
        #[arg(long, default_value = "500")]
        settle_ms: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Height,
    Width,
    Auto,
}

impl From<FitArg> for FitMode {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Height => Self::Height,
            FitArg::Width => Self::Width,
            FitArg::Auto => Self::Auto,
        }
    }
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: f64 = width.trim().parse().map_err(|e| format!("bad width '{width}': {e}"))?;
    let height: f64 = height.trim().parse().map_err(|e| format!("bad height '{height}': {e}"))?;
    let size = Size::new(width, height);
    if !size.is_positive() {
        return Err(format!("container must be positive, got '{s}'"));
    }
    Ok(size)
}

fn parse_step(s: &str) -> Result<ViewCommand, String> {
    let (name, arg) = match s.trim().split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (s.trim(), None),
    };

    match (name, arg) {
        ("next", None) => Ok(ViewCommand::Next),
        ("prev" | "previous", None) => Ok(ViewCommand::Previous),
        ("goto", Some(page)) => page
            .parse()
            .map(|page| ViewCommand::GoTo { page })
            .map_err(|e| format!("bad page '{page}': {e}")),
        ("scale", Some(scale)) => scale
            .parse()
            .map(|scale| ViewCommand::SetScale { scale })
            .map_err(|e| format!("bad scale '{scale}': {e}")),
        ("fit", Some(mode)) => FitArg::from_str(mode, true).map(|mode| ViewCommand::Fit {
            mode: mode.into(),
        }),
        ("resize", Some(size)) => parse_size(size).map(|container| ViewCommand::Resize { container }),
        _ => Err(format!(
            "unknown step '{s}' (expected next, prev, goto:N, scale:F, fit:MODE or resize:WxH)"
        )),
    }
}

fn provider(pdfium_dir: Option<PathBuf>) -> PdfiumProvider {
    match pdfium_dir {
        Some(dir) => PdfiumProvider::new().with_library_dir(dir),
        None => PdfiumProvider::new(),
    }
}

async fn load_options(config: Option<&Path>) -> Result<ViewOptions> {
    match config {
        Some(path) => ViewOptions::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ViewOptions::default()),
    }
}

fn source(input: &Path) -> Result<&str> {
    input
        .to_str()
        .with_context(|| format!("Input path is not valid UTF-8: {}", input.display()))
}

fn print_update(update: &ViewUpdate) {
    match update {
        ViewUpdate::Ready { page, page_count } => {
            println!("Opened document: page {} of {}", page, page_count)
        }
        ViewUpdate::PageChanged { page, page_count } => {
            println!("Page {} of {}", page, page_count)
        }
        ViewUpdate::Deferred { page } => println!("  Queued page {} behind current render", page),
        ViewUpdate::Vetoed { page } => println!("  Page {} vetoed", page),
        ViewUpdate::Rendered {
            page,
            scale,
            width,
            height,
        } => println!(
            "  Rendered page {} at scale {:.3} ({:.0}x{:.0})",
            page, scale, width, height
        ),
        ViewUpdate::RenderFailed { page, message } => {
            println!("  Page {} failed: {}", page, message)
        }
        ViewUpdate::Error { message } => println!("  Rejected: {}", message),
        ViewUpdate::Closed => println!("Closed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::from_verbosity(cli.verbose).init()?;
    let provider = provider(cli.pdfium_dir);

    match cli.command {
        Commands::Info { input } => {
            let document = provider.load(source(&input)?).await?;
            println!("{}: {} pages", input.display(), document.page_count());
            for page in 1..=document.page_count() {
                let size = document.get_page(page).await?.natural_size(1.0);
                println!("  Page {}: {:.1} x {:.1} pt", page, size.width, size.height);
            }
        }

        Commands::Render {
            input,
            output,
            page,
            scale,
            fit,
            container,
            config,
        } => {
            let mut options = load_options(config.as_deref()).await?;
            if let Some(scale) = scale {
                options.initial_scale = scale;
            }

            let hooks = HookSet::new()
                .on_after_load(|page_count| log::info!("Document has {} pages", page_count))
                .on_after_render(|report| {
                    if let Err(e) = &report.result {
                        log::warn!("Page {}: {}", report.request.page, e);
                    }
                });

            let mut view = ViewController::open(
                &provider,
                source(&input)?,
                PngSurface::file(&output),
                container,
                options,
                hooks,
            )
            .await?;

            let mut completions = view.settle().await;
            if page != view.current_page() {
                view.go_to_page(page)?;
                completions.extend(view.settle().await);
            }
            if let Some(mode) = fit {
                view.fit(mode.into()).await?;
                completions.extend(view.settle().await);
            }

            let last = completions.pop().context("Nothing was rendered")?;
            let viewport = last.report.result?;
            println!(
                "Rendered page {} at scale {:.3} ({:.0}x{:.0}, left offset {:.1}) → {}",
                last.report.request.page,
                viewport.scale,
                viewport.width,
                viewport.height,
                view.surface().last_left(),
                output.display()
            );
        }

        Commands::Browse {
            input,
            output_dir,
            steps,
            container,
            auto_fit,
            config,
            settle_ms,
        } => {
            let mut options = load_options(config.as_deref()).await?;
            options.auto_fit |= auto_fit;
            tokio::fs::create_dir_all(&output_dir).await?;

            let view = ViewController::open(
                &provider,
                source(&input)?,
                PngSurface::sequence(&output_dir),
                container,
                options,
                Permissive,
            )
            .await?;
            let mut handle = spawn_view(view);

            for step in steps {
                handle.command_tx.send(step)?;
            }

            // The first page is already rendering when the worker starts
            let mut rendering = true;
            let quiet = Duration::from_millis(settle_ms);
            loop {
                let update = if rendering {
                    handle.update_rx.recv().await
                } else {
                    match tokio::time::timeout(quiet, handle.update_rx.recv()).await {
                        Ok(update) => update,
                        Err(_) => break,
                    }
                };
                let Some(update) = update else { break };

                match update {
                    ViewUpdate::PageChanged { .. } => rendering = true,
                    ViewUpdate::Rendered { .. } | ViewUpdate::RenderFailed { .. } => {
                        rendering = false
                    }
                    _ => {}
                }
                print_update(&update);
            }

            let _ = handle.command_tx.send(ViewCommand::Close);
            while let Some(update) = handle.update_rx.recv().await {
                print_update(&update);
            }
            handle.task.await?;
            println!("Frames written to {}", output_dir.display());
        }
    }

    Ok(())
}
