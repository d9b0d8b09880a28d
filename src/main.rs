use anyhow::{Context, Result};
use clap::Parser;
use reportgraph::{engine, source::CsvDataSource};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reportgraph")]
#[command(about = "Render report templates with embedded data-query tokens", long_about = None)]
struct Args {
    /// Report template file containing {{ query=...; representation=... }} tokens
    template: PathBuf,

    /// Directory with the CSV files that query instructions refer to
    #[arg(long, default_value = ".")]
    data: PathBuf,

    /// Write markup to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log recovered parse problems and skipped columns
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    let template = fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;
    let template_name = args
        .template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.template.display().to_string());

    let source = CsvDataSource::new(&args.data);
    let markup = engine::render_template(&template_name, &template, &source)
        .context("Failed to render template")?;

    match &args.output {
        Some(path) => fs::write(path, markup)
            .with_context(|| format!("Failed to write output {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(markup.as_bytes())
                .context("Failed to write markup to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
