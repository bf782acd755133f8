use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasklist::{Config, Markdown, OptionsOverride, SequentialIds, TaskLists};

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Render Markdown to HTML with GitHub-style task lists")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output HTML file (defaults to input name with .html extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write HTML to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// TOML config file with a [tasks] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave checkboxes interactive
    #[arg(long)]
    enabled: bool,

    /// Wrap checkboxes in labels
    #[arg(long)]
    label: bool,

    /// Place a paired label after the checkbox (implies --label)
    #[arg(long)]
    label_after: bool,

    /// Place a paired label before the checkbox (implies --label)
    #[arg(long)]
    label_before: bool,

    #[arg(long)]
    container_class: Option<String>,

    #[arg(long)]
    item_class: Option<String>,

    #[arg(long)]
    label_class: Option<String>,

    #[arg(long)]
    input_class: Option<String>,

    /// Number label ids 1, 2, ... instead of drawing them at random
    #[arg(long)]
    sequential_ids: bool,
}

impl Cli {
    /// Flags given on the command line; absent flags leave the config alone.
    fn overrides(&self) -> OptionsOverride {
        let flag = |set: bool| set.then_some(true);
        OptionsOverride {
            enabled: flag(self.enabled),
            label: flag(self.label || self.label_after || self.label_before),
            label_after: flag(self.label_after),
            label_before: flag(self.label_before),
            container_class: self.container_class.clone(),
            item_class: self.item_class.clone(),
            label_class: self.label_class.clone(),
            input_class: self.input_class.clone(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::compiled_default(),
    };
    let options = config.tasks.merge(&cli.overrides());
    info!(?options, "task list options");

    // Read input file
    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let html = if cli.sequential_ids {
        Markdown::new()
            .with_rule(TaskLists::with_ids(options, SequentialIds::new()))
            .render(&markdown)
    } else {
        Markdown::new()
            .with_rule(TaskLists::new(options))
            .render(&markdown)
    };

    if cli.stdout {
        if let Err(e) = io::stdout().write_all(html.as_bytes()) {
            eprintln!("Error writing to stdout: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Determine output path
    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("html"));

    // Write HTML
    if let Err(e) = fs::write(&output, html) {
        eprintln!("Error writing {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!("Created {}", output.display());
}
