use anyhow::{bail, Context, Result};
use chartbind::config::RenderOptions;
use chartbind::mapping::Mapping;
use chartbind::preprocessor::replace_newline;
use chartbind::runtime::{load_table, ChartSession};
use chartbind::spec::chart_columns;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chartbind")]
#[command(about = "Render chart templates against tabular data and bind column references", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Template or specification file ('-' reads stdin)
    #[arg(conflicts_with = "inline")]
    source: Option<PathBuf>,

    /// Template text given inline; literal '\n' sequences become newlines
    #[arg(long)]
    inline: Option<String>,
}

impl SourceArgs {
    fn read(&self) -> Result<String> {
        match (&self.inline, &self.source) {
            (Some(text), _) => Ok(replace_newline(text)),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text).context("Failed to read template from stdin")?;
                Ok(text)
            }
            (None, Some(path)) => {
                fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
            }
            (None, None) => bail!("Provide a template file or --inline text"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template and print the bound chart JSON
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV or JSON data file (CSV on stdin when omitted)
        #[arg(long)]
        data: Option<PathBuf>,

        /// JSON config with width, height, palette and variables
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Print the rendered template text instead of the bound chart
        #[arg(long)]
        raw: bool,

        /// Exit with an error when the template fails to render
        #[arg(long)]
        strict: bool,
    },
    /// List column references the data cannot satisfy
    Verify {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Rewrite column references using a JSON mapping file
    Apply {
        #[command(flatten)]
        source: SourceArgs,

        /// JSON object mapping references to column names
        #[arg(long)]
        mapping: PathBuf,

        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// List the columns a specification declares in its dataset
    Columns {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn load_options(config: Option<&PathBuf>, width: Option<u32>, height: Option<u32>) -> Result<RenderOptions> {
    let mut options = match config {
        Some(path) => RenderOptions::from_path(path)?,
        None => RenderOptions::default(),
    };
    if let Some(width) = width {
        options.width = width;
    }
    if let Some(height) = height {
        options.height = height;
    }
    Ok(options)
}

fn load_mapping(path: &PathBuf) -> Result<Mapping> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Mapping {} must be a JSON object of strings", path.display()))
}

fn run(cli: Cli) -> Result<String> {
    match cli.command {
        Command::Render { source, data, config, width, height, raw, strict } => {
            let text = source.read()?;
            let options = load_options(config.as_ref(), width, height)?;
            let table = load_table(data.as_deref())?;
            let mut session = ChartSession::new(text, options);
            let rendered = session.render(&table);
            if let (true, Some(diagnostic)) = (strict, &rendered.diagnostic) {
                bail!("Template failed to render: {}\n{}", diagnostic, diagnostic.trace);
            }
            if raw {
                Ok(rendered.text)
            } else {
                serde_json::to_string_pretty(&rendered.chart).context("Failed to serialize chart")
            }
        }
        Command::Verify { source, data } => {
            let text = source.read()?;
            let table = load_table(data.as_deref())?;
            let session = ChartSession::new(text, RenderOptions::default());
            serde_json::to_string_pretty(&session.verify(&table)).context("Failed to serialize references")
        }
        Command::Apply { source, mapping, data } => {
            let text = source.read()?;
            let mapping = load_mapping(&mapping)?;
            let table = load_table(data.as_deref())?;
            let mut session = ChartSession::new(text, RenderOptions::default());
            Ok(session.apply(&mapping, &table).to_string())
        }
        Command::Columns { source } => {
            let text = source.read()?;
            serde_json::to_string_pretty(&chart_columns(&text)).context("Failed to serialize columns")
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let output = run(Cli::parse())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", output).context("Failed to write output")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
