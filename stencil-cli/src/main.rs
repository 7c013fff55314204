use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stencil", version, about = "Render templates against JSON data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template and print the resulting HTML.
    Render {
        /// HTML file holding one or more <template> elements
        input: PathBuf,
        /// JSON object used as the data object
        #[arg(long)]
        data: Option<PathBuf>,
        /// id of the template to render (default: the first one)
        #[arg(long)]
        template: Option<String>,
        /// TOML file with compiler options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of render passes over the same instance
        #[arg(long, default_value_t = 1)]
        passes: usize,
    },
    /// Print the compiled bindings of every template.
    Inspect {
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            input,
            data,
            template,
            config,
            passes,
        } => {
            let html = stencil_cli::render_cmd(
                &input,
                data.as_deref(),
                template.as_deref(),
                config.as_deref(),
                passes,
            )?;
            println!("{html}");
        }
        Commands::Inspect { input, config } => {
            print!("{}", stencil_cli::inspect_cmd(&input, config.as_deref())?);
        }
    }
    Ok(())
}
