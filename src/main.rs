use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(version, about = "AI-assisted website builder")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a project from a prompt and preview it
    Create {
        /// What to build
        prompt: String,

        /// Directory the generated project is written to
        #[arg(short, long, default_value = "site")]
        output: PathBuf,

        /// Overwrite a non-empty output directory without asking
        #[arg(long)]
        yes: bool,

        /// Skip mounting the project into the preview sandbox
        #[arg(long)]
        no_preview: bool,

        /// Don't open the ready URL in a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Preview an existing generated project
    Preview {
        /// Project directory
        dir: PathBuf,

        /// Don't open the ready URL in a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Run the GenAI proxy server
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,
    },
}

fn init_tracing(cli: &Cli) {
    let default_filter = match (&cli.command, cli.verbose) {
        (_, true) => "sitesmith=debug",
        (Commands::Serve { .. }, _) => "sitesmith=info",
        _ => "sitesmith=warn",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        Commands::Create {
            prompt,
            output,
            yes,
            no_preview,
            no_open,
        } => {
            cmd::cmd_create(prompt, output, *yes, *no_preview, *no_open).await?;
        }
        Commands::Preview { dir, no_open } => {
            cmd::cmd_preview(dir, *no_open, cli.verbose).await?;
        }
        Commands::Serve { port, dev } => {
            cmd::cmd_serve(*port, *dev).await?;
        }
    }

    Ok(())
}
