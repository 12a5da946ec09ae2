use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use harvest_cdp::ConvertOptions;
use harvest_cli::commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "A CLI tool for turning recorded browser DevTools events into HTTP Archive (HAR) files",
    long_about = "Harvest reads a recorded stream of Chrome DevTools Protocol Page and Network \
                  events, such as a ChromeDriver performance log, and rebuilds the pages and \
                  request/response exchanges it describes as a HAR 1.2 document."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a recorded event stream into a HAR file
    Convert {
        /// Events as a JSON array or newline-delimited JSON
        #[arg(value_name = "EVENTS")]
        input: PathBuf,

        /// Write the HAR here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Keep requests answered from the browser cache
        #[arg(long, env = "HARVEST_INCLUDE_CACHED")]
        include_cached: bool,

        /// Emit single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    bash:  harvest completion --shell bash > ~/.local/share/bash-completion/completions/harvest
           (or add `source <(harvest completion --shell bash)` to ~/.bashrc)
    zsh:   harvest completion --shell zsh > \"${fpath[1]}/_harvest\"
           (or add `source <(harvest completion --shell zsh)` to ~/.zshrc)
    fish:  harvest completion --shell fish > ~/.config/fish/completions/harvest.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            include_cached,
            compact,
        } => {
            let options = ConvertOptions::new().with_cache_served_resources(include_cached);
            commands::convert::execute(&input, output.as_deref(), &options, compact)
        }
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("harvest=debug,harvest_core=debug,harvest_cdp=debug")
    } else {
        EnvFilter::new("harvest=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
