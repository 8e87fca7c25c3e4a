use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use vigil_core::{OutputFormat, VigilConfig};
use vigil_review::{GithubClient, ModelClient, Orchestrator};

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Automated pull-request review",
    long_about = "Vigil reviews GitHub pull requests with a two-pass model ensemble.\n\n\
                   The diff is scored and fitted to a character budget, reviewed twice\n\
                   at different sampling temperatures, and the merged findings are\n\
                   validated against the diff before reporting.\n\n\
                   Examples:\n  \
                     vigil review --pr owner/repo#123   Full review of a pull request\n  \
                     vigil triage --pr owner/repo#123   Rank changed files, no model calls\n  \
                     vigil init                         Create a .vigil.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .vigil.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with snake_case keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full model-backed review of a pull request
    #[command(long_about = "Run a full model-backed review of a pull request.\n\n\
        Fetches PR metadata and diff concurrently, fits the diff to the\n\
        configured character budget, runs two concurrent review passes\n\
        (T=0 and T=0.3), merges and deduplicates their findings, and\n\
        validates the candidates with a final model pass.\n\n\
        Requires OPENAI_API_KEY (or api_key in .vigil.toml) and GITHUB_TOKEN.\n\n\
        Examples:\n  vigil review --pr rust-lang/rust#12345\n  vigil review --pr owner/repo#7 --format json")]
    Review {
        /// GitHub PR to review (format: owner/repo#123)
        #[arg(long)]
        pr: String,

        /// GitHub token (default: GITHUB_TOKEN env var)
        #[arg(long)]
        github_token: Option<String>,
    },
    /// Rank a PR's changed files by review priority, without model calls
    #[command(long_about = "Rank a PR's changed files by review priority.\n\n\
        Fetches PR metadata only, filters out noise files (lockfiles,\n\
        minified bundles, build output, snapshots), and ranks the rest by\n\
        total change size. No model calls are made.\n\n\
        Examples:\n  vigil triage --pr owner/repo#123\n  vigil triage --pr owner/repo#123 --format markdown")]
    Triage {
        /// GitHub PR to triage (format: owner/repo#123)
        #[arg(long)]
        pr: String,

        /// GitHub token (default: GITHUB_TOKEN env var)
        #[arg(long)]
        github_token: Option<String>,
    },
    /// Create a default .vigil.toml configuration file
    #[command(long_about = "Create a default .vigil.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .vigil.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("vigil v{version} — automated pull-request review\n");

    println!("Quick start:");
    println!("  vigil init                         Create a .vigil.toml config file");
    println!("  vigil review --pr owner/repo#123   Review a GitHub pull request");
    println!("  vigil triage --pr owner/repo#123   Rank changed files, no model calls\n");

    println!("Run 'vigil <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# Vigil Configuration

[model]
# OpenAI-compatible chat completions provider
# model = "gpt-4o"
# base_url = "https://api.openai.com"
# request_timeout_secs = 45
# api_key = "..."            # default: OPENAI_API_KEY env var

[review]
# max_findings = 15
# diff_budget = 80000
# skip_patterns = ["*.gen.ts", "vendor/**"]
"#;

fn load_config(cli_config: &Option<PathBuf>) -> Result<VigilConfig> {
    match cli_config {
        Some(path) => Ok(VigilConfig::from_file(path)?),
        None => {
            let default_path = std::path::Path::new(".vigil.toml");
            if default_path.exists() {
                Ok(VigilConfig::from_file(default_path)?)
            } else {
                Ok(VigilConfig::default())
            }
        }
    }
}

/// Resolve the model API key from config or `OPENAI_API_KEY`, before any
/// client is constructed.
fn resolve_api_key(config: &mut VigilConfig) -> Result<()> {
    if config.model.api_key.is_none() {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) => config.model.api_key = Some(key),
            Err(_) => {
                miette::bail!(miette::miette!(
                    help = "Set OPENAI_API_KEY or add api_key in your .vigil.toml under [model]",
                    "No API key configured for the model provider"
                ));
            }
        }
    }
    Ok(())
}

fn spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "vigil=debug,warn" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli.config)?;

    match cli.command {
        None => {
            print_welcome();
        }
        Some(Command::Review {
            ref pr,
            ref github_token,
        }) => {
            let (owner, repo, number) = vigil_review::parse_pr_reference(pr)?;

            resolve_api_key(&mut config)?;
            let github = GithubClient::new(github_token.as_deref())?;
            let model = ModelClient::new(&config.model)?;
            let orchestrator = Orchestrator::new(github, model, &config);

            let pb = spinner(&format!("Reviewing {pr}..."));
            let result = orchestrator
                .review(&owner, &repo, number)
                .await
                .inspect_err(|_e| {
                    if let Some(pb) = &pb {
                        pb.finish_with_message("Failed");
                    }
                })?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&result).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => {
                    print!("{}", result.to_markdown());
                }
                OutputFormat::Text => {
                    print!("{result}");
                }
            }
        }
        Some(Command::Triage {
            ref pr,
            ref github_token,
        }) => {
            let (owner, repo, number) = vigil_review::parse_pr_reference(pr)?;

            let github = GithubClient::new(github_token.as_deref())?;
            // No model calls happen; the client only satisfies the pipeline seam.
            let model = ModelClient::new(&config.model)?;
            let orchestrator = Orchestrator::new(github, model, &config);

            let result = orchestrator.triage(&owner, &repo, number).await?;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&result).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => {
                    print!("{}", result.to_markdown());
                }
                OutputFormat::Text => {
                    print!("{result}");
                }
            }
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".vigil.toml");
            if path.exists() {
                miette::bail!(".vigil.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .vigil.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vigil", &mut std::io::stdout());
        }
    }

    Ok(())
}
