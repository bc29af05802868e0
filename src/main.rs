//! pubsummary - Publication Summary Generator
//!
//! Terminal front end for the faculty publication backend.
//!
//! ## Usage
//!
//! ```bash
//! pubsummary search "Grace Hopper" --institution Yale
//! pubsummary upload roster.xlsx
//! pubsummary download --format csv --output ./exports
//! pubsummary shell
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use pubsummary::config::Config;
use pubsummary::controller::{Controller, Tab};
use pubsummary::transport::{Backend, BackendClient, DownloadFormat};
use pubsummary::{export, render};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Publication Summary Generator
#[derive(Parser)]
#[command(name = "pubsummary")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Backend base URL (overrides PUBSUMMARY_API_URL / API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a single author
    Search {
        /// Author name
        name: String,

        /// Institution (optional)
        #[arg(short, long)]
        institution: Option<String>,

        /// Also save the results to this CSV file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Upload a roster spreadsheet (.csv, .xlsx, .xls) for a bulk search
    Upload {
        /// Roster file
        file: PathBuf,

        /// Also save the results to this CSV file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Download the backend's export of the most recent search
    Download {
        /// Export format
        #[arg(short, long, default_value = "excel", value_parser = ["excel", "csv", "json"])]
        format: String,

        /// Output directory (default: the user's download directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive session
    Shell,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so rendered results stay clean on stdout
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(cli.api_url.as_deref()).context("Invalid backend configuration")?;
    debug!(api_url = %config.api_url, "Resolved backend");
    let client = BackendClient::new(config).context("Failed to create backend client")?;
    let mut controller = Controller::new(client);

    match cli.command {
        Commands::Search {
            name,
            institution,
            save,
        } => {
            controller.submit_single(&name, institution.as_deref()).await;
            finish_one_shot(&controller, save.as_deref())
        }
        Commands::Upload { file, save } => {
            controller.submit_bulk_path(Some(&file)).await;
            finish_one_shot(&controller, save.as_deref())
        }
        Commands::Download { format, output } => {
            let format: DownloadFormat = format.parse()?;
            let dir = output.unwrap_or_else(default_download_dir);
            match controller.download(format, &dir).await {
                Some(path) => {
                    println!("Saved: {}", path.display());
                    Ok(())
                }
                None => anyhow::bail!(controller.state().error.clone().unwrap_or_default()),
            }
        }
        Commands::Shell => run_shell(&mut controller).await,
    }
}

/// Print the result of a one-shot command, or fail with its message.
fn finish_one_shot<B: Backend>(controller: &Controller<B>, save: Option<&Path>) -> Result<()> {
    let state = controller.state();
    if let Some(error) = &state.error {
        anyhow::bail!(error.clone());
    }

    print!("{}", render::view(state));
    if let Some(path) = save {
        let rows = export::save_csv(path, &state.outcome)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        println!("Saved {} rows to {}", rows, path.display());
    }
    Ok(())
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ============================================================================
// Interactive Shell
// ============================================================================

const SHELL_HELP: &str = "\
Commands:
  search <name> [; <institution>]   search for one author
  upload <file>                     bulk search from a .csv/.xlsx/.xls roster
  tab single|bulk                   switch result tab
  faculty <n>                       select a faculty member (bulk results)
  download [excel|csv|json] [dir]   download the backend export
  save [file.csv]                   save the results on screen as CSV
  new                               clear results and start a new search
  show                              redraw the current view
  help                              this text
  quit                              leave";

/// Parsed shell command
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Search { name: String, institution: Option<String> },
    Upload(Option<PathBuf>),
    Tab(Option<Tab>),
    Faculty(Option<usize>),
    Download { format: String, dir: Option<PathBuf> },
    Save(Option<PathBuf>),
    New,
    Show,
    Help,
    Quit,
    Unknown(String),
}

fn parse_shell_command(line: &str) -> Option<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let command = match verb.to_ascii_lowercase().as_str() {
        "search" => {
            let (name, institution) = rest.split_once(';').unwrap_or((rest, ""));
            let institution = institution.trim();
            ShellCommand::Search {
                name: name.trim().to_string(),
                institution: (!institution.is_empty()).then(|| institution.to_string()),
            }
        }
        "upload" => ShellCommand::Upload(arg.map(PathBuf::from)),
        "tab" => ShellCommand::Tab(match rest.to_ascii_lowercase().as_str() {
            "single" | "0" => Some(Tab::Single),
            "bulk" | "1" => Some(Tab::Bulk),
            _ => None,
        }),
        "faculty" => ShellCommand::Faculty(rest.parse().ok()),
        "download" => {
            let mut parts = rest.split_whitespace();
            ShellCommand::Download {
                format: parts.next().unwrap_or("excel").to_string(),
                dir: parts.next().map(PathBuf::from),
            }
        }
        "save" => ShellCommand::Save(arg.map(PathBuf::from)),
        "new" | "reset" => ShellCommand::New,
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => ShellCommand::Unknown(other.to_string()),
    };
    Some(command)
}

async fn run_shell<B: Backend>(controller: &mut Controller<B>) -> Result<()> {
    println!("Publication Summary Generator");
    println!("{}", SHELL_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_shell_command(&line) else {
            continue;
        };

        match command {
            ShellCommand::Search { name, institution } => {
                println!("Searching...");
                controller.submit_single(&name, institution.as_deref()).await;
                print!("{}", render::view(controller.state()));
            }
            ShellCommand::Upload(path) => {
                println!("Uploading...");
                controller.submit_bulk_path(path.as_deref()).await;
                print!("{}", render::view(controller.state()));
            }
            ShellCommand::Tab(Some(tab)) => {
                if controller.select_tab(tab) {
                    print!("{}", render::view(controller.state()));
                } else {
                    println!("That tab has no results.");
                }
            }
            ShellCommand::Tab(None) => println!("Usage: tab single|bulk"),
            ShellCommand::Faculty(Some(index)) => match controller.select_faculty(index) {
                Ok(()) => print!("{}", render::view(controller.state())),
                Err(e) => println!("{}", e),
            },
            ShellCommand::Faculty(None) => println!("Usage: faculty <n>"),
            ShellCommand::Download { format, dir } => match format.parse::<DownloadFormat>() {
                Ok(format) => {
                    let dir = dir.unwrap_or_else(default_download_dir);
                    match controller.download(format, &dir).await {
                        Some(path) => println!("Saved: {}", path.display()),
                        None => print!("{}", render::view(controller.state())),
                    }
                }
                Err(e) => println!("{}", e),
            },
            ShellCommand::Save(path) => {
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(format!(
                        "pubsummary_{}.csv",
                        Local::now().format("%Y%m%d_%H%M%S")
                    ))
                });
                match export::save_csv(&path, &controller.state().outcome) {
                    Ok(rows) => println!("Saved {} rows to {}", rows, path.display()),
                    Err(e) => println!("Failed to save {}: {}", path.display(), e),
                }
            }
            ShellCommand::New => {
                controller.reset();
                println!("Cleared.");
            }
            ShellCommand::Show => print!("{}", render::view(controller.state())),
            ShellCommand::Help => println!("{}", SHELL_HELP),
            ShellCommand::Quit => break,
            ShellCommand::Unknown(verb) => println!("Unknown command '{}'. Type 'help'.", verb),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_with_institution() {
        assert_eq!(
            parse_shell_command("search Grace Hopper ; Yale University"),
            Some(ShellCommand::Search {
                name: "Grace Hopper".to_string(),
                institution: Some("Yale University".to_string()),
            })
        );
        assert_eq!(
            parse_shell_command("SEARCH Ada"),
            Some(ShellCommand::Search {
                name: "Ada".to_string(),
                institution: None,
            })
        );
        assert_eq!(
            parse_shell_command("search"),
            Some(ShellCommand::Search {
                name: String::new(),
                institution: None,
            })
        );
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse_shell_command("tab bulk"), Some(ShellCommand::Tab(Some(Tab::Bulk))));
        assert_eq!(parse_shell_command("tab 0"), Some(ShellCommand::Tab(Some(Tab::Single))));
        assert_eq!(parse_shell_command("tab x"), Some(ShellCommand::Tab(None)));
        assert_eq!(parse_shell_command("faculty 2"), Some(ShellCommand::Faculty(Some(2))));
        assert_eq!(parse_shell_command("faculty -1"), Some(ShellCommand::Faculty(None)));
        assert_eq!(parse_shell_command("   "), None);
    }

    #[test]
    fn test_parse_download_and_save() {
        assert_eq!(
            parse_shell_command("download"),
            Some(ShellCommand::Download {
                format: "excel".to_string(),
                dir: None,
            })
        );
        assert_eq!(
            parse_shell_command("download csv /tmp/out"),
            Some(ShellCommand::Download {
                format: "csv".to_string(),
                dir: Some(PathBuf::from("/tmp/out")),
            })
        );
        assert_eq!(parse_shell_command("save"), Some(ShellCommand::Save(None)));
        assert_eq!(parse_shell_command("upload"), Some(ShellCommand::Upload(None)));
        assert_eq!(parse_shell_command("bogus"), Some(ShellCommand::Unknown("bogus".to_string())));
    }
}
