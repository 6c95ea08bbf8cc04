use clap::{Parser, Subcommand};
use sahay::Result;
use sahay::commands::{run_ingest, run_serve, show_status};

#[derive(Parser)]
#[command(name = "sahay")]
#[command(about = "Retrieval-augmented question answering over the PM-KISAN scheme document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index from the configured PDF
    Ingest,
    /// Launch the interactive web chat interface
    Serve,
    /// Show the state of the credentials, document, index, and log
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let base_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Ingest => run_ingest(&base_dir).await,
        Commands::Serve => run_serve(&base_dir).await,
        Commands::Status => show_status(&base_dir).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["sahay", "ingest"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Ingest);
        }
    }

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["sahay", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Serve);
        }
    }

    #[test]
    fn status_command() {
        let cli = Cli::try_parse_from(["sahay", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["sahay", "crawl"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn ingest_takes_no_flags() {
        let cli = Cli::try_parse_from(["sahay", "ingest", "--force"]);
        assert!(cli.is_err());
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["sahay", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
