use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod catalog;
mod commands;
mod output;

use output::Output;
use service_base::config::Config;
use service_base::repository::Context;

/// service-base - Drive the example catalog through the generic repository
#[derive(Parser)]
#[command(name = "service-base")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Read configuration from this file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH", env = "SERVICE_BASE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog tables if they do not exist
    Init,
    /// Insert navigation classes with example classes under each
    Seed {
        /// Number of navigation classes
        #[arg(long, default_value_t = 3)]
        navigations: u32,

        /// Example classes per navigation class
        #[arg(long = "per-navigation", default_value_t = 25)]
        per_navigation: u32,
    },
    /// Count example classes
    Count {
        /// Only count example classes under this navigation class
        #[arg(long = "navigation-id", conflicts_with = "navigation_name")]
        navigation_id: Option<i64>,

        /// Only count example classes under navigation classes with this name
        #[arg(long = "navigation-name")]
        navigation_name: Option<String>,
    },
    /// List navigation classes by name, with their example classes
    Navigations,
    /// List example classes under a navigation class, by name
    List {
        /// Navigation class id
        #[arg(long = "navigation-id")]
        navigation_id: i64,
    },
    /// Show one page of example classes under a navigation class
    Page {
        /// Navigation class id
        #[arg(long = "navigation-id")]
        navigation_id: i64,

        /// One-based page number (0 means the first page)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page (0 means the default size)
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Show one example class with its navigation class
    Show {
        /// Example class id
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Rename an example class
    Rename {
        /// Example class id
        #[arg(value_name = "ID")]
        id: i64,

        /// New name
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete an example class
    Delete {
        /// Example class id
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Delete every example and navigation class
    Clear,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_for_service("catalog")?,
    };
    if let Err(e) = service_base::observability::init_tracing(&config) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let context = Context::connect(&config.database).await?;
    let output = if cli.json { Output::Json } else { Output::Table };

    match cli.command {
        Commands::Init => commands::init::execute(&context, output).await,
        Commands::Seed {
            navigations,
            per_navigation,
        } => commands::seed::execute(&context, output, navigations, per_navigation).await,
        Commands::Count {
            navigation_id,
            navigation_name,
        } => commands::count::execute(&context, output, navigation_id, navigation_name).await,
        Commands::Navigations => commands::navigations::execute(&context, output).await,
        Commands::List { navigation_id } => {
            commands::list::execute(&context, output, navigation_id).await
        }
        Commands::Page {
            navigation_id,
            page,
            size,
        } => commands::page::execute(&context, output, navigation_id, page, size).await,
        Commands::Show { id } => commands::show::execute(&context, output, id).await,
        Commands::Rename { id, name } => {
            commands::rename::execute(&context, output, id, name).await
        }
        Commands::Delete { id } => commands::delete::execute(&context, output, id).await,
        Commands::Clear => commands::clear::execute(&context, output).await,
    }
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Handle result
    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            // Show context if available
            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_page_with_global_json() {
        let cli = Cli::try_parse_from([
            "service-base",
            "page",
            "--navigation-id",
            "4",
            "--size",
            "15",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Page {
                navigation_id,
                page,
                size,
            } => assert_eq!((navigation_id, page, size), (4, 1, 15)),
            _ => panic!("expected page command"),
        }
    }

    #[test]
    fn test_count_filters_are_exclusive() {
        let cli = Cli::try_parse_from(["service-base", "count", "--navigation-name", "alpha"])
            .unwrap();
        match cli.command {
            Commands::Count {
                navigation_id,
                navigation_name,
            } => {
                assert_eq!(navigation_id, None);
                assert_eq!(navigation_name.as_deref(), Some("alpha"));
            }
            _ => panic!("expected count command"),
        }

        assert!(Cli::try_parse_from([
            "service-base",
            "count",
            "--navigation-id",
            "1",
            "--navigation-name",
            "alpha",
        ])
        .is_err());
    }

    #[test]
    fn test_list_requires_navigation_id() {
        assert!(Cli::try_parse_from(["service-base", "list"]).is_err());
    }
}
