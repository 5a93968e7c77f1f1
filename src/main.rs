//! Binary entry point for movie-graph.
//!
//! This binary provides the CLI and the REST server for the movie graph.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use movie_graph::config::MovieGraphConfig;
use movie_graph::models::{AddDataRequest, YearInput};
use movie_graph::observability::{self, InitOptions};
use movie_graph::services::{BackendFactory, MovieCatalog};
use movie_graph::storage::GraphStore;
use secrecy::ExposeSecret;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Exit code for lookups that found nothing.
const EXIT_NOT_FOUND: u8 = 2;

/// movie-graph - query and update a graph of movies and the people behind them.
#[derive(Parser)]
#[command(name = "movie-graph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "MOVIE_GRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the REST API server.
    Serve {
        /// Bind host (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List all movie titles.
    Movies,

    /// List all person names.
    People,

    /// Show a movie and everyone credited on it.
    Movie {
        /// Exact movie title.
        title: String,
    },

    /// List the movies a person acted in.
    Actor {
        /// Exact person name.
        name: String,
    },

    /// List the movies a person directed or produced.
    DirectorProducer {
        /// Exact person name.
        name: String,
    },

    /// List movies sharing a director or producer with a movie.
    Related {
        /// Exact movie title.
        title: String,
    },

    /// Show the person with the most acting credits.
    TopActor,

    /// Add or update a movie, optionally with one credit.
    Add {
        /// Movie title.
        #[arg(long)]
        title: String,

        /// Release year.
        #[arg(long)]
        year: String,

        /// Tagline.
        #[arg(long)]
        tagline: Option<String>,

        /// Credited person.
        #[arg(long, requires = "role")]
        person: Option<String>,

        /// Credit role: ACTED_IN, DIRECTED, PRODUCED or WROTE.
        #[arg(long, requires = "person")]
        role: Option<String>,
    },

    /// Manage configuration.
    Config {
        /// Show resolved configuration.
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "movie-graph",
            &mut std::io::stdout(),
        );
        return ExitCode::SUCCESS;
    }

    let config = match MovieGraphConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let expose_metrics = matches!(cli.command, Commands::Serve { .. });
    let _observability = match observability::init_from_config(
        &config,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: expose_metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        },
    }
}

/// Maps a failure to the process exit status.
fn exit_status(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<movie_graph::Error>() {
        Some(movie_graph::Error::NotFound { .. }) => EXIT_NOT_FOUND,
        _ => 1,
    }
}

type Catalog = MovieCatalog<Arc<dyn GraphStore>>;

/// Runs the selected command.
fn run_command(command: Commands, mut config: MovieGraphConfig) -> anyhow::Result<()> {
    if let Commands::Config { show } = command {
        cmd_config(&config, show);
        return Ok(());
    }

    if let Commands::Serve { host, port } = &command {
        if let Some(host) = host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }

    let store = BackendFactory::create_graph_store(&config.store)
        .with_context(|| format!("failed to open {} graph store", config.store.backend))?;
    let catalog = Arc::new(MovieCatalog::new(store));

    match command {
        Commands::Serve { .. } => cmd_serve(&catalog, &config),
        Commands::Movies => print_json(&catalog.list_movies()?),
        Commands::People => print_json(&catalog.list_people()?),
        Commands::Movie { title } => print_json(&catalog.movie_details(&title)?),
        Commands::Actor { name } => print_json(&catalog.actor_filmography(&name)?),
        Commands::DirectorProducer { name } => {
            print_json(&catalog.director_producer_filmography(&name)?)
        },
        Commands::Related { title } => print_json(&catalog.related_movies(&title)?),
        Commands::TopActor => print_json(&catalog.top_actor()?),
        Commands::Add {
            title,
            year,
            tagline,
            person,
            role,
        } => {
            let request = AddDataRequest {
                movie_title: Some(title),
                movie_year: Some(YearInput::Text(year)),
                movie_tagline: tagline,
                person_name: person,
                person_role: role,
            };
            print_json(&catalog.add_data(&request)?)
        },
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

/// Serve command.
#[cfg(feature = "http")]
fn cmd_serve(catalog: &Arc<Catalog>, config: &MovieGraphConfig) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create server runtime")?;
    let result = rt.block_on(movie_graph::http::serve(Arc::clone(catalog), &config.server));
    // The caller still holds the catalog, so the store is dropped outside the
    // server runtime.
    drop(rt);
    result.context("server failed")
}

/// Serve command (feature not enabled).
#[cfg(not(feature = "http"))]
fn cmd_serve(_catalog: &Arc<Catalog>, _config: &MovieGraphConfig) -> anyhow::Result<()> {
    Err(movie_graph::Error::FeatureNotEnabled("http".to_string()).into())
}

/// Config command.
fn cmd_config(config: &MovieGraphConfig, show: bool) {
    if !show {
        println!("Use --show to display configuration");
        return;
    }

    let password_set = !config.store.neo4j.password.expose_secret().is_empty();

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("Store:");
    println!("  Backend: {}", config.store.backend);
    println!("  SQLite Path: {}", config.store.sqlite_path.display());
    println!("  Neo4j URI: {}", config.store.neo4j.uri);
    println!("  Neo4j User: {}", config.store.neo4j.user);
    println!(
        "  Neo4j Password: {}",
        if password_set { "(set)" } else { "(not set)" }
    );
    println!();
    println!("Server:");
    println!("  Address: {}", config.server.bind_address());
    println!("  CORS Origin: {}", config.server.cors_origin);
    println!();
    println!("Logging:");
    println!("  Format: {:?}", config.logging.format);
    println!("  Level: {}", config.logging.level);
    println!(
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );
    println!();
    println!("Metrics:");
    println!(
        "  Prometheus Port: {}",
        config
            .metrics
            .prometheus_port
            .map_or_else(|| "(disabled)".to_string(), |p| p.to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_requires_person_and_role_together() {
        let result = Cli::try_parse_from([
            "movie-graph",
            "add",
            "--title",
            "Heat",
            "--year",
            "1995",
            "--person",
            "Al Pacino",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "movie-graph",
            "add",
            "--title",
            "Heat",
            "--year",
            "1995",
            "--person",
            "Al Pacino",
            "--role",
            "ACTED_IN",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Add { person: Some(_), role: Some(_), .. }));
    }

    #[test]
    fn test_not_found_exit_code() {
        let not_found = anyhow::Error::new(movie_graph::Error::NotFound {
            entity: "movie",
            key: "Heat".to_string(),
        });
        assert_eq!(exit_status(&not_found), EXIT_NOT_FOUND);

        let invalid = anyhow::Error::new(movie_graph::Error::InvalidRole("HACKED".to_string()));
        assert_eq!(exit_status(&invalid), 1);

        let other = anyhow::anyhow!("boom");
        assert_eq!(exit_status(&other), 1);
    }
}
