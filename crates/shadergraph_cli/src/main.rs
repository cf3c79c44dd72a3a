// SPDX-License-Identifier: MIT OR Apache-2.0
//! `shadergraph` - validate and inspect shader graph files.
//!
//! Graphs are stored as RON. Validation resolves every slot type and
//! reports incompatible connections, dangling edges and cycles. The exit
//! code is non-zero when any node ends in error.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Shader graph tools
#[derive(Parser)]
#[command(name = "shadergraph", version, about = "Shader graph validation tools")]
struct Cli {
    /// Settings file (RON); defaults apply when omitted
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Log debug output from the validator
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Available subcommands
#[derive(Subcommand)]
enum Command {
    /// Validate every node of a graph
    Validate {
        /// Graph file
        graph: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the built-in node types
    Nodes {
        /// Only list one category (e.g. "math")
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Print the material properties exposed by a graph as JSON
    Properties {
        /// Graph file
        graph: PathBuf,
    },
    /// Write a small example graph
    Demo {
        /// Output file
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "shadergraph=debug,shadergraph_cli=debug"
    } else {
        "shadergraph=info,shadergraph_cli=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = commands::load_settings(cli.settings.as_deref()).and_then(|settings| {
        match cli.command {
            Command::Validate { graph, json } => commands::validate(&graph, json),
            Command::Nodes { category } => commands::list_nodes(category.as_deref()),
            Command::Properties { graph } => commands::properties(&graph, &settings),
            Command::Demo { output } => commands::demo(&output),
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
