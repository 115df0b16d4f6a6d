mod commands;
mod context;
mod output;
mod secrets;
mod template;
mod traits;

use clap::{Parser, Subcommand};
use commands::{GenerateSecretsCommand, RenderConfigCommand, TcpWaitCommand};
use context::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "matrix-tools")]
#[command(about = "Init-container helpers for homeserver deployments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge YAML config fragments, resolving ${NAME} placeholders
    RenderConfig {
        /// Config sources, merged in the order given
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Write the merged config here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the merged config when writing to --output
        #[arg(long)]
        debug: bool,
    },

    /// Generate missing keys into managed Kubernetes secrets
    GenerateSecrets {
        /// Comma-separated list of name:key:type entries
        #[arg(long)]
        secrets: String,

        /// Comma-separated list of key=value labels for generated secrets
        #[arg(long)]
        labels: Option<String>,

        /// Namespace of the secrets (defaults to the pod's namespace)
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Block until a TCP address accepts connections
    Tcpwait {
        /// Address to wait for, as host:port
        #[arg(long)]
        address: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let ctx = Context::new();

    let result = match cli.command {
        Commands::RenderConfig {
            sources,
            output,
            debug,
        } => RenderConfigCommand::execute(&ctx, &sources, output.as_deref(), debug),
        Commands::GenerateSecrets {
            secrets,
            labels,
            namespace,
        } => GenerateSecretsCommand::execute(
            &ctx,
            &secrets,
            labels.as_deref(),
            namespace.as_deref(),
        ),
        Commands::Tcpwait { address } => TcpWaitCommand::execute(&ctx, &address),
    };

    if let Err(err) = result {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
