use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rested",
    about = "Rested: serve a resource tree as a JSON API",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the demonstration tree over HTTP
    Serve(ServeArgs),
    /// Dispatch one request in-process and print the response
    Request(RequestArgs),
    /// Print the effective server configuration as TOML
    Config(ConfigArgs),
}

/// Settings shared by every command that builds a server.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// URL prefix to mount the tree under
    #[arg(long)]
    pub prefix: Option<String>,
    /// Explain error responses in their bodies
    #[arg(long)]
    pub debug: bool,
    /// Emit compact JSON instead of indented JSON
    #[arg(long)]
    pub compact: bool,
    /// Disable gzip compression
    #[arg(long)]
    pub no_gzip: bool,
    /// Directory of static files served outside the prefix
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args)]
pub struct RequestArgs {
    /// HTTP method, e.g. GET
    pub method: String,
    /// Path relative to the tree root, e.g. users/1
    pub path: String,
    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,
    #[command(flatten)]
    pub config: ConfigArgs,
}
