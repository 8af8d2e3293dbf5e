use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "license-sweeper",
    about = "Remove complimentary package licenses that no paid license depends on",
    version
)]
pub struct Cli {
    /// Config file [default: ./.license-sweeper/config.toml, fallback ~/.config/license-sweeper/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Gateway base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    pub gateway: Option<String>,

    /// Packages per catalog request (overrides the config file)
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Directory for the removal audit log (overrides the config file)
    #[arg(long, value_name = "DIR")]
    pub audit_dir: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print license changes, failures and the summary
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
