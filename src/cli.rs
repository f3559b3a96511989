use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "perimeter",
    about = "Perimeter - Deterministic attack-surface risk scoring and intrusion simulation",
    version
)]

pub struct Args {
    /// Root domain to assess (e.g. example.com)
    #[arg(short, long)]
    pub domain: String,

    /// Pre-collected asset inventory (JSON array of {subdomain, ip, open_ports})
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the full assessment report to a JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the attack-path simulation
    #[arg(long)]
    pub skip_simulation: bool,

    /// Skip the posture assessment
    #[arg(long)]
    pub skip_posture: bool,

    /// Deterministic output only, even when an enricher is configured
    #[arg(long)]
    pub deterministic: bool,

    /// Enable verbose logging of all operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}
