use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    about = "Prototype host that drives the rooftop scene without a live runtime",
    version
)]
pub struct Args {
    /// Built-in event sequence to run when no script is given
    #[arg(long, value_enum)]
    pub demo: Option<DemoKind>,

    /// Path to a JSON inbound-event script to replay instead of a demo
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Bind address for streaming the live command feed (e.g. 127.0.0.1:4650)
    #[arg(long)]
    pub bind: Option<String>,

    /// Base URL model assets are fetched from
    #[arg(long, default_value = "https://mre-rooftop.herokuapp.com")]
    pub base_url: String,

    /// Path to write the scene snapshot JSON
    #[arg(long)]
    pub snapshot_json: Option<PathBuf>,

    /// Path to write the outbound command log JSON
    #[arg(long)]
    pub command_log_json: Option<PathBuf>,

    /// List every staged actor in the closing summary
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoKind {
    /// Session start, one user, an open wave and a close wave
    Curtains,
    /// Session start and a run through the window patterns
    Windows,
    /// Everything: users, curtains, windows, spotlight, collision
    Full,
}

#[derive(Debug)]
pub enum EventSource {
    Demo(DemoKind),
    Script(PathBuf),
}

#[derive(Debug)]
pub struct RunArgs {
    pub source: EventSource,
    pub bind: Option<String>,
    pub base_url: String,
    pub snapshot_json: Option<PathBuf>,
    pub command_log_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<RunArgs> {
    Args::parse().into_run_args()
}

impl Args {
    fn into_run_args(self) -> Result<RunArgs> {
        let source = match (self.demo, self.script) {
            (Some(_), Some(_)) => bail!("--demo and --script cannot be combined"),
            (Some(kind), None) => EventSource::Demo(kind),
            (None, Some(path)) => EventSource::Script(path),
            (None, None) => EventSource::Demo(DemoKind::Full),
        };

        Ok(RunArgs {
            source,
            bind: self.bind,
            base_url: self.base_url,
            snapshot_json: self.snapshot_json,
            command_log_json: self.command_log_json,
            verbose: self.verbose,
        })
    }
}
