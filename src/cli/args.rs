use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mirrorcheck")]
#[command(
    about = "Differential correctness harness for user-space passthrough filesystems"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run verification scenarios against a passthrough filesystem")]
    Run {
        #[arg(help = "Path to the filesystem-under-test executable")]
        fs_binary: PathBuf,

        #[arg(long, help = "Run only the named scenario (repeatable; see 'list')")]
        scenario: Vec<String>,

        #[arg(long, help = "RNG seed; drawn from OS entropy when omitted")]
        seed: Option<u64>,

        #[arg(long, help = "Iteration budget passed to the filesystem under test")]
        iterations: Option<u64>,

        #[arg(long, help = "Probability of injected operation delay, in [0, 1]")]
        delay_probability: Option<f64>,

        #[arg(long, help = "Probability of injected operation failure, in [0, 1]")]
        error_probability: Option<f64>,

        #[arg(long, help = "Paired seek+read iterations for the random-access scenario")]
        read_iterations: Option<u64>,

        #[arg(long, help = "Fixture file size in bytes")]
        file_size: Option<u64>,

        #[arg(long, help = "JSON report output")]
        json: bool,

        #[arg(long, help = "Machine-readable report output (tab-separated values)")]
        porcelain: bool,
    },
    #[command(about = "List verification scenarios")]
    List {
        #[arg(long, help = "Machine-readable output (tab-separated values)")]
        porcelain: bool,

        #[arg(long, help = "JSON output")]
        json: bool,
    },
    #[command(about = "Clean up leftover harness state")]
    Cleanup {
        #[arg(long, help = "Unmount stale harness mounts from crashed runs")]
        stale: bool,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    #[command(about = "Show current configuration values")]
    Show,
    #[command(about = "Open config file in editor")]
    Edit,
    #[command(about = "Show config file path")]
    Path,
}
