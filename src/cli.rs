use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pointsim",
    version,
    about = "Stochastic point-process spiking network simulator",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulation described by a JSON config file
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file with `connectivity` and `simulation` sections
    #[arg(short, long)]
    pub config: PathBuf,

    /// Generator seed; drawn at random and logged when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write the trajectory and spike log here as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Neurons to rasterize into dense spike trains in the output
    #[arg(long, value_delimiter = ',')]
    pub raster: Vec<usize>,
}
