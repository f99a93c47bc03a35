use std::collections::BTreeMap;
use std::fs;

use anyhow::Context;
use pointsim::{Connectivity, RectifiedPower, SimConfig, SimOutput, Simulation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::RunArgs;

/// `J` as written in a config file: a matrix, a single-neuron scalar, or an
/// all-to-all weight.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConnectivitySpec {
    Rows(Vec<Vec<f64>>),
    Scalar(f64),
    Uniform { weight: f64, size: usize },
}

impl ConnectivitySpec {
    fn build(self) -> anyhow::Result<Connectivity> {
        Ok(match self {
            ConnectivitySpec::Rows(rows) => Connectivity::from_rows(rows)?,
            ConnectivitySpec::Scalar(weight) => Connectivity::scalar(weight),
            ConnectivitySpec::Uniform { weight, size } => Connectivity::Uniform { weight, size },
        })
    }
}

#[derive(Debug, Deserialize)]
struct RunFile {
    connectivity: ConnectivitySpec,
    #[serde(default)]
    simulation: SimConfig,
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    config: &'a SimConfig,
    #[serde(flatten)]
    output: &'a SimOutput,
    rasters: BTreeMap<usize, Vec<f64>>,
}

pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let file: RunFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.config.display()))?;

    let sim = Simulation::new(file.connectivity.build()?, file.simulation)?;
    for &neuron in &args.raster {
        anyhow::ensure!(
            neuron < sim.size(),
            "raster neuron {neuron} out of range for {} neurons",
            sim.size()
        );
    }

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!(
        seed,
        neurons = sim.size(),
        steps = sim.steps(),
        policy = ?sim.config().policy,
        "running simulation"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let output = sim.run(&RectifiedPower, &mut rng);

    let duration = sim.steps() as f64 * sim.config().dt;
    let mean_rate = output.spikes.len() as f64 / (sim.size() as f64 * duration);
    info!(spikes = output.spikes.len(), mean_rate, "simulation finished");

    let Some(path) = &args.output else {
        return Ok(());
    };

    let rasters = args
        .raster
        .iter()
        .map(|&neuron| (neuron, output.spike_train(neuron).to_vec()))
        .collect();
    let report = Report {
        seed,
        config: sim.config(),
        output: &output,
        rasters,
    };

    let json = serde_json::to_string(&report).context("serializing results")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "results written");

    Ok(())
}
