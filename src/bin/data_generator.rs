use std::collections::HashMap;
use std::ops::Range;

use clap::Parser;
use ndarray::Array2;
use std::{fs, path::PathBuf};

use anyhow::{ensure, Result};
use log::info;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use sunny_as::csv_parser::{FeatureTable, Scenario, ScenarioDescription};
use sunny_as::datastructures::{RunStatus, RuntimeRecord};

#[derive(Serialize, Deserialize, Debug, Clone)]
struct InstanceRangeConfig {
    mean: f64,
    std: f64,
    range: Range<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct AlgorithmConfig {
    name: String,
    instance_range_configs: Vec<InstanceRangeConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FeatureConfig {
    name: String,
    instance_range_configs: Vec<InstanceRangeConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct DataGeneratorConfig {
    scenario_id: String,
    algorithm_configs: Vec<AlgorithmConfig>,
    feature_configs: Vec<FeatureConfig>,
    num_instances: usize,
    timeout: f64,
    #[serde(default)]
    feature_cost: Option<f64>,
    seed: u64,
    out_path: PathBuf,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: PathBuf,
    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let Ok(config) = fs::read_to_string(&args.config)
        .map_err(anyhow::Error::from)
        .and_then(|s| Ok(serde_json::from_str::<DataGeneratorConfig>(&s)?))
    else {
        std::process::exit(exitcode::CONFIG);
    };
    let out_path = config.out_path.clone();
    let scenario = generate_scenario(&config)?;
    scenario.write_to_dir(&out_path)?;
    info!(
        "Wrote scenario {} with {} instances to {}",
        config.scenario_id,
        config.num_instances,
        out_path.display()
    );
    Ok(())
}

fn instance_name(idx: usize) -> String {
    format!("{}{}", "instance", idx)
}

/// Samples one value per instance; instances outside every range get `None`.
fn sample_per_instance(
    instance_range_configs: &[InstanceRangeConfig],
    num_instances: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Option<f64>>> {
    let mut values = vec![None; num_instances];
    for InstanceRangeConfig { mean, std, range } in instance_range_configs {
        let distrib = Normal::new(*mean, (*mean * *std).abs())?;
        for idx in range.clone().filter(|&idx| idx < num_instances) {
            values[idx] = Some(distrib.sample(rng));
        }
    }
    Ok(values)
}

fn generate_scenario(config: &DataGeneratorConfig) -> Result<Scenario> {
    ensure!(config.timeout > 0.0, "the timeout must be positive");
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let num_instances = config.num_instances;
    let instances = (0..num_instances).map(instance_name).collect::<Vec<_>>();

    let mut runs = Vec::with_capacity(num_instances * config.algorithm_configs.len());
    let runtimes = config
        .algorithm_configs
        .iter()
        .map(|algorithm| {
            sample_per_instance(&algorithm.instance_range_configs, num_instances, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;
    for (idx, instance) in instances.iter().enumerate() {
        for (algorithm, samples) in config.algorithm_configs.iter().zip(&runtimes) {
            let record = match samples[idx] {
                Some(time) if time < config.timeout => RuntimeRecord::new(
                    instance.clone(),
                    algorithm.name.clone(),
                    RunStatus::Ok,
                    Some(time.max(0.01)),
                ),
                _ => RuntimeRecord::new(
                    instance.clone(),
                    algorithm.name.clone(),
                    RunStatus::Timeout,
                    Some(config.timeout),
                ),
            };
            runs.push(record);
        }
    }

    let columns = config
        .feature_configs
        .iter()
        .map(|feature| {
            sample_per_instance(&feature.instance_range_configs, num_instances, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;
    let values = Array2::from_shape_fn((num_instances, columns.len()), |(i, j)| {
        columns[j][i].unwrap_or(f64::NAN)
    });
    let feature_costs = match config.feature_cost {
        Some(cost) => instances.iter().map(|i| (i.clone(), cost)).collect(),
        None => HashMap::new(),
    };

    Scenario::new(
        ScenarioDescription {
            scenario_id: config.scenario_id.clone(),
            timeout: config.timeout,
            portfolio: config
                .algorithm_configs
                .iter()
                .map(|algorithm| algorithm.name.clone())
                .collect(),
            features: config
                .feature_configs
                .iter()
                .map(|feature| feature.name.clone())
                .collect(),
        },
        runs,
        FeatureTable::new(instances, values)?,
        feature_costs,
    )
}
