use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::{collections::BTreeMap, collections::HashSet, fs};

use sunny_as::cli::{knowledge_base_file, Args, Command};
use sunny_as::cross_validation;
use sunny_as::csv_parser::{self, RuntimeTable, Scenario};
use sunny_as::datastructures::*;
use sunny_as::knowledge_base::KnowledgeBase;
use sunny_as::predictor::Predictor;
use sunny_as::scorer;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    match &args.command {
        Command::Train {
            scenario,
            kb_path,
            kb_name,
            ..
        } => {
            let train_config = args.command.to_train_config();
            let data = Scenario::from_dir(scenario)?;
            let kb = KnowledgeBase::build(&data, &train_config)?;
            let path = knowledge_base_file(scenario, kb_path, kb_name.as_deref())?;
            kb.save(&path)?;
            info!("Knowledge base written to {}", path.display());
        }
        Command::Test {
            scenario,
            kb,
            out,
            print_static,
            ..
        } => {
            let data = Scenario::from_dir(scenario)?;
            let kb = KnowledgeBase::load(kb)?;
            let predictor = match Predictor::new(&kb, args.command.to_overrides()) {
                Ok(predictor) => predictor,
                Err(e) => {
                    error!("{e:#}");
                    std::process::exit(exitcode::CONFIG);
                }
            };
            let predictions = data
                .features
                .iter()
                .map(|(instance, raw)| {
                    let raw = raw.to_vec();
                    let cost = data.feature_cost(instance);
                    let schedule = if *print_static {
                        predictor.predict(&raw, cost)?
                    } else {
                        predictor.predict_dynamic(&raw, cost)?
                    };
                    Ok(Prediction::new(instance.clone(), schedule))
                })
                .collect::<Result<Vec<_>>>()?;
            match out {
                Some(path) => csv_parser::write_predictions(&predictions, path)?,
                None => csv_parser::print_predictions(&predictions)?,
            }
        }
        Command::Score {
            scenario,
            predictions,
            timeout,
        } => {
            let data = Scenario::from_dir(scenario)?;
            let timeout = timeout.unwrap_or(data.timeout());
            if timeout <= 0.0 {
                error!("The timeout must be positive");
                std::process::exit(exitcode::CONFIG);
            }
            let mut predictions = csv_parser::read_predictions(predictions)?;
            let predicted: HashSet<String> =
                predictions.iter().map(|p| p.instance.clone()).collect();
            for instance in data.instances() {
                if !predicted.contains(instance) {
                    predictions.push(Prediction::new(instance.clone(), Schedule::default()));
                }
            }
            let ground_truth = RuntimeTable::from_records(&data.runs, timeout)?;
            let stats =
                scorer::score_fold(&predictions, &ground_truth, timeout, &data.feature_costs)?;
            println!("{}", stats.summary()?);
        }
        Command::Evaluate { scenarios, out, .. } => {
            let settings = args.command.to_evaluation_settings();
            if settings.num_folds < 2 {
                error!("At least 2 folds are needed");
                std::process::exit(exitcode::CONFIG);
            }
            let mut summaries = BTreeMap::new();
            for scenario in scenarios {
                let data = Scenario::from_dir(scenario)?;
                let summary = cross_validation::evaluate(&data, &settings)?.summary()?;
                println!("Scenario {}\n{summary}", data.description.scenario_id);
                summaries.insert(data.description.scenario_id.clone(), summary);
            }
            if let Some(out) = out {
                serde_json::to_writer_pretty(fs::File::create(out)?, &summaries)?;
                info!("Summaries written to {}", out.display());
            }
        }
    }
    Ok(())
}
