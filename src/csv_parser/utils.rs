use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use itertools::{izip, Itertools};
use log::warn;
use ndarray::Array2;
use polars::prelude::*;

use super::FeatureTable;
use crate::datastructures::*;
use crate::scorer::group_predictions;

const INSTANCE_FIELD: &str = "instance_id";
const REPETITION_FIELD: &str = "repetition";

/// Reads a CSV with header, `#` comments and `?` as missing value.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_comment_char(Some(b'#'))
        .has_header(true)
        .infer_schema(None)
        .with_null_values(Some(NullValues::AllColumnsSingle("?".to_string())))
        .finish()
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn write_csv(df: DataFrame, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv_to(df, file)
}

fn write_csv_to(mut df: DataFrame, writer: impl Write) -> Result<()> {
    CsvWriter::new(writer).has_header(true).finish(&mut df)?;
    Ok(())
}

/// A column as strings, an error on missing values.
pub fn column_to_strings(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
    let series = df.column(column_name)?.cast(&DataType::Utf8)?;
    let values = series.utf8()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).with_context(|| {
                format!("missing value in column {column_name}, row {row}")
            })
        })
        .collect()
}

/// Missing and non-numeric values become `None`.
pub fn column_to_f64(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(column_name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn column_to_f64_array(
    df: &DataFrame,
    column_name: &str,
) -> Result<ndarray::Array1<f64>> {
    Ok(column_to_f64(df, column_name)?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

/// Reads an ASlib runtime table:
/// `instance_id,repetition,algorithm,runtime,runstatus`.
pub fn read_runtimes(path: &Path) -> Result<Vec<RuntimeRecord>> {
    let df = read_csv(path)?
        .lazy()
        .select([
            col(INSTANCE_FIELD).cast(DataType::Utf8),
            col("algorithm").cast(DataType::Utf8),
            col("runtime").cast(DataType::Float64),
            col("runstatus").cast(DataType::Utf8),
        ])
        .collect()
        .with_context(|| format!("malformed runtime table {}", path.display()))?;
    let instances = column_to_strings(&df, INSTANCE_FIELD)?;
    let solvers = column_to_strings(&df, "algorithm")?;
    let runtimes = column_to_f64(&df, "runtime")?;
    let statuses = column_to_strings(&df, "runstatus")?;
    izip!(instances, solvers, runtimes, statuses)
        .map(|(instance, solver, runtime, status)| {
            Ok(RuntimeRecord::new(instance, solver, status.parse()?, runtime))
        })
        .collect()
}

/// Writes runtime records in the layout read by [`read_runtimes`].
pub fn write_runtimes(records: &[RuntimeRecord], path: &Path) -> Result<()> {
    let df = df! {
        INSTANCE_FIELD => records.iter().map(|r| r.instance.clone()).collect_vec(),
        REPETITION_FIELD => vec![1_i64; records.len()],
        "algorithm" => records.iter().map(|r| r.solver.clone()).collect_vec(),
        "runtime" => records.iter().map(|r| r.runtime).collect_vec(),
        "runstatus" => records.iter().map(|r| r.status.to_string()).collect_vec(),
    }?;
    write_csv(df, path)
}

/// Reads the declared feature columns of a feature table. Only the first
/// repetition of each instance is kept.
pub fn read_features(path: &Path, features: &[String]) -> Result<FeatureTable> {
    let df = read_csv(path)?;
    let instances = column_to_strings(&df, INSTANCE_FIELD)?;
    let columns = features
        .iter()
        .map(|feature| {
            column_to_f64_array(&df, feature).with_context(|| {
                format!("feature {feature} missing in {}", path.display())
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let mut seen = HashSet::new();
    let rows = instances
        .iter()
        .enumerate()
        .filter(|(_, instance)| {
            let first = seen.insert(instance.as_str());
            if !first {
                warn!("Ignoring repeated feature row of instance {instance}");
            }
            first
        })
        .map(|(row, _)| row)
        .collect_vec();
    let values = Array2::from_shape_fn((rows.len(), columns.len()), |(i, j)| {
        columns[j][rows[i]]
    });
    FeatureTable::new(
        rows.iter().map(|&row| instances[row].clone()).collect(),
        values,
    )
}

/// Writes the feature table, missing values as empty fields.
pub fn write_features(
    table: &FeatureTable,
    features: &[String],
    path: &Path,
) -> Result<()> {
    let mut columns = vec![
        Series::new(INSTANCE_FIELD, table.instances.clone()),
        Series::new(REPETITION_FIELD, vec![1_i64; table.len()]),
    ];
    columns.extend(table.values.columns().into_iter().zip(features).map(
        |(column, name)| {
            Series::new(
                name,
                column
                    .iter()
                    .map(|&v| if v.is_nan() { None } else { Some(v) })
                    .collect_vec(),
            )
        },
    ));
    write_csv(DataFrame::new(columns)?, path)
}

/// Total feature computation cost per instance, summed over all feature
/// steps with a known cost.
pub fn read_feature_costs(path: &Path) -> Result<HashMap<String, f64>> {
    let df = read_csv(path)?;
    let instances = column_to_strings(&df, INSTANCE_FIELD)?;
    let steps = df
        .get_column_names()
        .into_iter()
        .filter(|name| *name != INSTANCE_FIELD && *name != REPETITION_FIELD)
        .map(|name| column_to_f64(&df, name))
        .collect::<Result<Vec<_>>>()?;
    Ok(instances
        .into_iter()
        .enumerate()
        .map(|(row, instance)| {
            let cost = steps.iter().filter_map(|step| step[row]).sum::<f64>();
            (instance, cost)
        })
        .collect())
}

/// Writes one total cost column per instance.
pub fn write_feature_costs(costs: &[(String, f64)], path: &Path) -> Result<()> {
    let df = df! {
        INSTANCE_FIELD => costs.iter().map(|(i, _)| i.clone()).collect_vec(),
        REPETITION_FIELD => vec![1_i64; costs.len()],
        "cost" => costs.iter().map(|(_, c)| *c).collect_vec(),
    }?;
    write_csv(df, path)
}

/// Writes predictions as CSV to `path`.
pub fn write_predictions(predictions: &[Prediction], path: &Path) -> Result<()> {
    write_csv(predictions_to_df(predictions)?, path)
}

/// Writes predictions as CSV to stdout.
pub fn print_predictions(predictions: &[Prediction]) -> Result<()> {
    write_csv_to(predictions_to_df(predictions)?, io::stdout().lock())
}

/// One row per schedule step: `instance_id,run_id,solver,time_limit`.
fn predictions_to_df(predictions: &[Prediction]) -> Result<DataFrame> {
    let rows = predictions
        .iter()
        .flat_map(|prediction| {
            prediction.schedule.steps.iter().enumerate().map(
                move |(step, (solver, time))| {
                    (&prediction.instance, step as i64 + 1, solver, *time)
                },
            )
        })
        .collect_vec();
    let df = df! {
        INSTANCE_FIELD => rows.iter().map(|r| r.0.clone()).collect_vec(),
        "run_id" => rows.iter().map(|r| r.1).collect_vec(),
        "solver" => rows.iter().map(|r| r.2.clone()).collect_vec(),
        "time_limit" => rows.iter().map(|r| r.3).collect_vec(),
    }?;
    Ok(df)
}

/// Reads a prediction file written by [`write_predictions`].
pub fn read_predictions(path: &Path) -> Result<Vec<Prediction>> {
    let df = read_csv(path)?;
    let instances = column_to_strings(&df, INSTANCE_FIELD)?;
    let solvers = column_to_strings(&df, "solver")?;
    let times = column_to_f64(&df, "time_limit")?;
    let rows = izip!(instances, solvers, times)
        .enumerate()
        .map(|(row, (instance, solver, time))| {
            let time = time
                .with_context(|| format!("missing time limit in row {row}"))?;
            Ok((instance, solver, time))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(group_predictions(rows))
}
