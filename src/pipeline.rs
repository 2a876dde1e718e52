use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::AuditConfig;
use crate::data::loader::{load_file, save_file};
use crate::data::model::{PIXELS, RowCollection};
use crate::data::partition::{Partition, split};
use crate::eval::{EvaluationAdapter, EvaluationInputs, EvaluationReport};
use crate::privacy::{BatchReport, LaplaceMechanism, synthesize};

// ---------------------------------------------------------------------------
// Pipeline views
// ---------------------------------------------------------------------------

/// The three dataset views of one run plus what happened while deriving
/// them.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub partition: Partition,
    /// Noised copy of `partition.original`.
    pub synthetic: RowCollection,
    pub transform: BatchReport,
    pub evaluation: EvaluationReport,
}

impl PipelineRun {
    pub fn inputs(&self) -> EvaluationInputs<'_> {
        EvaluationInputs {
            original: &self.partition.original,
            control: &self.partition.control,
            synthetic: &self.synthetic,
        }
    }
}

fn log_mechanism(mechanism: &LaplaceMechanism) {
    log::info!(
        "Laplace noise: sensitivity {}, epsilon {}, scale {:.4}",
        mechanism.sensitivity(),
        mechanism.epsilon(),
        mechanism.scale()
    );
}

fn noise_rng(config: &AuditConfig) -> StdRng {
    match config.noise_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Partition `collection` and noise the original partition.
pub fn derive_views(
    collection: &RowCollection,
    config: &AuditConfig,
) -> Result<(Partition, RowCollection, BatchReport)> {
    config.validate()?;
    collection.require_column(PIXELS)?;
    let mechanism = LaplaceMechanism::new(config.sensitivity, config.epsilon)?;

    let mut split_rng = StdRng::seed_from_u64(config.seed);
    let partition = split(collection, config.control_fraction, &mut split_rng)?;

    log_mechanism(&mechanism);
    let mut rng = noise_rng(config);
    let (synthetic, report) = synthesize(&partition.original, &mechanism, &mut rng)?;
    if !report.fallbacks.is_empty() {
        log::warn!(
            "{} of {} rows kept their original pixels",
            report.fallbacks.len(),
            report.total()
        );
    }
    Ok((partition, synthetic, report))
}

pub fn evaluate(
    partition: &Partition,
    synthetic: &RowCollection,
    config: &AuditConfig,
) -> Result<EvaluationReport> {
    let columns = &partition.original.columns;
    let adapter = EvaluationAdapter::with_defaults(columns, config.n_attacks, config.seed)?;
    log::info!("Running privacy risk evaluations:");
    Ok(adapter.run(&EvaluationInputs {
        original: &partition.original,
        control: &partition.control,
        synthetic,
    }))
}

/// Partition, noise and evaluate an in-memory collection.
pub fn execute(collection: &RowCollection, config: &AuditConfig) -> Result<PipelineRun> {
    let (partition, synthetic, transform) = derive_views(collection, config)?;
    let evaluation = evaluate(&partition, &synthetic, config)?;
    Ok(PipelineRun {
        partition,
        synthetic,
        transform,
        evaluation,
    })
}

/// Full file-backed run: load, split, noise, persist the three views, then
/// evaluate them.
///
/// Load and split failures abort before anything is written. Nothing is
/// rolled back if a later save fails.
pub fn run(config: &AuditConfig) -> Result<PipelineRun> {
    let files = &config.files;
    let collection = load_file(&files.images)?;

    let (partition, synthetic, transform) = derive_views(&collection, config)
        .with_context(|| format!("preparing views of {}", files.images.display()))?;

    save_file(&partition.original, &files.original)?;
    save_file(&partition.control, &files.control)?;
    log::info!(
        "Split {} → {} ({} rows, train), {} ({} rows, control)",
        files.images.display(),
        files.original.display(),
        partition.original.len(),
        files.control.display(),
        partition.control.len()
    );
    save_file(&synthetic, &files.synthetic)?;
    log::info!(
        "DP done: {} ({} noised, {} fallback)",
        files.synthetic.display(),
        transform.noised,
        transform.fallbacks.len()
    );

    let evaluation = evaluate(&partition, &synthetic, config)?;
    Ok(PipelineRun {
        partition,
        synthetic,
        transform,
        evaluation,
    })
}

// ---------------------------------------------------------------------------
// Single-file noise pass
// ---------------------------------------------------------------------------

/// Noise the `pixels` column of `input` and write the result to `output`.
/// Every other column passes through unchanged.
pub fn apply_dp(
    input: &Path,
    output: &Path,
    epsilon: f64,
    noise_seed: Option<u64>,
) -> Result<BatchReport> {
    let mechanism = LaplaceMechanism::with_epsilon(epsilon)?;
    let collection = load_file(input)?;
    collection.require_column(PIXELS)?;

    let mut rng = match noise_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    log_mechanism(&mechanism);
    let (noised, report) = synthesize(&collection, &mechanism, &mut rng)?;
    save_file(&noised, output)?;

    log::info!(
        "DP-applied file saved to {} ({} noised, {} fallback)",
        output.display(),
        report.noised,
        report.fallbacks.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::{NAME, image_rows};
    use crate::error::{ConfigError, DataError};
    use crate::eval::RiskDimension;

    fn seeded() -> AuditConfig {
        AuditConfig {
            noise_seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn views_have_expected_sizes_and_identities() {
        let collection = image_rows(100);
        let run = execute(&collection, &seeded()).unwrap();

        assert_eq!(run.partition.original.len(), 70);
        assert_eq!(run.partition.control.len(), 30);
        assert_eq!(run.synthetic.ids(), run.partition.original.ids());
        assert_eq!(run.transform.noised, 70);

        let ori: BTreeSet<_> = run.partition.original.ids().into_iter().collect();
        let ctl: BTreeSet<_> = run.partition.control.ids().into_iter().collect();
        assert!(ori.is_disjoint(&ctl));
        assert_eq!(ori.len() + ctl.len(), 100);
    }

    #[test]
    fn same_config_reproduces_the_run() {
        let collection = image_rows(40);
        let a = execute(&collection, &seeded()).unwrap();
        let b = execute(&collection, &seeded()).unwrap();
        assert_eq!(a.partition, b.partition);
        assert_eq!(a.synthetic, b.synthetic);
        assert_eq!(a.evaluation, b.evaluation);
    }

    #[test]
    fn all_three_dimensions_are_reported() {
        let run = execute(&image_rows(30), &seeded()).unwrap();
        for dim in [
            RiskDimension::SinglingOut,
            RiskDimension::Linkability,
            RiskDimension::Inference,
        ] {
            assert!(run.evaluation.get(dim).is_some(), "{dim}");
        }
        assert_eq!(run.inputs().synthetic.len(), 21);
    }

    #[test]
    fn bad_pixels_survive_the_run() {
        let mut collection = image_rows(9);
        collection.push(std::collections::BTreeMap::from([
            (NAME.to_string(), "broken".to_string()),
            (PIXELS.to_string(), "not-a-list".to_string()),
        ]));
        let config = AuditConfig {
            control_fraction: 0.1,
            ..seeded()
        };
        let run = execute(&collection, &config).unwrap();
        assert_eq!(run.transform.total(), run.partition.original.len());
        // Seed 42 holds out row 8, so the broken row stays in the original.
        let row = run.synthetic.rows.iter().find(|r| r.id == 9).unwrap();
        assert_eq!(row.pixels(), Some("not-a-list"));
        assert_eq!(run.transform.fallbacks.len(), 1);
        assert_eq!(run.transform.fallbacks[0].row_id, 9);
    }

    #[test]
    fn invalid_epsilon_aborts_before_work() {
        let config = AuditConfig {
            epsilon: -1.0,
            ..seeded()
        };
        let err = execute(&image_rows(10), &config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidEpsilon(-1.0))
        );
    }

    #[test]
    fn missing_pixels_column_aborts() {
        let collection = RowCollection::new(vec![NAME.to_string()]);
        let err = execute(&collection, &seeded()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn(PIXELS.to_string()))
        );
    }

    #[test]
    fn empty_collection_runs_to_completion() {
        let run = execute(&image_rows(0), &seeded()).unwrap();
        assert!(run.synthetic.is_empty());
        assert_eq!(run.evaluation.failures().count(), 3);
    }
}
