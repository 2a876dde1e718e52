use std::panic::{AssertUnwindSafe, catch_unwind};

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::inference::InferenceEvaluator;
use super::linkability::LinkabilityEvaluator;
use super::singling_out::SinglingOutEvaluator;
use super::{EvaluationInputs, EvaluatorConfig, RiskDimension, RiskEstimate, RiskEvaluator};
use crate::data::model::{NAME, PIXELS, RowCollection, SIZE};
use crate::error::{ConfigError, EvaluatorError};

/// Adversary knowledge for the linkability check.
pub const LINKABILITY_AUX: [&str; 3] = [NAME, SIZE, PIXELS];
/// Adversary knowledge for the inference check.
pub const INFERENCE_AUX: [&str; 2] = [NAME, SIZE];
/// Column attacked by the inference check.
pub const INFERENCE_SECRET: &str = PIXELS;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub dimension: RiskDimension,
    pub evaluator: String,
    pub result: Result<RiskEstimate, EvaluatorError>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationReport {
    pub outcomes: Vec<EvaluationOutcome>,
}

impl EvaluationReport {
    pub fn get(&self, dimension: RiskDimension) -> Option<&EvaluationOutcome> {
        self.outcomes.iter().find(|o| o.dimension == dimension)
    }

    pub fn failures(&self) -> impl Iterator<Item = &EvaluationOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Runs each registered evaluator against the same three partitions.
///
/// Before an evaluator is called its required columns are checked in every
/// partition and the partitions are projected down to exactly those
/// columns. Errors and panics are caught per evaluator.
pub struct EvaluationAdapter {
    evaluators: Vec<(EvaluatorConfig, Box<dyn RiskEvaluator>)>,
    seed: u64,
}

impl EvaluationAdapter {
    pub fn new(seed: u64) -> Self {
        EvaluationAdapter {
            evaluators: Vec::new(),
            seed,
        }
    }

    /// The three built-in checks: singling-out over `columns`, linkability
    /// and inference over the fixed auxiliary sets.
    pub fn with_defaults(
        columns: &[String],
        n_attacks: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(seed)
            .register(
                EvaluatorConfig::singling_out(columns, n_attacks)?,
                SinglingOutEvaluator,
            )
            .register(
                EvaluatorConfig::linkability(&LINKABILITY_AUX, n_attacks)?,
                LinkabilityEvaluator,
            )
            .register(
                EvaluatorConfig::inference(&INFERENCE_AUX, INFERENCE_SECRET, n_attacks)?,
                InferenceEvaluator,
            ))
    }

    pub fn register(
        mut self,
        config: EvaluatorConfig,
        evaluator: impl RiskEvaluator + 'static,
    ) -> Self {
        self.evaluators.push((config, Box::new(evaluator)));
        self
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    pub fn run(&self, inputs: &EvaluationInputs<'_>) -> EvaluationReport {
        let mut report = EvaluationReport::default();

        for (i, (config, evaluator)) in self.evaluators.iter().enumerate() {
            let dimension = config.dimension();
            log::info!("Evaluating {dimension} risk with {}...", evaluator.name());

            // Each evaluator gets its own stream so one failing early does
            // not shift the draws seen by the others.
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
            let result = normalize(inputs, config).and_then(|projected| {
                let projected = EvaluationInputs {
                    original: &projected[0],
                    control: &projected[1],
                    synthetic: &projected[2],
                };
                catch_unwind(AssertUnwindSafe(|| {
                    evaluator.evaluate(&projected, config, &mut rng)
                }))
                .unwrap_or_else(|payload| Err(EvaluatorError::Panicked(panic_message(&*payload))))
            })
            .and_then(check_range);

            match &result {
                Ok(estimate) => log::info!(
                    "Estimated {dimension} risk: {:.4} (attack rate {:.4}, control rate {:.4})",
                    estimate.risk,
                    estimate.attack_rate,
                    estimate.control_rate
                ),
                Err(e) => log::warn!("{dimension} evaluation failed: {e}"),
            }

            report.outcomes.push(EvaluationOutcome {
                dimension,
                evaluator: evaluator.name().to_string(),
                result,
            });
        }

        report
    }
}

/// Reject estimates outside [0, 1]; NaN fails the range check too.
fn check_range(estimate: RiskEstimate) -> Result<RiskEstimate, EvaluatorError> {
    if (0.0..=1.0).contains(&estimate.risk) {
        Ok(estimate)
    } else {
        Err(EvaluatorError::RiskOutOfRange(estimate.risk))
    }
}

/// Check every required column and project the partitions onto them.
fn normalize(
    inputs: &EvaluationInputs<'_>,
    config: &EvaluatorConfig,
) -> Result<[RowCollection; 3], EvaluatorError> {
    let columns = config.required_columns();
    let project = |collection: &RowCollection, partition: &'static str| {
        if let Some(missing) = columns.iter().find(|c| !collection.has_column(c)) {
            return Err(EvaluatorError::MissingColumn {
                column: missing.clone(),
                partition,
            });
        }
        let rows = collection
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.cells.retain(|k, _| columns.contains(k));
                row
            })
            .collect();
        Ok(RowCollection {
            columns: columns.clone(),
            rows,
        })
    };

    Ok([
        project(inputs.original, "original")?,
        project(inputs.control, "control")?,
        project(inputs.synthetic, "synthetic")?,
    ])
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
