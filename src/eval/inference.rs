use rand::RngCore;

use super::attack::{
    Cell, nearest, prepare, require_rows, risk_from_rates, sample_targets, success_rate,
};
use super::{ColumnRole, EvaluationInputs, EvaluatorConfig, RiskEstimate, RiskEvaluator};
use crate::data::model::RowCollection;
use crate::error::EvaluatorError;

/// A guessed pixel secret within this mean absolute difference (as a
/// fraction of 255) counts as correct.
pub const PIXEL_TOLERANCE: f64 = 0.05;

/// Nearest-neighbour attribute inference: the adversary looks up the
/// synthetic row closest to a target on the auxiliary columns and guesses
/// that row's secret.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferenceEvaluator;

impl RiskEvaluator for InferenceEvaluator {
    fn name(&self) -> &str {
        "inference"
    }

    fn evaluate(
        &self,
        inputs: &EvaluationInputs<'_>,
        config: &EvaluatorConfig,
        rng: &mut dyn RngCore,
    ) -> Result<RiskEstimate, EvaluatorError> {
        let aux = config.columns(ColumnRole::Auxiliary);
        let secret = config.columns(ColumnRole::Secret);
        if aux.is_empty() || secret.is_empty() {
            return Err(EvaluatorError::InvalidConfig(
                "inference needs auxiliary columns and a secret column".into(),
            ));
        }
        if aux.iter().any(|c| secret.contains(c)) {
            return Err(EvaluatorError::InvalidConfig(format!(
                "secret column '{}' is also auxiliary",
                secret[0]
            )));
        }
        require_rows(inputs.synthetic, "synthetic", 1)?;
        require_rows(inputs.original, "original", 1)?;
        require_rows(inputs.control, "control", 1)?;

        let syn_aux = prepare(inputs.synthetic, aux);
        let syn_secret = prepare(inputs.synthetic, secret);

        let mut attack = |collection: &RowCollection| {
            let target_aux = prepare(collection, aux);
            let target_secret = prepare(collection, secret);
            let targets = sample_targets(target_aux.len(), config.n_attacks(), rng);
            let hits = targets
                .iter()
                .filter(|&&t| {
                    nearest(&target_aux[t], &syn_aux)
                        .map(|guess| guessed(&syn_secret[guess][0], &target_secret[t][0]))
                        .unwrap_or(false)
                })
                .count();
            success_rate(hits, targets.len())
        };
        let attack_rate = attack(inputs.original);
        let control_rate = attack(inputs.control);

        Ok(RiskEstimate {
            risk: risk_from_rates(attack_rate, control_rate),
            attack_rate,
            control_rate,
            n_attacks: config.n_attacks(),
        })
    }
}

fn guessed(guess: &Cell, actual: &Cell) -> bool {
    guess.distance(actual) <= PIXEL_TOLERANCE
}
