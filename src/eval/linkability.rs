use rand::RngCore;

use super::attack::{
    Cell, nearest, prepare, require_rows, risk_from_rates, sample_targets, success_rate,
};
use super::{ColumnRole, EvaluationInputs, EvaluatorConfig, RiskEstimate, RiskEvaluator};
use crate::data::model::RowCollection;
use crate::error::EvaluatorError;

/// Links two halves of a target's auxiliary columns through the synthetic
/// data: the attack succeeds when the nearest synthetic row on the first
/// half is also the nearest on the second half.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkabilityEvaluator;

struct Halves {
    left: Vec<Vec<Cell>>,
    right: Vec<Vec<Cell>>,
}

fn linked(target_left: &[Cell], target_right: &[Cell], synthetic: &Halves) -> bool {
    match (
        nearest(target_left, &synthetic.left),
        nearest(target_right, &synthetic.right),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl RiskEvaluator for LinkabilityEvaluator {
    fn name(&self) -> &str {
        "linkability"
    }

    fn evaluate(
        &self,
        inputs: &EvaluationInputs<'_>,
        config: &EvaluatorConfig,
        rng: &mut dyn RngCore,
    ) -> Result<RiskEstimate, EvaluatorError> {
        let aux = config.columns(ColumnRole::Auxiliary);
        if aux.len() < 2 {
            return Err(EvaluatorError::InvalidConfig(format!(
                "linkability needs at least two auxiliary columns, got {}",
                aux.len()
            )));
        }
        require_rows(inputs.synthetic, "synthetic", 1)?;
        require_rows(inputs.original, "original", 1)?;
        require_rows(inputs.control, "control", 1)?;

        let (left_cols, right_cols) = aux.split_at(aux.len() / 2);
        let synthetic = Halves {
            left: prepare(inputs.synthetic, left_cols),
            right: prepare(inputs.synthetic, right_cols),
        };

        let mut attack = |collection: &RowCollection| {
            let left = prepare(collection, left_cols);
            let right = prepare(collection, right_cols);
            let targets = sample_targets(left.len(), config.n_attacks(), rng);
            let hits = targets
                .iter()
                .filter(|&&t| linked(&left[t], &right[t], &synthetic))
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
