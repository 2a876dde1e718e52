use rand::{Rng, RngCore};

use super::attack::{require_rows, risk_from_rates, success_rate};
use super::{ColumnRole, EvaluationInputs, EvaluatorConfig, RiskEstimate, RiskEvaluator};
use crate::data::model::RowCollection;
use crate::error::EvaluatorError;

/// Univariate singling-out attack.
///
/// Each attack draws one synthetic row and one shared column and forms the
/// predicate `column == value`. The predicate succeeds against a partition
/// when it matches exactly one of its rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinglingOutEvaluator;

struct Predicate<'a> {
    column: &'a str,
    value: &'a str,
}

impl Predicate<'_> {
    fn singles_out(&self, collection: &RowCollection) -> bool {
        collection
            .rows
            .iter()
            .filter(|r| r.get(self.column) == Some(self.value))
            .take(2)
            .count()
            == 1
    }
}

impl RiskEvaluator for SinglingOutEvaluator {
    fn name(&self) -> &str {
        "singling-out"
    }

    fn evaluate(
        &self,
        inputs: &EvaluationInputs<'_>,
        config: &EvaluatorConfig,
        rng: &mut dyn RngCore,
    ) -> Result<RiskEstimate, EvaluatorError> {
        let columns = config.columns(ColumnRole::Shared);
        if columns.is_empty() {
            return Err(EvaluatorError::InvalidConfig(
                "singling-out needs at least one shared column".into(),
            ));
        }
        require_rows(inputs.synthetic, "synthetic", 1)?;
        require_rows(inputs.original, "original", 1)?;
        require_rows(inputs.control, "control", 1)?;

        let n_attacks = config.n_attacks();
        let predicates: Vec<Predicate<'_>> = (0..n_attacks)
            .map(|_| {
                let row = &inputs.synthetic.rows[rng.random_range(0..inputs.synthetic.len())];
                let column = columns[rng.random_range(0..columns.len())].as_str();
                Predicate {
                    column,
                    value: row.get(column).unwrap_or(""),
                }
            })
            .collect();

        let hits = |c: &RowCollection| predicates.iter().filter(|p| p.singles_out(c)).count();
        let attack_rate = success_rate(hits(inputs.original), n_attacks);
        let control_rate = success_rate(hits(inputs.control), n_attacks);

        Ok(RiskEstimate {
            risk: risk_from_rates(attack_rate, control_rate),
            attack_rate,
            control_rate,
            n_attacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::{NAME, PIXELS};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rows(names: &[&str]) -> RowCollection {
        let mut c = RowCollection::new(vec![NAME.into(), PIXELS.into()]);
        for n in names {
            c.push(BTreeMap::from([
                (NAME.to_string(), n.to_string()),
                (PIXELS.to_string(), "[1]".to_string()),
            ]));
        }
        c
    }

    fn run(ori: &RowCollection, ctl: &RowCollection, syn: &RowCollection) -> RiskEstimate {
        let config = EvaluatorConfig::singling_out(&[NAME.to_string()], 32).unwrap();
        let inputs = EvaluationInputs {
            original: ori,
            control: ctl,
            synthetic: syn,
        };
        let mut rng = StdRng::seed_from_u64(42);
        SinglingOutEvaluator
            .evaluate(&inputs, &config, &mut rng)
            .unwrap()
    }

    #[test]
    fn leaked_unique_names_give_full_risk() {
        let ori = rows(&["a", "b", "c"]);
        let ctl = rows(&["x", "y"]);
        let est = run(&ori, &ctl, &ori.clone());
        assert_eq!(est.attack_rate, 1.0);
        assert_eq!(est.control_rate, 0.0);
        assert_eq!(est.risk, 1.0);
        assert_eq!(est.n_attacks, 32);
    }

    #[test]
    fn shared_values_give_no_excess_risk() {
        let ori = rows(&["a", "b"]);
        let ctl = rows(&["a", "b"]);
        let est = run(&ori, &ctl, &ori.clone());
        assert_eq!(est.risk, 0.0);
    }

    #[test]
    fn duplicated_values_do_not_single_out() {
        let ori = rows(&["a", "a"]);
        let ctl = rows(&["z"]);
        let est = run(&ori, &ctl, &rows(&["a"]));
        assert_eq!(est.attack_rate, 0.0);
    }

    #[test]
    fn empty_synthetic_is_reported() {
        let config = EvaluatorConfig::singling_out(&[NAME.to_string()], 4).unwrap();
        let empty = rows(&[]);
        let ori = rows(&["a"]);
        let inputs = EvaluationInputs {
            original: &ori,
            control: &ori,
            synthetic: &empty,
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            SinglingOutEvaluator.evaluate(&inputs, &config, &mut rng),
            Err(EvaluatorError::InsufficientRows { partition: "synthetic", .. })
        ));
    }
}
