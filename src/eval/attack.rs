//! Building blocks shared by the built-in attacks: cell distances,
//! nearest-neighbour search, target sampling and the baseline-corrected
//! risk formula.

use rand::Rng;
use rand::seq::index;

use crate::data::model::RowCollection;
use crate::data::pixels::PixelMatrix;
use crate::error::EvaluatorError;

/// A cell prepared for distance computations.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Pixels(Vec<f64>),
    Text(String),
}

impl Cell {
    pub fn parse(text: &str) -> Cell {
        match PixelMatrix::parse(text) {
            Ok(m) if !m.is_empty() && !m.shape().is_empty() => Cell::Pixels(m.values().to_vec()),
            _ => Cell::Text(text.to_string()),
        }
    }

    /// 0 for identical cells, 1 for unrelated ones. Pixel cells of equal
    /// length score their mean absolute difference over the 8-bit range.
    pub fn distance(&self, other: &Cell) -> f64 {
        match (self, other) {
            (Cell::Pixels(a), Cell::Pixels(b)) if a.len() == b.len() => {
                let total: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
                (total / (a.len() as f64 * 255.0)).min(1.0)
            }
            (Cell::Text(a), Cell::Text(b)) if a == b => 0.0,
            _ => 1.0,
        }
    }
}

/// Rows of `collection` restricted to `columns`, parsed once.
pub fn prepare(collection: &RowCollection, columns: &[String]) -> Vec<Vec<Cell>> {
    collection
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| Cell::parse(row.get(c).unwrap_or("")))
                .collect()
        })
        .collect()
}

pub fn row_distance(a: &[Cell], b: &[Cell]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x.distance(y)).sum()
}

/// Index of the closest candidate; ties go to the earliest.
pub fn nearest(target: &[Cell], candidates: &[Vec<Cell>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, cand) in candidates.iter().enumerate() {
        let d = row_distance(target, cand);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Up to `n_attacks` distinct row indices out of `n_rows`.
pub fn sample_targets<R: Rng + ?Sized>(n_rows: usize, n_attacks: usize, rng: &mut R) -> Vec<usize> {
    index::sample(rng, n_rows, n_attacks.min(n_rows)).into_vec()
}

pub fn require_rows(
    collection: &RowCollection,
    partition: &'static str,
    needed: usize,
) -> Result<(), EvaluatorError> {
    if collection.len() < needed {
        return Err(EvaluatorError::InsufficientRows {
            partition,
            rows: collection.len(),
            needed,
        });
    }
    Ok(())
}

pub fn success_rate(successes: usize, attempts: usize) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        successes as f64 / attempts as f64
    }
}

/// Excess success over the control baseline, normalised to [0, 1].
pub fn risk_from_rates(attack_rate: f64, control_rate: f64) -> f64 {
    if control_rate >= 1.0 {
        return 0.0;
    }
    ((attack_rate - control_rate) / (1.0 - control_rate)).clamp(0.0, 1.0)
}
