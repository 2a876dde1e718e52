//! Privacy-risk evaluation.
//!
//! ```text
//!  (original, control, synthetic)
//!        │
//!        ▼
//!   ┌──────────┐   per risk dimension: check + project columns,
//!   │  adapter  │   invoke evaluator, isolate failures
//!   └──────────┘
//!        │
//!        ▼
//!   singling_out / linkability / inference  →  RiskEstimate
//! ```

pub mod adapter;
pub mod attack;
pub mod inference;
pub mod linkability;
pub mod singling_out;

use std::fmt;

use rand::RngCore;

use crate::data::model::RowCollection;
use crate::error::{ConfigError, EvaluatorError};

pub use adapter::{EvaluationAdapter, EvaluationOutcome, EvaluationReport};

// ---------------------------------------------------------------------------
// Risk dimensions and column roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskDimension {
    SinglingOut,
    Linkability,
    Inference,
}

impl fmt::Display for RiskDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskDimension::SinglingOut => write!(f, "Singling Out"),
            RiskDimension::Linkability => write!(f, "Linkability"),
            RiskDimension::Inference => write!(f, "Inference"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Columns predicates may be built from.
    Shared,
    /// Columns the adversary is assumed to know.
    Auxiliary,
    /// Column under attack.
    Secret,
}

// ---------------------------------------------------------------------------
// EvaluatorConfig – immutable input contract for one risk dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    dimension: RiskDimension,
    shared: Vec<String>,
    auxiliary: Vec<String>,
    secret: Option<String>,
    n_attacks: usize,
}

impl EvaluatorConfig {
    /// Predicates over every column of the dataset.
    pub fn singling_out(columns: &[String], n_attacks: usize) -> Result<Self, ConfigError> {
        Self::build(
            RiskDimension::SinglingOut,
            columns.to_vec(),
            Vec::new(),
            None,
            n_attacks,
        )
    }

    pub fn linkability(auxiliary: &[&str], n_attacks: usize) -> Result<Self, ConfigError> {
        Self::build(
            RiskDimension::Linkability,
            Vec::new(),
            owned(auxiliary),
            None,
            n_attacks,
        )
    }

    pub fn inference(
        auxiliary: &[&str],
        secret: &str,
        n_attacks: usize,
    ) -> Result<Self, ConfigError> {
        Self::build(
            RiskDimension::Inference,
            Vec::new(),
            owned(auxiliary),
            Some(secret.to_string()),
            n_attacks,
        )
    }

    fn build(
        dimension: RiskDimension,
        shared: Vec<String>,
        auxiliary: Vec<String>,
        secret: Option<String>,
        n_attacks: usize,
    ) -> Result<Self, ConfigError> {
        if n_attacks == 0 {
            return Err(ConfigError::ZeroAttacks);
        }
        Ok(EvaluatorConfig {
            dimension,
            shared,
            auxiliary,
            secret,
            n_attacks,
        })
    }

    pub fn dimension(&self) -> RiskDimension {
        self.dimension
    }

    pub fn n_attacks(&self) -> usize {
        self.n_attacks
    }

    pub fn columns(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Shared => &self.shared,
            ColumnRole::Auxiliary => &self.auxiliary,
            ColumnRole::Secret => self.secret.as_slice(),
        }
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Every column named under any role, without duplicates, in role order.
    pub fn required_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for col in self
            .shared
            .iter()
            .chain(&self.auxiliary)
            .chain(self.secret.iter())
        {
            if !out.contains(col) {
                out.push(col.clone());
            }
        }
        out
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Evaluator seam
// ---------------------------------------------------------------------------

/// The three partitions handed to every evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInputs<'a> {
    pub original: &'a RowCollection,
    pub control: &'a RowCollection,
    pub synthetic: &'a RowCollection,
}

/// Scalar risk in [0, 1] plus the attack rates it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskEstimate {
    pub risk: f64,
    /// Attack success rate against original-partition targets.
    pub attack_rate: f64,
    /// Attack success rate against control-partition targets.
    pub control_rate: f64,
    pub n_attacks: usize,
}

pub trait RiskEvaluator {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        inputs: &EvaluationInputs<'_>,
        config: &EvaluatorConfig,
        rng: &mut dyn RngCore,
    ) -> Result<RiskEstimate, EvaluatorError>;
}
