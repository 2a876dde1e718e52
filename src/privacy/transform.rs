use rand::Rng;

use super::noise::LaplaceMechanism;
use crate::data::model::{PIXELS, RowCollection};
use crate::data::pixels::PixelMatrix;
use crate::error::{DataError, PixelError};

// ---------------------------------------------------------------------------
// Per-record transform
// ---------------------------------------------------------------------------

/// Result of noising one pixel cell.
///
/// A cell that cannot be parsed or noised falls back to its original text;
/// the row survives the batch without noise.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Noised(String),
    Fallback { original: String, error: PixelError },
}

impl TransformOutcome {
    /// The text to store in the output row.
    pub fn text(&self) -> &str {
        match self {
            TransformOutcome::Noised(text) => text,
            TransformOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TransformOutcome::Noised(text) => text,
            TransformOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TransformOutcome::Fallback { .. })
    }
}

/// Parse, add one noise draw per element, clamp to [0, 255], truncate to
/// 8 bits and render with the input's nesting.
pub fn noise_pixels<R: Rng + ?Sized>(
    text: &str,
    mechanism: &LaplaceMechanism,
    rng: &mut R,
) -> Result<String, PixelError> {
    let mut matrix = PixelMatrix::parse(text)?;
    if let Some(i) = matrix.values().iter().position(|v| !v.is_finite()) {
        return Err(PixelError::NonFinite(i));
    }

    mechanism.perturb_all(matrix.values_mut(), rng);

    for (i, v) in matrix.values_mut().iter_mut().enumerate() {
        if v.is_nan() {
            return Err(PixelError::NonFinite(i));
        }
        *v = f64::from(v.clamp(0.0, 255.0) as u8);
    }
    Ok(matrix.render())
}

pub fn transform_pixels<R: Rng + ?Sized>(
    text: &str,
    mechanism: &LaplaceMechanism,
    rng: &mut R,
) -> TransformOutcome {
    match noise_pixels(text, mechanism, rng) {
        Ok(noised) => TransformOutcome::Noised(noised),
        Err(error) => TransformOutcome::Fallback {
            original: text.to_string(),
            error,
        },
    }
}

// ---------------------------------------------------------------------------
// Batch transform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RowFallback {
    pub row_id: usize,
    pub identity: String,
    pub error: PixelError,
}

/// How many rows were noised and which ones fell back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub noised: usize,
    pub fallbacks: Vec<RowFallback>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.noised + self.fallbacks.len()
    }
}

/// Derive the synthetic view of `source`: same rows and cells, with each
/// `pixels` cell run through [`transform_pixels`].
///
/// Only a missing `pixels` column fails the batch; bad cells are logged and
/// passed through.
pub fn synthesize<R: Rng + ?Sized>(
    source: &RowCollection,
    mechanism: &LaplaceMechanism,
    rng: &mut R,
) -> Result<(RowCollection, BatchReport), DataError> {
    source.require_column(PIXELS)?;

    let mut report = BatchReport::default();
    let mut rows = Vec::with_capacity(source.len());

    for row in &source.rows {
        let outcome = transform_pixels(row.pixels().unwrap_or(""), mechanism, rng);
        if let TransformOutcome::Fallback { error, .. } = &outcome {
            log::warn!(
                "Failed to process image matrix for row {}: {error}",
                row.identity()
            );
            report.fallbacks.push(RowFallback {
                row_id: row.id,
                identity: row.identity().to_string(),
                error: error.clone(),
            });
        } else {
            report.noised += 1;
        }
        rows.push(row.with_pixels(outcome.into_text()));
    }

    Ok((source.with_rows(rows), report))
}
