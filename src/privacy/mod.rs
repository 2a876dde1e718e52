//! Noise injection: the Laplace mechanism and the pixel-cell transform
//! built on it.

pub mod noise;
pub mod transform;

pub use noise::LaplaceMechanism;
pub use transform::{BatchReport, TransformOutcome, synthesize, transform_pixels};
