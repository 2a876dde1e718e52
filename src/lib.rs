//! Image-dataset privacy audit: flatten images into pixel rows, add
//! calibrated Laplace noise, split into original/control partitions and
//! estimate singling-out, linkability and inference risk.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod privacy;
