//! Data layer: row types, file I/O, image flattening, pixel text and
//! partitioning.
//!
//! Architecture:
//! ```text
//!  image folder            .csv / .json / .parquet
//!        │                          │
//!        ▼                          ▼
//!   ┌──────────┐              ┌──────────┐
//!   │  images   │  decode →    │  loader   │  parse file → RowCollection
//!   └──────────┘   flat rows   └──────────┘
//!        │                          │
//!        └────────────┬─────────────┘
//!                     ▼
//!             ┌───────────────┐
//!             │ RowCollection  │  Vec<Row>, column order
//!             └───────────────┘
//!                     │
//!                     ▼
//!             ┌───────────┐
//!             │ partition  │  seeded split → (original, control)
//!             └───────────┘
//! ```
//!
//! `pixels` parses and renders the bracketed pixel text stored in each row.

pub mod images;
pub mod loader;
pub mod model;
pub mod partition;
pub mod pixels;
