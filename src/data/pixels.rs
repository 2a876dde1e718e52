use std::fmt::Write as _;

use serde_json::Value as JsonValue;

use crate::error::PixelError;

// ---------------------------------------------------------------------------
// PixelMatrix – parsed form of a serialized pixel cell
// ---------------------------------------------------------------------------

/// A rectangular nested numeric sequence, stored flat in row-major order.
///
/// Text form is a bracketed nested list such as `[[10, 20], [30, 40]]` or a
/// flat `[1, 2, 3]`. An empty `shape` means a bare scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelMatrix {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl PixelMatrix {
    /// One-dimensional matrix over `values`.
    pub fn flat(values: Vec<f64>) -> Self {
        PixelMatrix {
            shape: vec![values.len()],
            values,
        }
    }

    /// Parse the bracketed text form. Ragged nesting and non-numeric leaves
    /// are rejected rather than coerced.
    pub fn parse(text: &str) -> Result<Self, PixelError> {
        let root: JsonValue =
            serde_json::from_str(text.trim()).map_err(|e| PixelError::Parse(e.to_string()))?;

        // The first-element path fixes the expected shape; every other
        // branch is checked against it.
        let mut shape = Vec::new();
        let mut cursor = &root;
        while let JsonValue::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }

        let mut values = Vec::with_capacity(shape.iter().product());
        flatten_into(&root, &shape, 0, &mut values)?;
        Ok(PixelMatrix { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render back to the bracketed text form, preserving nesting.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.values.len() * 5 + 2);
        let mut next = 0;
        render_level(&self.shape, &self.values, &mut next, &mut out);
        out
    }
}

fn flatten_into(
    value: &JsonValue,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<f64>,
) -> Result<(), PixelError> {
    match (value, shape.get(depth)) {
        (JsonValue::Array(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(PixelError::Shape(format!(
                    "expected {expected} elements at depth {depth}, found {}",
                    items.len()
                )));
            }
            for item in items {
                flatten_into(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        (JsonValue::Array(_), None) => Err(PixelError::Shape(format!(
            "unexpected nested list at depth {depth}"
        ))),
        (JsonValue::Number(n), None) => {
            let v = n
                .as_f64()
                .ok_or_else(|| PixelError::NotNumeric(n.to_string()))?;
            out.push(v);
            Ok(())
        }
        (JsonValue::Number(_), Some(_)) => Err(PixelError::Shape(format!(
            "expected a list at depth {depth}, found a number"
        ))),
        (other, _) => Err(PixelError::NotNumeric(other.to_string())),
    }
}

fn render_level(shape: &[usize], values: &[f64], next: &mut usize, out: &mut String) {
    match shape.split_first() {
        None => {
            // f64 Display drops the fraction for whole numbers.
            let _ = write!(out, "{}", values[*next]);
            *next += 1;
        }
        Some((&len, rest)) => {
            out.push('[');
            for i in 0..len {
                if i > 0 {
                    out.push_str(", ");
                }
                render_level(rest, values, next, out);
            }
            out.push(']');
        }
    }
}
