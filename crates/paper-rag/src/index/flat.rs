//! Exact brute-force index
//!
//! Every query scans all stored vectors, so results are exact.

use ndarray::Array2;

use super::{squared_l2, Neighbor, VectorIndex};
use crate::error::{Error, Result};

/// Flat index storing vectors row-wise in a dense matrix
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    /// One row per vector, in insertion order; `None` until built
    vectors: Option<Array2<f32>>,
}

impl FlatL2Index {
    /// Create an empty, unbuilt index
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `build` has succeeded
    pub fn is_built(&self) -> bool {
        self.vectors.is_some()
    }
}

impl VectorIndex for FlatL2Index {
    fn build(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        let dimensions = match vectors.first() {
            Some(first) => first.len(),
            None => return Err(Error::EmptyCorpus),
        };

        if dimensions == 0 {
            return Err(Error::invalid("vectors must have at least one dimension"));
        }

        let rows = vectors.len();
        let mut flat = Vec::with_capacity(rows * dimensions);
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(Error::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            flat.extend_from_slice(vector);
        }

        let matrix = Array2::from_shape_vec((rows, dimensions), flat)
            .map_err(|e| Error::invalid(format!("invalid vector matrix: {}", e)))?;

        // Previous contents are only replaced once the new matrix is valid
        self.vectors = Some(matrix);

        tracing::debug!("Built flat L2 index: {} vectors x {} dims", rows, dimensions);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let vectors = self.vectors.as_ref().ok_or(Error::NotBuilt)?;

        if k == 0 {
            return Err(Error::invalid("k must be positive"));
        }

        if query.len() != vectors.ncols() {
            return Err(Error::DimensionMismatch {
                expected: vectors.ncols(),
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = vectors
            .outer_iter()
            .enumerate()
            .map(|(id, row)| {
                let distance = match row.as_slice() {
                    Some(slice) => squared_l2(slice, query),
                    None => squared_l2(&row.to_vec(), query),
                };
                Neighbor { id, distance }
            })
            .collect();

        // Stable order: distance first, then insertion position
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    fn len(&self) -> usize {
        self.vectors.as_ref().map_or(0, |v| v.nrows())
    }

    fn dimensions(&self) -> Option<usize> {
        self.vectors.as_ref().map(|v| v.ncols())
    }

    fn name(&self) -> &str {
        "flat-l2"
    }
}
