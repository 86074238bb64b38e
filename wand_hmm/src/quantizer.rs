//! Nearest-centroid vector quantization.
//!
//! A [`Codebook`] holds `K` centroids of dimensionality `D`.  A
//! [`Quantizer`] maps every continuous sample to the index of its closest
//! centroid (squared Euclidean distance), turning a motion trace into a
//! sequence of discrete [`Symbol`]s in `0..K`.

use crate::error::{HmmError, Result};

/// Index of a codebook centroid.
pub type Symbol = usize;

// ════════════════════════════════════════════════════════════════════════════
// Codebook
// ════════════════════════════════════════════════════════════════════════════

/// Ordered, immutable list of centroids, stored row-major as `K × D`.
#[derive(Clone, Debug, PartialEq)]
pub struct Codebook {
    dimensions: usize,
    centroids:  Vec<f64>,
}

impl Codebook {
    /// Build a codebook from one vector per centroid.
    ///
    /// All rows must share the same non-zero length, there must be at least
    /// one row, and every component must be finite.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dimensions = match rows.first() {
            Some(r) => r.len(),
            None    => return Err(HmmError::Configuration("codebook has no centroids".into())),
        };
        let mut centroids = Vec::with_capacity(rows.len() * dimensions);
        for (k, row) in rows.into_iter().enumerate() {
            if row.len() != dimensions {
                return Err(HmmError::Configuration(format!(
                    "centroid {} has {} components, expected {}",
                    k, row.len(), dimensions
                )));
            }
            centroids.extend(row);
        }
        Self::from_flat(dimensions, centroids)
    }

    /// Build a codebook from a flat row-major buffer of `K × dimensions`.
    pub fn from_flat(dimensions: usize, centroids: Vec<f64>) -> Result<Self> {
        if dimensions == 0 {
            return Err(HmmError::Configuration("codebook dimensionality must be > 0".into()));
        }
        if centroids.is_empty() {
            return Err(HmmError::Configuration("codebook has no centroids".into()));
        }
        if centroids.len() % dimensions != 0 {
            return Err(HmmError::Configuration(format!(
                "{} values do not form whole centroids of {} components",
                centroids.len(), dimensions
            )));
        }
        if let Some(i) = centroids.iter().position(|v| !v.is_finite()) {
            return Err(HmmError::Configuration(format!(
                "centroid {} component {} is not finite",
                i / dimensions, i % dimensions
            )));
        }
        Ok(Codebook { dimensions, centroids })
    }

    /// Number of centroids `K` — the size of the symbol alphabet.
    pub fn len(&self) -> usize {
        self.centroids.len() / self.dimensions
    }

    /// True when the codebook holds no centroids.
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Components per centroid `D`.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn centroid(&self, k: Symbol) -> Option<&[f64]> {
        if k < self.len() {
            Some(&self.centroids[k * self.dimensions..(k + 1) * self.dimensions])
        } else {
            None
        }
    }

    /// Iterate centroids in index order.
    pub fn centroids(&self) -> impl Iterator<Item = &[f64]> {
        self.centroids.chunks_exact(self.dimensions)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Quantizer
// ════════════════════════════════════════════════════════════════════════════

/// Maps continuous samples onto codebook symbols.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantizer {
    codebook: Codebook,
}

impl Quantizer {
    pub fn new(codebook: Codebook) -> Self {
        Quantizer { codebook }
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// Alphabet size `K`; every HMM fed by this quantizer must emit exactly
    /// this many symbols.
    pub fn alphabet_size(&self) -> usize {
        self.codebook.len()
    }

    /// Quantize a single sample.
    pub fn quantize(&self, sample: &[f64]) -> Result<Symbol> {
        let mut distances = Vec::with_capacity(self.codebook.len());
        self.quantize_into(sample, &mut distances)
    }

    /// Quantize a single sample, leaving the squared distance to every
    /// centroid in `distances`.
    ///
    /// `distances` is cleared first; its contents are only meaningful until
    /// the next call.  Ties go to the lower centroid index: an incumbent is
    /// only replaced on a strictly smaller distance.
    pub fn quantize_into(&self, sample: &[f64], distances: &mut Vec<f64>) -> Result<Symbol> {
        self.check_sample(sample)?;
        distances.clear();

        let mut best      = 0;
        let mut best_dist = f64::INFINITY;
        for (k, centroid) in self.codebook.centroids().enumerate() {
            let dist: f64 = sample
                .iter()
                .zip(centroid)
                .map(|(s, c)| (s - c) * (s - c))
                .sum();
            distances.push(dist);
            if dist < best_dist {
                best_dist = dist;
                best      = k;
            }
        }
        Ok(best)
    }

    /// Quantize an ordered trace, one symbol per sample.
    ///
    /// The distance buffer is shared across the samples of this call only.
    pub fn quantize_all<'a, I>(&self, samples: I) -> Result<Vec<Symbol>>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut distances = Vec::with_capacity(self.codebook.len());
        samples
            .into_iter()
            .map(|s| self.quantize_into(s, &mut distances))
            .collect()
    }

    fn check_sample(&self, sample: &[f64]) -> Result<()> {
        if sample.len() != self.codebook.dimensions() {
            return Err(HmmError::SampleDimension {
                expected: self.codebook.dimensions(),
                found:    sample.len(),
            });
        }
        if let Some(index) = sample.iter().position(|v| !v.is_finite()) {
            return Err(HmmError::NonFiniteSample { index });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn two_point() -> Quantizer {
        Quantizer::new(Codebook::new(vec![vec![0.0, 0.0, 0.0], vec![10.0, 0.0, 0.0]]).unwrap())
    }

    // ── Codebook ─────────────────────────────────────────────────────────
    #[test]
    fn codebook_shape() {
        let cb = two_point().codebook().clone();
        assert_eq!(cb.len(), 2);
        assert_eq!(cb.dimensions(), 3);
        assert_eq!(cb.centroid(1), Some(&[10.0, 0.0, 0.0][..]));
        assert_eq!(cb.centroid(2), None);
    }

    #[test]
    fn empty_codebook_rejected() {
        let err = Codebook::new(vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn ragged_codebook_rejected() {
        assert!(Codebook::new(vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0]]).is_err());
    }

    #[test]
    fn non_finite_centroid_rejected() {
        assert!(Codebook::new(vec![vec![0.0, f64::NAN, 0.0]]).is_err());
    }

    // ── Quantization ─────────────────────────────────────────────────────
    #[test]
    fn nearest_centroid_wins() {
        let q = two_point();
        assert_eq!(q.quantize(&[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(q.quantize(&[6.0, 0.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn tie_goes_to_lower_index() {
        let q = two_point();
        assert_eq!(q.quantize(&[5.0, 0.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn quantize_is_deterministic() {
        let q = two_point();
        let s = [3.3, -1.0, 2.0];
        let first = q.quantize(&s).unwrap();
        for _ in 0..10 {
            assert_eq!(q.quantize(&s).unwrap(), first);
        }
    }

    #[test]
    fn distances_are_exposed() {
        let q = two_point();
        let mut d = vec![99.0; 7];
        q.quantize_into(&[1.0, 0.0, 0.0], &mut d).unwrap();
        assert_eq!(d, vec![1.0, 81.0]);
    }

    #[test]
    fn wrong_dimension_is_configuration_error() {
        let err = two_point().quantize(&[1.0, 0.0]).unwrap_err();
        assert_eq!(err, HmmError::SampleDimension { expected: 3, found: 2 });
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn nan_sample_rejected() {
        let err = two_point().quantize(&[0.0, f64::NAN, 0.0]).unwrap_err();
        assert_eq!(err, HmmError::NonFiniteSample { index: 1 });
    }

    #[test]
    fn quantize_trace() {
        let q = two_point();
        let trace: Vec<[f64; 3]> = vec![[0.0; 3], [9.0, 0.0, 0.0], [4.0, 1.0, 0.0]];
        let symbols = q.quantize_all(trace.iter().map(|s| &s[..])).unwrap();
        assert_eq!(symbols, vec![0, 1, 0]);
    }
}
