//! A validated codebook + ensemble pair.
//!
//! `ModelSet` is the unit the recognizer publishes: it is checked once on
//! construction (3-D codebook, alphabet sizes agree) and never mutated, so a
//! reader holding an `Arc<ModelSet>` always sees one consistent set.

use std::path::Path;

use wand_hmm::{
    ClassificationResult, ClassifierEnsemble, Codebook, ForwardScratch, HmmError, Quantizer, Symbol,
};
use wand_models::Snapshot;

use crate::error::{Result, SpellError};
use crate::shape::{Sample, Shape, SAMPLE_DIMENSIONS};

/// Full outcome of recognizing one trace.
#[derive(Clone, Debug, PartialEq)]
pub struct Recognition {
    pub shape:   Shape,
    /// Quantized trace fed to the ensemble.
    pub symbols: Vec<Symbol>,
    pub result:  ClassificationResult,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelSet {
    quantizer: Quantizer,
    ensemble:  ClassifierEnsemble,
}

impl ModelSet {
    /// Pair a codebook with an ensemble.
    ///
    /// # Errors
    ///
    /// A configuration error if the codebook is not 3-D or its size differs
    /// from the ensemble's alphabet.
    pub fn new(codebook: Codebook, ensemble: ClassifierEnsemble) -> Result<Self> {
        if codebook.dimensions() != SAMPLE_DIMENSIONS {
            return Err(HmmError::Configuration(format!(
                "codebook centroids have {} components, samples have {}",
                codebook.dimensions(),
                SAMPLE_DIMENSIONS
            ))
            .into());
        }
        if codebook.len() != ensemble.num_symbols() {
            return Err(HmmError::AlphabetMismatch {
                expected: codebook.len(),
                found:    ensemble.num_symbols(),
            }
            .into());
        }
        Ok(ModelSet { quantizer: Quantizer::new(codebook), ensemble })
    }

    /// Load both text files.  Neither file is trusted until both parse and
    /// agree with each other.
    pub fn from_text_files(codebook: impl AsRef<Path>, ensemble: impl AsRef<Path>) -> Result<Self> {
        let codebook = wand_models::load_codebook(codebook)?;
        let ensemble = wand_models::load_ensemble(ensemble)?;
        Self::new(codebook, ensemble)
    }

    pub fn from_snapshot_file(path: impl AsRef<Path>) -> Result<Self> {
        let snapshot = wand_models::load_snapshot(path)?;
        Self::new(snapshot.codebook, snapshot.ensemble)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(self.quantizer.codebook().clone(), self.ensemble.clone())
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn ensemble(&self) -> &ClassifierEnsemble {
        &self.ensemble
    }

    /// Quantize `samples` and run the ensemble over the result.
    ///
    /// All working memory is local to the call.
    pub fn recognize(&self, samples: &[Sample]) -> Result<Recognition> {
        if samples.is_empty() {
            return Err(SpellError::EmptyInput);
        }

        let mut distances = Vec::with_capacity(self.quantizer.alphabet_size());
        let symbols = samples
            .iter()
            .map(|s| self.quantizer.quantize_into(&s.to_array(), &mut distances))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut scratch = ForwardScratch::with_capacity(self.ensemble.max_states(), symbols.len());
        let result = self.ensemble.classify_with(&symbols, &mut scratch)?;

        Ok(Recognition {
            shape: Shape::from_label(result.predicted_label),
            symbols,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wand_hmm::DiscreteHmm;

    fn one_state(b: Vec<f64>) -> DiscreteHmm {
        DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![b]).unwrap()
    }

    fn binary_codebook() -> Codebook {
        Codebook::new(vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]]).unwrap()
    }

    fn circle_clock() -> ClassifierEnsemble {
        ClassifierEnsemble::builder()
            .class(1, one_state(vec![0.9, 0.1]), 0.0)
            .class(2, one_state(vec![0.1, 0.9]), 0.0)
            .build()
            .unwrap()
    }

    #[test]
    fn trace_near_second_centroid_is_clock() {
        let set = ModelSet::new(binary_codebook(), circle_clock()).unwrap();
        let trace: Vec<Sample> = (0..5)
            .map(|i| Sample::new(1.0 + 0.01 * i as f64, 0.98, 1.02))
            .collect();
        let r = set.recognize(&trace).unwrap();
        assert_eq!(r.symbols, vec![1; 5]);
        assert_eq!(r.result.predicted_label, 2);
        assert_eq!(r.shape, Shape::Clock);
    }

    #[test]
    fn alphabet_mismatch_is_configuration_error() {
        let cb = Codebook::new(vec![vec![0.0; 3], vec![1.0; 3], vec![2.0; 3]]).unwrap();
        let err = ModelSet::new(cb, circle_clock()).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            SpellError::Hmm(HmmError::AlphabetMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn codebook_must_be_three_dimensional() {
        let cb = Codebook::new(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let err = ModelSet::new(cb, circle_clock()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn empty_trace_is_input_error() {
        let set = ModelSet::new(binary_codebook(), circle_clock()).unwrap();
        assert!(matches!(set.recognize(&[]), Err(SpellError::EmptyInput)));
    }

    #[test]
    fn non_finite_sample_is_rejected() {
        let set = ModelSet::new(binary_codebook(), circle_clock()).unwrap();
        let err = set.recognize(&[Sample::new(0.0, f64::INFINITY, 0.0)]).unwrap_err();
        assert!(matches!(err, SpellError::Hmm(HmmError::NonFiniteSample { index: 1 })));
        assert!(!err.is_configuration());
    }

    #[test]
    fn snapshot_preserves_set() {
        let set = ModelSet::new(binary_codebook(), circle_clock()).unwrap();
        let snap = set.to_snapshot();
        let again = ModelSet::new(snap.codebook, snap.ensemble).unwrap();
        assert_eq!(again, set);
    }
}
