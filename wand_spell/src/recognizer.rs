//! The recognizer façade.
//!
//! A [`Recognizer`] publishes one immutable [`ModelSet`] behind a single
//! `Arc` swap.  `recognize` clones the `Arc` under a read lock and then runs
//! without holding any lock, so a concurrent reload can never expose a
//! half-built set: readers see either the old set or the new one.
//!
//! ```rust,no_run
//! use wand_spell::{Recognizer, Sample};
//!
//! let recognizer = Recognizer::new();
//! recognizer.initialize("wf_hmm_quantizer.txt", "wf_hmm_model.txt").unwrap();
//!
//! let trace = vec![Sample::new(0.1, 9.7, 0.3), Sample::new(0.4, 9.1, 1.2)];
//! println!("{}", recognizer.recognize(&trace).unwrap());
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ModelSource, RecognizerConfig};
use crate::error::{Result, SpellError};
use crate::model_set::{ModelSet, Recognition};
use crate::shape::{Sample, Shape};

#[derive(Debug, Default)]
pub struct Recognizer {
    models: RwLock<Option<Arc<ModelSet>>>,
}

impl Recognizer {
    /// An uninitialized recognizer; every `recognize` fails until a load
    /// succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer that already serves `models`.
    pub fn with_models(models: ModelSet) -> Self {
        Recognizer { models: RwLock::new(Some(Arc::new(models))) }
    }

    /// Build and initialize from a config.
    pub fn from_config(config: &RecognizerConfig) -> Result<Self> {
        let recognizer = Self::new();
        recognizer.load(&config.source)?;
        Ok(recognizer)
    }

    // ── loading ───────────────────────────────────────────────────────────

    /// Load a codebook and an ensemble from their text files and publish
    /// them.
    ///
    /// On failure nothing is published: an uninitialized recognizer stays
    /// uninitialized and a serving one keeps its current set.
    pub fn initialize(&self, codebook: impl AsRef<Path>, ensemble: impl AsRef<Path>) -> Result<()> {
        let loaded = ModelSet::from_text_files(codebook.as_ref(), ensemble.as_ref());
        self.publish_result(loaded)
    }

    /// As [`initialize`](Self::initialize), from a binary snapshot.
    pub fn initialize_from_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = ModelSet::from_snapshot_file(path.as_ref());
        self.publish_result(loaded)
    }

    /// Load from whichever source the config names.
    pub fn load(&self, source: &ModelSource) -> Result<()> {
        match source {
            ModelSource::Text { codebook, ensemble } => self.initialize(codebook, ensemble),
            ModelSource::Snapshot(path)              => self.initialize_from_snapshot(path),
        }
    }

    /// Replace the served set.  Calls already running finish on the set they
    /// started with.
    pub fn publish(&self, models: ModelSet) {
        let classes = models.ensemble().num_classes();
        let symbols = models.quantizer().alphabet_size();
        *self.models.write() = Some(Arc::new(models));
        info!(classes, symbols, "published model set");
    }

    fn publish_result(&self, loaded: Result<ModelSet>) -> Result<()> {
        match loaded {
            Ok(models) => {
                self.publish(models);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, initialized = self.is_initialized(), "model load failed");
                Err(e)
            }
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.models.read().is_some()
    }

    /// The set currently served, if any.
    pub fn models(&self) -> Option<Arc<ModelSet>> {
        self.models.read().clone()
    }

    fn current(&self) -> Result<Arc<ModelSet>> {
        self.models().ok_or(SpellError::NotInitialized)
    }

    // ── recognition ───────────────────────────────────────────────────────

    /// Classify a trace and map the result to a [`Shape`].
    ///
    /// Rejected or unmapped labels come back as [`Shape::Fail`].
    pub fn recognize(&self, samples: &[Sample]) -> Result<Shape> {
        self.recognize_detailed(samples).map(|r| r.shape)
    }

    /// As [`recognize`](Self::recognize), with symbols, scores and
    /// likelihoods.
    pub fn recognize_detailed(&self, samples: &[Sample]) -> Result<Recognition> {
        let models = self.current()?;
        let started = Instant::now();
        let recognition = models.recognize(samples)?;
        debug!(
            shape = %recognition.shape,
            samples = samples.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "recognized trace"
        );
        Ok(recognition)
    }

    // ── persistence ───────────────────────────────────────────────────────

    /// Write the served set as a binary snapshot.
    pub fn write_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let models = self.current()?;
        wand_models::save_snapshot(path, &models.to_snapshot())?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use wand_hmm::{ClassifierEnsemble, Codebook, DiscreteHmm};

    fn set(first_label: u32) -> ModelSet {
        let cb = Codebook::new(vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]]).unwrap();
        let one = |b: Vec<f64>| DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![b]).unwrap();
        let ensemble = ClassifierEnsemble::builder()
            .class(first_label, one(vec![0.9, 0.1]), 0.0)
            .class(2, one(vec![0.1, 0.9]), 0.0)
            .build()
            .unwrap();
        ModelSet::new(cb, ensemble).unwrap()
    }

    #[test]
    fn uninitialized_recognizer_refuses() {
        let r = Recognizer::new();
        assert!(!r.is_initialized());
        assert!(matches!(
            r.recognize(&[Sample::new(0.0, 0.0, 0.0)]),
            Err(SpellError::NotInitialized)
        ));
        assert!(matches!(r.write_snapshot("never.wnds"), Err(SpellError::NotInitialized)));
    }

    #[test]
    fn empty_trace_is_rejected_without_touching_models() {
        let r = Recognizer::with_models(set(1));
        assert!(matches!(r.recognize(&[]), Err(SpellError::EmptyInput)));
        assert!(r.is_initialized());
    }

    #[test]
    fn publish_swaps_whole_set() {
        let r = Recognizer::with_models(set(1));
        let trace = [Sample::new(0.0, 0.1, 0.0); 4];
        assert_eq!(r.recognize(&trace).unwrap(), Shape::Circle);

        let before = r.models().unwrap();
        r.publish(set(6));
        assert_eq!(r.recognize(&trace).unwrap(), Shape::V);
        // a reader that grabbed the old set still sees it intact
        assert_eq!(before.ensemble().class_labels(), &[1, 2]);
    }

    #[test]
    fn failed_load_keeps_serving_set() {
        let r = Recognizer::with_models(set(1));
        let err = r.initialize("/nonexistent/q.txt", "/nonexistent/m.txt").unwrap_err();
        assert!(matches!(err, SpellError::Model(_)));
        assert!(r.is_initialized());
        assert_eq!(r.models().unwrap().ensemble().class_labels(), &[1, 2]);
    }

    #[test]
    fn failed_first_load_stays_uninitialized() {
        let r = Recognizer::new();
        assert!(r.initialize_from_snapshot("/nonexistent/models.wnds").is_err());
        assert!(!r.is_initialized());
    }

    #[test]
    fn detailed_result_carries_likelihoods() {
        let r = Recognizer::with_models(set(1));
        let d = r.recognize_detailed(&[Sample::new(1.0, 1.0, 1.0)]).unwrap();
        assert_eq!(d.shape, Shape::Clock);
        assert_eq!(d.symbols, vec![1]);
        assert!((d.result.likelihoods.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
