//! One HMM per gesture class, plus the decision rule that picks a winner.
//!
//! ## Decision rule
//!
//! 1. Every model scores the sequence (`distance[k]`, a log-likelihood).
//! 2. The best class is the first one with the **maximum** distance.
//! 3. Distances become pseudo-likelihoods `exp(distance[k])`, normalised to
//!    sum to 1.  The exponent is shifted by the best distance first, which
//!    gives the same ratios without underflowing on long traces.
//! 4. Without null rejection the best class label is returned.  With it, the
//!    label survives only if its normalised likelihood is strictly above that
//!    class's threshold; otherwise the result is [`REJECTED_LABEL`].
//!
//! If every model scores `-∞` the likelihoods are all zero and the result is
//! rejected regardless of the null-rejection flag.

use tracing::debug;

use crate::error::{HmmError, Result};
use crate::hmm::{validate_observations, DiscreteHmm, ForwardScratch};
use crate::quantizer::Symbol;

/// Label reported when no class is confidently matched.
pub const REJECTED_LABEL: u32 = 0;

// ════════════════════════════════════════════════════════════════════════════
// ClassificationResult
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of [`ClassifierEnsemble::classify`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    /// Winning class label, or [`REJECTED_LABEL`].
    pub predicted_label: u32,
    /// Position of the best-scoring model in the ensemble.
    pub best_index:      usize,
    /// Raw score (log-likelihood) of the best-scoring model.
    pub best_score:      f64,
    /// Normalised likelihood of the best-scoring model.
    pub max_likelihood:  f64,
    /// Raw score of every model, in ensemble order.
    pub distances:       Vec<f64>,
    /// Normalised pseudo-likelihoods, in ensemble order.
    pub likelihoods:     Vec<f64>,
    /// Most-likely state trace of the best-scoring model.
    pub states:          Vec<usize>,
}

impl ClassificationResult {
    pub fn is_rejected(&self) -> bool {
        self.predicted_label == REJECTED_LABEL
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ClassifierEnsemble
// ════════════════════════════════════════════════════════════════════════════

/// Ordered set of `(label, model)` pairs with optional null rejection.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierEnsemble {
    labels:             Vec<u32>,
    models:             Vec<DiscreteHmm>,
    thresholds:         Vec<f64>,
    use_null_rejection: bool,
    num_symbols:        usize,
    max_states:         usize,
}

impl ClassifierEnsemble {
    /// Assemble an ensemble from parallel vectors.
    ///
    /// # Errors
    ///
    /// * no models → [`HmmError::Configuration`]
    /// * label/threshold count differs from the model count
    /// * a label of `0`
    /// * models disagreeing on alphabet size → [`HmmError::AlphabetMismatch`]
    pub fn new(
        labels:             Vec<u32>,
        models:             Vec<DiscreteHmm>,
        thresholds:         Vec<f64>,
        use_null_rejection: bool,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(HmmError::Configuration("ensemble has no classes".into()));
        }
        if labels.len() != models.len() {
            return Err(HmmError::LabelCountMismatch { labels: labels.len(), models: models.len() });
        }
        check_thresholds(&thresholds, models.len())?;
        if let Some(&bad) = labels.iter().find(|&&l| l == REJECTED_LABEL) {
            return Err(HmmError::InvalidLabel(bad));
        }
        let num_symbols = models[0].num_symbols();
        if let Some(m) = models.iter().find(|m| m.num_symbols() != num_symbols) {
            return Err(HmmError::AlphabetMismatch { expected: num_symbols, found: m.num_symbols() });
        }
        let max_states = models.iter().map(|m| m.num_states()).max().unwrap_or(0);

        Ok(ClassifierEnsemble {
            labels,
            models,
            thresholds,
            use_null_rejection,
            num_symbols,
            max_states,
        })
    }

    /// Start an [`EnsembleBuilder`].
    pub fn builder() -> EnsembleBuilder {
        EnsembleBuilder::default()
    }

    pub fn num_classes(&self) -> usize {
        self.models.len()
    }

    /// Alphabet size shared by every model.
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Largest state count across the models.
    pub fn max_states(&self) -> usize {
        self.max_states
    }

    pub fn class_labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn use_null_rejection(&self) -> bool {
        self.use_null_rejection
    }

    pub fn models(&self) -> &[DiscreteHmm] {
        &self.models
    }

    /// Iterate `(label, model)` pairs in ensemble order.
    pub fn classes(&self) -> impl Iterator<Item = (u32, &DiscreteHmm)> {
        self.labels.iter().copied().zip(self.models.iter())
    }

    /// Copy of this ensemble with null rejection switched on or off.
    pub fn with_null_rejection(mut self, enabled: bool) -> Self {
        self.use_null_rejection = enabled;
        self
    }

    /// Copy of this ensemble with replaced thresholds.
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Result<Self> {
        check_thresholds(&thresholds, self.models.len())?;
        self.thresholds = thresholds;
        Ok(self)
    }

    /// Classify a symbol sequence with freshly allocated working memory.
    pub fn classify(&self, obs: &[Symbol]) -> Result<ClassificationResult> {
        let mut scratch = ForwardScratch::with_capacity(self.max_states, obs.len());
        self.classify_with(obs, &mut scratch)
    }

    /// Classify reusing `scratch`, which is reset before every model runs.
    pub fn classify_with(
        &self,
        obs:     &[Symbol],
        scratch: &mut ForwardScratch,
    ) -> Result<ClassificationResult> {
        validate_observations(obs, self.num_symbols)?;

        let c = self.models.len();
        let mut distances  = Vec::with_capacity(c);
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        let mut states     = Vec::new();

        for (k, model) in self.models.iter().enumerate() {
            let d = model.run_forward(obs, scratch);
            if d == f64::NEG_INFINITY {
                debug!(class = self.labels[k], "model cannot produce sequence");
            }
            if d > best_score {
                best_score = d;
                best_index = k;
                states     = scratch.most_likely_states();
            }
            distances.push(d);
        }

        let likelihoods = normalise(&distances, best_score);
        let max_likelihood = likelihoods[best_index];

        let predicted_label = if best_score == f64::NEG_INFINITY {
            REJECTED_LABEL
        } else if self.use_null_rejection && max_likelihood <= self.thresholds[best_index] {
            REJECTED_LABEL
        } else {
            self.labels[best_index]
        };

        debug!(
            label = predicted_label,
            best_index,
            best_score,
            max_likelihood,
            steps = obs.len(),
            "classified sequence"
        );

        Ok(ClassificationResult {
            predicted_label,
            best_index,
            best_score,
            max_likelihood,
            distances,
            likelihoods,
            states,
        })
    }
}

/// One finite threshold per class.
fn check_thresholds(thresholds: &[f64], classes: usize) -> Result<()> {
    if thresholds.len() != classes {
        return Err(HmmError::ThresholdCountMismatch { thresholds: thresholds.len(), classes });
    }
    if let Some(k) = thresholds.iter().position(|t| !t.is_finite()) {
        return Err(HmmError::Configuration(format!(
            "null-rejection threshold {} is not finite", k
        )));
    }
    Ok(())
}

/// `exp(d_k) / Σ exp(d_j)`, computed as `exp(d_k - best) / Σ exp(d_j - best)`.
/// All zeros when `best` is `-∞`.
fn normalise(distances: &[f64], best: f64) -> Vec<f64> {
    if best == f64::NEG_INFINITY {
        return vec![0.0; distances.len()];
    }
    let mut likelihoods: Vec<f64> = distances.iter().map(|d| (d - best).exp()).collect();
    let sum: f64 = likelihoods.iter().sum();
    for l in &mut likelihoods {
        *l /= sum;
    }
    likelihoods
}

// ════════════════════════════════════════════════════════════════════════════
// EnsembleBuilder
// ════════════════════════════════════════════════════════════════════════════

/// Builder for [`ClassifierEnsemble`].
///
/// ```rust
/// use wand_hmm::{ClassifierEnsemble, DiscreteHmm};
///
/// let circle = DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.9, 0.1]]).unwrap();
/// let clock  = DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.1, 0.9]]).unwrap();
///
/// let ensemble = ClassifierEnsemble::builder()
///     .class(1, circle, 0.0)
///     .class(2, clock,  0.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(ensemble.classify(&[1, 1, 1]).unwrap().predicted_label, 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EnsembleBuilder {
    labels:             Vec<u32>,
    models:             Vec<DiscreteHmm>,
    thresholds:         Vec<f64>,
    use_null_rejection: bool,
}

impl EnsembleBuilder {
    /// Append a class with its null-rejection threshold.
    pub fn class(mut self, label: u32, model: DiscreteHmm, threshold: f64) -> Self {
        self.labels.push(label);
        self.models.push(model);
        self.thresholds.push(threshold);
        self
    }

    pub fn null_rejection(mut self, enabled: bool) -> Self {
        self.use_null_rejection = enabled;
        self
    }

    pub fn build(self) -> Result<ClassifierEnsemble> {
        ClassifierEnsemble::new(self.labels, self.models, self.thresholds, self.use_null_rejection)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
