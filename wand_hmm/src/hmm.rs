//! Discrete hidden Markov model with a scaled forward algorithm.
//!
//! Each gesture class owns one [`DiscreteHmm`].  Scoring an observation
//! sequence runs the forward recursion, normalising every step so the state
//! probabilities stay in range:
//!
//! ```text
//! alpha[0][i] = pi[i] · B[i][o0]                         s[0] = Σ alpha[0]
//! alpha[t][j] = (Σ_i alpha[t-1][i] · A[i][j]) · B[j][ot] s[t] = Σ alpha[t]
//! score       = Σ_t ln s[t]                              (= ln P(obs | model))
//! ```
//!
//! Each row is divided by its own `s[t]`, i.e. scaled by `c[t] = 1 / s[t]`.
//! A sequence the model cannot produce at all (a step whose sum is exactly
//! zero) scores `f64::NEG_INFINITY`; it is never an error.  Tiny but positive
//! sums, subnormals included, still give a finite score.

use tracing::trace;

use crate::error::{HmmError, Result};
use crate::quantizer::Symbol;

/// Maximum deviation from 1.0 accepted for a probability row sum.
pub const ROW_SUM_TOLERANCE: f64 = 1e-4;

// ════════════════════════════════════════════════════════════════════════════
// DiscreteHmm
// ════════════════════════════════════════════════════════════════════════════

/// Immutable parameters of one discrete HMM.
///
/// `A` (N×N) and `B` (N×K) are stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteHmm {
    num_states:  usize,
    num_symbols: usize,
    pi:          Vec<f64>,
    a:           Vec<f64>,
    b:           Vec<f64>,
}

impl DiscreteHmm {
    /// Build a model from an initial distribution, a transition matrix and an
    /// emission matrix.
    ///
    /// # Errors
    ///
    /// [`HmmError::Configuration`] when the shapes disagree, a value is
    /// negative or not finite, or a row does not sum to 1 within
    /// [`ROW_SUM_TOLERANCE`].
    pub fn new(pi: Vec<f64>, a: Vec<Vec<f64>>, b: Vec<Vec<f64>>) -> Result<Self> {
        let num_states = pi.len();
        if num_states == 0 {
            return Err(HmmError::Configuration("model has no states".into()));
        }
        if a.len() != num_states {
            return Err(HmmError::Configuration(format!(
                "transition matrix has {} rows for {} states", a.len(), num_states
            )));
        }
        if b.len() != num_states {
            return Err(HmmError::Configuration(format!(
                "emission matrix has {} rows for {} states", b.len(), num_states
            )));
        }
        let num_symbols = b[0].len();
        if num_symbols == 0 {
            return Err(HmmError::Configuration("emission matrix has no symbols".into()));
        }

        check_distribution("pi", &pi)?;
        let mut flat_a = Vec::with_capacity(num_states * num_states);
        for (i, row) in a.into_iter().enumerate() {
            if row.len() != num_states {
                return Err(HmmError::Configuration(format!(
                    "transition row {} has {} entries, expected {}", i, row.len(), num_states
                )));
            }
            check_distribution(&format!("A row {}", i), &row)?;
            flat_a.extend(row);
        }
        let mut flat_b = Vec::with_capacity(num_states * num_symbols);
        for (i, row) in b.into_iter().enumerate() {
            if row.len() != num_symbols {
                return Err(HmmError::Configuration(format!(
                    "emission row {} has {} entries, expected {}", i, row.len(), num_symbols
                )));
            }
            check_distribution(&format!("B row {}", i), &row)?;
            flat_b.extend(row);
        }

        Ok(DiscreteHmm {
            num_states,
            num_symbols,
            pi,
            a:  flat_a,
            b:  flat_b,
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Alphabet size `K` of the emission matrix.
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    pub fn initial(&self) -> &[f64] {
        &self.pi
    }

    pub fn transition_row(&self, i: usize) -> &[f64] {
        &self.a[i * self.num_states..(i + 1) * self.num_states]
    }

    pub fn emission_row(&self, i: usize) -> &[f64] {
        &self.b[i * self.num_symbols..(i + 1) * self.num_symbols]
    }

    /// Reject empty sequences and out-of-alphabet symbols before any
    /// arithmetic happens.
    pub fn validate_observations(&self, obs: &[Symbol]) -> Result<()> {
        validate_observations(obs, self.num_symbols)
    }

    /// Log-likelihood of `obs` under this model (higher is a better fit).
    pub fn score(&self, obs: &[Symbol]) -> Result<f64> {
        let mut scratch = ForwardScratch::new();
        self.score_with(obs, &mut scratch)
    }

    /// As [`score`](Self::score), reusing a caller-owned scratch buffer.
    pub fn score_with(&self, obs: &[Symbol], scratch: &mut ForwardScratch) -> Result<f64> {
        self.validate_observations(obs)?;
        Ok(self.run_forward(obs, scratch))
    }

    /// Score plus the most-likely state at each step.
    pub fn forward(&self, obs: &[Symbol]) -> Result<ForwardPass> {
        let mut scratch = ForwardScratch::new();
        let score = self.score_with(obs, &mut scratch)?;
        Ok(ForwardPass { score, states: scratch.most_likely_states() })
    }

    /// The recursion itself.  `obs` must already be validated.
    pub(crate) fn run_forward(&self, obs: &[Symbol], scratch: &mut ForwardScratch) -> f64 {
        let n = self.num_states;
        scratch.reset(n, obs.len());

        // t = 0
        let mut sum = 0.0;
        for i in 0..n {
            let val = self.pi[i] * self.b[i * self.num_symbols + obs[0]];
            scratch.alpha[i] = val;
            sum += val;
        }
        if !scratch.normalise(0, sum) {
            trace!(step = 0, "forward pass hit a zero-probability dead end");
            return f64::NEG_INFINITY;
        }

        // induction
        for t in 1..obs.len() {
            let (prev, cur) = scratch.alpha.split_at_mut(t * n);
            let prev = &prev[(t - 1) * n..];
            let cur  = &mut cur[..n];
            let mut sum = 0.0;
            for j in 0..n {
                let mut val = 0.0;
                for i in 0..n {
                    val += prev[i] * self.a[i * n + j];
                }
                val *= self.b[j * self.num_symbols + obs[t]];
                cur[j] = val;
                sum += val;
            }
            if !scratch.normalise(t, sum) {
                trace!(step = t, "forward pass hit a zero-probability dead end");
                return f64::NEG_INFINITY;
            }
        }

        scratch.sums[..scratch.steps].iter().map(|s| s.ln()).sum::<f64>()
    }
}

fn check_distribution(what: &str, row: &[f64]) -> Result<()> {
    if let Some(i) = row.iter().position(|v| !v.is_finite() || *v < 0.0) {
        return Err(HmmError::Configuration(format!(
            "{} entry {} is {}, probabilities must be finite and non-negative",
            what, i, row[i]
        )));
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(HmmError::Configuration(format!("{} sums to {}, expected 1", what, sum)));
    }
    Ok(())
}

pub(crate) fn validate_observations(obs: &[Symbol], alphabet: usize) -> Result<()> {
    if obs.is_empty() {
        return Err(HmmError::EmptySequence);
    }
    if let Some((position, &symbol)) = obs.iter().enumerate().find(|&(_, &s)| s >= alphabet) {
        return Err(HmmError::SymbolOutOfRange { position, symbol, alphabet });
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// ForwardScratch — per-call working memory
// ════════════════════════════════════════════════════════════════════════════

/// Alpha matrix and per-step sums for one forward pass.
///
/// A scratch is reset at the start of every pass, so one instance can be
/// reused for many calls (and many models) as long as only one call uses it
/// at a time.
#[derive(Clone, Debug, Default)]
pub struct ForwardScratch {
    alpha:  Vec<f64>,
    sums:   Vec<f64>,
    states: usize,
    /// Rows completed by the last pass.
    steps:  usize,
}

impl ForwardScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `states × steps` so later passes up to that size do not
    /// allocate.
    pub fn with_capacity(states: usize, steps: usize) -> Self {
        ForwardScratch {
            alpha:  Vec::with_capacity(states * steps),
            sums:   Vec::with_capacity(steps),
            states: 0,
            steps:  0,
        }
    }

    fn reset(&mut self, states: usize, steps: usize) {
        self.alpha.clear();
        self.alpha.resize(states * steps, 0.0);
        self.sums.clear();
        self.sums.resize(steps, 0.0);
        self.states = states;
        self.steps  = 0;
    }

    /// Divide row `t` by `sum`.  Returns false on a dead end (`sum` is zero),
    /// leaving `steps` at the last good row.
    fn normalise(&mut self, t: usize, sum: f64) -> bool {
        if !(sum > 0.0) {
            return false;
        }
        self.sums[t] = sum;
        for v in &mut self.alpha[t * self.states..(t + 1) * self.states] {
            *v /= sum;
        }
        self.steps = t + 1;
        true
    }

    /// Number of steps the last pass completed.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Scaled alpha row for step `t` of the last pass.
    pub fn alpha_row(&self, t: usize) -> Option<&[f64]> {
        if t < self.steps {
            Some(&self.alpha[t * self.states..(t + 1) * self.states])
        } else {
            None
        }
    }

    /// Unscaled row sums `s[t]` of the completed steps; the score is
    /// `Σ ln s[t]`.
    pub fn step_sums(&self) -> &[f64] {
        &self.sums[..self.steps]
    }

    /// Index of the largest scaled alpha at each completed step.
    ///
    /// Informational only; ties keep the lower state index.
    pub fn most_likely_states(&self) -> Vec<usize> {
        (0..self.steps)
            .map(|t| {
                let row = &self.alpha[t * self.states..(t + 1) * self.states];
                let mut best     = 0;
                let mut best_val = 0.0;
                for (i, &v) in row.iter().enumerate() {
                    if v > best_val {
                        best_val = v;
                        best     = i;
                    }
                }
                best
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ForwardPass
// ════════════════════════════════════════════════════════════════════════════

/// Result of [`DiscreteHmm::forward`].
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardPass {
    /// Log-likelihood, or `NEG_INFINITY` if the model cannot produce the
    /// sequence.
    pub score:  f64,
    /// Most-likely state per step.  Shorter than the sequence when the pass
    /// stopped at a dead end.
    pub states: Vec<usize>,
}

impl ForwardPass {
    pub fn is_degenerate(&self) -> bool {
        self.score == f64::NEG_INFINITY
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
