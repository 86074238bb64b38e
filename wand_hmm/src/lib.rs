//! # wand_hmm
//!
//! The numeric core of wand gesture recognition:
//!
//! | Stage | Type | Input → Output |
//! |---|---|---|
//! | Quantize | [`Quantizer`] | 3-D sample → symbol in `0..K` |
//! | Score | [`DiscreteHmm`] | symbol sequence → log-likelihood |
//! | Decide | [`ClassifierEnsemble`] | symbol sequence → class label |
//!
//! Parameters are immutable once built; every call takes its working memory
//! either fresh or from a caller-owned [`ForwardScratch`], so one set of
//! models can serve any number of threads.
//!
//! ## Quick start
//!
//! ```rust
//! use wand_hmm::{ClassifierEnsemble, Codebook, DiscreteHmm, Quantizer};
//!
//! let quantizer = Quantizer::new(
//!     Codebook::new(vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]]).unwrap(),
//! );
//! let ensemble = ClassifierEnsemble::builder()
//!     .class(1, DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.9, 0.1]]).unwrap(), 0.0)
//!     .class(2, DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.1, 0.9]]).unwrap(), 0.0)
//!     .build()
//!     .unwrap();
//!
//! let trace = [[0.9, 1.1, 1.0], [1.0, 0.95, 1.05]];
//! let symbols = quantizer.quantize_all(trace.iter().map(|s| &s[..])).unwrap();
//! assert_eq!(ensemble.classify(&symbols).unwrap().predicted_label, 2);
//! ```

pub mod ensemble;
pub mod error;
pub mod hmm;
pub mod quantizer;

pub use ensemble::{ClassificationResult, ClassifierEnsemble, EnsembleBuilder, REJECTED_LABEL};
pub use error::{ErrorKind, HmmError, Result};
pub use hmm::{DiscreteHmm, ForwardPass, ForwardScratch, ROW_SUM_TOLERANCE};
pub use quantizer::{Codebook, Quantizer, Symbol};
