//! # wand_spell
//!
//! Turns a wand gesture into a spell shape.  A trace of 3-D motion samples
//! is quantized against a codebook, scored by one HMM per trained shape, and
//! the winning class label is mapped to a [`Shape`].
//!
//! ## Class label → Shape
//!
//! | Label | Shape |
//! |---|---|
//! | 1 | `circle` |
//! | 2 | `clock` |
//! | 3 | `pi` |
//! | 4 | `shield` |
//! | 5 | `triangle` |
//! | 6 | `v` |
//! | 7 | `z` |
//! | 0 (rejected) or anything else | `fail` |
//!
//! ## Model sources
//!
//! | Source | Files | Env override |
//! |---|---|---|
//! | Text (default) | `wf_hmm_quantizer.txt` + `wf_hmm_model.txt` | `WAND_CODEBOOK`, `WAND_MODEL` |
//! | Snapshot | one `WNDS` binary file | `WAND_SNAPSHOT` |
//!
//! A [`Recognizer`] may be reloaded while other threads recognize; each call
//! runs entirely on whichever [`ModelSet`] was published when it started.
//! [`RecognizerWorker`] moves recognition onto its own thread for callers
//! that must not block.

pub mod config;
pub mod error;
pub mod model_set;
pub mod recognizer;
pub mod shape;
pub mod trace;
pub mod worker;

pub use config::{ModelSource, RecognizerConfig};
pub use error::{Result, SpellError};
pub use model_set::{ModelSet, Recognition};
pub use recognizer::Recognizer;
pub use shape::{Sample, Shape, SAMPLE_DIMENSIONS};
pub use trace::{parse_trace, read_trace};
pub use worker::{GestureTrace, RecognitionEvent, RecognizerWorker, WorkerCommand};
