//! Text schema for HMM ensembles.
//!
//! ```text
//! UseNullRejection: <0|1>
//! NumClasses: <C>
//! NullRejectionThresholds: <C floats>
//! ClassLabels: <C ints>
//! Model_ID: <k+1>          ┐
//! NumStates: <N>           │
//! A:                       │
//! <N rows of N floats>     │ repeated C times
//! B:                       │
//! <N rows of K floats>     │
//! Pi:                      │
//! <N floats>               ┘
//! ```
//!
//! The file never states `K`; the first `B` row fixes it and every later
//! `B` row, in every model, must agree.  Any error aborts the whole parse,
//! so a caller either gets a complete ensemble or nothing.

use std::fmt;

use tracing::warn;
use wand_hmm::{ClassifierEnsemble, DiscreteHmm, HmmError};

use crate::codebook::write_row;
use crate::error::{ModelError, ParseError, Result};
use crate::reader::LineReader;

pub const USE_NULL_REJECTION:        &str = "UseNullRejection:";
pub const NUM_CLASSES:               &str = "NumClasses:";
pub const NULL_REJECTION_THRESHOLDS: &str = "NullRejectionThresholds:";
pub const CLASS_LABELS:              &str = "ClassLabels:";
pub const MODEL_ID:                  &str = "Model_ID:";
pub const NUM_STATES:                &str = "NumStates:";
pub const A_MATRIX:                  &str = "A:";
pub const B_MATRIX:                  &str = "B:";
pub const PI_VECTOR:                 &str = "Pi:";

/// Parse an ensemble file's contents.
pub fn parse_ensemble(text: &str) -> Result<ClassifierEnsemble> {
    let mut reader = LineReader::new(text);

    let flag = reader.header(USE_NULL_REJECTION)?;
    let use_null_rejection = match flag.single::<u8>("UseNullRejection")? {
        0 => false,
        1 => true,
        _ => {
            return Err(ParseError::MalformedToken {
                line:  flag.line,
                field: "UseNullRejection".into(),
                token: flag.tokens[0].to_string(),
            }
            .into())
        }
    };

    let classes = reader.header(NUM_CLASSES)?;
    let num_classes: usize = classes.single("NumClasses")?;
    if num_classes == 0 {
        return Err(ModelError::Invalid(HmmError::Configuration(format!(
            "line {}: ensemble declares zero classes",
            classes.line
        ))));
    }

    let thresholds: Vec<f64> = reader
        .header(NULL_REJECTION_THRESHOLDS)?
        .values("NullRejectionThresholds", num_classes)?;
    let labels: Vec<u32> = reader
        .header(CLASS_LABELS)?
        .values("ClassLabels", num_classes)?;

    let mut alphabet = None;
    let mut models = Vec::new();
    for k in 0..num_classes {
        let model_id = k + 1;
        let (pi, a, b) = read_model(&mut reader, model_id, &mut alphabet)
            .map_err(|e| e.in_model(model_id))?;
        let model = DiscreteHmm::new(pi, a, b)
            .map_err(|source| ModelError::InvalidModel { model: model_id, source })?;
        models.push(model);
    }

    if let Some(line) = reader.trailing_content() {
        warn!(line, "ignoring content after the last model");
    }
    Ok(ClassifierEnsemble::new(labels, models, thresholds, use_null_rejection)?)
}

type ModelTables = (Vec<f64>, Vec<Vec<f64>>, Vec<Vec<f64>>);

fn read_model(
    reader:   &mut LineReader<'_>,
    model_id: usize,
    alphabet: &mut Option<usize>,
) -> std::result::Result<ModelTables, ParseError> {
    let id_line = reader.header(MODEL_ID)?;
    let found: usize = id_line.single("Model_ID")?;
    if found != model_id {
        return Err(ParseError::ModelIdMismatch { line: id_line.line, expected: model_id, found });
    }

    let states_line = reader.header(NUM_STATES)?;
    let n: usize = states_line.single("NumStates")?;
    if n == 0 {
        return Err(ParseError::MalformedToken {
            line:  states_line.line,
            field: "NumStates".into(),
            token: "0".into(),
        });
    }

    reader.bare_header(A_MATRIX)?;
    let mut a = Vec::new();
    for i in 0..n {
        let field = format!("A row {}", i + 1);
        a.push(reader.row(&field)?.values(&field, n)?);
    }

    reader.bare_header(B_MATRIX)?;
    let mut b = Vec::new();
    for i in 0..n {
        let field = format!("B row {}", i + 1);
        let row = reader.row(&field)?;
        let values: Vec<f64> = match *alphabet {
            Some(k) => row.values(&field, k)?,
            None    => row.all_values(&field)?,
        };
        *alphabet = Some(values.len());
        b.push(values);
    }

    reader.bare_header(PI_VECTOR)?;
    let pi = reader.row("Pi")?.values("Pi", n)?;

    Ok((pi, a, b))
}

/// Displays an ensemble in the exact layout [`parse_ensemble`] accepts.
pub struct EnsembleText<'a>(pub &'a ClassifierEnsemble);

impl fmt::Display for EnsembleText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ensemble = self.0;
        writeln!(f, "{} {}", USE_NULL_REJECTION, u8::from(ensemble.use_null_rejection()))?;
        writeln!(f, "{} {}", NUM_CLASSES, ensemble.num_classes())?;

        write!(f, "{} ", NULL_REJECTION_THRESHOLDS)?;
        write_row(f, ensemble.thresholds())?;

        f.write_str(CLASS_LABELS)?;
        for label in ensemble.class_labels() {
            write!(f, " {}", label)?;
        }
        f.write_str("\n")?;

        for (k, model) in ensemble.models().iter().enumerate() {
            let n = model.num_states();
            writeln!(f, "{} {}", MODEL_ID, k + 1)?;
            writeln!(f, "{} {}", NUM_STATES, n)?;
            writeln!(f, "{}", A_MATRIX)?;
            for i in 0..n {
                write_row(f, model.transition_row(i))?;
            }
            writeln!(f, "{}", B_MATRIX)?;
            for i in 0..n {
                write_row(f, model.emission_row(i))?;
            }
            writeln!(f, "{}", PI_VECTOR)?;
            write_row(f, model.initial())?;
        }
        Ok(())
    }
}

pub fn ensemble_to_string(ensemble: &ClassifierEnsemble) -> String {
    EnsembleText(ensemble).to_string()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TWO_CLASSES: &str = "\
UseNullRejection: 1
NumClasses: 2
NullRejectionThresholds: 0.25 0.5
ClassLabels: 3 7
Model_ID: 1
NumStates: 2
A:
0.7 0.3
0 1
B:
0.6 0.3 0.1
0.1 0.1 0.8
Pi:
1 0
Model_ID: 2
NumStates: 1
A:
1
B:
0.2 0.2 0.6
Pi:
1
";

    fn replace_line(text: &str, line: usize, with: &str) -> String {
        text.lines()
            .enumerate()
            .map(|(i, l)| if i + 1 == line { with } else { l })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn parses_header_and_models() {
        let e = parse_ensemble(TWO_CLASSES).unwrap();
        assert!(e.use_null_rejection());
        assert_eq!(e.num_classes(), 2);
        assert_eq!(e.class_labels(), &[3, 7]);
        assert_eq!(e.thresholds(), &[0.25, 0.5]);
        assert_eq!(e.num_symbols(), 3);
        assert_eq!(e.models()[0].num_states(), 2);
        assert_eq!(e.models()[0].transition_row(0), &[0.7, 0.3]);
        assert_eq!(e.models()[1].emission_row(0), &[0.2, 0.2, 0.6]);
    }

    #[test]
    fn round_trip_preserves_everything() {
        let e = parse_ensemble(TWO_CLASSES).unwrap();
        let back = parse_ensemble(&ensemble_to_string(&e)).unwrap();
        assert_eq!(back.use_null_rejection(), e.use_null_rejection());
        assert_eq!(back.class_labels(), e.class_labels());
        assert_eq!(back.thresholds(), e.thresholds());
        for (m, n) in e.models().iter().zip(back.models()) {
            for i in 0..m.num_states() {
                for (x, y) in m.transition_row(i).iter().zip(n.transition_row(i)) {
                    assert_relative_eq!(*x, *y);
                }
                for (x, y) in m.emission_row(i).iter().zip(n.emission_row(i)) {
                    assert_relative_eq!(*x, *y);
                }
            }
            assert_eq!(m.initial(), n.initial());
        }
    }

    #[test]
    fn round_trip_of_built_ensemble() {
        let third = 1.0 / 3.0;
        let wide = DiscreteHmm::new(
            vec![third, third, third],
            vec![vec![third; 3], vec![0.5, 0.25, 0.25], vec![0.0, 0.0, 1.0]],
            vec![vec![0.1, 0.9], vec![0.35, 0.65], vec![1.0, 0.0]],
        )
        .unwrap();
        let narrow = DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.5, 0.5]]).unwrap();
        let e = ClassifierEnsemble::builder()
            .class(1, wide, 0.125)
            .class(4, narrow, 0.0)
            .null_rejection(false)
            .build()
            .unwrap();
        let back = parse_ensemble(&ensemble_to_string(&e)).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn renamed_header_leaves_nothing_behind() {
        let broken = replace_line(TWO_CLASSES, 2, "Classes: 2");
        match parse_ensemble(&broken).unwrap_err() {
            ModelError::Parse(ParseError::HeaderMismatch { line, expected, found }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, NUM_CLASSES);
                assert_eq!(found, "Classes: 2");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn header_error_inside_model_names_class() {
        let broken = replace_line(TWO_CLASSES, 19, "Bee:");
        let err = parse_ensemble(&broken).unwrap_err();
        match err {
            ModelError::Parse(ref p) => {
                assert_eq!(p.model(), Some(2));
                assert_eq!(p.line(), 19);
                assert!(err.to_string().contains("model 2"));
                assert!(err.to_string().contains("B:"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn model_id_must_match_position() {
        let broken = replace_line(TWO_CLASSES, 15, "Model_ID: 5");
        match parse_ensemble(&broken).unwrap_err() {
            ModelError::Parse(ParseError::InModel { model, source }) => {
                assert_eq!(model, 2);
                assert_eq!(*source, ParseError::ModelIdMismatch { line: 15, expected: 2, found: 5 });
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn emission_width_must_be_consistent() {
        let broken = replace_line(TWO_CLASSES, 20, "0.5 0.5");
        match parse_ensemble(&broken).unwrap_err() {
            ModelError::Parse(ParseError::InModel { model, source }) => {
                assert_eq!(model, 2);
                assert!(matches!(*source, ParseError::FieldCount { line: 20, expected: 3, found: 2, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn threshold_count_checked() {
        let broken = replace_line(TWO_CLASSES, 3, "NullRejectionThresholds: 0.25");
        assert!(matches!(
            parse_ensemble(&broken).unwrap_err(),
            ModelError::Parse(ParseError::FieldCount { line: 3, expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn rejection_flag_must_be_binary() {
        let broken = replace_line(TWO_CLASSES, 1, "UseNullRejection: 2");
        assert!(matches!(
            parse_ensemble(&broken).unwrap_err(),
            ModelError::Parse(ParseError::MalformedToken { line: 1, .. })
        ));
    }

    #[test]
    fn thresholds_may_be_fractional() {
        let e = parse_ensemble(TWO_CLASSES).unwrap();
        assert_relative_eq!(e.thresholds()[0], 0.25);
    }

    #[test]
    fn truncated_model_fails() {
        let cut: String = TWO_CLASSES.lines().take(18).collect::<Vec<_>>().join("\n");
        let err = parse_ensemble(&cut).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Parse(ParseError::InModel { model: 2, .. })
        ));
    }

    #[test]
    fn huge_state_count_is_truncation() {
        let head: String = TWO_CLASSES.lines().take(7).collect::<Vec<_>>().join("\n");
        let cut = replace_line(&head, 6, "NumStates: 18446744073709551615");
        match parse_ensemble(&cut).unwrap_err() {
            ModelError::Parse(ParseError::InModel { model, source }) => {
                assert_eq!(model, 1);
                assert!(matches!(*source, ParseError::Truncated { line: 7, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn huge_class_count_is_field_count() {
        let broken = replace_line(TWO_CLASSES, 2, "NumClasses: 18446744073709551615");
        assert!(matches!(
            parse_ensemble(&broken).unwrap_err(),
            ModelError::Parse(ParseError::FieldCount { line: 3, found: 2, .. })
        ));
    }

    #[test]
    fn bad_probabilities_name_the_model() {
        let broken = replace_line(TWO_CLASSES, 9, "0.5 0.6");
        assert!(matches!(
            parse_ensemble(&broken).unwrap_err(),
            ModelError::InvalidModel { model: 1, .. }
        ));
    }

    #[test]
    fn zero_label_rejected() {
        let broken = replace_line(TWO_CLASSES, 4, "ClassLabels: 0 7");
        assert!(matches!(
            parse_ensemble(&broken).unwrap_err(),
            ModelError::Invalid(HmmError::InvalidLabel(0))
        ));
    }

    #[test]
    fn trailing_separator_tolerated() {
        let text = format!("{}\n==========================\n", TWO_CLASSES);
        assert_eq!(parse_ensemble(&text).unwrap().num_classes(), 2);
    }
}
