//! Spell shapes and the samples they are drawn from.

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

/// A spell shape as the game sees it.
///
/// `Fail` is what recognition returns when no trained shape matched;
/// `None` is the game's "nothing drawn yet" state and is never produced by
/// the recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Triangle,
    Circle,
    Clock,
    Z,
    V,
    Pi,
    Shield,
    Fail,
    None,
}

impl Shape {
    /// Map an ensemble class label to a shape.
    ///
    /// | Label | Shape |
    /// |---|---|
    /// | 1 | Circle |
    /// | 2 | Clock |
    /// | 3 | Pi |
    /// | 4 | Shield |
    /// | 5 | Triangle |
    /// | 6 | V |
    /// | 7 | Z |
    /// | anything else (incl. 0 = rejected) | Fail |
    pub fn from_label(label: u32) -> Shape {
        match label {
            1 => Shape::Circle,
            2 => Shape::Clock,
            3 => Shape::Pi,
            4 => Shape::Shield,
            5 => Shape::Triangle,
            6 => Shape::V,
            7 => Shape::Z,
            _ => Shape::Fail,
        }
    }

    /// Inverse of [`from_label`](Self::from_label) for trained shapes.
    pub fn label(&self) -> Option<u32> {
        match self {
            Shape::Circle   => Some(1),
            Shape::Clock    => Some(2),
            Shape::Pi       => Some(3),
            Shape::Shield   => Some(4),
            Shape::Triangle => Some(5),
            Shape::V        => Some(6),
            Shape::Z        => Some(7),
            Shape::Fail | Shape::None => Option::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Triangle => "triangle",
            Shape::Circle   => "circle",
            Shape::Clock    => "clock",
            Shape::Z        => "z",
            Shape::V        => "v",
            Shape::Pi       => "pi",
            Shape::Shield   => "shield",
            Shape::Fail     => "fail",
            Shape::None     => "none",
        }
    }

    /// Shapes a trained ensemble can report, in label order.
    pub fn trained() -> [Shape; 7] {
        [
            Shape::Circle,
            Shape::Clock,
            Shape::Pi,
            Shape::Shield,
            Shape::Triangle,
            Shape::V,
            Shape::Z,
        ]
    }

    pub fn is_match(&self) -> bool {
        self.label().is_some()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sample
// ════════════════════════════════════════════════════════════════════════════

/// Components per motion sample.
pub const SAMPLE_DIMENSIONS: usize = 3;

/// One 3-D motion sample (acceleration or position, as captured).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Sample { x, y, z }
    }

    pub fn to_array(self) -> [f64; SAMPLE_DIMENSIONS] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; SAMPLE_DIMENSIONS]> for Sample {
    fn from(v: [f64; SAMPLE_DIMENSIONS]) -> Self {
        Sample { x: v[0], y: v[1], z: v[2] }
    }
}
