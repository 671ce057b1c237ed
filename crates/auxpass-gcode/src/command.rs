//! Move command tokenizing
//!
//! Only the two linear motion opcodes are understood. Everything else in a
//! program passes through the tracker untouched.

use std::fmt;

/// Linear motion opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOpcode {
    /// G0 - rapid positioning
    Rapid,
    /// G1 - linear interpolation
    Linear,
}

impl MoveOpcode {
    /// Match a normalised opcode word (`g0`, `g00`, `g1`, `g01`)
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "g0" | "g00" => Some(Self::Rapid),
            "g1" | "g01" => Some(Self::Linear),
            _ => None,
        }
    }

    /// Canonical upper-case opcode text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Linear => "G1",
        }
    }
}

impl fmt::Display for MoveOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalise a raw program line: drop the `;` comment, trim, lower-case
pub fn normalize(line: &str) -> String {
    let code = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    };
    code.trim().to_lowercase()
}

/// A tokenized `G0`/`G1` command
///
/// Words are stored normalised, in the order they were written.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCommand {
    opcode: MoveOpcode,
    words: Vec<String>,
}

impl MoveCommand {
    /// Tokenize a raw line.
    ///
    /// Returns `None` when the first word is not a linear motion opcode.
    pub fn parse(line: &str) -> Option<Self> {
        let normalized = normalize(line);
        let mut tokens = normalized.split_whitespace();
        let opcode = MoveOpcode::from_word(tokens.next()?)?;
        Some(Self {
            opcode,
            words: tokens.map(str::to_string).collect(),
        })
    }

    /// The motion opcode
    pub fn opcode(&self) -> MoveOpcode {
        self.opcode
    }

    /// Parameter words following the opcode
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True when some word starts with `letter`
    pub fn has_word(&self, letter: char) -> bool {
        let letter = letter.to_ascii_lowercase();
        self.words.iter().any(|w| w.starts_with(letter))
    }

    /// Moves that extrude or change height are the ones tied to the print
    pub fn is_print_relevant(&self) -> bool {
        self.has_word('e') || self.has_word('z')
    }

    /// Words addressing the X, Y or Z axis
    pub fn axis_words(&self) -> impl Iterator<Item = &str> {
        self.words
            .iter()
            .map(String::as_str)
            .filter(|w| matches!(w.chars().next(), Some('x' | 'y' | 'z')))
    }
}

/// Split an axis word into its letter and value.
///
/// The value must be a finite number; `None` otherwise.
pub fn parse_axis_word(word: &str) -> Option<(char, f64)> {
    let mut chars = word.chars();
    let axis = chars.next()?;
    let value: f64 = chars.as_str().parse().ok()?;
    value.is_finite().then_some((axis, value))
}
