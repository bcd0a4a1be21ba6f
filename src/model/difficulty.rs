use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Estimated cost of auditing an assertion. Higher is harder.
///
/// Either a finite, strictly positive value, or unbounded: the assertion
/// cannot be audited at all (or no assertion exists). Unbounded compares
/// greater than every bounded value. Serialized as a number, or `null` when
/// unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub struct Difficulty(Option<f64>);

impl Difficulty {
    /// No bound on the difficulty.
    pub const UNBOUNDED: Self = Self(None);

    /// Wrap a raw estimate. Anything that is not finite and strictly positive
    /// is treated as unbounded.
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(Some(value))
        } else {
            Self::UNBOUNDED
        }
    }

    /// The estimate, if bounded.
    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_bounded(&self) -> bool {
        self.0.is_some()
    }

    /// Is this bounded and no greater than `bound`?
    pub fn at_most(&self, bound: f64) -> bool {
        matches!(self.0, Some(value) if value <= bound)
    }
}

impl From<Option<f64>> for Difficulty {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::UNBOUNDED, Self::new)
    }
}

impl From<Difficulty> for Option<f64> {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.0
    }
}

impl Ord for Difficulty {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Difficulty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Difficulty {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

// Bounded values are never NaN, so equality is total.
impl Eq for Difficulty {}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_values_are_unbounded() {
        assert_eq!(Difficulty::new(f64::NAN), Difficulty::UNBOUNDED);
        assert_eq!(Difficulty::new(f64::INFINITY), Difficulty::UNBOUNDED);
        assert_eq!(Difficulty::new(0.0), Difficulty::UNBOUNDED);
        assert_eq!(Difficulty::new(-3.0), Difficulty::UNBOUNDED);
        assert_eq!(Difficulty::new(2.5).value(), Some(2.5));
    }

    #[test]
    fn ordering() {
        let easy = Difficulty::new(4.0);
        let hard = Difficulty::new(20.0);
        assert!(easy < hard);
        assert!(hard < Difficulty::UNBOUNDED);
        assert_eq!(easy.min(Difficulty::UNBOUNDED), easy);
        assert!(easy.at_most(4.0));
        assert!(!hard.at_most(4.0));
        assert!(!Difficulty::UNBOUNDED.at_most(f64::MAX));
    }

    #[test]
    fn serialization() {
        assert_eq!(serde_json::to_string(&Difficulty::new(7.0)).unwrap(), "7.0");
        assert_eq!(serde_json::to_string(&Difficulty::UNBOUNDED).unwrap(), "null");
        let parsed: Difficulty = serde_json::from_str("null").unwrap();
        assert!(!parsed.is_bounded());
        assert_eq!(Difficulty::UNBOUNDED.to_string(), "inf");
    }
}
