//! Numeric intervals

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which ends of an interval are included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Closure {
    OpenOpen,
    OpenClosed,
    ClosedOpen,
    ClosedClosed,
}

impl Closure {
    fn left_closed(&self) -> bool {
        matches!(self, Self::ClosedOpen | Self::ClosedClosed)
    }

    fn right_closed(&self) -> bool {
        matches!(self, Self::OpenClosed | Self::ClosedClosed)
    }
}

/// A range of numbers; an absent margin is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub closure: Closure,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

impl Interval {
    pub fn new(closure: Closure, left: Option<f64>, right: Option<f64>) -> Self {
        Self {
            closure,
            left,
            right,
        }
    }

    /// `[left, right)`
    pub fn closed_open(left: f64, right: f64) -> Self {
        Self::new(Closure::ClosedOpen, Some(left), Some(right))
    }

    /// `[left, right]`
    pub fn closed(left: f64, right: f64) -> Self {
        Self::new(Closure::ClosedClosed, Some(left), Some(right))
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }

        let above_left = match self.left {
            None => true,
            Some(left) if self.closure.left_closed() => value >= left,
            Some(left) => value > left,
        };
        let below_right = match self.right {
            None => true,
            Some(right) if self.closure.right_closed() => value <= right,
            Some(right) => value < right,
        };

        above_left && below_right
    }

    /// Whether the margins are ordered (an unbounded side always is)
    pub fn is_well_formed(&self) -> bool {
        match (self.left, self.right) {
            (Some(left), Some(right)) => left <= right,
            _ => true,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.closure.left_closed() { '[' } else { '(' };
        let close = if self.closure.right_closed() { ']' } else { ')' };
        match self.left {
            Some(left) => write!(f, "{}{}", open, left)?,
            None => write!(f, "(-INF")?,
        }
        match self.right {
            Some(right) => write!(f, ", {}{}", right, close),
            None => write!(f, ", INF)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_margins() {
        let interval = Interval::closed_open(0.0, 10.0);
        assert!(interval.contains(0.0));
        assert!(interval.contains(9.999));
        assert!(!interval.contains(10.0));

        let interval = Interval::new(Closure::OpenClosed, Some(0.0), Some(10.0));
        assert!(!interval.contains(0.0));
        assert!(interval.contains(10.0));
    }

    #[test]
    fn test_unbounded() {
        let interval = Interval::new(Closure::OpenOpen, None, Some(0.0));
        assert!(interval.contains(f64::NEG_INFINITY));
        assert!(!interval.contains(0.0));
        assert!(!interval.contains(f64::NAN));
        assert_eq!(interval.to_string(), "(-INF, 0)");
    }

    #[test]
    fn test_well_formed() {
        assert!(Interval::closed(1.0, 1.0).is_well_formed());
        assert!(!Interval::closed(2.0, 1.0).is_well_formed());
    }
}
