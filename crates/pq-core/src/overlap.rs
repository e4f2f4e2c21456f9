//! Interval relationship between a dataset's time span and a named period.

use std::fmt;
use std::str::FromStr;

use crate::ast::Expr;
use crate::units::BpRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlapMode {
    /// Any overlap at all.
    #[default]
    Partial,
    /// Dataset span covers the whole period.
    Containing,
    /// Dataset span lies entirely inside the period.
    Contained,
}

impl OverlapMode {
    pub const ALL: [OverlapMode; 3] = [
        OverlapMode::Partial,
        OverlapMode::Containing,
        OverlapMode::Contained,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OverlapMode::Partial => "partial",
            OverlapMode::Containing => "containing",
            OverlapMode::Contained => "contained",
        }
    }

    /// Numeric form of `predicate`, for ranges already on the BP scale.
    pub fn holds(self, dataset: BpRange, period: BpRange) -> bool {
        match self {
            OverlapMode::Partial => dataset.min <= period.max && dataset.max >= period.min,
            OverlapMode::Containing => dataset.min <= period.min && dataset.max >= period.max,
            OverlapMode::Contained => dataset.min >= period.min && dataset.max <= period.max,
        }
    }

    /// Boolean expression relating the dataset's BP bounds to `period`.
    pub fn predicate(self, dataset_min: Expr, dataset_max: Expr, period: BpRange) -> Expr {
        let (lo, hi) = match self {
            OverlapMode::Partial => (
                Expr::le(dataset_min, Expr::num(period.max)),
                Expr::ge(dataset_max, Expr::num(period.min)),
            ),
            OverlapMode::Containing => (
                Expr::le(dataset_min, Expr::num(period.min)),
                Expr::ge(dataset_max, Expr::num(period.max)),
            ),
            OverlapMode::Contained => (
                Expr::ge(dataset_min, Expr::num(period.min)),
                Expr::le(dataset_max, Expr::num(period.max)),
            ),
        };
        Expr::And(vec![lo, hi])
    }
}

impl fmt::Display for OverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOverlapMode(pub String);

impl fmt::Display for UnknownOverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown overlap type '{}' (expected partial, containing or contained)",
            self.0
        )
    }
}

impl std::error::Error for UnknownOverlapMode {}

impl FromStr for OverlapMode {
    type Err = UnknownOverlapMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownOverlapMode(s.to_string()))
    }
}
