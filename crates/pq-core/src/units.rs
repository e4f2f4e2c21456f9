//! Time unit normalization onto the years-before-present (BP) scale.
//!
//! A dataset's time variable may be stored in any of four unit families.
//! `normalize` converts literal values; `UnitFamily::bp_exprs` produces the
//! same conversion as query expressions so the store can apply it per row.

use crate::ast::{ArithOp, Expr, Term};
use crate::constants::{B2K_OFFSET_YEARS, REFERENCE_EPOCH_CE, YEARS_PER_KYR};
use crate::vocab::{Iri, Namespace};

/// A closed range on the BP scale, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpRange {
    pub min: f64,
    pub max: f64,
}

impl BpRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    /// `yr_BP`: already on the target scale.
    YearsBp,
    /// `yr_AD` / `yr_CE`: calendar years, increasing towards the present.
    Calendar,
    /// `yr_b2k`: years before 2000 CE.
    B2k,
    /// `ka` / `kyr`: thousands of years BP.
    KiloYears,
}

impl UnitFamily {
    /// Emission order of the per-family branches.
    pub const ALL: [UnitFamily; 4] = [
        UnitFamily::YearsBp,
        UnitFamily::Calendar,
        UnitFamily::B2k,
        UnitFamily::KiloYears,
    ];

    /// Unit tags (local names in the `punits` namespace) that belong to this family.
    pub fn tags(self) -> &'static [&'static str] {
        match self {
            UnitFamily::YearsBp => &["yr_BP"],
            UnitFamily::Calendar => &["yr_AD", "yr_CE"],
            UnitFamily::B2k => &["yr_b2k"],
            UnitFamily::KiloYears => &["ka", "kyr"],
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.tags().iter().any(|t| *t == tag))
    }

    /// Unit IRIs for the `IN (...)` guard of this family's branch.
    pub fn unit_terms(self) -> Vec<Term> {
        self.tags()
            .iter()
            .map(|t| Term::Iri(Iri::from_static(Namespace::Punits, t)))
            .collect()
    }

    /// Whether the conversion flips which raw bound becomes the BP minimum.
    pub fn inverts(self) -> bool {
        matches!(self, UnitFamily::Calendar)
    }

    /// Convert one raw value to BP.
    pub fn to_bp(self, value: f64) -> f64 {
        match self {
            UnitFamily::YearsBp => value,
            UnitFamily::Calendar => REFERENCE_EPOCH_CE - value,
            UnitFamily::B2k => value - B2K_OFFSET_YEARS,
            UnitFamily::KiloYears => value * YEARS_PER_KYR,
        }
    }

    /// Convert a raw `[min, max]` pair to a BP range.
    pub fn normalize(self, min_value: f64, max_value: f64) -> BpRange {
        if self.inverts() {
            BpRange::new(self.to_bp(max_value), self.to_bp(min_value))
        } else {
            BpRange::new(self.to_bp(min_value), self.to_bp(max_value))
        }
    }

    /// Symbolic form of `normalize`: `(min_bp, max_bp)` expressions over the
    /// raw min/max expressions, or `None` when no conversion is needed.
    pub fn bp_exprs(self, raw_min: &Expr, raw_max: &Expr) -> Option<(Expr, Expr)> {
        match self {
            UnitFamily::YearsBp => None,
            UnitFamily::Calendar => Some((
                Expr::arith(ArithOp::Sub, Expr::num(REFERENCE_EPOCH_CE), raw_max.clone()),
                Expr::arith(ArithOp::Sub, Expr::num(REFERENCE_EPOCH_CE), raw_min.clone()),
            )),
            UnitFamily::B2k => Some((
                Expr::arith(ArithOp::Sub, raw_min.clone(), Expr::num(B2K_OFFSET_YEARS)),
                Expr::arith(ArithOp::Sub, raw_max.clone(), Expr::num(B2K_OFFSET_YEARS)),
            )),
            UnitFamily::KiloYears => Some((
                Expr::arith(ArithOp::Mul, raw_min.clone(), Expr::num(YEARS_PER_KYR)),
                Expr::arith(ArithOp::Mul, raw_max.clone(), Expr::num(YEARS_PER_KYR)),
            )),
        }
    }
}

/// Convert a raw `[min, max]` pair in `unit` to BP. Unknown units yield `None`.
pub fn normalize(min_value: f64, max_value: f64, unit: &str) -> Option<BpRange> {
    UnitFamily::from_tag(unit).map(|family| family.normalize(min_value, max_value))
}
