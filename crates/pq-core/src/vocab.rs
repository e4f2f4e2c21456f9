//! LinkedEarth ontology namespaces and the predicates the compiler references.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Local names that can be written as `prefix:local` without escaping.
static SAFE_LOCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_](?:[A-Za-z0-9_.\-]*[A-Za-z0-9_\-])?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Rdf,
    Rdfs,
    Le,
    Archive,
    Proxy,
    Pvar,
    Punits,
    Interp,
    Cproxy,
    Cunits,
    Cvar,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Rdf => "rdf",
            Namespace::Rdfs => "rdfs",
            Namespace::Le => "le",
            Namespace::Archive => "archive",
            Namespace::Proxy => "proxy",
            Namespace::Pvar => "pvar",
            Namespace::Punits => "punits",
            Namespace::Interp => "interp",
            Namespace::Cproxy => "cproxy",
            Namespace::Cunits => "cunits",
            Namespace::Cvar => "cvar",
        }
    }

    pub fn iri(self) -> &'static str {
        match self {
            Namespace::Rdf => "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
            Namespace::Rdfs => "http://www.w3.org/2000/01/rdf-schema#",
            Namespace::Le => "http://linked.earth/ontology#",
            Namespace::Archive => "http://linked.earth/ontology/archive#",
            Namespace::Proxy => "http://linked.earth/ontology/paleo_proxy#",
            Namespace::Pvar => "http://linked.earth/ontology/paleo_variables#",
            Namespace::Punits => "http://linked.earth/ontology/paleo_units#",
            Namespace::Interp => "http://linked.earth/ontology/interpretation#",
            Namespace::Cproxy => "http://linked.earth/ontology/chron_proxy#",
            Namespace::Cunits => "http://linked.earth/ontology/chron_units#",
            Namespace::Cvar => "http://linked.earth/ontology/chron_variables#",
        }
    }
}

/// An ontology term: namespace plus local name.
///
/// Local names come straight from user filters and are never validated
/// against the store vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iri {
    pub ns: Namespace,
    pub local: Cow<'static, str>,
}

impl Iri {
    pub const fn from_static(ns: Namespace, local: &'static str) -> Self {
        Self {
            ns,
            local: Cow::Borrowed(local),
        }
    }

    pub fn new(ns: Namespace, local: impl Into<String>) -> Self {
        Self {
            ns,
            local: Cow::Owned(local.into()),
        }
    }

    /// Whether this term renders as `prefix:local` (and so needs its PREFIX declared).
    pub fn is_prefixed(&self) -> bool {
        SAFE_LOCAL.is_match(&self.local)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_prefixed() {
            write!(f, "{}:{}", self.ns.prefix(), self.local)
        } else {
            write!(f, "<{}{}>", self.ns.iri(), escape_iri(&self.local))
        }
    }
}

/// Percent-encode characters that are not allowed, or would change meaning, inside an IRIREF.
fn escape_iri(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    for c in local.chars() {
        if c.is_control() || matches!(
            c,
            ' ' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '%' | '#'
        ) {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

// --- Classes and predicates ---

pub const RDF_TYPE: Iri = Iri::from_static(Namespace::Rdf, "type");
pub const RDFS_LABEL: Iri = Iri::from_static(Namespace::Rdfs, "label");

pub const DATASET: Iri = Iri::from_static(Namespace::Le, "Dataset");
pub const HAS_NAME: Iri = Iri::from_static(Namespace::Le, "hasName");
pub const HAS_ARCHIVE_TYPE: Iri = Iri::from_static(Namespace::Le, "hasArchiveType");
pub const HAS_PALEO_DATA: Iri = Iri::from_static(Namespace::Le, "hasPaleoData");
pub const HAS_MEASUREMENT_TABLE: Iri = Iri::from_static(Namespace::Le, "hasMeasurementTable");
pub const HAS_VARIABLE: Iri = Iri::from_static(Namespace::Le, "hasVariable");
pub const HAS_STANDARD_VARIABLE: Iri = Iri::from_static(Namespace::Le, "hasStandardVariable");
pub const HAS_INTERPRETATION: Iri = Iri::from_static(Namespace::Le, "hasInterpretation");
pub const HAS_RESOLUTION: Iri = Iri::from_static(Namespace::Le, "hasResolution");
pub const HAS_UNITS: Iri = Iri::from_static(Namespace::Le, "hasUnits");
pub const HAS_MIN_VALUE: Iri = Iri::from_static(Namespace::Le, "hasMinValue");
pub const HAS_MAX_VALUE: Iri = Iri::from_static(Namespace::Le, "hasMaxValue");
pub const HAS_LOCATION: Iri = Iri::from_static(Namespace::Le, "hasLocation");
pub const HAS_LATITUDE: Iri = Iri::from_static(Namespace::Le, "hasLatitude");
pub const HAS_LONGITUDE: Iri = Iri::from_static(Namespace::Le, "hasLongitude");

// --- Standard time variables ---

pub const PVAR_AGE: Iri = Iri::from_static(Namespace::Pvar, "age");
pub const PVAR_YEAR: Iri = Iri::from_static(Namespace::Pvar, "year");

/// Year-like resolution units.
pub const YEAR_RESOLUTION_UNITS: [Iri; 3] = [
    Iri::from_static(Namespace::Punits, "yr_AD"),
    Iri::from_static(Namespace::Punits, "yr_BP"),
    Iri::from_static(Namespace::Punits, "yr"),
];

/// Resolution units finer than a year.
pub const SUBANNUAL_RESOLUTION_UNITS: [Iri; 3] = [
    Iri::from_static(Namespace::Punits, "month"),
    Iri::from_static(Namespace::Punits, "day"),
    Iri::from_static(Namespace::Punits, "hour"),
];
