//! Filter compilation: parameter record → `SelectQuery`.
//!
//! Each filter category contributes a block of patterns; categories are
//! joined conjunctively in a fixed order (archive, variables and
//! interpretations with their resolution, time, location). Every variable
//! comes from one `VarGen`, so two chains can never share a node by
//! accident and identical input always yields identical output.

use std::fmt;

use crate::ast::{Expr, Pattern, SelectQuery, Term, Var, VarGen};
use crate::constants::{ANNUAL_MAX_INTERVAL, DECADAL_MAX_INTERVAL, TIME_LABEL_PATTERN};
use crate::error::CompileError;
use crate::overlap::OverlapMode;
use crate::params::FilterParams;
use crate::periods::{self, TimePeriod};
use crate::regions::{self, BoundingBox, MatchKind};
use crate::render;
use crate::units::UnitFamily;
use crate::vocab::{self, Iri, Namespace};

/// What to do with a filter value that cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Drop the filter (or fall back to `partial` overlap) and warn.
    #[default]
    Ignore,
    /// Fail the compilation.
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub unknown: UnknownPolicy,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self {
            unknown: UnknownPolicy::Reject,
        }
    }
}

/// A degradation the caller may want to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    UnknownTimePeriod(String),
    UnknownRegion(String),
    UnknownOverlap(String),
    PartialRegionMatch { query: String, region: &'static str },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownTimePeriod(name) => {
                write!(f, "unknown time period '{name}', no time filtering applied")
            }
            Warning::UnknownRegion(name) => {
                write!(f, "unknown region '{name}', no location filtering applied")
            }
            Warning::UnknownOverlap(mode) => {
                write!(f, "unknown overlap type '{mode}', using 'partial'")
            }
            Warning::PartialRegionMatch { query, region } => {
                write!(f, "using partial match '{region}' for region query '{query}'")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub query: SelectQuery,
    pub warnings: Vec<Warning>,
}

impl CompiledQuery {
    pub fn render(&self) -> String {
        render::render(&self.query)
    }
}

/// How a resolution term is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionClass {
    /// Sampling interval of at most one year.
    Annual,
    /// Sampling interval of at most ten years.
    Decadal,
    /// Case-insensitive substring match on the resolution label, any term.
    Labels(Vec<String>),
}

impl ResolutionClass {
    /// Classify a `|`-delimited resolution string. Blank input yields `None`.
    pub fn parse(resolution: &str) -> Option<Self> {
        let terms: Vec<String> = resolution
            .to_lowercase()
            .split('|')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return None;
        }
        let any = |words: &[&str]| terms.iter().any(|t| words.contains(&t.as_str()));
        Some(if any(&["annual", "yr", "year"]) {
            ResolutionClass::Annual
        } else if any(&["decadal", "decade"]) {
            ResolutionClass::Decadal
        } else {
            ResolutionClass::Labels(terms)
        })
    }
}

/// Patterns reaching one measured variable, plus the variable they end on.
struct Chain {
    patterns: Vec<Pattern>,
    variable: Var,
}

/// Compile with the given options.
pub fn compile(
    params: &FilterParams,
    options: &CompileOptions,
) -> Result<CompiledQuery, CompileError> {
    FilterCompiler::new(*options).compile(params)
}

pub struct FilterCompiler {
    options: CompileOptions,
    vars: VarGen,
    warnings: Vec<Warning>,
}

impl FilterCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            vars: VarGen::new(),
            warnings: Vec::new(),
        }
    }

    pub fn compile(mut self, params: &FilterParams) -> Result<CompiledQuery, CompileError> {
        let params = params.clone().normalized();
        let mut query = SelectQuery::distinct(Var::dataset_name());

        query.extend(self.dataset_patterns(params.archive_type.as_deref()));

        let resolution = params.resolution.as_deref().and_then(ResolutionClass::parse);
        query.extend(self.measurement_patterns(
            &params.variables,
            &params.interpretations,
            resolution.as_ref(),
        ));

        if let Some(name) = params.time_period.as_deref()
            && let Some(period) = self.resolve_period(name)?
        {
            let mode = self.resolve_overlap(params.time_overlap.as_deref())?;
            query.extend(self.time_patterns(period, mode));
        }

        if let Some(name) = params.location.as_deref()
            && let Some(bbox) = self.resolve_region(name)?
        {
            query.extend(self.location_patterns(&bbox));
        }

        Ok(CompiledQuery {
            query,
            warnings: self.warnings,
        })
    }

    // --- name resolution ---

    fn resolve_period(&mut self, name: &str) -> Result<Option<&'static TimePeriod>, CompileError> {
        match periods::lookup(name) {
            Some(p) => Ok(Some(p)),
            None if self.options.unknown == UnknownPolicy::Reject => {
                Err(CompileError::UnknownTimePeriod(name.to_string()))
            }
            None => {
                tracing::warn!("unknown time period: {name}, no time filtering will be applied");
                self.warnings.push(Warning::UnknownTimePeriod(name.to_string()));
                Ok(None)
            }
        }
    }

    fn resolve_overlap(&mut self, mode: Option<&str>) -> Result<OverlapMode, CompileError> {
        let Some(text) = mode else {
            return Ok(OverlapMode::default());
        };
        match text.parse::<OverlapMode>() {
            Ok(m) => Ok(m),
            Err(e) if self.options.unknown == UnknownPolicy::Reject => Err(e.into()),
            Err(_) => {
                tracing::warn!("unknown overlap type: {text}, using 'partial'");
                self.warnings.push(Warning::UnknownOverlap(text.to_string()));
                Ok(OverlapMode::Partial)
            }
        }
    }

    fn resolve_region(&mut self, name: &str) -> Result<Option<BoundingBox>, CompileError> {
        match regions::lookup(name) {
            Some(m) => {
                if m.kind == MatchKind::Partial {
                    tracing::info!("using partial match '{}' for region query '{name}'", m.region.name);
                    self.warnings.push(Warning::PartialRegionMatch {
                        query: name.to_string(),
                        region: m.region.name,
                    });
                }
                Ok(Some(m.region.bbox))
            }
            None if self.options.unknown == UnknownPolicy::Reject => {
                Err(CompileError::UnknownRegion(name.to_string()))
            }
            None => {
                tracing::warn!("unknown region: {name}, no location filtering will be applied");
                self.warnings.push(Warning::UnknownRegion(name.to_string()));
                Ok(None)
            }
        }
    }

    // --- archive ---

    fn dataset_patterns(&self, archive_type: Option<&str>) -> Vec<Pattern> {
        let mut patterns = vec![
            Pattern::triple(Var::dataset(), vocab::RDF_TYPE, vocab::DATASET),
            Pattern::triple(Var::dataset(), vocab::HAS_NAME, Var::dataset_name()),
        ];
        if let Some(archive) = archive_type {
            patterns.push(Pattern::triple(
                Var::dataset(),
                vocab::HAS_ARCHIVE_TYPE,
                Iri::new(Namespace::Archive, archive),
            ));
        }
        patterns
    }

    // --- variables, interpretations, resolution ---

    /// `?dataset → paleoData → measurement table → variable`.
    fn table_variable(&mut self, variable_base: &'static str) -> Chain {
        let paleo_data = self.vars.fresh("paleoData");
        let table = self.vars.fresh("dataTable");
        let variable = self.vars.fresh(variable_base);
        Chain {
            patterns: vec![
                Pattern::triple(Var::dataset(), vocab::HAS_PALEO_DATA, &paleo_data),
                Pattern::triple(&paleo_data, vocab::HAS_MEASUREMENT_TABLE, &table),
                Pattern::triple(&table, vocab::HAS_VARIABLE, &variable),
            ],
            variable,
        }
    }

    fn variable_chain(&mut self, name: &str) -> Chain {
        let mut chain = self.table_variable("variable");
        chain.patterns.push(Pattern::triple(
            &chain.variable,
            vocab::HAS_STANDARD_VARIABLE,
            Iri::new(Namespace::Pvar, name),
        ));
        chain
    }

    fn interpretation_chain(&mut self, name: &str) -> Chain {
        let mut chain = self.table_variable("variable");
        let interpretation = self.vars.fresh("interpretation");
        chain.patterns.push(Pattern::triple(
            &chain.variable,
            vocab::HAS_INTERPRETATION,
            &interpretation,
        ));
        chain.patterns.push(Pattern::triple(
            &interpretation,
            vocab::HAS_VARIABLE,
            Iri::new(Namespace::Interp, name),
        ));
        chain
    }

    /// All chains of one route, with the resolution filter bound to the
    /// first chain's variable.
    fn route(
        &mut self,
        chains: Vec<Chain>,
        resolution: Option<&ResolutionClass>,
    ) -> Vec<Pattern> {
        let target = chains.first().map(|c| c.variable.clone());
        let mut patterns: Vec<Pattern> = chains.into_iter().flat_map(|c| c.patterns).collect();
        if let (Some(target), Some(class)) = (target, resolution) {
            patterns.extend(self.resolution_patterns(&target, class));
        }
        patterns
    }

    fn measurement_patterns(
        &mut self,
        variables: &[String],
        interpretations: &[String],
        resolution: Option<&ResolutionClass>,
    ) -> Vec<Pattern> {
        let var_chains: Vec<Chain> = variables.iter().map(|v| self.variable_chain(v)).collect();
        let interp_chains: Vec<Chain> = interpretations
            .iter()
            .map(|i| self.interpretation_chain(i))
            .collect();

        match (var_chains.is_empty(), interp_chains.is_empty()) {
            (false, false) => {
                let by_variable = self.route(var_chains, resolution);
                let by_interpretation = self.route(interp_chains, resolution);
                vec![Pattern::Union(vec![by_variable, by_interpretation])]
            }
            (false, true) => self.route(var_chains, resolution),
            (true, false) => self.route(interp_chains, resolution),
            (true, true) => match resolution {
                // Nothing named to attach to: filter on any measured variable.
                Some(class) => {
                    let chain = self.table_variable("variable");
                    self.route(vec![chain], Some(class))
                }
                None => Vec::new(),
            },
        }
    }

    fn resolution_patterns(&mut self, target: &Var, class: &ResolutionClass) -> Vec<Pattern> {
        let resolution = self.vars.fresh("resolution");
        let mut patterns = vec![Pattern::triple(target, vocab::HAS_RESOLUTION, &resolution)];

        match class {
            ResolutionClass::Annual | ResolutionClass::Decadal => {
                let cutoff = if *class == ResolutionClass::Annual {
                    ANNUAL_MAX_INTERVAL
                } else {
                    DECADAL_MAX_INTERVAL
                };
                let units = self.vars.fresh("resUnits");
                let max_value = self.vars.fresh("resMaxValue");

                let mut branches = vec![
                    vec![
                        Pattern::triple(&resolution, vocab::HAS_UNITS, &units),
                        Pattern::triple(&resolution, vocab::HAS_MAX_VALUE, &max_value),
                        Pattern::Filter(Expr::is_in(
                            Expr::var(&units),
                            vocab::YEAR_RESOLUTION_UNITS.map(Term::Iri),
                        )),
                        Pattern::Filter(Expr::le(Expr::var(&max_value), Expr::num(cutoff))),
                    ],
                    vec![
                        Pattern::triple(&resolution, vocab::HAS_UNITS, &units),
                        Pattern::Filter(Expr::is_in(
                            Expr::var(&units),
                            vocab::SUBANNUAL_RESOLUTION_UNITS.map(Term::Iri),
                        )),
                    ],
                ];
                if *class == ResolutionClass::Decadal {
                    // Unitless intervals are taken to be years.
                    let any_units = self.vars.fresh("anyUnits");
                    branches.push(vec![
                        Pattern::triple(&resolution, vocab::HAS_MAX_VALUE, &max_value),
                        Pattern::NotExists(vec![Pattern::triple(
                            &resolution,
                            vocab::HAS_UNITS,
                            &any_units,
                        )]),
                        Pattern::Filter(Expr::le(Expr::var(&max_value), Expr::num(cutoff))),
                    ]);
                }
                patterns.push(Pattern::Union(branches));
            }
            ResolutionClass::Labels(terms) => {
                let label = self.vars.fresh("resLabel");
                patterns.push(Pattern::triple(&resolution, vocab::RDFS_LABEL, &label));
                let tests = terms
                    .iter()
                    .map(|t| Expr::contains(Expr::lcase(Expr::var(&label)), Expr::str(t.clone())))
                    .collect();
                patterns.push(Pattern::Filter(Expr::any(tests)));
            }
        }
        patterns
    }

    // --- time ---

    fn time_patterns(&mut self, period: &TimePeriod, mode: OverlapMode) -> Vec<Pattern> {
        let Chain {
            mut patterns,
            variable: time_var,
        } = self.table_variable("timeVariable");

        let std_var = self.vars.fresh("stdVar");
        let label = self.vars.fresh("varLabel");
        patterns.push(Pattern::Union(vec![
            vec![
                Pattern::triple(&time_var, vocab::HAS_STANDARD_VARIABLE, &std_var),
                Pattern::Filter(Expr::is_in(
                    Expr::var(&std_var),
                    [Term::Iri(vocab::PVAR_AGE), Term::Iri(vocab::PVAR_YEAR)],
                )),
            ],
            vec![
                Pattern::triple(&time_var, vocab::RDFS_LABEL, &label),
                Pattern::Filter(Expr::regex(Expr::var(&label), TIME_LABEL_PATTERN, "i")),
            ],
        ]));

        let raw_min = self.vars.fresh("minTime");
        let raw_max = self.vars.fresh("maxTime");
        let units = self.vars.fresh("timeUnits");
        let min_bp = self.vars.fresh("minBp");
        let max_bp = self.vars.fresh("maxBp");

        let branches = UnitFamily::ALL
            .into_iter()
            .map(|family| {
                // Each branch binds its own values so the unit guard sees them.
                let mut branch = vec![
                    Pattern::triple(&time_var, vocab::HAS_MIN_VALUE, &raw_min),
                    Pattern::triple(&time_var, vocab::HAS_MAX_VALUE, &raw_max),
                    Pattern::triple(&time_var, vocab::HAS_UNITS, &units),
                    Pattern::Filter(Expr::is_in(Expr::var(&units), family.unit_terms())),
                ];
                let (lo, hi) = match family.bp_exprs(&Expr::var(&raw_min), &Expr::var(&raw_max)) {
                    Some((lo_expr, hi_expr)) => {
                        branch.push(Pattern::bind(lo_expr, &min_bp));
                        branch.push(Pattern::bind(hi_expr, &max_bp));
                        (Expr::var(&min_bp), Expr::var(&max_bp))
                    }
                    None => (Expr::var(&raw_min), Expr::var(&raw_max)),
                };
                branch.push(Pattern::Filter(mode.predicate(lo, hi, period.range)));
                branch
            })
            .collect();
        patterns.push(Pattern::Union(branches));

        tracing::debug!(period = period.name, %mode, "time filter compiled");
        patterns
    }

    // --- location ---

    fn location_patterns(&mut self, bbox: &BoundingBox) -> Vec<Pattern> {
        let location = self.vars.fresh("location");
        let lat = self.vars.fresh("lat");
        let lon = self.vars.fresh("lon");

        let lon_tests = vec![
            Expr::ge(Expr::var(&lon), Expr::num(bbox.min_lon)),
            Expr::le(Expr::var(&lon), Expr::num(bbox.max_lon)),
        ];
        let lon_filter = if bbox.crosses_antimeridian() {
            Expr::Or(lon_tests)
        } else {
            Expr::And(lon_tests)
        };

        vec![
            Pattern::triple(Var::dataset(), vocab::HAS_LOCATION, &location),
            Pattern::triple(&location, vocab::HAS_LATITUDE, &lat),
            Pattern::triple(&location, vocab::HAS_LONGITUDE, &lon),
            Pattern::Filter(Expr::And(vec![
                Expr::ge(Expr::var(&lat), Expr::num(bbox.min_lat)),
                Expr::le(Expr::var(&lat), Expr::num(bbox.max_lat)),
            ])),
            Pattern::Filter(lon_filter),
        ]
    }
}
