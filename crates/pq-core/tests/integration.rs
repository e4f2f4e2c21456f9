//! Integration tests exercising the full pipeline:
//! parameters → compile → query tree → evaluation against a small in-memory
//! graph shaped like the LinkedEarth store.

use std::collections::BTreeSet;

use pq_core::ast::{Bindings, Value};
use pq_core::vocab::{self, Iri, Namespace};
use pq_core::{
    CompileOptions, FilterParams, OverlapMode, Pattern, SelectQuery, Term, UnitFamily, compile,
    render,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Tiny graph + bottom-up group evaluation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Graph {
    triples: Vec<(Value, Iri, Value)>,
    next: u32,
}

struct Resolution {
    units: Option<&'static str>,
    max: Option<f64>,
    label: Option<&'static str>,
}

struct Measured {
    standard: &'static str,
    interpretation: Option<&'static str>,
    resolution: Option<Resolution>,
}

struct TimeAxis {
    standard: Option<&'static str>,
    label: Option<&'static str>,
    units: &'static str,
    min: f64,
    max: f64,
}

struct Dataset {
    name: &'static str,
    archive: &'static str,
    variables: Vec<Measured>,
    time: Option<TimeAxis>,
    location: Option<(f64, f64)>,
}

impl Graph {
    fn node(&mut self) -> Value {
        self.next += 1;
        Value::Iri(Iri::new(Namespace::Le, format!("node{}", self.next)))
    }

    fn add(&mut self, s: &Value, p: Iri, o: Value) {
        self.triples.push((s.clone(), p, o));
    }

    fn add_dataset(&mut self, d: Dataset) {
        let ds = self.node();
        self.add(&ds, vocab::RDF_TYPE, Value::Iri(vocab::DATASET));
        self.add(&ds, vocab::HAS_NAME, Value::Str(d.name.into()));
        self.add(
            &ds,
            vocab::HAS_ARCHIVE_TYPE,
            Value::Iri(Iri::new(Namespace::Archive, d.archive)),
        );

        let pd = self.node();
        let dt = self.node();
        self.add(&ds, vocab::HAS_PALEO_DATA, pd.clone());
        self.add(&pd, vocab::HAS_MEASUREMENT_TABLE, dt.clone());

        for m in d.variables {
            let v = self.node();
            self.add(&dt, vocab::HAS_VARIABLE, v.clone());
            self.add(
                &v,
                vocab::HAS_STANDARD_VARIABLE,
                Value::Iri(Iri::new(Namespace::Pvar, m.standard)),
            );
            if let Some(interp) = m.interpretation {
                let i = self.node();
                self.add(&v, vocab::HAS_INTERPRETATION, i.clone());
                self.add(
                    &i,
                    vocab::HAS_VARIABLE,
                    Value::Iri(Iri::new(Namespace::Interp, interp)),
                );
            }
            if let Some(res) = m.resolution {
                let r = self.node();
                self.add(&v, vocab::HAS_RESOLUTION, r.clone());
                if let Some(u) = res.units {
                    self.add(&r, vocab::HAS_UNITS, Value::Iri(Iri::new(Namespace::Punits, u)));
                }
                if let Some(max) = res.max {
                    self.add(&r, vocab::HAS_MAX_VALUE, Value::Num(max));
                }
                if let Some(label) = res.label {
                    self.add(&r, vocab::RDFS_LABEL, Value::Str(label.into()));
                }
            }
        }

        if let Some(t) = d.time {
            let tv = self.node();
            self.add(&dt, vocab::HAS_VARIABLE, tv.clone());
            if let Some(std) = t.standard {
                self.add(
                    &tv,
                    vocab::HAS_STANDARD_VARIABLE,
                    Value::Iri(Iri::new(Namespace::Pvar, std)),
                );
            }
            if let Some(label) = t.label {
                self.add(&tv, vocab::RDFS_LABEL, Value::Str(label.into()));
            }
            self.add(
                &tv,
                vocab::HAS_UNITS,
                Value::Iri(Iri::new(Namespace::Punits, t.units)),
            );
            self.add(&tv, vocab::HAS_MIN_VALUE, Value::Num(t.min));
            self.add(&tv, vocab::HAS_MAX_VALUE, Value::Num(t.max));
        }

        if let Some((lat, lon)) = d.location {
            let loc = self.node();
            self.add(&ds, vocab::HAS_LOCATION, loc.clone());
            self.add(&loc, vocab::HAS_LATITUDE, Value::Num(lat));
            self.add(&loc, vocab::HAS_LONGITUDE, Value::Num(lon));
        }
    }

    fn unify(sol: &mut Bindings, t: &Term, v: &Value) -> bool {
        match t {
            Term::Var(var) => match sol.get(var) {
                Some(bound) => bound == v,
                None => {
                    sol.insert(var.clone(), v.clone());
                    true
                }
            },
            Term::Iri(i) => *v == Value::Iri(i.clone()),
            Term::Number(n) => *v == Value::Num(*n),
            Term::Str(s) => *v == Value::Str(s.clone()),
        }
    }

    fn match_triple(&self, sol: &Bindings, s: &Term, p: &Iri, o: &Term) -> Vec<Bindings> {
        self.triples
            .iter()
            .filter(|(_, tp, _)| tp == p)
            .filter_map(|(ts, _, to)| {
                let mut next = sol.clone();
                (Self::unify(&mut next, s, ts) && Self::unify(&mut next, o, to)).then_some(next)
            })
            .collect()
    }

    fn group(&self, patterns: &[Pattern]) -> Vec<Bindings> {
        let mut sols = vec![Bindings::new()];
        let mut deferred = Vec::new();
        for p in patterns {
            match p {
                Pattern::Triple { s, p, o } => {
                    sols = sols
                        .iter()
                        .flat_map(|sol| self.match_triple(sol, s, p, o))
                        .collect();
                }
                Pattern::Union(branches) => {
                    let alternatives: Vec<Bindings> =
                        branches.iter().flat_map(|b| self.group(b)).collect();
                    sols = join(&sols, &alternatives);
                }
                Pattern::Bind { expr, var } => {
                    for sol in &mut sols {
                        if let Some(v) = expr.evaluate(sol) {
                            sol.insert(var.clone(), v);
                        }
                    }
                }
                Pattern::Filter(_) | Pattern::NotExists(_) => deferred.push(p),
            }
        }
        // Filters scope over the whole group.
        sols.retain(|sol| {
            deferred.iter().all(|f| match f {
                Pattern::Filter(e) => e.evaluate_bool(sol) == Some(true),
                Pattern::NotExists(inner) => self
                    .group(inner)
                    .iter()
                    .all(|r| merge(sol, r).is_none()),
                _ => true,
            })
        });
        sols
    }

    fn select(&self, query: &SelectQuery) -> BTreeSet<String> {
        self.group(&query.patterns)
            .into_iter()
            .filter_map(|sol| match sol.get(&query.projection) {
                Some(Value::Str(s)) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

fn merge(a: &Bindings, b: &Bindings) -> Option<Bindings> {
    let mut out = a.clone();
    for (k, v) in b {
        match out.get(k) {
            Some(existing) if existing != v => return None,
            Some(_) => {}
            None => {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    Some(out)
}

fn join(left: &[Bindings], right: &[Bindings]) -> Vec<Bindings> {
    left.iter()
        .flat_map(|l| right.iter().filter_map(move |r| merge(l, r)))
        .collect()
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

fn fixture() -> Graph {
    let mut g = Graph::default();

    // Central Pacific coral, calendar years.
    g.add_dataset(Dataset {
        name: "Palmyra.Cobb.2003",
        archive: "Coral",
        variables: vec![Measured {
            standard: "d18O",
            interpretation: Some("temperature"),
            resolution: Some(Resolution {
                units: Some("yr"),
                max: Some(1.0),
                label: None,
            }),
        }],
        time: Some(TimeAxis {
            standard: Some("year"),
            label: Some("year"),
            units: "yr_AD",
            min: 928.0,
            max: 1998.0,
        }),
        location: Some((5.9, -162.1)),
    });

    // Coral just west of the date line, monthly Sr/Ca.
    g.add_dataset(Dataset {
        name: "Fiji.Linsley.2006",
        archive: "Coral",
        variables: vec![Measured {
            standard: "Sr/Ca",
            interpretation: None,
            resolution: Some(Resolution {
                units: Some("month"),
                max: Some(1.0),
                label: None,
            }),
        }],
        time: Some(TimeAxis {
            standard: Some("year"),
            label: None,
            units: "yr_CE",
            min: 1780.0,
            max: 2000.0,
        }),
        location: Some((-16.8, 179.9)),
    });

    // Long ice core in ka.
    g.add_dataset(Dataset {
        name: "GISP2.Grootes.1997",
        archive: "GlacierIce",
        variables: vec![Measured {
            standard: "d18O",
            interpretation: Some("temperature"),
            resolution: Some(Resolution {
                units: Some("yr_BP"),
                max: Some(5.0),
                label: None,
            }),
        }],
        time: Some(TimeAxis {
            standard: Some("age"),
            label: None,
            units: "ka",
            min: 0.0,
            max: 110.0,
        }),
        location: Some((72.6, -38.5)),
    });

    // Lake record spanning the deglaciation, resolution only labelled.
    g.add_dataset(Dataset {
        name: "Yoa.Kropelin.2008",
        archive: "LakeSediment",
        variables: vec![Measured {
            standard: "pollen",
            interpretation: Some("precipitation"),
            resolution: Some(Resolution {
                units: None,
                max: None,
                label: Some("Centennial"),
            }),
        }],
        time: Some(TimeAxis {
            standard: Some("age"),
            label: None,
            units: "yr_BP",
            min: 5000.0,
            max: 20000.0,
        }),
        location: Some((20.0, 10.0)),
    });

    // Holocene-only lake, time axis recognised by label alone, b2k.
    g.add_dataset(Dataset {
        name: "Tanganyika.Tierney.2008",
        archive: "LakeSediment",
        variables: vec![Measured {
            standard: "TEX86",
            interpretation: Some("temperature"),
            resolution: Some(Resolution {
                units: None,
                max: Some(8.0),
                label: None,
            }),
        }],
        time: Some(TimeAxis {
            standard: None,
            label: Some("Age (yr b2k)"),
            units: "yr_b2k",
            min: 550.0,
            max: 9050.0,
        }),
        location: Some((-6.0, 29.5)),
    });

    g
}

/// Marine core whose age axis uses a unit no conversion exists for.
fn with_uncalibrated_core(mut g: Graph) -> Graph {
    g.add_dataset(Dataset {
        name: "Cariaco.Lea.2003",
        archive: "MarineSediment",
        variables: vec![Measured {
            standard: "Mg/Ca",
            interpretation: Some("temperature"),
            resolution: None,
        }],
        time: Some(TimeAxis {
            standard: Some("age"),
            label: None,
            units: "cal_yr",
            min: 0.0,
            max: 25000.0,
        }),
        location: Some((10.7, -65.2)),
    });
    g
}

fn search_in(graph: &Graph, params: FilterParams) -> Vec<String> {
    let compiled = compile(&params, &CompileOptions::default()).unwrap();
    graph.select(&compiled.query).into_iter().collect()
}

fn search(params: FilterParams) -> Vec<String> {
    search_in(&fixture(), params)
}

fn names(list: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = list.iter().map(|s| s.to_string()).collect();
    v.sort();
    v
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

/// No filters: every dataset with a name.
#[test]
fn no_filters_match_everything() {
    assert_eq!(search(FilterParams::default()).len(), 5);
}

/// The canonical request: annual Holocene coral d18O from the Pacific.
#[test]
fn coral_d18o_annual_holocene_pacific() {
    let found = search(FilterParams {
        archive_type: Some("Coral".into()),
        variables: vec!["d18O".into()],
        resolution: Some("annual".into()),
        time_period: Some("Holocene".into()),
        location: Some("Pacific Ocean".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Palmyra.Cobb.2003"]));
}

/// Pacific box crosses 180°: both sides of the date line are inside.
#[test]
fn pacific_includes_both_sides_of_date_line() {
    let found = search(FilterParams {
        location: Some("pacific".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Fiji.Linsley.2006", "Palmyra.Cobb.2003"]));
}

#[test]
fn region_without_crossing() {
    let found = search(FilterParams {
        location: Some("Africa".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Tanganyika.Tierney.2008", "Yoa.Kropelin.2008"]));
}

/// Every unit family lands on the BP scale before comparison.
#[test]
fn overlap_modes_against_holocene() {
    let with_mode = |mode: OverlapMode| {
        search(FilterParams {
            time_period: Some("Holocene".into()),
            time_overlap: Some(mode.to_string()),
            ..Default::default()
        })
    };
    assert_eq!(with_mode(OverlapMode::Partial).len(), 5);
    assert_eq!(
        with_mode(OverlapMode::Contained),
        names(&["Tanganyika.Tierney.2008"])
    );
    assert_eq!(
        with_mode(OverlapMode::Containing),
        names(&["GISP2.Grootes.1997"])
    );
}

#[test]
fn glacial_maximum_partial_and_containing() {
    let partial = search(FilterParams {
        time_period: Some("Last Glacial Maximum".into()),
        ..Default::default()
    });
    assert_eq!(partial, names(&["GISP2.Grootes.1997", "Yoa.Kropelin.2008"]));

    let containing = search(FilterParams {
        time_period: Some("LastGlacialMaximum".into()),
        time_overlap: Some("containing".into()),
        ..Default::default()
    });
    assert_eq!(containing, names(&["GISP2.Grootes.1997"]));
}

/// Variables and interpretations are alternative routes, not a conjunction.
#[test]
fn variable_or_interpretation() {
    let found = search(FilterParams {
        variables: vec!["Sr/Ca".into()],
        interpretations: vec!["precipitation".into()],
        ..Default::default()
    });
    assert_eq!(found, names(&["Fiji.Linsley.2006", "Yoa.Kropelin.2008"]));
}

#[test]
fn interpretation_alone() {
    let found = search(FilterParams {
        interpretations: vec!["temperature".into()],
        archive_type: Some("LakeSediment".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Tanganyika.Tierney.2008"]));
}

/// Sub-annual units count as annual.
#[test]
fn monthly_counts_as_annual() {
    let found = search(FilterParams {
        variables: vec!["Sr/Ca".into()],
        resolution: Some("annual".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Fiji.Linsley.2006"]));
}

/// Unitless intervals count for decadal only.
#[test]
fn decadal_accepts_unitless_interval() {
    let decadal = search(FilterParams {
        resolution: Some("decadal".into()),
        ..Default::default()
    });
    assert_eq!(
        decadal,
        names(&[
            "Fiji.Linsley.2006",
            "GISP2.Grootes.1997",
            "Palmyra.Cobb.2003",
            "Tanganyika.Tierney.2008",
        ])
    );

    let annual = search(FilterParams {
        resolution: Some("annual".into()),
        ..Default::default()
    });
    assert_eq!(annual, names(&["Fiji.Linsley.2006", "Palmyra.Cobb.2003"]));
}

#[test]
fn resolution_label_match() {
    let found = search(FilterParams {
        resolution: Some("centennial|millennial".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Yoa.Kropelin.2008"]));
}

/// Unknown names drop their filter instead of emptying the result.
#[test]
fn unknown_names_are_ignored() {
    let found = search(FilterParams {
        archive_type: Some("Coral".into()),
        time_period: Some("Jurassic Park".into()),
        location: Some("Atlantis".into()),
        ..Default::default()
    });
    assert_eq!(found, names(&["Fiji.Linsley.2006", "Palmyra.Cobb.2003"]));
}

/// A time axis in an unrecognised unit never satisfies a time filter,
/// while datasets in known units are unaffected.
#[test]
fn unknown_time_unit_fails_time_filter_only() {
    let graph = with_uncalibrated_core(fixture());

    let holocene = search_in(
        &graph,
        FilterParams {
            time_period: Some("Holocene".into()),
            ..Default::default()
        },
    );
    assert_eq!(
        holocene,
        names(&[
            "Fiji.Linsley.2006",
            "GISP2.Grootes.1997",
            "Palmyra.Cobb.2003",
            "Tanganyika.Tierney.2008",
            "Yoa.Kropelin.2008",
        ])
    );

    let untimed = search_in(
        &graph,
        FilterParams {
            archive_type: Some("MarineSediment".into()),
            ..Default::default()
        },
    );
    assert_eq!(untimed, names(&["Cariaco.Lea.2003"]));
    assert_eq!(search_in(&graph, FilterParams::default()).len(), 6);
}

#[test]
fn unmatched_archive_is_empty() {
    assert!(
        search(FilterParams {
            archive_type: Some("Speleothem".into()),
            ..Default::default()
        })
        .is_empty()
    );
}

/// The text form carries every piece of the tree.
#[test]
fn rendered_text_shape() {
    let compiled = compile(
        &FilterParams {
            archive_type: Some("Coral".into()),
            variables: vec!["d18O".into(), "Sr/Ca".into()],
            resolution: Some("annual".into()),
            time_period: Some("Holocene".into()),
            location: Some("Pacific Ocean".into()),
            ..Default::default()
        },
        &CompileOptions::default(),
    )
    .unwrap();
    let text = compiled.render();
    assert!(text.contains("PREFIX le: <http://linked.earth/ontology#>"));
    assert!(text.contains("PREFIX punits: <http://linked.earth/ontology/paleo_units#>"));
    assert!(!text.contains("PREFIX cvar:"));
    assert!(text.contains("SELECT DISTINCT ?datasetName WHERE {"));
    assert!(text.contains("archive:Coral"));
    assert!(text.contains("pvar:d18O"));
    assert!(text.contains("<http://linked.earth/ontology/paleo_variables#Sr/Ca>"));
    assert!(text.contains("REGEX("));
    assert!(text.contains("BIND(1950 - "));
    assert!(text.contains(" || "));
    assert_eq!(text.matches('{').count(), text.matches('}').count());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9/ _.-]{0,12}"
}

fn arb_params() -> impl Strategy<Value = FilterParams> {
    (
        proptest::option::of(arb_name()),
        proptest::collection::vec(arb_name(), 0..3),
        proptest::collection::vec(arb_name(), 0..3),
        proptest::option::of(prop_oneof![
            Just("annual".to_string()),
            Just("decadal".to_string()),
            arb_name(),
        ]),
        proptest::option::of(prop_oneof![
            Just("Holocene".to_string()),
            Just("YoungerDryas".to_string()),
            arb_name(),
        ]),
        proptest::option::of(prop_oneof![
            Just("partial".to_string()),
            Just("contained".to_string()),
            arb_name(),
        ]),
        proptest::option::of(prop_oneof![
            Just("North Pacific".to_string()),
            Just("Europe".to_string()),
            arb_name(),
        ]),
    )
        .prop_map(|(a, v, i, r, t, o, l)| FilterParams {
            archive_type: a,
            variables: v,
            interpretations: i,
            resolution: r,
            time_period: t,
            time_overlap: o,
            location: l,
        })
}

proptest! {
    /// Identical input renders identical text.
    #[test]
    fn compilation_is_deterministic(params in arb_params()) {
        let options = CompileOptions::default();
        let a = render(&compile(&params, &options).unwrap().query);
        let b = render(&compile(&params, &options).unwrap().query);
        prop_assert_eq!(a, b);
    }

    /// Lenient compilation never fails and always projects the name column.
    #[test]
    fn lenient_always_compiles(params in arb_params()) {
        let compiled = compile(&params, &CompileOptions::default()).unwrap();
        let text = compiled.render();
        prop_assert!(text.contains("SELECT DISTINCT ?datasetName WHERE {"), "{}", text);
        prop_assert_eq!(text.matches('{').count(), text.matches('}').count());
    }

    /// Normalized ranges stay ordered whatever the unit.
    #[test]
    fn normalized_range_is_ordered(
        a in -1.0e6f64..1.0e6,
        span in 0.0f64..1.0e6,
        family_idx in 0usize..4,
    ) {
        let family = UnitFamily::ALL[family_idx];
        let r = family.normalize(a, a + span);
        prop_assert!(r.min <= r.max);
    }

    /// Symbolic `partial` overlap agrees with the numeric one.
    #[test]
    fn overlap_predicate_matches_numeric(
        dmin in -5.0e4f64..2.0e5,
        dspan in 0.0f64..1.0e5,
        mode_idx in 0usize..3,
    ) {
        use pq_core::ast::{Expr, VarGen};
        use pq_core::units::BpRange;

        let mode = OverlapMode::ALL[mode_idx];
        let period = BpRange::new(11_700.0, 12_900.0);
        let dataset = BpRange::new(dmin, dmin + dspan);

        let mut g = VarGen::new();
        let lo = g.fresh("minBp");
        let hi = g.fresh("maxBp");
        let mut env = Bindings::new();
        env.insert(lo.clone(), Value::Num(dataset.min));
        env.insert(hi.clone(), Value::Num(dataset.max));

        let symbolic = mode
            .predicate(Expr::var(&lo), Expr::var(&hi), period)
            .evaluate_bool(&env);
        prop_assert_eq!(symbolic, Some(mode.holds(dataset, period)));
    }
}
