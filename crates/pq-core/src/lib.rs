//! Paleoclimate dataset filter compiler.
//!
//! Turns a small record of named filters (archive type, variables,
//! interpretations, resolution, time period, region) into a SPARQL SELECT
//! over the LinkedEarth ontology. Named periods and regions resolve through
//! built-in registries; dataset time spans are normalized onto the BP scale
//! inside the query so that records stored in any unit compare correctly.
//!
//! Zero I/O: the graph store is reached through `SparqlExecutor`.

pub mod ast;
pub mod compile;
pub mod constants;
pub mod error;
pub mod overlap;
pub mod params;
pub mod periods;
pub mod regions;
pub mod render;
pub mod search;
pub mod units;
pub mod vocab;

pub use ast::{Expr, Pattern, SelectQuery, Term, Var, VarGen};
pub use compile::{
    CompileOptions, CompiledQuery, FilterCompiler, ResolutionClass, UnknownPolicy, Warning,
    compile,
};
pub use error::{CompileError, ParamsError};
pub use overlap::OverlapMode;
pub use params::FilterParams;
pub use periods::TimePeriod;
pub use regions::{BoundingBox, MatchKind, Region, RegionMatch};
pub use render::render;
pub use search::{DatasetSearch, SelectResults, SparqlExecutor};
pub use units::{BpRange, UnitFamily, normalize};
