//! Dataset search: probe the store, compile, execute, extract names.
//!
//! Transport lives behind `SparqlExecutor`; this crate never does I/O itself.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compile::{self, CompileOptions, CompiledQuery};
use crate::constants::DATASET_NAME_VAR;
use crate::error::CompileError;
use crate::params::FilterParams;

/// A SPARQL endpoint that answers SELECT queries.
pub trait SparqlExecutor {
    type Error: fmt::Display;

    /// Cheap liveness check, issued before any real query.
    fn ping(&self) -> Result<(), Self::Error>;

    fn select(&self, query: &str) -> Result<SelectResults, Self::Error>;
}

impl<E: SparqlExecutor + ?Sized> SparqlExecutor for &E {
    type Error = E::Error;

    fn ping(&self) -> Result<(), Self::Error> {
        (**self).ping()
    }

    fn select(&self, query: &str) -> Result<SelectResults, Self::Error> {
        (**self).select(query)
    }
}

// ---------------------------------------------------------------------------
// SPARQL 1.1 query results, JSON format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub head: ResultsHead,
    pub results: ResultsBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsBody {
    pub bindings: Vec<HashMap<String, RdfTerm>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdfTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl SelectResults {
    /// Values of `var` in row order. `None` if any row lacks the binding.
    pub fn column(&self, var: &str) -> Option<Vec<String>> {
        self.results
            .bindings
            .iter()
            .map(|row| row.get(var).map(|t| t.value.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub struct DatasetSearch<E> {
    executor: E,
    options: CompileOptions,
}

impl<E: SparqlExecutor> DatasetSearch<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Names of datasets matching every filter in `params`.
    ///
    /// An unreachable store, a failed query or a malformed response all
    /// yield an empty list; they are logged, not returned. Only a
    /// compilation failure under `UnknownPolicy::Reject` is an error.
    pub fn run(&self, params: &FilterParams) -> Result<Vec<String>, CompileError> {
        if let Err(e) = self.executor.ping() {
            tracing::error!("graph store unreachable: {e}");
            return Ok(Vec::new());
        }

        let compiled = compile::compile(params, &self.options)?;
        Ok(self.execute(&compiled))
    }

    /// Run an already compiled query.
    pub fn execute(&self, compiled: &CompiledQuery) -> Vec<String> {
        let text = compiled.render();
        tracing::debug!("executing query:\n{text}");

        let results = match self.executor.select(&text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("query failed: {e}");
                return Vec::new();
            }
        };

        match results.column(DATASET_NAME_VAR) {
            Some(names) => {
                tracing::info!("found {} datasets", names.len());
                names
            }
            None => {
                tracing::error!("response rows missing '{DATASET_NAME_VAR}' binding");
                Vec::new()
            }
        }
    }
}
