use std::fmt;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{ClusterId, GenomeId};

#[derive(Debug, Error, Diagnostic)]
pub enum NamerError {
    #[error("required input not found: {0}")]
    #[diagnostic(help("the input directory must contain all five input tables"))]
    MissingInput(Utf8PathBuf),

    #[error("schema mismatch in {path}: {message}")]
    Schema { path: Utf8PathBuf, message: String },

    #[error("failed to read table {path}: {message}")]
    Csv { path: Utf8PathBuf, message: String },

    #[error("invalid genome id: {0:?}")]
    InvalidGenomeId(String),

    #[error("invalid cluster id: {0:?}")]
    InvalidClusterId(String),

    #[error("failed to read curation file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse curation JSON: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

/// Non-fatal conditions that need a curator's attention.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnresolvedMerger {
        cluster: ClusterId,
        species: Vec<String>,
    },
    UnresolvedMultiNameGenome {
        genome: GenomeId,
        names: Vec<String>,
    },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::UnresolvedMerger { .. } => "unresolved_merger",
            Warning::UnresolvedMultiNameGenome { .. } => "unresolved_multi_name_genome",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Warning::UnresolvedMerger { cluster, .. } => cluster.to_string(),
            Warning::UnresolvedMultiNameGenome { genome, .. } => genome.to_string(),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Warning::UnresolvedMerger { species, .. } => species.join(", "),
            Warning::UnresolvedMultiNameGenome { names, .. } => names.join(", "),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedMerger { cluster, species } => write!(
                f,
                "cluster {cluster} still holds several species: {}",
                species.join(", ")
            ),
            Warning::UnresolvedMultiNameGenome { genome, names } => write!(
                f,
                "genome {genome} is linked to several names: {}",
                names.join(", ")
            ),
        }
    }
}
