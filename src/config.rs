use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::NamerError;

pub const CURATION_FILE: &str = "curation.json";

const BUILTIN_CURATION: &str = include_str!("curation.json");

/// Hand-curated corrections applied on top of the automatic tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Curation {
    #[serde(default)]
    pub schema_version: Option<u32>,
    /// Junior synonyms; the senior name of each merger stays.
    #[serde(default)]
    pub species_to_drop: Vec<String>,
    #[serde(default)]
    pub bad_strain_species: Vec<StrainSpeciesLink>,
    #[serde(default)]
    pub bad_genome_species: Vec<GenomeSpeciesLink>,
    #[serde(default)]
    pub bad_genome_name: Vec<GenomeNameLink>,
    #[serde(default)]
    pub manual_type_genomes: Vec<ManualTypeGenome>,
    #[serde(default)]
    pub superseded_names: Vec<SupersededName>,
    #[serde(default)]
    pub subspecies_promotions: Vec<Promotion>,
    #[serde(default)]
    pub abbreviations: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct StrainSpeciesLink {
    pub strain_name: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GenomeSpeciesLink {
    pub genome: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GenomeNameLink {
    pub genome: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManualTypeGenome {
    pub name: String,
    pub genome: String,
    #[serde(default)]
    pub why_manual: Option<String>,
}

/// When a genome carries both names, `name` is dropped in favour of
/// `superseded_by`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SupersededName {
    pub name: String,
    pub superseded_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Promotion {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedCuration {
    pub curation: Curation,
    /// `None` when the built-in table is in use.
    pub source: Option<Utf8PathBuf>,
}

pub struct CurationLoader;

impl CurationLoader {
    /// Loads `curation.json` from the input directory, or the built-in table
    /// when the directory has none.
    pub fn resolve(input_dir: &Utf8Path) -> Result<ResolvedCuration, NamerError> {
        let path = input_dir.join(CURATION_FILE);
        if !path.as_std_path().exists() {
            tracing::info!("no {CURATION_FILE} in {input_dir}; using built-in curation");
            return Ok(ResolvedCuration {
                curation: Self::builtin()?,
                source: None,
            });
        }

        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| NamerError::ConfigRead(path.clone().into_std_path_buf()))?;
        tracing::info!("using curation from {path}");
        Ok(ResolvedCuration {
            curation: Self::parse(&content)?,
            source: Some(path),
        })
    }

    pub fn builtin() -> Result<Curation, NamerError> {
        Self::parse(BUILTIN_CURATION)
    }

    pub fn parse(content: &str) -> Result<Curation, NamerError> {
        let curation: Curation =
            serde_json::from_str(content).map_err(|err| NamerError::ConfigParse(err.to_string()))?;
        if let Some(version) = curation.schema_version
            && version != 1
        {
            return Err(NamerError::ConfigParse(format!(
                "unsupported schema_version {version}"
            )));
        }
        Ok(curation)
    }
}
