use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    ClusterId, GenomeId, GenomeRecord, NcbiRecord, SixteenSHit, TypeGenomeRow, binomial,
    genome_from_query,
};
use crate::error::NamerError;

pub const GENOMES_CLUSTERS_FILE: &str = "genomes_clusters.csv";
pub const GENOMES_NCBI_FILE: &str = "genomes_ncbi.csv";
pub const TYPE_GENOMES_FILE: &str = "type_genomes.csv";
pub const SIXTEEN_S_HITS_FILE: &str = "16S_hits.tsv";
pub const SIXTEEN_S_GENES_FILE: &str = "16S_genes.txt";

pub const SIXTEEN_S_HIT_FIELDS: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub genomes: Vec<GenomeRecord>,
    pub ncbi: Vec<NcbiRecord>,
    pub type_genomes: Vec<TypeGenomeRow>,
    pub hits: Vec<SixteenSHit>,
    /// One entry per extracted 16S gene.
    pub genes: Vec<GenomeId>,
}

#[derive(Debug, Deserialize)]
struct GenomeClusterRow {
    genome: String,
    cluster: String,
    #[serde(default)]
    strain_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NcbiRow {
    genome: String,
    #[serde(default)]
    species: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeGenomeCsvRow {
    genome: String,
    name: String,
    #[serde(default)]
    species: Option<String>,
}

impl InputTables {
    pub fn load(dir: &Utf8Path) -> Result<Self, NamerError> {
        let genomes = load_genomes(&dir.join(GENOMES_CLUSTERS_FILE))?;
        let ncbi = load_ncbi(&dir.join(GENOMES_NCBI_FILE))?;
        let type_genomes = load_type_genomes(&dir.join(TYPE_GENOMES_FILE))?;
        let hits = load_hits(&dir.join(SIXTEEN_S_HITS_FILE))?;
        let genes = load_genes(&dir.join(SIXTEEN_S_GENES_FILE))?;
        tracing::info!(
            genomes = genomes.len(),
            ncbi = ncbi.len(),
            type_genomes = type_genomes.len(),
            hits = hits.len(),
            genes = genes.len(),
            "loaded input tables from {dir}"
        );
        Ok(Self {
            genomes,
            ncbi,
            type_genomes,
            hits,
            genes,
        })
    }
}

pub fn load_genomes(path: &Utf8Path) -> Result<Vec<GenomeRecord>, NamerError> {
    let rows: Vec<GenomeClusterRow> = read_table(path, &["genome", "cluster"])?;
    let mut seen = HashMap::<GenomeId, ClusterId>::new();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let genome: GenomeId = row.genome.parse()?;
        let cluster: ClusterId = row.cluster.parse()?;
        match seen.get(&genome) {
            Some(existing) if *existing != cluster => {
                return Err(NamerError::Schema {
                    path: path.to_path_buf(),
                    message: format!("genome {genome} assigned to clusters {existing} and {cluster}"),
                });
            }
            Some(_) => continue,
            None => {
                seen.insert(genome.clone(), cluster.clone());
            }
        }
        records.push(GenomeRecord {
            genome,
            cluster,
            strain_name: non_empty(row.strain_name),
        });
    }
    Ok(records)
}

pub fn load_ncbi(path: &Utf8Path) -> Result<Vec<NcbiRecord>, NamerError> {
    let rows: Vec<NcbiRow> = read_table(path, &["genome", "species"])?;
    rows.into_iter()
        .filter_map(|row| {
            let species = non_empty(row.species)?;
            Some(row.genome.parse().map(|genome| NcbiRecord { genome, species }))
        })
        .collect()
}

pub fn load_type_genomes(path: &Utf8Path) -> Result<Vec<TypeGenomeRow>, NamerError> {
    let rows: Vec<TypeGenomeCsvRow> = read_table(path, &["genome", "name"])?;
    rows.into_iter()
        .map(|row| {
            let genome: GenomeId = row.genome.parse()?;
            let name = row.name.trim().to_string();
            let species = non_empty(row.species).unwrap_or_else(|| binomial(&name));
            Ok(TypeGenomeRow {
                genome,
                name,
                species,
            })
        })
        .collect()
}

pub fn load_hits(path: &Utf8Path) -> Result<Vec<SixteenSHit>, NamerError> {
    require_file(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .trim(Trim::All)
        .from_path(path.as_std_path())
        .map_err(|err| csv_error(path, err))?;

    let mut hits = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_error(path, err))?;
        let line = index + 1;
        if record.len() != SIXTEEN_S_HIT_FIELDS {
            return Err(NamerError::Schema {
                path: path.to_path_buf(),
                message: format!(
                    "line {line}: expected {SIXTEEN_S_HIT_FIELDS} columns, found {}",
                    record.len()
                ),
            });
        }
        hits.push(parse_hit(path, line, &record)?);
    }
    Ok(hits)
}

fn parse_hit(path: &Utf8Path, line: usize, record: &StringRecord) -> Result<SixteenSHit, NamerError> {
    fn field<T: std::str::FromStr>(
        path: &Utf8Path,
        line: usize,
        record: &StringRecord,
        index: usize,
        column: &str,
    ) -> Result<T, NamerError> {
        let raw = record.get(index).unwrap_or_default();
        raw.parse().map_err(|_| NamerError::Schema {
            path: path.to_path_buf(),
            message: format!("line {line}: invalid {column} value {raw:?}"),
        })
    }

    Ok(SixteenSHit {
        query: record.get(0).unwrap_or_default().to_string(),
        subject: record.get(1).unwrap_or_default().to_string(),
        identity: field(path, line, record, 2, "pident")?,
        length: field(path, line, record, 3, "length")?,
        mismatches: field(path, line, record, 4, "mismatch")?,
        gap_opens: field(path, line, record, 5, "gapopen")?,
        query_start: field(path, line, record, 6, "qstart")?,
        query_end: field(path, line, record, 7, "qend")?,
        subject_start: field(path, line, record, 8, "sstart")?,
        subject_end: field(path, line, record, 9, "send")?,
        evalue: field(path, line, record, 10, "evalue")?,
        bit_score: field(path, line, record, 11, "bitscore")?,
    })
}

pub fn load_genes(path: &Utf8Path) -> Result<Vec<GenomeId>, NamerError> {
    require_file(path)?;
    let content = fs::read_to_string(path.as_std_path()).map_err(|err| NamerError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    content
        .lines()
        .map(genome_from_query)
        .filter(|line| !line.is_empty())
        .map(str::parse::<GenomeId>)
        .collect()
}

fn read_table<T: DeserializeOwned>(
    path: &Utf8Path,
    required: &[&str],
) -> Result<Vec<T>, NamerError> {
    require_file(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path.as_std_path())
        .map_err(|err| csv_error(path, err))?;

    let headers = reader.headers().map_err(|err| csv_error(path, err))?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        return Err(NamerError::Schema {
            path: path.to_path_buf(),
            message: format!("missing column(s): {}", missing.join(", ")),
        });
    }

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|err| {
                let line = err.position().map(|pos| pos.line()).unwrap_or_default();
                NamerError::Schema {
                    path: path.to_path_buf(),
                    message: format!("line {line}: {err}"),
                }
            })
        })
        .collect()
}

fn require_file(path: &Utf8Path) -> Result<(), NamerError> {
    if path.as_std_path().is_file() {
        Ok(())
    } else {
        Err(NamerError::MissingInput(path.to_path_buf()))
    }
}

fn csv_error(path: &Utf8Path, err: csv::Error) -> NamerError {
    NamerError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
