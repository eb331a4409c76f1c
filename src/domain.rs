use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::NamerError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GenomeId(String);

impl GenomeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenomeId {
    type Err = NamerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(NamerError::InvalidGenomeId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// Cluster identifier as written by the upstream clustering step.
///
/// Numeric ids sort numerically so that `2` comes before `10`; anything else
/// falls back to lexical order after all numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for ClusterId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClusterId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClusterId {
    type Err = NamerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(NamerError::InvalidClusterId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeRecord {
    pub genome: GenomeId,
    pub cluster: ClusterId,
    pub strain_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcbiRecord {
    pub genome: GenomeId,
    pub species: String,
}

/// A type-genome row before it has been placed in a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGenomeRow {
    pub genome: GenomeId,
    pub name: String,
    pub species: String,
}

impl TypeGenomeRow {
    pub fn new(genome: GenomeId, name: impl Into<String>) -> Self {
        let name = name.into();
        let species = binomial(&name);
        Self {
            genome,
            name,
            species,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeGenome {
    pub cluster: ClusterId,
    pub genome: GenomeId,
    pub strain_name: Option<String>,
    pub name: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination {
    pub cluster: ClusterId,
    pub species: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SixteenSHit {
    pub query: String,
    pub subject: String,
    pub identity: f64,
    pub length: u32,
    pub mismatches: u32,
    pub gap_opens: u32,
    pub query_start: u32,
    pub query_end: u32,
    pub subject_start: u32,
    pub subject_end: u32,
    pub evalue: f64,
    pub bit_score: f64,
}

pub const MIN_HIT_IDENTITY: f64 = 98.0;
pub const MIN_HIT_LENGTH: u32 = 100;

impl SixteenSHit {
    pub fn genome(&self) -> &str {
        genome_from_query(&self.query)
    }

    pub fn qualifies(&self) -> bool {
        self.identity >= MIN_HIT_IDENTITY && self.length >= MIN_HIT_LENGTH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SixteenSStatus {
    #[serde(rename = "no 16S sequences")]
    NoSequences,
    #[serde(rename = "16S sequences without hits")]
    WithoutHits,
    #[serde(rename = "16S sequences with hits")]
    WithHits,
}

impl SixteenSStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SixteenSStatus::NoSequences => "no 16S sequences",
            SixteenSStatus::WithoutHits => "16S sequences without hits",
            SixteenSStatus::WithHits => "16S sequences with hits",
        }
    }
}

impl fmt::Display for SixteenSStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Certainty {
    #[serde(rename = "type genome")]
    TypeGenome,
    #[serde(rename = "best guess")]
    BestGuess,
    #[serde(rename = "new species")]
    NewSpecies,
    #[serde(rename = "unidentified")]
    Unidentified,
}

impl Certainty {
    pub fn as_str(self) -> &'static str {
        match self {
            Certainty::TypeGenome => "type genome",
            Certainty::BestGuess => "best guess",
            Certainty::NewSpecies => "new species",
            Certainty::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for Certainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterName {
    pub cluster: ClusterId,
    pub species: String,
    pub certainty: Certainty,
}

/// First two whitespace-separated tokens of a taxonomic name.
pub fn binomial(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Genome part of a 16S sequence id such as `GCA_000000001.1:3`.
pub fn genome_from_query(query: &str) -> &str {
    query.split(':').next().unwrap_or(query).trim()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn binomial_takes_two_tokens() {
        assert_eq!(
            binomial("Lactobacillus delbrueckii subsp. bulgaricus"),
            "Lactobacillus delbrueckii"
        );
        assert_eq!(binomial("  Weissella   cibaria "), "Weissella cibaria");
        assert_eq!(binomial("Lactobacillus"), "Lactobacillus");
    }

    #[test]
    fn genome_from_query_strips_suffix() {
        assert_eq!(genome_from_query("GCA_000000001.1:3"), "GCA_000000001.1");
        assert_eq!(genome_from_query("GCA_000000001.1"), "GCA_000000001.1");
    }

    #[test]
    fn cluster_ids_sort_numerically() {
        let mut ids: Vec<ClusterId> = ["10", "2", "x1", "1"]
            .iter()
            .map(|value| value.parse().unwrap())
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(ClusterId::as_str).collect();
        assert_eq!(sorted, vec!["1", "2", "10", "x1"]);
    }

    #[test]
    fn parse_genome_id_invalid() {
        let err = "  ".parse::<GenomeId>().unwrap_err();
        assert_matches!(err, NamerError::InvalidGenomeId(_));
    }

    #[test]
    fn hit_qualification_thresholds() {
        let mut hit = SixteenSHit {
            query: "G1:1".to_string(),
            subject: "NR_1".to_string(),
            identity: 98.0,
            length: 100,
            mismatches: 0,
            gap_opens: 0,
            query_start: 1,
            query_end: 100,
            subject_start: 1,
            subject_end: 100,
            evalue: 0.0,
            bit_score: 180.0,
        };
        assert!(hit.qualifies());
        hit.length = 99;
        assert!(!hit.qualifies());
        hit.length = 1500;
        hit.identity = 97.9;
        assert!(!hit.qualifies());
    }
}
