use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use csv::Writer;
use regex::Regex;

use crate::domain::ClusterName;
use crate::error::{NamerError, Warning};
use crate::fs_util::write_atomic;
use crate::namer::{LIST_SEPARATOR, UnnamedCluster};
use crate::resolve::SplitMergerRow;

pub const SPLITS_AND_MERGERS_FILE: &str = "splits_and_mergers.csv";
pub const ZERO_TYPE_GENOMES_FILE: &str = "clusters_zerotypegenomes.csv";
pub const ALL_NAMED_FILE: &str = "clusters_all_named.csv";
pub const UNRESOLVED_FILE: &str = "unresolved_cases.csv";

/// Literal genus/epithet shortening. At every position the longest matching
/// pattern wins and replaced text is not scanned again.
#[derive(Debug, Clone)]
pub struct Abbreviator {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl Abbreviator {
    pub fn new(pairs: &[(String, String)]) -> Result<Self, NamerError> {
        let mut ordered: Vec<&(String, String)> =
            pairs.iter().filter(|(pattern, _)| !pattern.is_empty()).collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut replacements = HashMap::new();
        for (pattern, replacement) in &ordered {
            replacements
                .entry(pattern.clone())
                .or_insert_with(|| replacement.clone());
        }

        let pattern = if ordered.is_empty() {
            None
        } else {
            let alternation = ordered
                .iter()
                .map(|(pattern, _)| regex::escape(pattern))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&alternation)
                    .map_err(|err| NamerError::ConfigParse(format!("abbreviations: {err}")))?,
            )
        };

        Ok(Self {
            pattern,
            replacements,
        })
    }

    pub fn abbreviate(&self, text: &str) -> String {
        let normalized = normalize(text);
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(&normalized, |caps: &regex::Captures<'_>| {
                    self.replacements
                        .get(&caps[0])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            None => normalized,
        }
    }

    pub fn abbreviate_list(&self, values: &[String]) -> String {
        values
            .iter()
            .map(|value| self.abbreviate(value))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }
}

pub fn normalize(text: &str) -> String {
    text.replace('_', " ")
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub splits_and_mergers: Utf8PathBuf,
    pub zero_type_genomes: Utf8PathBuf,
    pub all_named: Utf8PathBuf,
    pub unresolved: Utf8PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self {
            splits_and_mergers: dir.join(SPLITS_AND_MERGERS_FILE),
            zero_type_genomes: dir.join(ZERO_TYPE_GENOMES_FILE),
            all_named: dir.join(ALL_NAMED_FILE),
            unresolved: dir.join(UNRESOLVED_FILE),
        }
    }
}

pub fn render_splits_and_mergers(
    rows: &[SplitMergerRow],
    abbreviator: &Abbreviator,
) -> Result<Vec<u8>, NamerError> {
    render(
        &["cluster", "merger_split", "names"],
        rows.iter().map(|row| {
            vec![
                row.cluster.to_string(),
                row.kind.to_string(),
                abbreviator.abbreviate_list(&row.names),
            ]
        }),
    )
}

pub fn render_zero_type_genomes(
    clusters: &[UnnamedCluster],
    abbreviator: &Abbreviator,
) -> Result<Vec<u8>, NamerError> {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(|value| abbreviator.abbreviate(value))
            .unwrap_or_default()
    };
    render(
        &["cluster", "species_ncbi", "n_16S", "sixteen_s_hits", "species"],
        clusters.iter().map(|cluster| {
            vec![
                cluster.cluster.to_string(),
                text(&cluster.species_ncbi),
                cluster.n_16s.to_string(),
                text(&cluster.sixteen_s_hits),
                abbreviator.abbreviate(&cluster.species),
            ]
        }),
    )
}

pub fn render_all_named(
    names: &[ClusterName],
    abbreviator: &Abbreviator,
) -> Result<Vec<u8>, NamerError> {
    render(
        &["cluster", "species", "species_short"],
        names.iter().map(|name| {
            vec![
                name.cluster.to_string(),
                normalize(&name.species),
                abbreviator.abbreviate(&name.species),
            ]
        }),
    )
}

pub fn render_unresolved(warnings: &[Warning]) -> Result<Vec<u8>, NamerError> {
    render(
        &["kind", "subject", "detail"],
        warnings.iter().map(|warning| {
            vec![
                warning.kind().to_string(),
                warning.subject(),
                warning.detail(),
            ]
        }),
    )
}

pub fn write_report(path: &Utf8Path, content: &[u8]) -> Result<(), NamerError> {
    write_atomic(path, content)?;
    tracing::info!("wrote {path}");
    Ok(())
}

fn render(
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<Vec<u8>, NamerError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(render_error)?;
    for row in rows {
        writer.write_record(&row).map_err(render_error)?;
    }
    writer
        .into_inner()
        .map_err(|err| NamerError::Filesystem(err.to_string()))
}

fn render_error(err: csv::Error) -> NamerError {
    NamerError::Filesystem(format!("csv serialization: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurationLoader;
    use crate::domain::Certainty;
    use crate::resolve::MergerSplit;

    fn builtin() -> Abbreviator {
        Abbreviator::new(&CurationLoader::builtin().unwrap().abbreviations).unwrap()
    }

    fn pair(pattern: &str, replacement: &str) -> (String, String) {
        (pattern.to_string(), replacement.to_string())
    }

    #[test]
    fn abbreviates_genus_and_epithet() {
        assert_eq!(
            builtin().abbreviate("Lactobacillus pseudomesenteroides"),
            "L. pseudomesent."
        );
        assert_eq!(
            builtin().abbreviate("Leuconostoc_mesenteroides"),
            "Leuc. mesent."
        );
    }

    #[test]
    fn longest_pattern_wins_regardless_of_input_order() {
        let abbreviator = Abbreviator::new(&[
            pair("mesenteroides", "SHORT"),
            pair("pseudomesenteroides", "LONG"),
        ])
        .unwrap();
        assert_eq!(abbreviator.abbreviate("x pseudomesenteroides"), "x LONG");
        assert_eq!(abbreviator.abbreviate("x mesenteroides"), "x SHORT");
    }

    #[test]
    fn replacements_are_not_rescanned() {
        let abbreviator =
            Abbreviator::new(&[pair("Lactobacillus", "L."), pair("L.", "Lacto")]).unwrap();
        assert_eq!(abbreviator.abbreviate("Lactobacillus casei"), "L. casei");
    }

    #[test]
    fn empty_table_only_normalizes() {
        let abbreviator = Abbreviator::new(&[]).unwrap();
        assert_eq!(abbreviator.abbreviate("New_species 1"), "New species 1");
    }

    #[test]
    fn all_named_csv_layout() {
        let names = vec![ClusterName {
            cluster: "10".parse().unwrap(),
            species: "Lactobacillus casei".to_string(),
            certainty: Certainty::TypeGenome,
        }];
        let bytes = render_all_named(&names, &builtin()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "cluster,species,species_short\n10,Lactobacillus casei,L. casei\n"
        );
    }

    #[test]
    fn joined_names_are_quoted() {
        let rows = vec![SplitMergerRow {
            cluster: "10".parse().unwrap(),
            kind: MergerSplit::Merger,
            names: vec![
                "Lactobacillus casei".to_string(),
                "Lactobacillus zeae".to_string(),
            ],
        }];
        let bytes = render_splits_and_mergers(&rows, &builtin()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "cluster,merger_split,names\n10,merger,\"L. casei, L. zeae\"\n"
        );
    }
}
