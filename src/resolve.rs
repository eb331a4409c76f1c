use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::config::Promotion;
use crate::domain::{Certainty, ClusterId, ClusterName, Combination, binomial};
use crate::error::Warning;

/// Label used for a cluster whose species could not be reduced to one.
pub const UNRESOLVED_SEPARATOR: &str = " / ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merger {
    pub cluster: ClusterId,
    pub species: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub species: String,
    /// Each involved cluster with the names of `species` found in it.
    pub clusters: Vec<(ClusterId, Vec<String>)>,
}

pub fn detect_mergers(combinations: &[Combination]) -> Vec<Merger> {
    species_by_cluster(combinations)
        .into_iter()
        .filter(|(_, species)| species.len() > 1)
        .map(|(cluster, species)| Merger {
            cluster,
            species: species.into_iter().collect(),
        })
        .collect()
}

pub fn detect_splits(combinations: &[Combination]) -> Vec<Split> {
    let mut by_species = BTreeMap::<&str, BTreeMap<&ClusterId, BTreeSet<&str>>>::new();
    for combination in combinations {
        by_species
            .entry(combination.species.as_str())
            .or_default()
            .entry(&combination.cluster)
            .or_default()
            .insert(combination.name.as_str());
    }

    by_species
        .into_iter()
        .filter(|(_, clusters)| clusters.len() > 1)
        .map(|(species, clusters)| Split {
            species: species.to_string(),
            clusters: clusters
                .into_iter()
                .map(|(cluster, names)| {
                    (
                        cluster.clone(),
                        names.into_iter().map(str::to_string).collect(),
                    )
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Precedence {
    pub combinations: Vec<Combination>,
    pub warnings: Vec<Warning>,
}

/// Removes junior synonyms listed in `species_to_drop`. Mergers the list does
/// not fully resolve are reported, never rejected.
pub fn apply_precedence_rule(combinations: &[Combination], species_to_drop: &[String]) -> Precedence {
    let drop: HashSet<&str> = species_to_drop.iter().map(String::as_str).collect();
    let kept: Vec<Combination> = combinations
        .iter()
        .filter(|combination| !drop.contains(combination.species.as_str()))
        .cloned()
        .collect();
    tracing::debug!(
        removed = combinations.len() - kept.len(),
        "combinations removed by species drop-list"
    );

    let remaining = species_by_cluster(&kept);
    let warnings = detect_mergers(combinations)
        .into_iter()
        .filter_map(|merger| {
            let species = remaining.get(&merger.cluster)?;
            (species.len() > 1).then(|| Warning::UnresolvedMerger {
                cluster: merger.cluster,
                species: species.iter().cloned().collect(),
            })
        })
        .inspect(|warning| tracing::warn!("{warning}"))
        .collect();

    Precedence {
        combinations: kept,
        warnings,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeGenomeNaming {
    pub names: Vec<ClusterName>,
    pub warnings: Vec<Warning>,
}

/// Applies subspecies promotions and projects to one species per cluster.
pub fn finalize_type_genome_naming(
    resolved: &[Combination],
    promotions: &[Promotion],
) -> TypeGenomeNaming {
    let renames: HashMap<&str, &str> = promotions
        .iter()
        .map(|promotion| (promotion.from.as_str(), promotion.to.as_str()))
        .collect();

    let promoted: Vec<Combination> = resolved
        .iter()
        .map(|combination| match renames.get(combination.name.as_str()) {
            Some(new_name) => Combination {
                cluster: combination.cluster.clone(),
                species: binomial(new_name),
                name: new_name.to_string(),
            },
            None => combination.clone(),
        })
        .collect();

    let before = species_by_cluster(resolved);
    let mut names = Vec::new();
    let mut warnings = Vec::new();
    for (cluster, species) in species_by_cluster(&promoted) {
        let was_single = before.get(&cluster).is_none_or(|species| species.len() <= 1);
        if species.len() > 1 && was_single {
            let warning = Warning::UnresolvedMerger {
                cluster: cluster.clone(),
                species: species.iter().cloned().collect(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
        names.push(ClusterName {
            cluster,
            species: species.into_iter().collect::<Vec<_>>().join(UNRESOLVED_SEPARATOR),
            certainty: Certainty::TypeGenome,
        });
    }

    TypeGenomeNaming { names, warnings }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergerSplit {
    Merger,
    Split,
}

impl fmt::Display for MergerSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergerSplit::Merger => write!(f, "merger"),
            MergerSplit::Split => write!(f, "split"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitMergerRow {
    pub cluster: ClusterId,
    pub kind: MergerSplit,
    pub names: Vec<String>,
}

pub fn splits_and_mergers_rows(mergers: &[Merger], splits: &[Split]) -> Vec<SplitMergerRow> {
    let mut rows: Vec<SplitMergerRow> = mergers
        .iter()
        .map(|merger| SplitMergerRow {
            cluster: merger.cluster.clone(),
            kind: MergerSplit::Merger,
            names: merger.species.clone(),
        })
        .chain(splits.iter().flat_map(|split| {
            split.clusters.iter().map(|(cluster, names)| SplitMergerRow {
                cluster: cluster.clone(),
                kind: MergerSplit::Split,
                names: names.clone(),
            })
        }))
        .collect();
    rows.sort();
    rows
}

fn species_by_cluster(combinations: &[Combination]) -> BTreeMap<ClusterId, BTreeSet<String>> {
    let mut map = BTreeMap::<ClusterId, BTreeSet<String>>::new();
    for combination in combinations {
        map.entry(combination.cluster.clone())
            .or_default()
            .insert(combination.species.clone());
    }
    map
}
