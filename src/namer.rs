use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::{
    Certainty, ClusterId, ClusterName, GenomeId, GenomeRecord, NcbiRecord, SixteenSHit,
    SixteenSStatus,
};
use crate::resolve::UNRESOLVED_SEPARATOR;

pub const LIST_SEPARATOR: &str = ", ";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+ sp\.(\s|$)| bacterium ").expect("placeholder regex"));

/// NCBI labels that do not identify a species, e.g. `Lactobacillus sp. A1`,
/// `uncultured Lactobacillus sp.` or `Firmicutes bacterium CAG:56`.
pub fn is_placeholder(label: &str) -> bool {
    PLACEHOLDER.is_match(label)
}

/// A cluster without type genome, labelled from NCBI and 16S evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnnamedCluster {
    pub cluster: ClusterId,
    pub species_ncbi_all: Option<String>,
    pub species_ncbi: Option<String>,
    pub n_16s: usize,
    pub sixteen_s_hits: Option<String>,
    pub status: SixteenSStatus,
    pub certainty: Certainty,
    pub species: String,
}

impl UnnamedCluster {
    pub fn to_cluster_name(&self) -> ClusterName {
        ClusterName {
            cluster: self.cluster.clone(),
            species: self.species.clone(),
            certainty: self.certainty,
        }
    }
}

pub struct NamerInput<'a> {
    pub genomes: &'a [GenomeRecord],
    pub ncbi: &'a [NcbiRecord],
    pub hits: &'a [SixteenSHit],
    pub genes: &'a [GenomeId],
    pub named: &'a [ClusterName],
    /// Junior synonyms that must not come back through NCBI labels.
    pub species_to_drop: &'a [String],
}

/// Clusters of the genome table that the type-genome track left unnamed.
pub fn unnamed_clusters(genomes: &[GenomeRecord], named: &[ClusterName]) -> Vec<ClusterId> {
    let named: HashSet<&ClusterId> = named.iter().map(|name| &name.cluster).collect();
    genomes
        .iter()
        .map(|record| &record.cluster)
        .filter(|cluster| !named.contains(cluster))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn name_unnamed_clusters(input: &NamerInput<'_>) -> Vec<UnnamedCluster> {
    let cluster_of: HashMap<&str, &ClusterId> = input
        .genomes
        .iter()
        .map(|record| (record.genome.as_str(), &record.cluster))
        .collect();

    let claimed: HashSet<&str> = input
        .named
        .iter()
        .flat_map(|name| name.species.split(UNRESOLVED_SEPARATOR))
        .chain(input.species_to_drop.iter().map(String::as_str))
        .collect();

    let mut ncbi_labels = BTreeMap::<&ClusterId, BTreeSet<&str>>::new();
    for record in input.ncbi {
        let Some(cluster) = cluster_of.get(record.genome.as_str()) else {
            continue;
        };
        if is_placeholder(&record.species) {
            continue;
        }
        ncbi_labels
            .entry(*cluster)
            .or_default()
            .insert(record.species.as_str());
    }

    let mut hit_subjects = BTreeMap::<&ClusterId, BTreeSet<&str>>::new();
    for hit in input.hits.iter().filter(|hit| hit.qualifies()) {
        if let Some(cluster) = cluster_of.get(hit.genome()) {
            hit_subjects
                .entry(*cluster)
                .or_default()
                .insert(hit.subject.as_str());
        }
    }

    let mut gene_counts = HashMap::<&ClusterId, usize>::new();
    for genome in input.genes {
        if let Some(cluster) = cluster_of.get(genome.as_str()) {
            *gene_counts.entry(*cluster).or_default() += 1;
        }
    }

    let mut new_species = 0usize;
    let mut unidentified = 0usize;
    unnamed_clusters(input.genomes, input.named)
        .into_iter()
        .map(|cluster| {
            let labels = ncbi_labels.get(&cluster);
            let species_ncbi_all = labels.and_then(|labels| join(labels.iter().copied()));
            let species_ncbi = labels.and_then(|labels| {
                join(labels.iter().copied().filter(|label| !claimed.contains(label)))
            });
            let sixteen_s_hits = hit_subjects
                .get(&cluster)
                .and_then(|subjects| join(subjects.iter().copied()));
            let n_16s = gene_counts.get(&cluster).copied().unwrap_or(0);

            let status = if n_16s == 0 {
                SixteenSStatus::NoSequences
            } else if sixteen_s_hits.is_none() {
                SixteenSStatus::WithoutHits
            } else {
                SixteenSStatus::WithHits
            };

            let (certainty, species) = match (&species_ncbi, status) {
                (Some(species), SixteenSStatus::WithHits) => {
                    (Certainty::BestGuess, format!("{species} (?)"))
                }
                (_, SixteenSStatus::WithoutHits) => {
                    new_species += 1;
                    (Certainty::NewSpecies, format!("New species {new_species}"))
                }
                _ => {
                    unidentified += 1;
                    (
                        Certainty::Unidentified,
                        format!("Unidentified species {unidentified}"),
                    )
                }
            };

            UnnamedCluster {
                cluster,
                species_ncbi_all,
                species_ncbi,
                n_16s,
                sixteen_s_hits,
                status,
                certainty,
                species,
            }
        })
        .collect()
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = values.collect::<Vec<_>>().join(LIST_SEPARATOR);
    (!joined.is_empty()).then_some(joined)
}
