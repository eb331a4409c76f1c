use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::{Curation, ManualTypeGenome, SupersededName};
use crate::domain::{Combination, GenomeId, GenomeRecord, TypeGenome, TypeGenomeRow};
use crate::error::{NamerError, Warning};

/// Places type-genome rows in their clusters. Rows for genomes that are
/// absent from the genome table are dropped.
pub fn attach_clusters(rows: &[TypeGenomeRow], genomes: &[GenomeRecord]) -> Vec<TypeGenome> {
    let index: HashMap<&GenomeId, &GenomeRecord> =
        genomes.iter().map(|record| (&record.genome, record)).collect();

    let attached: Vec<TypeGenome> = rows
        .iter()
        .filter_map(|row| {
            let record = index.get(&row.genome)?;
            Some(TypeGenome {
                cluster: record.cluster.clone(),
                genome: row.genome.clone(),
                strain_name: record.strain_name.clone(),
                name: row.name.clone(),
                species: row.species.clone(),
            })
        })
        .collect();

    let dropped = rows.len() - attached.len();
    if dropped > 0 {
        tracing::debug!(dropped, "type genomes without a cluster assignment");
    }
    attached
}

pub fn manual_type_genome_rows(
    entries: &[ManualTypeGenome],
) -> Result<Vec<TypeGenomeRow>, NamerError> {
    entries
        .iter()
        .map(|entry| Ok(TypeGenomeRow::new(entry.genome.parse()?, entry.name.trim())))
        .collect()
}

pub fn merge_type_genome_sources(
    automatic: Vec<TypeGenome>,
    manual: Vec<TypeGenome>,
) -> Vec<TypeGenome> {
    let mut combined = automatic;
    combined.extend(manual);
    combined
}

/// Literal genome-to-name links that curation has shown to be wrong.
#[derive(Debug, Default, Clone)]
pub struct BadLinks {
    strain_species: HashSet<(String, String)>,
    genome_species: HashSet<(String, String)>,
    genome_name: HashSet<(String, String)>,
}

impl BadLinks {
    pub fn from_curation(curation: &Curation) -> Self {
        Self {
            strain_species: curation
                .bad_strain_species
                .iter()
                .map(|link| (link.strain_name.clone(), link.species.clone()))
                .collect(),
            genome_species: curation
                .bad_genome_species
                .iter()
                .map(|link| (link.genome.clone(), link.species.clone()))
                .collect(),
            genome_name: curation
                .bad_genome_name
                .iter()
                .map(|link| (link.genome.clone(), link.name.clone()))
                .collect(),
        }
    }

    fn matches(&self, row: &TypeGenome) -> bool {
        let genome = row.genome.as_str().to_string();
        let by_strain = row.strain_name.as_ref().is_some_and(|strain| {
            self.strain_species
                .contains(&(strain.clone(), row.species.clone()))
        });
        by_strain
            || self
                .genome_species
                .contains(&(genome.clone(), row.species.clone()))
            || self.genome_name.contains(&(genome, row.name.clone()))
    }
}

pub fn remove_known_bad_associations(combined: Vec<TypeGenome>, bad: &BadLinks) -> Vec<TypeGenome> {
    let before = combined.len();
    let cleaned: Vec<TypeGenome> = combined.into_iter().filter(|row| !bad.matches(row)).collect();
    tracing::debug!(removed = before - cleaned.len(), "known bad type-genome links");
    cleaned
}

#[derive(Debug, Clone, Default)]
pub struct MultiNameResolution {
    pub rows: Vec<TypeGenome>,
    pub warnings: Vec<Warning>,
}

/// Drops superseded names from genomes linked to several names. Genomes that
/// remain ambiguous keep all their rows and are reported.
pub fn resolve_multi_name_genomes(
    cleaned: Vec<TypeGenome>,
    superseded: &[SupersededName],
) -> MultiNameResolution {
    let mut names_by_genome = BTreeMap::<GenomeId, BTreeSet<String>>::new();
    for row in &cleaned {
        names_by_genome
            .entry(row.genome.clone())
            .or_default()
            .insert(row.name.clone());
    }

    let mut dropped = HashSet::<(GenomeId, String)>::new();
    let mut warnings = Vec::new();
    for (genome, names) in names_by_genome.into_iter().filter(|(_, names)| names.len() > 1) {
        let mut remaining = names.clone();
        for rule in superseded {
            if names.contains(&rule.name) && names.contains(&rule.superseded_by) {
                remaining.remove(&rule.name);
                dropped.insert((genome.clone(), rule.name.clone()));
            }
        }
        if remaining.len() > 1 {
            let warning = Warning::UnresolvedMultiNameGenome {
                genome,
                names: remaining.into_iter().collect(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
    }

    let rows = cleaned
        .into_iter()
        .filter(|row| !dropped.contains(&(row.genome.clone(), row.name.clone())))
        .collect();

    MultiNameResolution { rows, warnings }
}

pub fn distinct_combinations(resolved: &[TypeGenome]) -> Vec<Combination> {
    resolved
        .iter()
        .map(|row| Combination {
            cluster: row.cluster.clone(),
            species: row.species.clone(),
            name: row.name.clone(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
