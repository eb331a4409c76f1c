use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::{Curation, CurationLoader};
use crate::domain::{Certainty, ClusterName, Combination};
use crate::error::{NamerError, Warning};
use crate::fs_util::ensure_dir;
use crate::namer::{NamerInput, UnnamedCluster, name_unnamed_clusters};
use crate::reconcile::{
    BadLinks, attach_clusters, distinct_combinations, manual_type_genome_rows,
    merge_type_genome_sources, remove_known_bad_associations, resolve_multi_name_genomes,
};
use crate::report::{
    Abbreviator, ReportPaths, render_all_named, render_splits_and_mergers, render_unresolved,
    render_zero_type_genomes, write_report,
};
use crate::resolve::{
    Merger, Split, SplitMergerRow, apply_precedence_rule, detect_mergers, detect_splits,
    finalize_type_genome_naming, splits_and_mergers_rows,
};
use crate::tables::InputTables;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress to the `tracing` subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "{}",
                event.message
            ),
            None => tracing::info!("{}", event.message),
        }
    }
}

/// Every intermediate and final table of one reconciliation.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub combinations: Vec<Combination>,
    pub mergers: Vec<Merger>,
    pub splits: Vec<Split>,
    pub split_merger_rows: Vec<SplitMergerRow>,
    pub resolved_combinations: Vec<Combination>,
    pub named_by_type_genome: Vec<ClusterName>,
    pub unnamed: Vec<UnnamedCluster>,
    pub all_named: Vec<ClusterName>,
    pub warnings: Vec<Warning>,
}

/// Runs the reconciliation stages on tables already in memory.
pub fn reconcile(
    tables: &InputTables,
    curation: &Curation,
    sink: &dyn ProgressSink,
) -> Result<Reconciliation, NamerError> {
    let started = Instant::now();
    let automatic = attach_clusters(&tables.type_genomes, &tables.genomes);
    let manual = attach_clusters(
        &manual_type_genome_rows(&curation.manual_type_genomes)?,
        &tables.genomes,
    );
    let combined = merge_type_genome_sources(automatic, manual);
    let cleaned = remove_known_bad_associations(combined, &BadLinks::from_curation(curation));
    let multi_name = resolve_multi_name_genomes(cleaned, &curation.superseded_names);
    let combinations = distinct_combinations(&multi_name.rows);
    sink.event(ProgressEvent {
        message: format!(
            "phase=Reconcile; {} type genomes, {} combinations",
            multi_name.rows.len(),
            combinations.len()
        ),
        elapsed: Some(started.elapsed()),
    });

    let mergers = detect_mergers(&combinations);
    let splits = detect_splits(&combinations);
    let split_merger_rows = splits_and_mergers_rows(&mergers, &splits);
    let precedence = apply_precedence_rule(&combinations, &curation.species_to_drop);
    let naming =
        finalize_type_genome_naming(&precedence.combinations, &curation.subspecies_promotions);
    sink.event(ProgressEvent {
        message: format!(
            "phase=Resolve; {} mergers, {} splits, {} clusters named by type genome",
            mergers.len(),
            splits.len(),
            naming.names.len()
        ),
        elapsed: Some(started.elapsed()),
    });

    let unnamed = name_unnamed_clusters(&NamerInput {
        genomes: &tables.genomes,
        ncbi: &tables.ncbi,
        hits: &tables.hits,
        genes: &tables.genes,
        named: &naming.names,
        species_to_drop: &curation.species_to_drop,
    });
    sink.event(ProgressEvent {
        message: format!("phase=Name; {} clusters without type genome", unnamed.len()),
        elapsed: Some(started.elapsed()),
    });

    let mut all_named: Vec<ClusterName> = naming
        .names
        .iter()
        .cloned()
        .chain(unnamed.iter().map(UnnamedCluster::to_cluster_name))
        .collect();
    all_named.sort_by(|a, b| a.cluster.cmp(&b.cluster));

    let mut warnings: Vec<Warning> = multi_name
        .warnings
        .into_iter()
        .chain(precedence.warnings)
        .chain(naming.warnings)
        .collect();
    warnings.sort();
    warnings.dedup();

    Ok(Reconciliation {
        combinations,
        mergers,
        splits,
        split_merger_rows,
        resolved_combinations: precedence.combinations,
        named_by_type_genome: naming.names,
        unnamed,
        all_named,
        warnings,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub input_dir: String,
    pub output_dir: String,
    pub curation: String,
    pub genomes: usize,
    pub clusters: usize,
    pub combinations: usize,
    pub mergers: usize,
    pub splits: usize,
    pub certainty: BTreeMap<Certainty, usize>,
    pub outputs: Vec<String>,
    pub unnamed: Vec<UnnamedCluster>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct App {
    input_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
}

impl App {
    pub fn new(input_dir: Utf8PathBuf, output_dir: Utf8PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
        }
    }

    pub fn run(&self, sink: &dyn ProgressSink) -> Result<RunResult, NamerError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Load; reading inputs from {}", self.input_dir),
            elapsed: None,
        });
        let resolved = CurationLoader::resolve(&self.input_dir)?;
        let abbreviator = Abbreviator::new(&resolved.curation.abbreviations)?;
        let tables = InputTables::load(&self.input_dir)?;

        let reconciliation = reconcile(&tables, &resolved.curation, sink)?;

        ensure_dir(&self.output_dir)?;
        let paths = ReportPaths::in_dir(&self.output_dir);
        let outputs = [
            (
                &paths.splits_and_mergers,
                render_splits_and_mergers(&reconciliation.split_merger_rows, &abbreviator)?,
            ),
            (
                &paths.zero_type_genomes,
                render_zero_type_genomes(&reconciliation.unnamed, &abbreviator)?,
            ),
            (
                &paths.all_named,
                render_all_named(&reconciliation.all_named, &abbreviator)?,
            ),
            (
                &paths.unresolved,
                render_unresolved(&reconciliation.warnings)?,
            ),
        ];
        for (path, content) in &outputs {
            write_report(path, content)?;
        }
        sink.event(ProgressEvent {
            message: format!("phase=Write; {} tables in {}", outputs.len(), self.output_dir),
            elapsed: Some(started.elapsed()),
        });

        let mut certainty = BTreeMap::new();
        for name in &reconciliation.all_named {
            *certainty.entry(name.certainty).or_insert(0) += 1;
        }

        Ok(RunResult {
            input_dir: self.input_dir.to_string(),
            output_dir: self.output_dir.to_string(),
            curation: resolved
                .source
                .map(|path| path.to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            genomes: tables.genomes.len(),
            clusters: reconciliation.all_named.len(),
            combinations: reconciliation.combinations.len(),
            mergers: reconciliation.mergers.len(),
            splits: reconciliation.splits.len(),
            certainty,
            outputs: outputs.iter().map(|(path, _)| path.to_string()).collect(),
            unnamed: reconciliation.unnamed,
            warnings: reconciliation.warnings,
        })
    }
}
