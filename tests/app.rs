use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use kira_cluster_namer::app::App;
use kira_cluster_namer::error::NamerError;
use kira_cluster_namer::output::JsonOutput;
use kira_cluster_namer::report::{
    ALL_NAMED_FILE, SPLITS_AND_MERGERS_FILE, UNRESOLVED_FILE, ZERO_TYPE_GENOMES_FILE,
};
use kira_cluster_namer::tables::{SIXTEEN_S_HITS_FILE, TYPE_GENOMES_FILE};

const CURATION: &str = r#"{
  "schema_version": 1,
  "species_to_drop": ["Lactobacillus zeae"],
  "abbreviations": [["Lactobacillus", "L."]]
}"#;

fn write(dir: &Utf8Path, name: &str, content: &str) {
    fs::write(dir.join(name).as_std_path(), content).unwrap();
}

fn fixture(dir: &Utf8Path, curation: Option<&str>) {
    write(
        dir,
        "genomes_clusters.csv",
        "genome,cluster,strain_name\n\
         G1,10,ATCC 393\n\
         G2,10,DSM 20178\n\
         G3,10,\n\
         P1,20,\n\
         U1,30,\n\
         N1,40,\n",
    );
    write(
        dir,
        "genomes_ncbi.csv",
        "genome,species,assembly_level\n\
         G1,Lactobacillus casei,Complete\n\
         G2,Lactobacillus zeae,Scaffold\n\
         G3,Lactobacillus sp. X,Contig\n\
         P1,Lactobacillus plantarum,Contig\n\
         N1,Lactobacillales bacterium N1 strain,Contig\n",
    );
    write(
        dir,
        "type_genomes.csv",
        "genome,name,species\n\
         G1,Lactobacillus casei,Lactobacillus casei\n\
         G2,Lactobacillus zeae,Lactobacillus zeae\n",
    );
    write(
        dir,
        "16S_hits.tsv",
        "P1:1\tNR_X\t99.2\t1500\t12\t0\t1\t1500\t1\t1500\t0.0\t2700\n\
         N1:1\tNR_Y\t95.0\t1500\t75\t0\t1\t1500\t1\t1500\t0.0\t2200\n",
    );
    write(dir, "16S_genes.txt", "P1\nP1\nP1\nP1\nP1\nN1\n");
    if let Some(curation) = curation {
        write(dir, "curation.json", curation);
    }
}

fn temp_dirs() -> (tempfile::TempDir, Utf8PathBuf, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let input = root.join("input");
    let output = root.join("output");
    fs::create_dir_all(input.as_std_path()).unwrap();
    (temp, input, output)
}

fn read(dir: &Utf8Path, name: &str) -> String {
    fs::read_to_string(dir.join(name).as_std_path()).unwrap()
}

#[test]
fn names_every_cluster() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some(CURATION));

    let result = App::new(input.clone(), output.clone())
        .run(&JsonOutput)
        .unwrap();

    assert_eq!(result.clusters, 4);
    assert_eq!(result.mergers, 1);
    assert!(result.warnings.is_empty());
    assert!(result.curation.ends_with("curation.json"));
    assert_eq!(result.unnamed.len(), 3);
    assert_eq!(
        result.unnamed[0].species_ncbi_all.as_deref(),
        Some("Lactobacillus plantarum")
    );

    assert_eq!(
        read(&output, ALL_NAMED_FILE),
        "cluster,species,species_short\n\
         10,Lactobacillus casei,L. casei\n\
         20,Lactobacillus plantarum (?),L. plantarum (?)\n\
         30,Unidentified species 1,Unidentified species 1\n\
         40,New species 1,New species 1\n"
    );
    assert_eq!(
        read(&output, SPLITS_AND_MERGERS_FILE),
        "cluster,merger_split,names\n10,merger,\"L. casei, L. zeae\"\n"
    );
    assert_eq!(
        read(&output, ZERO_TYPE_GENOMES_FILE),
        "cluster,species_ncbi,n_16S,sixteen_s_hits,species\n\
         20,L. plantarum,5,NR X,L. plantarum (?)\n\
         30,,0,,Unidentified species 1\n\
         40,,1,,New species 1\n"
    );
    assert_eq!(read(&output, UNRESOLVED_FILE), "kind,subject,detail\n");
}

#[test]
fn rerun_is_byte_identical() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some(CURATION));
    let app = App::new(input, output.clone());

    app.run(&JsonOutput).unwrap();
    let first: Vec<String> = [ALL_NAMED_FILE, SPLITS_AND_MERGERS_FILE, ZERO_TYPE_GENOMES_FILE]
        .iter()
        .map(|name| read(&output, name))
        .collect();

    app.run(&JsonOutput).unwrap();
    let second: Vec<String> = [ALL_NAMED_FILE, SPLITS_AND_MERGERS_FILE, ZERO_TYPE_GENOMES_FILE]
        .iter()
        .map(|name| read(&output, name))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn builtin_curation_is_used_without_file() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, None);

    let result = App::new(input, output.clone()).run(&JsonOutput).unwrap();

    assert_eq!(result.curation, "built-in");
    assert!(read(&output, ALL_NAMED_FILE).contains("10,Lactobacillus casei,L. casei\n"));
}

#[test]
fn unresolved_merger_is_reported() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some(r#"{"species_to_drop": []}"#));

    let result = App::new(input, output.clone()).run(&JsonOutput).unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        read(&output, UNRESOLVED_FILE),
        "kind,subject,detail\n\
         unresolved_merger,10,\"Lactobacillus casei, Lactobacillus zeae\"\n"
    );
    assert!(read(&output, ALL_NAMED_FILE).contains(
        "10,Lactobacillus casei / Lactobacillus zeae,Lactobacillus casei / Lactobacillus zeae\n"
    ));
}

#[test]
fn missing_table_fails() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some(CURATION));
    fs::remove_file(input.join(TYPE_GENOMES_FILE).as_std_path()).unwrap();

    let err = App::new(input, output).run(&JsonOutput).unwrap_err();
    assert_matches!(err, NamerError::MissingInput(path) if path.ends_with(TYPE_GENOMES_FILE));
}

#[test]
fn short_hit_row_is_schema_error() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some(CURATION));
    write(
        &input,
        SIXTEEN_S_HITS_FILE,
        "P1:1\tNR_X\t99.2\t1500\t12\t0\t1\t1500\t1\t1500\t0.0\n",
    );

    let err = App::new(input, output.clone()).run(&JsonOutput).unwrap_err();
    assert_matches!(err, NamerError::Schema { .. });
    assert!(!output.join(ALL_NAMED_FILE).as_std_path().exists());
}

#[test]
fn malformed_curation_fails() {
    let (_temp, input, output) = temp_dirs();
    fixture(&input, Some("{ not json"));

    let err = App::new(input, output).run(&JsonOutput).unwrap_err();
    assert_matches!(err, NamerError::ConfigParse(_));
}
