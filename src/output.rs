use std::io::{self, Write};

use crate::app::{ProgressEvent, ProgressSink, RunResult};

/// Machine-readable run summary on stdout. Progress stays silent so stdout
/// carries only the summary document.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::write_run(&mut io::stdout().lock(), result)
    }

    pub fn write_run<W: Write>(writer: &mut W, result: &RunResult) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, result).map_err(io::Error::other)?;
        writer.write_all(b"\n")
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::Certainty;

    #[test]
    fn summary_lists_unnamed_evidence() {
        let result = RunResult {
            input_dir: "in".to_string(),
            output_dir: "out".to_string(),
            curation: "built-in".to_string(),
            genomes: 1,
            clusters: 1,
            combinations: 0,
            mergers: 0,
            splits: 0,
            certainty: BTreeMap::from([(Certainty::NewSpecies, 1)]),
            outputs: Vec::new(),
            unnamed: Vec::new(),
            warnings: Vec::new(),
        };
        let mut buffer = Vec::new();
        JsonOutput::write_run(&mut buffer, &result).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["certainty"]["new species"], 1);
        assert_eq!(json["unnamed"], serde_json::json!([]));
        assert!(buffer.ends_with(b"}\n"));
    }
}
