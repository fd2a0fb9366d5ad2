use anyhow::{anyhow, Context};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::ScreeningResult;

/// Name the export is saved under.
pub const EXPORT_FILE_NAME: &str = "candidate_evaluation_results.csv";

const HEADERS: [&str; 6] = [
    "File Name",
    "Score",
    "Pass/Fail",
    "Justification",
    "Cited Evidence",
    "Competency Scores",
];

const LIST_SEPARATOR: &str = "; ";

/// Serialize results into the export format: every field quoted, `"` doubled,
/// rows separated by `\n` and no newline after the last row.
pub fn results_to_csv(results: &[ScreeningResult]) -> anyhow::Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(HEADERS)?;
    for result in results {
        wtr.write_record(export_row(result))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV buffer: {}", e.error()))?;
    let mut text = String::from_utf8(bytes).context("CSV output was not UTF-8")?;
    // The writer terminates every record; the export joins rows instead.
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn export_row(result: &ScreeningResult) -> [String; 6] {
    let competencies = result
        .competency_scores()
        .into_iter()
        .map(|(name, score)| format!("{}: {}", name, score))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);

    [
        result.file_name.clone(),
        result.score_text(),
        result.pass_fail().to_string(),
        result.justification().to_string(),
        result.cited_evidence().join(LIST_SEPARATOR),
        competencies,
    ]
}

/// Write the export into `dir` and return the saved file's path.
pub fn save_export(dir: &Path, results: &[ScreeningResult]) -> anyhow::Result<PathBuf> {
    let contents = results_to_csv(results)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, contents.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = results.len(), "exported results");
    Ok(path)
}
