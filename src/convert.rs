//! File-level orchestration: read each document export, run the parse
//! pipeline, and combine the per-document chapter trees into one guide.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::docjson::DocumentFile;
use crate::guide::{Chapter, GuideDocument};
use crate::parser::{self, metadata, Markers};

pub const DATA_DIR: &str = "data";
pub const OUTPUT_FILE_NAME: &str = "guide_data.json";

#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    #[error("no source document parsed successfully")]
    NoValidFragments,
}

/// Convert `inputs` into one combined guide written to `output`.
/// Documents that fail to read or parse are skipped with a warning; the run
/// only fails when nothing survives.
pub fn run(inputs: &[PathBuf], output: &Path, title: &str) -> Result<()> {
    let markers = Markers::default();
    info!("Converting {} document(s)", inputs.len());

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len}")?
            .progress_chars("=> "),
    );

    // Independent per-document parses; collect() keeps input order.
    let parsed: Vec<Option<Vec<Chapter>>> = inputs
        .par_iter()
        .map(|path| {
            let fragment = parse_file(path, &markers);
            pb.inc(1);
            fragment
        })
        .collect();
    pb.finish_and_clear();

    let fragments: Vec<Vec<Chapter>> = parsed.into_iter().flatten().collect();
    let skipped = inputs.len() - fragments.len();
    if skipped > 0 {
        warn!("{} document(s) skipped", skipped);
    }

    let guide = combine(fragments, title)?;
    let json = serde_json::to_string_pretty(&guide)?;
    fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} chapter(s) to {}",
        guide.chapters.len(),
        output.display()
    );
    Ok(())
}

/// Input files for a bare invocation: every `*.json` in the data directory
/// except a previously written guide, in file-name order.
pub fn default_inputs() -> Result<Vec<PathBuf>> {
    scan_json_inputs(Path::new(DATA_DIR))
}

pub fn default_output() -> PathBuf {
    Path::new(DATA_DIR).join(OUTPUT_FILE_NAME)
}

fn scan_json_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| p.file_name().is_some_and(|name| name != OUTPUT_FILE_NAME))
        .collect();
    files.sort();
    Ok(files)
}

fn parse_file(path: &Path, markers: &Markers) -> Option<Vec<Chapter>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };
    let doc: DocumentFile = match serde_json::from_slice(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Skipping {}: invalid document JSON: {}", path.display(), e);
            return None;
        }
    };
    Some(parser::parse_document(&doc, markers))
}

/// Merge per-document chapter trees, in input order, into the final guide.
pub fn combine(fragments: Vec<Vec<Chapter>>, title: &str) -> Result<GuideDocument, CombineError> {
    if fragments.is_empty() {
        return Err(CombineError::NoValidFragments);
    }

    let mut chapters = Vec::new();
    for mut fragment in fragments {
        for chapter in &mut fragment {
            normalize_raw_skills_key(chapter);
        }
        chapters.extend(fragment);
    }

    Ok(GuideDocument {
        updated_on: Local::now().format("%Y-%m-%d").to_string(),
        title: title.to_string(),
        chapters,
    })
}

/// Parsing occasionally leaves the skills label verbatim as a metadata key;
/// fold it into the normalized key here so the output never carries both.
fn normalize_raw_skills_key(chapter: &mut Chapter) {
    for section in &mut chapter.sections {
        for step in &mut section.steps {
            if let Some(value) = step.metadata.remove(metadata::RAW_SKILLS_LABEL) {
                step.metadata
                    .insert(metadata::SKILLS_QUESTS_KEY.to_string(), value);
            }
        }
    }
}
