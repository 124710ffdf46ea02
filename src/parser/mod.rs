pub mod builder;
pub mod footnotes;
pub mod metadata;
pub mod richtext;

use regex::Regex;

use crate::docjson::DocumentFile;
use crate::guide::Chapter;

/// Content-specific cue strings. These identify where a chapter's main
/// content ends and its trailing notes begin, so they track the guide being
/// converted rather than the document format; swap them out for other
/// deployments.
#[derive(Debug, Clone)]
pub struct Markers {
    /// Section-number prefix of the epilogue section heading.
    pub epilogue_section_prefix: String,
    /// Title fragment that marks the epilogue section.
    pub epilogue_section_marker: String,
    /// Substrings that flag a stat-block line.
    pub stat_cues: Vec<String>,
    /// Full-line patterns that flag a stat-block line.
    pub stat_patterns: Vec<Regex>,
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            epilogue_section_prefix: "3.3:".to_string(),
            epilogue_section_marker: "Beyond BRUHsailer".to_string(),
            stat_cues: vec![
                "Stats".to_string(),
                "Quests missing for quest cape".to_string(),
            ],
            stat_patterns: vec![
                Regex::new(r"^(Atk|Str|Def|HP|Range|Pray|Magic|RC):").unwrap(),
                Regex::new(r"^\d+:\d+$").unwrap(),
            ],
        }
    }
}

impl Markers {
    pub fn epilogue_title(&self, title: &str) -> bool {
        title.contains(&self.epilogue_section_prefix)
            && title.contains(&self.epilogue_section_marker)
    }

    pub fn stat_cue(&self, text: &str) -> bool {
        self.stat_cues.iter().any(|cue| text.contains(cue))
            || self.stat_patterns.iter().any(|re| re.is_match(text))
    }
}

/// Two-pass pipeline: document export → chapter tree → footnote
/// reclassification.
pub fn parse_document(doc: &DocumentFile, markers: &Markers) -> Vec<Chapter> {
    let mut chapters = builder::build_chapters(doc, markers);
    for chapter in &mut chapters {
        footnotes::reclassify(chapter, markers);
    }
    chapters
}
