//! Single forward pass over the document's paragraphs, classifying each one
//! and growing the chapter tree. All cursors live on one [`Builder`]
//! instance per document; nodes are pushed into their parent the moment the
//! cursor moves past them.

use std::sync::LazyLock;

use regex::Regex;

use crate::docjson::{Bullet, DocumentFile, Paragraph};
use crate::guide::{Chapter, Footnote, FootnoteKind, FormattedSpan, NestedContent, Section, Step, StepContent};

use super::{metadata, richtext, Markers};

pub const UNKNOWN_CHAPTER: &str = "Unknown Chapter";
pub const UNKNOWN_SECTION: &str = "Unknown Section";

const CHAPTER_MARKER: &str = "Chapter";
const TERMINAL_PREFIX: &str = "Complete ";
const TERMINAL_PHRASES: &[&str] = &["Complete the ", "Finish "];

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+:").unwrap());

/// Does the text read like an end-of-section step ("Complete X" / "Finish X")?
pub(crate) fn looks_terminal(text: &str) -> bool {
    text.starts_with(TERMINAL_PREFIX) || TERMINAL_PHRASES.iter().any(|p| text.contains(p))
}

/// Where the walk currently sits relative to a chapter's trailing notes.
/// Any chapter or section heading drops back to `Body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Normal chapter body.
    Body,
    /// The latest step's text looked terminal; a stat-block cue from here on
    /// flips into footnote collection.
    TailArmed,
    /// Everything is appended to the open chapter's footnotes.
    Footnotes,
}

pub fn build_chapters(doc: &DocumentFile, markers: &Markers) -> Vec<Chapter> {
    let mut builder = Builder::new(markers);
    for tab in &doc.tabs {
        let Some(document_tab) = &tab.document_tab else { continue };
        for element in &document_tab.body.content {
            let Some(paragraph) = &element.paragraph else { continue };
            builder.handle_paragraph(paragraph);
        }
    }
    let mut chapters = builder.finish();
    strip_skills_label_spans(&mut chapters);
    chapters
}

struct Builder<'a> {
    markers: &'a Markers,
    chapters: Vec<Chapter>,
    current_chapter: Option<Chapter>,
    current_section: Option<Section>,
    current_step: Option<Step>,
    current_list_id: Option<String>,
    nested_active: bool,
    region: Region,
}

impl<'a> Builder<'a> {
    fn new(markers: &'a Markers) -> Self {
        Builder {
            markers,
            chapters: Vec::new(),
            current_chapter: None,
            current_section: None,
            current_step: None,
            current_list_id: None,
            nested_active: false,
            region: Region::Body,
        }
    }

    fn handle_paragraph(&mut self, paragraph: &Paragraph) {
        let spans = richtext::combine(&paragraph.elements);
        if spans.is_empty() {
            return;
        }
        let text = plain_text(&spans);

        if !text.is_empty() && text.contains(CHAPTER_MARKER) && paragraph.is_centered() {
            self.open_chapter(text, spans);
            return;
        }

        if SECTION_RE.is_match(&text) {
            self.handle_section_heading(text, spans);
            return;
        }

        if self.region != Region::Footnotes {
            if self.region == Region::Body && looks_terminal(&text) {
                self.region = Region::TailArmed;
            }
            if self.region == Region::TailArmed && self.markers.stat_cue(&text) {
                self.region = Region::Footnotes;
            }
        }
        if self.region == Region::Footnotes {
            self.push_chapter_footnote(spans);
            return;
        }

        if let Some(bullet) = &paragraph.bullet {
            self.handle_bullet(bullet, spans);
            return;
        }

        if self.current_step.is_some() {
            self.handle_continuation(&text, spans);
        }
    }

    fn open_chapter(&mut self, title: String, spans: Vec<FormattedSpan>) {
        self.flush_chapter();
        self.current_chapter = Some(Chapter::new(title, Some(spans)));
        self.current_list_id = None;
        self.nested_active = false;
        self.region = Region::Body;
    }

    fn handle_section_heading(&mut self, title: String, spans: Vec<FormattedSpan>) {
        self.ensure_chapter();

        // The epilogue section never becomes a section: its heading opens the
        // chapter's footnote region instead.
        if self.markers.epilogue_title(&title) {
            self.region = Region::Footnotes;
            if let Some(chapter) = self.current_chapter.as_mut() {
                chapter.footnotes.push(Footnote {
                    content: spans,
                    kind: FootnoteKind::ChapterFootnoteTitle,
                    level: None,
                });
            }
            return;
        }

        self.flush_section();
        self.current_section = Some(Section::new(title));
        self.current_list_id = None;
        self.nested_active = false;
        self.region = Region::Body;
    }

    fn handle_bullet(&mut self, bullet: &Bullet, spans: Vec<FormattedSpan>) {
        if bullet.nesting_level > 0 {
            let same_list =
                self.current_step.is_some() && self.current_list_id == bullet.list_id;
            if !same_list {
                self.new_step(StepContent::Spans(Vec::new()), bullet.list_id.clone());
            }
            self.nested_active = true;
            if let Some(step) = self.current_step.as_mut() {
                step.nested_content.push(NestedContent {
                    level: bullet.nesting_level,
                    content: spans,
                });
            }
        } else {
            self.new_step(StepContent::Spans(spans), bullet.list_id.clone());
            self.nested_active = false;
        }
    }

    fn handle_continuation(&mut self, text: &str, spans: Vec<FormattedSpan>) {
        let nested_active = self.nested_active;
        let Some(step) = self.current_step.as_mut() else { return };

        extract_inline_skills(step);

        if metadata::contains_label(text) {
            let fields = metadata::parse_metadata_line(text);
            if !fields.is_empty() {
                step.metadata.extend(fields);
            } else {
                // Label recognized but no value captured: keep the raw text
                // visible rather than dropping it.
                append_to_step(step, nested_active, vec![FormattedSpan::plain(text)]);
            }
            return;
        }

        append_to_step(step, nested_active, spans);
    }

    fn new_step(&mut self, content: StepContent, list_id: Option<String>) {
        self.ensure_section();
        self.flush_step();
        self.current_step = Some(Step::new(content));
        self.current_list_id = list_id;
    }

    fn push_chapter_footnote(&mut self, spans: Vec<FormattedSpan>) {
        self.ensure_chapter();
        if let Some(chapter) = self.current_chapter.as_mut() {
            chapter.footnotes.push(Footnote {
                content: spans,
                kind: FootnoteKind::ChapterFootnote,
                level: None,
            });
        }
    }

    fn ensure_chapter(&mut self) {
        if self.current_chapter.is_none() {
            self.current_chapter = Some(Chapter::new(UNKNOWN_CHAPTER, None));
        }
    }

    fn ensure_section(&mut self) {
        self.ensure_chapter();
        if self.current_section.is_none() {
            self.current_section = Some(Section::new(UNKNOWN_SECTION));
        }
    }

    fn flush_step(&mut self) {
        if let Some(step) = self.current_step.take() {
            if let Some(section) = self.current_section.as_mut() {
                section.steps.push(step);
            }
        }
    }

    fn flush_section(&mut self) {
        self.flush_step();
        if let Some(section) = self.current_section.take() {
            if let Some(chapter) = self.current_chapter.as_mut() {
                chapter.sections.push(section);
            }
        }
    }

    fn flush_chapter(&mut self) {
        self.flush_section();
        if let Some(chapter) = self.current_chapter.take() {
            self.chapters.push(chapter);
        }
    }

    fn finish(mut self) -> Vec<Chapter> {
        self.flush_chapter();
        self.chapters
    }
}

fn plain_text(spans: &[FormattedSpan]) -> String {
    spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

/// An inline skills/quests label inside the step's own content becomes
/// metadata; the carrying span is dropped.
fn extract_inline_skills(step: &mut Step) {
    let StepContent::Spans(content) = &mut step.content else { return };
    let Some(idx) = content
        .iter()
        .position(|s| metadata::contains_skills_label(&s.text))
    else {
        return;
    };
    let span = content.remove(idx);
    if let Some(value) = metadata::skills_label_value(&span.text) {
        step.metadata
            .insert(metadata::SKILLS_QUESTS_KEY.to_string(), value);
    }
}

fn append_to_step(step: &mut Step, nested_active: bool, spans: Vec<FormattedSpan>) {
    let flat = matches!(step.content, StepContent::Spans(_));
    if nested_active || !flat {
        step.additional_content
            .get_or_insert_with(Vec::new)
            .push(spans);
    } else if let StepContent::Spans(content) = &mut step.content {
        content.extend(spans);
    }
}

/// Cleanup after the forward scan: once a step's skills/quests value is in
/// metadata, no content span may still carry the label text. Idempotent.
fn strip_skills_label_spans(chapters: &mut [Chapter]) {
    for chapter in chapters {
        for section in &mut chapter.sections {
            for step in &mut section.steps {
                if !step.metadata.contains_key(metadata::SKILLS_QUESTS_KEY) {
                    continue;
                }
                if let StepContent::Spans(content) = &mut step.content {
                    content.retain(|s| !metadata::contains_skills_label(&s.text));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: Vec<serde_json::Value>) -> DocumentFile {
        serde_json::from_value(serde_json::json!({
            "tabs": [{ "documentTab": { "body": { "content": content } } }]
        }))
        .unwrap()
    }

    fn para(text: &str) -> serde_json::Value {
        serde_json::json!({
            "paragraph": { "elements": [{ "textRun": { "content": format!("{}\n", text) } }] }
        })
    }

    fn centered(text: &str) -> serde_json::Value {
        serde_json::json!({
            "paragraph": {
                "elements": [{ "textRun": { "content": format!("{}\n", text), "textStyle": { "bold": true } } }],
                "paragraphStyle": { "alignment": "CENTER" }
            }
        })
    }

    fn bullet(text: &str, list_id: &str) -> serde_json::Value {
        serde_json::json!({
            "paragraph": {
                "elements": [{ "textRun": { "content": format!("{}\n", text) } }],
                "bullet": { "listId": list_id }
            }
        })
    }

    fn sub_bullet(text: &str, list_id: &str, level: u32) -> serde_json::Value {
        serde_json::json!({
            "paragraph": {
                "elements": [{ "textRun": { "content": format!("{}\n", text) } }],
                "bullet": { "listId": list_id, "nestingLevel": level }
            }
        })
    }

    fn build(content: Vec<serde_json::Value>) -> Vec<Chapter> {
        build_chapters(&doc(content), &Markers::default())
    }

    fn step_text(step: &Step) -> String {
        match &step.content {
            StepContent::Spans(spans) => plain_text(spans),
            StepContent::Checklist(_) => panic!("expected flat step"),
        }
    }

    #[test]
    fn chapter_section_step_with_metadata() {
        let chapters = build(vec![
            centered("Chapter 1: Tutorial"),
            para("1.1: Getting started"),
            bullet("Talk to the guide.", "kix.l1"),
            para("Total time: 2 minutes"),
        ]);
        assert_eq!(chapters.len(), 1);
        let chapter = &chapters[0];
        assert_eq!(chapter.title, "Chapter 1: Tutorial");
        assert!(chapter.title_formatted.is_some());
        assert_eq!(chapter.sections.len(), 1);
        let section = &chapter.sections[0];
        assert_eq!(section.title, "1.1: Getting started");
        assert_eq!(section.steps.len(), 1);
        let step = &section.steps[0];
        assert_eq!(step_text(step), "Talk to the guide.");
        assert_eq!(step.metadata[metadata::TOTAL_TIME_KEY], "2 minutes");
    }

    #[test]
    fn uncentered_chapter_text_is_not_a_heading() {
        let chapters = build(vec![
            para("Chapter 1: Tutorial"),
            bullet("Do a thing.", "kix.l1"),
        ]);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, UNKNOWN_CHAPTER);
    }

    #[test]
    fn bullet_before_any_heading_synthesizes_placeholders() {
        let chapters = build(vec![bullet("Orphan step.", "kix.l1")]);
        assert_eq!(chapters[0].title, UNKNOWN_CHAPTER);
        assert!(chapters[0].title_formatted.is_none());
        assert_eq!(chapters[0].sections[0].title, UNKNOWN_SECTION);
        assert_eq!(chapters[0].sections[0].steps.len(), 1);
    }

    #[test]
    fn new_chapter_resets_section_and_step_cursors() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Step in one.", "kix.l1"),
            centered("Chapter 2: Two"),
            bullet("Step in two.", "kix.l2"),
        ]);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].sections[0].steps.len(), 1);
        // The step after the second heading lands in a fresh synthesized
        // section, not the previous chapter's.
        assert_eq!(chapters[1].sections[0].title, UNKNOWN_SECTION);
        assert_eq!(step_text(&chapters[1].sections[0].steps[0]), "Step in two.");
    }

    #[test]
    fn sub_bullets_group_by_list_id() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Parent step.", "kix.l1"),
            sub_bullet("Detail a", "kix.l1", 1),
            sub_bullet("Detail b", "kix.l1", 2),
            sub_bullet("Other list", "kix.l2", 1),
        ]);
        let steps = &chapters[0].sections[0].steps;
        assert_eq!(steps.len(), 2);
        // Same list id: both details attach to the open step.
        assert_eq!(step_text(&steps[0]), "Parent step.");
        assert_eq!(steps[0].nested_content.len(), 2);
        assert_eq!(steps[0].nested_content[0].level, 1);
        assert_eq!(steps[0].nested_content[1].level, 2);
        // New list id: synthesized step with empty content.
        assert!(matches!(&steps[1].content, StepContent::Spans(s) if s.is_empty()));
        assert_eq!(steps[1].nested_content.len(), 1);
    }

    #[test]
    fn continuation_extends_flat_content() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Cross the bridge", "kix.l1"),
            para("and climb the ladder."),
        ]);
        let step = &chapters[0].sections[0].steps[0];
        assert_eq!(step_text(step), "Cross the bridgeand climb the ladder.");
    }

    #[test]
    fn continuation_after_sub_bullets_goes_to_additional_content() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Parent.", "kix.l1"),
            sub_bullet("Detail", "kix.l1", 1),
            para("Trailing note."),
        ]);
        let steps = &chapters[0].sections[0].steps;
        assert_eq!(steps.len(), 1);
        let extra = steps[0].additional_content.as_ref().unwrap();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0][0].text, "Trailing note.");
    }

    #[test]
    fn malformed_metadata_line_kept_as_text() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Do the thing.", "kix.l1"),
            para("Items needed:"),
        ]);
        let step = &chapters[0].sections[0].steps[0];
        assert!(step.metadata.is_empty());
        assert_eq!(step_text(step), "Do the thing.Items needed:");
    }

    #[test]
    fn inline_skills_label_pulled_from_content() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            serde_json::json!({
                "paragraph": {
                    "elements": [
                        { "textRun": { "content": "Kill the goblin. " } },
                        { "textRun": { "content": "Skills/quests met to do step?: 10 Attack\n" } }
                    ],
                    "bullet": { "listId": "kix.l1" }
                }
            }),
            para("Just some trailing text."),
        ]);
        let step = &chapters[0].sections[0].steps[0];
        assert_eq!(step.metadata[metadata::SKILLS_QUESTS_KEY], "10 Attack");
        assert_eq!(step_text(step), "Kill the goblin. Just some trailing text.");
    }

    #[test]
    fn epilogue_heading_opens_footnote_region() {
        let markers = Markers::default();
        let chapters = build_chapters(
            &doc(vec![
                centered("Chapter 3: Endgame"),
                para("3.2: Final push"),
                bullet("Do the final thing.", "kix.l1"),
                para("3.3: Beyond BRUHsailer"),
                para("Everything past the guide."),
                bullet("Even bullets land in footnotes.", "kix.l9"),
            ]),
            &markers,
        );
        let chapter = &chapters[0];
        assert_eq!(chapter.sections.len(), 1, "epilogue must not become a section");
        assert_eq!(chapter.footnotes.len(), 3);
        assert_eq!(chapter.footnotes[0].kind, FootnoteKind::ChapterFootnoteTitle);
        assert_eq!(chapter.footnotes[1].kind, FootnoteKind::ChapterFootnote);
        assert_eq!(chapter.footnotes[2].kind, FootnoteKind::ChapterFootnote);
    }

    #[test]
    fn terminal_step_then_stat_cue_enters_footnotes() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Complete the chapter.", "kix.l1"),
            para("Stats"),
            para("Atk: 40"),
            para("1:23"),
        ]);
        let chapter = &chapters[0];
        // The cue line and everything after it are chapter footnotes.
        assert_eq!(chapter.footnotes.len(), 3);
        assert!(chapter
            .footnotes
            .iter()
            .all(|f| f.kind == FootnoteKind::ChapterFootnote));
        assert_eq!(chapter.sections[0].steps.len(), 1);
    }

    #[test]
    fn stat_cue_without_terminal_step_stays_in_body() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Mine some ore.", "kix.l1"),
            para("Stats are great."),
        ]);
        let chapter = &chapters[0];
        assert!(chapter.footnotes.is_empty());
        assert_eq!(
            step_text(&chapter.sections[0].steps[0]),
            "Mine some ore.Stats are great."
        );
    }

    #[test]
    fn section_heading_closes_footnote_region() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Complete the section.", "kix.l1"),
            para("Quests missing for quest cape"),
            para("2.1: Back to normal"),
            bullet("A fresh step.", "kix.l2"),
        ]);
        let chapter = &chapters[0];
        assert_eq!(chapter.footnotes.len(), 1);
        assert_eq!(chapter.sections.len(), 2);
        assert_eq!(chapter.sections[1].steps.len(), 1);
    }

    #[test]
    fn empty_paragraphs_skipped() {
        let chapters = build(vec![
            centered("Chapter 1: One"),
            serde_json::json!({ "paragraph": { "elements": [{ "textRun": { "content": "\n" } }] } }),
            serde_json::json!({ "paragraph": { "elements": [] } }),
            serde_json::json!({ "sectionBreak": {} }),
            para("1.1: First"),
        ]);
        assert_eq!(chapters[0].sections.len(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let content = vec![
            centered("Chapter 1: One"),
            para("1.1: First"),
            bullet("Step one.", "kix.l1"),
            sub_bullet("Detail", "kix.l1", 1),
            para("GP stack: 100k"),
            bullet("Complete the section.", "kix.l1"),
            para("Stats"),
            para("Atk: 40"),
        ];
        let markers = Markers::default();
        let a = build_chapters(&doc(content.clone()), &markers);
        let b = build_chapters(&doc(content), &markers);
        assert_eq!(a, b);
    }
}
