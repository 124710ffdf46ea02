//! Post-pass over a built chapter: trailing "epilogue" material is moved out
//! of the step/section flow into footnote lists. Content is relocated, never
//! rewritten — every span that leaves a step reappears in a footnote.

use crate::guide::{Chapter, Footnote, FootnoteKind, FormattedSpan, Section, SpanStyle, Step, StepContent};

use super::builder::looks_terminal;
use super::{metadata, Markers};

const EPILOGUE_TITLE_SIZE_PT: f64 = 14.0;

/// Label text that signals several metadata fields were glued into one
/// captured value by line folding.
const BLEED_MARKS: &[&str] = &[
    "\u{0B}",
    "Items needed:",
    "Skills/quests met?:",
    "Total time:",
];

pub fn reclassify(chapter: &mut Chapter, markers: &Markers) {
    epilogue_sweep(chapter, markers);
    for section in &mut chapter.sections {
        split_terminal_tail(section);
        repair_metadata_bleed(section);
    }
    chapter_tail_sweep(chapter, markers);
}

/// Remove the epilogue section and everything after it, replaying each
/// removed section into the chapter's footnotes: its title as a
/// `chapter_footnote_title`, then its steps' content. First match only.
fn epilogue_sweep(chapter: &mut Chapter, markers: &Markers) {
    let Some(idx) = chapter
        .sections
        .iter()
        .position(|s| markers.epilogue_title(&s.title))
    else {
        return;
    };

    for section in chapter.sections.split_off(idx) {
        chapter.footnotes.push(Footnote {
            content: vec![title_span(&section.title)],
            kind: FootnoteKind::ChapterFootnoteTitle,
            level: None,
        });
        for step in section.steps {
            chapter.footnotes.extend(step_footnotes(step));
        }
    }
}

/// A section whose last step reads "Complete X. / extra / extra" keeps only
/// the terminal sentence; each extra span becomes its own section footnote.
fn split_terminal_tail(section: &mut Section) {
    let moved = match section.steps.last_mut() {
        Some(step) => match &mut step.content {
            StepContent::Spans(spans)
                if spans.len() > 1 && looks_terminal(&spans[0].text) =>
            {
                spans.split_off(1)
            }
            _ => return,
        },
        None => return,
    };
    for span in moved {
        section.footnotes.push(Footnote {
            content: vec![span],
            kind: FootnoteKind::SectionFootnote,
            level: None,
        });
    }
}

/// Line folding occasionally glues several metadata fields into the captured
/// gp stack value; when the tell-tale label text shows up there, the whole
/// metadata map is re-derived from that value.
fn repair_metadata_bleed(section: &mut Section) {
    let Some(step) = section.steps.last_mut() else { return };
    let Some(value) = step.metadata.get(metadata::GP_STACK_KEY) else { return };
    if !BLEED_MARKS.iter().any(|mark| value.contains(mark)) {
        return;
    }
    let value = value.clone();
    step.metadata = metadata::parse_metadata_line(&value);
}

/// In the chapter's last section, a stat-block step (second step or later)
/// and everything after it belongs to the chapter footnotes.
fn chapter_tail_sweep(chapter: &mut Chapter, markers: &Markers) {
    let removed = match chapter.sections.last_mut() {
        Some(section) => {
            let hit = section
                .steps
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, step)| {
                    step.content
                        .leading_text()
                        .is_some_and(|t| markers.stat_cue(t))
                })
                .map(|(i, _)| i);
            match hit {
                Some(idx) => section.steps.split_off(idx),
                None => return,
            }
        }
        None => return,
    };
    for step in removed {
        chapter.footnotes.extend(step_footnotes(step));
    }
}

fn title_span(title: &str) -> FormattedSpan {
    FormattedSpan {
        text: title.to_string(),
        url: None,
        is_link: false,
        style: SpanStyle {
            bold: Some(true),
            font_size: Some(EPILOGUE_TITLE_SIZE_PT),
            ..Default::default()
        },
    }
}

/// Every content group a step carries, replayed as chapter footnotes:
/// content (per checkbox item for checklist steps), nested entries with
/// their level, and any additional content groups.
fn step_footnotes(step: Step) -> Vec<Footnote> {
    let mut notes = Vec::new();
    match step.content {
        StepContent::Spans(spans) => {
            if !spans.is_empty() {
                notes.push(chapter_note(spans));
            }
        }
        StepContent::Checklist(items) => {
            for item in items.into_iter().filter(|i| !i.is_empty()) {
                notes.push(chapter_note(item));
            }
        }
    }
    for nested in step.nested_content {
        notes.push(Footnote {
            content: nested.content,
            kind: FootnoteKind::ChapterFootnoteNested,
            level: Some(nested.level),
        });
    }
    if let Some(extra) = step.additional_content {
        for group in extra.into_iter().filter(|g| !g.is_empty()) {
            notes.push(chapter_note(group));
        }
    }
    notes
}

fn chapter_note(content: Vec<FormattedSpan>) -> Footnote {
    Footnote {
        content,
        kind: FootnoteKind::ChapterFootnote,
        level: None,
    }
}
