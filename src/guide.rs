//! The guide tree written out for the checklist page: chapters → sections →
//! steps, with footnotes relocated out of the main flow. Field names follow
//! what the renderer reads, so everything serializes camelCase.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Style attributes carried only when the source run set them explicitly.
/// Absent fields stay absent in the output so the renderer applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(rename = "fontSize", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(rename = "fontFamily", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Hyperlink target for styled text runs (distinct from rich-link spans,
    /// which carry `url` on the span itself).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "isLink", skip_serializing_if = "Option::is_none")]
    pub is_link: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedSpan {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "isLink", skip_serializing_if = "is_false")]
    pub is_link: bool,
    #[serde(rename = "formatting")]
    pub style: SpanStyle,
}

impl FormattedSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        FormattedSpan {
            text: text.into(),
            url: None,
            is_link: false,
            style: SpanStyle::default(),
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A step's body is either one run of spans or a list of independently
/// checkable sub-items. The renderer tells them apart by whether the first
/// content entry is itself an array, so this serializes untagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepContent {
    Spans(Vec<FormattedSpan>),
    Checklist(Vec<Vec<FormattedSpan>>),
}

impl StepContent {
    pub fn leading_text(&self) -> Option<&str> {
        match self {
            StepContent::Spans(spans) => spans.first().map(|s| s.text.as_str()),
            StepContent::Checklist(items) => {
                items.first().and_then(|i| i.first()).map(|s| s.text.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedContent {
    pub level: u32,
    pub content: Vec<FormattedSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub content: StepContent,
    pub nested_content: Vec<NestedContent>,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content: Option<Vec<Vec<FormattedSpan>>>,
}

impl Step {
    pub fn new(content: StepContent) -> Self {
        Step {
            content,
            nested_content: Vec::new(),
            metadata: BTreeMap::new(),
            additional_content: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FootnoteKind {
    ChapterFootnoteTitle,
    ChapterFootnote,
    ChapterFootnoteNested,
    SectionFootnote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footnote {
    pub content: Vec<FormattedSpan>,
    #[serde(rename = "type")]
    pub kind: FootnoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub steps: Vec<Step>,
    pub footnotes: Vec<Footnote>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Section {
            title: title.into(),
            steps: Vec::new(),
            footnotes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_formatted: Option<Vec<FormattedSpan>>,
    pub sections: Vec<Section>,
    pub footnotes: Vec<Footnote>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, title_formatted: Option<Vec<FormattedSpan>>) -> Self {
        Chapter {
            title: title.into(),
            title_formatted,
            sections: Vec::new(),
            footnotes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideDocument {
    pub updated_on: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
}
