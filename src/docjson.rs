//! Serde model of the word-processor JSON export consumed by the converter.
//!
//! Only the fields the pipeline reads are modeled; everything else in the
//! export is ignored during deserialization.

use serde::Deserialize;

pub const CENTER_ALIGNMENT: &str = "CENTER";

#[derive(Debug, Deserialize)]
pub struct DocumentFile {
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub document_tab: Option<DocumentTab>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentTab {
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// One entry of the document body. Non-paragraph entries (tables, section
/// breaks) carry no `paragraph` key and are skipped by the builder.
#[derive(Debug, Deserialize)]
pub struct StructuralElement {
    pub paragraph: Option<Paragraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: Option<ParagraphStyle>,
    pub bullet: Option<Bullet>,
}

impl Paragraph {
    pub fn is_centered(&self) -> bool {
        self.paragraph_style
            .as_ref()
            .and_then(|s| s.alignment.as_deref())
            == Some(CENTER_ALIGNMENT)
    }
}

#[derive(Debug, Deserialize)]
pub struct ParagraphStyle {
    pub alignment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    pub list_id: Option<String>,
    /// Absent in the export for top-level bullets.
    #[serde(default)]
    pub nesting_level: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
    pub rich_link: Option<RichLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
    pub text_style: Option<TextStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_size: Option<Dimension>,
    pub weighted_font_family: Option<WeightedFontFamily>,
    pub foreground_color: Option<OptionalColor>,
    pub link: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub struct Dimension {
    pub magnitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedFontFamily {
    pub font_family: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OptionalColor {
    pub color: Option<Color>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub rgb_color: Option<RgbColor>,
}

/// Channels default to 0.0 when omitted, matching the export's convention
/// of dropping zero channels.
#[derive(Debug, Deserialize)]
pub struct RgbColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichLink {
    pub text_style: Option<TextStyle>,
    pub rich_link_properties: Option<RichLinkProperties>,
}

#[derive(Debug, Deserialize)]
pub struct RichLinkProperties {
    pub title: Option<String>,
    pub uri: Option<String>,
}
