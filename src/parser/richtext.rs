//! Rich-text leaf extraction: one paragraph element in, one normalized span
//! out. Stateless; every other stage consumes spans through [`combine`].

use crate::docjson::{ParagraphElement, TextStyle};
use crate::guide::{FormattedSpan, Rgb, SpanStyle};

const RICH_LINK_FALLBACK_TITLE: &str = "Link";

/// Extract every surviving span from an ordered run of paragraph elements.
pub fn combine(elements: &[ParagraphElement]) -> Vec<FormattedSpan> {
    elements.iter().filter_map(extract).collect()
}

/// Convert a single paragraph element. Text runs and rich links produce a
/// span; anything else (inline objects, equations, empty runs) produces
/// nothing.
pub fn extract(element: &ParagraphElement) -> Option<FormattedSpan> {
    if let Some(run) = &element.text_run {
        // The paragraph terminator rides on the last run; embedded line
        // breaks inside a paragraph arrive as vertical tabs and stay.
        let text = run.content.trim_end_matches('\n');
        if text.is_empty() {
            return None;
        }
        return Some(FormattedSpan {
            text: text.to_string(),
            url: None,
            is_link: false,
            style: run.text_style.as_ref().map(span_style).unwrap_or_default(),
        });
    }

    if let Some(link) = &element.rich_link {
        let props = link.rich_link_properties.as_ref();
        let title = props
            .and_then(|p| p.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| RICH_LINK_FALLBACK_TITLE.to_string());
        let uri = props.and_then(|p| p.uri.clone()).unwrap_or_default();
        return Some(FormattedSpan {
            text: title,
            url: Some(uri),
            is_link: true,
            style: rich_link_style(link.text_style.as_ref()),
        });
    }

    None
}

fn span_style(ts: &TextStyle) -> SpanStyle {
    let color = ts
        .foreground_color
        .as_ref()
        .and_then(|c| c.color.as_ref())
        .and_then(|c| c.rgb_color.as_ref())
        .map(|c| Rgb {
            r: c.red,
            g: c.green,
            b: c.blue,
        });

    let url = ts.link.as_ref().and_then(|l| l.url.clone());
    let is_link = url.as_ref().map(|_| true);

    SpanStyle {
        bold: ts.bold,
        italic: ts.italic,
        underline: ts.underline,
        strikethrough: ts.strikethrough,
        color,
        font_size: ts.font_size.as_ref().and_then(|d| d.magnitude),
        font_family: ts
            .weighted_font_family
            .as_ref()
            .and_then(|f| f.font_family.clone()),
        url,
        is_link,
    }
}

/// Rich links always render underlined; only the explicitly set emphasis and
/// font attributes carry over.
fn rich_link_style(ts: Option<&TextStyle>) -> SpanStyle {
    let mut style = SpanStyle {
        underline: Some(true),
        ..Default::default()
    };
    if let Some(ts) = ts {
        style.bold = ts.bold;
        style.italic = ts.italic;
        style.font_size = ts.font_size.as_ref().and_then(|d| d.magnitude);
        style.font_family = ts
            .weighted_font_family
            .as_ref()
            .and_then(|f| f.font_family.clone());
    }
    style
}
