//! Step metadata extraction. Source paragraphs fold several annotation
//! fields onto one logical line, in any order, so this is a multi-pattern
//! scan rather than a sequential tokenizer: every label occurrence is
//! located first, then each value is the text between a label's end and the
//! next label's start (or end of text).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

pub const SKILLS_QUESTS_KEY: &str = "skills_quests_met";
pub const GP_STACK_KEY: &str = "gp_stack";
pub const ITEMS_NEEDED_KEY: &str = "items_needed";
pub const TOTAL_TIME_KEY: &str = "total_time";

/// The skills label as it occasionally survives verbatim as a metadata key.
pub const RAW_SKILLS_LABEL: &str = "Skills/quests met to do step?:";

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(skills/quests met to do step\?:|skills/quests met\? to do step:|skills/quests met\?:|gp stack after step:|gp stack:|items needed during step:|items needed:|total time taken during step:|total time:)",
    )
    .unwrap()
});

static SKILLS_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(skills/quests met to do step\?:|skills/quests met\? to do step:|skills/quests met\?:)")
        .unwrap()
});

/// Extract all recognized fields from one logical line. Labels may appear in
/// any order; a label with an empty value is omitted.
pub fn parse_metadata_line(text: &str) -> BTreeMap<String, String> {
    let labels: Vec<_> = LABEL_RE.find_iter(text).collect();
    let mut fields = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        let end = labels.get(i + 1).map(|next| next.start()).unwrap_or(text.len());
        let value = text[label.end()..end].trim();
        if !value.is_empty() {
            fields.insert(key_for(label.as_str()).to_string(), value.to_string());
        }
    }
    fields
}

/// Does the line carry any of the four label families?
pub fn contains_label(text: &str) -> bool {
    LABEL_RE.is_match(text)
}

/// Does the text carry a skills/quests label variant?
pub fn contains_skills_label(text: &str) -> bool {
    SKILLS_LABEL_RE.is_match(text)
}

/// The trailing value after an inline skills/quests label, if non-empty.
pub fn skills_label_value(text: &str) -> Option<String> {
    let m = SKILLS_LABEL_RE.find(text)?;
    let value = text[m.end()..].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn key_for(label: &str) -> &'static str {
    let lower = label.to_ascii_lowercase();
    if lower.starts_with("skills/quests") {
        SKILLS_QUESTS_KEY
    } else if lower.starts_with("gp stack") {
        GP_STACK_KEY
    } else if lower.starts_with("items needed") {
        ITEMS_NEEDED_KEY
    } else {
        TOTAL_TIME_KEY
    }
}
