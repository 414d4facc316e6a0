//! Narrative annotator
//!
//! Pulls a few structured fields out of free-form workload commentary (for
//! example text returned by a language model). Only what is actually present
//! in the text is reported; nothing is filled in with stock defaults.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a summary before it is elided
pub const SUMMARY_CHARS: usize = 500;

/// Characters stripped from both ends of a bullet line
const BULLET_TRIM: &[char] = &[
    '•', '-', '*', ' ', '\t', '.', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Substrings that mark a line as a list item
const BULLET_MARKERS: [&str; 6] = ["•", "-", "*", "1.", "2.", "3."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadType {
    #[serde(rename = "OLTP")]
    Oltp,
    #[serde(rename = "OLAP")]
    Olap,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Fields recognised in a narrative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeFields {
    pub workload_type: Option<WorkloadType>,
    pub complexity: Option<Complexity>,
    pub recommendations: Vec<String>,
    pub bottlenecks: Vec<String>,
    pub risks: Vec<String>,
    pub summary: String,
}

impl NarrativeFields {
    fn is_empty(&self) -> bool {
        self.workload_type.is_none()
            && self.complexity.is_none()
            && self.recommendations.is_empty()
            && self.bottlenecks.is_empty()
            && self.risks.is_empty()
    }
}

/// Result of annotating a narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Structured(NarrativeFields),
    /// Nothing recognisable was found
    RawTextOnly { summary: String },
}

impl Annotation {
    pub fn summary(&self) -> &str {
        match self {
            Annotation::Structured(fields) => &fields.summary,
            Annotation::RawTextOnly { summary } => summary,
        }
    }
}

/// First [`SUMMARY_CHARS`] characters, with "..." appended when cut
pub fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Clone, Copy)]
enum Section {
    Recommendations,
    Bottlenecks,
    Risks,
}

/// Classify a heading line; later headings replace earlier ones
fn section_of(heading: &str) -> Option<Section> {
    let lower = heading.to_lowercase();
    if lower.contains("recommend") {
        Some(Section::Recommendations)
    } else if lower.contains("bottleneck") || lower.contains("performance") {
        Some(Section::Bottlenecks)
    } else if lower.contains("risk") {
        Some(Section::Risks)
    } else {
        None
    }
}

fn workload_type_of(lower: &str) -> Option<WorkloadType> {
    if !(lower.contains("workload") && (lower.contains("classification") || lower.contains("type")))
    {
        return None;
    }
    if lower.contains("oltp") {
        Some(WorkloadType::Oltp)
    } else if lower.contains("olap") {
        Some(WorkloadType::Olap)
    } else if lower.contains("mixed") {
        Some(WorkloadType::Mixed)
    } else {
        None
    }
}

fn complexity_of(lower: &str) -> Option<Complexity> {
    if !lower.contains("complexity") {
        return None;
    }
    Some(if lower.contains("high") {
        Complexity::High
    } else if lower.contains("low") {
        Complexity::Low
    } else {
        Complexity::Medium
    })
}

/// Extract structured fields from a free-form narrative
pub fn annotate(text: &str) -> Annotation {
    let mut fields = NarrativeFields {
        summary: summarize(text),
        ..NarrativeFields::default()
    };
    let mut section: Option<Section> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();

        if let Some(kind) = workload_type_of(&lower) {
            fields.workload_type = Some(kind);
        }
        if let Some(level) = complexity_of(&lower) {
            fields.complexity = Some(level);
        }

        // the heading in effect is the one before this line
        if BULLET_MARKERS.iter().any(|marker| line.contains(marker)) {
            let item = line.trim_matches(BULLET_TRIM).trim();
            if !item.is_empty() {
                let target = match section {
                    Some(Section::Recommendations) => Some(&mut fields.recommendations),
                    Some(Section::Bottlenecks) => Some(&mut fields.bottlenecks),
                    Some(Section::Risks) => Some(&mut fields.risks),
                    None => None,
                };
                if let Some(list) = target {
                    list.push(item.to_string());
                }
            }
        }

        if line.contains(':') {
            section = section_of(line);
        }
    }

    if fields.is_empty() {
        Annotation::RawTextOnly {
            summary: fields.summary,
        }
    } else {
        Annotation::Structured(fields)
    }
}
