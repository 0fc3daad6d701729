//! Canonical contract-analysis model and the adapters that build it from the
//! two response shapes `/api/analyze` has produced over time.

use shared::protocol::AnalyzeResponse;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Summary,
    KeyPoints,
    Suggestions,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [Self::Summary, Self::KeyPoints, Self::Suggestions];

    /// Upper-case marker that opens this bucket in a text analysis.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Summary => "SUMMARY:",
            Self::KeyPoints => "KEY POINTS:",
            Self::Suggestions => "SUGGESTIONS:",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::KeyPoints => "Key Points",
            Self::Suggestions => "Suggestions",
        }
    }
}

/// Lines of a text analysis sorted into their marker buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSections {
    pub summary: Vec<String>,
    pub key_points: Vec<String>,
    pub suggestions: Vec<String>,
}

impl TextSections {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.key_points.is_empty() && self.suggestions.is_empty()
    }

    pub fn bucket(&self, kind: SectionKind) -> &[String] {
        match kind {
            SectionKind::Summary => &self.summary,
            SectionKind::KeyPoints => &self.key_points,
            SectionKind::Suggestions => &self.suggestions,
        }
    }

    fn bucket_mut(&mut self, kind: SectionKind) -> &mut Vec<String> {
        match kind {
            SectionKind::Summary => &mut self.summary,
            SectionKind::KeyPoints => &mut self.key_points,
            SectionKind::Suggestions => &mut self.suggestions,
        }
    }
}

/// Finds the earliest marker on a line, returning its kind and the text that
/// follows it.
fn find_marker(line: &str) -> Option<(SectionKind, &str)> {
    let upper = line.to_ascii_uppercase();
    SectionKind::ALL
        .iter()
        .filter_map(|kind| upper.find(kind.marker()).map(|at| (at, *kind)))
        .min_by_key(|(at, _)| *at)
        .map(|(at, kind)| (kind, &line[at + kind.marker().len()..]))
}

/// Splits a marker-delimited analysis into buckets.
///
/// Lines before the first marker are dropped, blank lines are skipped, and a
/// response without any marker yields empty buckets.
pub fn parse_text_sections(text: &str) -> TextSections {
    let mut sections = TextSections::default();
    let mut current: Option<SectionKind> = None;

    for line in text.lines() {
        if let Some((kind, rest)) = find_marker(line) {
            current = Some(kind);
            let rest = rest.trim_start_matches(|c: char| c == '*' || c.is_whitespace());
            let rest = rest.trim();
            if !rest.is_empty() {
                sections.bucket_mut(kind).push(rest.to_string());
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(kind) = current {
            sections.bucket_mut(kind).push(trimmed.to_string());
        }
    }

    sections
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEntry {
    Item { title: String, description: String },
    Line(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSection {
    pub title: String,
    pub entries: Vec<SectionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub sections: Vec<AnalysisSection>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn from_text(text: &str) -> Self {
        parse_text_sections(text).into()
    }

    pub fn section(&self, title: &str) -> Option<&AnalysisSection> {
        self.sections
            .iter()
            .find(|section| section.title.eq_ignore_ascii_case(title))
    }
}

impl From<TextSections> for Analysis {
    fn from(text: TextSections) -> Self {
        let sections = SectionKind::ALL
            .iter()
            .filter(|kind| !text.bucket(**kind).is_empty())
            .map(|kind| AnalysisSection {
                title: kind.title().to_string(),
                entries: text
                    .bucket(*kind)
                    .iter()
                    .cloned()
                    .map(SectionEntry::Line)
                    .collect(),
            })
            .collect();
        Self { sections }
    }
}

/// Normalises either analysis shape. A `sections` array always wins over
/// text, matching how the variants were told apart.
pub fn normalize_analysis(response: AnalyzeResponse) -> ClientResult<Analysis> {
    match response {
        AnalyzeResponse::Structured { sections } => Ok(Analysis {
            sections: sections
                .into_iter()
                .map(|section| AnalysisSection {
                    title: section.title.trim().to_string(),
                    entries: section
                        .items
                        .into_iter()
                        .map(|item| SectionEntry::Item {
                            title: item.title.trim().to_string(),
                            description: item.description.trim().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }),
        AnalyzeResponse::Text { analysis } => Ok(Analysis::from_text(&analysis)),
        AnalyzeResponse::Failed { error } => Err(ClientError::Backend(error)),
    }
}

#[cfg(test)]
#[path = "tests/analysis_tests.rs"]
mod tests;
