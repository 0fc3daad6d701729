//! View data for analysis and risk results, plus a markdown-flavoured text
//! rendering for terminal front ends.

use std::fmt::Write as _;

use crate::{
    analysis::{Analysis, SectionEntry},
    risk::{RiskAssessment, RiskColor},
};

pub const NO_SECTIONS_MESSAGE: &str = "No analysis sections found.";
pub const NO_SUMMARY_MESSAGE: &str = "No summary available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Bold(String),
    /// Bracketed placeholder such as `[DATE]`, stored without brackets.
    Placeholder(String),
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Span::Plain(last)) = spans.last_mut() {
        last.push_str(text);
    } else {
        spans.push(Span::Plain(text.to_string()));
    }
}

/// Converts `**bold**` and `[bracketed]` runs into spans. Unterminated
/// markup is left as plain text.
pub fn inline_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let bold = rest.find("**");
        let bracket = rest.find('[');
        let next = match (bold, bracket) {
            (Some(b), Some(k)) => Some(b.min(k)),
            (b, k) => b.or(k),
        };
        let Some(at) = next else {
            push_plain(&mut spans, rest);
            break;
        };

        push_plain(&mut spans, &rest[..at]);
        let tail = &rest[at..];

        if tail.starts_with("**") {
            match tail[2..].find("**") {
                Some(end) if end > 0 => {
                    spans.push(Span::Bold(tail[2..2 + end].to_string()));
                    rest = &tail[2 + end + 2..];
                }
                _ => {
                    push_plain(&mut spans, "**");
                    rest = &tail[2..];
                }
            }
        } else {
            match tail[1..].find(']') {
                Some(end) if end > 0 && !tail[1..1 + end].contains('[') => {
                    spans.push(Span::Placeholder(tail[1..1 + end].to_string()));
                    rest = &tail[1 + end + 1..];
                }
                _ => {
                    push_plain(&mut spans, "[");
                    rest = &tail[1..];
                }
            }
        }
    }

    spans
}

/// Splits `"12. text"` into `("12", "text")`.
pub fn split_numbered(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let after = line[digits..].strip_prefix('.')?;
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return None;
    }
    Some((&line[..digits], after.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Item {
        title: Vec<Span>,
        description: Vec<Span>,
    },
    Numbered {
        number: String,
        text: Vec<Span>,
    },
    Text(Vec<Span>),
}

impl Row {
    fn from_line(line: &str) -> Self {
        match split_numbered(line) {
            Some((number, text)) => Self::Numbered {
                number: number.to_string(),
                text: inline_spans(text),
            },
            None => Self::Text(inline_spans(line)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub heading: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisView {
    pub sections: Vec<SectionView>,
}

impl AnalysisView {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let sections = analysis
            .sections
            .iter()
            .map(|section| SectionView {
                heading: section.title.clone(),
                rows: section
                    .entries
                    .iter()
                    .map(|entry| match entry {
                        SectionEntry::Item { title, description } => Row::Item {
                            title: inline_spans(title),
                            description: inline_spans(description),
                        },
                        SectionEntry::Line(line) => Row::from_line(line),
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn render_text(&self) -> String {
        if self.sections.is_empty() {
            return format!("{NO_SECTIONS_MESSAGE}\n");
        }

        let mut out = String::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "## {}", section.heading);
            for row in &section.rows {
                match row {
                    Row::Item { title, description } => {
                        let title = spans_to_text(title);
                        let description = spans_to_text(description);
                        match (title.is_empty(), description.is_empty()) {
                            (false, false) => {
                                let _ = writeln!(out, "- **{title}**: {description}");
                            }
                            (false, true) => {
                                let _ = writeln!(out, "- **{title}**");
                            }
                            _ => {
                                let _ = writeln!(out, "- {description}");
                            }
                        }
                    }
                    Row::Numbered { number, text } => {
                        let _ = writeln!(out, "{number:>3}. {}", spans_to_text(text));
                    }
                    Row::Text(spans) => {
                        let _ = writeln!(out, "{}", spans_to_text(spans));
                    }
                }
            }
        }
        out
    }
}

pub fn spans_to_text(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.clone(),
            Span::Bold(text) => format!("**{text}**"),
            Span::Placeholder(text) => format!("[{text}]"),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcernView {
    pub title: String,
    pub level: String,
    pub color: RiskColor,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskView {
    pub score: String,
    pub summary: String,
    pub concerns: Vec<ConcernView>,
}

impl RiskView {
    pub fn from_assessment(risk: &RiskAssessment) -> Self {
        let score = match risk.score {
            Some(score) if score.fract() == 0.0 => format!("{score:.0}"),
            Some(score) => format!("{score:.1}"),
            None => "N/A".to_string(),
        };
        let summary = if risk.summary.is_empty() {
            NO_SUMMARY_MESSAGE.to_string()
        } else {
            risk.summary.clone()
        };
        let concerns = risk
            .concerns
            .iter()
            .map(|concern| ConcernView {
                title: concern.title.clone(),
                level: concern
                    .level
                    .as_deref()
                    .map(str::to_ascii_uppercase)
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                color: concern.color(),
                description: concern.description.clone(),
            })
            .collect();
        Self {
            score,
            summary,
            concerns,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## Risk Score: {}/10", self.score);
        let _ = writeln!(out, "{}", self.summary);
        out.push('\n');
        let _ = writeln!(out, "## Concerns");
        if self.concerns.is_empty() {
            let _ = writeln!(out, "No specific concerns identified.");
        }
        for concern in &self.concerns {
            let _ = writeln!(
                out,
                "- [{} / {}] {}",
                concern.level,
                concern.color.as_str(),
                concern.title
            );
            if !concern.description.is_empty() {
                let _ = writeln!(out, "  {}", concern.description);
            }
        }
        out
    }
}

pub fn render_analysis(analysis: &Analysis) -> String {
    AnalysisView::from_analysis(analysis).render_text()
}

pub fn render_risk(risk: &RiskAssessment) -> String {
    RiskView::from_assessment(risk).render_text()
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
