use crate::config::GenerationConfig;
use serde::{Deserialize, Serialize};

/// Structural plan for a draft. Created once per generation run and
/// immutable once accepted; the draft flow consumes it section by section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub thesis: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub audience: String,
    pub sections: Vec<OutlineSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSection {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsection {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Why a completion could not be accepted as an outline. The orchestrator
/// feeds the message back into the retry prompt as a corrective
/// instruction.
#[derive(Debug)]
pub enum OutlineShapeError {
    NotJson(String),
    MissingTitle,
    SectionCount { got: usize, min: usize, max: usize },
    UntitledSection(usize),
}

impl std::fmt::Display for OutlineShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJson(detail) => write!(f, "response is not a valid JSON outline: {detail}"),
            Self::MissingTitle => write!(f, "outline title must be non-empty"),
            Self::SectionCount { got, min, max } => {
                write!(f, "expected {min}-{max} sections, got {got}")
            }
            Self::UntitledSection(index) => {
                write!(f, "section {} has an empty title", index + 1)
            }
        }
    }
}

/// Strip a Markdown code fence if the responder wrapped the JSON in one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line; a single-line
    // fence has no newline and keeps its whole body.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse and shape-check a backend completion into an outline.
pub fn parse_outline(
    completion: &str,
    generation: &GenerationConfig,
) -> Result<Outline, OutlineShapeError> {
    let body = strip_code_fence(completion);
    let outline: Outline =
        serde_json::from_str(body).map_err(|e| OutlineShapeError::NotJson(e.to_string()))?;

    if outline.title.trim().is_empty() {
        return Err(OutlineShapeError::MissingTitle);
    }

    let count = outline.sections.len();
    if count < generation.min_sections || count > generation.max_sections {
        return Err(OutlineShapeError::SectionCount {
            got: count,
            min: generation.min_sections,
            max: generation.max_sections,
        });
    }

    if let Some(index) = outline
        .sections
        .iter()
        .position(|s| s.title.trim().is_empty())
    {
        return Err(OutlineShapeError::UntitledSection(index));
    }

    Ok(outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json(sections: usize) -> String {
        let sections: Vec<serde_json::Value> = (0..sections)
            .map(|i| serde_json::json!({"title": format!("Section {i}"), "description": "d"}))
            .collect();
        serde_json::json!({
            "title": "T",
            "thesis": "Th",
            "classification": "essay",
            "audience": "general",
            "sections": sections
        })
        .to_string()
    }

    #[test]
    fn parses_a_valid_outline() {
        let generation = GenerationConfig::default();
        let outline = parse_outline(&valid_json(5), &generation).unwrap();

        assert_eq!(outline.title, "T");
        assert_eq!(outline.sections.len(), 5);
    }

    #[test]
    fn tolerates_code_fences() {
        let generation = GenerationConfig::default();
        let fenced = format!("```json\n{}\n```", valid_json(6));

        let outline = parse_outline(&fenced, &generation).unwrap();
        assert_eq!(outline.sections.len(), 6);
    }

    #[test]
    fn tolerates_a_single_line_code_fence() {
        let generation = GenerationConfig::default();
        // No newline after the opening fence at all.
        let fenced = format!("```{}```", valid_json(5));

        let outline = parse_outline(&fenced, &generation).unwrap();
        assert_eq!(outline.sections.len(), 5);
    }

    #[test]
    fn rejects_wrong_section_count() {
        let generation = GenerationConfig::default();
        let err = parse_outline(&valid_json(2), &generation).unwrap_err();

        assert!(matches!(
            err,
            OutlineShapeError::SectionCount { got: 2, min: 5, max: 7 }
        ));
        assert!(err.to_string().contains("expected 5-7 sections, got 2"));
    }

    #[test]
    fn rejects_non_json() {
        let generation = GenerationConfig::default();
        let err = parse_outline("Here is your outline: ...", &generation).unwrap_err();
        assert!(matches!(err, OutlineShapeError::NotJson(_)));
    }

    #[test]
    fn rejects_untitled_section() {
        let generation = GenerationConfig::default();
        let json = serde_json::json!({
            "title": "T",
            "thesis": "Th",
            "sections": [
                {"title": "A"}, {"title": ""}, {"title": "C"},
                {"title": "D"}, {"title": "E"}
            ]
        })
        .to_string();

        let err = parse_outline(&json, &generation).unwrap_err();
        assert!(matches!(err, OutlineShapeError::UntitledSection(1)));
    }

    #[test]
    fn subsections_are_optional_and_preserved() {
        let generation = GenerationConfig::default();
        let json = serde_json::json!({
            "title": "T",
            "thesis": "Th",
            "sections": [
                {"title": "A", "subsections": [{"title": "A.1", "description": "x"}]},
                {"title": "B"}, {"title": "C"}, {"title": "D"}, {"title": "E"}
            ]
        })
        .to_string();

        let outline = parse_outline(&json, &generation).unwrap();
        assert_eq!(outline.sections[0].subsections.len(), 1);
        assert!(outline.sections[1].subsections.is_empty());
    }
}
