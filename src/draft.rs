use serde::{Deserialize, Serialize};

/// The generated document, built incrementally: one `SectionContent` is
/// appended per accepted generation unit, always in outline order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub thesis: String,
    pub sections: Vec<SectionContent>,
    /// Sections whose bounded retries were exhausted. Partial progress is
    /// preserved and the gaps are reported, never silently dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<SectionGap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionContent {
    pub title: String,
    pub text: String,
    /// Sources of the snippets that grounded this section.
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionGap {
    pub title: String,
    /// Position in the outline, so the gap can be rendered in place.
    pub index: usize,
    pub reasons: Vec<String>,
}

impl Draft {
    pub fn new(title: impl Into<String>, thesis: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            thesis: thesis.into(),
            sections: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Plain Markdown serialization of the draft, gaps marked explicitly
    /// at their outline positions.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n> {}\n", self.title, self.thesis);
        let total = self.sections.len() + self.gaps.len();
        let mut sections = self.sections.iter();

        for position in 0..total {
            if let Some(gap) = self.gaps.iter().find(|g| g.index == position) {
                out.push_str(&format!(
                    "\n## {}\n\n*[section failed: {}]*\n",
                    gap.title,
                    gap.reasons.join("; ")
                ));
            } else if let Some(section) = sections.next() {
                out.push_str(&format!("\n## {}\n\n{}\n", section.title, section.text));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_draft_has_no_gaps() {
        let mut draft = Draft::new("T", "Th");
        draft.sections.push(SectionContent {
            title: "A".into(),
            text: "body".into(),
            sources: vec![],
        });
        assert!(draft.is_complete());
    }

    #[test]
    fn markdown_renders_sections_in_order() {
        let mut draft = Draft::new("Title", "The thesis.");
        for name in ["One", "Two"] {
            draft.sections.push(SectionContent {
                title: name.into(),
                text: format!("{name} body"),
                sources: vec![],
            });
        }

        let md = draft.to_markdown();
        let one = md.find("## One").unwrap();
        let two = md.find("## Two").unwrap();
        assert!(one < two);
        assert!(md.starts_with("# Title"));
    }

    #[test]
    fn markdown_marks_gaps_explicitly() {
        let mut draft = Draft::new("Title", "Thesis");
        draft.sections.push(SectionContent {
            title: "Kept".into(),
            text: "body".into(),
            sources: vec![],
        });
        draft.gaps.push(SectionGap {
            title: "Dropped".into(),
            index: 1,
            reasons: vec!["retries exhausted".into()],
        });

        let md = draft.to_markdown();
        assert!(md.contains("section failed"));
        assert!(md.contains("## Dropped"));
        assert!(!draft.is_complete());
    }
}
