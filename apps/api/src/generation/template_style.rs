//! Template styles: map a resume template id to the tone used when tailoring.
//!
//! A style only changes prompt wording. The output schema is the same for every style.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateStyle {
    #[default]
    MinimalPro,
    ModernAts,
    TechFocused,
    FresherGrad,
    LeadershipEdge,
    Academic,
}

/// Public description of a template, as served by `GET /resume/templates`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 6] = [
        TemplateStyle::MinimalPro,
        TemplateStyle::ModernAts,
        TemplateStyle::TechFocused,
        TemplateStyle::FresherGrad,
        TemplateStyle::LeadershipEdge,
        TemplateStyle::Academic,
    ];

    /// Resolves a template id. Unknown or missing ids get the default style.
    pub fn from_id(id: Option<&str>) -> Self {
        let id = id.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|style| style.id() == id)
            .unwrap_or_default()
    }

    pub fn id(self) -> &'static str {
        match self {
            TemplateStyle::MinimalPro => "minimal-pro",
            TemplateStyle::ModernAts => "modern-ats",
            TemplateStyle::TechFocused => "tech-focused",
            TemplateStyle::FresherGrad => "fresher-grad",
            TemplateStyle::LeadershipEdge => "leadership-edge",
            TemplateStyle::Academic => "academic",
        }
    }

    /// Tone and density steering for the tailoring prompt.
    pub fn density_instruction(self) -> &'static str {
        match self {
            TemplateStyle::LeadershipEdge => {
                "Achievement-focused, executive tone, emphasis on ROI and leadership."
            }
            TemplateStyle::TechFocused => {
                "Densely packed with technical stack details, specific tools, and architectural impact."
            }
            TemplateStyle::Academic => {
                "Detailed, formal, focusing on publications and research methodology."
            }
            TemplateStyle::MinimalPro | TemplateStyle::ModernAts | TemplateStyle::FresherGrad => {
                "Concise and impact-focused"
            }
        }
    }

    pub fn info(self) -> TemplateInfo {
        let (name, description, category) = match self {
            TemplateStyle::MinimalPro => (
                "Minimal Pro",
                "Clean single-column layout with centered header. Works for any industry.",
                "Professional",
            ),
            TemplateStyle::ModernAts => (
                "Modern ATS",
                "Left-aligned, keyword-friendly layout tuned for applicant tracking systems.",
                "ATS-Optimized",
            ),
            TemplateStyle::TechFocused => (
                "Tech Focused",
                "Skills-first layout with dense technical detail for engineering roles.",
                "Technology",
            ),
            TemplateStyle::FresherGrad => (
                "Fresher Grad",
                "Education and projects up front for students and recent graduates.",
                "Entry Level",
            ),
            TemplateStyle::LeadershipEdge => (
                "Leadership Edge",
                "Executive summary and outcome-driven achievements for senior leaders.",
                "Executive",
            ),
            TemplateStyle::Academic => (
                "Academic",
                "Formal CV layout highlighting research, publications and teaching.",
                "Academic",
            ),
        };
        TemplateInfo {
            id: self.id(),
            name,
            description,
            category,
        }
    }
}

pub fn template_catalog() -> Vec<TemplateInfo> {
    TemplateStyle::ALL.into_iter().map(TemplateStyle::info).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_round_trips_every_style() {
        for style in TemplateStyle::ALL {
            assert_eq!(TemplateStyle::from_id(Some(style.id())), style);
        }
    }

    #[test]
    fn test_unknown_or_missing_id_is_default() {
        assert_eq!(TemplateStyle::from_id(Some("neon-retro")), TemplateStyle::MinimalPro);
        assert_eq!(TemplateStyle::from_id(None), TemplateStyle::MinimalPro);
    }

    #[test]
    fn test_from_id_ignores_case_and_whitespace() {
        assert_eq!(
            TemplateStyle::from_id(Some("  Leadership-Edge ")),
            TemplateStyle::LeadershipEdge
        );
    }

    #[test]
    fn test_styles_steer_tone_differently() {
        assert!(TemplateStyle::LeadershipEdge
            .density_instruction()
            .contains("executive"));
        assert!(TemplateStyle::TechFocused
            .density_instruction()
            .contains("technical"));
        assert!(TemplateStyle::Academic.density_instruction().contains("formal"));
        assert_eq!(
            TemplateStyle::MinimalPro.density_instruction(),
            "Concise and impact-focused"
        );
    }

    #[test]
    fn test_serde_uses_template_ids() {
        let json = serde_json::to_string(&TemplateStyle::TechFocused).unwrap();
        assert_eq!(json, "\"tech-focused\"");
    }

    #[test]
    fn test_catalog_lists_unique_ids() {
        let catalog = template_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), TemplateStyle::ALL.len());
    }
}
