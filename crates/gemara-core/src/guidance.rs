//! Layer 1 guidance documents.

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// A guidance document: ordered categories of guidelines.
///
/// Guidance is terminal in the reference graph; it holds no outbound
/// references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GuidanceDocument {
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub guidelines: Vec<Guideline>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Guideline {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl GuidanceDocument {
    /// Number of guidelines across all categories.
    pub fn guideline_count(&self) -> usize {
        self.categories.iter().map(|c| c.guidelines.len()).sum()
    }

    /// Find a guideline by id in any category.
    pub fn find_guideline(&self, id: &str) -> Option<&Guideline> {
        self.categories
            .iter()
            .flat_map(|c| &c.guidelines)
            .find(|g| g.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIST_CSF: &str = r#"
metadata:
  id: nist-csf
  title: NIST Cybersecurity Framework
  author: NIST
categories:
  - id: ID
    title: Identify
    guidelines:
      - id: ID.AM-1
        title: Physical devices are inventoried
      - id: ID.AM-2
        title: Software platforms are inventoried
  - id: PR
    title: Protect
    guidelines:
      - id: PR.AC-1
        title: Identities are managed
"#;

    #[test]
    fn parses_categories_and_guidelines() {
        let doc: GuidanceDocument = serde_yaml::from_str(NIST_CSF).unwrap();
        assert_eq!(doc.metadata.id, "nist-csf");
        assert_eq!(doc.categories.len(), 2);
        assert_eq!(doc.guideline_count(), 3);
    }

    #[test]
    fn finds_guidelines_across_categories() {
        let doc: GuidanceDocument = serde_yaml::from_str(NIST_CSF).unwrap();
        let g = doc.find_guideline("PR.AC-1").unwrap();
        assert_eq!(g.title, "Identities are managed");
        assert!(doc.find_guideline("RS.CO-1").is_none());
    }

    #[test]
    fn ignores_unknown_fields() {
        let yaml = "metadata:\n  id: x\n  title: X\nextra-section:\n  anything: true\n";
        let doc: GuidanceDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.metadata.title, "X");
        assert!(doc.categories.is_empty());
    }
}
