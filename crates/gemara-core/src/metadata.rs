//! Shared document metadata and cross-layer mapping types.

use serde::{Deserialize, Serialize};

/// Metadata block carried by every Gemara document.
///
/// Layer-specific fields (`organization-id`, `objective`) are optional so
/// the same struct serves all layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Metadata {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicability: Option<Applicability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

/// Where a guidance document applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Applicability {
    pub jurisdictions: Vec<String>,
    pub technology_domains: Vec<String>,
    pub industry_sectors: Vec<String>,
}

impl Applicability {
    /// Every applicability term, regardless of category.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.jurisdictions
            .iter()
            .chain(&self.technology_domains)
            .chain(&self.industry_sectors)
            .map(String::as_str)
    }
}

/// An outbound reference from one artifact to another.
///
/// `reference-id` names the target artifact; `entries` point at specific
/// items inside it (guidelines, controls) with an optional weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Mapping {
    pub reference_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<MappingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A weighted pointer at one item inside the mapped artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MappingEntry {
    pub reference_id: String,
    pub strength: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Total number of entries across a list of mappings.
pub fn total_entries(mappings: &[Mapping]) -> usize {
    mappings.iter().map(|m| m.entries.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_uses_kebab_case_keys() {
        let yaml = r#"
id: nist-csf
title: NIST CSF
publication-date: "2024-02-26"
document-type: Framework
applicability:
  technology-domains: [Cloud]
  industry-sectors: [Finance]
"#;
        let meta: Metadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.id, "nist-csf");
        assert_eq!(meta.publication_date.as_deref(), Some("2024-02-26"));
        assert_eq!(meta.document_type.as_deref(), Some("Framework"));
        let app = meta.applicability.unwrap();
        assert_eq!(app.technology_domains, vec!["Cloud"]);
        assert!(app.jurisdictions.is_empty());
    }

    #[test]
    fn applicability_terms_cover_all_categories() {
        let app = Applicability {
            jurisdictions: vec!["United States".into()],
            technology_domains: vec!["Cloud".into()],
            industry_sectors: vec!["Finance".into()],
        };
        let terms: Vec<&str> = app.terms().collect();
        assert_eq!(terms, vec!["United States", "Cloud", "Finance"]);
    }

    #[test]
    fn mapping_entries_default_to_empty() {
        let mapping: Mapping = serde_yaml::from_str("reference-id: nist-csf").unwrap();
        assert_eq!(mapping.reference_id, "nist-csf");
        assert!(mapping.entries.is_empty());
    }

    #[test]
    fn total_entries_sums_all_mappings() {
        let mappings = vec![
            Mapping {
                reference_id: "a".into(),
                entries: vec![MappingEntry::default(), MappingEntry::default()],
                remarks: None,
            },
            Mapping {
                reference_id: "b".into(),
                entries: vec![MappingEntry::default()],
                remarks: None,
            },
        ];
        assert_eq!(total_entries(&mappings), 3);
    }
}
