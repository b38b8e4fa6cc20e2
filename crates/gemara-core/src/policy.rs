//! Layer 3 policy documents.

use serde::{Deserialize, Serialize};

use crate::metadata::{Mapping, Metadata};

/// An organizational policy.
///
/// Policies are roots of the reference graph: they point at guidance and
/// controls, and nothing in the model points at them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PolicyDocument {
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guidance_references: Vec<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub control_references: Vec<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<PolicyRequirement>,
}

/// An organization-specific requirement stated by the policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PolicyRequirement {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applicability: Vec<String>,
}

impl PolicyDocument {
    /// Whether any control reference targets the given control id.
    pub fn references_control(&self, control_id: &str) -> bool {
        self.control_references
            .iter()
            .any(|m| m.reference_id == control_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references_and_requirements() {
        let yaml = r#"
metadata:
  id: acme-cloud-policy
  title: ACME Cloud Policy
  organization-id: acme
  objective: Keep clusters locked down
guidance-references:
  - reference-id: nist-csf
control-references:
  - reference-id: k8s-rbac
  - reference-id: ctrl-missing
requirements:
  - id: REQ-1
    text: All clusters enforce RBAC
"#;
        let policy: PolicyDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.metadata.organization_id.as_deref(), Some("acme"));
        assert_eq!(policy.guidance_references.len(), 1);
        assert!(policy.references_control("k8s-rbac"));
        assert!(policy.references_control("ctrl-missing"));
        assert!(!policy.references_control("k8s-audit"));
        assert_eq!(policy.requirements[0].id, "REQ-1");
    }
}
