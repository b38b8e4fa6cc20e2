//! Layer 2 control catalogs.
//!
//! A catalog groups controls into families. Each control may carry
//! guideline mappings, the outbound references to layer 1 guidance.

use serde::{Deserialize, Serialize};

use crate::metadata::{Mapping, Metadata};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Catalog {
    pub metadata: Metadata,
    pub control_families: Vec<ControlFamily>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ControlFamily {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Control {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub objective: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guideline_mappings: Vec<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub threat_mappings: Vec<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assessment_requirements: Vec<AssessmentRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AssessmentRequirement {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applicability: Vec<String>,
}

impl Catalog {
    /// Every control in the catalog paired with its family, in document order.
    pub fn controls(&self) -> impl Iterator<Item = (&ControlFamily, &Control)> {
        self.control_families
            .iter()
            .flat_map(|family| family.controls.iter().map(move |control| (family, control)))
    }

    /// Find a control by id in any family.
    pub fn find_control(&self, id: &str) -> Option<(&ControlFamily, &Control)> {
        self.controls().find(|(_, control)| control.id == id)
    }

    /// Total number of controls across all families.
    pub fn control_count(&self) -> usize {
        self.control_families.iter().map(|f| f.controls.len()).sum()
    }
}

impl Control {
    /// Whether any guideline mapping targets the given guidance id.
    pub fn references_guidance(&self, guidance_id: &str) -> bool {
        self.guideline_mappings
            .iter()
            .any(|m| m.reference_id == guidance_id)
    }

    /// Every assessment-requirement applicability term.
    pub fn applicability_terms(&self) -> impl Iterator<Item = &str> {
        self.assessment_requirements
            .iter()
            .flat_map(|r| r.applicability.iter().map(String::as_str))
    }
}
