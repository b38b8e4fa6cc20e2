//! Search, listing and reporting over cached artifacts.
//!
//! All text matching is case-insensitive substring matching. Results come
//! back in catalog/document order with artifacts visited in id order.

use gemara_core::{Catalog, Control, ControlFamily, GuidanceDocument, Layer, Mapping, MappingEntry};
use gemara_core::metadata::total_entries;
use gemara_store::ArtifactCache;
use serde::Serialize;

use crate::error::ResolveError;
use crate::resolver::{catalogs, find_control, policies};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceMatch {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
}

impl From<&GuidanceDocument> for GuidanceMatch {
    fn from(doc: &GuidanceDocument) -> Self {
        Self {
            id: doc.metadata.id.clone(),
            title: doc.metadata.title.clone(),
            description: doc.metadata.description.clone(),
            author: doc.metadata.author.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlSummary {
    pub control_id: String,
    pub title: String,
    pub objective: String,
    pub catalog_id: String,
    pub family_id: String,
}

impl ControlSummary {
    fn new(catalog: &Catalog, family: &ControlFamily, control: &Control) -> Self {
        Self {
            control_id: control.id.clone(),
            title: control.title.clone(),
            objective: control.objective.clone(),
            catalog_id: catalog.metadata.id.clone(),
            family_id: family.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyMatch {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

/// Guidance document facts attached to a mapping report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceSummary {
    pub id: String,
    pub title: String,
    pub version: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingReport {
    pub reference_id: String,
    pub entries: Vec<MappingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Present only when details were requested and the guidance exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<GuidanceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidelineMappingReport {
    pub control_id: String,
    pub control_title: String,
    pub catalog_id: String,
    pub family_id: String,
    pub mappings: Vec<MappingReport>,
    pub total_documents: usize,
    pub total_entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicableArtifacts {
    pub guidance: Vec<GuidanceMatch>,
    pub controls: Vec<ControlSummary>,
}

impl ApplicableArtifacts {
    pub fn is_empty(&self) -> bool {
        self.guidance.is_empty() && self.controls.is_empty()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Whether any of `terms` contains any of `filters` (already lowercased).
fn any_term_matches<'t>(mut terms: impl Iterator<Item = &'t str>, filters: &[String]) -> bool {
    terms.any(|term| {
        let term = term.to_lowercase();
        filters.iter().any(|f| term.contains(f.as_str()))
    })
}

fn lowered(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_lowercase())
        .collect()
}

pub struct CatalogQueries<'a> {
    cache: &'a ArtifactCache,
}

impl<'a> CatalogQueries<'a> {
    pub fn new(cache: &'a ArtifactCache) -> Self {
        Self { cache }
    }

    /// Guidance whose title, description or author contains `term`.
    pub fn search_guidance(&self, term: &str) -> Result<Vec<GuidanceMatch>, ResolveError> {
        let needle = term.to_lowercase();
        let all = self.cache.all(Layer::Guidance)?;
        Ok(all
            .iter()
            .filter_map(|a| a.as_guidance())
            .filter(|g| {
                let m = &g.metadata;
                contains_ci(&m.title, &needle)
                    || contains_ci(&m.description, &needle)
                    || contains_ci(&m.author, &needle)
            })
            .map(GuidanceMatch::from)
            .collect())
    }

    /// Controls whose title or objective contains `term`.
    ///
    /// With `technology`, a control must also carry an assessment
    /// requirement whose applicability mentions it.
    pub fn search_controls(
        &self,
        term: &str,
        technology: Option<&str>,
    ) -> Result<Vec<ControlSummary>, ResolveError> {
        let needle = term.to_lowercase();
        let technology: Vec<String> = technology.map(|t| vec![t.to_lowercase()]).unwrap_or_default();
        let all = self.cache.all(Layer::Controls)?;

        let mut matches = Vec::new();
        for catalog in catalogs(&all) {
            for (family, control) in catalog.controls() {
                let text = contains_ci(&control.title, &needle) || contains_ci(&control.objective, &needle);
                let tech = technology.is_empty() || any_term_matches(control.applicability_terms(), &technology);
                if text && tech {
                    matches.push(ControlSummary::new(catalog, family, control));
                }
            }
        }
        Ok(matches)
    }

    /// Policies whose id, title or objective contains `term`.
    pub fn search_policies(&self, term: &str) -> Result<Vec<PolicyMatch>, ResolveError> {
        let needle = term.to_lowercase();
        let all = self.cache.all(Layer::Policy)?;
        Ok(policies(&all)
            .filter(|p| {
                let m = &p.metadata;
                contains_ci(&m.id, &needle)
                    || contains_ci(&m.title, &needle)
                    || m.objective.as_deref().is_some_and(|o| contains_ci(o, &needle))
            })
            .map(|p| PolicyMatch {
                id: p.metadata.id.clone(),
                title: p.metadata.title.clone(),
                objective: p.metadata.objective.clone(),
            })
            .collect())
    }

    /// Every control across all catalogs, optionally only those mapping to
    /// the guidance id `layer1_reference`.
    pub fn list_controls(&self, layer1_reference: Option<&str>) -> Result<Vec<ControlSummary>, ResolveError> {
        let all = self.cache.all(Layer::Controls)?;
        let mut out = Vec::new();
        for catalog in catalogs(&all) {
            for (family, control) in catalog.controls() {
                if layer1_reference.map_or(true, |g| control.references_guidance(g)) {
                    out.push(ControlSummary::new(catalog, family, control));
                }
            }
        }
        Ok(out)
    }

    /// Guideline mappings of one control, with optional guidance details.
    pub fn guideline_mappings(
        &self,
        control_id: &str,
        include_guidance_details: bool,
    ) -> Result<GuidelineMappingReport, ResolveError> {
        let all = self.cache.all(Layer::Controls)?;
        let hit = find_control(catalogs(&all), control_id).ok_or_else(|| ResolveError::NotFound {
            layer: Layer::Controls,
            id: control_id.to_string(),
        })?;

        let mut mappings = Vec::with_capacity(hit.control.guideline_mappings.len());
        for mapping in &hit.control.guideline_mappings {
            let guidance = if include_guidance_details {
                self.guidance_summary(mapping)?
            } else {
                None
            };
            mappings.push(MappingReport {
                reference_id: mapping.reference_id.clone(),
                entries: mapping.entries.clone(),
                remarks: mapping.remarks.clone(),
                guidance,
            });
        }

        Ok(GuidelineMappingReport {
            control_id: hit.control.id.clone(),
            control_title: hit.control.title.clone(),
            catalog_id: hit.catalog.metadata.id.clone(),
            family_id: hit.family.id.clone(),
            total_documents: mappings.len(),
            total_entries: total_entries(&hit.control.guideline_mappings),
            mappings,
        })
    }

    fn guidance_summary(&self, mapping: &Mapping) -> Result<Option<GuidanceSummary>, ResolveError> {
        let found = self.cache.get(Layer::Guidance, &mapping.reference_id)?;
        Ok(found.as_deref().and_then(|a| a.as_guidance()).map(|g| GuidanceSummary {
            id: mapping.reference_id.clone(),
            title: g.metadata.title.clone(),
            version: g.metadata.version.clone(),
            author: g.metadata.author.clone(),
        }))
    }

    /// Guidance and controls in scope for the given filters.
    ///
    /// Guidance matches when any applicability term (jurisdiction,
    /// technology domain, industry sector) contains a boundary or
    /// technology filter. A control matches when any assessment
    /// requirement applicability term contains a technology or provider
    /// filter. With no filters of the relevant kind nothing matches.
    pub fn find_applicable(
        &self,
        boundaries: &[String],
        technologies: &[String],
        providers: &[String],
    ) -> Result<ApplicableArtifacts, ResolveError> {
        let guidance_filters: Vec<String> = lowered(boundaries).into_iter().chain(lowered(technologies)).collect();
        let control_filters: Vec<String> = lowered(technologies).into_iter().chain(lowered(providers)).collect();
        let mut result = ApplicableArtifacts::default();

        if !guidance_filters.is_empty() {
            let all = self.cache.all(Layer::Guidance)?;
            result.guidance = all
                .iter()
                .filter_map(|a| a.as_guidance())
                .filter(|g| {
                    g.metadata
                        .applicability
                        .as_ref()
                        .is_some_and(|app| any_term_matches(app.terms(), &guidance_filters))
                })
                .map(GuidanceMatch::from)
                .collect();
        }

        if !control_filters.is_empty() {
            let all = self.cache.all(Layer::Controls)?;
            for catalog in catalogs(&all) {
                for (family, control) in catalog.controls() {
                    if any_term_matches(control.applicability_terms(), &control_filters) {
                        result.controls.push(ControlSummary::new(catalog, family, control));
                    }
                }
            }
        }

        tracing::debug!(
            guidance = result.guidance.len(),
            controls = result.controls.len(),
            "applicable artifacts found"
        );
        Ok(result)
    }
}
