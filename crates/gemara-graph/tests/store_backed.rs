//! Relationship resolution over artifacts that live only in the store.
//!
//! The cache starts empty; every lookup has to fill from disk.

use std::sync::Arc;

use gemara_core::Layer;
use gemara_graph::{CatalogQueries, RelationshipResolver};
use gemara_store::{ArtifactCache, ArtifactStore};

const GUIDANCE: &str = "metadata:\n  id: owasp-asvs\n  title: OWASP ASVS\n";

const CATALOG: &str = r#"
metadata:
  id: web-catalog
  title: Web Controls
control-families:
  - id: AUTH
    title: Authentication
    controls:
      - id: web-mfa
        title: Require MFA
        objective: Second factor for all logins
        guideline-mappings:
          - reference-id: owasp-asvs
            entries:
              - reference-id: V2.8
                strength: 7
"#;

const POLICY: &str = r#"
metadata:
  id: web-policy
  title: Web Policy
control-references:
  - reference-id: web-mfa
"#;

fn seeded() -> (tempfile::TempDir, ArtifactCache) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactStore::open(dir.path()).unwrap());
    store.store_raw(Layer::Guidance, GUIDANCE).unwrap();
    store.store_raw(Layer::Controls, CATALOG).unwrap();
    store.store_raw(Layer::Policy, POLICY).unwrap();
    (dir, ArtifactCache::new(Some(store)))
}

#[test]
fn resolves_through_cache_fill() {
    let (_dir, cache) = seeded();
    assert!(cache.is_empty());
    let resolver = RelationshipResolver::new(&cache);

    let guidance = resolver.resolve("owasp-asvs", Layer::Guidance).unwrap();
    assert_eq!(guidance.referenced_by_labels(), vec!["web-mfa (Layer 2)"]);

    let control = resolver.resolve("web-mfa", Layer::Controls).unwrap();
    assert_eq!(control.reference_labels(), vec!["owasp-asvs (Layer 1)"]);
    assert_eq!(control.referenced_by_labels(), vec!["web-policy (Layer 3)"]);

    let policy = resolver.resolve("web-policy", Layer::Policy).unwrap();
    assert_eq!(policy.reference_labels(), vec!["web-mfa (Layer 2)"]);

    assert_eq!(cache.len(Layer::Controls), 1);
    assert_eq!(cache.len(Layer::Policy), 1);
}

#[test]
fn queries_see_stored_artifacts() {
    let (_dir, cache) = seeded();
    let queries = CatalogQueries::new(&cache);

    let report = queries.guideline_mappings("web-mfa", true).unwrap();
    assert_eq!(report.catalog_id, "web-catalog");
    assert_eq!(report.mappings[0].guidance.as_ref().unwrap().title, "OWASP ASVS");
    assert_eq!(queries.search_guidance("asvs").unwrap().len(), 1);
}
