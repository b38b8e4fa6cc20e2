//! Validate-then-store lifecycle across gemara-schema, gemara-store and
//! the CLI application context.
//!
//! Covers round trip through both retrieval paths, idempotent re-store,
//! index consistency, the validation gate, and index recovery after the
//! index file is lost.

use std::path::{Path, PathBuf};

use gemara_cli::config::{ConfigOverrides, GemaraConfig};
use gemara_cli::context::{AppContext, StoreOutcome};
use gemara_core::{Artifact, Layer};
use gemara_schema::FailureClass;
use gemara_store::{ArtifactStore, IndexProblem, INDEX_FILE};

const GUIDANCE: &str = "\
metadata:
  id: nist-csf
  title: NIST CSF
  author: NIST
  publication-date: 2024-02-26
  document-type: Framework
categories:
  - id: ID
    title: Identify
    guidelines:
      - id: ID.AM-1
        title: Physical devices and systems are inventoried
";

const CATALOG: &str = "\
metadata:
  id: k8s-catalog
  title: Kubernetes Controls
control-families:
  - id: access
    title: Access Control
    controls:
      - id: k8s-rbac
        title: Enforce RBAC
        objective: Restrict cluster access to least privilege
        guideline-mappings:
          - reference-id: nist-csf
            entries:
              - reference-id: ID.AM-1
                strength: 5
";

const POLICY: &str = "\
metadata:
  id: acme-cloud-policy
  title: ACME Cloud Policy
control-references:
  - reference-id: k8s-rbac
";

fn schema_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas")
}

fn context(artifacts: &Path) -> AppContext {
    let config = GemaraConfig::from_lookup(|_| None)
        .unwrap()
        .with_overrides(ConfigOverrides {
            artifacts_dir: Some(artifacts.to_path_buf()),
            schema_dir: Some(schema_dir()),
            ..ConfigOverrides::default()
        })
        .unwrap();
    AppContext::new(config).unwrap()
}

async fn store(ctx: &AppContext, layer: Layer, content: &str) -> String {
    match ctx.store_document(layer, content).await.unwrap() {
        StoreOutcome::Stored { id, .. } => id.as_str().to_string(),
        StoreOutcome::Rejected(report) => panic!("document rejected: {:?}", report.details),
    }
}

#[tokio::test]
async fn stored_documents_round_trip_through_both_read_paths() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let store = ctx.require_store().unwrap();

    for (layer, doc, id) in [
        (Layer::Guidance, GUIDANCE, "nist-csf"),
        (Layer::Controls, CATALOG, "k8s-catalog"),
        (Layer::Policy, POLICY, "acme-cloud-policy"),
    ] {
        assert_eq!(crate::store(&ctx, layer, doc).await, id);
        assert_eq!(store.retrieve_raw(layer, id).unwrap(), doc);
        assert_eq!(
            store.retrieve(layer, id).unwrap(),
            Artifact::from_yaml(layer, doc).unwrap()
        );
    }
}

#[tokio::test]
async fn restoring_replaces_content_and_keeps_one_index_entry() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    store(&ctx, Layer::Guidance, GUIDANCE).await;

    let revised = GUIDANCE.replace("title: NIST CSF", "title: NIST CSF 2.0");
    store(&ctx, Layer::Guidance, &revised).await;

    let store = ctx.require_store().unwrap();
    let entries = store.list(Layer::Guidance).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "NIST CSF 2.0");
    assert_eq!(store.retrieve_raw(Layer::Guidance, "nist-csf").unwrap(), revised);
}

#[tokio::test]
async fn ids_appear_in_the_index_only_after_storing() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let store = ctx.require_store().unwrap();

    assert!(!store.contains(Layer::Controls, "k8s-catalog"));
    assert!(store.list(Layer::Controls).unwrap().is_empty());

    crate::store(&ctx, Layer::Controls, CATALOG).await;
    let ids: Vec<String> = store
        .list(Layer::Controls)
        .unwrap()
        .into_iter()
        .map(|e| e.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["k8s-catalog".to_string()]);
    assert!(store.list(Layer::Guidance).unwrap().is_empty());

    let reopened = ArtifactStore::open(dir.path()).unwrap();
    assert!(reopened.contains(Layer::Controls, "k8s-catalog"));
}

#[tokio::test]
async fn missing_required_field_blocks_the_write() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let untitled = GUIDANCE.replace("  title: NIST CSF\n", "");
    let outcome = ctx.store_document(Layer::Guidance, &untitled).await.unwrap();
    let StoreOutcome::Rejected(report) = outcome else {
        panic!("a guidance document without a title must be rejected");
    };
    assert!(!report.valid);
    assert_eq!(report.failure, Some(FailureClass::Concreteness));
    assert!(report.mentions_field("metadata.title"), "details: {:?}", report.details);

    let store = ctx.require_store().unwrap();
    assert!(store.list(Layer::Guidance).unwrap().is_empty());
    assert!(!dir.path().join("layer1/nist-csf.yaml").exists());
}

#[tokio::test]
async fn malformed_structure_is_rejected_before_required_fields() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let report = ctx
        .validator()
        .validate("metadata:\n  id: bad\ncontrol-families: nope\n", Layer::Controls)
        .await
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.failure, Some(FailureClass::Unification));
    assert!(!report.suggestions.is_empty());
}

#[tokio::test]
async fn lost_index_is_rebuilt_from_stored_content() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ctx = context(dir.path());
        store(&ctx, Layer::Guidance, GUIDANCE).await;
        store(&ctx, Layer::Policy, POLICY).await;
    }
    std::fs::write(dir.path().join(INDEX_FILE), "{ not json").unwrap();

    let store = ArtifactStore::open(dir.path()).unwrap();
    assert!(store.contains(Layer::Guidance, "nist-csf"));
    assert!(store.contains(Layer::Policy, "acme-cloud-policy"));
    assert!(store.verify().unwrap().is_empty());
}

#[tokio::test]
async fn verify_reports_content_removed_behind_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    store(&ctx, Layer::Guidance, GUIDANCE).await;
    std::fs::remove_file(dir.path().join("layer1/nist-csf.yaml")).unwrap();

    let problems = ctx.require_store().unwrap().verify().unwrap();
    assert_eq!(problems.len(), 1);
    assert!(matches!(problems[0], IndexProblem::MissingContent { .. }));
}
