//! # Validation
//!
//! Validates YAML or JSON document text against the composed schema of a
//! layer. A document passes only when both of these hold:
//!
//! 1. **Unification**: the document is structurally compatible with the
//!    schema. Wrong types, pattern or enum violations, and unexpected
//!    properties all fail this step.
//! 2. **Concreteness**: every property the schema requires is present.
//!    Checked only when unification succeeded. Each missing property
//!    becomes one diagnostic naming the field.
//!
//! Both steps use one pass of the `jsonschema` validator. Errors of kind
//! `required` belong to concreteness and every other kind to unification.
//!
//! A failed check is a [`ValidationReport`] with `valid = false`. The
//! `Err` side of [`Validator::validate`] is reserved for cases where no
//! verdict could be reached, such as an unreachable schema origin.

use std::fmt;
use std::sync::Arc;

use gemara_core::Layer;
use jsonschema::error::ValidationErrorKind;
use jsonschema::Draft;
use serde::Serialize;
use serde_json::Value;

use crate::compose::{compose, parse_schema};
use crate::error::SchemaError;
use crate::source::{SchemaName, SchemaSource};
use crate::suggest::{suggestions_for, Suggestion};

/// Which step rejected the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// The text is not well-formed YAML or JSON.
    Parse,
    /// The document does not fit the schema's structure.
    Unification,
    /// The document fits but leaves required fields missing.
    Concreteness,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Parse => f.write_str("parse"),
            FailureClass::Unification => f.write_str("unification"),
            FailureClass::Concreteness => f.write_str("concreteness"),
        }
    }
}

/// One problem found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// JSON Pointer to the offending value (empty for the root).
    pub path: String,
    /// Dotted field name, e.g. `metadata.id` or `categories[0].title`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "(root): {}", self.message),
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub layer: Layer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

impl ValidationReport {
    pub fn passed(layer: Layer) -> Self {
        Self {
            valid: true,
            layer,
            failure: None,
            primary_error: None,
            details: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Build a failed report. Suggestions are derived from the diagnostics.
    pub fn failed(layer: Layer, class: FailureClass, details: Vec<Diagnostic>) -> Self {
        let primary = primary_error(class, &details);
        let suggestions = suggestions_for(layer, class, &primary, &details);
        Self {
            valid: false,
            layer,
            failure: Some(class),
            primary_error: Some(primary),
            details,
            suggestions,
        }
    }

    /// Whether any diagnostic names `field` exactly.
    pub fn mentions_field(&self, field: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.field.as_deref() == Some(field))
    }
}

fn primary_error(class: FailureClass, details: &[Diagnostic]) -> String {
    let first = details
        .first()
        .map(|d| d.to_string())
        .unwrap_or_default();
    match class {
        FailureClass::Parse => format!("Failed to parse document: {first}"),
        FailureClass::Unification => format!("Schema unification failed: {first}"),
        FailureClass::Concreteness => {
            let fields: Vec<&str> = details.iter().filter_map(|d| d.field.as_deref()).collect();
            format!("Validation failed: missing required fields: {}", fields.join(", "))
        }
    }
}

/// Layer-aware validator.
///
/// Stateless apart from the shared [`SchemaSource`]; cloning is cheap.
#[derive(Debug, Clone)]
pub struct Validator {
    source: Arc<SchemaSource>,
}

impl Validator {
    pub fn new(source: Arc<SchemaSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<SchemaSource> {
        &self.source
    }

    /// Fetch the shared fragments and the layer schema and compose them.
    pub async fn composed_schema(&self, layer: Layer) -> Result<Value, SchemaError> {
        let mut fragments = Vec::with_capacity(SchemaName::SHARED.len());
        for name in SchemaName::SHARED {
            let text = self.source.fetch(name).await?;
            fragments.push((name, parse_schema(name, &text)?));
        }
        let layer_name = SchemaName::Layer(layer);
        let text = self.source.fetch(layer_name).await?;
        compose(layer_name, parse_schema(layer_name, &text)?, &fragments)
    }

    /// Validate `content` as a document of `layer`. Never touches any store.
    pub async fn validate(&self, content: &str, layer: Layer) -> Result<ValidationReport, SchemaError> {
        let schema = self.composed_schema(layer).await?;
        let report = check(&schema, content, layer)?;
        match report.failure {
            None => tracing::info!(layer = layer.number(), "document valid"),
            Some(class) => tracing::info!(
                layer = layer.number(),
                failure = %class,
                errors = report.details.len(),
                "document invalid"
            ),
        }
        Ok(report)
    }
}

/// Validate `content` against an already composed `schema`.
pub fn check(schema: &Value, content: &str, layer: Layer) -> Result<ValidationReport, SchemaError> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|e| SchemaError::Build {
            layer,
            reason: e.to_string(),
        })?;

    let instance = match parse_content(content) {
        Ok(value) => value,
        Err(reason) => {
            let diag = Diagnostic {
                path: String::new(),
                field: None,
                message: reason,
            };
            return Ok(ValidationReport::failed(layer, FailureClass::Parse, vec![diag]));
        }
    };

    let mut structural = Vec::new();
    let mut missing = Vec::new();
    for error in compiled.iter_errors(&instance) {
        let path = error.instance_path.to_string();
        let message = error.to_string();
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let property = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                missing.push(Diagnostic {
                    field: Some(join_field(&dotted_path(&path), &property)),
                    path,
                    message,
                });
            }
            _ => {
                let field = dotted_path(&path);
                structural.push(Diagnostic {
                    field: (!field.is_empty()).then_some(field),
                    path,
                    message,
                });
            }
        }
    }

    let report = if !structural.is_empty() {
        ValidationReport::failed(layer, FailureClass::Unification, structural)
    } else if !missing.is_empty() {
        ValidationReport::failed(layer, FailureClass::Concreteness, missing)
    } else {
        ValidationReport::passed(layer)
    };
    Ok(report)
}

/// Parse document text (YAML, which includes JSON) into a JSON value.
pub fn parse_content(content: &str) -> Result<Value, String> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))?;
    yaml_to_json_value(&yaml)
}

/// Render a JSON Pointer as a dotted field path.
///
/// `/categories/0/guidelines` becomes `categories[0].guidelines`.
pub fn dotted_path(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push('[');
            out.push_str(&segment);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment);
        }
    }
    out
}

fn join_field(parent: &str, property: &str) -> String {
    if parent.is_empty() {
        property.to_string()
    } else {
        format!("{parent}.{property}")
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Gemara documents use the JSON-compatible subset of YAML. Tags are
/// dropped and non-string map keys are rendered to text.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates/
        dir.pop(); // repo root
        dir
    }

    fn validator() -> Validator {
        let source = SchemaSource::from_dir(repo_root().join("schemas")).unwrap();
        Validator::new(Arc::new(source))
    }

    const GUIDANCE: &str = r#"
metadata:
  id: nist-csf
  title: NIST Cybersecurity Framework
  publication-date: 2024-02-26
  document-type: Framework
  applicability:
    technology-domains: [Cloud]
categories:
  - id: ID
    title: Identify
    guidelines:
      - id: ID.AM-1
        title: Physical devices are inventoried
"#;

    const CATALOG: &str = r#"
metadata:
  id: k8s-baseline
  title: Kubernetes Baseline
control-families:
  - id: AC
    title: Access Control
    controls:
      - id: k8s-rbac
        title: Enforce RBAC
        objective: Restrict cluster access by role
        guideline-mappings:
          - reference-id: nist-csf
            entries:
              - reference-id: ID.AM-1
                strength: 5
"#;

    const POLICY: &str = r#"
metadata:
  id: acme-policy
  title: ACME Policy
  organization-id: acme
control-references:
  - reference-id: k8s-rbac
requirements:
  - id: REQ-1
    text: Enforce RBAC everywhere
"#;

    const EVALUATION: &str = r#"
metadata:
  id: k8s-eval
  title: Kubernetes evaluation plan
evaluations:
  - control-id: k8s-rbac
    assessments:
      - requirement-id: k8s-rbac.01
        procedures:
          - id: check-rbac
            name: Check RBAC is enabled
            target-type: configuration
"#;

    #[tokio::test]
    async fn well_formed_documents_pass_for_every_layer() {
        let v = validator();
        for (layer, doc) in [
            (Layer::Guidance, GUIDANCE),
            (Layer::Controls, CATALOG),
            (Layer::Policy, POLICY),
            (Layer::Evaluation, EVALUATION),
        ] {
            let report = v.validate(doc, layer).await.unwrap();
            assert!(report.valid, "{layer} should pass: {:?}", report.details);
            assert!(report.failure.is_none());
            assert!(report.suggestions.is_empty());
        }
    }

    #[tokio::test]
    async fn missing_metadata_id_is_a_concreteness_failure() {
        let doc = GUIDANCE.replace("  id: nist-csf\n", "");
        let report = validator().validate(&doc, Layer::Guidance).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.failure, Some(FailureClass::Concreteness));
        assert!(report.mentions_field("metadata.id"), "details: {:?}", report.details);
        let primary = report.primary_error.unwrap();
        assert!(primary.contains("metadata.id"), "got: {primary}");
        assert!(report.suggestions.iter().any(|s| s.title == "Missing metadata.id"));
    }

    #[tokio::test]
    async fn wrong_type_is_a_unification_failure() {
        let doc = "metadata:\n  id: x\n  title: X\ncategories: not-a-list\n";
        let report = validator().validate(doc, Layer::Guidance).await.unwrap();
        assert_eq!(report.failure, Some(FailureClass::Unification));
        assert!(report.mentions_field("categories"));
        assert!(report
            .primary_error
            .as_deref()
            .is_some_and(|p| p.starts_with("Schema unification failed")));
        assert!(report.suggestions.iter().any(|s| s.title == "Type mismatch"));
    }

    #[tokio::test]
    async fn unification_errors_take_precedence_over_missing_fields() {
        // Both a type error and a missing title.
        let doc = "metadata:\n  id: x\ncategories: 7\n";
        let report = validator().validate(doc, Layer::Guidance).await.unwrap();
        assert_eq!(report.failure, Some(FailureClass::Unification));
        assert!(!report.mentions_field("metadata.title"));
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_parse_failure() {
        let report = validator()
            .validate("metadata: [unclosed\n", Layer::Policy)
            .await
            .unwrap();
        assert_eq!(report.failure, Some(FailureClass::Parse));
        assert_eq!(report.details.len(), 1);
        assert!(report.suggestions.iter().any(|s| s.title == "YAML syntax error"));
    }

    #[tokio::test]
    async fn bad_date_suggests_iso_format() {
        let doc = GUIDANCE.replace("2024-02-26", "26/02/2024");
        let report = validator().validate(&doc, Layer::Guidance).await.unwrap();
        assert_eq!(report.failure, Some(FailureClass::Unification));
        assert!(report.mentions_field("metadata.publication-date"));
        assert!(report.suggestions.iter().any(|s| s.title == "Invalid date format"));
    }

    #[tokio::test]
    async fn nested_missing_fields_name_their_position() {
        let doc = CATALOG.replace("        objective: Restrict cluster access by role\n", "");
        let report = validator().validate(&doc, Layer::Controls).await.unwrap();
        assert_eq!(report.failure, Some(FailureClass::Concreteness));
        assert!(
            report.mentions_field("control-families[0].controls[0].objective"),
            "details: {:?}",
            report.details
        );
    }

    #[tokio::test]
    async fn composed_schema_carries_shared_definitions() {
        let schema = validator().composed_schema(Layer::Policy).await.unwrap();
        let defs = schema["$defs"].as_object().unwrap();
        for name in ["Id", "Date", "Strength", "Metadata", "Applicability", "Mapping", "MappingEntry"] {
            assert!(defs.contains_key(name), "missing $defs/{name}");
        }
    }

    #[test]
    fn check_classifies_required_errors_separately() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {"count": {"type": "integer"}}
        });
        let missing = check(&schema, "count: 3\n", Layer::Guidance).unwrap();
        assert_eq!(missing.failure, Some(FailureClass::Concreteness));
        assert!(missing.mentions_field("name"));

        let wrong = check(&schema, "name: a\ncount: three\n", Layer::Guidance).unwrap();
        assert_eq!(wrong.failure, Some(FailureClass::Unification));

        let ok = check(&schema, "{\"name\": \"a\"}", Layer::Guidance).unwrap();
        assert!(ok.valid);
    }

    #[test]
    fn invalid_schema_is_a_build_error() {
        let schema = json!({"type": "no-such-type"});
        let err = check(&schema, "a: 1\n", Layer::Policy).unwrap_err();
        assert!(matches!(err, SchemaError::Build { layer: Layer::Policy, .. }));
    }

    #[test]
    fn dotted_paths() {
        assert_eq!(dotted_path(""), "");
        assert_eq!(dotted_path("/metadata/id"), "metadata.id");
        assert_eq!(dotted_path("/categories/0/guidelines/12"), "categories[0].guidelines[12]");
        assert_eq!(dotted_path("/a~1b/c~0d"), "a/b.c~d");
    }

    #[test]
    fn yaml_conversion_keeps_scalars() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("id: x\nstrength: 5\nratio: 0.5\nok: true\n7: seven\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json["strength"], 5);
        assert_eq!(json["ratio"], 0.5);
        assert_eq!(json["ok"], true);
        assert_eq!(json["7"], "seven");
    }

    #[test]
    fn diagnostics_display_root_marker() {
        let d = Diagnostic {
            path: String::new(),
            field: None,
            message: "boom".into(),
        };
        assert_eq!(d.to_string(), "(root): boom");
    }
}
