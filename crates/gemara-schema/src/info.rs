//! Human-oriented summaries of layer schemas.

use gemara_core::Layer;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::source::SchemaName;
use crate::validate::Validator;

/// What a layer schema expects, derived from the composed schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaInfo {
    pub layer: Layer,
    pub title: String,
    pub purpose: String,
    /// Required top-level properties.
    pub required: Vec<String>,
    /// Every top-level property, required or not.
    pub properties: Vec<String>,
    /// Required `metadata` properties.
    pub metadata_required: Vec<String>,
    pub location: String,
    pub examples: &'static str,
}

fn default_purpose(layer: Layer) -> &'static str {
    match layer {
        Layer::Guidance => {
            "High-level guidance on cybersecurity measures from industry groups, government \
             agencies, or standards bodies."
        }
        Layer::Controls => "Technology-specific, threat-informed security controls.",
        Layer::Policy => "Risk-informed governance rules tailored to an organization.",
        Layer::Evaluation => "Inspection of code, configurations, and deployments.",
    }
}

fn examples(layer: Layer) -> &'static str {
    match layer {
        Layer::Guidance => "NIST Cybersecurity Framework, ISO 27001, PCI DSS, HIPAA, GDPR",
        Layer::Controls => "CIS Benchmarks, FINOS Common Cloud Controls, OSPS Baseline",
        Layer::Policy => "Policies must consider organization-specific risk appetite and risk acceptance.",
        Layer::Evaluation => "Evaluations may be built from the outputs of layers 2 or 3.",
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Summarise an already composed schema.
pub fn summarize(layer: Layer, schema: &Value, location: String) -> SchemaInfo {
    let text = |key: &str| schema.get(key).and_then(Value::as_str).map(str::to_string);
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();

    SchemaInfo {
        layer,
        title: text("title").unwrap_or_else(|| format!("{layer}: {}", layer.kind())),
        purpose: text("description").unwrap_or_else(|| default_purpose(layer).to_string()),
        required: string_list(schema.get("required")),
        properties,
        metadata_required: string_list(schema.pointer("/$defs/Metadata/required")),
        location,
        examples: examples(layer),
    }
}

impl Validator {
    /// Describe the composed schema for `layer`.
    pub async fn schema_info(&self, layer: Layer) -> Result<SchemaInfo, SchemaError> {
        let schema = self.composed_schema(layer).await?;
        let location = self.source().location(SchemaName::Layer(layer));
        Ok(summarize(layer, &schema, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_reads_required_and_properties() {
        let schema = json!({
            "title": "Layer 3",
            "required": ["metadata"],
            "properties": {"metadata": {}, "requirements": {}},
            "$defs": {"Metadata": {"required": ["id", "title"]}}
        });
        let info = summarize(Layer::Policy, &schema, "here".into());
        assert_eq!(info.title, "Layer 3");
        assert_eq!(info.required, vec!["metadata"]);
        assert_eq!(info.properties.len(), 2);
        assert_eq!(info.metadata_required, vec!["id", "title"]);
        assert_eq!(info.location, "here");
    }

    #[test]
    fn summary_falls_back_to_layer_defaults() {
        let info = summarize(Layer::Evaluation, &json!({}), String::new());
        assert_eq!(info.title, "Layer 4: Evaluation");
        assert!(info.purpose.contains("Inspection"));
        assert!(info.required.is_empty());
    }
}
