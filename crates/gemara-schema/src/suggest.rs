//! Authoring hints for common validation mistakes.
//!
//! Missing-field hints come from the structured diagnostics. The remaining
//! hints match keywords in the error text, case-insensitively.

use gemara_core::Layer;
use serde::Serialize;

use crate::validate::{Diagnostic, FailureClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
}

impl Suggestion {
    fn new(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// Hints for a failed validation. Always returns at least one entry.
pub fn suggestions_for(
    layer: Layer,
    class: FailureClass,
    primary: &str,
    details: &[Diagnostic],
) -> Vec<Suggestion> {
    let mut out = Vec::new();
    let text = haystack(primary, details);

    if class == FailureClass::Concreteness {
        let missing = |pred: &dyn Fn(&str) -> bool| {
            details
                .iter()
                .filter_map(|d| d.field.as_deref())
                .any(pred)
        };
        if missing(&|f| f == "metadata" || f == "metadata.id") {
            out.push(Suggestion::new(
                "Missing metadata.id",
                "Every Gemara artifact must have a unique `metadata.id` field. Use lowercase \
                 letters, numbers, hyphens, and underscores only (e.g., `my-guidance-v1`).",
            ));
        }
        if missing(&|f| f == "metadata" || f == "metadata.title") {
            out.push(Suggestion::new(
                "Missing metadata.title",
                "The `metadata.title` field is required. Provide a human-readable title for \
                 your artifact.",
            ));
        }
        if layer == Layer::Guidance && missing(&|f| f.starts_with("categories")) {
            out.push(Suggestion::new(
                "Missing categories",
                "Layer 1 guidance documents must have at least one category with at least one \
                 guideline. Each category needs an `id` and `title`, and each guideline needs \
                 an `id` and `title`.",
            ));
        }
        if layer == Layer::Controls && missing(&|f| f.starts_with("control-families")) {
            out.push(Suggestion::new(
                "Missing controls",
                "Layer 2 control catalogs must have at least one control family with at least \
                 one control. Each control needs an `id`, `title`, and `objective`.",
            ));
        }
    }

    if text.contains("date") {
        out.push(Suggestion::new(
            "Invalid date format",
            "Dates must be in ISO 8601 format: `YYYY-MM-DD` (e.g., `2024-01-15`). Ensure the \
             `publication-date` field uses this format.",
        ));
    }

    if text.contains("document-type") {
        out.push(Suggestion::new(
            "Invalid document-type",
            "The `metadata.document-type` field must be one of: `Framework`, `Standard`, or \
             `Guideline`. Check your spelling and capitalization.",
        ));
    }

    if class == FailureClass::Unification && text.contains("is not of type") {
        out.push(Suggestion::new(
            "Type mismatch",
            "Check that field types match the schema. Common issues: use strings (with quotes) \
             for text fields, arrays (with `-`) for lists, and ensure nested objects are \
             properly indented.",
        ));
    }

    if class == FailureClass::Parse {
        out.push(Suggestion::new(
            "YAML syntax error",
            "Check your YAML syntax: ensure proper indentation (use spaces, not tabs), quote \
             strings with special characters, and use `-` for array items.",
        ));
    }

    if ["reference-id", "guideline-mappings", "guidance-references", "control-references"]
        .iter()
        .any(|k| text.contains(k))
    {
        out.push(Suggestion::new(
            "Invalid reference",
            "When referencing other artifacts, ensure the referenced ids exist. Use \
             `gemara list --layer 1` or `gemara controls` to see available ids, then \
             `gemara relationships` to check which references resolve.",
        ));
    }

    if ["applicability", "jurisdictions", "technology-domains", "industry-sectors"]
        .iter()
        .any(|k| text.contains(k))
    {
        out.push(Suggestion::new(
            "Applicability field issues",
            "The `metadata.applicability` object should contain arrays: `jurisdictions`, \
             `technology-domains`, and `industry-sectors`. Each should be a list of strings \
             (e.g., `- \"United States\"`).",
        ));
    }

    if out.is_empty() {
        let n = layer.number();
        out.push(Suggestion::new(
            "General validation error",
            format!(
                "Review the error messages above carefully. Run `gemara schema info --layer {n}` \
                 to see the complete schema requirements."
            ),
        ));
    }
    out
}

fn haystack(primary: &str, details: &[Diagnostic]) -> String {
    let mut text = primary.to_ascii_lowercase();
    for d in details {
        text.push(' ');
        text.push_str(&d.path.to_ascii_lowercase());
        text.push(' ');
        text.push_str(&d.message.to_ascii_lowercase());
    }
    text
}
