//! Schema composition.
//!
//! Shared fragments carry only `$defs`. Composing a layer schema copies
//! every fragment definition into the layer schema's own `$defs`, so the
//! layer's `#/$defs/<Name>` references resolve inside a single document.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::source::SchemaName;

/// Parse fetched schema text as JSON.
pub fn parse_schema(name: SchemaName, text: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(text).map_err(|e| SchemaError::InvalidSchema {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Merge the `$defs` of `fragments` into `layer_schema`.
///
/// A definition name that appears twice is accepted when both bodies are
/// identical and rejected with [`SchemaError::Composition`] otherwise.
pub fn compose(
    layer: SchemaName,
    layer_schema: Value,
    fragments: &[(SchemaName, Value)],
) -> Result<Value, SchemaError> {
    let Value::Object(mut root) = layer_schema else {
        return Err(SchemaError::InvalidSchema {
            name: layer.to_string(),
            reason: "schema root must be an object".into(),
        });
    };

    let mut defs = match root.remove("$defs") {
        Some(Value::Object(defs)) => defs,
        None => Map::new(),
        Some(_) => {
            return Err(SchemaError::InvalidSchema {
                name: layer.to_string(),
                reason: "$defs must be an object".into(),
            })
        }
    };

    for (name, fragment) in fragments {
        let Some(fragment_defs) = fragment.get("$defs").and_then(Value::as_object) else {
            continue;
        };
        for (def_name, body) in fragment_defs {
            match defs.get(def_name) {
                Some(existing) if existing != body => {
                    return Err(SchemaError::Composition {
                        name: name.to_string(),
                        definition: def_name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    defs.insert(def_name.clone(), body.clone());
                }
            }
        }
    }

    root.insert("$defs".into(), Value::Object(defs));
    Ok(Value::Object(root))
}
