//! # Compliance Layers
//!
//! The Gemara hierarchy orders artifacts into numbered layers. References
//! point downward: policies reference controls and guidance, controls
//! reference guidance, guidance references nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GemaraError;

/// One tier of the compliance hierarchy.
///
/// Serialized as its layer number (`1`..`4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Layer {
    /// Layer 1: high-level guidance from standards bodies and regulators.
    Guidance,
    /// Layer 2: technology-specific control catalogs.
    Controls,
    /// Layer 3: organizational policy.
    Policy,
    /// Layer 4: evaluation plans and results.
    Evaluation,
}

impl Layer {
    /// Every layer, in hierarchy order.
    pub const ALL: [Layer; 4] = [
        Layer::Guidance,
        Layer::Controls,
        Layer::Policy,
        Layer::Evaluation,
    ];

    /// Layers with a stored artifact shape.
    pub const STORABLE: [Layer; 3] = [Layer::Guidance, Layer::Controls, Layer::Policy];

    /// The layer number (1-based).
    pub fn number(self) -> u8 {
        match self {
            Layer::Guidance => 1,
            Layer::Controls => 2,
            Layer::Policy => 3,
            Layer::Evaluation => 4,
        }
    }

    /// Look up a layer by number.
    pub fn from_number(n: u8) -> Result<Self, GemaraError> {
        match n {
            1 => Ok(Layer::Guidance),
            2 => Ok(Layer::Controls),
            3 => Ok(Layer::Policy),
            4 => Ok(Layer::Evaluation),
            other => Err(GemaraError::UnknownLayer(other.to_string())),
        }
    }

    /// Human-readable artifact kind for this layer.
    pub fn kind(self) -> &'static str {
        match self {
            Layer::Guidance => "Guidance",
            Layer::Controls => "Control Catalog",
            Layer::Policy => "Policy",
            Layer::Evaluation => "Evaluation",
        }
    }

    /// Directory name used for this layer on disk (`layer1`, `layer2`, ...).
    pub fn dir_name(self) -> String {
        format!("layer{}", self.number())
    }

    /// Whether artifacts of this layer can be stored and retrieved.
    pub fn is_storable(self) -> bool {
        !matches!(self, Layer::Evaluation)
    }

    /// Whether the bulk loader accepts `.json` files for this layer.
    ///
    /// Layer 1 directories hold YAML only.
    pub fn accepts_json_files(self) -> bool {
        matches!(self, Layer::Controls | Layer::Policy)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layer {}", self.number())
    }
}

impl TryFrom<u8> for Layer {
    type Error = GemaraError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Layer::from_number(n)
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> u8 {
        layer.number()
    }
}

impl FromStr for Layer {
    type Err = GemaraError;

    /// Accepts `2`, `layer2`, `layer-2`, or the layer name (`controls`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let digits = normalized
            .strip_prefix("layer")
            .map(|rest| rest.trim_start_matches(['-', '_', ' ']))
            .unwrap_or(&normalized);
        if let Ok(n) = digits.parse::<u8>() {
            return Layer::from_number(n);
        }
        match normalized.as_str() {
            "guidance" => Ok(Layer::Guidance),
            "controls" | "control" | "catalog" => Ok(Layer::Controls),
            "policy" | "policies" => Ok(Layer::Policy),
            "evaluation" | "evaluations" => Ok(Layer::Evaluation),
            _ => Err(GemaraError::UnknownLayer(s.to_string())),
        }
    }
}
