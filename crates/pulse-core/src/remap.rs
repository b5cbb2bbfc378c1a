//! Raw field to domain value transform.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// How the raw numeric field of a frame becomes a domain value.
///
/// One policy is applied to every frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemapPolicy {
    /// Use the raw field unmodified.
    #[default]
    Identity,
    /// `value = raw * scale + offset`.
    Linear { scale: f64, offset: f64 },
}

impl RemapPolicy {
    /// The 0.7x + 60 transform that maps the demo source into a 60..130 range.
    pub const DEMO_LINEAR: RemapPolicy = RemapPolicy::Linear {
        scale: 0.7,
        offset: 60.0,
    };

    pub fn apply(&self, raw: f64) -> f64 {
        match *self {
            Self::Identity => raw,
            Self::Linear { scale, offset } => raw * scale + offset,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Identity => Ok(()),
            Self::Linear { scale, offset } => {
                if scale.is_finite() && offset.is_finite() {
                    Ok(())
                } else {
                    Err(CoreError::InvalidRemap(format!(
                        "linear constants must be finite (scale={scale}, offset={offset})"
                    )))
                }
            }
        }
    }
}
