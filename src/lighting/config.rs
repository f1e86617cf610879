//! Lighting engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Constants that bound light tree construction and packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightingConfig {
    /// Maximum number of light bounces.
    pub max_bounces: u32,
    /// Light slots per surface in the packed lightmap buffer.
    pub max_surface_lights: usize,
    /// Materials with emissive intensity above this become tree roots.
    pub emissive_threshold: f32,
    /// Nodes with lightness below this never spawn children.
    pub min_lightness: f32,
    /// Queue-pop budget; `None` uses `P² × max_bounces + 100`.
    pub iteration_budget: Option<usize>,
    /// Tolerance band for half-space classification. `0.0` requires a
    /// vertex strictly in front of the caster plane.
    pub plane_epsilon: f32,
    /// Use rayon for visibility and per-root propagation.
    pub parallel: bool,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            max_bounces: 4,
            max_surface_lights: 16,
            emissive_threshold: 0.1,
            min_lightness: 0.1,
            iteration_budget: None,
            plane_epsilon: 0.0,
            parallel: true,
        }
    }
}

impl LightingConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse from JSON text and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bounces == 0 {
            return Err(Error::invalid_config("maxBounces must be at least 1"));
        }
        if self.max_surface_lights == 0 {
            return Err(Error::invalid_config("maxSurfaceLights must be at least 1"));
        }
        if self.max_surface_lights > u32::MAX as usize {
            return Err(Error::invalid_config(format!(
                "maxSurfaceLights must fit a u32 light count, got {}",
                self.max_surface_lights
            )));
        }
        for (name, value) in [
            ("emissiveThreshold", self.emissive_threshold),
            ("minLightness", self.min_lightness),
            ("planeEpsilon", self.plane_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_config(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Queue-pop cap for a scene with `poly_count` triangles.
    pub fn iteration_cap(&self, poly_count: usize) -> usize {
        self.iteration_budget.unwrap_or_else(|| {
            poly_count
                .saturating_mul(poly_count)
                .saturating_mul(self.max_bounces as usize)
                .saturating_add(100)
        })
    }
}
