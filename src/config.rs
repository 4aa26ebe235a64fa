use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::Deserialize;

pub const DEFAULT_DENSITY: f32 = 1.0;
pub const DEFAULT_CONNECTION_DISTANCE: f32 = 100.0;

/// An opaque colour written the way the host passes it around: `"255, 255, 255"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn channels(self) -> [f32; 3] {
        [f32::from(self.r), f32::from(self.g), f32::from(self.b)]
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let mut channels = [0u8; 3];
        let mut parts = value.split(',');
        for (index, channel) in channels.iter_mut().enumerate() {
            let part = parts
                .next()
                .ok_or_else(|| anyhow!("colour {value:?} has {index} channels, expected 3"))?;
            *channel = part
                .trim()
                .parse()
                .with_context(|| format!("invalid channel {part:?} in colour {value:?}"))?;
        }

        if parts.next().is_some() {
            bail!("colour {value:?} has more than 3 channels");
        }

        Ok(Self::new(channels[0], channels[1], channels[2]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NeighborSearch {
    /// Compare every pair of particles.
    #[default]
    Pairwise,
    /// Bucket particles into a uniform grid sized to the connection distance.
    Grid,
}

/// Fixed for the lifetime of one mounted background.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub dot_color: Rgb,
    pub line_color: Rgb,
    pub density: f32,
    pub connection_distance: f32,
    pub neighbor_search: NeighborSearch,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dot_color: Rgb::WHITE,
            line_color: Rgb::WHITE,
            density: DEFAULT_DENSITY,
            connection_distance: DEFAULT_CONNECTION_DISTANCE,
            neighbor_search: NeighborSearch::Pairwise,
        }
    }
}

/// Command line values that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dot_color: Option<Rgb>,
    pub line_color: Option<Rgb>,
    pub density: Option<f32>,
    pub connection_distance: Option<f32>,
    pub neighbor_search: Option<NeighborSearch>,
}

impl RenderConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("invalid render config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in config file {}", path.display()))
    }

    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(color) = overrides.dot_color {
            config.dot_color = color;
        }
        if let Some(color) = overrides.line_color {
            config.line_color = color;
        }
        if let Some(density) = overrides.density {
            config.density = density;
        }
        if let Some(distance) = overrides.connection_distance {
            config.connection_distance = distance;
        }
        if let Some(search) = overrides.neighbor_search {
            config.neighbor_search = search;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.density.is_finite() && self.density >= 0.0,
            "density must be a finite number >= 0, got {}",
            self.density
        );
        ensure!(
            self.connection_distance.is_finite() && self.connection_distance > 0.0,
            "connection distance must be a finite number > 0, got {}",
            self.connection_distance
        );
        Ok(())
    }
}
