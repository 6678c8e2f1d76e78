use crate::domains::geo::{DensifyOptions, Region, DEFAULT_MAX_POINTS_PER_SEGMENT, DEFAULT_STEP_DISTANCE_M};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_step_distance")]
    pub step_distance_m: f64,
    pub speed_mps: f64,
    /// Seconds between re-sends of the current location; 0 disables them.
    #[serde(default)]
    pub heartbeat_secs: u64,
    #[serde(default = "default_max_points")]
    pub max_points_per_segment: usize,
    /// Agents the `locsim` binary starts, each replaying the configured route.
    #[serde(default)]
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Route directory; `LOCSIM_DATA_DIR` and the built-in defaults apply when unset.
    pub dir: Option<PathBuf>,
    pub route: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    pub dir: Option<PathBuf>,
}

fn default_step_distance() -> f64 {
    DEFAULT_STEP_DISTANCE_M
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS_PER_SEGMENT
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if !(sim.step_distance_m.is_finite() && sim.step_distance_m > 0.0) {
            anyhow::bail!("simulation.step_distance_m must be positive");
        }
        if !(sim.speed_mps.is_finite() && sim.speed_mps > 0.0) {
            anyhow::bail!("simulation.speed_mps must be positive");
        }
        if sim.max_points_per_segment == 0 {
            anyhow::bail!("simulation.max_points_per_segment must be at least 1");
        }
        Ok(())
    }

    pub fn densify_options(&self) -> DensifyOptions {
        DensifyOptions {
            step_distance_m: self.simulation.step_distance_m,
            max_points_per_segment: self.simulation.max_points_per_segment,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                step_distance_m: DEFAULT_STEP_DISTANCE_M,
                speed_mps: 13.9,
                heartbeat_secs: 30,
                max_points_per_segment: DEFAULT_MAX_POINTS_PER_SEGMENT,
                agents: vec!["courier-1".to_string()],
            },
            data: DataConfig::default(),
            logging: LoggingConfig::default(),
            journal: JournalConfig::default(),
            regions: Vec::new(),
        }
    }
}
