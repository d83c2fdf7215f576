//! Configuration loading and typed config structures for the galaxy server.
//!
//! The canonical configuration lives in `starreach-config.yaml` at the
//! project root. Every field has a default, so a partial or empty file is
//! valid. `DATABASE_URL` and `ADMIN_PORT` override the infrastructure
//! section when set.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use starreach_types::DesignType;
use starreach_world::{GeneratorConfig, HomeworldPolicy, HomeworldSettings};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `starreach-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// World seed and geometry.
    #[serde(default)]
    pub world: WorldConfig,

    /// Stars per sector and spacing.
    #[serde(default)]
    pub generator: GeneratorSection,

    /// Placement search limits and homeworld policy.
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Assets granted with a new homeworld.
    #[serde(default)]
    pub homeworld: HomeworldConfig,

    /// Rank aggregation schedule.
    #[serde(default)]
    pub ranks: RankConfig,

    /// Database and listener settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Env`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.infrastructure.apply_env_overrides()?;
        Ok(config)
    }

    /// Sector generator parameters.
    pub const fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.world.seed,
            sector_size: self.world.sector_size,
            min_stars: self.generator.min_stars,
            max_stars: self.generator.max_stars,
            min_star_spacing: self.generator.min_star_spacing,
        }
    }

    /// Homeworld suitability thresholds.
    pub const fn homeworld_policy(&self) -> HomeworldPolicy {
        HomeworldPolicy {
            sector_size: self.world.sector_size,
            min_habitable_planets: self.placement.min_habitable_planets,
            min_population_congeniality: self.placement.min_population_congeniality,
            min_home_distance: self.placement.min_home_distance,
        }
    }

    /// Homeworld starting assets.
    pub fn homeworld_settings(&self) -> HomeworldSettings {
        HomeworldSettings {
            initial_population: self.homeworld.initial_population,
            starting_fleets: self
                .homeworld
                .starting_fleets
                .iter()
                .map(|f| (f.design, f.ships))
                .collect(),
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for sector generation. Changing it changes every sector not yet
    /// stored.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Width and height of a sector in galaxy units.
    #[serde(default = "default_sector_size")]
    pub sector_size: i64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            sector_size: default_sector_size(),
        }
    }
}

/// Sector content parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorSection {
    /// Fewest stars attempted per sector.
    #[serde(default = "default_min_stars")]
    pub min_stars: u32,

    /// Most stars attempted per sector.
    #[serde(default = "default_max_stars")]
    pub max_stars: u32,

    /// Minimum distance between stars in one sector.
    #[serde(default = "default_min_star_spacing")]
    pub min_star_spacing: i64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            min_stars: default_min_stars(),
            max_stars: default_max_stars(),
            min_star_spacing: default_min_star_spacing(),
        }
    }
}

/// Placement search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlacementConfig {
    /// Rings searched around the starting sector.
    #[serde(default = "default_max_radius")]
    pub max_radius: u32,

    /// Radius around the centre searched for an empty starting sector.
    #[serde(default = "default_find_empty_max_radius")]
    pub find_empty_max_radius: u32,

    /// Minimum distance between home stars, in galaxy units.
    #[serde(default = "default_min_home_distance")]
    pub min_home_distance: u64,

    /// Planets a home star needs at or above the congeniality threshold.
    #[serde(default = "default_min_habitable_planets")]
    pub min_habitable_planets: usize,

    /// Population congeniality that counts a planet as habitable.
    #[serde(default = "default_min_population_congeniality")]
    pub min_population_congeniality: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            find_empty_max_radius: default_find_empty_max_radius(),
            min_home_distance: default_min_home_distance(),
            min_habitable_planets: default_min_habitable_planets(),
            min_population_congeniality: default_min_population_congeniality(),
        }
    }
}

/// One starting fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StartingFleet {
    /// Ship design.
    pub design: DesignType,
    /// Number of ships.
    pub ships: u64,
}

/// Homeworld starting assets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HomeworldConfig {
    /// Population of the first colony.
    #[serde(default = "default_initial_population")]
    pub initial_population: u64,

    /// Fleets placed at the home star.
    #[serde(default = "default_starting_fleets")]
    pub starting_fleets: Vec<StartingFleet>,
}

impl Default for HomeworldConfig {
    fn default() -> Self {
        Self {
            initial_population: default_initial_population(),
            starting_fleets: default_starting_fleets(),
        }
    }
}

/// Rank aggregation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RankConfig {
    /// Seconds between cycles.
    #[serde(default = "default_rank_interval_secs")]
    pub interval_secs: u64,
}

impl RankConfig {
    /// Interval between cycles. Never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_rank_interval_secs(),
        }
    }
}

/// Infrastructure configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. Without one the server keeps all
    /// state in memory.
    #[serde(default)]
    pub postgres_url: Option<String>,

    /// Most database connections open at once.
    #[serde(default = "default_postgres_max_connections")]
    pub postgres_max_connections: u32,

    /// Admin API port.
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,
}

impl InfrastructureConfig {
    /// Override settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `ADMIN_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.postgres_url = Some(val);
        }
        if let Ok(val) = std::env::var("ADMIN_PORT") {
            self.admin_port = val.parse().map_err(|_parse| ConfigError::Env {
                name: "ADMIN_PORT",
                value: val.clone(),
            })?;
        }
        Ok(())
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            postgres_max_connections: default_postgres_max_connections(),
            admin_port: default_admin_port(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    0x5EED
}

const fn default_sector_size() -> i64 {
    1024
}

const fn default_min_stars() -> u32 {
    12
}

const fn default_max_stars() -> u32 {
    20
}

const fn default_min_star_spacing() -> i64 {
    96
}

const fn default_max_radius() -> u32 {
    8
}

const fn default_find_empty_max_radius() -> u32 {
    64
}

const fn default_min_home_distance() -> u64 {
    1500
}

const fn default_min_habitable_planets() -> usize {
    2
}

const fn default_min_population_congeniality() -> u32 {
    500
}

const fn default_initial_population() -> u64 {
    starreach_world::DEFAULT_HOMEWORLD_POPULATION
}

fn default_starting_fleets() -> Vec<StartingFleet> {
    vec![
        StartingFleet {
            design: DesignType::ColonyShip,
            ships: 1,
        },
        StartingFleet {
            design: DesignType::Scout,
            ships: 3,
        },
    ]
}

const fn default_rank_interval_secs() -> u64 {
    600
}

const fn default_postgres_max_connections() -> u32 {
    10
}

const fn default_admin_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_world_crate() {
        let config = ServerConfig::default();
        assert_eq!(config.generator_config(), GeneratorConfig::default());
        assert_eq!(config.homeworld_policy(), HomeworldPolicy::default());
        assert_eq!(config.homeworld_settings(), HomeworldSettings::default());
        assert_eq!(config.ranks.interval(), Duration::from_secs(600));
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  seed: 7
placement:
  max_radius: 3
homeworld:
  starting_fleets:
    - design: Fighter
      ships: 2
logging:
  format: json
";
        let config = ServerConfig::parse(yaml).ok().unwrap_or_default();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.sector_size, 1024);
        assert_eq!(config.placement.max_radius, 3);
        assert_eq!(config.placement.min_home_distance, 1500);
        assert_eq!(
            config.homeworld_settings().starting_fleets,
            vec![(DesignType::Fighter, 2)]
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(ServerConfig::parse("").is_ok());
    }

    #[test]
    fn parse_invalid_yaml() {
        assert!(ServerConfig::parse("world: [unclosed").is_err());
    }

    #[test]
    fn shipped_config_file_spells_out_the_defaults() {
        let shipped = ServerConfig::parse(include_str!("../../../starreach-config.yaml")).ok();
        let defaults = ServerConfig::parse("").ok();
        assert!(shipped.is_some());
        assert_eq!(shipped, defaults);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let ranks = RankConfig { interval_secs: 0 };
        assert_eq!(ranks.interval(), Duration::from_secs(1));
    }
}
