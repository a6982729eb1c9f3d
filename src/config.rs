// All tunable simulation defaults in one place.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genome::MutationWeights;

// Simulation
pub const FIXED_DT: f32 = 1.0 / 60.0;

// World
pub const WORLD_WIDTH: f32 = 1200.0;
pub const WORLD_HEIGHT: f32 = 800.0;
pub const WORLD_OVERFLOW_PCT: f32 = 0.05;

// Genome
pub const ESSENTIAL_GENE_COUNT: usize = 8;
pub const MAX_ORGANISM_SIZE: f32 = 20.0;
pub const PHOTOSYNTHESIS_THRESHOLD: f32 = 0.7;
pub const POINT_MUTATION_SPREAD: f32 = 0.2;

// Energy
pub const HEALTH_PER_SIZE: f32 = 10.0;
pub const ENERGY_PER_SIZE: f32 = 15.0;
pub const HEALTH_TO_ENERGY_RATIO: f32 = 3.0;
pub const PASSIVE_REGEN_RATE: f32 = 0.1;
pub const HEALTH_LOSS_RATE: f32 = 0.5;
pub const BASE_METABOLIC_RATE: f32 = 0.05;
pub const STARVATION_SEVERITY: f32 = 1.0;
pub const SUNLIGHT: f32 = 0.05;

// Feeding
pub const BASE_DETECTION_RANGE: f32 = 50.0;
pub const PREDATOR_SIZE_RATIO: f32 = 1.2;
pub const MAX_DIGEST_COOLDOWN: f32 = 2.0;
pub const DIGESTION_EFFICIENCY: f32 = 1.0;
pub const PREY_HEALTH_YIELD: f32 = 0.5;
pub const OVERFLOW_TO_HEALTH: f32 = 0.3;

// Movement
pub const MOVEMENT_SCALE: f32 = 2.0;
pub const NOISE_FREQUENCY: f32 = 0.35;
pub const STARVATION_SPEED_FACTOR: f32 = 0.4;
pub const MOVEMENT_COST: f32 = 0.5;
pub const MOVEMENT_SIZE_COST: f32 = 0.05;
pub const MIN_SPEED_FACTOR: f32 = 0.2;
pub const MAX_SPEED_FACTOR: f32 = 1.0;

// Reproduction
pub const MUTATION_RATE: f32 = 0.2;
pub const MAX_POPULATION: usize = 200;
pub const POPULATION_SCALE: f32 = 0.8;
pub const REPRODUCTION_CHANCE: f32 = 0.1;
pub const REPRODUCTION_COST: f32 = 0.3;
pub const REPRODUCTION_COOLDOWN: f32 = 10.0;
pub const OFFSPRING_START_FRACTION: f32 = 0.5;

// Spawner
pub const SPAWN_RATE: usize = 1;
pub const SPAWN_INTERVAL: f32 = 1.0;
pub const INITIAL_POPULATION: usize = 40;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub health_per_size: f32,
    pub energy_per_size: f32,
    pub health_to_energy_ratio: f32,
    pub passive_regen_rate: f32,
    pub health_loss_rate: f32,
    pub base_metabolic_rate: f32,
    /// Fraction of an unpaid energy deficit that turns into health damage, at most 1.
    pub starvation_severity: f32,
    pub sunlight: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            health_per_size: HEALTH_PER_SIZE,
            energy_per_size: ENERGY_PER_SIZE,
            health_to_energy_ratio: HEALTH_TO_ENERGY_RATIO,
            passive_regen_rate: PASSIVE_REGEN_RATE,
            health_loss_rate: HEALTH_LOSS_RATE,
            base_metabolic_rate: BASE_METABOLIC_RATE,
            starvation_severity: STARVATION_SEVERITY,
            sunlight: SUNLIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedingConfig {
    pub base_detection_range: f32,
    pub size_ratio_threshold: f32,
    pub max_digest_cooldown: f32,
    pub digestion_efficiency: f32,
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            base_detection_range: BASE_DETECTION_RANGE,
            size_ratio_threshold: PREDATOR_SIZE_RATIO,
            max_digest_cooldown: MAX_DIGEST_COOLDOWN,
            digestion_efficiency: DIGESTION_EFFICIENCY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub movement_scale: f32,
    pub noise_frequency: f32,
    pub starvation_speed_factor: f32,
    pub base_cost_multiplier: f32,
    pub size_cost_factor: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            movement_scale: MOVEMENT_SCALE,
            noise_frequency: NOISE_FREQUENCY,
            starvation_speed_factor: STARVATION_SPEED_FACTOR,
            base_cost_multiplier: MOVEMENT_COST,
            size_cost_factor: MOVEMENT_SIZE_COST,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionConfig {
    pub mutation_rate: f32,
    pub max_population: usize,
    pub population_scale: f32,
    pub require_energy_threshold: bool,
    pub base_chance: f32,
    pub cost_fraction: f32,
    pub max_cooldown: f32,
    pub mutation_weights: MutationWeights,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: MUTATION_RATE,
            max_population: MAX_POPULATION,
            population_scale: POPULATION_SCALE,
            require_energy_threshold: true,
            base_chance: REPRODUCTION_CHANCE,
            cost_fraction: REPRODUCTION_COST,
            max_cooldown: REPRODUCTION_COOLDOWN,
            mutation_weights: MutationWeights::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub enabled: bool,
    pub spawn_rate: usize,
    pub interval: f32,
    pub max_entities: usize,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_rate: SPAWN_RATE,
            interval: SPAWN_INTERVAL,
            max_entities: MAX_POPULATION,
        }
    }
}

/// Nominal world rectangle plus the soft margin organisms may drift into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
    pub overflow_pct: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            overflow_pct: WORLD_OVERFLOW_PCT,
        }
    }
}

/// Everything needed to build a world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub bounds: WorldBounds,
    pub initial_population: Option<usize>,
    pub energy: EnergyConfig,
    pub feeding: FeedingConfig,
    pub movement: MovementConfig,
    pub reproduction: ReproductionConfig,
    pub spawner: SpawnerConfig,
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn initial_population(&self) -> usize {
        self.initial_population.unwrap_or(INITIAL_POPULATION)
    }
}
