use crate::config::{self, EnergyConfig};
use crate::genome::Genome;
use crate::settings::{expect_number, Configurable, Setting, SettingValue, SettingsError};
use crate::world::{System, TickContext};

/// Per-organism health and energy state.
#[derive(Clone, Debug, PartialEq)]
pub struct Metabolism {
    pub health: f32,
    pub energy: f32,
    pub max_health: f32,
    pub max_energy: f32,
    /// Energy units one health point is worth.
    pub health_to_energy_ratio: f32,
    pub digest_cooldown: f32,
    pub max_digest_cooldown: f32,
    pub can_photosynthesize: bool,
    pub photosynthesis_efficiency: f32,
    pub digestion_spectrum: f32,
}

impl Metabolism {
    /// Full health and energy, sized from the genome.
    pub fn from_genome(genome: &Genome, cfg: &EnergyConfig) -> Self {
        let size = genome.size();
        let max_health = size * cfg.health_per_size;
        let max_energy = size * cfg.energy_per_size;
        Self {
            health: max_health,
            energy: max_energy,
            max_health,
            max_energy,
            health_to_energy_ratio: cfg.health_to_energy_ratio,
            digest_cooldown: 0.0,
            max_digest_cooldown: config::MAX_DIGEST_COOLDOWN,
            can_photosynthesize: genome.can_photosynthesize(),
            photosynthesis_efficiency: genome.photosynthesis_efficiency(),
            digestion_spectrum: genome.digestion_spectrum(),
        }
    }

    /// Scale current health and energy to a fraction of their maxima.
    pub fn with_fill(mut self, fraction: f32) -> Self {
        self.health = self.max_health * fraction;
        self.energy = self.max_energy * fraction;
        self.clamp();
        self
    }

    pub fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, self.max_health.max(0.0));
        self.energy = self.energy.clamp(0.0, self.max_energy.max(0.0));
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_plant_material(&self) -> bool {
        self.can_photosynthesize
    }

    /// Zero energy and no sunlight to fall back on.
    pub fn is_starving(&self) -> bool {
        self.energy <= 0.0 && !self.can_photosynthesize
    }

    pub fn health_percentage(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).max(0.0)
        } else {
            0.0
        }
    }

    pub fn energy_percentage(&self) -> f32 {
        if self.max_energy > 0.0 {
            (self.energy / self.max_energy).max(0.0)
        } else {
            0.0
        }
    }

    /// Plant digestion in [0, 2]: 2 for pure herbivores, 0 for pure carnivores.
    pub fn plant_digestion_efficiency(&self) -> f32 {
        (1.0 - self.digestion_spectrum).clamp(0.0, 2.0)
    }

    /// Meat digestion in [0, 2], mirror image of the plant curve.
    pub fn meat_digestion_efficiency(&self) -> f32 {
        (1.0 + self.digestion_spectrum).clamp(0.0, 2.0)
    }

    pub fn can_digest_anything(&self) -> bool {
        self.plant_digestion_efficiency() > 0.0 || self.meat_digestion_efficiency() > 0.0
    }

    pub fn efficiency_for(&self, prey: &Metabolism) -> f32 {
        if prey.is_plant_material() {
            self.plant_digestion_efficiency()
        } else {
            self.meat_digestion_efficiency()
        }
    }

    pub fn update_photosynthesis(&mut self, dt: f32, sunlight: f32) {
        if !self.can_photosynthesize || self.photosynthesis_efficiency <= 0.0 {
            return;
        }
        let gain = self.max_energy * self.photosynthesis_efficiency * dt * sunlight;
        self.energy = (self.energy + gain).min(self.max_energy);
    }

    pub fn update_digestion(&mut self, dt: f32) {
        if self.digest_cooldown > 0.0 {
            self.digest_cooldown = (self.digest_cooldown - dt).max(0.0);
        }
    }

    pub fn consume(&mut self, prey: &Metabolism) -> f32 {
        self.consume_scaled(prey, 1.0)
    }

    /// Eat `prey`, returning the energy gained. Returns 0 while still digesting.
    pub fn consume_scaled(&mut self, prey: &Metabolism, digestion_factor: f32) -> f32 {
        if self.digest_cooldown > 0.0 {
            return 0.0;
        }
        let efficiency = self.efficiency_for(prey) * digestion_factor;
        let available = prey.energy.max(0.0)
            + config::PREY_HEALTH_YIELD * prey.health.max(0.0) * prey.health_to_energy_ratio;
        let gained = available * efficiency;

        self.energy += gained;
        let overflow = self.energy - self.max_energy;
        if overflow > 0.0 {
            self.energy = self.max_energy;
            self.health += overflow * config::OVERFLOW_TO_HEALTH / self.health_to_energy_ratio;
        }
        self.clamp();
        self.digest_cooldown = self.max_digest_cooldown;
        gained
    }

    /// Pay `cost` from energy; whatever energy cannot cover is taken from health.
    pub fn drain(&mut self, cost: f32, severity: f32) {
        if cost <= 0.0 {
            return;
        }
        if self.energy >= cost {
            self.energy -= cost;
            return;
        }
        let deficit = cost - self.energy.max(0.0);
        self.energy = 0.0;
        self.health -= deficit / self.health_to_energy_ratio * severity.clamp(0.0, 1.0);
        self.clamp();
    }

    /// Recompute maxima after a config change, keeping current values in range.
    pub fn resize(&mut self, size: f32, cfg: &EnergyConfig) {
        self.max_health = size * cfg.health_per_size;
        self.max_energy = size * cfg.energy_per_size;
        self.health_to_energy_ratio = cfg.health_to_energy_ratio;
        self.clamp();
    }
}

/// Photosynthesis, upkeep and starvation for every organism.
/// Reads the world's shared `EnergyConfig`, which the organism factory also uses.
#[derive(Default)]
pub struct MetabolismSystem;

impl System for MetabolismSystem {
    fn name(&self) -> &'static str {
        "metabolism"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let dt = ctx.dt;
        let cfg = ctx.energy;
        let mut starved = 0;

        for (_idx, entity) in ctx.arena.iter_alive_mut() {
            let (Some(genome), Some(metabolism)) = (&entity.genome, &mut entity.metabolism)
            else {
                continue;
            };
            let size = genome.size();
            metabolism.resize(size, cfg);

            metabolism.update_photosynthesis(dt, cfg.sunlight);
            metabolism.update_digestion(dt);

            if genome.movement_speed() <= 0.1 {
                metabolism.energy =
                    (metabolism.energy + cfg.passive_regen_rate * dt).min(metabolism.max_energy);
            }

            metabolism.drain(cfg.base_metabolic_rate * size * dt, cfg.starvation_severity);

            if metabolism.energy <= 0.0 {
                metabolism.health -= cfg.health_loss_rate * dt;
            }
            metabolism.clamp();

            if metabolism.is_dead() {
                entity.alive = false;
                starved += 1;
            }
        }

        if starved > 0 {
            tracing::debug!(tick = ctx.tick, starved, "organisms starved");
        }
        ctx.stats.starved += starved;
    }
}

impl Configurable for EnergyConfig {
    fn settings_group(&self) -> &'static str {
        "Energy"
    }

    fn settings(&self) -> Vec<Setting> {
        vec![
            Setting::number(
                "HealthToSizeMultiplier",
                "Health-Size Multiplier",
                self.health_per_size,
                (5.0, 30.0, 1.0),
                "How much health an organism has per unit of size",
            ),
            Setting::number(
                "EnergyToSizeMultiplier",
                "Energy-Size Multiplier",
                self.energy_per_size,
                (5.0, 30.0, 1.0),
                "How much energy an organism has per unit of size",
            ),
            Setting::number(
                "PassiveEnergyRegenRate",
                "Energy Regen Rate",
                self.passive_regen_rate,
                (0.0, 1.0, 0.05),
                "Energy regained per second by organisms that barely move",
            ),
            Setting::number(
                "HealthLossRate",
                "Health Loss Rate",
                self.health_loss_rate,
                (0.1, 2.0, 0.1),
                "Health lost per second when energy is depleted",
            ),
            Setting::number(
                "HealthToEnergyRatio",
                "Health to Energy Ratio",
                self.health_to_energy_ratio,
                (1.0, 10.0, 0.5),
                "How much energy one point of health is worth",
            ),
            Setting::number(
                "BaseMetabolicRate",
                "Base Metabolic Rate",
                self.base_metabolic_rate,
                (0.0, 0.5, 0.01),
                "Energy burned per second per unit of size",
            ),
            Setting::number(
                "StarvationSeverity",
                "Starvation Severity",
                self.starvation_severity,
                (0.0, 1.0, 0.05),
                "Fraction of unpaid energy cost taken from health",
            ),
            Setting::number(
                "Sunlight",
                "Sunlight",
                self.sunlight,
                (0.0, 1.0, 0.01),
                "Light intensity available to photosynthetic organisms",
            ),
        ]
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        match name {
            "HealthToSizeMultiplier" => self.health_per_size = v,
            "EnergyToSizeMultiplier" => self.energy_per_size = v,
            "PassiveEnergyRegenRate" => self.passive_regen_rate = v,
            "HealthLossRate" => self.health_loss_rate = v,
            "HealthToEnergyRatio" => self.health_to_energy_ratio = v,
            "BaseMetabolicRate" => self.base_metabolic_rate = v,
            "StarvationSeverity" => self.starvation_severity = v,
            "Sunlight" => self.sunlight = v,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn genome(size_gene: f32, photo: f32, digestion: f32) -> Genome {
        Genome::new(vec![size_gene, 0.5, 0.5, 0.5, 0.5, photo, digestion, 0.5])
    }

    fn metabolism(size_gene: f32, photo: f32, digestion: f32) -> Metabolism {
        Metabolism::from_genome(&genome(size_gene, photo, digestion), &EnergyConfig::default())
    }

    #[test]
    fn maxima_follow_size_multipliers() {
        let m = metabolism(0.5, 0.0, 0.5);
        assert_eq!(m.max_health, 10.0 * config::HEALTH_PER_SIZE);
        assert_eq!(m.max_energy, 10.0 * config::ENERGY_PER_SIZE);
        assert_eq!(m.health, m.max_health);
        assert_eq!(m.energy, m.max_energy);
    }

    #[test]
    fn photosynthesis_requires_capability() {
        let mut plant = metabolism(0.5, 0.8, 0.5).with_fill(0.5);
        let before = plant.energy;
        plant.update_photosynthesis(1.0, 0.1);
        let expected = before + plant.max_energy * 0.8 * 0.1;
        assert!((plant.energy - expected).abs() < 1e-3);

        let mut animal = metabolism(0.5, 0.6, 0.5).with_fill(0.5);
        let before = animal.energy;
        animal.update_photosynthesis(1.0, 0.1);
        assert_eq!(animal.energy, before);
    }

    #[test]
    fn photosynthesis_is_capped_at_max() {
        let mut plant = metabolism(0.5, 1.0, 0.5);
        plant.update_photosynthesis(10.0, 1.0);
        assert_eq!(plant.energy, plant.max_energy);
    }

    #[test]
    fn digestion_curves_meet_at_neutral_spectrum() {
        let neutral = metabolism(0.5, 0.0, 0.5);
        assert!((neutral.plant_digestion_efficiency() - 1.0).abs() < 1e-6);
        assert!((neutral.meat_digestion_efficiency() - 1.0).abs() < 1e-6);

        let herbivore = metabolism(0.5, 0.0, 0.0);
        assert_eq!(herbivore.plant_digestion_efficiency(), 2.0);
        assert_eq!(herbivore.meat_digestion_efficiency(), 0.0);

        let carnivore = metabolism(0.5, 0.0, 1.0);
        assert_eq!(carnivore.plant_digestion_efficiency(), 0.0);
        assert_eq!(carnivore.meat_digestion_efficiency(), 2.0);
    }

    #[test]
    fn consume_on_cooldown_changes_nothing() {
        let mut predator = metabolism(0.8, 0.0, 1.0).with_fill(0.5);
        predator.digest_cooldown = 0.5;
        let prey = metabolism(0.3, 0.0, 0.5);
        let before = predator.clone();
        assert_eq!(predator.consume(&prey), 0.0);
        assert_eq!(predator, before);
        assert_eq!(prey, metabolism(0.3, 0.0, 0.5));
    }

    #[test]
    fn consume_converts_overflow_into_health() {
        let mut predator = metabolism(0.5, 0.0, 0.5);
        predator.energy = predator.max_energy - 10.0;
        predator.health = predator.max_health - 50.0;
        let prey = metabolism(0.5, 0.0, 0.5).with_fill(0.5);

        let available = prey.energy + 0.5 * prey.health * prey.health_to_energy_ratio;
        let gained = predator.consume(&prey);
        assert!((gained - available).abs() < 1e-3);

        let overflow = gained - 10.0;
        let expected_health =
            predator.max_health - 50.0 + overflow * 0.3 / predator.health_to_energy_ratio;
        assert_eq!(predator.energy, predator.max_energy);
        assert!((predator.health - expected_health.min(predator.max_health)).abs() < 1e-3);
        assert_eq!(predator.digest_cooldown, predator.max_digest_cooldown);
    }

    #[test]
    fn drain_spills_into_health() {
        let mut m = metabolism(0.5, 0.0, 0.5);
        m.energy = 3.0;
        let health = m.health;
        m.drain(9.0, 1.0);
        assert_eq!(m.energy, 0.0);
        assert!((m.health - (health - 6.0 / m.health_to_energy_ratio)).abs() < 1e-4);
    }

    #[test]
    fn starvation_severity_scales_health_loss() {
        let mut full = metabolism(0.5, 0.0, 0.5);
        let mut half = full.clone();
        full.energy = 0.0;
        half.energy = 0.0;
        let health = full.health;
        full.drain(9.0, 1.0);
        half.drain(9.0, 0.5);
        assert!((health - half.health - (health - full.health) * 0.5).abs() < 1e-4);
        assert!((half.health - (health - 4.5 / half.health_to_energy_ratio)).abs() < 1e-4);
    }

    #[test]
    fn system_kills_starving_organisms() {
        use crate::world::World;
        let mut world = World::bare(1);
        let g = genome(0.5, 0.0, 0.5);
        let id = world.spawn_genome(g, macroquad::prelude::vec2(10.0, 10.0));
        {
            let m = world.arena.get_mut(id).unwrap().metabolism.as_mut().unwrap();
            m.energy = 0.0;
            m.health = 0.001;
        }
        let mut system = MetabolismSystem;
        world.run_system(&mut system);
        assert!(!world.arena.get(id).unwrap().alive);
    }

    proptest! {
        #[test]
        fn values_stay_clamped_under_arbitrary_updates(
            ops in prop::collection::vec((0u8..4, 0.0f32..50.0), 1..60),
            size_gene in 0.05f32..=1.0,
            photo in 0.0f32..=1.0,
            digestion in 0.0f32..=1.0,
        ) {
            let mut m = metabolism(size_gene, photo, digestion);
            let prey = metabolism(0.5, 0.0, 0.5);
            for (op, amount) in ops {
                match op {
                    0 => m.update_photosynthesis(amount, 1.0),
                    1 => m.drain(amount, 1.0),
                    2 => {
                        m.update_digestion(amount);
                        m.consume(&prey);
                    }
                    _ => m.update_digestion(amount),
                }
                prop_assert!(m.energy >= 0.0 && m.energy <= m.max_energy);
                prop_assert!(m.health >= 0.0 && m.health <= m.max_health);
            }
        }
    }
}
