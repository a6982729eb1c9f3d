use macroquad::prelude::*;
use noise::{NoiseFn, Perlin};

use crate::config::{self, MovementConfig};
use crate::settings::{expect_number, Configurable, Setting, SettingValue, SettingsError};
use crate::world::{System, TickContext};

/// Spreads organisms apart in noise space so their paths are uncorrelated.
const UID_NOISE_SPACING: f64 = 31.7;
/// Golden-ratio step between the base headings of consecutive uids.
const UID_PHASE_STEP: f64 = 0.618_033_988_749_895;

/// Noise-driven wandering plus soft-bounds clamping.
pub struct MovementSystem {
    pub config: MovementConfig,
    direction: Perlin,
    speed: Perlin,
    time: f32,
}

/// Map a noise sample in [-1, 1] onto the speed factor range.
pub fn speed_factor(noise: f32) -> f32 {
    (0.6 + 0.4 * noise).clamp(config::MIN_SPEED_FACTOR, config::MAX_SPEED_FACTOR)
}

/// Distance covered in one tick.
pub fn actual_speed(
    gene_speed: f32,
    noise_factor: f32,
    starving: bool,
    cfg: &MovementConfig,
) -> f32 {
    let starvation = if starving {
        cfg.starvation_speed_factor
    } else {
        1.0
    };
    cfg.movement_scale * gene_speed * noise_factor * starvation
}

/// Energy charged for moving at `speed` for `dt`.
pub fn movement_cost(speed: f32, size: f32, dt: f32, cfg: &MovementConfig) -> f32 {
    cfg.base_cost_multiplier * speed * (1.0 + size * cfg.size_cost_factor) * dt
}

impl MovementSystem {
    pub fn new(config: MovementConfig, seed: u32) -> Self {
        Self {
            config,
            direction: Perlin::new(seed),
            speed: Perlin::new(seed.wrapping_add(1)),
            time: 0.0,
        }
    }

    fn sample(&self, channel: &Perlin, uid: u64) -> f32 {
        let t = (self.time * self.config.noise_frequency) as f64;
        channel.get([t, uid as f64 * UID_NOISE_SPACING]) as f32
    }

    /// Unit heading and speed factor for one organism at the current time.
    /// Perlin output clusters around zero, so each uid gets its own base heading.
    pub fn steering(&self, uid: u64) -> (Vec2, f32) {
        let phase = (uid as f64 * UID_PHASE_STEP).fract() as f32;
        let turn = self.sample(&self.direction, uid) * 0.5 + 0.5;
        let angle = (phase + turn) * std::f32::consts::TAU;
        let factor = speed_factor(self.sample(&self.speed, uid));
        (Vec2::from_angle(angle), factor)
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        self.time += ctx.dt;
        let severity = ctx.energy.starvation_severity;

        for (_idx, entity) in ctx.arena.iter_alive_mut() {
            let Some(pos) = entity.position else {
                continue;
            };
            let Some(genome) = entity.genome.as_ref() else {
                continue;
            };
            let radius = genome.radius();
            let gene_speed = genome.movement_speed();
            let mut next = pos;

            if gene_speed > 0.0 {
                let starving = entity
                    .metabolism
                    .as_ref()
                    .map(|m| m.is_starving())
                    .unwrap_or(false);
                let (heading, factor) = self.steering(entity.uid);
                let speed = actual_speed(gene_speed, factor, starving, &self.config);
                next += heading * speed;

                // Starving organisms crawl for free.
                if !starving {
                    if let Some(metabolism) = entity.metabolism.as_mut() {
                        let cost = movement_cost(speed, genome.size(), ctx.dt, &self.config);
                        metabolism.drain(cost, severity);
                    }
                }
            }

            entity.position = Some(ctx.bounds.clamp_soft(next, radius));
        }
    }

    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(&self.config)
    }

    fn configurable_mut(&mut self) -> Option<&mut dyn Configurable> {
        Some(&mut self.config)
    }
}

impl Configurable for MovementConfig {
    fn settings_group(&self) -> &'static str {
        "Movement"
    }

    fn settings(&self) -> Vec<Setting> {
        vec![
            Setting::number(
                "MovementScale",
                "Movement Speed",
                self.movement_scale,
                (0.1, 10.0, 0.1),
                "Distance per tick of an organism with a full speed gene",
            ),
            Setting::number(
                "NoiseFrequency",
                "Wander Frequency",
                self.noise_frequency,
                (0.05, 2.0, 0.05),
                "How quickly headings change over time",
            ),
            Setting::number(
                "StarvationSpeedFactor",
                "Starving Speed",
                self.starvation_speed_factor,
                (0.0, 1.0, 0.05),
                "Fraction of normal speed for organisms out of energy",
            ),
            Setting::number(
                "BaseCostMultiplier",
                "Movement Cost",
                self.base_cost_multiplier,
                (0.0, 5.0, 0.05),
                "Energy spent per unit of speed",
            ),
            Setting::number(
                "SizeCostFactor",
                "Size Cost Factor",
                self.size_cost_factor,
                (0.0, 0.5, 0.01),
                "Extra movement cost per unit of body size",
            ),
        ]
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        match name {
            "MovementScale" => self.movement_scale = v,
            "NoiseFrequency" => self.noise_frequency = v,
            "StarvationSpeedFactor" => self.starvation_speed_factor = v,
            "BaseCostMultiplier" => self.base_cost_multiplier = v,
            "SizeCostFactor" => self.size_cost_factor = v,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldBounds;
    use crate::entity::EntityId;
    use crate::genome::Genome;
    use crate::world::World;
    use proptest::prelude::*;

    const START: Vec2 = Vec2::new(600.0, 400.0);

    fn mover(photo: f32) -> Genome {
        Genome::new(vec![0.5, 0.5, 0.5, 0.5, 1.0, photo, 0.5, 0.5])
    }

    /// World with a single organism whose energy is set to `energy_fill` of max.
    fn world_with(genome: Genome, energy_fill: f32) -> (World, EntityId) {
        let mut world = World::bare(5);
        let id = world.spawn_genome(genome, START);
        let m = world.arena.get_mut(id).unwrap().metabolism.as_mut().unwrap();
        m.energy = m.max_energy * energy_fill;
        (world, id)
    }

    fn step(world: &mut World, id: EntityId) -> Vec2 {
        let mut system = MovementSystem::new(MovementConfig::default(), 11);
        world.run_system(&mut system);
        world.arena.get(id).unwrap().position.unwrap() - START
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn speed_factor_stays_in_range(noise in -2.0f32..2.0) {
            let f = speed_factor(noise);
            prop_assert!((config::MIN_SPEED_FACTOR..=config::MAX_SPEED_FACTOR).contains(&f));
        }

        #[test]
        fn starving_speed_is_a_fixed_fraction(gene in 0.0f32..=1.0, noise in 0.2f32..=1.0) {
            let cfg = MovementConfig { starvation_speed_factor: 0.4, ..MovementConfig::default() };
            let normal = actual_speed(gene, noise, false, &cfg);
            let starving = actual_speed(gene, noise, true, &cfg);
            prop_assert!((starving - normal * 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn starving_organism_moves_at_forty_percent() {
        let (mut fed, fed_id) = world_with(mover(0.0), 1.0);
        let (mut starving, starving_id) = world_with(mover(0.0), 0.0);
        let normal = step(&mut fed, fed_id);
        let slow = step(&mut starving, starving_id);
        assert!(normal.length() > 0.0);
        assert!((slow.length() - normal.length() * 0.4).abs() < 1e-4);
        assert!(slow.angle_between(normal).abs() < 1e-3);
    }

    #[test]
    fn photosynthetic_organisms_keep_full_speed_without_energy() {
        let (mut fed, fed_id) = world_with(mover(0.9), 1.0);
        let (mut empty, empty_id) = world_with(mover(0.9), 0.0);
        let a = step(&mut fed, fed_id);
        let b = step(&mut empty, empty_id);
        assert!((a.length() - b.length()).abs() < 1e-4);
    }

    #[test]
    fn starving_organisms_pay_no_movement_cost() {
        let (mut world, id) = world_with(mover(0.0), 0.0);
        let before = world.arena.get(id).unwrap().metabolism.clone().unwrap();
        step(&mut world, id);
        let after = world.arena.get(id).unwrap().metabolism.as_ref().unwrap();
        assert_eq!(after.energy, 0.0);
        assert_eq!(after.health, before.health);
    }

    #[test]
    fn photosynthetic_mover_without_energy_pays_in_health() {
        let (mut world, id) = world_with(mover(0.9), 0.0);
        let before = world.arena.get(id).unwrap().metabolism.clone().unwrap();
        let moved = step(&mut world, id).length();
        let after = world.arena.get(id).unwrap().metabolism.as_ref().unwrap();

        let cost = movement_cost(moved, 10.0, world.dt, &MovementConfig::default());
        assert!(cost > 0.0);
        assert_eq!(after.energy, 0.0);
        let expected = before.health - cost / before.health_to_energy_ratio;
        assert!((after.health - expected).abs() < 1e-4);
    }

    #[test]
    fn headings_have_no_preferred_direction() {
        let cfg = MovementConfig {
            noise_frequency: 1.0,
            ..MovementConfig::default()
        };
        let mut system = MovementSystem::new(cfg, 42);
        let mut sum = Vec2::ZERO;
        let mut samples = 0.0;
        for step in 0..8 {
            system.time = 0.5 + 3.0 * step as f32;
            for uid in 0..2560 {
                sum += system.steering(uid).0;
                samples += 1.0;
            }
        }
        let mean = sum / samples;
        assert!(mean.length() < 0.03, "mean heading {mean:?}");
    }

    #[test]
    fn moving_costs_energy_in_proportion_to_speed_and_size() {
        let (mut world, id) = world_with(mover(0.0), 1.0);
        let before = world.arena.get(id).unwrap().metabolism.clone().unwrap();
        let moved = step(&mut world, id).length();
        let after = world.arena.get(id).unwrap().metabolism.as_ref().unwrap();

        let expected = movement_cost(moved, 10.0, world.dt, &MovementConfig::default());
        assert!(expected > 0.0);
        assert!((before.energy - after.energy - expected).abs() < 1e-4);
    }

    #[test]
    fn stationary_organisms_do_not_move_or_pay() {
        let genome = Genome::new(vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.5, 0.5]);
        let (mut world, id) = world_with(genome, 1.0);
        let moved = step(&mut world, id);
        assert_eq!(moved, Vec2::ZERO);
        let m = world.arena.get(id).unwrap().metabolism.as_ref().unwrap();
        assert_eq!(m.energy, m.max_energy);
    }

    #[test]
    fn positions_stay_inside_the_soft_rectangle() {
        let mut world = World::bare(3);
        world.bounds = WorldBounds {
            width: 100.0,
            height: 80.0,
            overflow_pct: 0.1,
        };
        let id = world.spawn_genome(mover(0.0), vec2(-500.0, 900.0));
        let mut system = MovementSystem::new(MovementConfig::default(), 2);
        for _ in 0..120 {
            world.run_system(&mut system);
            let p = world.arena.get(id).unwrap().position.unwrap();
            // Radius 5, margins 10 and 8.
            assert!((-5.0..=105.0).contains(&p.x), "x = {}", p.x);
            assert!((-3.0..=83.0).contains(&p.y), "y = {}", p.y);
        }
    }

    #[test]
    fn different_organisms_wander_differently() {
        let mut system = MovementSystem::new(MovementConfig::default(), 8);
        system.time = 1.3;
        let (a, _) = system.steering(1);
        let (b, _) = system.steering(2);
        assert!(a.distance(b) > 1e-4);
    }
}
