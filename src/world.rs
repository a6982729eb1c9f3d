use macroquad::prelude::*;
use rand_chacha::ChaCha8Rng;
use ::rand::SeedableRng;

use crate::config::{self, EnergyConfig, SimConfig, WorldBounds};
use crate::entity::{EntityArena, EntityId};
use crate::feeding::FeedingSystem;
use crate::genome::Genome;
use crate::metabolism::MetabolismSystem;
use crate::movement::MovementSystem;
use crate::organism;
use crate::population::{SpawnerSystem, ViabilitySystem};
use crate::reproduction::ReproductionSystem;
use crate::settings::{
    expect_number, Configurable, Setting, SettingValue, SettingsError, SettingsGroup,
};
use crate::snapshot::EntitySnapshot;
use crate::stats::{SimStats, TickStats};

impl WorldBounds {
    /// Allowed centre range on one axis for an organism of `radius`.
    fn soft_range(&self, extent: f32, radius: f32) -> (f32, f32) {
        let margin = extent * self.overflow_pct;
        let lo = -margin + radius;
        let hi = extent + margin - radius;
        if lo > hi {
            let mid = extent * 0.5;
            (mid, mid)
        } else {
            (lo, hi)
        }
    }

    /// Clamp into the nominal rectangle grown by the overflow margin, keeping the body inside.
    pub fn clamp_soft(&self, pos: Vec2, radius: f32) -> Vec2 {
        let (x_lo, x_hi) = self.soft_range(self.width, radius);
        let (y_lo, y_hi) = self.soft_range(self.height, radius);
        vec2(pos.x.clamp(x_lo, x_hi), pos.y.clamp(y_lo, y_hi))
    }

    pub fn clamp_nominal(&self, pos: Vec2) -> Vec2 {
        vec2(
            pos.x.clamp(0.0, self.width.max(0.0)),
            pos.y.clamp(0.0, self.height.max(0.0)),
        )
    }

    /// Corners of the outer soft rectangle, ignoring organism size.
    pub fn soft_rect(&self) -> (Vec2, Vec2) {
        let mx = self.width * self.overflow_pct;
        let my = self.height * self.overflow_pct;
        (
            vec2(-mx, -my),
            vec2(self.width + mx, self.height + my),
        )
    }
}

impl Configurable for WorldBounds {
    fn settings_group(&self) -> &'static str {
        "World"
    }

    fn settings(&self) -> Vec<Setting> {
        vec![Setting::number(
            "OverflowPercentage",
            "Edge Overflow",
            self.overflow_pct,
            (0.0, 0.5, 0.01),
            "How far past the window edge organisms may drift, as a fraction of its size",
        )]
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        match name {
            "OverflowPercentage" => self.overflow_pct = v,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}

/// Shared state handed to each system for one update.
pub struct TickContext<'a> {
    pub arena: &'a mut EntityArena,
    pub bounds: &'a WorldBounds,
    pub energy: &'a EnergyConfig,
    pub rng: &'a mut ChaCha8Rng,
    pub stats: &'a mut TickStats,
    pub dt: f32,
    pub tick: u64,
}

/// One stage of the tick pipeline. Systems only talk to each other through entity state.
pub trait System {
    fn name(&self) -> &'static str;

    fn update(&mut self, ctx: &mut TickContext);

    fn configurable(&self) -> Option<&dyn Configurable> {
        None
    }

    fn configurable_mut(&mut self) -> Option<&mut dyn Configurable> {
        None
    }
}

/// Entity container plus the ordered list of systems run every tick.
pub struct World {
    pub arena: EntityArena,
    pub bounds: WorldBounds,
    pub energy: EnergyConfig,
    pub rng: ChaCha8Rng,
    pub dt: f32,
    pub tick_count: u64,
    pub last_tick: TickStats,
    pub stats: SimStats,
    systems: Vec<Box<dyn System>>,
}

impl World {
    /// No systems and no organisms.
    pub fn bare(seed: u64) -> Self {
        Self {
            arena: EntityArena::new(config::MAX_POPULATION),
            bounds: WorldBounds::default(),
            energy: EnergyConfig::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            dt: config::FIXED_DT,
            tick_count: 0,
            last_tick: TickStats::default(),
            stats: SimStats::new(1000),
            systems: Vec::new(),
        }
    }

    /// The full pipeline, seeded with the configured starting population.
    pub fn new(cfg: SimConfig, seed: u64) -> Self {
        let initial = cfg.initial_population();
        let mut world = Self::bare(seed);
        world.bounds = cfg.bounds;
        world.energy = cfg.energy;

        world.add_system(Box::new(ViabilitySystem));
        world.add_system(Box::new(MetabolismSystem));
        world.add_system(Box::new(FeedingSystem::new(cfg.feeding)));
        world.add_system(Box::new(MovementSystem::new(cfg.movement, seed as u32)));
        world.add_system(Box::new(ReproductionSystem::new(cfg.reproduction)));
        world.add_system(Box::new(SpawnerSystem::new(cfg.spawner)));

        world.spawn_random(initial);
        tracing::info!(
            seed,
            population = world.arena.count,
            width = world.bounds.width,
            height = world.bounds.height,
            "world created"
        );
        world
    }

    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn spawn_random(&mut self, count: usize) -> usize {
        for _ in 0..count {
            let bundle = organism::random_organism(&self.bounds, &self.energy, &mut self.rng);
            self.arena.spawn(bundle);
        }
        count
    }

    pub fn spawn_genome(&mut self, genome: Genome, pos: Vec2) -> EntityId {
        self.arena
            .spawn(organism::from_genome(genome, pos, &self.energy))
    }

    /// Advance one tick: every registered system runs once, in order.
    pub fn tick(&mut self) {
        let mut stats = TickStats::default();
        {
            let mut ctx = TickContext {
                arena: &mut self.arena,
                bounds: &self.bounds,
                energy: &self.energy,
                rng: &mut self.rng,
                stats: &mut stats,
                dt: self.dt,
                tick: self.tick_count,
            };
            for system in self.systems.iter_mut() {
                system.update(&mut ctx);
            }
        }
        self.stats.record(&stats, self.arena.count);
        self.last_tick = stats;
        self.tick_count += 1;
    }

    /// Run a single system outside the pipeline, against this world's state.
    pub fn run_system(&mut self, system: &mut dyn System) {
        let mut ctx = TickContext {
            arena: &mut self.arena,
            bounds: &self.bounds,
            energy: &self.energy,
            rng: &mut self.rng,
            stats: &mut self.last_tick,
            dt: self.dt,
            tick: self.tick_count,
        };
        system.update(&mut ctx);
    }

    /// New window size or margin; used from the next tick on.
    pub fn set_bounds(&mut self, width: f32, height: f32, overflow_pct: f32) {
        let bounds = WorldBounds {
            width,
            height,
            overflow_pct,
        };
        if bounds != self.bounds {
            tracing::info!(width, height, overflow_pct, "world bounds changed");
            self.bounds = bounds;
        }
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.arena
            .iter_alive()
            .filter_map(|(idx, e)| EntitySnapshot::from_entity(self.arena.id_at(idx)?, e))
            .collect()
    }

    pub fn settings(&self) -> Vec<SettingsGroup> {
        let mut groups = vec![self.bounds.describe(), self.energy.describe()];
        groups.extend(
            self.systems
                .iter()
                .filter_map(|s| s.configurable().map(|c| c.describe())),
        );
        groups
    }

    pub fn apply_setting(
        &mut self,
        group: &str,
        name: &str,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        let result = if group == self.bounds.settings_group() {
            self.bounds.apply_setting(name, value)
        } else if group == self.energy.settings_group() {
            self.energy.apply_setting(name, value)
        } else {
            self.systems
                .iter_mut()
                .filter_map(|s| s.configurable_mut())
                .find(|c| c.settings_group() == group)
                .ok_or_else(|| SettingsError::UnknownGroup(group.to_string()))
                .and_then(|c| c.apply_setting(name, value))
        };
        match &result {
            Ok(()) => tracing::debug!(group, name, ?value, "setting applied"),
            Err(err) => tracing::warn!(group, name, %err, "setting rejected"),
        }
        result
    }

    /// Apply a batch of changes read from the UI; returns every rejection.
    pub fn apply_settings<'s>(
        &mut self,
        changes: impl IntoIterator<Item = (&'s str, &'s str, SettingValue)>,
    ) -> Vec<SettingsError> {
        changes
            .into_iter()
            .filter_map(|(group, name, value)| self.apply_setting(group, name, value).err())
            .collect()
    }
}
