use crate::config::SpawnerConfig;
use crate::organism;
use crate::settings::{
    expect_flag, expect_number, Configurable, Setting, SettingValue, SettingsError,
};
use crate::world::{System, TickContext};

/// First stage of the tick: removes organisms that cannot live.
#[derive(Default)]
pub struct ViabilitySystem;

impl System for ViabilitySystem {
    fn name(&self) -> &'static str {
        "viability"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let mut culled = 0;
        for (_idx, entity) in ctx.arena.iter_alive_mut() {
            let viable = entity.genome.as_ref().is_some_and(|g| g.is_viable());
            let healthy = entity.metabolism.as_ref().map_or(true, |m| !m.is_dead());
            if !viable || !healthy {
                entity.alive = false;
                culled += 1;
            }
        }
        ctx.arena.sweep_dead();

        if culled > 0 {
            tracing::debug!(tick = ctx.tick, culled, "removed non-viable organisms");
        }
        ctx.stats.culled += culled;
    }
}

/// Last stage of the tick: clears out the dead and tops up the population.
pub struct SpawnerSystem {
    pub config: SpawnerConfig,
    elapsed: f32,
}

impl Default for SpawnerSystem {
    fn default() -> Self {
        Self::new(SpawnerConfig::default())
    }
}

impl SpawnerSystem {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
        }
    }
}

impl System for SpawnerSystem {
    fn name(&self) -> &'static str {
        "spawner"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let swept = ctx.arena.sweep_dead();
        if swept > 0 {
            tracing::debug!(tick = ctx.tick, swept, "swept dead organisms");
        }

        if !self.config.enabled || ctx.arena.count >= self.config.max_entities {
            return;
        }

        self.elapsed += ctx.dt;
        if self.elapsed < self.config.interval {
            return;
        }
        self.elapsed = 0.0;

        let room = self.config.max_entities - ctx.arena.count;
        let batch = self.config.spawn_rate.min(room);
        for _ in 0..batch {
            let bundle = organism::random_organism(ctx.bounds, ctx.energy, &mut *ctx.rng);
            ctx.arena.spawn(bundle);
        }

        if batch > 0 {
            tracing::debug!(
                tick = ctx.tick,
                spawned = batch,
                population = ctx.arena.count,
                "spawned organisms"
            );
        }
        ctx.stats.spawned += batch;
    }

    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(&self.config)
    }

    fn configurable_mut(&mut self) -> Option<&mut dyn Configurable> {
        Some(&mut self.config)
    }
}

impl Configurable for SpawnerConfig {
    fn settings_group(&self) -> &'static str {
        "Spawner"
    }

    fn settings(&self) -> Vec<Setting> {
        vec![
            Setting::flag(
                "Enabled",
                "Spawning Enabled",
                self.enabled,
                "Keep adding random organisms over time",
            ),
            Setting::number(
                "SpawnRate",
                "Spawn Rate",
                self.spawn_rate as f32,
                (0.0, 20.0, 1.0),
                "Organisms added per interval",
            ),
            Setting::number(
                "SpawnInterval",
                "Spawn Interval",
                self.interval,
                (0.1, 10.0, 0.1),
                "Seconds between spawn batches",
            ),
            Setting::number(
                "MaxEntities",
                "Spawn Cap",
                self.max_entities as f32,
                (0.0, 1000.0, 10.0),
                "No spawning at or above this many organisms",
            ),
        ]
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        if name == "Enabled" {
            self.enabled = expect_flag(name, value)?;
            return Ok(());
        }
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        match name {
            "SpawnRate" => self.spawn_rate = v.round() as usize,
            "SpawnInterval" => self.interval = v,
            "MaxEntities" => self.max_entities = v.round() as usize,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}
