use ::rand::Rng;
use macroquad::prelude::*;

use crate::config::{self, ReproductionConfig};
use crate::entity::OrganismBundle;
use crate::genome::MutationKind;
use crate::organism;
use crate::settings::{
    expect_flag, expect_number, Configurable, Setting, SettingValue, SettingsError,
};
use crate::world::{System, TickContext};

#[derive(Clone, Debug, PartialEq)]
pub struct ReproductionState {
    pub cooldown: f32,
    pub max_cooldown: f32,
}

impl ReproductionState {
    pub fn new(cooldown: f32, max_cooldown: f32) -> Self {
        Self {
            cooldown,
            max_cooldown,
        }
    }

    pub fn can_reproduce(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn update(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown = self.max_cooldown;
    }
}

/// Pending birth record (to avoid borrow conflicts during iteration).
struct Birth {
    offspring: OrganismBundle,
}

/// Energy-gated, density-damped asexual reproduction.
#[derive(Default)]
pub struct ReproductionSystem {
    pub config: ReproductionConfig,
}

impl ReproductionSystem {
    pub fn new(config: ReproductionConfig) -> Self {
        Self { config }
    }

    /// Multiplier in (-inf, 1] applied to the per-tick birth chance.
    pub fn population_factor(&self, population: usize) -> f32 {
        let max = self.config.max_population.max(1) as f32;
        1.0 - population as f32 / max * self.config.population_scale
    }
}

impl System for ReproductionSystem {
    fn name(&self) -> &'static str {
        "reproduction"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let cfg = &self.config;
        let population = ctx.arena.alive_count();
        let population_factor = self.population_factor(population);
        // Cooldowns keep running even when nobody may breed.
        let closed = population >= cfg.max_population || population_factor <= 0.0;

        let dt = ctx.dt;
        let bounds = *ctx.bounds;
        let energy_cfg = ctx.energy;
        let mut births: Vec<Birth> = Vec::new();
        let mut infertile = 0;

        for (_idx, entity) in ctx.arena.iter_alive_mut() {
            let Some(state) = entity.reproduction.as_mut() else {
                continue;
            };
            state.update(dt);

            let (Some(genome), Some(metabolism), Some(pos)) =
                (&entity.genome, entity.metabolism.as_mut(), entity.position)
            else {
                continue;
            };
            if closed || !state.can_reproduce() {
                continue;
            }
            if cfg.require_energy_threshold {
                // Infertile genomes have no threshold and can never pass the gate.
                let Some(threshold) = genome.reproduction_threshold() else {
                    continue;
                };
                if metabolism.energy < metabolism.max_energy * threshold {
                    continue;
                }
            }
            if population + births.len() >= cfg.max_population {
                continue;
            }
            if ctx.rng.gen::<f32>() > population_factor * cfg.base_chance {
                continue;
            }

            metabolism.energy -= metabolism.max_energy * cfg.cost_fraction;
            metabolism.clamp();
            state.max_cooldown = cfg.max_cooldown;
            state.reset_cooldown();

            let Some(child) =
                genome.reproduce(cfg.mutation_rate, &cfg.mutation_weights, &mut *ctx.rng)
            else {
                infertile += 1;
                continue;
            };
            if !child.is_viable() {
                continue;
            }

            let spread = genome.size().max(1.0);
            let offset = vec2(
                ctx.rng.gen_range(-spread..=spread),
                ctx.rng.gen_range(-spread..=spread),
            );
            let child_pos = bounds.clamp_nominal(pos + offset);
            let cooldown = cfg.max_cooldown * ctx.rng.gen_range(0.5..=1.0);
            births.push(Birth {
                offspring: organism::offspring(
                    child,
                    child_pos,
                    cooldown,
                    cfg.max_cooldown,
                    energy_cfg,
                ),
            });
        }

        let born = births.len();
        for birth in births {
            ctx.arena.spawn(birth.offspring);
        }
        if born > 0 || infertile > 0 {
            tracing::debug!(tick = ctx.tick, born, infertile, "reproduction pass");
        }
        ctx.stats.births += born;
    }

    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(&self.config)
    }

    fn configurable_mut(&mut self) -> Option<&mut dyn Configurable> {
        Some(&mut self.config)
    }
}

fn weight_setting_name(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::PointMutation => "WeightPointMutation",
        MutationKind::Deletion => "WeightDeletion",
        MutationKind::Duplication => "WeightDuplication",
        MutationKind::Inversion => "WeightInversion",
        MutationKind::Translocation => "WeightTranslocation",
        MutationKind::Insertion => "WeightInsertion",
    }
}

fn weight_setting_label(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::PointMutation => "PointMutation Weight",
        MutationKind::Deletion => "Deletion Weight",
        MutationKind::Duplication => "Duplication Weight",
        MutationKind::Inversion => "Inversion Weight",
        MutationKind::Translocation => "Translocation Weight",
        MutationKind::Insertion => "Insertion Weight",
    }
}

impl Configurable for ReproductionConfig {
    fn settings_group(&self) -> &'static str {
        "Reproduction"
    }

    fn settings(&self) -> Vec<Setting> {
        let mut settings = vec![
            Setting::number(
                "BaseMutationRate",
                "Base Mutation Rate",
                self.mutation_rate,
                (0.0, 1.0, 0.05),
                "Probability of a mutation per reproduction",
            ),
            Setting::number(
                "MaxOrganismCount",
                "Max Population",
                self.max_population as f32,
                (50.0, 1000.0, 50.0),
                "Maximum number of organisms allowed to reproduce into the world",
            ),
            Setting::number(
                "PopulationScaleFactor",
                "Population Effect",
                self.population_scale,
                (0.0, 1.0, 0.1),
                "How strongly population density suppresses reproduction",
            ),
            Setting::flag(
                "RequireEnergyThreshold",
                "Energy Threshold Required",
                self.require_energy_threshold,
                "Whether reproduction requires reaching the genetic energy threshold",
            ),
            Setting::number(
                "ReproductionChance",
                "Reproduction Chance",
                self.base_chance,
                (0.0, 1.0, 0.01),
                "Per-tick chance of an eligible organism reproducing",
            ),
            Setting::number(
                "ReproductionCost",
                "Reproduction Cost",
                self.cost_fraction,
                (0.0, 1.0, 0.05),
                "Fraction of maximum energy a parent spends per reproduction",
            ),
            Setting::number(
                "ReproductionCooldown",
                "Reproduction Cooldown",
                self.max_cooldown,
                (1.0, 60.0, 1.0),
                "Seconds between two reproductions of one organism",
            ),
        ];
        for kind in MutationKind::ALL {
            settings.push(Setting::number(
                weight_setting_name(kind),
                weight_setting_label(kind),
                self.mutation_weights.weight(kind),
                (0.0, 1.0, 0.05),
                "Relative probability of this mutation operator",
            ));
        }
        settings
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        if name == "RequireEnergyThreshold" {
            self.require_energy_threshold = expect_flag(name, value)?;
            return Ok(());
        }
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        if let Some(kind) = MutationKind::ALL
            .into_iter()
            .find(|k| weight_setting_name(*k) == name)
        {
            self.mutation_weights.set_weight(kind, v);
            return Ok(());
        }
        match name {
            "BaseMutationRate" => self.mutation_rate = v,
            "MaxOrganismCount" => self.max_population = v.round() as usize,
            "PopulationScaleFactor" => self.population_scale = v,
            "ReproductionChance" => self.base_chance = v,
            "ReproductionCost" => self.cost_fraction = v,
            "ReproductionCooldown" => self.max_cooldown = v,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}

impl Default for ReproductionState {
    fn default() -> Self {
        Self::new(0.0, config::REPRODUCTION_COOLDOWN)
    }
}
