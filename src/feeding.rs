use macroquad::prelude::*;
use std::collections::HashSet;

use crate::config::FeedingConfig;
use crate::entity::EntityArena;
use crate::metabolism::Metabolism;
use crate::settings::{expect_number, Configurable, Setting, SettingValue, SettingsError};
use crate::spatial_hash::SpatialHash;
use crate::world::{System, TickContext};

const CELL_SIZE: f32 = 64.0;

/// Predator/prey matching and the consume transaction.
pub struct FeedingSystem {
    pub config: FeedingConfig,
    spatial: Option<SpatialHash>,
}

impl Default for FeedingSystem {
    fn default() -> Self {
        Self::new(FeedingConfig::default())
    }
}

/// A predator is big enough when its size is at least `prey_size * ratio`.
pub fn is_big_enough(predator_size: f32, prey_size: f32, ratio: f32) -> bool {
    predator_size >= prey_size * ratio
}

/// Detection grows with body size.
pub fn detection_range(base_range: f32, size: f32) -> f32 {
    base_range * (0.5 + size / 20.0)
}

fn can_digest(predator: &Metabolism, prey: &Metabolism) -> bool {
    predator.efficiency_for(prey) > 0.0
}

impl FeedingSystem {
    pub fn new(config: FeedingConfig) -> Self {
        Self {
            config,
            spatial: None,
        }
    }

    /// Nearest digestible, small-enough prey for the predator in slot `idx`.
    fn find_prey(
        &self,
        idx: usize,
        arena: &EntityArena,
        spatial: &SpatialHash,
        consumed: &HashSet<usize>,
    ) -> Option<usize> {
        let predator = arena.get_by_index(idx)?;
        let pos = predator.position?;
        let metabolism = predator.metabolism.as_ref()?;
        let size = predator.genome.as_ref()?.size();
        let range = detection_range(self.config.base_detection_range, size);

        let mut best: Option<(usize, f32)> = None;
        for candidate in spatial.query_radius_excluding(pos, range, idx as u32, arena) {
            let candidate = candidate as usize;
            if consumed.contains(&candidate) {
                continue;
            }
            let Some(prey) = arena.get_by_index(candidate) else {
                continue;
            };
            let (Some(prey_pos), Some(prey_metabolism), Some(prey_genome)) =
                (prey.position, prey.metabolism.as_ref(), prey.genome.as_ref())
            else {
                continue;
            };
            if !can_digest(metabolism, prey_metabolism)
                || !is_big_enough(size, prey_genome.size(), self.config.size_ratio_threshold)
            {
                continue;
            }
            let dist_sq = pos.distance_squared(prey_pos);
            match best {
                // Strictly closer only, so ties keep the earlier index.
                Some((_, best_dist_sq)) if dist_sq >= best_dist_sq => {}
                _ => best = Some((candidate, dist_sq)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}

impl System for FeedingSystem {
    fn name(&self) -> &'static str {
        "feeding"
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let (min, max) = ctx.bounds.soft_rect();
        let mut spatial = match self.spatial.take() {
            Some(s) if s.fits(min, max, CELL_SIZE) => s,
            _ => SpatialHash::new(min, max, CELL_SIZE),
        };
        spatial.rebuild(ctx.arena);

        let mut consumed: HashSet<usize> = HashSet::new();
        let mut energy_gained = 0.0;

        for idx in 0..ctx.arena.capacity() {
            if consumed.contains(&idx) {
                continue;
            }
            let Some(predator) = ctx.arena.get_mut_by_index(idx) else {
                continue;
            };
            if !predator.alive {
                continue;
            }
            let Some(metabolism) = predator.metabolism.as_mut() else {
                continue;
            };
            metabolism.max_digest_cooldown = self.config.max_digest_cooldown;
            if metabolism.digest_cooldown > 0.0 || !metabolism.can_digest_anything() {
                continue;
            }

            let Some(prey_idx) = self.find_prey(idx, ctx.arena, &spatial, &consumed) else {
                continue;
            };
            let Some(prey_metabolism) = ctx
                .arena
                .get_by_index(prey_idx)
                .and_then(|p| p.metabolism.clone())
            else {
                continue;
            };
            if let Some(m) = ctx
                .arena
                .get_mut_by_index(idx)
                .and_then(|p| p.metabolism.as_mut())
            {
                let efficiency = self.config.digestion_efficiency;
                energy_gained += m.consume_scaled(&prey_metabolism, efficiency);
            }
            consumed.insert(prey_idx);
        }

        for &idx in &consumed {
            if let Some(prey) = ctx.arena.get_mut_by_index(idx) {
                prey.alive = false;
            }
        }

        if !consumed.is_empty() {
            tracing::debug!(
                tick = ctx.tick,
                consumed = consumed.len(),
                energy_gained,
                "feeding pass"
            );
        }
        ctx.stats.consumed += consumed.len();
        self.spatial = Some(spatial);
    }

    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(&self.config)
    }

    fn configurable_mut(&mut self) -> Option<&mut dyn Configurable> {
        Some(&mut self.config)
    }
}

impl Configurable for FeedingConfig {
    fn settings_group(&self) -> &'static str {
        "Feeding"
    }

    fn settings(&self) -> Vec<Setting> {
        vec![
            Setting::number(
                "BaseDetectionRange",
                "Prey Detection Range",
                self.base_detection_range,
                (10.0, 100.0, 5.0),
                "Base range at which organisms can detect potential food",
            ),
            Setting::number(
                "SizeRatioPredator",
                "Predator Size Ratio",
                self.size_ratio_threshold,
                (1.0, 3.0, 0.1),
                "How much larger an organism must be to consume another",
            ),
            Setting::number(
                "MaxDigestCooldown",
                "Digest Cooldown Time",
                self.max_digest_cooldown,
                (0.5, 10.0, 0.5),
                "Time in seconds between feeding actions",
            ),
            Setting::number(
                "DigestionEfficiencyFactor",
                "Digestion Efficiency",
                self.digestion_efficiency,
                (0.1, 3.0, 0.1),
                "Global multiplier for digestion efficiency",
            ),
        ]
    }

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let v = expect_number(self.settings_group(), &self.settings(), name, value)?;
        match name {
            "BaseDetectionRange" => self.base_detection_range = v,
            "SizeRatioPredator" => self.size_ratio_threshold = v,
            "MaxDigestCooldown" => self.max_digest_cooldown = v,
            "DigestionEfficiencyFactor" => self.digestion_efficiency = v,
            other => return Err(SettingsError::unknown(self.settings_group(), other)),
        }
        Ok(())
    }
}
