use ::rand::Rng;
use macroquad::prelude::*;

use crate::config::{self, EnergyConfig, WorldBounds};
use crate::entity::OrganismBundle;
use crate::genome::Genome;
use crate::metabolism::Metabolism;
use crate::reproduction::ReproductionState;

/// A random organism somewhere inside the nominal world, at full health and energy.
pub fn random_organism(
    bounds: &WorldBounds,
    energy: &EnergyConfig,
    rng: &mut impl Rng,
) -> OrganismBundle {
    let genome = Genome::random(rng);
    let position = vec2(
        rng.gen_range(0.0..=bounds.width.max(0.0)),
        rng.gen_range(0.0..=bounds.height.max(0.0)),
    );
    from_genome(genome, position, energy)
}

/// Full health and energy, ready to reproduce.
pub fn from_genome(genome: Genome, position: Vec2, energy: &EnergyConfig) -> OrganismBundle {
    OrganismBundle {
        metabolism: Metabolism::from_genome(&genome, energy),
        genome,
        position,
        reproduction: ReproductionState::new(0.0, config::REPRODUCTION_COOLDOWN),
    }
}

/// Offspring start half full and cannot reproduce straight away.
pub fn offspring(
    genome: Genome,
    position: Vec2,
    cooldown: f32,
    max_cooldown: f32,
    energy: &EnergyConfig,
) -> OrganismBundle {
    OrganismBundle {
        metabolism: Metabolism::from_genome(&genome, energy)
            .with_fill(config::OFFSPRING_START_FRACTION),
        genome,
        position,
        reproduction: ReproductionState::new(cooldown, max_cooldown),
    }
}
