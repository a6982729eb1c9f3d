//! Artificial-life core: genomes, metabolism, feeding, movement and
//! reproduction systems dispatched over a generational entity arena.

pub mod config;
pub mod entity;
pub mod feeding;
pub mod genome;
pub mod metabolism;
pub mod movement;
pub mod organism;
pub mod population;
pub mod reproduction;
pub mod settings;
pub mod snapshot;
pub mod spatial_hash;
pub mod stats;
pub mod world;
