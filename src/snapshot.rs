use serde::Serialize;

use crate::entity::{Entity, EntityId};

/// Read-only view of one organism for renderers and inspectors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub index: u32,
    pub generation: u32,
    pub x: f32,
    pub y: f32,
    pub color: [u8; 3],
    pub size: f32,
    pub health_pct: f32,
    pub energy_pct: f32,
    pub is_plant: bool,
    pub digestion_spectrum: f32,
}

impl EntitySnapshot {
    /// `None` when the entity is missing a component a renderer needs.
    pub fn from_entity(id: EntityId, entity: &Entity) -> Option<Self> {
        let genome = entity.genome.as_ref()?;
        let metabolism = entity.metabolism.as_ref()?;
        let pos = entity.position?;
        Some(Self {
            index: id.index,
            generation: id.generation,
            x: pos.x,
            y: pos.y,
            color: genome.rgb(),
            size: genome.size(),
            health_pct: metabolism.health_percentage(),
            energy_pct: metabolism.energy_percentage(),
            is_plant: metabolism.is_plant_material(),
            digestion_spectrum: genome.digestion_spectrum(),
        })
    }

    pub fn id(&self) -> EntityId {
        EntityId {
            index: self.index,
            generation: self.generation,
        }
    }
}
