use macroquad::prelude::*;

use crate::genome::Genome;
use crate::metabolism::Metabolism;
use crate::reproduction::ReproductionState;

/// Stable handle to an entity. The generation field invalidates stale references.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

/// The closed set of component kinds an entity can carry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComponentKind {
    Genome,
    Metabolism,
    Position,
    Reproduction,
}

/// One organism: a fixed set of optional, statically typed component slots.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Never reused within an arena; seeds per-entity noise.
    pub uid: u64,
    pub alive: bool,
    pub genome: Option<Genome>,
    pub metabolism: Option<Metabolism>,
    pub position: Option<Vec2>,
    pub reproduction: Option<ReproductionState>,
}

impl Entity {
    pub fn has(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Genome => self.genome.is_some(),
            ComponentKind::Metabolism => self.metabolism.is_some(),
            ComponentKind::Position => self.position.is_some(),
            ComponentKind::Reproduction => self.reproduction.is_some(),
        }
    }
}

/// Every component a freshly created organism needs, inserted in one step.
#[derive(Clone, Debug)]
pub struct OrganismBundle {
    pub genome: Genome,
    pub metabolism: Metabolism,
    pub position: Vec2,
    pub reproduction: ReproductionState,
}

/// Arena-based entity storage with generational indices and free list.
pub struct EntityArena {
    pub entities: Vec<Option<Entity>>,
    pub generations: Vec<u32>,
    pub free_list: Vec<u32>,
    pub count: usize,
    next_uid: u64,
}

impl EntityArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            entities: vec![None; capacity],
            generations: vec![0; capacity],
            free_list: (0..capacity as u32).rev().collect(),
            count: 0,
            next_uid: 0,
        }
    }

    pub fn spawn(&mut self, bundle: OrganismBundle) -> EntityId {
        let entity = Entity {
            uid: self.next_uid(),
            alive: true,
            genome: Some(bundle.genome),
            metabolism: Some(bundle.metabolism),
            position: Some(bundle.position),
            reproduction: Some(bundle.reproduction),
        };
        self.insert(entity)
    }

    /// Insert an entity as-is, including one with empty component slots.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.entities[idx] = Some(entity);
            EntityId {
                index,
                generation: self.generations[idx],
            }
        } else {
            // Grow the arena
            let index = self.entities.len() as u32;
            self.entities.push(Some(entity));
            self.generations.push(0);
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    pub fn next_uid(&mut self) -> u64 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let idx = id.index as usize;
        if idx < self.entities.len()
            && self.generations[idx] == id.generation
            && self.entities[idx].is_some()
        {
            self.release(idx);
            true
        } else {
            false
        }
    }

    fn release(&mut self, idx: usize) {
        self.entities[idx] = None;
        self.generations[idx] += 1;
        self.free_list.push(idx as u32);
        self.count -= 1;
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let idx = id.index as usize;
        if idx < self.entities.len() && self.generations[idx] == id.generation {
            self.entities[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let idx = id.index as usize;
        if idx < self.entities.len() && self.generations[idx] == id.generation {
            self.entities[idx].as_mut()
        } else {
            None
        }
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index).and_then(|e| e.as_ref())
    }

    pub fn get_mut_by_index(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index).and_then(|e| e.as_mut())
    }

    pub fn id_at(&self, index: usize) -> Option<EntityId> {
        self.get_by_index(index).map(|_| EntityId {
            index: index as u32,
            generation: self.generations[index],
        })
    }

    /// Remove entities flagged dead and reclaim their slots. Returns how many went.
    pub fn sweep_dead(&mut self) -> usize {
        let mut removed = 0;
        for idx in 0..self.entities.len() {
            if matches!(&self.entities[idx], Some(e) if !e.alive) {
                self.release(idx);
                removed += 1;
            }
        }
        removed
    }

    /// Iterate over (index, &Entity) for all alive entities.
    pub fn iter_alive(&self) -> impl Iterator<Item = (usize, &Entity)> {
        self.entities.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .and_then(|e| if e.alive { Some((i, e)) } else { None })
        })
    }

    pub fn iter_alive_mut(&mut self) -> impl Iterator<Item = (usize, &mut Entity)> {
        self.entities.iter_mut().enumerate().filter_map(|(i, slot)| {
            slot.as_mut()
                .and_then(|e| if e.alive { Some((i, e)) } else { None })
        })
    }

    pub fn alive_count(&self) -> usize {
        self.iter_alive().count()
    }

    pub fn capacity(&self) -> usize {
        self.entities.len()
    }
}
