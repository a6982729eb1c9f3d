use macroquad::prelude::*;

use crate::entity::EntityArena;

/// Uniform grid over a rectangle. Positions outside it fall into the edge cells.
pub struct SpatialHash {
    origin: Vec2,
    inv_cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<u32>>,
}

impl SpatialHash {
    pub fn new(min: Vec2, max: Vec2, cell_size: f32) -> Self {
        let extent = (max - min).max(Vec2::ONE);
        let cols = ((extent.x / cell_size).ceil() as usize).max(1);
        let rows = ((extent.y / cell_size).ceil() as usize).max(1);
        let cells = (0..cols * rows).map(|_| Vec::with_capacity(8)).collect();
        Self {
            origin: min,
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells,
        }
    }

    /// Same grid, unless the covered rectangle changed.
    pub fn fits(&self, min: Vec2, max: Vec2, cell_size: f32) -> bool {
        let other = Self::dimensions(min, max, cell_size);
        self.origin == min
            && (1.0 / cell_size - self.inv_cell_size).abs() < f32::EPSILON
            && other == (self.cols, self.rows)
    }

    fn dimensions(min: Vec2, max: Vec2, cell_size: f32) -> (usize, usize) {
        let extent = (max - min).max(Vec2::ONE);
        (
            ((extent.x / cell_size).ceil() as usize).max(1),
            ((extent.y / cell_size).ceil() as usize).max(1),
        )
    }

    fn cell_coords(&self, pos: Vec2) -> (i32, i32) {
        let local = (pos - self.origin) * self.inv_cell_size;
        let cx = (local.x.floor() as i32).clamp(0, self.cols as i32 - 1);
        let cy = (local.y.floor() as i32).clamp(0, self.rows as i32 - 1);
        (cx, cy)
    }

    /// Clear all cells and re-insert all alive entities that have a position.
    pub fn rebuild(&mut self, arena: &EntityArena) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for (idx, e) in arena.iter_alive() {
            if let Some(pos) = e.position {
                let (cx, cy) = self.cell_coords(pos);
                self.cells[cy as usize * self.cols + cx as usize].push(idx as u32);
            }
        }
    }

    /// All alive entity indices within `radius` of `pos`, in ascending index order.
    pub fn query_radius(&self, pos: Vec2, radius: f32, arena: &EntityArena) -> Vec<u32> {
        let mut result = Vec::new();
        let radius_sq = radius * radius;

        let (min_x, min_y) = self.cell_coords(pos - Vec2::splat(radius));
        let (max_x, max_y) = self.cell_coords(pos + Vec2::splat(radius));

        for gy in min_y..=max_y {
            for gx in min_x..=max_x {
                let cell_idx = gy as usize * self.cols + gx as usize;
                for &entity_idx in &self.cells[cell_idx] {
                    if let Some(e) = arena.get_by_index(entity_idx as usize) {
                        if !e.alive {
                            continue;
                        }
                        let Some(other) = e.position else {
                            continue;
                        };
                        if pos.distance_squared(other) <= radius_sq {
                            result.push(entity_idx);
                        }
                    }
                }
            }
        }

        result.sort_unstable();
        result
    }

    /// Query all entity indices within `radius` of `pos`, excluding a specific index.
    pub fn query_radius_excluding(
        &self,
        pos: Vec2,
        radius: f32,
        exclude_idx: u32,
        arena: &EntityArena,
    ) -> Vec<u32> {
        let mut result = self.query_radius(pos, radius, arena);
        result.retain(|&idx| idx != exclude_idx);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyConfig;
    use crate::genome::Genome;
    use crate::organism;

    fn spawn_at(arena: &mut EntityArena, pos: Vec2) -> u32 {
        let bundle = organism::from_genome(
            Genome::new(vec![0.5; 8]),
            pos,
            &EnergyConfig::default(),
        );
        arena.spawn(bundle).index
    }

    #[test]
    fn dead_entities_are_not_returned_from_queries() {
        let mut arena = EntityArena::new(2);
        spawn_at(&mut arena, vec2(50.0, 50.0));
        let dead = spawn_at(&mut arena, vec2(55.0, 50.0));
        arena.get_mut_by_index(dead as usize).unwrap().alive = false;

        let mut spatial = SpatialHash::new(vec2(0.0, 0.0), vec2(200.0, 200.0), 32.0);
        spatial.rebuild(&arena);

        let neighbors = spatial.query_radius(vec2(50.0, 50.0), 20.0, &arena);
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn negative_and_out_of_grid_positions_are_found() {
        let mut arena = EntityArena::new(3);
        let a = spawn_at(&mut arena, vec2(-8.0, -8.0));
        let b = spawn_at(&mut arena, vec2(230.0, 10.0));
        let mut spatial = SpatialHash::new(vec2(-10.0, -10.0), vec2(210.0, 210.0), 32.0);
        spatial.rebuild(&arena);

        assert_eq!(spatial.query_radius(vec2(0.0, 0.0), 15.0, &arena), vec![a]);
        assert_eq!(spatial.query_radius(vec2(225.0, 10.0), 10.0, &arena), vec![b]);
    }

    #[test]
    fn results_are_in_index_order_across_cells() {
        let mut arena = EntityArena::new(3);
        let far = spawn_at(&mut arena, vec2(90.0, 10.0));
        let near = spawn_at(&mut arena, vec2(10.0, 10.0));
        let mut spatial = SpatialHash::new(vec2(0.0, 0.0), vec2(100.0, 100.0), 16.0);
        spatial.rebuild(&arena);
        let found = spatial.query_radius_excluding(vec2(50.0, 10.0), 45.0, 99, &arena);
        assert_eq!(found, vec![far, near]);
    }
}
