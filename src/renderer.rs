use macroquad::prelude::*;

use evosim::entity::EntityId;
use evosim::snapshot::EntitySnapshot;
use evosim::world::World;

const BG_COLOR: Color = Color::new(0.02, 0.03, 0.08, 1.0);
const BAR_HEIGHT: f32 = 2.0;

/// Draw every organism in screen space. World coordinates are window pixels.
pub fn draw(world: &World, snapshots: &[EntitySnapshot], selected: Option<EntityId>) {
    clear_background(BG_COLOR);
    draw_world_edges(world);

    for snap in snapshots {
        draw_organism(snap, selected == Some(snap.id()));
    }
}

fn draw_world_edges(world: &World) {
    let (min, max) = world.bounds.soft_rect();
    draw_rectangle_lines(
        min.x,
        min.y,
        max.x - min.x,
        max.y - min.y,
        1.0,
        Color::new(0.3, 0.4, 0.6, 0.25),
    );
}

fn draw_organism(snap: &EntitySnapshot, selected: bool) {
    let [r, g, b] = snap.color;
    let radius = (snap.size * 0.5).max(1.0);
    let color = Color::from_rgba(r, g, b, 255);

    draw_circle(snap.x, snap.y, radius, color);

    // Plants get a green rim, consumers a rim tinted by diet.
    let rim = if snap.is_plant {
        Color::new(0.3, 0.9, 0.3, 0.8)
    } else {
        let t = (snap.digestion_spectrum + 1.0) * 0.5;
        Color::new(0.4 + 0.6 * t, 0.4, 1.0 - 0.6 * t, 0.8)
    };
    draw_circle_lines(snap.x, snap.y, radius, 1.0, rim);

    if selected {
        draw_circle_lines(snap.x, snap.y, radius + 4.0, 1.5, WHITE);
    }

    let width = (radius * 2.0).max(8.0);
    let left = snap.x - width * 0.5;
    let top = snap.y - radius - 2.0 * BAR_HEIGHT - 3.0;
    draw_bar(left, top, width, snap.health_pct, Color::new(0.85, 0.3, 0.3, 0.9));
    draw_bar(
        left,
        top + BAR_HEIGHT + 1.0,
        width,
        snap.energy_pct,
        Color::new(0.9, 0.8, 0.25, 0.9),
    );
}

fn draw_bar(x: f32, y: f32, width: f32, fraction: f32, color: Color) {
    draw_rectangle(x, y, width, BAR_HEIGHT, Color::new(0.1, 0.1, 0.1, 0.7));
    draw_rectangle(x, y, width * fraction.clamp(0.0, 1.0), BAR_HEIGHT, color);
}

/// The organism under `point`, preferring the closest centre.
pub fn pick(snapshots: &[EntitySnapshot], point: Vec2, slack: f32) -> Option<EntityId> {
    snapshots
        .iter()
        .map(|s| (s, vec2(s.x, s.y).distance(point)))
        .filter(|(s, d)| *d <= s.size * 0.5 + slack)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s.id())
}
