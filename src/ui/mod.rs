pub mod graphs;
pub mod inspector;
pub mod settings;
pub mod toolbar;

use evosim::entity::EntityId;
use evosim::world::World;

/// Viewer-side state: pause, speed and which panels are open.
pub struct UiState {
    pub paused: bool,
    pub step_requested: bool,
    pub speed_multiplier: f32,
    pub selected: Option<EntityId>,
    pub show_inspector: bool,
    pub show_graphs: bool,
    pub show_settings: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            paused: false,
            step_requested: false,
            speed_multiplier: 1.0,
            selected: None,
            show_inspector: true,
            show_graphs: false,
            show_settings: true,
        }
    }
}

/// Draw all egui UI panels.
pub fn draw_ui(world: &mut World, ui_state: &mut UiState) {
    egui_macroquad::ui(|ctx| {
        toolbar::draw_toolbar(ctx, world, ui_state);

        if ui_state.show_inspector {
            inspector::draw_inspector(ctx, world, ui_state);
        }

        if ui_state.show_graphs {
            graphs::draw_graphs(ctx, &world.stats);
        }

        if ui_state.show_settings {
            settings::draw_settings(ctx, world);
        }
    });

    egui_macroquad::draw();
}
