use macroquad::prelude::*;

mod renderer;
mod ui;

use evosim::config::{self, SimConfig};
use evosim::world::World;
use ui::UiState;

fn window_conf() -> Conf {
    Conf {
        window_title: "EvoSim".to_string(),
        window_width: config::WORLD_WIDTH as i32,
        window_height: config::WORLD_HEIGHT as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

const SEED: u64 = 42;

/// Defaults, or the JSON file named by the first argument.
fn load_config() -> SimConfig {
    let Some(path) = std::env::args().nth(1) else {
        return SimConfig::default();
    };
    match SimConfig::load(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path, "loaded config");
            cfg
        }
        Err(err) => {
            tracing::warn!(path = %path, %err, "could not load config, using defaults");
            SimConfig::default()
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut world = World::new(load_config(), SEED);
    let mut ui_state = UiState::default();
    let mut accumulator = 0.0f64;

    loop {
        // The window is the world; overflow stays whatever the settings say.
        world.set_bounds(screen_width(), screen_height(), world.bounds.overflow_pct);

        let frame_time = get_frame_time() as f64;
        accumulator += frame_time.min(0.1);

        let effective_dt = config::FIXED_DT as f64 / ui_state.speed_multiplier as f64;
        if !ui_state.paused {
            while accumulator >= effective_dt {
                world.tick();
                accumulator -= effective_dt;
            }
        } else {
            accumulator = 0.0;
            if ui_state.step_requested {
                world.tick();
            }
        }
        ui_state.step_requested = false;

        if is_key_pressed(KeyCode::Space) {
            ui_state.paused = !ui_state.paused;
        }

        let snapshots = world.snapshot();

        let mut egui_wants_pointer = false;
        egui_macroquad::cfg(|ctx| {
            egui_wants_pointer = ctx.wants_pointer_input();
        });
        if !egui_wants_pointer && is_mouse_button_pressed(MouseButton::Left) {
            let mouse = Vec2::from(mouse_position());
            ui_state.selected = renderer::pick(&snapshots, mouse, 4.0);
        }
        if is_key_pressed(KeyCode::Escape) {
            ui_state.selected = None;
        }

        renderer::draw(&world, &snapshots, ui_state.selected);
        ui::draw_ui(&mut world, &mut ui_state);

        next_frame().await;
    }
}
