use egui;

use evosim::settings::{SettingValue, SettingsGroup};
use evosim::world::World;

/// Runtime settings panel built from whatever the systems advertise.
pub fn draw_settings(ctx: &egui::Context, world: &mut World) {
    let groups = world.settings();
    let mut changes: Vec<(&'static str, &'static str, SettingValue)> = Vec::new();

    egui::Window::new("Settings")
        .default_pos(egui::pos2(20.0, 80.0))
        .default_size(egui::vec2(300.0, 480.0))
        .resizable(true)
        .vscroll(true)
        .show(ctx, |ui| {
            for group in &groups {
                ui.collapsing(group.group, |ui| {
                    draw_group(ui, group, &mut changes);
                });
            }
        });

    // Rejections are logged by the world.
    let _ = world.apply_settings(changes);
}

fn draw_group(
    ui: &mut egui::Ui,
    group: &SettingsGroup,
    changes: &mut Vec<(&'static str, &'static str, SettingValue)>,
) {
    for setting in &group.settings {
        match setting.value {
            SettingValue::Number(current) => {
                let mut value = current;
                let (min, max, step) = setting
                    .bounds
                    .map(|b| (b.min, b.max, b.step))
                    .unwrap_or((0.0, 1.0, 0.0));
                let slider = egui::Slider::new(&mut value, min..=max)
                    .text(setting.label)
                    .step_by(step as f64);
                if ui.add(slider).on_hover_text(setting.description).changed() {
                    changes.push((group.group, setting.name, SettingValue::Number(value)));
                }
            }
            SettingValue::Flag(current) => {
                let mut value = current;
                if ui
                    .checkbox(&mut value, setting.label)
                    .on_hover_text(setting.description)
                    .changed()
                {
                    changes.push((group.group, setting.name, SettingValue::Flag(value)));
                }
            }
        }
    }
}
