use egui;

use super::UiState;
use evosim::world::World;

/// Details for the organism picked with the mouse.
pub fn draw_inspector(ctx: &egui::Context, world: &World, ui_state: &mut UiState) {
    egui::Window::new("Inspector")
        .default_pos(egui::pos2(1000.0, 80.0))
        .default_size(egui::vec2(240.0, 260.0))
        .resizable(true)
        .show(ctx, |ui| {
            let Some(id) = ui_state.selected else {
                ui.label("Click an organism to inspect it.");
                return;
            };
            let Some(entity) = world.arena.get(id).filter(|e| e.alive) else {
                ui_state.selected = None;
                ui.label("Selected organism is gone.");
                return;
            };

            ui.label(format!("Organism #{}", entity.uid));
            ui.separator();

            if let Some(m) = &entity.metabolism {
                bar(ui, "Health", m.health_percentage(), egui::Color32::from_rgb(220, 80, 80));
                bar(ui, "Energy", m.energy_percentage(), egui::Color32::from_rgb(230, 200, 70));
                let diet = diet_label(m.digestion_spectrum, m.can_photosynthesize);
                ui.label(format!("Diet: {diet}"));
                if m.digest_cooldown > 0.0 {
                    ui.label(format!("Digesting: {:.1}s", m.digest_cooldown));
                }
            }
            if let Some(r) = &entity.reproduction {
                ui.label(format!("Reproduction cooldown: {:.1}s", r.cooldown));
            }

            if let Some(g) = &entity.genome {
                ui.separator();
                ui.label(format!("Size: {:.1}", g.size()));
                ui.label(format!("Speed gene: {:.2}", g.movement_speed()));
                match g.reproduction_threshold() {
                    Some(t) => ui.label(format!("Breeds above {:.0}% energy", t * 100.0)),
                    None => ui.label("Infertile"),
                };
                ui.collapsing(format!("Genes ({})", g.len()), |ui| {
                    for (i, gene) in g.genes.iter().enumerate() {
                        ui.monospace(format!("{i:>3}: {gene:.3}"));
                    }
                });
            }
        });
}

fn diet_label(spectrum: f32, photosynthetic: bool) -> &'static str {
    if photosynthetic {
        "photosynthetic"
    } else if spectrum < -0.33 {
        "herbivore"
    } else if spectrum > 0.33 {
        "carnivore"
    } else {
        "omnivore"
    }
}

fn bar(ui: &mut egui::Ui, label: &str, fraction: f32, color: egui::Color32) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(
            egui::ProgressBar::new(fraction.clamp(0.0, 1.0))
                .fill(color)
                .desired_width(140.0),
        );
    });
}
