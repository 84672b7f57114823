use chrono::Utc;
use egui::{menu, RichText, Ui};

use crate::app::TimeloomApp;
use crate::engine::layout::LayoutMode;
use crate::model::viewport::ZOOM_LEVELS;
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimeloomApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  New Timeline").clicked() {
                app.new_timeline();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_file();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_file();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_file_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Edit  ").font(theme::font_menu()), |ui| {
            let undo_label = match app.history.peek_undo() {
                Some(kind) => format!("  Undo {}          Ctrl+Z", kind.label()),
                None => "  Undo          Ctrl+Z".to_string(),
            };
            if ui
                .add_enabled(app.history.can_undo(), egui::Button::new(undo_label))
                .clicked()
            {
                app.undo();
                ui.close_menu();
            }
            let redo_label = match app.history.peek_redo() {
                Some(kind) => format!("  Redo {}          Ctrl+Y", kind.label()),
                None => "  Redo          Ctrl+Y".to_string(),
            };
            if ui
                .add_enabled(app.history.can_redo(), egui::Button::new(redo_label))
                .clicked()
            {
                app.redo();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Add Item").clicked() {
                app.add_item_at_center();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.selected.is_some(), egui::Button::new("  Delete Item"))
                .clicked()
            {
                app.delete_selected();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll \u{2191}").clicked() {
                app.viewport.zoom_by(1.25, None);
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll \u{2193}").clicked() {
                app.viewport.zoom_by(0.8, None);
                ui.close_menu();
            }
            if ui.button("  Zoom to Fit").clicked() {
                app.zoom_to_fit();
                ui.close_menu();
            }
            if ui.button("  Go to Now").clicked() {
                app.viewport.pan_to_time(Utc::now());
                ui.close_menu();
            }
            if ui.button("  Reset View").clicked() {
                app.viewport.reset();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Zoom Level").small().weak());
            let current = app.viewport.current_level().name;
            for level in ZOOM_LEVELS {
                if ui.radio(level.name == current, level.name).clicked() {
                    app.viewport.zoom_to(level.level);
                    ui.close_menu();
                }
            }
            ui.separator();
            ui.label(RichText::new("Layout").small().weak());
            for mode in LayoutMode::ALL {
                if ui.radio_value(&mut app.mode, *mode, mode.label()).clicked() {
                    ui.close_menu();
                }
            }
        });

        ui.menu_button(RichText::new("  Data  ").font(theme::font_menu()), |ui| {
            let more = app.cache.has_more();
            if ui
                .add_enabled(more, egui::Button::new("  Load More Items"))
                .clicked()
            {
                app.cache.load_more();
                ui.close_menu();
            }
            if ui.button("  Reload").clicked() {
                app.reload_from_source();
                ui.close_menu();
            }
        });

        // Right-aligned file name with modified marker
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .file_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "untitled".to_string());
            let modified = if app.dirty { " \u{25CF}" } else { "" };
            ui.label(RichText::new(format!("{name}{modified}")).size(11.0).weak());
        });
    });
}
