use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Shortcuts")
        .open(open)
        .resizable(true)
        .default_width(560.0)
        .default_height(480.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘N", "New form");
                help_row(ui, "⌘S", "Save form (JSON)");
                help_row(ui, "⌘⇧S", "Export printable SVG");
                help_row(ui, "⌘O", "Open form");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "F1", "Toggle this window");

                ui.add_space(10.0);
                ui.label("Selection");
                help_row(ui, "⌘A", "Select all");
                help_row(ui, "⌘D", "Duplicate selected");
                help_row(ui, "Delete / Backspace", "Delete selected");
                help_row(ui, "Arrow keys", "Nudge selection");
                help_row(ui, "Shift + Arrow keys", "Nudge selection further");
                help_row(ui, "Shift + click", "Add to or remove from selection");

                ui.add_space(10.0);
                ui.label("Text editing");
                help_row(ui, "Double-click", "Edit a text, student or area field");
                help_row(ui, "Enter", "Commit a single-line field");
                help_row(ui, "⌘Enter", "Commit a text area");
                help_row(ui, "Escape", "Cancel the edit, keep stored text");
                help_row(ui, "Click outside", "Commit the edit");

                ui.add_space(10.0);
                ui.label("Tools");
                help_row(ui, "V", "Select");
                help_row(ui, "B", "Bubble grid");
                help_row(ui, "T", "Text field");
                help_row(ui, "S", "Student field");
                help_row(ui, "⇧T", "Text area");
                help_row(ui, "I", "Image");
                help_row(ui, "Space (hold)", "Pan");
                help_row(ui, "Scroll wheel", "Zoom in/out");

                ui.add_space(20.0);
                ui.heading("Bubbles");
                ui.separator();
                ui.label("Bubbles print their default label (A, B, C... or 0, 1, 2...).");
                ui.label("Set a custom label in the inspector, or mark a bubble Blank to print an empty circle.");
                ui.label("Revert drops the override and restores the default label.");

                ui.add_space(20.0);
                ui.heading("Corner Marks");
                ui.separator();
                ui.label("Four black squares let a scanner register the page.");
                ui.label("Keep answer content inside the dashed safe zone.");
                ui.code("[corner_marks]\nsafe_zone_margin = 17.0\nsafe_zone_padding = 10.0\nis_visible = true");

                ui.add_space(20.0);
                ui.heading("Files");
                ui.separator();
                ui.label("• Forms are saved as JSON files (.json)");
                ui.label("• Export to SVG for printing");
                ui.label("• Settings live in ~/.config/optiform.toml or settings.toml");
                ui.label("• Set RUST_LOG=optiform=debug for verbose logs");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [120.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}
