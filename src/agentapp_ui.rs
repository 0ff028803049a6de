use eframe::egui;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::time::Duration;

use crate::agentapp::{write_output, AgentApp, SETTINGS_TAB};
use crate::llmclient::is_failure;
use crate::task_kind::TaskKind;

impl eframe::App for AgentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep polling while any worker is outstanding
        if self.tabs.iter().any(|tab| tab.is_busy()) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.process_responses(ctx);

        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (i, kind) in TaskKind::ALL.iter().enumerate() {
                    ui.selectable_value(&mut self.active_tab, i, kind.tab_title());
                }
                ui.selectable_value(&mut self.active_tab, SETTINGS_TAB, "Settings");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.active_tab {
            0 => self.render_task_tab(ui, TaskKind::Text),
            1 => self.render_task_tab(ui, TaskKind::Code),
            2 => self.render_mesh_tab(ui),
            _ => self.render_settings_tab(ui),
        });
    }
}

fn notify(level: MessageLevel, title: &str, description: &str) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

impl AgentApp {
    fn render_prompt_controls(&mut self, ui: &mut egui::Ui, kind: TaskKind, rows: usize) {
        ui.label("Request:");
        let tab = self.tab_mut(kind);
        let response = ui.add_sized(
            [ui.available_width(), rows as f32 * 18.0],
            egui::TextEdit::multiline(&mut tab.input)
                .hint_text(kind.input_hint())
                .desired_rows(rows),
        );
        let shortcut = response.has_focus()
            && ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.ctrl);

        ui.horizontal(|ui| {
            let busy = self.tab(kind).is_busy();
            let label = if busy { kind.busy_label() } else { kind.send_label() };
            let clicked = ui.add_enabled(!busy, egui::Button::new(label)).clicked();
            if busy {
                ui.spinner();
            }
            if (clicked || (shortcut && !busy)) && !self.tab(kind).input.trim().is_empty() {
                self.send(kind);
            }
            if kind != TaskKind::Mesh && ui.button("Save").clicked() {
                self.save_output(kind);
            }
        });
    }

    fn render_task_tab(&mut self, ui: &mut egui::Ui, kind: TaskKind) {
        self.render_prompt_controls(ui, kind, 5);
        ui.add_space(8.0);
        ui.label(if kind == TaskKind::Code { "Code:" } else { "Response:" });

        let tab = self.tab(kind);
        let failed = is_failure(&tab.output);
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let mut text = tab.output.as_str();
                let edit = egui::TextEdit::multiline(&mut text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(20);
                let edit = if kind == TaskKind::Code { edit.code_editor() } else { edit };
                if failed {
                    ui.visuals_mut().override_text_color = Some(egui::Color32::RED);
                }
                ui.add(edit);
            });
    }

    fn render_mesh_tab(&mut self, ui: &mut egui::Ui) {
        egui::SidePanel::left("mesh_controls")
            .resizable(false)
            .exact_width(400.0)
            .show_inside(ui, |ui| {
                self.render_prompt_controls(ui, TaskKind::Mesh, 3);
                ui.add_space(8.0);

                let changed = egui::ScrollArea::vertical()
                    .max_height((ui.available_height() - 90.0).max(80.0))
                    .show(ui, |ui| {
                        let tab = self.tab_mut(TaskKind::Mesh);
                        ui.add(
                            egui::TextEdit::multiline(&mut tab.output)
                                .hint_text("OBJ code will appear here...")
                                .code_editor()
                                .desired_width(f32::INFINITY)
                                .desired_rows(20),
                        )
                        .changed()
                    })
                    .inner;
                if changed {
                    self.mesh_text_edited();
                }

                ui.add_space(4.0);
                if ui.button("Save as .obj").clicked() {
                    self.save_output(TaskKind::Mesh);
                }
                if ui.button("Add to scene").clicked() {
                    self.insert_into_scene();
                }
                if ui.button("Copy OBJ").clicked() {
                    let text = self.tab(TaskKind::Mesh).output.trim().to_string();
                    if !text.is_empty() {
                        ui.output_mut(|o| o.copied_text = text);
                    }
                }
            });

        egui::CentralPanel::default().show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                let mesh = self.viewer.mesh();
                ui.label(format!("{} vertices, {} faces", mesh.vertex_count(), mesh.face_count()));
                if ui.button("Reset view").clicked() {
                    self.viewer.reset_view();
                }
            });
            self.viewer.show(ui);
        });
    }

    fn render_settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);

        let draft = &mut self.settings_draft;
        ui.label("API key (OpenRouter):");
        ui.add(
            egui::TextEdit::singleline(&mut draft.api_key)
                .password(true)
                .hint_text("Enter your API key (optional)")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        for (label, prompt) in [
            ("System prompt for text:", &mut draft.text_prompt),
            ("System prompt for code:", &mut draft.code_prompt),
            ("System prompt for 3D models:", &mut draft.mesh_prompt),
        ] {
            ui.label(label);
            ui.add(
                egui::TextEdit::multiline(prompt)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            ui.add_space(8.0);
        }

        if let Some(path) = &self.settings_path {
            ui.weak(format!("Stored in {}", path.display()));
        }

        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                match self.save_settings() {
                    Ok(()) => notify(MessageLevel::Info, "Done", "Settings saved."),
                    Err(e) => {
                        tracing::error!("{e:#}");
                        notify(MessageLevel::Error, "Error", &format!("Could not save: {e:#}"));
                    }
                }
            }
            if ui.button("Reset to defaults").clicked() {
                let answer = MessageDialog::new()
                    .set_level(MessageLevel::Warning)
                    .set_title("Reset")
                    .set_description("Reset all prompts to their defaults?")
                    .set_buttons(MessageButtons::YesNo)
                    .show();
                if matches!(answer, MessageDialogResult::Yes) {
                    self.reset_settings_draft();
                }
            }
        });
    }

    fn save_output(&self, kind: TaskKind) {
        let text = &self.tab(kind).output;
        if text.is_empty() {
            return;
        }
        let (filter, extensions) = kind.save_filter();
        let Some(path) = rfd::FileDialog::new()
            .add_filter(filter, extensions)
            .add_filter("All Files", &["*"])
            .save_file()
        else {
            return;
        };
        if let Err(e) = write_output(&path, text) {
            tracing::error!("{e:#}");
            notify(MessageLevel::Error, "Error", &format!("{e:#}"));
        }
    }

    fn insert_into_scene(&self) {
        if self.tab(TaskKind::Mesh).output.trim().is_empty() {
            notify(MessageLevel::Warning, "Error", "No data to insert");
            return;
        }
        match self.send_to_scene() {
            Ok(()) => notify(MessageLevel::Info, "Done", "Model sent to the scene"),
            Err(e) => {
                tracing::error!("{e:#}");
                notify(MessageLevel::Error, "Error", &format!("Could not send: {e:#}"));
            }
        }
    }
}
