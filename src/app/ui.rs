use super::gallery::{EntryStatus, GalleryEntry};
use super::BreedUploader;
use crate::error::UploadError;
use crate::upload::StageLayout;
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Align, Color32, RichText};

const STAGE_IMAGE_SIZE: f32 = 150.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 50, 50);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(0, 180, 0);
const MUTED_COLOR: Color32 = Color32::from_rgb(150, 150, 150);

impl BreedUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let total_height = ui.available_height();
            let footer_height = 40.0;
            let footer_margin = 15.0;
            let content_height = total_height - footer_height - footer_margin;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Dog Breed Transformer");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Upload a photo and watch it turn into a dog")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });

                    ui.add_space(20.0);
                    self.render_form(ui);
                    ui.add_space(20.0);
                    self.render_gallery(ui);
                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(footer_margin);
                self.render_footer(ui);
            });
        });
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        let submitting = self.state.is_submitting();

        ui.group(|ui| {
            ui.add_enabled_ui(!submitting, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("🖼 Choose Image").clicked() {
                        self.pick_file();
                    }
                    match &self.state.selected {
                        Some(file) => {
                            ui.label(format!(
                                "{} ({})",
                                file.name,
                                FileSizeUtils::format_size(file.size)
                            ));
                        }
                        None => {
                            ui.label(RichText::new("No file selected").color(MUTED_COLOR));
                        }
                    }
                });
                ui.add_space(4.0);
                ui.label(
                    RichText::new(format!(
                        "JPG, PNG or GIF, up to {}",
                        FileSizeUtils::format_limit(self.workflow.validator().max_size())
                    ))
                    .small()
                    .color(MUTED_COLOR),
                );
            });
        });

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            if submitting {
                ui.spinner();
                ui.label(self.state.status_text());
            } else {
                let button = egui::Button::new(RichText::new("📤 Upload").color(Color32::WHITE))
                    .fill(self.accent)
                    .min_size(egui::vec2(200.0, 40.0));
                if ui.add(button).clicked() {
                    self.start_upload();
                }
            }
        });
    }

    fn render_gallery(&mut self, ui: &mut egui::Ui) {
        let mode = self.config.render_mode;
        let layout = self.state.gallery.layout();

        ui.horizontal(|ui| {
            ui.heading(format!("Your Images ({})", self.state.gallery.len()));
            if !self.state.gallery.is_empty() && ui.button("🗑 Clear").clicked() {
                self.clear_gallery();
            }
        });

        if self.state.gallery.visible(mode).next().is_none() {
            ui.add_space(8.0);
            ui.label(RichText::new("No images yet. Upload one to get started!").color(MUTED_COLOR));
            return;
        }

        let mut to_open = None;
        for entry in self.state.gallery.visible(mode) {
            ui.add_space(8.0);
            if let Some(url) = self.render_entry(ui, entry, layout) {
                to_open = Some(url);
            }
        }

        if let Some(url) = to_open {
            self.open_image(&url);
        }
    }

    /// Returns the stage URL the user clicked, if any.
    fn render_entry(
        &self,
        ui: &mut egui::Ui,
        entry: &GalleryEntry,
        layout: StageLayout,
    ) -> Option<String> {
        let mut clicked = None;

        ui.push_id(entry.key, |ui| {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("Breed: {}", entry.breed)).strong());
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        ui.label(
                            RichText::new(entry.uploaded_at.format("%H:%M:%S").to_string())
                                .small()
                                .color(MUTED_COLOR),
                        );
                    });
                });

                ui.horizontal_wrapped(|ui| {
                    for slot in entry.slots(layout) {
                        ui.vertical(|ui| {
                            ui.label(format!("{}. {}", slot.number, slot.stage.label()));
                            match slot.url {
                                Some(url) => {
                                    if self.render_stage_image(ui, url) {
                                        clicked = Some(url.to_string());
                                    }
                                }
                                None => render_placeholder(ui, placeholder_text(&entry.status)),
                            }
                        });
                    }
                });

                render_entry_status(ui, &entry.status);
            });
        });

        clicked
    }

    /// Draws one stage image, or an inline placeholder if it failed to load.
    fn render_stage_image(&self, ui: &mut egui::Ui, url: &str) -> bool {
        let size = egui::vec2(STAGE_IMAGE_SIZE, STAGE_IMAGE_SIZE);
        let uri = self.config.resolve_url(url);
        let image = egui::Image::new(uri.clone())
            .fit_to_exact_size(size)
            .sense(egui::Sense::click());

        match image.load_for_size(ui.ctx(), size) {
            Ok(_) => ui
                .add(image)
                .on_hover_text("Click to open full size")
                .clicked(),
            Err(e) => {
                log::debug!("Failed to load {}: {}", uri, e);
                render_placeholder(ui, "🐾 Image unavailable");
                false
            }
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(format!("Server: {}", self.config.base_url))
                .small()
                .color(MUTED_COLOR),
        );

        if let Some(error) = &self.state.error_message {
            ui.add_space(5.0);
            ui.vertical_centered(|ui| {
                ui.colored_label(ERROR_COLOR, error);
            });
        }
    }
}

fn placeholder_text(status: &EntryStatus) -> &'static str {
    match status {
        EntryStatus::Processing => "Processing…",
        _ => "Not available",
    }
}

fn render_placeholder(ui: &mut egui::Ui, text: &str) {
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(STAGE_IMAGE_SIZE, STAGE_IMAGE_SIZE),
        egui::Sense::hover(),
    );
    let painter = ui.painter();
    painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(14.0),
        MUTED_COLOR,
    );
}

fn render_entry_status(ui: &mut egui::Ui, status: &EntryStatus) {
    ui.add_space(4.0);
    match status {
        EntryStatus::Processing => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.colored_label(MUTED_COLOR, "Processing…");
            });
        }
        EntryStatus::Complete => {
            ui.colored_label(SUCCESS_COLOR, "✅ Complete");
        }
        EntryStatus::Incomplete => {
            ui.colored_label(MUTED_COLOR, "⏩ Some stages could not be generated");
        }
        EntryStatus::TimedOut { attempts } => {
            ui.colored_label(
                ERROR_COLOR,
                format!("⌛ {}", UploadError::PollTimeout { attempts: *attempts }),
            );
        }
        EntryStatus::Failed(message) => {
            ui.colored_label(ERROR_COLOR, format!("❌ {}", message));
        }
    }
}
