mod gallery;
mod state;
mod ui;

use crate::config::Config;
use crate::upload::{EventSink, SelectedImage, UploadClient, UploadWorkflow, Validator};
use eframe::egui::{self, Color32};
use eframe::App;
use rfd::FileDialog;
pub use gallery::RenderMode;
pub use state::UploadState;
use std::sync::mpsc as std_mpsc;
use tokio::runtime::Runtime;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

pub struct BreedUploader {
    config: Config,
    state: UploadState,
    accent: Color32,
    workflow: UploadWorkflow<UploadClient>,
    // Declared after `workflow` so poll loops are cancelled before the runtime shuts down.
    _runtime: Runtime,
}

impl BreedUploader {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        runtime: Runtime,
        client: UploadClient,
        startup_error: Option<String>,
    ) -> Self {
        log::info!("Initializing uploader for {}", client.base_url());
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let (sender, receiver) = std_mpsc::channel();
        let events = EventSink::new(sender, Some(cc.egui_ctx.clone()));
        let workflow = UploadWorkflow::new(
            client,
            Validator::new(config.max_file_size),
            config.poll_config(),
            runtime.handle().clone(),
            events,
        );

        let mut state = UploadState::new(config.layout, receiver);
        if let Some(error) = startup_error {
            state.show_error(error);
        }

        Self {
            accent: config.accent(),
            config,
            state,
            workflow,
            _runtime: runtime,
        }
    }

    pub fn pick_file(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        match SelectedImage::from_path(&path) {
            Ok(file) => {
                log::info!("Selected '{}' ({} bytes)", file.name, file.size);
                self.state.error_message = None;
                self.state.selected = Some(file);
            }
            Err(e) => {
                log::error!("Could not use {}: {}", path.display(), e);
                self.state.show_error(e.to_string());
            }
        }
    }

    /// Files dropped onto the window replace the current selection.
    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(dropped) = dropped else {
            return;
        };
        if self.state.is_submitting() {
            log::debug!("Ignoring dropped file while an upload is running");
            return;
        }

        let selected = match (&dropped.path, &dropped.bytes) {
            (Some(path), _) => SelectedImage::from_path(path),
            (None, Some(bytes)) => Ok(SelectedImage::from_bytes(
                dropped.name.clone(),
                bytes.to_vec(),
            )),
            (None, None) => return,
        };

        match selected {
            Ok(file) => {
                log::info!("Dropped '{}' ({} bytes)", file.name, file.size);
                self.state.error_message = None;
                self.state.selected = Some(file);
            }
            Err(e) => self.state.show_error(e.to_string()),
        }
    }

    pub fn start_upload(&mut self) {
        self.state.error_message = None;
        match self.workflow.submit(self.state.selected.as_ref()) {
            Ok(_task) => self.state.begin_submit(),
            Err(e) => {
                if !e.is_validation() {
                    log::error!("Could not start upload: {}", e);
                }
                self.state.show_error(e.to_string());
            }
        }
    }

    pub fn open_image(&mut self, url: &str) {
        let resolved = self.config.resolve_url(url);
        if let Err(e) = open::that(&resolved) {
            log::warn!("Failed to open {}: {}", resolved, e);
            self.state.show_error(format!("Could not open image: {}", e));
        }
    }

    /// Empties the gallery. Pending status checks have nothing left to
    /// update, so they are cancelled too.
    pub fn clear_gallery(&mut self) {
        log::info!(
            "Clearing gallery, cancelling {} status checks",
            self.workflow.active_polls()
        );
        self.workflow.cancel_all();
        self.state.gallery.clear();
    }
}

impl App for BreedUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.drain_events() {
            ctx.request_repaint();
        }
        self.take_dropped_file(ctx);
        self.render(ctx);
    }
}
