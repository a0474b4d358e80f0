mod app;
mod config;
mod error;
mod upload;
mod utils;

use app::BreedUploader;
use eframe::CreationContext;
use env_logger::Env;
use upload::UploadClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let (config, startup_error) = match config::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Failed to load settings, using defaults: {}", e);
            (config::Config::default(), Some(e.to_string()))
        }
    };

    let client = UploadClient::new(config.base_url()?, config.header_map())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([760.0, 720.0])
            .with_min_inner_size([480.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dog Breed Transformer",
        options,
        Box::new(move |cc: &CreationContext| {
            Box::new(BreedUploader::new(
                cc,
                config,
                runtime,
                client,
                startup_error,
            ))
        }),
    )?;

    Ok(())
}
