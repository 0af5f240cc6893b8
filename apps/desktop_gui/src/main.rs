mod backend_bridge;
mod config;
mod controller;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::UserId;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::{load_settings, normalize_database_url, DEFAULT_CONFIG_FILE};
use crate::controller::events::UiEvent;
use crate::ui::SpeciesCatalogApp;

#[derive(Parser, Debug)]
#[command(about = "Browse and curate the species catalog")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Acts as this user; only their own species can be edited or deleted.
    #[arg(long)]
    viewer_id: Option<i64>,
    #[arg(long)]
    database_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(viewer_id) = args.viewer_id {
        settings.viewer_id = UserId(viewer_id);
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    settings.database_url = normalize_database_url(&settings.database_url);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(
        viewer_id = settings.viewer_id.0,
        after_save = %settings.after_save,
        "starting species catalog"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings.database_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Species Catalog")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Species Catalog",
        options,
        Box::new(move |_cc| Ok(Box::new(SpeciesCatalogApp::new(cmd_tx, ui_rx, &settings)))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
    .context("desktop window failed")
}
