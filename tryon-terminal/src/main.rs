//! Tryon terminal viewer
//!
//! Controls:
//!   - WASD / Arrow Keys / mouse drag: Rotate the head
//!   - 1-9: Select glasses
//!   - X/Y/Z then +/-: Move the glasses along an axis
//!   - C/Tab: Toggle the calibrated result view
//!   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal;
use tryon_core::{LoadSlot, MeshData, TextureId, Viewer};
use tryon_terminal::assets::{self, AssetSource};
use tryon_terminal::cli::Cli;
use tryon_terminal::{TerminalApp, TerminalConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = TerminalConfig::load(cli.config.as_deref())?;
    let mut viewer = Viewer::new(config.viewer.clone());

    // Texture ids only need to be distinct here; the rasterizer shades by
    // normal.
    let mut next_texture = 0u32;
    let mut texture = || {
        next_texture += 1;
        TextureId(next_texture)
    };

    match cli.head {
        Some(mesh) => {
            let source = AssetSource { mesh, pose: cli.pose };
            assets::spawn_load(&mut viewer, LoadSlot::Head, source, texture());
        }
        None => {
            assets::post_fixture(&mut viewer, LoadSlot::Head, MeshData::cube(2.0), texture());
        }
    }

    if cli.glasses.is_empty() {
        assets::post_fixture(
            &mut viewer,
            LoadSlot::Glasses("frame".to_owned()),
            MeshData::glasses_frame(2.2),
            texture(),
        );
    }
    for (name, mesh) in cli.glasses {
        let source = AssetSource { mesh, pose: None };
        assets::spawn_load(&mut viewer, LoadSlot::Glasses(name), source, texture());
    }

    let (width, height) = terminal::size().context("query terminal size")?;
    let mut app = TerminalApp::new(viewer, config, width, height);
    app.run().context("terminal session")?;

    Ok(())
}
