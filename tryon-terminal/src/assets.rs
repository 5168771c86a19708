//! Background asset loading
//!
//! Files are read and decoded on worker threads; results land in the
//! viewer's load queue and are applied on the next frame.

use std::fs;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use tryon_core::loader::decode_asset;
use tryon_core::{
    AssetError, Drawable, LoadEvent, LoadSlot, LoadTicket, LoadedAsset, MeshData, TextureId, Viewer,
};

/// Files making up one asset
#[derive(Debug, Clone)]
pub struct AssetSource {
    pub mesh: PathBuf,
    pub pose: Option<PathBuf>,
}

fn read_asset(source: &AssetSource, texture: TextureId) -> Result<LoadedAsset, AssetError> {
    let text = fs::read_to_string(&source.mesh)?;
    let pose = source.pose.as_ref().map(fs::read_to_string).transpose()?;
    decode_asset(&text, texture, pose.as_deref())
}

/// Start loading `source` into `slot` on a worker thread.
pub fn spawn_load(
    viewer: &mut Viewer,
    slot: LoadSlot,
    source: AssetSource,
    texture: TextureId,
) -> JoinHandle<()> {
    let ticket = viewer.begin_load(slot);
    let sender = viewer.sender();
    log::info!("loading {:?} from {}", ticket.slot, source.mesh.display());

    thread::spawn(move || {
        let event = match read_asset(&source, texture) {
            Ok(asset) => LoadEvent::Ready { ticket, asset },
            Err(error) => LoadEvent::Failed { ticket, error },
        };
        // The viewer may already be gone on shutdown.
        let _ = sender.send(event);
    })
}

/// Queue a built-in mesh for `slot`, applied on the next frame like any load.
pub fn post_fixture(viewer: &mut Viewer, slot: LoadSlot, mesh: MeshData, texture: TextureId) -> LoadTicket {
    let ticket = viewer.begin_load(slot);
    viewer.post(LoadEvent::Ready {
        ticket: ticket.clone(),
        asset: LoadedAsset {
            drawable: Drawable::new(mesh, texture),
            pose: None,
        },
    });
    ticket
}
