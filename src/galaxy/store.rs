//! JSON persistence for galaxies.
//!
//! Layout under the store root:
//!
//! ```text
//! <galaxy>/metadata.json
//! <galaxy>/systems/<system>.json
//! ```
//!
//! Every file is written to a sibling `.tmp` file first and renamed into
//! place, so readers never observe a half-written document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::galaxy::error::StoreError;
use crate::galaxy::model::GalaxyMetadata;
use crate::game::system::SolarSystem;

const METADATA_FILE: &str = "metadata.json";
const SYSTEMS_DIR: &str = "systems";

/// A galaxy as read back from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyState {
    pub metadata: GalaxyMetadata,
    pub systems: Vec<SolarSystem>,
}

/// Changes to write for one galaxy: its metadata and the systems that changed.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveBatch {
    pub galaxy_id: String,
    pub metadata: GalaxyMetadata,
    pub systems: Vec<SolarSystem>,
}

impl SaveBatch {
    /// Fold a newer batch for the same galaxy into this one.
    fn absorb(&mut self, newer: SaveBatch) {
        self.metadata = newer.metadata;
        for system in newer.systems {
            match self.systems.iter_mut().find(|s| s.id == system.id) {
                Some(slot) => *slot = system,
                None => self.systems.push(system),
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn galaxy_dir(&self, galaxy_id: &str) -> PathBuf {
        self.root.join(file_stem(galaxy_id))
    }

    pub fn save(&self, batch: &SaveBatch) -> Result<(), StoreError> {
        let dir = self.galaxy_dir(&batch.galaxy_id);
        let systems_dir = dir.join(SYSTEMS_DIR);
        fs::create_dir_all(&systems_dir)?;
        for system in &batch.systems {
            write_json(&systems_dir.join(format!("{}.json", file_stem(&system.id))), system)?;
        }
        // metadata last: it is what marks the galaxy as existing
        write_json(&dir.join(METADATA_FILE), &batch.metadata)?;
        debug!(
            "saved galaxy {} ({} systems changed)",
            batch.galaxy_id,
            batch.systems.len()
        );
        Ok(())
    }

    /// `Ok(None)` when the galaxy has never been saved. Unreadable system
    /// files are skipped with a warning; an unreadable metadata file is an error.
    pub fn load(&self, galaxy_id: &str) -> Result<Option<GalaxyState>, StoreError> {
        let dir = self.galaxy_dir(galaxy_id);
        let metadata_path = dir.join(METADATA_FILE);
        if !metadata_path.exists() {
            return Ok(None);
        }
        let metadata: GalaxyMetadata = read_json(&metadata_path)?;

        let mut systems = Vec::new();
        let systems_dir = dir.join(SYSTEMS_DIR);
        if systems_dir.is_dir() {
            for entry in fs::read_dir(&systems_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                match read_json::<SolarSystem>(&path) {
                    Ok(system) => systems.push(system),
                    Err(err) => warn!("skipping unreadable system file {}: {err}", path.display()),
                }
            }
        }
        systems.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Some(GalaxyState { metadata, systems }))
    }

    /// Rename an unreadable galaxy directory to `<galaxy>.corrupt-<unix secs>`,
    /// deleting it if the rename fails.
    pub fn quarantine(&self, galaxy_id: &str) -> Result<Option<PathBuf>, StoreError> {
        let dir = self.galaxy_dir(galaxy_id);
        if !dir.exists() {
            return Ok(None);
        }
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let stem = file_stem(galaxy_id);
        let mut target = self.root.join(format!("{stem}.corrupt-{stamp}"));
        let mut n = 1;
        while target.exists() {
            target = self.root.join(format!("{stem}.corrupt-{stamp}-{n}"));
            n += 1;
        }
        match fs::rename(&dir, &target) {
            Ok(()) => {
                warn!("moved unreadable galaxy {galaxy_id} to {}", target.display());
                Ok(Some(target))
            }
            Err(err) => {
                error!("could not move galaxy {galaxy_id} aside ({err}), deleting it");
                fs::remove_dir_all(&dir)?;
                Ok(None)
            }
        }
    }
}

/// Keep ids usable as file names.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

enum Command {
    Save(SaveBatch),
    Flush(Sender<()>),
    Shutdown,
}

/// Background writer that coalesces saves.
///
/// The first change after a quiet period opens a window of `debounce`; every
/// change arriving inside it is merged and written once when it closes. Failed
/// writes stay pending and are retried with the next window. Dropping the
/// persister writes whatever is still pending.
pub struct Persister {
    sender: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl Persister {
    pub fn spawn(store: FileStore, debounce: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("galaxy-persister".to_string())
            .spawn(move || run(store, debounce, receiver))
            .map_err(|err| error!("failed to start persister thread: {err}"))
            .ok();
        Self { sender, worker }
    }

    pub fn save(&self, batch: SaveBatch) {
        if self.sender.send(Command::Save(batch)).is_err() {
            error!("persister is gone, dropping save");
        }
    }

    /// Write everything pending and wait until it is on disk.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        if self.sender.send(Command::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("persister thread panicked");
            }
        }
    }
}

fn run(store: FileStore, debounce: Duration, receiver: Receiver<Command>) {
    let mut pending: BTreeMap<String, SaveBatch> = BTreeMap::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
            Some(at) => match receiver.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    write_pending(&store, &mut pending);
                    deadline = (!pending.is_empty()).then(|| Instant::now() + debounce);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
        };

        match command {
            Command::Save(batch) => {
                match pending.get_mut(&batch.galaxy_id) {
                    Some(existing) => existing.absorb(batch),
                    None => {
                        pending.insert(batch.galaxy_id.clone(), batch);
                    }
                }
                deadline.get_or_insert_with(|| Instant::now() + debounce);
            }
            Command::Flush(ack) => {
                write_pending(&store, &mut pending);
                deadline = (!pending.is_empty()).then(|| Instant::now() + debounce);
                let _ = ack.send(());
            }
            Command::Shutdown => break,
        }
    }

    write_pending(&store, &mut pending);
    if !pending.is_empty() {
        error!("{} galaxies could not be saved before shutdown", pending.len());
    }
}

fn write_pending(store: &FileStore, pending: &mut BTreeMap<String, SaveBatch>) {
    for (galaxy_id, batch) in std::mem::take(pending) {
        if let Err(err) = store.save(&batch) {
            error!("failed to save galaxy {galaxy_id}: {err}");
            pending.insert(galaxy_id, batch);
        }
    }
}
