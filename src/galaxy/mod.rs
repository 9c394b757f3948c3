//! Multiplayer galaxies on top of the generator.
//!
//! [`GalaxyHub`] owns every open galaxy, routes [`ClientEvent`]s from sessions
//! to the right one and decides who hears about the result. Each galaxy sits
//! behind its own mutex, so mutations of one galaxy are serialized while
//! different galaxies proceed independently. Saves go to a background
//! [`Persister`] and never block or fail a request.

pub mod error;
pub mod model;
pub mod protocol;
pub mod store;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::game::config::GenerationConfig;
use crate::game::random::{mix, Seed};
use error::GalaxyError;
use model::{Galaxy, GalaxySettings};
use protocol::{ClientEvent, Outbound, ServerEvent};
use store::{FileStore, Persister};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stable seed for a galaxy id (FNV-1a, then mixed).
pub fn galaxy_seed(galaxy_id: &str) -> Seed {
    let hash = galaxy_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
    mix(hash)
}

pub struct GalaxyHub {
    settings: GalaxySettings,
    generation: Arc<GenerationConfig>,
    store: FileStore,
    persister: Persister,
    galaxies: Mutex<HashMap<String, Arc<Mutex<Galaxy>>>>,
    /// Session id to the galaxy it joined.
    sessions: Mutex<HashMap<String, String>>,
}

impl GalaxyHub {
    pub fn new(settings: GalaxySettings, generation: GenerationConfig) -> Self {
        let store = FileStore::new(settings.data_dir.clone());
        let persister = Persister::spawn(store.clone(), settings.debounce());
        Self {
            settings,
            generation: Arc::new(generation),
            store,
            persister,
            galaxies: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a hub from config files. A missing settings file is written out
    /// with the defaults so it can be edited; unreadable files fall back to
    /// the defaults with a warning.
    pub fn open(settings_path: &Path, generation_path: &Path) -> Self {
        let settings = if settings_path.exists() {
            GalaxySettings::load_or_default(settings_path)
        } else {
            let settings = GalaxySettings::default();
            match settings.save(settings_path) {
                Ok(()) => info!("wrote default galaxy settings to {}", settings_path.display()),
                Err(err) => warn!("could not write default galaxy settings: {err}"),
            }
            settings
        };
        Self::new(settings, GenerationConfig::load_or_default(generation_path))
    }

    pub fn settings(&self) -> &GalaxySettings {
        &self.settings
    }

    /// The galaxy called `galaxy_id`, loading or creating it on first use.
    /// Loading happens outside the registry lock; if two callers race, the
    /// first one registered wins and the other copy is discarded unsaved.
    pub fn galaxy(&self, galaxy_id: &str) -> Arc<Mutex<Galaxy>> {
        let existing = lock(&self.galaxies).get(galaxy_id).cloned();
        if let Some(galaxy) = existing {
            return galaxy;
        }
        let opened = Arc::new(Mutex::new(Galaxy::open(
            galaxy_id,
            galaxy_seed(galaxy_id),
            self.settings.clone(),
            Arc::clone(&self.generation),
            &self.store,
        )));
        let mut galaxies = lock(&self.galaxies);
        Arc::clone(galaxies.entry(galaxy_id.to_string()).or_insert(opened))
    }

    pub fn galaxy_of(&self, session: &str) -> Option<String> {
        lock(&self.sessions).get(session).cloned()
    }

    /// Apply one client event. Failures come back as an `error` event addressed
    /// to `session` alone and leave the galaxy untouched.
    pub fn handle(&self, session: &str, event: ClientEvent) -> Vec<Outbound> {
        let galaxy_id = match &event {
            ClientEvent::JoinGalaxy { galaxy_id, .. } => {
                if let Some(previous) = self.galaxy_of(session).filter(|id| id != galaxy_id) {
                    self.disconnect(session);
                    info!("session {session} moved from {previous} to {galaxy_id}");
                }
                galaxy_id.clone()
            }
            _ => match self.galaxy_of(session) {
                Some(id) => id,
                None => return vec![error_reply(&GalaxyError::NotJoined(session.to_string()))],
            },
        };

        let galaxy = self.galaxy(&galaxy_id);
        let mut galaxy = lock(&galaxy);
        let outcome = apply(&mut galaxy, session, event);
        if let Some(batch) = galaxy.take_dirty() {
            self.persister.save(batch);
        }
        drop(galaxy);

        match outcome {
            Ok(outbound) => {
                lock(&self.sessions).insert(session.to_string(), galaxy_id);
                outbound
            }
            Err(err) => {
                warn!("rejected request from {session}: {err}");
                vec![error_reply(&err)]
            }
        }
    }

    /// Forget a session. Its player stays in the galaxy for a later rejoin.
    pub fn disconnect(&self, session: &str) {
        let Some(galaxy_id) = lock(&self.sessions).remove(session) else {
            return;
        };
        let galaxy = self.galaxy(&galaxy_id);
        let left = lock(&galaxy).leave(session);
        if let Some(player) = left {
            info!("player {} left galaxy {galaxy_id}", player.name);
        }
    }

    /// Block until every pending save is on disk.
    pub fn flush(&self) {
        self.persister.flush();
    }
}

fn error_reply(err: &GalaxyError) -> Outbound {
    Outbound::Reply(ServerEvent::Error {
        message: err.to_string(),
    })
}

fn apply(galaxy: &mut Galaxy, session: &str, event: ClientEvent) -> Result<Vec<Outbound>, GalaxyError> {
    let galaxy_id = galaxy.id().to_string();
    let broadcast = move |event: ServerEvent| Outbound::Broadcast {
        galaxy_id: galaxy_id.clone(),
        event,
    };

    let event = match event {
        ClientEvent::JoinGalaxy {
            player_name,
            player_uuid,
            ..
        } => {
            let joined = galaxy.join(session, &player_uuid, &player_name)?;
            let welcome = ServerEvent::GalaxyJoined {
                galaxy_id: galaxy.id().to_string(),
                player: joined.player.clone(),
                home_system: joined.home_system.clone(),
                returning: joined.returning,
                systems: galaxy.systems().cloned().collect(),
                tunnels: galaxy.tunnels().to_vec(),
                players: galaxy.players().cloned().collect(),
                is_playing: galaxy.is_playing(),
                game_time: galaxy.game_time(),
                view: galaxy.view().to_string(),
            };
            let announce = ServerEvent::PlayerJoined {
                player: joined.player,
                home_system: joined.home_system,
            };
            return Ok(vec![Outbound::Reply(welcome), broadcast(announce)]);
        }
        ClientEvent::GenerateSystem {
            from_system_id,
            star_type,
        } => {
            let generated = galaxy.generate_system(session, from_system_id.as_deref(), star_type)?;
            ServerEvent::SystemGenerated {
                system: generated.system,
                tunnel: generated.tunnel,
                updated_source_system: generated.updated_source_system,
            }
        }
        ClientEvent::ConstructTunnel { from, to } => {
            let built = galaxy.construct_tunnel(&from, &to)?;
            ServerEvent::TunnelConstructed {
                tunnel: built.tunnel,
                from_system: built.from_system,
                to_system: built.to_system,
            }
        }
        ClientEvent::TogglePlayPause => ServerEvent::PlayStateChanged {
            is_playing: galaxy.toggle_play_pause(),
        },
        ClientEvent::UpdateGameTime { game_time } => {
            let tunnels = galaxy.update_game_time(game_time);
            ServerEvent::GameTimeUpdated {
                game_time: galaxy.game_time(),
                tunnels,
            }
        }
        ClientEvent::ChangeView { view } => ServerEvent::ViewChanged {
            view: galaxy.change_view(&view).to_string(),
        },
    };
    Ok(vec![broadcast(event)])
}
