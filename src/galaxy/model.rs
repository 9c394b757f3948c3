//! In-memory state of one galaxy: its systems, players and tunnels.
//!
//! A [`Galaxy`] is single-writer. Callers serialize access (the hub keeps each
//! galaxy behind its own mutex) and pick up pending writes with
//! [`Galaxy::take_dirty`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::f64::consts::TAU;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::galaxy::error::GalaxyError;
use crate::galaxy::store::{FileStore, GalaxyState, SaveBatch};
use crate::game::body::StarType;
use crate::game::config::{ConfigError, GenerationConfig, WeightTable};
use crate::game::naming::with_suffix;
use crate::game::random::{mix, sub_seed, weighted_random_select, Seed};
use crate::game::system::{
    ensure_habitable_planet, generate_solar_system, system_id, SolarSystem, SystemRequest,
};

/// Seed step between name retries; prime so retries never line up with slot offsets.
const NAME_RETRY_STRIDE: u64 = 7919;

const PLAYER_COLORS: &[&str] = &[
    "#4fc3f7", "#ffb74d", "#81c784", "#e57373", "#ba68c8", "#fff176", "#4db6ac", "#f06292",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxySettings {
    /// Root directory for persisted galaxies.
    pub data_dir: PathBuf,
    pub save_debounce_ms: u64,
    /// Chance that exploring links to an existing system instead of a new one.
    pub reuse_chance: f64,
    pub new_system_distance: RangeInclusive<f64>,
    pub vertical_jitter: f64,
    /// Distance from the galactic origin for player home systems.
    pub home_distance: RangeInclusive<f64>,
    pub name_retries: u32,
    pub tunnel_capacity: u32,
    /// Game time a player-built tunnel needs to become active.
    pub tunnel_build_time: f64,
    pub player_tunnel_capacity: u32,
    pub starting_research_points: u32,
    pub home_star_weights: WeightTable<StarType>,
    pub default_view: String,
}

impl Default for GalaxySettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/galaxies"),
            save_debounce_ms: 500,
            reuse_chance: 0.4,
            new_system_distance: 3.0..=6.0,
            vertical_jitter: 0.5,
            home_distance: 10.0..=30.0,
            name_retries: 10,
            tunnel_capacity: 10,
            tunnel_build_time: 10.0,
            player_tunnel_capacity: 3,
            starting_research_points: 100,
            home_star_weights: vec![
                (StarType::YellowStar, 50.0),
                (StarType::RedDwarf, 30.0),
                (StarType::WhiteDwarf, 20.0),
            ],
            default_view: "galaxy".to_string(),
        }
    }
}

impl GalaxySettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        serde_json::from_str(&contents).map_err(ConfigError::ParseError)
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            warn!("using default galaxy settings: {err}");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        std::fs::write(path, contents).map_err(ConfigError::WriteError)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Connection id; changes on every reconnect.
    pub id: String,
    /// Stable identity across reconnects.
    pub uuid: String,
    pub name: String,
    pub color: String,
    pub research_points: u32,
    pub tunnel_capacity: u32,
    pub home_system_id: Option<String>,
    pub home_planet_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelStatus {
    Planned,
    UnderConstruction,
    Active,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: String,
    pub from: String,
    pub to: String,
    pub capacity: u32,
    pub status: TunnelStatus,
    /// Game time the tunnel was ordered.
    pub started_at: f64,
}

impl Tunnel {
    /// Move construction forward to `now`. Status never goes backwards.
    pub fn advance(&mut self, now: f64, build_time: f64) -> bool {
        let elapsed = now - self.started_at;
        let reached = if elapsed >= build_time {
            TunnelStatus::Active
        } else if elapsed > 0.0 {
            TunnelStatus::UnderConstruction
        } else {
            TunnelStatus::Planned
        };
        if reached > self.status {
            self.status = reached;
            true
        } else {
            false
        }
    }
}

/// Everything about a galaxy except its systems, which are stored one file each.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalaxyMetadata {
    pub id: String,
    pub seed: Seed,
    pub players: Vec<Player>,
    pub tunnels: Vec<Tunnel>,
    pub is_playing: bool,
    pub game_time: f64,
    pub view: String,
    pub current_system_id: Option<String>,
    pub system_count: usize,
    pub next_tunnel_id: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinOutcome {
    pub player: Player,
    pub home_system: SolarSystem,
    pub returning: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemGenerated {
    pub system: SolarSystem,
    pub tunnel: Option<Tunnel>,
    pub updated_source_system: Option<SolarSystem>,
    /// The system already existed and was linked rather than created.
    pub reused: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TunnelConstructed {
    pub tunnel: Tunnel,
    pub from_system: SolarSystem,
    pub to_system: SolarSystem,
}

pub struct Galaxy {
    id: String,
    seed: Seed,
    settings: GalaxySettings,
    generation: Arc<GenerationConfig>,
    systems: BTreeMap<String, SolarSystem>,
    /// Keyed by player uuid.
    players: BTreeMap<String, Player>,
    /// Session id to player uuid.
    sessions: HashMap<String, String>,
    tunnels: Vec<Tunnel>,
    is_playing: bool,
    game_time: f64,
    view: String,
    current_system_id: Option<String>,
    next_tunnel_id: u64,
    names: HashSet<String>,
    dirty_systems: BTreeSet<String>,
    metadata_dirty: bool,
    rng: ChaCha8Rng,
}

impl Galaxy {
    pub fn new(
        id: impl Into<String>,
        seed: Seed,
        settings: GalaxySettings,
        generation: Arc<GenerationConfig>,
    ) -> Self {
        let view = settings.default_view.clone();
        Self {
            id: id.into(),
            seed,
            settings,
            generation,
            systems: BTreeMap::new(),
            players: BTreeMap::new(),
            sessions: HashMap::new(),
            tunnels: Vec::new(),
            is_playing: false,
            game_time: 0.0,
            view,
            current_system_id: None,
            next_tunnel_id: 0,
            names: HashSet::new(),
            dirty_systems: BTreeSet::new(),
            metadata_dirty: true,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_state(
        state: GalaxyState,
        settings: GalaxySettings,
        generation: Arc<GenerationConfig>,
    ) -> Self {
        let metadata = state.metadata;
        // continue the stream past everything already generated
        let resume = sub_seed(mix(metadata.seed), state.systems.len() as u64 + metadata.next_tunnel_id);
        let systems: BTreeMap<String, SolarSystem> = state
            .systems
            .into_iter()
            .map(|system| (system.id.clone(), system))
            .collect();

        Self {
            names: systems.values().map(|s| s.name.clone()).collect(),
            players: metadata
                .players
                .into_iter()
                .map(|player| (player.uuid.clone(), player))
                .collect(),
            sessions: HashMap::new(),
            tunnels: metadata.tunnels,
            is_playing: metadata.is_playing,
            game_time: metadata.game_time,
            view: metadata.view,
            current_system_id: metadata.current_system_id,
            next_tunnel_id: metadata.next_tunnel_id,
            dirty_systems: BTreeSet::new(),
            metadata_dirty: false,
            rng: ChaCha8Rng::seed_from_u64(resume),
            id: metadata.id,
            seed: metadata.seed,
            systems,
            settings,
            generation,
        }
    }

    /// Load a galaxy from `store`, or start a fresh one if it has never been
    /// saved or cannot be read.
    pub fn open(
        id: &str,
        seed: Seed,
        settings: GalaxySettings,
        generation: Arc<GenerationConfig>,
        store: &FileStore,
    ) -> Self {
        match store.load(id) {
            Ok(Some(state)) => {
                info!("loaded galaxy {id} with {} systems", state.systems.len());
                Self::from_state(state, settings, generation)
            }
            Ok(None) => Self::new(id, seed, settings, generation),
            Err(err) => {
                warn!("failed to load galaxy {id}, starting fresh: {err}");
                if let Err(err) = store.quarantine(id) {
                    error!("stale files of galaxy {id} are still on disk: {err}");
                }
                Self::new(id, seed, settings, generation)
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn system(&self, id: &str) -> Option<&SolarSystem> {
        self.systems.get(id)
    }

    pub fn systems(&self) -> impl Iterator<Item = &SolarSystem> {
        self.systems.values()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_for_session(&self, session: &str) -> Option<&Player> {
        self.sessions.get(session).and_then(|uuid| self.players.get(uuid))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn current_system_id(&self) -> Option<&str> {
        self.current_system_id.as_deref()
    }

    pub fn metadata(&self) -> GalaxyMetadata {
        GalaxyMetadata {
            id: self.id.clone(),
            seed: self.seed,
            players: self.players.values().cloned().collect(),
            tunnels: self.tunnels.clone(),
            is_playing: self.is_playing,
            game_time: self.game_time,
            view: self.view.clone(),
            current_system_id: self.current_system_id.clone(),
            system_count: self.systems.len(),
            next_tunnel_id: self.next_tunnel_id,
        }
    }

    /// Pending writes since the last call, or `None` when nothing changed.
    pub fn take_dirty(&mut self) -> Option<SaveBatch> {
        if !self.metadata_dirty && self.dirty_systems.is_empty() {
            return None;
        }
        let systems = std::mem::take(&mut self.dirty_systems)
            .into_iter()
            .filter_map(|id| self.systems.get(&id).cloned())
            .collect();
        self.metadata_dirty = false;
        Some(SaveBatch {
            galaxy_id: self.id.clone(),
            metadata: self.metadata(),
            systems,
        })
    }

    /// Register a session. Returning players (matched by `uuid`) get their
    /// existing home system; new players get a freshly generated one.
    pub fn join(&mut self, session: &str, uuid: &str, name: &str) -> Result<JoinOutcome, GalaxyError> {
        self.sessions.insert(session.to_string(), uuid.to_string());
        self.metadata_dirty = true;

        if let Some(player) = self.players.get_mut(uuid) {
            player.id = session.to_string();
            player.name = name.to_string();
            let player = player.clone();
            let home = player
                .home_system_id
                .as_deref()
                .and_then(|id| self.systems.get(id));
            if let Some(home) = home {
                info!("player {} rejoined galaxy {}", player.name, self.id);
                return Ok(JoinOutcome {
                    home_system: home.clone(),
                    player,
                    returning: true,
                });
            }
            warn!("home system of player {uuid} is missing, generating a new one");
        }

        let home = self.create_home_system(uuid);
        let home_planet_id = home
            .planets
            .iter()
            .find(|p| p.planet_type.is_habitable())
            .map(|p| p.id.clone());
        let color = PLAYER_COLORS[self.players.len() % PLAYER_COLORS.len()].to_string();
        let settings = &self.settings;
        let player = self.players.entry(uuid.to_string()).or_insert_with(|| Player {
            id: session.to_string(),
            uuid: uuid.to_string(),
            name: name.to_string(),
            color,
            research_points: settings.starting_research_points,
            tunnel_capacity: settings.player_tunnel_capacity,
            home_system_id: None,
            home_planet_id: None,
        });
        player.home_system_id = Some(home.id.clone());
        player.home_planet_id = home_planet_id;
        let player = player.clone();

        if self.current_system_id.is_none() {
            self.current_system_id = Some(home.id.clone());
        }
        info!("player {} joined galaxy {} at {}", player.name, self.id, home.name);
        Ok(JoinOutcome {
            player,
            home_system: home,
            returning: false,
        })
    }

    /// Drop a session. The player record stays so the uuid can rejoin.
    pub fn leave(&mut self, session: &str) -> Option<Player> {
        let player = self.player_for_session(session).cloned();
        self.sessions.remove(session);
        player
    }

    /// Explore outwards from `from` (the player's home system when `None`).
    pub fn generate_system(
        &mut self,
        session: &str,
        from: Option<&str>,
        star_type: Option<StarType>,
    ) -> Result<SystemGenerated, GalaxyError> {
        let uuid = self
            .sessions
            .get(session)
            .cloned()
            .ok_or_else(|| GalaxyError::NotJoined(session.to_string()))?;
        let from_id = match from {
            Some(id) => id.to_string(),
            None => self
                .players
                .get(&uuid)
                .and_then(|p| p.home_system_id.clone())
                .ok_or_else(|| GalaxyError::UnknownPlayer(uuid.clone()))?,
        };
        let source = self
            .systems
            .get(&from_id)
            .ok_or_else(|| GalaxyError::UnknownSystem(from_id.clone()))?;
        if !source.has_free_connection() {
            return Err(GalaxyError::MaxConnections(from_id, source.max_connections));
        }
        let origin = source.position;

        // a specific star type always means a new system
        if star_type.is_none() && self.rng.gen::<f64>() < self.settings.reuse_chance {
            let candidates: Vec<String> = self
                .systems
                .values()
                .filter(|s| s.id != from_id && s.has_free_connection() && !s.is_connected_to(&from_id))
                .map(|s| s.id.clone())
                .collect();
            if !candidates.is_empty() {
                let target = candidates[self.rng.gen_range(0..candidates.len())].clone();
                let tunnel = self.link(&from_id, &target, TunnelStatus::Active)?;
                if let Some(system) = self.systems.get_mut(&target) {
                    system.discovered = true;
                }
                return Ok(SystemGenerated {
                    system: self.snapshot(&target)?,
                    tunnel: Some(tunnel),
                    updated_source_system: Some(self.snapshot(&from_id)?),
                    reused: true,
                });
            }
        }

        let angle = self.rng.gen_range(0.0..TAU);
        let range = self.settings.new_system_distance.clone();
        let distance = self.draw(&range);
        let jitter = self.settings.vertical_jitter.abs();
        let lift = self.draw(&(-jitter..=jitter));
        let position = [
            origin[0] + distance * angle.cos(),
            origin[1] + lift,
            origin[2] + distance * angle.sin(),
        ];

        let mut system = self.create_system(star_type, position);
        system.discovered = true;
        let new_id = system.id.clone();
        self.insert_system(system);
        let tunnel = self.link(&from_id, &new_id, TunnelStatus::Active)?;
        info!("galaxy {}: discovered {} from {}", self.id, new_id, from_id);

        Ok(SystemGenerated {
            system: self.snapshot(&new_id)?,
            tunnel: Some(tunnel),
            updated_source_system: Some(self.snapshot(&from_id)?),
            reused: false,
        })
    }

    /// Order a tunnel between two existing systems. It starts out planned and
    /// becomes active once the build time has passed.
    pub fn construct_tunnel(&mut self, from: &str, to: &str) -> Result<TunnelConstructed, GalaxyError> {
        let mut tunnel = self.link(from, to, TunnelStatus::Planned)?;
        if tunnel.advance(self.game_time, self.settings.tunnel_build_time) {
            if let Some(stored) = self.tunnels.iter_mut().find(|t| t.id == tunnel.id) {
                stored.status = tunnel.status;
            }
        }
        Ok(TunnelConstructed {
            tunnel,
            from_system: self.snapshot(from)?,
            to_system: self.snapshot(to)?,
        })
    }

    pub fn toggle_play_pause(&mut self) -> bool {
        self.is_playing = !self.is_playing;
        self.metadata_dirty = true;
        self.is_playing
    }

    /// Set the clock and return every tunnel whose status moved.
    pub fn update_game_time(&mut self, game_time: f64) -> Vec<Tunnel> {
        if !game_time.is_finite() {
            return Vec::new();
        }
        self.game_time = game_time;
        self.metadata_dirty = true;
        let build_time = self.settings.tunnel_build_time;
        self.tunnels
            .iter_mut()
            .filter_map(|tunnel| tunnel.advance(game_time, build_time).then(|| tunnel.clone()))
            .collect()
    }

    pub fn change_view(&mut self, view: &str) -> &str {
        self.view = view.to_string();
        self.metadata_dirty = true;
        &self.view
    }

    fn snapshot(&self, id: &str) -> Result<SolarSystem, GalaxyError> {
        self.systems
            .get(id)
            .cloned()
            .ok_or_else(|| GalaxyError::UnknownSystem(id.to_string()))
    }

    fn draw(&mut self, range: &RangeInclusive<f64>) -> f64 {
        let (low, high) = (*range.start(), *range.end());
        if high > low {
            self.rng.gen_range(low..=high)
        } else {
            low
        }
    }

    fn fresh_seed(&mut self) -> Seed {
        loop {
            let seed: Seed = self.rng.gen();
            if !self.systems.contains_key(&system_id(seed)) {
                return seed;
            }
        }
    }

    /// Generate a system whose name is unique in this galaxy: retry with
    /// perturbed seeds, then fall back to a numeric suffix.
    fn create_system(&mut self, star_type: Option<StarType>, position: [f64; 3]) -> SolarSystem {
        let base = self.fresh_seed();
        let request = |seed: Seed| SystemRequest {
            star_type,
            seed,
            position: Some(position),
            name: None,
        };

        let mut last = None;
        for attempt in 0..=u64::from(self.settings.name_retries) {
            let seed = base.wrapping_add(attempt * NAME_RETRY_STRIDE);
            if self.systems.contains_key(&system_id(seed)) {
                continue;
            }
            let system = generate_solar_system(&request(seed), &self.generation);
            if !self.names.contains(&system.name) {
                self.names.insert(system.name.clone());
                return system;
            }
            last = Some(system);
        }

        let clash = last.unwrap_or_else(|| generate_solar_system(&request(base), &self.generation));
        let name = with_suffix(&clash.name, &mut self.names);
        warn!("system name {} taken, using {}", clash.name, name);
        generate_solar_system(
            &SystemRequest {
                name: Some(name),
                ..request(clash.seed)
            },
            &self.generation,
        )
    }

    fn create_home_system(&mut self, uuid: &str) -> SolarSystem {
        let star_type = weighted_random_select(&self.settings.home_star_weights, self.rng.gen())
            .copied()
            .unwrap_or(StarType::YellowStar);
        let position = if self.systems.is_empty() {
            [0.0; 3]
        } else {
            let angle = self.rng.gen_range(0.0..TAU);
            let range = self.settings.home_distance.clone();
            let distance = self.draw(&range);
            [distance * angle.cos(), 0.0, distance * angle.sin()]
        };

        let mut system = self.create_system(Some(star_type), position);
        ensure_habitable_planet(&mut system, &self.generation);
        system.explored_by.push(uuid.to_string());
        system.discovered = true;
        system.colonized = true;
        self.insert_system(system.clone());
        system
    }

    fn insert_system(&mut self, system: SolarSystem) {
        self.names.insert(system.name.clone());
        self.dirty_systems.insert(system.id.clone());
        self.metadata_dirty = true;
        self.systems.insert(system.id.clone(), system);
    }

    /// The one place two systems get joined. Rejects self loops, duplicates and
    /// full systems, then makes both ends list each other and share explorers.
    fn link(&mut self, from: &str, to: &str, status: TunnelStatus) -> Result<Tunnel, GalaxyError> {
        if from == to {
            return Err(GalaxyError::SelfConnection(from.to_string()));
        }
        let a = self
            .systems
            .get(from)
            .ok_or_else(|| GalaxyError::UnknownSystem(from.to_string()))?;
        let b = self
            .systems
            .get(to)
            .ok_or_else(|| GalaxyError::UnknownSystem(to.to_string()))?;
        if a.is_connected_to(to) || b.is_connected_to(from) {
            return Err(GalaxyError::AlreadyConnected(from.to_string(), to.to_string()));
        }
        for end in [a, b] {
            if !end.has_free_connection() {
                return Err(GalaxyError::MaxConnections(end.id.clone(), end.max_connections));
            }
        }

        let explored: Vec<String> = a
            .explored_by
            .iter()
            .chain(&b.explored_by)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for (end, other) in [(from, to), (to, from)] {
            if let Some(system) = self.systems.get_mut(end) {
                system.connections.push(other.to_string());
                system.explored_by.clone_from(&explored);
            }
            self.dirty_systems.insert(end.to_string());
        }

        let tunnel = Tunnel {
            id: format!("tun-{}", self.next_tunnel_id),
            from: from.to_string(),
            to: to.to_string(),
            capacity: self.settings.tunnel_capacity,
            status,
            started_at: self.game_time,
        };
        self.next_tunnel_id += 1;
        self.tunnels.push(tunnel.clone());
        self.metadata_dirty = true;
        info!("galaxy {}: tunnel {} links {} and {}", self.id, tunnel.id, from, to);
        Ok(tunnel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn galaxy(seed: Seed) -> Galaxy {
        Galaxy::new(
            "test",
            seed,
            GalaxySettings::default(),
            Arc::new(GenerationConfig::default()),
        )
    }

    fn assert_consistent(galaxy: &Galaxy) {
        for system in galaxy.systems() {
            assert!(!system.is_connected_to(&system.id), "{} links to itself", system.id);
            assert!(system.connections.len() <= system.max_connections);
        }
        for tunnel in galaxy.tunnels() {
            assert_ne!(tunnel.from, tunnel.to);
            let from = galaxy.system(&tunnel.from).unwrap();
            let to = galaxy.system(&tunnel.to).unwrap();
            assert!(from.is_connected_to(&to.id));
            assert!(to.is_connected_to(&from.id));
            assert_eq!(from.explored_by, to.explored_by);
        }
    }

    #[test]
    fn new_players_get_habitable_homes() {
        let mut galaxy = galaxy(1);
        for n in 0..12 {
            let uuid = format!("uuid-{n}");
            let joined = galaxy.join(&format!("s{n}"), &uuid, "Ada").unwrap();
            assert!(!joined.returning);
            assert!(joined.home_system.has_habitable_planet());
            assert!(joined.home_system.explored_by.contains(&uuid));
            assert!(matches!(
                joined.home_system.star.star_type,
                StarType::YellowStar | StarType::RedDwarf | StarType::WhiteDwarf
            ));
            let planet = joined.player.home_planet_id.as_deref().unwrap();
            assert!(joined.home_system.planets.iter().any(|p| p.id == planet));
        }
        assert_eq!(galaxy.system_count(), 12);
    }

    #[test]
    fn returning_players_keep_their_home() {
        let mut galaxy = galaxy(2);
        let first = galaxy.join("s1", "uuid-a", "Ada").unwrap();
        galaxy.leave("s1");
        assert!(galaxy.player_for_session("s1").is_none());

        let again = galaxy.join("s2", "uuid-a", "Ada L.").unwrap();
        assert!(again.returning);
        assert_eq!(again.home_system.id, first.home_system.id);
        assert_eq!(again.player.id, "s2");
        assert_eq!(again.player.name, "Ada L.");
        assert_eq!(galaxy.system_count(), 1);
    }

    #[test]
    fn exploring_keeps_the_graph_consistent() {
        let mut galaxy = galaxy(3);
        let home = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system.id;
        let mut frontier = vec![home];
        for _ in 0..60 {
            let from = frontier[galaxy.system_count() % frontier.len()].clone();
            match galaxy.generate_system("s1", Some(&from), None) {
                Ok(generated) => {
                    let tunnel = generated.tunnel.unwrap();
                    assert_eq!(tunnel.from, from);
                    assert_eq!(tunnel.status, TunnelStatus::Active);
                    assert!(generated.system.explored_by.contains(&"uuid-a".to_string()));
                    frontier.push(generated.system.id);
                }
                Err(GalaxyError::MaxConnections(id, _)) => assert_eq!(id, from),
                Err(other) => panic!("unexpected error {other}"),
            }
        }
        assert_consistent(&galaxy);
    }

    #[test]
    fn full_systems_refuse_new_links() {
        let mut galaxy = galaxy(4);
        let home = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system;
        for _ in 0..home.max_connections {
            galaxy.generate_system("s1", None, Some(StarType::RedDwarf)).unwrap();
        }
        let err = galaxy.generate_system("s1", None, None).unwrap_err();
        assert_eq!(err, GalaxyError::MaxConnections(home.id.clone(), home.max_connections));
        assert_eq!(galaxy.system(&home.id).unwrap().connections.len(), home.max_connections);
        assert_consistent(&galaxy);
    }

    #[test]
    fn self_and_duplicate_tunnels_are_rejected() {
        let mut galaxy = galaxy(5);
        let home = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system.id;
        assert_eq!(
            galaxy.construct_tunnel(&home, &home).unwrap_err(),
            GalaxyError::SelfConnection(home.clone())
        );
        let other = galaxy
            .generate_system("s1", None, Some(StarType::YellowStar))
            .unwrap()
            .system
            .id;
        assert!(matches!(
            galaxy.construct_tunnel(&home, &other),
            Err(GalaxyError::AlreadyConnected(_, _))
        ));
        assert!(matches!(
            galaxy.construct_tunnel(&home, "sys-missing"),
            Err(GalaxyError::UnknownSystem(_))
        ));
        assert_eq!(galaxy.tunnels().len(), 1);
    }

    #[test]
    fn tunnels_share_explorers() {
        let mut galaxy = galaxy(6);
        let a = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system.id;
        let b = galaxy.join("s2", "uuid-b", "Bob").unwrap().home_system.id;
        let built = galaxy.construct_tunnel(&a, &b).unwrap();
        assert_eq!(built.from_system.explored_by, vec!["uuid-a", "uuid-b"]);
        assert_eq!(built.to_system.explored_by, vec!["uuid-a", "uuid-b"]);
        assert_consistent(&galaxy);
    }

    #[test]
    fn tunnel_construction_follows_the_clock() {
        let mut galaxy = galaxy(7);
        let a = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system.id;
        let b = galaxy.join("s2", "uuid-b", "Bob").unwrap().home_system.id;
        galaxy.update_game_time(5.0);
        let built = galaxy.construct_tunnel(&a, &b).unwrap();
        assert_eq!(built.tunnel.status, TunnelStatus::Planned);

        let changed = galaxy.update_game_time(6.0);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].status, TunnelStatus::UnderConstruction);
        assert!(galaxy.update_game_time(7.0).is_empty());

        let changed = galaxy.update_game_time(15.0);
        assert_eq!(changed[0].status, TunnelStatus::Active);
        // never regresses when the clock is rewound
        assert!(galaxy.update_game_time(0.0).is_empty());
        assert_eq!(galaxy.tunnels()[0].status, TunnelStatus::Active);
    }

    #[test]
    fn unjoined_sessions_cannot_explore() {
        let mut galaxy = galaxy(8);
        assert_eq!(
            galaxy.generate_system("ghost", None, None).unwrap_err(),
            GalaxyError::NotJoined("ghost".to_string())
        );
    }

    #[test]
    fn system_names_stay_unique() {
        let mut galaxy = galaxy(9);
        galaxy.join("s1", "uuid-a", "Ada").unwrap();
        for n in 0..40 {
            galaxy.join(&format!("x{n}"), &format!("uuid-{n}"), "P").unwrap();
        }
        let names: HashSet<&str> = galaxy.systems().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), galaxy.system_count());
    }

    #[test]
    fn taken_names_fall_back_to_a_suffix() {
        let settings = GalaxySettings {
            name_retries: 0,
            ..GalaxySettings::default()
        };
        let mut galaxy = Galaxy::new("test", 12, settings, Arc::new(GenerationConfig::default()));
        let seed: Seed = galaxy.rng.clone().gen();
        let taken = crate::game::naming::system_name(seed);
        galaxy.names.insert(taken.clone());

        let system = galaxy.create_system(Some(StarType::RedDwarf), [0.0; 3]);
        assert_eq!(system.seed, seed);
        assert_eq!(system.name, format!("{taken} 2"));
        assert!(system.planets.iter().all(|p| p.name.starts_with(&system.name)));
        assert!(galaxy.names.contains(&system.name));
    }

    #[test]
    fn taken_names_retry_with_a_perturbed_seed_first() {
        let mut galaxy = galaxy(13);
        let seed: Seed = galaxy.rng.clone().gen();
        let taken = crate::game::naming::system_name(seed);
        galaxy.names.insert(taken.clone());

        let system = galaxy.create_system(None, [0.0; 3]);
        assert_eq!(system.seed, seed.wrapping_add(NAME_RETRY_STRIDE));
        assert_ne!(system.name, taken);
        assert!(!system.name.starts_with(&format!("{taken} ")));
    }

    #[test]
    fn leaving_returns_the_player_once() {
        let mut galaxy = galaxy(14);
        galaxy.join("s1", "uuid-a", "Ada").unwrap();
        assert_eq!(galaxy.player_for_session("s1").map(|p| p.uuid.as_str()), Some("uuid-a"));
        assert_eq!(galaxy.leave("s1").map(|p| p.uuid), Some("uuid-a".to_string()));
        assert!(galaxy.leave("s1").is_none());
        assert_eq!(galaxy.players().count(), 1);
    }

    #[test]
    fn play_state_and_view() {
        let mut galaxy = galaxy(10);
        assert!(galaxy.toggle_play_pause());
        assert!(!galaxy.toggle_play_pause());
        assert_eq!(galaxy.change_view("system"), "system");
        assert_eq!(galaxy.metadata().view, "system");
    }

    #[test]
    fn dirty_tracking_batches_changes() {
        let mut galaxy = galaxy(11);
        let home = galaxy.join("s1", "uuid-a", "Ada").unwrap().home_system.id;
        let batch = galaxy.take_dirty().unwrap();
        assert_eq!(batch.systems.len(), 1);
        assert_eq!(batch.systems[0].id, home);
        assert!(galaxy.take_dirty().is_none());

        galaxy.toggle_play_pause();
        let batch = galaxy.take_dirty().unwrap();
        assert!(batch.systems.is_empty());
        assert!(batch.metadata.is_playing);
    }
}
