//! Events exchanged with game clients.
//!
//! Both directions are JSON objects tagged by an `event` field, with
//! camelCase payload keys. Bodies inside a payload (systems, players, tunnels)
//! keep their own snake_case layout, the same one the store writes.

use serde::{Deserialize, Serialize};

use crate::galaxy::model::{Player, Tunnel};
use crate::game::body::StarType;
use crate::game::system::SolarSystem;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinGalaxy {
        galaxy_id: String,
        player_name: String,
        #[serde(rename = "playerUUID")]
        player_uuid: String,
    },
    /// Explore from `from_system_id`, or from the player's home system.
    #[serde(rename_all = "camelCase")]
    GenerateSystem {
        #[serde(default)]
        from_system_id: Option<String>,
        #[serde(default)]
        star_type: Option<StarType>,
    },
    ConstructTunnel {
        from: String,
        to: String,
    },
    TogglePlayPause,
    #[serde(rename_all = "camelCase")]
    UpdateGameTime {
        game_time: f64,
    },
    ChangeView {
        view: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent to the joining session only, with the whole galaxy.
    #[serde(rename_all = "camelCase")]
    GalaxyJoined {
        galaxy_id: String,
        player: Player,
        home_system: SolarSystem,
        returning: bool,
        systems: Vec<SolarSystem>,
        tunnels: Vec<Tunnel>,
        players: Vec<Player>,
        is_playing: bool,
        game_time: f64,
        view: String,
    },
    /// Everyone else in the galaxy learns about the newcomer's home.
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player: Player,
        home_system: SolarSystem,
    },
    #[serde(rename_all = "camelCase")]
    SystemGenerated {
        system: SolarSystem,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tunnel: Option<Tunnel>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_source_system: Option<SolarSystem>,
    },
    #[serde(rename_all = "camelCase")]
    TunnelConstructed {
        tunnel: Tunnel,
        from_system: SolarSystem,
        to_system: SolarSystem,
    },
    #[serde(rename_all = "camelCase")]
    PlayStateChanged {
        is_playing: bool,
    },
    /// `tunnels` lists only the tunnels whose construction status moved.
    #[serde(rename_all = "camelCase")]
    GameTimeUpdated {
        game_time: f64,
        tunnels: Vec<Tunnel>,
    },
    ViewChanged {
        view: String,
    },
    Error {
        message: String,
    },
}

/// Where an event produced by the hub has to go.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Only the session that sent the request.
    Reply(ServerEvent),
    /// Every session in the galaxy, the sender included.
    Broadcast { galaxy_id: String, event: ServerEvent },
}

impl Outbound {
    pub fn event(&self) -> &ServerEvent {
        match self {
            Outbound::Reply(event) | Outbound::Broadcast { event, .. } => event,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_events_parse_from_wire_names() {
        let join: ClientEvent = serde_json::from_value(json!({
            "event": "join-galaxy",
            "galaxyId": "milky-way",
            "playerName": "Ada",
            "playerUUID": "7f1c",
        }))
        .unwrap();
        assert_eq!(
            join,
            ClientEvent::JoinGalaxy {
                galaxy_id: "milky-way".into(),
                player_name: "Ada".into(),
                player_uuid: "7f1c".into(),
            }
        );

        let explore: ClientEvent = serde_json::from_value(json!({ "event": "generate-system" })).unwrap();
        assert_eq!(
            explore,
            ClientEvent::GenerateSystem {
                from_system_id: None,
                star_type: None,
            }
        );

        let typed: ClientEvent = serde_json::from_value(json!({
            "event": "generate-system",
            "fromSystemId": "sys-1",
            "starType": "blue_giant",
        }))
        .unwrap();
        assert_eq!(
            typed,
            ClientEvent::GenerateSystem {
                from_system_id: Some("sys-1".into()),
                star_type: Some(StarType::BlueGiant),
            }
        );

        let toggle: ClientEvent = serde_json::from_value(json!({ "event": "toggle-play-pause" })).unwrap();
        assert_eq!(toggle, ClientEvent::TogglePlayPause);

        let time: ClientEvent =
            serde_json::from_value(json!({ "event": "update-game-time", "gameTime": 12.5 })).unwrap();
        assert_eq!(time, ClientEvent::UpdateGameTime { game_time: 12.5 });
    }

    #[test]
    fn unknown_events_are_rejected() {
        assert!(serde_json::from_value::<ClientEvent>(json!({ "event": "self-destruct" })).is_err());
        assert!(serde_json::from_value::<ClientEvent>(json!({ "event": "construct-tunnel", "from": "a" })).is_err());
    }

    #[test]
    fn server_events_use_wire_names() {
        let value = serde_json::to_value(ServerEvent::PlayStateChanged { is_playing: true }).unwrap();
        assert_eq!(value, json!({ "event": "play-state-changed", "isPlaying": true }));

        let value = serde_json::to_value(ServerEvent::Error {
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(value, json!({ "event": "error", "message": "nope" }));

        let value = serde_json::to_value(ServerEvent::GameTimeUpdated {
            game_time: 3.0,
            tunnels: Vec::new(),
        })
        .unwrap();
        assert_eq!(value, json!({ "event": "game-time-updated", "gameTime": 3.0, "tunnels": [] }));
    }
}
