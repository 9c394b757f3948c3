use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StarType {
    YellowStar,
    OrangeStar,
    RedDwarf,
    WhiteDwarf,
    BlueGiant,
    RedGiant,
    NeutronStar,
    BinaryStar,
    BlackHole,
}

impl StarType {
    /// Uniform selection order used when a system is generated without a type.
    pub const ALL: [StarType; 9] = [
        StarType::YellowStar,
        StarType::OrangeStar,
        StarType::RedDwarf,
        StarType::WhiteDwarf,
        StarType::BlueGiant,
        StarType::RedGiant,
        StarType::NeutronStar,
        StarType::BinaryStar,
        StarType::BlackHole,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StarType::YellowStar => "yellow_star",
            StarType::OrangeStar => "orange_star",
            StarType::RedDwarf => "red_dwarf",
            StarType::WhiteDwarf => "white_dwarf",
            StarType::BlueGiant => "blue_giant",
            StarType::RedGiant => "red_giant",
            StarType::NeutronStar => "neutron_star",
            StarType::BinaryStar => "binary_star",
            StarType::BlackHole => "black_hole",
        }
    }

    pub fn from_label(label: &str) -> Option<StarType> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlanetType {
    Terrestrial,
    EarthLike,
    OceanWorld,
    DesertWorld,
    IceWorld,
    JungleWorld,
    LavaWorld,
    GasGiant,
    IceGiant,
    DwarfPlanet,
}

impl PlanetType {
    pub const ALL: [PlanetType; 10] = [
        PlanetType::Terrestrial,
        PlanetType::EarthLike,
        PlanetType::OceanWorld,
        PlanetType::DesertWorld,
        PlanetType::IceWorld,
        PlanetType::JungleWorld,
        PlanetType::LavaWorld,
        PlanetType::GasGiant,
        PlanetType::IceGiant,
        PlanetType::DwarfPlanet,
    ];

    /// Types a player home system may count as habitable.
    pub const HABITABLE: [PlanetType; 6] = [
        PlanetType::EarthLike,
        PlanetType::OceanWorld,
        PlanetType::Terrestrial,
        PlanetType::DesertWorld,
        PlanetType::JungleWorld,
        PlanetType::IceWorld,
    ];

    pub fn is_habitable(self) -> bool {
        Self::HABITABLE.contains(&self)
    }

    /// Types whose continents get cities.
    pub fn supports_cities(self) -> bool {
        matches!(
            self,
            PlanetType::EarthLike
                | PlanetType::OceanWorld
                | PlanetType::JungleWorld
                | PlanetType::Terrestrial
        )
    }

    pub fn is_giant(self) -> bool {
        matches!(self, PlanetType::GasGiant | PlanetType::IceGiant)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbitalZone {
    Inferno,
    Hot,
    Goldilocks,
    Cold,
    Outer,
    DeepSpace,
}

impl OrbitalZone {
    /// Rough equilibrium surface temperature in °C before type adjustments.
    pub fn base_temperature(self) -> f64 {
        match self {
            OrbitalZone::Inferno => 450.0,
            OrbitalZone::Hot => 70.0,
            OrbitalZone::Goldilocks => 15.0,
            OrbitalZone::Cold => -60.0,
            OrbitalZone::Outer => -150.0,
            OrbitalZone::DeepSpace => -210.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CometType {
    ShortPeriod,
    HalleyType,
    LongPeriod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsteroidMaterial {
    Rocky,
    Metallic,
    Icy,
    Carbonaceous,
    Crystalline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NebulaType {
    Emission,
    Reflection,
    Dark,
    Planetary,
    SupernovaRemnant,
}

/// Scene-units-per-tick speed of a body one AU from a Sun-like star.
pub const ORBIT_SPEED_SCALE: f64 = 0.02;

/// Orbital speed around a star, with stellar mass approximated by luminosity.
pub fn orbital_speed(luminosity: f64, distance: f64) -> f64 {
    ORBIT_SPEED_SCALE * luminosity.max(0.0).sqrt() / distance.max(1e-6).sqrt()
}
