//! Designer-tunable generation tables with built-in defaults and JSON persistence.
//!
//! Every table the generators read lives here. Files on disk may be partial:
//! missing struct fields take the defaults below, and missing table entries are
//! filled in by [`GenerationConfig::validate`] when the file is loaded.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::asteroid::BeltPosition;
use crate::game::body::{AsteroidMaterial, CometType, NebulaType, OrbitalZone, PlanetType, StarType};

/// Errors that can occur when loading or saving a generation config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[source] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] serde_json::Error),
}

pub type WeightTable<K> = Vec<(K, f64)>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub star_types: BTreeMap<StarType, StarTypeConfig>,
    pub planet_types: BTreeMap<PlanetType, PlanetTypeConfig>,
    pub zone_planets: BTreeMap<OrbitalZone, WeightTable<PlanetType>>,
    pub nebula_types: Vec<NebulaTypeConfig>,
    pub comets: CometTableConfig,
    pub asteroid_materials: BTreeMap<BeltPosition, WeightTable<AsteroidMaterial>>,
    pub asteroids_per_belt: RangeInclusive<u32>,
    /// Cities per unit of continent size.
    pub city_density: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarTypeConfig {
    pub color: String,
    /// Visual radius in AU-scale scene units.
    pub size: f64,
    /// Surface temperature in kelvin.
    pub temperature: f64,
    /// Luminosity relative to the Sun.
    pub luminosity: f64,
    pub habitable_zone: RangeInclusive<f64>,
    pub planet_count: RangeInclusive<u32>,
    /// Preferred planet types around this star; used when a habitable world
    /// has to be forced into a system.
    pub planet_weights: WeightTable<PlanetType>,
    pub companion: Option<CompanionConfig>,
    pub black_hole: Option<BlackHoleConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub candidates: Vec<StarType>,
    pub distance: RangeInclusive<f64>,
    pub speed: RangeInclusive<f64>,
    /// Companion size as a fraction of its own type's configured size.
    pub size_factor: RangeInclusive<f64>,
}

/// Optional black-hole parameters; each absent field takes a size-relative default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackHoleConfig {
    pub event_horizon: Option<f64>,
    pub accretion_inner: Option<f64>,
    pub accretion_outer: Option<f64>,
    pub hawking_radiation: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetTypeConfig {
    /// Radius in Earth radii.
    pub size: RangeInclusive<f64>,
    /// Earth masses.
    pub mass: RangeInclusive<f64>,
    /// Surface gravity in g.
    pub gravity: RangeInclusive<f64>,
    /// Hours per rotation.
    pub rotation_period: RangeInclusive<f64>,
    /// Degrees.
    pub axial_tilt: RangeInclusive<f64>,
    pub atmosphere: AtmosphereDefaults,
    pub surface: SurfaceDefaults,
    pub appearance: AppearanceDefaults,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereDefaults {
    pub presence_chance: f64,
    /// Gas name and percentage.
    pub composition: WeightTable<String>,
    /// Surface pressure in bar.
    pub pressure: RangeInclusive<f64>,
    pub cloud_coverage: f64,
    pub color: String,
    pub opacity: f64,
}

/// Independent coverage overlays. They are not a partition of the surface and
/// are never renormalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainCoverage {
    pub ocean: f64,
    pub land: f64,
    pub ice: f64,
    pub desert: f64,
    pub forest: f64,
    pub mountains: f64,
    pub lava: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceDefaults {
    pub coverage: TerrainCoverage,
    pub continent_count: RangeInclusive<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceDefaults {
    pub base_color: String,
    pub secondary_color: String,
    pub roughness: f64,
    pub texture: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NebulaTypeConfig {
    pub nebula_type: NebulaType,
    /// Base chance per system.
    pub rarity: f64,
    pub preferred_stars: Vec<StarType>,
    pub size: RangeInclusive<f64>,
    pub density: RangeInclusive<f64>,
    pub opacity: RangeInclusive<f64>,
    pub colors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CometTableConfig {
    /// Chance that a system gets any comets at all.
    pub rarity_multiplier: f64,
    pub by_star: BTreeMap<StarType, CometStarConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CometStarConfig {
    pub count: RangeInclusive<u32>,
    pub weights: WeightTable<CometType>,
}

fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}

static FALLBACK_PLANET: OnceLock<PlanetTypeConfig> = OnceLock::new();
static FALLBACK_STAR: OnceLock<StarTypeConfig> = OnceLock::new();
static FALLBACK_COMETS: OnceLock<CometStarConfig> = OnceLock::new();

impl GenerationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_json(&contents)
    }

    /// Parse tables from JSON text, filling anything left out.
    ///
    /// The text is laid over the built-in tables key by key, so a partial
    /// `red_dwarf` entry keeps the red dwarf's own values for every field it
    /// leaves out. Arrays replace their default wholesale.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let patch: Value = serde_json::from_str(json).map_err(ConfigError::ParseError)?;
        let mut merged = serde_json::to_value(Self::default()).map_err(ConfigError::SerializeError)?;
        overlay(&mut merged, patch);
        let mut config: Self = serde_json::from_value(merged).map_err(ConfigError::ParseError)?;
        config.validate();
        Ok(config)
    }

    /// Load from `path`, or fall back to the built-in tables if it is missing
    /// or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("using built-in generation tables: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        std::fs::write(path, contents).map_err(ConfigError::WriteError)
    }

    /// Fill every table entry the file left out with its built-in default.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        for star in StarType::ALL {
            if !self.star_types.contains_key(&star) {
                warn!("star type {} missing from config, using default", star.label());
                self.star_types
                    .insert(star, defaults.star_types[&star].clone());
            }
        }
        for planet in PlanetType::ALL {
            if !self.planet_types.contains_key(&planet) {
                warn!("planet type {planet:?} missing from config, using default");
                self.planet_types
                    .insert(planet, defaults.planet_types[&planet].clone());
            }
        }
        for (zone, table) in &defaults.zone_planets {
            let entry = self.zone_planets.entry(*zone).or_default();
            if entry.is_empty() {
                warn!("zone {zone:?} has no planet table, using default");
                entry.clone_from(table);
            }
        }
        for (position, table) in &defaults.asteroid_materials {
            let entry = self.asteroid_materials.entry(*position).or_default();
            if entry.is_empty() {
                entry.clone_from(table);
            }
        }
        for star in StarType::ALL {
            if !self.comets.by_star.contains_key(&star) {
                self.comets
                    .by_star
                    .insert(star, defaults.comets.by_star[&star].clone());
            }
        }
        self.comets.rarity_multiplier = self.comets.rarity_multiplier.clamp(0.0, 1.0);
        debug!(
            "generation config ready: {} star types, {} planet types, {} nebula types",
            self.star_types.len(),
            self.planet_types.len(),
            self.nebula_types.len()
        );
    }

    pub fn star(&self, star_type: StarType) -> &StarTypeConfig {
        self.star_types.get(&star_type).unwrap_or_else(|| {
            warn!("no config for star type {}", star_type.label());
            FALLBACK_STAR.get_or_init(yellow_star)
        })
    }

    /// Planet table lookup; unknown types fall back to terrestrial.
    pub fn planet(&self, planet_type: PlanetType) -> &PlanetTypeConfig {
        if let Some(config) = self.planet_types.get(&planet_type) {
            return config;
        }
        warn!("no config for planet type {planet_type:?}, falling back to terrestrial");
        self.planet_types
            .get(&PlanetType::Terrestrial)
            .unwrap_or_else(|| FALLBACK_PLANET.get_or_init(PlanetTypeConfig::default))
    }

    pub fn zone_table(&self, zone: OrbitalZone) -> &[(PlanetType, f64)] {
        self.zone_planets
            .get(&zone)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn comet_table(&self, star_type: StarType) -> &CometStarConfig {
        self.comets
            .by_star
            .get(&star_type)
            .unwrap_or_else(|| FALLBACK_COMETS.get_or_init(CometStarConfig::default))
    }

    pub fn materials(&self, position: BeltPosition) -> &[(AsteroidMaterial, f64)] {
        self.asteroid_materials
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// --- Default implementations ---

impl Default for GenerationConfig {
    fn default() -> Self {
        let star_types = [
            (StarType::YellowStar, yellow_star()),
            (StarType::OrangeStar, orange_star()),
            (StarType::RedDwarf, red_dwarf()),
            (StarType::WhiteDwarf, white_dwarf()),
            (StarType::BlueGiant, blue_giant()),
            (StarType::RedGiant, red_giant()),
            (StarType::NeutronStar, neutron_star()),
            (StarType::BinaryStar, binary_star()),
            (StarType::BlackHole, black_hole()),
        ]
        .into_iter()
        .collect();

        let planet_types = PlanetType::ALL
            .into_iter()
            .map(|t| (t, default_planet(t)))
            .collect();

        Self {
            star_types,
            planet_types,
            zone_planets: default_zone_tables(),
            nebula_types: default_nebulae(),
            comets: CometTableConfig::default(),
            asteroid_materials: default_materials(),
            asteroids_per_belt: 40..=120,
            city_density: 12.0,
        }
    }
}

impl Default for StarTypeConfig {
    fn default() -> Self {
        yellow_star()
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                StarType::YellowStar,
                StarType::OrangeStar,
                StarType::RedDwarf,
                StarType::WhiteDwarf,
            ],
            distance: 0.1..=0.18,
            speed: 0.4..=1.2,
            size_factor: 0.5..=0.9,
        }
    }
}

impl Default for PlanetTypeConfig {
    fn default() -> Self {
        default_planet(PlanetType::Terrestrial)
    }
}

impl Default for AtmosphereDefaults {
    fn default() -> Self {
        Self {
            presence_chance: 0.85,
            composition: gases(&[("nitrogen", 78.0), ("oxygen", 21.0), ("argon", 1.0)]),
            pressure: 0.5..=1.5,
            cloud_coverage: 0.3,
            color: "#c8d3e0".to_string(),
            opacity: 0.4,
        }
    }
}

impl Default for SurfaceDefaults {
    fn default() -> Self {
        Self {
            coverage: TerrainCoverage::default(),
            continent_count: 0..=0,
        }
    }
}

impl Default for AppearanceDefaults {
    fn default() -> Self {
        Self {
            base_color: "#8c7b6b".to_string(),
            secondary_color: "#a89a86".to_string(),
            roughness: 0.8,
            texture: "rocky".to_string(),
        }
    }
}

impl Default for NebulaTypeConfig {
    fn default() -> Self {
        Self {
            nebula_type: NebulaType::Emission,
            rarity: 0.1,
            preferred_stars: Vec::new(),
            size: 8.0..=20.0,
            density: 0.2..=0.6,
            opacity: 0.2..=0.5,
            colors: vec!["#ff7eb3".to_string()],
        }
    }
}

impl Default for CometTableConfig {
    fn default() -> Self {
        let mixed = vec![
            (CometType::ShortPeriod, 50.0),
            (CometType::HalleyType, 30.0),
            (CometType::LongPeriod, 20.0),
        ];
        let distant = vec![
            (CometType::ShortPeriod, 20.0),
            (CometType::HalleyType, 30.0),
            (CometType::LongPeriod, 50.0),
        ];
        let by_star = [
            (StarType::YellowStar, 1..=4, mixed.clone()),
            (StarType::OrangeStar, 1..=3, mixed.clone()),
            (StarType::RedDwarf, 0..=2, mixed.clone()),
            (StarType::WhiteDwarf, 0..=2, distant.clone()),
            (StarType::BlueGiant, 2..=6, distant.clone()),
            (StarType::RedGiant, 1..=3, distant.clone()),
            (StarType::NeutronStar, 0..=1, distant.clone()),
            (StarType::BinaryStar, 1..=5, mixed),
            (StarType::BlackHole, 0..=2, distant),
        ]
        .into_iter()
        .map(|(star, count, weights)| (star, CometStarConfig { count, weights }))
        .collect();

        Self {
            rarity_multiplier: 0.8,
            by_star,
        }
    }
}

impl Default for CometStarConfig {
    fn default() -> Self {
        Self {
            count: 0..=2,
            weights: vec![
                (CometType::ShortPeriod, 50.0),
                (CometType::HalleyType, 30.0),
                (CometType::LongPeriod, 20.0),
            ],
        }
    }
}

// --- Built-in tables ---

fn gases(entries: &[(&str, f64)]) -> WeightTable<String> {
    entries
        .iter()
        .map(|(gas, pct)| (gas.to_string(), *pct))
        .collect()
}

fn habitable_weights() -> WeightTable<PlanetType> {
    vec![
        (PlanetType::EarthLike, 30.0),
        (PlanetType::OceanWorld, 25.0),
        (PlanetType::Terrestrial, 20.0),
        (PlanetType::JungleWorld, 10.0),
        (PlanetType::DesertWorld, 10.0),
        (PlanetType::IceWorld, 5.0),
    ]
}

fn star(
    color: &str,
    size: f64,
    temperature: f64,
    luminosity: f64,
    habitable_zone: RangeInclusive<f64>,
    planet_count: RangeInclusive<u32>,
) -> StarTypeConfig {
    StarTypeConfig {
        color: color.to_string(),
        size,
        temperature,
        luminosity,
        habitable_zone,
        planet_count,
        planet_weights: habitable_weights(),
        companion: None,
        black_hole: None,
    }
}

fn yellow_star() -> StarTypeConfig {
    star("#fff4d6", 0.08, 5778.0, 1.0, 0.95..=1.67, 3..=8)
}

fn orange_star() -> StarTypeConfig {
    star("#ffc27a", 0.07, 4500.0, 0.45, 0.6..=1.2, 2..=7)
}

fn red_dwarf() -> StarTypeConfig {
    let mut config = star("#ff7a4a", 0.04, 3200.0, 0.04, 0.12..=0.4, 1..=5);
    config.planet_weights = vec![
        (PlanetType::Terrestrial, 40.0),
        (PlanetType::OceanWorld, 25.0),
        (PlanetType::DesertWorld, 20.0),
        (PlanetType::EarthLike, 15.0),
    ];
    config
}

fn white_dwarf() -> StarTypeConfig {
    let mut config = star("#e8f0ff", 0.02, 9000.0, 0.02, 0.06..=0.2, 0..=3);
    config.planet_weights = vec![
        (PlanetType::IceWorld, 40.0),
        (PlanetType::Terrestrial, 35.0),
        (PlanetType::DesertWorld, 25.0),
    ];
    config
}

fn blue_giant() -> StarTypeConfig {
    star("#9bb8ff", 0.25, 20000.0, 30.0, 5.0..=12.0, 2..=6)
}

fn red_giant() -> StarTypeConfig {
    star("#ff5533", 0.35, 3800.0, 12.0, 3.0..=7.0, 1..=5)
}

fn neutron_star() -> StarTypeConfig {
    star("#cfe6ff", 0.01, 600_000.0, 0.5, 0.3..=0.8, 0..=2)
}

fn binary_star() -> StarTypeConfig {
    let mut config = star("#ffe6b0", 0.09, 5500.0, 1.2, 1.0..=1.9, 2..=6);
    config.companion = Some(CompanionConfig::default());
    config
}

fn black_hole() -> StarTypeConfig {
    let mut config = star("#1a0a2e", 0.05, 0.0, 0.8, 2.0..=5.0, 0..=4);
    config.black_hole = Some(BlackHoleConfig {
        event_horizon: Some(0.05),
        accretion_inner: Some(0.12),
        accretion_outer: Some(0.35),
        hawking_radiation: Some(false),
    });
    config
}

#[allow(clippy::too_many_arguments)]
fn planet(
    size: RangeInclusive<f64>,
    mass: RangeInclusive<f64>,
    gravity: RangeInclusive<f64>,
    rotation_period: RangeInclusive<f64>,
    axial_tilt: RangeInclusive<f64>,
    atmosphere: AtmosphereDefaults,
    surface: SurfaceDefaults,
    appearance: (&str, &str, f64, &str),
) -> PlanetTypeConfig {
    let (base_color, secondary_color, roughness, texture) = appearance;
    PlanetTypeConfig {
        size,
        mass,
        gravity,
        rotation_period,
        axial_tilt,
        atmosphere,
        surface,
        appearance: AppearanceDefaults {
            base_color: base_color.to_string(),
            secondary_color: secondary_color.to_string(),
            roughness,
            texture: texture.to_string(),
        },
    }
}

fn atmosphere(
    presence_chance: f64,
    composition: &[(&str, f64)],
    pressure: RangeInclusive<f64>,
    cloud_coverage: f64,
    color: &str,
    opacity: f64,
) -> AtmosphereDefaults {
    AtmosphereDefaults {
        presence_chance,
        composition: gases(composition),
        pressure,
        cloud_coverage,
        color: color.to_string(),
        opacity,
    }
}

fn surface(coverage: [f64; 7], continent_count: RangeInclusive<u32>) -> SurfaceDefaults {
    let [ocean, land, ice, desert, forest, mountains, lava] = coverage;
    SurfaceDefaults {
        coverage: TerrainCoverage {
            ocean,
            land,
            ice,
            desert,
            forest,
            mountains,
            lava,
        },
        continent_count,
    }
}

fn default_planet(planet_type: PlanetType) -> PlanetTypeConfig {
    match planet_type {
        PlanetType::Terrestrial => planet(
            0.5..=2.0,
            0.3..=2.0,
            0.5..=1.3,
            15.0..=40.0,
            0.0..=30.0,
            atmosphere(
                0.85,
                &[("nitrogen", 70.0), ("carbon_dioxide", 25.0), ("argon", 5.0)],
                0.3..=1.5,
                0.3,
                "#c8d3e0",
                0.4,
            ),
            surface([0.2, 0.7, 0.1, 0.2, 0.1, 0.3, 0.0], 2..=5),
            ("#8c7b6b", "#a89a86", 0.8, "rocky"),
        ),
        PlanetType::EarthLike => planet(
            0.5..=2.0,
            0.8..=1.5,
            0.9..=1.2,
            20.0..=30.0,
            10.0..=30.0,
            atmosphere(
                1.0,
                &[("nitrogen", 78.0), ("oxygen", 21.0), ("argon", 1.0)],
                0.8..=1.2,
                0.5,
                "#87ceeb",
                0.35,
            ),
            surface([0.7, 0.3, 0.05, 0.1, 0.4, 0.2, 0.0], 3..=7),
            ("#2e6fba", "#3f9b4f", 0.5, "continental"),
        ),
        PlanetType::OceanWorld => planet(
            0.5..=2.0,
            0.8..=2.0,
            0.9..=1.3,
            18.0..=35.0,
            5.0..=25.0,
            atmosphere(
                0.85,
                &[
                    ("nitrogen", 75.0),
                    ("oxygen", 18.0),
                    ("water_vapor", 6.0),
                    ("argon", 1.0),
                ],
                0.9..=2.0,
                0.7,
                "#9fd4ff",
                0.45,
            ),
            surface([0.95, 0.05, 0.05, 0.0, 0.02, 0.05, 0.0], 1..=3),
            ("#1b4f9c", "#2a7fd4", 0.3, "oceanic"),
        ),
        PlanetType::DesertWorld => planet(
            0.5..=2.0,
            0.5..=1.5,
            0.6..=1.1,
            20.0..=50.0,
            0.0..=40.0,
            atmosphere(
                0.85,
                &[("carbon_dioxide", 60.0), ("nitrogen", 35.0), ("argon", 5.0)],
                0.1..=0.9,
                0.1,
                "#e8c99a",
                0.3,
            ),
            surface([0.02, 0.98, 0.02, 0.85, 0.01, 0.3, 0.0], 2..=4),
            ("#d4a35f", "#b5793c", 0.9, "dunes"),
        ),
        PlanetType::IceWorld => planet(
            0.5..=2.0,
            0.3..=1.2,
            0.4..=1.0,
            20.0..=60.0,
            0.0..=45.0,
            atmosphere(
                0.85,
                &[("nitrogen", 85.0), ("methane", 10.0), ("argon", 5.0)],
                0.05..=0.8,
                0.35,
                "#dff4ff",
                0.3,
            ),
            surface([0.1, 0.3, 0.9, 0.0, 0.0, 0.25, 0.0], 1..=4),
            ("#e6f2ff", "#a9c9e8", 0.4, "glacial"),
        ),
        PlanetType::JungleWorld => planet(
            0.5..=2.0,
            0.9..=1.8,
            0.9..=1.3,
            20.0..=32.0,
            5.0..=20.0,
            atmosphere(
                1.0,
                &[
                    ("nitrogen", 72.0),
                    ("oxygen", 26.0),
                    ("argon", 1.0),
                    ("carbon_dioxide", 1.0),
                ],
                1.0..=1.8,
                0.65,
                "#a8e6a1",
                0.5,
            ),
            surface([0.4, 0.6, 0.0, 0.02, 0.85, 0.15, 0.0], 3..=6),
            ("#2f7d32", "#1b5e20", 0.6, "canopy"),
        ),
        PlanetType::LavaWorld => planet(
            0.5..=2.0,
            0.5..=2.0,
            0.6..=1.4,
            5.0..=30.0,
            0.0..=20.0,
            atmosphere(
                0.6,
                &[("carbon_dioxide", 70.0), ("sulfur_dioxide", 25.0), ("nitrogen", 5.0)],
                0.5..=5.0,
                0.25,
                "#ff9966",
                0.6,
            ),
            surface([0.0, 0.8, 0.0, 0.3, 0.0, 0.5, 0.6], 1..=4),
            ("#3b1a0e", "#ff4500", 0.95, "volcanic"),
        ),
        PlanetType::GasGiant => planet(
            8.0..=15.0,
            50.0..=320.0,
            1.0..=2.6,
            9.0..=17.0,
            0.0..=30.0,
            atmosphere(
                1.0,
                &[("hydrogen", 86.0), ("helium", 13.0), ("methane", 1.0)],
                100.0..=1000.0,
                0.95,
                "#e3c9a8",
                0.9,
            ),
            surface([0.0; 7], 0..=0),
            ("#d9b38c", "#a8703e", 0.2, "banded"),
        ),
        PlanetType::IceGiant => planet(
            3.0..=6.0,
            10.0..=20.0,
            0.9..=1.2,
            15.0..=18.0,
            0.0..=98.0,
            atmosphere(
                1.0,
                &[("hydrogen", 80.0), ("helium", 18.0), ("methane", 2.0)],
                50.0..=300.0,
                0.8,
                "#b3e5fc",
                0.85,
            ),
            surface([0.0; 7], 0..=0),
            ("#5fb0d9", "#3d7ea6", 0.2, "banded"),
        ),
        PlanetType::DwarfPlanet => planet(
            0.1..=0.3,
            0.001..=0.01,
            0.03..=0.1,
            6.0..=150.0,
            0.0..=120.0,
            atmosphere(
                0.1,
                &[("nitrogen", 90.0), ("methane", 10.0)],
                0.00001..=0.001,
                0.0,
                "#ffffff",
                0.05,
            ),
            surface([0.0, 0.6, 0.4, 0.0, 0.0, 0.1, 0.0], 0..=1),
            ("#9a8f85", "#c4b8a8", 0.95, "cratered"),
        ),
    }
}

fn default_zone_tables() -> BTreeMap<OrbitalZone, WeightTable<PlanetType>> {
    use PlanetType::*;
    [
        (
            OrbitalZone::Inferno,
            vec![(LavaWorld, 60.0), (Terrestrial, 25.0), (DwarfPlanet, 15.0)],
        ),
        (
            OrbitalZone::Hot,
            vec![
                (DesertWorld, 30.0),
                (LavaWorld, 20.0),
                (Terrestrial, 20.0),
                (JungleWorld, 15.0),
                (GasGiant, 10.0),
                (DwarfPlanet, 5.0),
            ],
        ),
        (
            OrbitalZone::Goldilocks,
            vec![
                (EarthLike, 30.0),
                (OceanWorld, 25.0),
                (Terrestrial, 15.0),
                (DesertWorld, 15.0),
                (IceWorld, 10.0),
                (GasGiant, 5.0),
            ],
        ),
        (
            OrbitalZone::Cold,
            vec![
                (IceWorld, 35.0),
                (GasGiant, 30.0),
                (IceGiant, 20.0),
                (Terrestrial, 10.0),
                (DwarfPlanet, 5.0),
            ],
        ),
        (
            OrbitalZone::Outer,
            vec![
                (GasGiant, 40.0),
                (IceGiant, 35.0),
                (IceWorld, 15.0),
                (DwarfPlanet, 10.0),
            ],
        ),
        (
            OrbitalZone::DeepSpace,
            vec![(IceGiant, 40.0), (DwarfPlanet, 35.0), (IceWorld, 25.0)],
        ),
    ]
    .into_iter()
    .collect()
}

fn default_materials() -> BTreeMap<BeltPosition, WeightTable<AsteroidMaterial>> {
    use AsteroidMaterial::*;
    [
        (
            BeltPosition::Inner,
            vec![
                (Rocky, 45.0),
                (Metallic, 35.0),
                (Carbonaceous, 10.0),
                (Crystalline, 5.0),
                (Icy, 5.0),
            ],
        ),
        (
            BeltPosition::Middle,
            vec![
                (Rocky, 35.0),
                (Carbonaceous, 30.0),
                (Metallic, 20.0),
                (Icy, 10.0),
                (Crystalline, 5.0),
            ],
        ),
        (
            BeltPosition::Outer,
            vec![
                (Icy, 45.0),
                (Carbonaceous, 35.0),
                (Rocky, 10.0),
                (Metallic, 5.0),
                (Crystalline, 5.0),
            ],
        ),
    ]
    .into_iter()
    .collect()
}

fn nebula(
    nebula_type: NebulaType,
    rarity: f64,
    preferred_stars: &[StarType],
    size: RangeInclusive<f64>,
    colors: &[&str],
) -> NebulaTypeConfig {
    NebulaTypeConfig {
        nebula_type,
        rarity,
        preferred_stars: preferred_stars.to_vec(),
        size,
        colors: colors.iter().map(|c| c.to_string()).collect(),
        ..NebulaTypeConfig::default()
    }
}

fn default_nebulae() -> Vec<NebulaTypeConfig> {
    vec![
        nebula(
            NebulaType::Emission,
            0.12,
            &[StarType::BlueGiant, StarType::BinaryStar],
            10.0..=24.0,
            &["#ff4f7b", "#ff7eb3", "#e84a5f"],
        ),
        nebula(
            NebulaType::Reflection,
            0.1,
            &[StarType::BlueGiant, StarType::YellowStar],
            8.0..=18.0,
            &["#6fa8ff", "#9ec9ff", "#b8d8ff"],
        ),
        NebulaTypeConfig {
            density: 0.5..=0.9,
            opacity: 0.4..=0.8,
            ..nebula(
                NebulaType::Dark,
                0.08,
                &[StarType::RedDwarf, StarType::BlackHole],
                12.0..=30.0,
                &["#1c1424", "#2a1f33"],
            )
        },
        nebula(
            NebulaType::Planetary,
            0.06,
            &[StarType::WhiteDwarf, StarType::RedGiant],
            4.0..=9.0,
            &["#5ff2d0", "#7bd4ff", "#c79bff"],
        ),
        nebula(
            NebulaType::SupernovaRemnant,
            0.04,
            &[StarType::NeutronStar, StarType::BlackHole],
            6.0..=16.0,
            &["#ff9a3c", "#ff5e3a", "#8ad7ff"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_table_key() {
        let config = GenerationConfig::default();
        for star in StarType::ALL {
            assert!(config.star_types.contains_key(&star));
            assert!(config.comets.by_star.contains_key(&star));
        }
        for planet in PlanetType::ALL {
            assert!(config.planet_types.contains_key(&planet));
        }
        assert_eq!(config.zone_planets.len(), 6);
        assert_eq!(config.asteroid_materials.len(), 3);
    }

    #[test]
    fn goldilocks_table_keeps_declared_order() {
        let config = GenerationConfig::default();
        let table = config.zone_table(OrbitalZone::Goldilocks);
        let expected = [
            (PlanetType::EarthLike, 30.0),
            (PlanetType::OceanWorld, 25.0),
            (PlanetType::Terrestrial, 15.0),
            (PlanetType::DesertWorld, 15.0),
            (PlanetType::IceWorld, 10.0),
            (PlanetType::GasGiant, 5.0),
        ];
        assert_eq!(table, &expected[..]);
    }

    #[test]
    fn partial_file_is_completed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.json");
        std::fs::write(
            &path,
            r#"{ "city_density": 3.5, "star_types": { "red_dwarf": { "size": 0.03 } } }"#,
        )
        .unwrap();

        let config = GenerationConfig::load(&path).unwrap();
        let defaults = GenerationConfig::default();
        assert_eq!(config.city_density, 3.5);
        let red_dwarf = config.star(StarType::RedDwarf);
        assert_eq!(red_dwarf.size, 0.03);
        // everything the entry leaves out keeps the red dwarf's own values
        assert_eq!(red_dwarf.color, "#ff7a4a");
        assert_eq!(red_dwarf.habitable_zone, 0.12..=0.4);
        assert_eq!(red_dwarf.planet_count, 1..=5);
        assert_eq!(
            red_dwarf.planet_weights,
            defaults.star(StarType::RedDwarf).planet_weights
        );
        assert_eq!(config.star(StarType::YellowStar), defaults.star(StarType::YellowStar));
        assert_eq!(config.star_types.len(), StarType::ALL.len());
        assert_eq!(config.planet_types.len(), PlanetType::ALL.len());
    }

    #[test]
    fn partial_planet_entries_keep_their_own_type() {
        let config = GenerationConfig::from_json(
            r##"{ "planet_types": { "gas_giant": { "atmosphere": { "color": "#123456" } } } }"##,
        )
        .unwrap();
        let defaults = GenerationConfig::default();
        let giant = config.planet(PlanetType::GasGiant);
        let expected = defaults.planet(PlanetType::GasGiant);
        assert_eq!(giant.atmosphere.color, "#123456");
        assert_eq!(giant.size, expected.size);
        assert_eq!(giant.atmosphere.presence_chance, expected.atmosphere.presence_chance);
        assert_eq!(giant.atmosphere.composition, expected.atmosphere.composition);
        assert_ne!(giant.size, defaults.planet(PlanetType::Terrestrial).size);
    }

    #[test]
    fn non_object_config_is_rejected() {
        assert!(matches!(
            GenerationConfig::from_json("[1, 2, 3]"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn saved_config_loads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("generation.json");
        let config = GenerationConfig::default();
        config.save(&path).unwrap();
        assert_eq!(GenerationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_or_malformed_files_report_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            GenerationConfig::load(&missing),
            Err(ConfigError::ReadError(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            GenerationConfig::load(&broken),
            Err(ConfigError::ParseError(_))
        ));
        assert_eq!(
            GenerationConfig::load_or_default(&broken),
            GenerationConfig::default()
        );
    }

    #[test]
    fn unknown_planet_type_falls_back_to_terrestrial() {
        let mut config = GenerationConfig::default();
        config.planet_types.remove(&PlanetType::JungleWorld);
        let terrestrial = config.planet(PlanetType::Terrestrial).clone();
        assert_eq!(config.planet(PlanetType::JungleWorld), &terrestrial);
    }
}
