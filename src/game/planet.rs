use serde::{Deserialize, Serialize};

use crate::game::body::{orbital_speed, OrbitalZone, PlanetType};
use crate::game::config::{GenerationConfig, PlanetTypeConfig, TerrainCoverage};
use crate::game::moon::{generate_moons, generate_rings, MoonData, MoonHost, RingData};
use crate::game::random::{
    chance, mix, random_count, random_in, random_range, spherical_noise, sub_seed, unit_vector,
    NoiseConfig, Seed,
};
use crate::game::terrain::{
    generate_cities, generate_continents, generate_satellites, CityData, ContinentData,
    SatelliteData,
};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
const RETROGRADE_CHANCE: f64 = 0.2;

/// Latitude bands sampled when estimating global cloud cover.
const CLOUD_LATITUDES: [f64; 5] = [-60.0, -30.0, 0.0, 30.0, 60.0];
const CLOUD_LONGITUDES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureZones {
    pub tropical: f64,
    pub temperate: f64,
    pub polar: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceData {
    pub coverage: TerrainCoverage,
    /// °C.
    pub average_temperature: f64,
    pub temperature_zones: TemperatureZones,
    pub continents: Vec<ContinentData>,
    pub cities: Vec<CityData>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// km/h.
    pub wind_speed: f64,
    /// 0..1.
    pub storm_intensity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereData {
    /// Gas name and percentage.
    pub composition: Vec<(String, f64)>,
    /// bar.
    pub pressure: f64,
    pub cloud_coverage: f64,
    pub color: String,
    pub opacity: f64,
    pub weather: WeatherData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppearanceData {
    pub base_color: String,
    pub secondary_color: String,
    pub roughness: f64,
    pub texture: String,
    /// Brightness multiplier applied on top of the base colors.
    pub shading: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetData {
    pub id: String,
    pub name: String,
    pub planet_type: PlanetType,
    /// Earth radii.
    pub size: f64,
    pub radius_km: f64,
    /// Earth masses.
    pub mass: f64,
    /// g.
    pub gravity: f64,
    /// Degrees.
    pub axial_tilt: f64,
    /// Hours.
    pub rotation_period: f64,
    pub spin_axis: [f64; 3],
    pub spin_speed: f64,
    /// `1` for prograde rotation, `-1` for retrograde.
    pub spin_direction: i8,
    /// AU.
    pub orbital_distance: f64,
    pub orbital_speed: f64,
    /// Degrees.
    pub orbital_phase: f64,
    pub eccentricity: f64,
    /// Degrees.
    pub inclination: f64,
    pub zone: OrbitalZone,
    pub surface: SurfaceData,
    pub atmosphere: Option<AtmosphereData>,
    pub appearance: AppearanceData,
    pub moons: Vec<MoonData>,
    pub rings: Option<RingData>,
    pub satellites: Vec<SatelliteData>,
    pub seed: Seed,
}

/// Everything the system generator has decided about a planet before it is built.
pub struct PlanetRequest<'a> {
    pub id: String,
    pub name: String,
    pub planet_type: PlanetType,
    pub size: f64,
    pub orbital_distance: f64,
    pub zone: OrbitalZone,
    /// Total luminosity of the system's star(s).
    pub luminosity: f64,
    pub config: &'a GenerationConfig,
}

fn type_temperature_offset(planet_type: PlanetType) -> f64 {
    match planet_type {
        PlanetType::LavaWorld => 250.0,
        PlanetType::DesertWorld => 20.0,
        PlanetType::JungleWorld => 10.0,
        PlanetType::OceanWorld => -5.0,
        PlanetType::IceWorld => -40.0,
        _ => 0.0,
    }
}

/// Mean surface temperature: zone baseline, type offset and a greenhouse term.
pub fn average_temperature(zone: OrbitalZone, planet_type: PlanetType, pressure: f64, seed: Seed) -> f64 {
    let greenhouse = pressure.clamp(0.0, 10.0) * 3.0;
    zone.base_temperature() + type_temperature_offset(planet_type) + greenhouse
        + random_range(-10.0, 10.0, seed)
}

/// Fractions of the surface in each climate band. Always sums to one.
pub fn temperature_zones(average_temperature: f64, axial_tilt: f64) -> TemperatureZones {
    let warmth = ((average_temperature + 50.0) / 100.0).clamp(0.0, 1.0);
    let tilt = (axial_tilt.abs().min(90.0)) / 90.0;
    let tropical = warmth * (0.2 + 0.3 * tilt);
    let polar = (1.0 - warmth) * (0.3 + 0.3 * (1.0 - tilt));
    TemperatureZones {
        tropical,
        temperate: 1.0 - tropical - polar,
        polar,
    }
}

/// Global cloud cover: the type's default blended with noise sampled across
/// several latitude bands.
pub fn cloud_coverage(type_default: f64, seed: Seed) -> f64 {
    let noise = NoiseConfig {
        octaves: 3,
        scale: 1.5,
        ..NoiseConfig::with_seed(seed)
    };
    let samples: Vec<f64> = CLOUD_LATITUDES
        .iter()
        .flat_map(|lat| {
            CLOUD_LONGITUDES
                .iter()
                .map(move |lng| (*lat, *lng))
        })
        .map(|(lat, lng)| spherical_noise(lat, lng, &noise))
        .collect();
    let sampled = samples.iter().sum::<f64>() / samples.len() as f64;
    (type_default * 0.6 + sampled * 0.4).clamp(0.0, 1.0)
}

fn generate_atmosphere(
    planet_type: PlanetType,
    defaults: &PlanetTypeConfig,
    seed: Seed,
) -> Option<AtmosphereData> {
    let atmosphere = &defaults.atmosphere;
    if !chance(atmosphere.presence_chance, seed) {
        return None;
    }

    let pressure = random_in(&atmosphere.pressure, sub_seed(seed, 1));
    let cloud_coverage = cloud_coverage(atmosphere.cloud_coverage, sub_seed(seed, 2));
    let wind_speed = if planet_type.is_giant() {
        random_range(200.0, 1500.0, sub_seed(seed, 4))
    } else {
        random_range(5.0, 80.0, sub_seed(seed, 4)) * (1.0 + pressure.min(5.0) * 0.1)
    };

    Some(AtmosphereData {
        composition: atmosphere.composition.clone(),
        pressure,
        cloud_coverage,
        color: atmosphere.color.clone(),
        opacity: (atmosphere.opacity * random_range(0.8, 1.2, sub_seed(seed, 3))).clamp(0.05, 1.0),
        weather: WeatherData {
            wind_speed,
            storm_intensity: (cloud_coverage * random_range(0.5, 1.5, sub_seed(seed, 5)))
                .clamp(0.0, 1.0),
        },
    })
}

fn generate_appearance(defaults: &PlanetTypeConfig, seed: Seed) -> AppearanceData {
    let appearance = &defaults.appearance;
    AppearanceData {
        base_color: appearance.base_color.clone(),
        secondary_color: appearance.secondary_color.clone(),
        roughness: (appearance.roughness + random_range(-0.1, 0.1, seed)).clamp(0.0, 1.0),
        texture: appearance.texture.clone(),
        shading: random_range(0.85, 1.15, sub_seed(seed, 1)),
    }
}

pub fn generate_planet(request: &PlanetRequest<'_>, seed: Seed) -> PlanetData {
    let config = request.config.planet(request.planet_type);
    let planet_type = request.planet_type;

    let axial_tilt = random_in(&config.axial_tilt, sub_seed(seed, 4));
    let rotation_period = random_in(&config.rotation_period, sub_seed(seed, 3));
    let spin_direction: i8 = if chance(RETROGRADE_CHANCE, sub_seed(seed, 8)) { -1 } else { 1 };

    let atmosphere = generate_atmosphere(planet_type, config, sub_seed(seed, 20));
    let pressure = atmosphere.as_ref().map_or(0.0, |a| a.pressure);
    let average_temperature =
        average_temperature(request.zone, planet_type, pressure, sub_seed(seed, 30));

    // independent stream so surface detail never shares offsets with the next planet slot
    let surface_seed = mix(sub_seed(seed, 40));
    let continent_count = random_count(&config.surface.continent_count, sub_seed(seed, 41));
    let continents = generate_continents(
        &request.id,
        continent_count,
        average_temperature,
        surface_seed,
    );
    let cities = generate_cities(
        &continents,
        planet_type,
        request.config.city_density,
        sub_seed(surface_seed, 3000),
    );
    let satellites = generate_satellites(&request.id, &cities, sub_seed(surface_seed, 6000));

    let rings = generate_rings(planet_type, request.size, mix(sub_seed(seed, 60)));
    let clearance = rings.as_ref().map_or(0.0, |r| r.outer_radius);
    let host = MoonHost {
        id: &request.id,
        name: &request.name,
        planet_type,
        size: request.size,
        zone: request.zone,
    };
    let moons = generate_moons(&host, clearance, mix(sub_seed(seed, 70)));

    PlanetData {
        id: request.id.clone(),
        name: request.name.clone(),
        planet_type,
        size: request.size,
        radius_km: request.size * EARTH_RADIUS_KM,
        mass: random_in(&config.mass, sub_seed(seed, 1)),
        gravity: random_in(&config.gravity, sub_seed(seed, 2)),
        axial_tilt,
        rotation_period,
        spin_axis: unit_vector(sub_seed(seed, 5)),
        spin_speed: 0.24 / rotation_period.max(0.1),
        spin_direction,
        orbital_distance: request.orbital_distance,
        orbital_speed: orbital_speed(request.luminosity, request.orbital_distance),
        orbital_phase: random_range(0.0, 360.0, sub_seed(seed, 11)),
        eccentricity: random_range(0.0, 0.08, sub_seed(seed, 9)),
        inclination: random_range(-3.0, 3.0, sub_seed(seed, 10)),
        zone: request.zone,
        surface: SurfaceData {
            coverage: config.surface.coverage.clone(),
            average_temperature,
            temperature_zones: temperature_zones(average_temperature, axial_tilt),
            continents,
            cities,
        },
        atmosphere,
        appearance: generate_appearance(config, sub_seed(seed, 50)),
        moons,
        rings,
        satellites,
        seed,
    }
}
