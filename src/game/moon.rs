use serde::{Deserialize, Serialize};

use crate::game::body::{OrbitalZone, PlanetType};
use crate::game::naming::moon_name;
use crate::game::random::{
    chance, random_count, random_int, random_range, sub_seed, unit_hash, weighted_random_select,
    Seed,
};

/// Giants pack their moons more tightly.
const GIANT_SPACING_FACTOR: f64 = 0.7;

const RING_COLORS: &[&str] = &["#d8c8a8", "#bfae8e", "#e6dcc8", "#a89a80", "#cfc2aa"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonType {
    Rocky,
    Icy,
    Volcanic,
    Captured,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoonData {
    pub id: String,
    pub name: String,
    pub moon_type: MoonType,
    /// Earth radii.
    pub size: f64,
    /// Distance from the planet center in render units.
    pub orbit_radius: f64,
    /// Negative for retrograde orbits.
    pub orbit_speed: f64,
    /// Degrees.
    pub orbit_phase: f64,
    /// Degrees.
    pub inclination: f64,
    pub rotation_speed: f64,
    pub color: String,
    pub seed: Seed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingPattern {
    Smooth,
    Banded,
    Dusty,
    Clumpy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingBand {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub opacity: f64,
    pub color: String,
    pub pattern: RingPattern,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingData {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Degrees from the equatorial plane.
    pub tilt: f64,
    pub bands: Vec<RingBand>,
}

/// What the moon generator needs to know about the host planet.
pub struct MoonHost<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub planet_type: PlanetType,
    pub size: f64,
    pub zone: OrbitalZone,
}

/// Approximate radius the renderer draws a planet of `size` Earth radii at.
pub fn planet_render_radius(size: f64) -> f64 {
    0.1 + size.max(0.0).sqrt() * 0.25
}

pub fn moon_render_radius(size: f64) -> f64 {
    size.max(0.0).sqrt() * 0.25
}

pub fn moon_count(planet_type: PlanetType, size: f64, seed: Seed) -> usize {
    match planet_type {
        PlanetType::GasGiant => random_count(&(3..=8), seed),
        PlanetType::IceGiant => random_count(&(2..=5), seed),
        _ if size < 0.5 => 0,
        _ if size < 1.5 => usize::from(chance(0.3, seed)),
        _ if size < 3.0 => random_count(&(1..=2), seed),
        _ => random_count(&(1..=3), seed),
    }
}

/// Moon radius in Earth radii. Lone moons can be large; crowded systems are
/// mostly small, except for the occasional major moon of a gas giant.
pub fn moon_size(planet_type: PlanetType, count: usize, seed: Seed) -> f64 {
    let (low, high) = match count {
        0 | 1 => (0.15, 0.40),
        _ if planet_type == PlanetType::GasGiant && chance(0.15, sub_seed(seed, 1)) => (0.25, 0.42),
        _ => (0.03, 0.12),
    };
    low + (high - low) * unit_hash(seed).powf(1.8)
}

/// Stratified inclination: 30% near-equatorial, 40% moderate, 30% steep.
pub fn moon_inclination(seed: Seed) -> f64 {
    let band = unit_hash(seed);
    let value = sub_seed(seed, 1);
    if band < 0.3 {
        random_range(0.0, 10.0, value)
    } else if band < 0.7 {
        random_range(10.0, 45.0, value)
    } else {
        random_range(45.0, 90.0, value)
    }
}

fn moon_type(zone: OrbitalZone, seed: Seed) -> MoonType {
    let table: &[(MoonType, f64)] = match zone {
        OrbitalZone::Inferno | OrbitalZone::Hot => &[
            (MoonType::Rocky, 50.0),
            (MoonType::Volcanic, 40.0),
            (MoonType::Captured, 10.0),
        ],
        OrbitalZone::Goldilocks => &[
            (MoonType::Rocky, 70.0),
            (MoonType::Icy, 15.0),
            (MoonType::Captured, 15.0),
        ],
        _ => &[
            (MoonType::Icy, 60.0),
            (MoonType::Rocky, 25.0),
            (MoonType::Captured, 15.0),
        ],
    };
    weighted_random_select(table, seed)
        .copied()
        .unwrap_or(MoonType::Rocky)
}

fn moon_color(moon_type: MoonType) -> &'static str {
    match moon_type {
        MoonType::Rocky => "#9e9e9e",
        MoonType::Icy => "#dfefff",
        MoonType::Volcanic => "#d9a441",
        MoonType::Captured => "#6e6259",
    }
}

/// Moons for one planet, ordered from the innermost orbit outwards.
///
/// `clearance` is the smallest orbit radius a moon may use (for example the
/// outer edge of the planet's rings).
pub fn generate_moons(host: &MoonHost<'_>, clearance: f64, seed: Seed) -> Vec<MoonData> {
    let count = moon_count(host.planet_type, host.size, seed);
    let planet_radius = planet_render_radius(host.size);
    let factor = if host.planet_type.is_giant() {
        GIANT_SPACING_FACTOR
    } else {
        1.0
    };

    let mut moons: Vec<MoonData> = Vec::with_capacity(count);
    let mut previous: Option<(f64, f64)> = None;
    for k in 0..count {
        let moon_seed = sub_seed(seed, 20 + k as u64 * 20);
        let size = moon_size(host.planet_type, count, sub_seed(moon_seed, 1));
        let radius = moon_render_radius(size);
        let gap = planet_radius * random_range(0.3, 0.7, sub_seed(moon_seed, 4)) * factor;

        let orbit_radius = match previous {
            None => (planet_radius * 1.6).max(clearance) + radius + gap,
            Some((prev_orbit, prev_radius)) => prev_orbit + prev_radius + radius + gap,
        };
        previous = Some((orbit_radius, radius));

        let moon_type = moon_type(host.zone, sub_seed(moon_seed, 3));
        let direction = if moon_type == MoonType::Captured { -1.0 } else { 1.0 };

        moons.push(MoonData {
            id: format!("{}-m{}", host.id, k),
            name: moon_name(host.name, k),
            moon_type,
            size,
            orbit_radius,
            orbit_speed: direction * 0.05 * (planet_radius / orbit_radius).sqrt(),
            orbit_phase: random_range(0.0, 360.0, sub_seed(moon_seed, 5)),
            inclination: moon_inclination(sub_seed(moon_seed, 6)),
            rotation_speed: random_range(0.001, 0.02, sub_seed(moon_seed, 8)),
            color: moon_color(moon_type).to_string(),
            seed: moon_seed,
        });
    }
    moons
}

fn ring_chance(planet_type: PlanetType, size: f64) -> f64 {
    match planet_type {
        PlanetType::GasGiant if size > 8.0 => 0.6,
        PlanetType::IceGiant if size > 5.0 => 0.4,
        _ => 0.0,
    }
}

/// Concentric ring bands starting just outside the planet; every third band is thin.
pub fn generate_rings(planet_type: PlanetType, size: f64, seed: Seed) -> Option<RingData> {
    if !chance(ring_chance(planet_type, size), seed) {
        return None;
    }

    let planet_radius = planet_render_radius(size);
    let count = random_count(&(3..=6), sub_seed(seed, 1));
    let inner_radius = planet_radius * 1.2;
    let mut cursor = inner_radius;
    let mut bands = Vec::with_capacity(count);

    for k in 0..count {
        let band_seed = sub_seed(seed, 10 + k as u64 * 10);
        let width = if k % 3 == 2 {
            random_range(0.05, 0.1, sub_seed(band_seed, 1))
        } else {
            random_range(0.15, 0.4, sub_seed(band_seed, 1))
        } * planet_radius;
        let color = random_int(0, RING_COLORS.len() as i64 - 1, sub_seed(band_seed, 4)) as usize;
        let pattern = match random_int(0, 3, sub_seed(band_seed, 5)) {
            0 => RingPattern::Smooth,
            1 => RingPattern::Banded,
            2 => RingPattern::Dusty,
            _ => RingPattern::Clumpy,
        };

        bands.push(RingBand {
            inner_radius: cursor,
            outer_radius: cursor + width,
            opacity: random_range(0.3, 0.9, sub_seed(band_seed, 3)),
            color: RING_COLORS[color.min(RING_COLORS.len() - 1)].to_string(),
            pattern,
        });
        cursor += width + planet_radius * random_range(0.02, 0.06, sub_seed(band_seed, 2));
    }

    let outer_radius = bands.last().map_or(inner_radius, |b| b.outer_radius);
    Some(RingData {
        inner_radius,
        outer_radius,
        tilt: random_range(-15.0, 15.0, sub_seed(seed, 2)),
        bands,
    })
}
