use std::ops::RangeInclusive;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::game::asteroid::{generate_asteroid_belt, AsteroidBeltData, BeltBand, BeltRequest};
use crate::game::body::{OrbitalZone, PlanetType, StarType};
use crate::game::comet::{generate_comets, CometData, CometSystemParams};
use crate::game::config::{GenerationConfig, StarTypeConfig};
use crate::game::naming::{planet_name, roman_numeral, system_name};
use crate::game::nebula::{generate_nebulae, NebulaData};
use crate::game::planet::{generate_planet, PlanetData, PlanetRequest};
use crate::game::random::{
    chance, mix, random_count, random_in, random_int, random_range, sub_seed,
    weighted_random_select, Seed,
};

/// Width of a placed belt as a fraction of the gap it sits in.
const BELT_GAP_FRACTION: f64 = 0.3;
/// Gaps narrower than this (AU) never get a belt.
const MIN_BELT_GAP: f64 = 0.5;
const FIRST_PLANET_INFERNO_CHANCE: f64 = 0.5;
const DISTANCE_JITTER: f64 = 0.15;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanionData {
    pub star_type: StarType,
    pub color: String,
    pub size: f64,
    pub temperature: f64,
    pub luminosity: f64,
    /// AU from the primary.
    pub orbit_distance: f64,
    pub orbit_speed: f64,
    /// Degrees.
    pub orbit_phase: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlackHoleData {
    pub event_horizon: f64,
    pub accretion_inner: f64,
    pub accretion_outer: f64,
    pub hawking_radiation: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarData {
    pub star_type: StarType,
    pub color: String,
    pub size: f64,
    pub temperature: f64,
    /// Luminosity of the primary alone.
    pub luminosity: f64,
    pub companion: Option<CompanionData>,
    pub black_hole: Option<BlackHoleData>,
}

impl StarData {
    /// Primary plus companion; this is what drives habitable-zone and orbit math.
    pub fn total_luminosity(&self) -> f64 {
        self.luminosity + self.companion.as_ref().map_or(0.0, |c| c.luminosity)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolarSystem {
    pub id: String,
    pub name: String,
    pub position: [f64; 3],
    pub star: StarData,
    pub planets: Vec<PlanetData>,
    pub asteroid_belts: Vec<AsteroidBeltData>,
    pub comets: Vec<CometData>,
    pub nebulae: Vec<NebulaData>,
    /// Ids of systems joined to this one by a tunnel.
    pub connections: Vec<String>,
    pub max_connections: usize,
    pub discovered: bool,
    pub colonized: bool,
    pub seed: Seed,
    /// Player uuids with visibility into this system.
    pub explored_by: Vec<String>,
    pub habitable_zone: RangeInclusive<f64>,
    pub min_safe_distance: f64,
}

impl SolarSystem {
    pub fn is_connected_to(&self, other: &str) -> bool {
        self.connections.iter().any(|c| c == other)
    }

    pub fn has_free_connection(&self) -> bool {
        self.connections.len() < self.max_connections
    }

    pub fn has_habitable_planet(&self) -> bool {
        self.planets.iter().any(|p| p.planet_type.is_habitable())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemRequest {
    pub star_type: Option<StarType>,
    pub seed: Seed,
    pub position: Option<[f64; 3]>,
    pub name: Option<String>,
}

impl SystemRequest {
    pub fn new(seed: Seed) -> Self {
        Self {
            star_type: None,
            seed,
            position: None,
            name: None,
        }
    }

    pub fn star_type(mut self, star_type: StarType) -> Self {
        self.star_type = Some(star_type);
        self
    }

    pub fn position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub fn system_id(seed: Seed) -> String {
    format!("sys-{seed:x}")
}

/// Hard floor for every planet orbit, belt inner edge and comet perihelion.
pub fn min_safe_distance(star_size: f64, habitable_zone: &RangeInclusive<f64>) -> f64 {
    0.1_f64
        .max(star_size * 2.5)
        .max(habitable_zone.start() * 0.2)
}

pub fn classify_zone(distance: f64, habitable_zone: &RangeInclusive<f64>) -> OrbitalZone {
    let (hz_min, hz_max) = (*habitable_zone.start(), *habitable_zone.end());
    if distance < hz_min * 0.3 {
        OrbitalZone::Inferno
    } else if distance < hz_min {
        OrbitalZone::Hot
    } else if distance <= hz_max {
        OrbitalZone::Goldilocks
    } else if distance < hz_max * 2.0 {
        OrbitalZone::Cold
    } else if distance < hz_max * 5.0 {
        OrbitalZone::Outer
    } else {
        OrbitalZone::DeepSpace
    }
}

/// Smallest allowed gap between two neighbouring orbits.
pub fn min_spacing(inner: (PlanetType, f64), outer: (PlanetType, f64)) -> f64 {
    let max_size = inner.1.max(outer.1);
    let giant_margin = if inner.0 == PlanetType::GasGiant || outer.0 == PlanetType::GasGiant {
        0.5
    } else {
        0.0
    };
    0.3 * (1.0 + (max_size - 1.0) * 0.5) + giant_margin
}

/// Belt bands for a system whose planets orbit at `distances` (ascending).
///
/// Rolls 0–2 belts, fills the widest qualifying gaps first and, when no gap
/// qualifies, places one compact belt just past the outermost orbit.
pub fn calculate_asteroid_belt_positions(distances: &[f64], seed: Seed) -> Vec<BeltBand> {
    let count = random_int(0, 2, seed).max(0) as usize;
    if count == 0 || distances.is_empty() {
        return Vec::new();
    }

    let mut gaps: Vec<(f64, f64)> = distances
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|(inner, outer)| outer - inner >= MIN_BELT_GAP)
        .collect();
    gaps.sort_by(|a, b| (b.1 - b.0).total_cmp(&(a.1 - a.0)));

    let mut bands: Vec<BeltBand> = gaps
        .into_iter()
        .take(count)
        .map(|(inner, outer)| {
            let gap = outer - inner;
            let margin = gap * (1.0 - BELT_GAP_FRACTION) / 2.0;
            BeltBand {
                inner_radius: inner + margin,
                outer_radius: outer - margin,
            }
        })
        .collect();

    if bands.is_empty() {
        let outermost = distances.iter().copied().fold(f64::MIN, f64::max);
        bands.push(BeltBand {
            inner_radius: outermost * 1.2,
            outer_radius: outermost * 1.35,
        });
    }
    bands.sort_by(|a, b| a.inner_radius.total_cmp(&b.inner_radius));
    bands
}

fn build_star(star_type: StarType, star: &StarTypeConfig, seed: Seed, config: &GenerationConfig) -> StarData {
    let companion = star.companion.as_ref().map(|companion| {
        let candidates = &companion.candidates;
        let companion_type = if candidates.is_empty() {
            StarType::RedDwarf
        } else {
            let index = random_int(0, candidates.len() as i64 - 1, sub_seed(seed, 2)) as usize;
            candidates[index.min(candidates.len() - 1)]
        };
        let companion_config = config.star(companion_type);
        CompanionData {
            star_type: companion_type,
            color: companion_config.color.clone(),
            size: companion_config.size * random_in(&companion.size_factor, sub_seed(seed, 6)),
            temperature: companion_config.temperature,
            luminosity: companion_config.luminosity,
            orbit_distance: random_in(&companion.distance, sub_seed(seed, 3)),
            orbit_speed: random_in(&companion.speed, sub_seed(seed, 4)),
            orbit_phase: random_range(0.0, 360.0, sub_seed(seed, 5)),
        }
    });

    let black_hole = star.black_hole.as_ref().map(|disk| {
        let event_horizon = disk.event_horizon.unwrap_or(star.size);
        let accretion_inner = disk.accretion_inner.unwrap_or(event_horizon * 2.5);
        BlackHoleData {
            event_horizon,
            accretion_inner,
            accretion_outer: disk.accretion_outer.unwrap_or(accretion_inner * 3.0),
            hawking_radiation: disk.hawking_radiation.unwrap_or(false),
        }
    });

    StarData {
        star_type,
        color: star.color.clone(),
        size: star.size,
        temperature: star.temperature,
        luminosity: star.luminosity,
        companion,
        black_hole,
    }
}

/// A companion star pushes the habitable zone outwards.
fn habitable_zone(star: &StarData, configured: &RangeInclusive<f64>) -> RangeInclusive<f64> {
    if star.companion.is_none() || star.luminosity <= 0.0 {
        return configured.clone();
    }
    let scale = (star.total_luminosity() / star.luminosity).sqrt();
    (configured.start() * scale)..=(configured.end() * scale)
}

struct Slot {
    planet_type: PlanetType,
    size: f64,
    distance: f64,
}

fn layout_slots(
    count: usize,
    habitable_zone: &RangeInclusive<f64>,
    safe: f64,
    seed: Seed,
    config: &GenerationConfig,
) -> Vec<Slot> {
    let (hz_min, hz_max) = (*habitable_zone.start(), *habitable_zone.end());
    let inner = safe.max(hz_min * random_range(0.15, 0.35, sub_seed(seed, 7)));
    let outer = (hz_max * 3.0).max(inner * 1.5);
    let force_inferno = chance(FIRST_PLANET_INFERNO_CHANCE, sub_seed(seed, 8));

    let mut slots: Vec<Slot> = (0..count)
        .map(|i| {
            let slot_seed = sub_seed(seed, 1000 + i as u64 * 100);
            let t = i as f64 / count.saturating_sub(1).max(1) as f64;
            let mut distance = inner * (outer / inner).powf(t)
                * random_range(1.0 - DISTANCE_JITTER, 1.0 + DISTANCE_JITTER, sub_seed(slot_seed, 1));
            if i == 0 && force_inferno {
                let inferno_edge = hz_min * 0.3;
                distance = if inferno_edge > safe {
                    random_range(safe, inferno_edge, sub_seed(seed, 9))
                } else {
                    safe
                };
            }
            let distance = distance.max(safe);

            let zone = classify_zone(distance, habitable_zone);
            let planet_type = weighted_random_select(config.zone_table(zone), sub_seed(slot_seed, 2))
                .copied()
                .unwrap_or(PlanetType::Terrestrial);
            let size = random_in(&config.planet(planet_type).size, sub_seed(slot_seed, 3));

            Slot {
                planet_type,
                size,
                distance,
            }
        })
        .collect();

    for i in 1..slots.len() {
        let previous = &slots[i - 1];
        let spacing = min_spacing(
            (previous.planet_type, previous.size),
            (slots[i].planet_type, slots[i].size),
        );
        let floor = previous.distance + spacing;
        slots[i].distance = slots[i].distance.max(floor).max(safe);
    }
    slots
}

pub fn generate_solar_system(request: &SystemRequest, config: &GenerationConfig) -> SolarSystem {
    let seed = request.seed;
    let star_type = request
        .star_type
        .unwrap_or(StarType::ALL[(seed % StarType::ALL.len() as u64) as usize]);
    let star_config = config.star(star_type);
    let star = build_star(star_type, star_config, seed, config);
    let luminosity = star.total_luminosity();
    let habitable_zone = habitable_zone(&star, &star_config.habitable_zone);
    let safe = min_safe_distance(star.size, &habitable_zone);

    let id = system_id(seed);
    let name = request.name.clone().unwrap_or_else(|| system_name(seed));

    let planet_count = random_count(&star_config.planet_count, sub_seed(seed, 1));
    let slots = layout_slots(planet_count, &habitable_zone, safe, seed, config);
    let planets: Vec<PlanetData> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let planet = PlanetRequest {
                id: format!("{id}-p{i}"),
                name: planet_name(&name, i),
                planet_type: slot.planet_type,
                size: slot.size,
                orbital_distance: slot.distance,
                zone: classify_zone(slot.distance, &habitable_zone),
                luminosity,
                config,
            };
            generate_planet(&planet, sub_seed(seed, 1000 + i as u64 * 100))
        })
        .collect();

    let distances: Vec<f64> = planets.iter().map(|p| p.orbital_distance).collect();
    let anchors = if distances.is_empty() {
        vec![*habitable_zone.end()]
    } else {
        distances
    };
    let asteroid_belts: Vec<AsteroidBeltData> =
        calculate_asteroid_belt_positions(&anchors, sub_seed(seed, 5000))
            .into_iter()
            .enumerate()
            .map(|(k, band)| {
                let inner_radius = band.inner_radius.max(safe);
                let belt = BeltRequest {
                    id: format!("{id}-b{k}"),
                    name: format!("{name} Belt {}", roman_numeral(k + 1)),
                    band: BeltBand {
                        inner_radius,
                        outer_radius: band.outer_radius.max(inner_radius + 0.05),
                    },
                    habitable_zone: &habitable_zone,
                    luminosity,
                };
                generate_asteroid_belt(&belt, mix(sub_seed(seed, 5001 + k as u64)), config)
            })
            .collect();

    let practical_radius = anchors
        .iter()
        .copied()
        .chain(asteroid_belts.iter().map(|b| b.outer_radius))
        .fold(*habitable_zone.end() * 3.0, f64::max);

    let comet_params = CometSystemParams {
        system_id: &id,
        system_name: &name,
        star_type,
        star_size: star.size,
        habitable_zone: &habitable_zone,
        outer_boundary: practical_radius,
        min_safe_distance: safe,
    };
    let comets = generate_comets(&comet_params, sub_seed(seed, 7000), config);
    let nebulae = generate_nebulae(&id, star_type, practical_radius, sub_seed(seed, 9000), config);

    debug!(
        "generated {} ({}): {} planets, {} belts, {} comets, {} nebulae",
        name,
        star_type.label(),
        planets.len(),
        asteroid_belts.len(),
        comets.len(),
        nebulae.len()
    );

    SolarSystem {
        id,
        name,
        position: request.position.unwrap_or([0.0; 3]),
        star,
        planets,
        asteroid_belts,
        comets,
        nebulae,
        connections: Vec::new(),
        max_connections: random_int(2, 5, sub_seed(seed, 11)).max(0) as usize,
        discovered: false,
        colonized: false,
        seed,
        explored_by: Vec::new(),
        habitable_zone,
        min_safe_distance: safe,
    }
}

/// Make sure `system` has at least one habitable planet, converting the first
/// planet (or adding one inside the habitable zone when there are none).
/// Returns whether anything changed.
pub fn ensure_habitable_planet(system: &mut SolarSystem, config: &GenerationConfig) -> bool {
    if system.has_habitable_planet() {
        return false;
    }

    let star_config = config.star(system.star.star_type);
    let planet_type = weighted_random_select(&star_config.planet_weights, mix(system.seed))
        .copied()
        .filter(|t| t.is_habitable())
        .unwrap_or(PlanetType::EarthLike);

    let (orbital_distance, seed) = match system.planets.first() {
        Some(first) => (first.orbital_distance, first.seed),
        None => {
            let (hz_min, hz_max) = (*system.habitable_zone.start(), *system.habitable_zone.end());
            (
                ((hz_min + hz_max) / 2.0).max(system.min_safe_distance),
                sub_seed(system.seed, 1000),
            )
        }
    };
    let size = random_in(&config.planet(planet_type).size, sub_seed(seed, 3));
    // a larger replacement must not crowd the next orbit
    let orbital_distance = match system.planets.get(1) {
        Some(next) => orbital_distance.min(
            next.orbital_distance - min_spacing((planet_type, size), (next.planet_type, next.size)),
        ),
        None => orbital_distance,
    }
    .max(system.min_safe_distance);

    let request = PlanetRequest {
        id: format!("{}-p0", system.id),
        name: planet_name(&system.name, 0),
        planet_type,
        size,
        orbital_distance,
        zone: classify_zone(orbital_distance, &system.habitable_zone),
        luminosity: system.star.total_luminosity(),
        config,
    };
    let planet = generate_planet(&request, seed);
    match system.planets.first_mut() {
        Some(first) => *first = planet,
        None => system.planets.push(planet),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_distance_takes_the_largest_floor() {
        assert_eq!(min_safe_distance(0.01, &(0.1..=0.3)), 0.1);
        assert!((min_safe_distance(0.35, &(3.0..=7.0)) - 0.875).abs() < 1e-12);
        assert!((min_safe_distance(0.08, &(5.0..=12.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zone_boundaries() {
        let hz = 1.0..=2.0;
        assert_eq!(classify_zone(0.29, &hz), OrbitalZone::Inferno);
        assert_eq!(classify_zone(0.3, &hz), OrbitalZone::Hot);
        assert_eq!(classify_zone(1.0, &hz), OrbitalZone::Goldilocks);
        assert_eq!(classify_zone(2.0, &hz), OrbitalZone::Goldilocks);
        assert_eq!(classify_zone(3.9, &hz), OrbitalZone::Cold);
        assert_eq!(classify_zone(4.0, &hz), OrbitalZone::Outer);
        assert_eq!(classify_zone(10.0, &hz), OrbitalZone::DeepSpace);
    }

    #[test]
    fn spacing_grows_with_size_and_gas_giants() {
        let rocky = min_spacing((PlanetType::Terrestrial, 1.0), (PlanetType::Terrestrial, 1.0));
        assert!((rocky - 0.3).abs() < 1e-12);
        let giant = min_spacing((PlanetType::Terrestrial, 1.0), (PlanetType::GasGiant, 9.0));
        assert!((giant - (0.3 * 5.0 + 0.5)).abs() < 1e-12);
        assert!(min_spacing((PlanetType::DwarfPlanet, 0.1), (PlanetType::DwarfPlanet, 0.1)) > 0.0);
    }

    #[test]
    fn belts_sit_inside_gaps_with_margins() {
        let distances = [1.0, 2.0, 5.0];
        let mut placed = 0;
        for seed in 0..200 {
            let belts = calculate_asteroid_belt_positions(&distances, seed);
            assert!(belts.len() <= 2);
            for belt in &belts {
                let gap = distances
                    .windows(2)
                    .find(|pair| belt.inner_radius > pair[0] && belt.outer_radius < pair[1])
                    .expect("belt outside every gap");
                let width = gap[1] - gap[0];
                assert!(width >= MIN_BELT_GAP);
                assert!(belt.inner_radius - gap[0] >= width * 0.15 - 1e-9);
                assert!(gap[1] - belt.outer_radius >= width * 0.15 - 1e-9);
                assert!((belt.width() - width * BELT_GAP_FRACTION).abs() < 1e-9);
            }
            placed += belts.len();
        }
        assert!(placed > 0, "no seed produced a belt");
    }

    #[test]
    fn widest_gap_is_filled_first() {
        let distances = [1.0, 2.0, 5.0];
        let seed = (0..100)
            .find(|s| random_int(0, 2, *s) == 1)
            .expect("some seed rolls one belt");
        let belts = calculate_asteroid_belt_positions(&distances, seed);
        assert_eq!(belts.len(), 1);
        assert!((belts[0].center() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn crowded_orbits_get_a_compact_outer_belt() {
        let distances = [1.0, 1.2, 1.4];
        let seed = (0..100)
            .find(|s| random_int(0, 2, *s) > 0)
            .expect("some seed rolls a belt");
        let belts = calculate_asteroid_belt_positions(&distances, seed);
        assert_eq!(belts.len(), 1);
        assert!(belts[0].inner_radius > 1.4);
    }

    #[test]
    fn binary_stars_add_companion_light() {
        let config = GenerationConfig::default();
        let system = generate_solar_system(
            &SystemRequest::new(5).star_type(StarType::BinaryStar),
            &config,
        );
        let companion = system.star.companion.as_ref().expect("binary has a companion");
        assert!((system.star.total_luminosity() - (1.2 + companion.luminosity)).abs() < 1e-12);
        assert!(*system.habitable_zone.start() > 1.0);
        assert!(system.star.black_hole.is_none());
    }

    #[test]
    fn black_hole_disk_falls_back_to_size_defaults() {
        let mut config = GenerationConfig::default();
        if let Some(star) = config.star_types.get_mut(&StarType::BlackHole) {
            star.black_hole = Some(Default::default());
        }
        let system = generate_solar_system(
            &SystemRequest::new(8).star_type(StarType::BlackHole),
            &config,
        );
        let disk = system.star.black_hole.expect("black hole data");
        assert!((disk.event_horizon - 0.05).abs() < 1e-12);
        assert!(disk.accretion_inner > disk.event_horizon);
        assert!(disk.accretion_outer > disk.accretion_inner);
        assert!(!disk.hawking_radiation);
    }

    #[test]
    fn star_type_defaults_to_seed_index() {
        let config = GenerationConfig::default();
        for seed in 0..18 {
            let system = generate_solar_system(&SystemRequest::new(seed), &config);
            assert_eq!(system.star.star_type, StarType::ALL[(seed % 9) as usize]);
            assert_eq!(system.id, system_id(seed));
        }
    }

    #[test]
    fn empty_systems_still_get_belts_and_comets() {
        let mut config = GenerationConfig::default();
        if let Some(star) = config.star_types.get_mut(&StarType::YellowStar) {
            star.planet_count = 0..=0;
        }
        for seed in 0..30 {
            let system = generate_solar_system(
                &SystemRequest::new(seed).star_type(StarType::YellowStar),
                &config,
            );
            assert!(system.planets.is_empty());
            for belt in &system.asteroid_belts {
                assert!(belt.inner_radius > *system.habitable_zone.end());
            }
        }
    }

    #[test]
    fn habitable_planet_is_forced_when_missing() {
        let mut config = GenerationConfig::default();
        if let Some(star) = config.star_types.get_mut(&StarType::WhiteDwarf) {
            star.planet_count = 0..=0;
        }
        let mut empty = generate_solar_system(
            &SystemRequest::new(12).star_type(StarType::WhiteDwarf),
            &config,
        );
        assert!(ensure_habitable_planet(&mut empty, &config));
        assert_eq!(empty.planets.len(), 1);
        assert!(empty.planets[0].planet_type.is_habitable());
        assert!(empty.planets[0].orbital_distance >= empty.min_safe_distance);
        assert!(!ensure_habitable_planet(&mut empty, &config));

        let mut hostile = GenerationConfig::default();
        for table in hostile.zone_planets.values_mut() {
            *table = vec![(PlanetType::GasGiant, 1.0)];
        }
        let mut system = generate_solar_system(
            &SystemRequest::new(40).star_type(StarType::YellowStar),
            &hostile,
        );
        assert!(!system.has_habitable_planet());
        let count = system.planets.len();
        assert!(ensure_habitable_planet(&mut system, &hostile));
        assert_eq!(system.planets.len(), count);
        assert!(system.planets[0].planet_type.is_habitable());
        let distances: Vec<f64> = system.planets.iter().map(|p| p.orbital_distance).collect();
        assert!(distances.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn request_overrides_name_and_position() {
        let config = GenerationConfig::default();
        let system = generate_solar_system(
            &SystemRequest::new(3).name("Test").position([1.0, 2.0, 3.0]),
            &config,
        );
        assert_eq!(system.name, "Test");
        assert_eq!(system.position, [1.0, 2.0, 3.0]);
        assert!((2..=5).contains(&system.max_connections));
        if let Some(first) = system.planets.first() {
            assert_eq!(first.name, "Test b");
        }
    }
}
