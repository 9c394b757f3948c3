//! Continents, regional climate, cities and the satellites those cities launch.
//!
//! Continents are lat/lng polygons. Longitudes inside an outline are left
//! unwrapped (they may run past ±180°) so the polygon stays simple; anything
//! handed out as a location is normalized back into `[-180, 180)`.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::game::body::PlanetType;
use crate::game::random::{
    mix, random_count, random_int, random_range, spherical_noise, sub_seed, unit_hash,
    weighted_random_select, NoiseConfig, Seed,
};

/// Rejection-sampling attempts before a city is dropped next to the centroid.
const CITY_PLACEMENT_ATTEMPTS: u64 = 20;
const MAX_SATELLITES: usize = 20;
const MAX_LATITUDE: f64 = 85.0;

const CULTURES: &[&str] = &[
    "maritime",
    "highland",
    "nomadic",
    "industrial",
    "agrarian",
    "scholarly",
    "mercantile",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinentShape {
    Irregular,
    Circular,
    Elongated,
    Fragmented,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub lat: f64,
    pub lng: f64,
    /// Influence of the point on the rendered coastline.
    pub weight: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClimateData {
    /// °C.
    pub temperature: f64,
    /// 0..1.
    pub humidity: f64,
    /// mm per year.
    pub precipitation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinentData {
    pub id: String,
    pub shape: ContinentShape,
    pub center: GeoPoint,
    /// 0..1 fraction used to scale the outline and the city count.
    pub size: f64,
    /// One ring per lobe; only fragmented continents have more than one.
    pub outline: Vec<Vec<ControlPoint>>,
    pub climate: ClimateData,
    pub seed: Seed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitySize {
    Metropolis,
    City,
    Town,
    Settlement,
}

impl CitySize {
    pub fn population_range(self) -> (f64, f64) {
        match self {
            CitySize::Metropolis => (5_000_000.0, 30_000_000.0),
            CitySize::City => (500_000.0, 5_000_000.0),
            CitySize::Town => (20_000.0, 500_000.0),
            CitySize::Settlement => (500.0, 20_000.0),
        }
    }

    pub fn glow_range(self) -> (f64, f64) {
        match self {
            CitySize::Metropolis => (0.8, 1.0),
            CitySize::City => (0.5, 0.8),
            CitySize::Town => (0.3, 0.5),
            CitySize::Settlement => (0.1, 0.3),
        }
    }

    fn technology_bonus(self) -> f64 {
        match self {
            CitySize::Metropolis => 0.1,
            CitySize::City => 0.05,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    pub id: String,
    pub continent_id: String,
    pub lat: f64,
    pub lng: f64,
    pub size: CitySize,
    pub population: u64,
    pub glow_intensity: f64,
    pub culture: String,
    /// 0..1.
    pub technology: f64,
    pub seed: Seed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatelliteType {
    Weather,
    Observation,
    Navigation,
    Communications,
    Research,
    Military,
}

impl SatelliteType {
    /// Orbit band in planet radii.
    pub fn orbit_band(self) -> (f64, f64) {
        match self {
            SatelliteType::Weather | SatelliteType::Observation => (1.01, 1.05),
            SatelliteType::Navigation | SatelliteType::Communications => (1.05, 1.15),
            SatelliteType::Research | SatelliteType::Military => (1.15, 1.5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteData {
    pub id: String,
    pub satellite_type: SatelliteType,
    /// Planet radii.
    pub orbit_radius: f64,
    /// Degrees.
    pub inclination: f64,
    pub orbit_speed: f64,
    /// Degrees.
    pub orbit_phase: f64,
    pub size: f64,
    pub seed: Seed,
}

pub fn normalize_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Ray casting in the (lng, lat) plane.
pub fn point_in_polygon(point: GeoPoint, polygon: &[ControlPoint]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.lat > point.lat) != (b.lat > point.lat)
            && point.lng < (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl ContinentData {
    /// Whether an (unwrapped) point lies inside any lobe.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.outline.iter().any(|ring| point_in_polygon(point, ring))
    }

    /// Bounding box as (min, max) corners.
    pub fn bounds(&self) -> (GeoPoint, GeoPoint) {
        let mut min = self.center;
        let mut max = self.center;
        for point in self.outline.iter().flatten() {
            min.lat = min.lat.min(point.lat);
            min.lng = min.lng.min(point.lng);
            max.lat = max.lat.max(point.lat);
            max.lng = max.lng.max(point.lng);
        }
        (min, max)
    }
}

pub fn climate_at(lat: f64, lng: f64, base_temperature: f64, seed: Seed) -> ClimateData {
    let noise = NoiseConfig {
        octaves: 3,
        scale: 2.0,
        ..NoiseConfig::with_seed(seed)
    };
    let variation = spherical_noise(lat, lng, &noise) - 0.5;
    let temperature = base_temperature - lat.abs() / 90.0 * 40.0 + variation * 10.0;
    let humidity = spherical_noise(
        lat,
        lng,
        &NoiseConfig {
            seed: sub_seed(seed, 1),
            ..noise
        },
    )
    .clamp(0.0, 1.0);
    let warmth = temperature.clamp(0.0, 40.0) / 40.0;

    ClimateData {
        temperature,
        humidity,
        precipitation: humidity * (0.4 + warmth * 0.6) * 2000.0,
    }
}

fn ring(
    center: GeoPoint,
    count: usize,
    seed: Seed,
    offset: impl Fn(usize, f64, Seed) -> (f64, f64),
) -> Vec<ControlPoint> {
    let widen = 1.0 / center.lat.to_radians().cos().max(0.2);
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            let point_seed = sub_seed(seed, i as u64 * 3);
            let (dlng, dlat) = offset(i, angle, point_seed);
            ControlPoint {
                lat: (center.lat + dlat).clamp(-MAX_LATITUDE, MAX_LATITUDE),
                lng: center.lng + dlng * widen,
                weight: random_range(0.5, 1.0, sub_seed(point_seed, 2)),
            }
        })
        .collect()
}

fn outline(shape: ContinentShape, center: GeoPoint, radius: f64, seed: Seed) -> Vec<Vec<ControlPoint>> {
    match shape {
        ContinentShape::Circular => vec![ring(center, 12, sub_seed(seed, 100), |_, angle, s| {
            let r = radius * random_range(0.9, 1.1, s);
            (r * angle.cos(), r * angle.sin())
        })],
        ContinentShape::Elongated => {
            let stretch = random_range(1.5, 3.0, sub_seed(seed, 10));
            let axis = random_range(0.0, PI, sub_seed(seed, 11));
            vec![ring(center, 14, sub_seed(seed, 100), |_, angle, s| {
                let r = radius * random_range(0.85, 1.15, s);
                let (x, y) = (r * angle.cos() * stretch, r * angle.sin());
                (
                    x * axis.cos() - y * axis.sin(),
                    x * axis.sin() + y * axis.cos(),
                )
            })]
        }
        ContinentShape::Fragmented => {
            let lobes = random_count(&(2..=4), sub_seed(seed, 10));
            (0..lobes)
                .map(|j| {
                    let lobe_seed = sub_seed(seed, 100 + j as u64 * 40);
                    let direction = random_range(0.0, TAU, lobe_seed);
                    let distance = radius * random_range(0.3, 0.7, sub_seed(lobe_seed, 1));
                    let lobe_radius = radius * random_range(0.35, 0.6, sub_seed(lobe_seed, 2));
                    let lobe_center = GeoPoint {
                        lat: (center.lat + distance * direction.sin())
                            .clamp(-MAX_LATITUDE, MAX_LATITUDE),
                        lng: center.lng + distance * direction.cos(),
                    };
                    ring(lobe_center, 8, sub_seed(lobe_seed, 10), |_, angle, s| {
                        let r = lobe_radius * random_range(0.8, 1.2, s);
                        (r * angle.cos(), r * angle.sin())
                    })
                })
                .collect()
        }
        ContinentShape::Irregular => vec![ring(center, 16, sub_seed(seed, 100), |_, angle, s| {
            let r = radius * random_range(0.6, 1.4, s);
            (r * angle.cos(), r * angle.sin())
        })],
    }
}

const SHAPE_WEIGHTS: &[(ContinentShape, f64)] = &[
    (ContinentShape::Irregular, 40.0),
    (ContinentShape::Circular, 20.0),
    (ContinentShape::Elongated, 25.0),
    (ContinentShape::Fragmented, 15.0),
];

pub fn generate_continent(id: String, base_temperature: f64, seed: Seed) -> ContinentData {
    // area-uniform latitude, squeezed away from the poles
    let lat = (unit_hash(sub_seed(seed, 1)) * 2.0 - 1.0).asin().to_degrees() * 0.75;
    let lng = random_range(-180.0, 180.0, sub_seed(seed, 2));
    let size = random_range(0.1, 1.0, sub_seed(seed, 3));
    let shape = weighted_random_select(SHAPE_WEIGHTS, sub_seed(seed, 4))
        .copied()
        .unwrap_or(ContinentShape::Irregular);
    let center = GeoPoint { lat, lng };

    ContinentData {
        id,
        shape,
        center,
        size,
        outline: outline(shape, center, 8.0 + size * 25.0, seed),
        climate: climate_at(lat, lng, base_temperature, sub_seed(seed, 5)),
        seed,
    }
}

pub fn generate_continents(
    planet_id: &str,
    count: usize,
    base_temperature: f64,
    seed: Seed,
) -> Vec<ContinentData> {
    (0..count)
        .map(|k| {
            generate_continent(
                format!("{planet_id}-k{k}"),
                base_temperature,
                sub_seed(seed, k as u64 * 50),
            )
        })
        .collect()
}

/// Size classes for `count` cities: 10% metropolises (large continents only),
/// 25% cities, 35% towns and the rest settlements.
pub fn city_tiers(count: usize, continent_size: f64) -> Vec<CitySize> {
    let share = |fraction: f64| (count as f64 * fraction).round() as usize;
    let metropolises = if continent_size > 0.5 { share(0.10) } else { 0 };

    let mut tiers: Vec<CitySize> = std::iter::repeat(CitySize::Metropolis)
        .take(metropolises)
        .chain(std::iter::repeat(CitySize::City).take(share(0.25)))
        .chain(std::iter::repeat(CitySize::Town).take(share(0.35)))
        .take(count)
        .collect();
    tiers.resize(count, CitySize::Settlement);
    tiers
}

fn place_city(continent: &ContinentData, seed: Seed) -> GeoPoint {
    let (min, max) = continent.bounds();
    let base = mix(seed);
    for attempt in 0..CITY_PLACEMENT_ATTEMPTS {
        let candidate = GeoPoint {
            lat: random_range(min.lat, max.lat, sub_seed(base, attempt * 2)),
            lng: random_range(min.lng, max.lng, sub_seed(base, attempt * 2 + 1)),
        };
        if continent.contains(candidate) {
            return candidate;
        }
    }
    GeoPoint {
        lat: (continent.center.lat + random_range(-2.0, 2.0, sub_seed(base, 100)))
            .clamp(-MAX_LATITUDE, MAX_LATITUDE),
        lng: continent.center.lng + random_range(-2.0, 2.0, sub_seed(base, 101)),
    }
}

/// Cities for every continent of a planet. Planets that cannot host cities get none.
pub fn generate_cities(
    continents: &[ContinentData],
    planet_type: PlanetType,
    density: f64,
    seed: Seed,
) -> Vec<CityData> {
    if !planet_type.supports_cities() {
        return Vec::new();
    }

    let mut cities = Vec::new();
    for (ci, continent) in continents.iter().enumerate() {
        let continent_seed = sub_seed(seed, ci as u64 * 100);
        let count = (continent.size * density * random_range(0.7, 1.3, continent_seed))
            .round()
            .max(0.0) as usize;

        for (j, size) in city_tiers(count, continent.size).into_iter().enumerate() {
            let city_seed = sub_seed(continent_seed, 10 + j as u64 * 7);
            let location = place_city(continent, city_seed);
            let (pop_lo, pop_hi) = size.population_range();
            let (glow_lo, glow_hi) = size.glow_range();
            let culture = random_int(0, CULTURES.len() as i64 - 1, sub_seed(city_seed, 3)) as usize;
            let technology = (random_range(0.2, 0.9, sub_seed(city_seed, 4))
                + size.technology_bonus())
            .min(1.0);

            cities.push(CityData {
                id: format!("{}-c{}", continent.id, j),
                continent_id: continent.id.clone(),
                lat: location.lat,
                lng: normalize_lng(location.lng),
                size,
                population: random_range(pop_lo, pop_hi, sub_seed(city_seed, 1)) as u64,
                glow_intensity: random_range(glow_lo, glow_hi, sub_seed(city_seed, 2)),
                culture: CULTURES[culture.min(CULTURES.len() - 1)].to_string(),
                technology,
                seed: city_seed,
            });
        }
    }
    cities
}

pub fn average_technology(cities: &[CityData]) -> f64 {
    if cities.is_empty() {
        return 0.0;
    }
    cities.iter().map(|c| c.technology).sum::<f64>() / cities.len() as f64
}

/// Stratified inclination: 30% equatorial, 30% mid, 40% near-polar.
fn satellite_inclination(seed: Seed) -> f64 {
    let band = unit_hash(seed);
    let value = sub_seed(seed, 1);
    if band < 0.3 {
        random_range(0.0, 15.0, value)
    } else if band < 0.6 {
        random_range(15.0, 50.0, value)
    } else {
        random_range(60.0, 100.0, value)
    }
}

/// Artificial satellites launched by a planet's cities.
pub fn generate_satellites(planet_id: &str, cities: &[CityData], seed: Seed) -> Vec<SatelliteData> {
    if cities.is_empty() {
        return Vec::new();
    }

    let tech = average_technology(cities);
    let count = ((tech * 10.0 + 2.0).floor() as usize + cities.len() / 10).min(MAX_SATELLITES);
    let weights = [
        (SatelliteType::Weather, 20.0),
        (SatelliteType::Observation, 15.0),
        (SatelliteType::Navigation, 15.0),
        (SatelliteType::Communications, 25.0),
        (SatelliteType::Research, 10.0 * (1.0 + tech)),
        (SatelliteType::Military, 15.0 * tech),
    ];

    (0..count)
        .map(|i| {
            let sat_seed = sub_seed(seed, 10 + i as u64 * 10);
            let satellite_type = weighted_random_select(&weights, sub_seed(sat_seed, 1))
                .copied()
                .unwrap_or(SatelliteType::Communications);
            let (low, high) = satellite_type.orbit_band();
            let orbit_radius = random_range(low, high, sub_seed(sat_seed, 2));

            SatelliteData {
                id: format!("{planet_id}-s{i}"),
                satellite_type,
                orbit_radius,
                inclination: satellite_inclination(sub_seed(sat_seed, 3)),
                orbit_speed: 0.02 / orbit_radius.powf(1.5),
                orbit_phase: random_range(0.0, 360.0, sub_seed(sat_seed, 5)),
                size: random_range(0.002, 0.006, sub_seed(sat_seed, 6)),
                seed: sat_seed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<ControlPoint> {
        [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]
            .into_iter()
            .map(|(lat, lng)| ControlPoint {
                lat,
                lng,
                weight: 1.0,
            })
            .collect()
    }

    #[test]
    fn ray_casting_polygon_test() {
        let polygon = square();
        assert!(point_in_polygon(GeoPoint { lat: 5.0, lng: 5.0 }, &polygon));
        assert!(!point_in_polygon(GeoPoint { lat: 15.0, lng: 5.0 }, &polygon));
        assert!(!point_in_polygon(GeoPoint { lat: 5.0, lng: -1.0 }, &polygon));
        assert!(!point_in_polygon(GeoPoint { lat: 5.0, lng: 5.0 }, &[]));
    }

    #[test]
    fn continents_avoid_the_poles() {
        let continents = generate_continents("p", 200, 15.0, 9);
        for continent in &continents {
            assert!(continent.center.lat.abs() <= 67.5 + 1e-9);
            assert!((0.1..=1.0).contains(&continent.size));
            let lobes = continent.outline.len();
            match continent.shape {
                ContinentShape::Fragmented => assert!((2..=4).contains(&lobes)),
                _ => assert_eq!(lobes, 1),
            }
        }
        let shapes: std::collections::HashSet<_> =
            continents.iter().map(|c| format!("{:?}", c.shape)).collect();
        assert_eq!(shapes.len(), 4);
    }

    #[test]
    fn climate_cools_towards_the_poles() {
        let equator: f64 = (0..20)
            .map(|i| climate_at(0.0, i as f64 * 18.0, 15.0, 4).temperature)
            .sum();
        let polar: f64 = (0..20)
            .map(|i| climate_at(75.0, i as f64 * 18.0, 15.0, 4).temperature)
            .sum();
        assert!(equator > polar);
    }

    #[test]
    fn tiers_follow_fixed_proportions() {
        let tiers = city_tiers(20, 0.8);
        let count = |size| tiers.iter().filter(|t| **t == size).count();
        assert_eq!(tiers.len(), 20);
        assert_eq!(count(CitySize::Metropolis), 2);
        assert_eq!(count(CitySize::City), 5);
        assert_eq!(count(CitySize::Town), 7);
        assert_eq!(count(CitySize::Settlement), 6);

        let small = city_tiers(20, 0.3);
        assert!(!small.contains(&CitySize::Metropolis));
        assert_eq!(city_tiers(1, 0.9).len(), 1);
        assert!(city_tiers(0, 0.9).is_empty());
    }

    #[test]
    fn cities_only_on_habitable_types() {
        let continents = generate_continents("p", 4, 15.0, 21);
        assert!(generate_cities(&continents, PlanetType::LavaWorld, 12.0, 1).is_empty());
        assert!(generate_cities(&continents, PlanetType::DesertWorld, 12.0, 1).is_empty());
        assert!(!generate_cities(&continents, PlanetType::EarthLike, 12.0, 1).is_empty());
    }

    #[test]
    fn cities_sit_on_their_continent() {
        let continents = generate_continents("p", 6, 15.0, 33);
        let cities = generate_cities(&continents, PlanetType::EarthLike, 12.0, 2);
        for city in &cities {
            let continent = continents
                .iter()
                .find(|c| c.id == city.continent_id)
                .unwrap();
            assert!((-180.0..180.0).contains(&city.lng));
            // either inside the outline or within the centroid fallback jitter
            let (min, max) = continent.bounds();
            assert!(city.lat >= min.lat - 2.0 && city.lat <= max.lat + 2.0);
            assert!(city.technology <= 1.0);
        }
    }

    #[test]
    fn satellites_follow_city_technology() {
        let continents = generate_continents("p", 5, 15.0, 8);
        let cities = generate_cities(&continents, PlanetType::EarthLike, 12.0, 3);
        assert!(generate_satellites("p", &[], 1).is_empty());

        let satellites = generate_satellites("p", &cities, 5);
        let tech = average_technology(&cities);
        let expected = ((tech * 10.0 + 2.0).floor() as usize + cities.len() / 10).min(20);
        assert_eq!(satellites.len(), expected);
        for satellite in &satellites {
            let (low, high) = satellite.satellite_type.orbit_band();
            assert!(satellite.orbit_radius >= low && satellite.orbit_radius <= high);
        }
    }
}
