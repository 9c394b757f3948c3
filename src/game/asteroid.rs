use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::game::body::{orbital_speed, AsteroidMaterial};
use crate::game::config::GenerationConfig;
use crate::game::random::{
    chance, random_count, random_int, random_range, sub_seed, unit_hash, unit_vector,
    weighted_random_select, Seed,
};

/// Smallest asteroid, in scene units.
const MIN_ASTEROID_SIZE: f64 = 0.004;
/// Largest asteroid the renderer will draw.
const MAX_ASTEROID_SIZE: f64 = 0.05;
/// Power-law exponent; larger values skew harder towards small bodies.
const SIZE_EXPONENT: f64 = 2.5;

const RARE_METALS: &[&str] = &["platinum", "iridium", "palladium", "rhodium", "osmium"];

/// Where a belt sits relative to the habitable zone. Inner belts skew rocky
/// and metallic, outer belts icy and carbonaceous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeltPosition {
    Inner,
    Middle,
    Outer,
}

impl BeltPosition {
    pub fn classify(center: f64, habitable_zone: &RangeInclusive<f64>) -> Self {
        let hz_max = *habitable_zone.end();
        if center < hz_max {
            BeltPosition::Inner
        } else if center < hz_max * 3.0 {
            BeltPosition::Middle
        } else {
            BeltPosition::Outer
        }
    }
}

/// Radial band an asteroid belt occupies, in AU.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeltBand {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl BeltBand {
    pub fn width(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn center(&self) -> f64 {
        (self.inner_radius + self.outer_radius) * 0.5
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsteroidResources {
    /// Percentage of the body that is extractable ore.
    pub abundance: f64,
    pub rare_metals: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsteroidData {
    pub id: String,
    pub size: f64,
    pub material: AsteroidMaterial,
    pub orbital_radius: f64,
    pub orbital_speed: f64,
    /// Degrees along the orbit at time zero.
    pub orbital_phase: f64,
    /// Degrees above or below the belt plane.
    pub inclination: f64,
    pub eccentricity: f64,
    pub rotation_axis: [f64; 3],
    pub rotation_speed: f64,
    pub resources: AsteroidResources,
    pub seed: Seed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsteroidBeltData {
    pub id: String,
    pub name: String,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub position: BeltPosition,
    pub material_distribution: Vec<(AsteroidMaterial, f64)>,
    /// Asteroids per AU of belt width.
    pub density: f64,
    pub asteroids: Vec<AsteroidData>,
    pub seed: Seed,
}

pub struct BeltRequest<'a> {
    pub id: String,
    pub name: String,
    pub band: BeltBand,
    pub habitable_zone: &'a RangeInclusive<f64>,
    pub luminosity: f64,
}

/// Power-law size draw: most asteroids are close to the minimum.
pub fn asteroid_size(seed: Seed) -> f64 {
    let u = unit_hash(seed);
    let size = MIN_ASTEROID_SIZE * (1.0 - u).max(1e-9).powf(-1.0 / SIZE_EXPONENT);
    size.min(MAX_ASTEROID_SIZE)
}

fn abundance_range(material: AsteroidMaterial) -> (f64, f64) {
    match material {
        AsteroidMaterial::Metallic => (40.0, 90.0),
        AsteroidMaterial::Crystalline => (20.0, 60.0),
        AsteroidMaterial::Rocky => (10.0, 40.0),
        AsteroidMaterial::Carbonaceous => (5.0, 30.0),
        AsteroidMaterial::Icy => (2.0, 15.0),
    }
}

fn rare_metals(material: AsteroidMaterial, seed: Seed) -> Vec<String> {
    let odds = match material {
        AsteroidMaterial::Metallic => 0.4,
        AsteroidMaterial::Crystalline => 0.3,
        _ => 0.05,
    };
    if !chance(odds, seed) {
        return Vec::new();
    }
    let start = random_int(0, RARE_METALS.len() as i64 - 1, sub_seed(seed, 1)) as usize;
    let count = random_count(&(1..=3), sub_seed(seed, 2));
    (0..count)
        .map(|i| RARE_METALS[(start + i) % RARE_METALS.len()].to_string())
        .collect()
}

pub fn generate_asteroid(
    id: String,
    band: &BeltBand,
    materials: &[(AsteroidMaterial, f64)],
    luminosity: f64,
    seed: Seed,
) -> AsteroidData {
    let size = asteroid_size(sub_seed(seed, 1));
    let material = weighted_random_select(materials, sub_seed(seed, 2))
        .copied()
        .unwrap_or(AsteroidMaterial::Rocky);
    let orbital_radius = random_range(band.inner_radius, band.outer_radius, sub_seed(seed, 3));
    let (low, high) = abundance_range(material);

    AsteroidData {
        id,
        size,
        material,
        orbital_radius,
        orbital_speed: orbital_speed(luminosity, orbital_radius),
        orbital_phase: random_range(0.0, 360.0, sub_seed(seed, 4)),
        inclination: random_range(-5.0, 5.0, sub_seed(seed, 5)),
        eccentricity: random_range(0.0, 0.1, sub_seed(seed, 6)),
        rotation_axis: unit_vector(sub_seed(seed, 7)),
        // small bodies tumble faster
        rotation_speed: random_range(0.1, 2.0, sub_seed(seed, 9)) * (MIN_ASTEROID_SIZE / size).sqrt(),
        resources: AsteroidResources {
            abundance: random_range(low, high, sub_seed(seed, 10)),
            rare_metals: rare_metals(material, sub_seed(seed, 11)),
        },
        seed,
    }
}

pub fn generate_asteroid_belt(
    request: &BeltRequest<'_>,
    seed: Seed,
    config: &GenerationConfig,
) -> AsteroidBeltData {
    let band = request.band;
    let position = BeltPosition::classify(band.center(), request.habitable_zone);
    let material_distribution = config.materials(position).to_vec();
    let count = random_count(&config.asteroids_per_belt, sub_seed(seed, 1));

    let asteroids = (0..count)
        .map(|j| {
            generate_asteroid(
                format!("{}-a{}", request.id, j),
                &band,
                &material_distribution,
                request.luminosity,
                sub_seed(seed, 100 + j as u64 * 20),
            )
        })
        .collect();

    AsteroidBeltData {
        id: request.id.clone(),
        name: request.name.clone(),
        inner_radius: band.inner_radius,
        outer_radius: band.outer_radius,
        position,
        density: count as f64 / band.width().max(1e-6),
        material_distribution,
        asteroids,
        seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_belt(seed: Seed) -> AsteroidBeltData {
        let hz = 0.95..=1.67;
        let request = BeltRequest {
            id: "belt".to_string(),
            name: "Belt".to_string(),
            band: BeltBand {
                inner_radius: 2.2,
                outer_radius: 3.1,
            },
            habitable_zone: &hz,
            luminosity: 1.0,
        };
        generate_asteroid_belt(&request, seed, &GenerationConfig::default())
    }

    #[test]
    fn sizes_skew_small_and_stay_renderable() {
        let sizes: Vec<f64> = (0..10_000).map(asteroid_size).collect();
        assert!(sizes
            .iter()
            .all(|s| (MIN_ASTEROID_SIZE..=MAX_ASTEROID_SIZE).contains(s)));
        let small = sizes.iter().filter(|s| **s < MIN_ASTEROID_SIZE * 2.0).count();
        assert!(small > sizes.len() * 3 / 4, "only {small} small asteroids");
    }

    #[test]
    fn asteroids_stay_inside_their_band() {
        let belt = test_belt(31);
        assert!(!belt.asteroids.is_empty());
        for asteroid in &belt.asteroids {
            assert!(asteroid.orbital_radius >= belt.inner_radius);
            assert!(asteroid.orbital_radius <= belt.outer_radius);
            assert!((0.0..=100.0).contains(&asteroid.resources.abundance));
        }
    }

    #[test]
    fn belt_position_sets_material_mix() {
        let hz = 1.0..=2.0;
        assert_eq!(BeltPosition::classify(1.5, &hz), BeltPosition::Inner);
        assert_eq!(BeltPosition::classify(4.0, &hz), BeltPosition::Middle);
        assert_eq!(BeltPosition::classify(9.0, &hz), BeltPosition::Outer);

        let config = GenerationConfig::default();
        let inner = config.materials(BeltPosition::Inner);
        let outer = config.materials(BeltPosition::Outer);
        assert_eq!(inner[0].0, AsteroidMaterial::Rocky);
        assert_eq!(outer[0].0, AsteroidMaterial::Icy);
    }

    #[test]
    fn belt_generation_is_deterministic() {
        assert_eq!(test_belt(8), test_belt(8));
        assert_ne!(test_belt(8), test_belt(9));
    }
}
