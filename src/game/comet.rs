//! Comets on fixed classical orbits.
//!
//! A generated [`CometData`] only stores orbital elements. Where the comet is
//! and how bright its tail burns are recomputed from those elements and the
//! current simulation time through [`CometData::state_at`].

use std::f64::consts::{PI, TAU};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::game::body::{CometType, StarType};
use crate::game::config::GenerationConfig;
use crate::game::random::{
    chance, random_count, random_int, random_range, sub_seed, weighted_random_select, Seed,
};

/// Beyond this distance (AU) the tail is fully gone.
pub const TAIL_CUTOFF_DISTANCE: f64 = 3.5;
const TAIL_FALLOFF: f64 = 0.7;

const TAIL_COLORS: &[&str] = &["#a8d8ff", "#bfe3ff", "#d6f0ff", "#9ef0e6"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CometData {
    pub id: String,
    pub name: String,
    pub comet_type: CometType,
    /// Nucleus diameter in km.
    pub nucleus_size: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Degrees; above 90 the orbit is retrograde.
    pub inclination: f64,
    pub perihelion: f64,
    pub aphelion: f64,
    /// Years.
    pub period: f64,
    /// Degrees.
    pub argument_of_perihelion: f64,
    /// Degrees along the orbit at time zero.
    pub initial_true_anomaly: f64,
    pub tail_color: String,
    pub seed: Seed,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TailState {
    pub intensity: f64,
    pub length: f64,
}

/// Derived, per-tick comet state. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CometState {
    pub position: [f64; 3],
    pub distance: f64,
    /// Degrees.
    pub true_anomaly: f64,
    pub tail: TailState,
}

pub struct CometSystemParams<'a> {
    pub system_id: &'a str,
    pub system_name: &'a str,
    pub star_type: StarType,
    pub star_size: f64,
    pub habitable_zone: &'a RangeInclusive<f64>,
    pub outer_boundary: f64,
    pub min_safe_distance: f64,
}

impl CometSystemParams<'_> {
    /// No perihelion may fall inside this radius.
    pub fn perihelion_floor(&self) -> f64 {
        (self.star_size * 1.5).max(self.min_safe_distance)
    }
}

struct CometShape {
    eccentricity: (f64, f64),
    inclination: (f64, f64),
    perihelion_factor: (f64, f64),
    nucleus: (f64, f64),
}

fn shape(comet_type: CometType) -> CometShape {
    match comet_type {
        CometType::ShortPeriod => CometShape {
            eccentricity: (0.5, 0.8),
            inclination: (0.0, 15.0),
            perihelion_factor: (0.6, 1.5),
            nucleus: (0.5, 5.0),
        },
        CometType::HalleyType => CometShape {
            eccentricity: (0.7, 0.9),
            inclination: (0.0, 70.0),
            perihelion_factor: (0.4, 1.2),
            nucleus: (2.0, 15.0),
        },
        CometType::LongPeriod => CometShape {
            eccentricity: (0.85, 0.995),
            inclination: (0.0, 180.0),
            perihelion_factor: (0.3, 2.0),
            nucleus: (1.0, 30.0),
        },
    }
}

/// Tail brightness at a given distance from the star.
pub fn calculate_tail_intensity(distance: f64) -> f64 {
    if distance.is_nan() || distance > TAIL_CUTOFF_DISTANCE {
        return 0.0;
    }
    (1.0 - (distance.max(0.0) / TAIL_CUTOFF_DISTANCE).min(1.0)).powf(TAIL_FALLOFF)
}

pub fn calculate_tail_length(intensity: f64, comet_type: CometType) -> f64 {
    let base = match comet_type {
        CometType::LongPeriod => 2.5,
        _ => 1.8,
    };
    base * (0.3 + 0.7 * intensity)
}

impl CometData {
    /// Position and star distance for a true anomaly in radians.
    pub fn position_at(&self, true_anomaly: f64) -> ([f64; 3], f64) {
        let e = self.eccentricity;
        let r = self.semi_major_axis * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());
        let angle = true_anomaly + self.argument_of_perihelion.to_radians();
        let inclination = self.inclination.to_radians();
        let position = [
            r * angle.cos(),
            r * angle.sin() * inclination.sin(),
            r * angle.sin() * inclination.cos(),
        ];
        (position, r)
    }

    pub fn tail_at(&self, distance: f64) -> TailState {
        let intensity = calculate_tail_intensity(distance);
        TailState {
            intensity,
            length: calculate_tail_length(intensity, self.comet_type),
        }
    }

    /// State after `time` years of simulation.
    pub fn state_at(&self, time: f64) -> CometState {
        let e = self.eccentricity;
        let initial = self.initial_true_anomaly.to_radians();
        let mean_motion = TAU / self.period.max(1e-6);
        let mean_anomaly = (mean_anomaly_from_true(initial, e) + time * mean_motion).rem_euclid(TAU);
        let true_anomaly = true_from_eccentric(eccentric_anomaly(mean_anomaly, e), e);

        let (position, distance) = self.position_at(true_anomaly);
        CometState {
            position,
            distance,
            true_anomaly: true_anomaly.to_degrees().rem_euclid(360.0),
            tail: self.tail_at(distance),
        }
    }
}

fn mean_anomaly_from_true(true_anomaly: f64, e: f64) -> f64 {
    let half = true_anomaly / 2.0;
    let eccentric = 2.0 * ((1.0 - e).sqrt() * half.sin()).atan2((1.0 + e).sqrt() * half.cos());
    eccentric - e * eccentric.sin()
}

/// Solve Kepler's equation M = E - e sin E by Newton iteration.
fn eccentric_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let mut estimate = if e > 0.8 { PI } else { mean_anomaly };
    for _ in 0..50 {
        let delta = (estimate - e * estimate.sin() - mean_anomaly) / (1.0 - e * estimate.cos());
        estimate -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    estimate
}

fn true_from_eccentric(eccentric: f64, e: f64) -> f64 {
    let half = eccentric / 2.0;
    2.0 * ((1.0 + e).sqrt() * half.sin()).atan2((1.0 - e).max(1e-9).sqrt() * half.cos())
}

pub fn generate_comet(
    params: &CometSystemParams<'_>,
    comet_type: CometType,
    index: usize,
    seed: Seed,
) -> CometData {
    let shape = shape(comet_type);
    let hz_min = *params.habitable_zone.start();

    let (e_min, e_max) = shape.eccentricity;
    let mut eccentricity = random_range(e_min, e_max, sub_seed(seed, 1));
    let inclination = random_range(shape.inclination.0, shape.inclination.1, sub_seed(seed, 2));
    let factor = random_range(
        shape.perihelion_factor.0,
        shape.perihelion_factor.1,
        sub_seed(seed, 3),
    );
    let perihelion = (hz_min * factor).max(params.perihelion_floor());

    if comet_type == CometType::ShortPeriod && params.outer_boundary > perihelion {
        let bounded = (params.outer_boundary - perihelion) / (params.outer_boundary + perihelion);
        eccentricity = eccentricity.min(bounded).max(e_min);
    }

    let aphelion = perihelion * (1.0 + eccentricity) / (1.0 - eccentricity);
    let semi_major_axis = (perihelion + aphelion) / 2.0;
    let color = random_int(0, TAIL_COLORS.len() as i64 - 1, sub_seed(seed, 7)) as usize;

    CometData {
        id: format!("{}-c{}", params.system_id, index),
        name: format!("{} C/{}", params.system_name, index + 1),
        comet_type,
        nucleus_size: random_range(shape.nucleus.0, shape.nucleus.1, sub_seed(seed, 4)),
        semi_major_axis,
        eccentricity,
        inclination,
        perihelion,
        aphelion,
        period: semi_major_axis.powf(1.5),
        argument_of_perihelion: random_range(0.0, 360.0, sub_seed(seed, 5)),
        initial_true_anomaly: random_range(0.0, 360.0, sub_seed(seed, 6)),
        tail_color: TAIL_COLORS[color.min(TAIL_COLORS.len() - 1)].to_string(),
        seed,
    }
}

/// All comets of one system. A single rarity roll can leave a system without any.
pub fn generate_comets(
    params: &CometSystemParams<'_>,
    seed: Seed,
    config: &GenerationConfig,
) -> Vec<CometData> {
    if !chance(config.comets.rarity_multiplier, seed) {
        return Vec::new();
    }
    let table = config.comet_table(params.star_type);
    let count = random_count(&table.count, sub_seed(seed, 1));

    (0..count)
        .map(|k| {
            let comet_seed = sub_seed(seed, 100 + k as u64 * 50);
            let comet_type = weighted_random_select(&table.weights, comet_seed)
                .copied()
                .unwrap_or(CometType::ShortPeriod);
            generate_comet(params, comet_type, k, comet_seed)
        })
        .collect()
}
