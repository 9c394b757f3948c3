//! Seed-keyed randomness and value noise.
//!
//! Every function here is a pure function of its inputs. Generators never hold
//! an RNG; they derive a sub-seed per draw with [`sub_seed`] and hash it.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub type Seed = u64;

const MIX_A: u64 = 0xbf58_476d_1ce4_e5b9;
const MIX_B: u64 = 0x94d0_49bb_1331_11eb;
const LATTICE_X: u64 = 0x9e37_79b9_7f4a_7c15;
const LATTICE_Y: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Offset a parent seed for a child role. Offsets are part of the save format.
#[inline]
pub fn sub_seed(seed: Seed, offset: u64) -> Seed {
    seed.wrapping_add(offset)
}

/// Avalanche a seed into 64 well-mixed bits.
#[inline]
pub fn mix(seed: Seed) -> u64 {
    let mut z = seed;
    z = (z ^ (z >> 30)).wrapping_mul(MIX_A);
    z = (z ^ (z >> 27)).wrapping_mul(MIX_B);
    z ^ (z >> 31)
}

/// Hash a seed into `[0, 1)`.
#[inline]
pub fn unit_hash(seed: Seed) -> f64 {
    (mix(seed) >> 11) as f64 / (1u64 << 53) as f64
}

pub fn random_range(min: f64, max: f64, seed: Seed) -> f64 {
    min + unit_hash(seed) * (max - min)
}

pub fn random_int(min: i64, max: i64, seed: Seed) -> i64 {
    random_range(min as f64, max as f64 + 1.0, seed).floor() as i64
}

pub fn random_in(range: &RangeInclusive<f64>, seed: Seed) -> f64 {
    random_range(*range.start(), *range.end(), seed)
}

/// Integer draw from a count range; an inverted range yields its start.
pub fn random_count(range: &RangeInclusive<u32>, seed: Seed) -> usize {
    let (lo, hi) = (*range.start(), *range.end());
    if hi <= lo {
        return lo as usize;
    }
    random_int(lo as i64, hi as i64, seed).clamp(lo as i64, hi as i64) as usize
}

pub fn chance(probability: f64, seed: Seed) -> bool {
    unit_hash(seed) < probability
}

/// Pick a key from an ordered weight table.
///
/// The table order is significant: the same table and seed always land in the
/// same bucket. Returns `None` only when the table is empty.
pub fn weighted_random_select<K>(weights: &[(K, f64)], seed: Seed) -> Option<&K> {
    let total: f64 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    let first = weights.first().map(|(k, _)| k)?;
    if total <= 0.0 {
        return Some(first);
    }

    let draw = unit_hash(seed) * total;
    let mut cumulative = 0.0;
    for (key, weight) in weights {
        cumulative += weight.max(0.0);
        if draw < cumulative {
            return Some(key);
        }
    }
    // rounding can leave the draw just past the last bucket
    Some(first)
}

/// Uniform point on the unit sphere.
pub fn unit_vector(seed: Seed) -> [f64; 3] {
    let theta = random_range(0.0, std::f64::consts::TAU, seed);
    let cos_phi = random_range(-1.0, 1.0, sub_seed(seed, 1));
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    [sin_phi * theta.cos(), cos_phi, sin_phi * theta.sin()]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub scale: f64,
    pub seed: Seed,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            scale: 1.0,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    pub fn with_seed(seed: Seed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

fn lattice(ix: i64, iy: i64, seed: Seed) -> f64 {
    let key = seed
        ^ (ix as u64).wrapping_mul(LATTICE_X)
        ^ (iy as u64).wrapping_mul(LATTICE_Y).rotate_left(17);
    unit_hash(key)
}

#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Bilinear value noise in `[0, 1]`.
pub fn value_noise_2d(x: f64, y: f64, seed: Seed) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return 0.5;
    }
    let (fx, fy) = (x.floor(), y.floor());
    let (ix, iy) = (fx as i64, fy as i64);
    let (tx, ty) = (smoothstep(x - fx), smoothstep(y - fy));

    let top = lerp(lattice(ix, iy, seed), lattice(ix + 1, iy, seed), tx);
    let bottom = lerp(
        lattice(ix, iy + 1, seed),
        lattice(ix + 1, iy + 1, seed),
        tx,
    );
    lerp(top, bottom, ty)
}

/// Octave sum of [`value_noise_2d`], normalized to `[0, 1]`.
pub fn fractal_noise_2d(x: f64, y: f64, config: &NoiseConfig) -> f64 {
    let mut amplitude = 1.0;
    let mut frequency = config.scale;
    let mut total = 0.0;
    let mut norm = 0.0;

    for octave in 0..config.octaves.max(1) {
        let octave_seed = sub_seed(config.seed, octave as u64 * 131);
        total += value_noise_2d(x * frequency, y * frequency, octave_seed) * amplitude;
        norm += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    if norm > 0.0 {
        total / norm
    } else {
        0.0
    }
}

/// Sharp crests where the fractal field crosses its midpoint.
pub fn ridged_noise_2d(x: f64, y: f64, config: &NoiseConfig) -> f64 {
    1.0 - (fractal_noise_2d(x, y, config) * 2.0 - 1.0).abs()
}

/// Rounded, cloud-like lobes.
pub fn billowy_noise_2d(x: f64, y: f64, config: &NoiseConfig) -> f64 {
    (fractal_noise_2d(x, y, config) * 2.0 - 1.0).abs()
}

/// Fractal noise sampled at a point displaced by two independent fields.
pub fn warped_noise_2d(x: f64, y: f64, config: &NoiseConfig, strength: f64) -> f64 {
    let warp_x = NoiseConfig {
        seed: sub_seed(config.seed, 7_001),
        ..config.clone()
    };
    let warp_y = NoiseConfig {
        seed: sub_seed(config.seed, 7_919),
        ..config.clone()
    };
    let dx = (fractal_noise_2d(x, y, &warp_x) - 0.5) * strength;
    let dy = (fractal_noise_2d(x, y, &warp_y) - 0.5) * strength;
    fractal_noise_2d(x + dx, y + dy, config)
}

/// Seamless noise over a sphere addressed by latitude/longitude in degrees.
///
/// Two planar projections of the unit-sphere point are blended by latitude so
/// the longitude wrap at ±180° has no visible seam.
pub fn spherical_noise(lat: f64, lng: f64, config: &NoiseConfig) -> f64 {
    let (lat_r, lng_r) = (lat.to_radians(), lng.to_radians());
    let px = lat_r.cos() * lng_r.cos();
    let py = lat_r.sin();
    let pz = lat_r.cos() * lng_r.sin();

    let equatorial = fractal_noise_2d(px + pz * 0.5 + 4.0, py + 4.0, config);
    let polar = fractal_noise_2d(
        px + 8.0,
        pz + 8.0,
        &NoiseConfig {
            seed: sub_seed(config.seed, 3_301),
            ..config.clone()
        },
    );
    let blend = py.abs();
    lerp(equatorial, polar, blend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_value() {
        for seed in [0, 1, 42, 1_000, u64::MAX] {
            assert_eq!(random_range(2.0, 9.0, seed), random_range(2.0, 9.0, seed));
            assert_eq!(random_int(0, 10, seed), random_int(0, 10, seed));
        }
    }

    #[test]
    fn ranges_are_respected() {
        for seed in 0..5_000 {
            let v = random_range(-3.0, 7.0, seed);
            assert!((-3.0..7.0).contains(&v), "{v} out of range");
            let i = random_int(2, 5, seed);
            assert!((2..=5).contains(&i), "{i} out of range");
        }
    }

    #[test]
    fn random_int_reaches_both_ends() {
        let hits: std::collections::HashSet<i64> =
            (0..2_000).map(|s| random_int(0, 3, s)).collect();
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn inverted_ranges_do_not_panic() {
        let v = random_range(5.0, 1.0, 9);
        assert!(v.is_finite());
        let _ = random_int(10, 2, 9);
        assert_eq!(random_count(&(4..=1), 9), 4);
        let _ = value_noise_2d(f64::NAN, f64::INFINITY, 3);
        let _ = fractal_noise_2d(
            1.0,
            1.0,
            &NoiseConfig {
                octaves: 0,
                ..NoiseConfig::default()
            },
        );
    }

    #[test]
    fn weighted_selection_matches_declared_weights() {
        let table = [("a", 50.0), ("b", 35.0), ("c", 15.0)];
        let samples = 100_000u64;
        let mut counts = [0u32; 3];
        for seed in 0..samples {
            match *weighted_random_select(&table, seed).unwrap() {
                "a" => counts[0] += 1,
                "b" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        for (count, expected) in counts.iter().zip([0.50, 0.35, 0.15]) {
            let observed = *count as f64 / samples as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "expected {expected}, observed {observed}"
            );
        }
    }

    #[test]
    fn adjacent_seeds_are_not_correlated() {
        // a weak hash makes consecutive seeds walk monotonically
        let n = 10_000u64;
        let values: Vec<f64> = (0..n).map(unit_hash).collect();
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let cov = values
            .windows(2)
            .map(|w| (w[0] - mean) * (w[1] - mean))
            .sum::<f64>();
        let lag1 = cov / var;
        assert!(lag1.abs() < 0.05, "lag-1 correlation {lag1}");
        assert!((mean - 0.5).abs() < 0.02);
    }

    #[test]
    fn weighted_selection_edge_cases() {
        let empty: [(&str, f64); 0] = [];
        assert!(weighted_random_select(&empty, 1).is_none());
        let zeros = [("x", 0.0), ("y", 0.0)];
        assert_eq!(weighted_random_select(&zeros, 1), Some(&"x"));
    }

    #[test]
    fn fractal_noise_is_deterministic_and_bounded() {
        let config = NoiseConfig::with_seed(77);
        for i in 0..200 {
            let (x, y) = (i as f64 * 0.173, i as f64 * -0.291);
            let a = fractal_noise_2d(x, y, &config);
            assert_eq!(a, fractal_noise_2d(x, y, &config));
            assert!((0.0..=1.0).contains(&a));
            assert!((0.0..=1.0).contains(&ridged_noise_2d(x, y, &config)));
            assert!((0.0..=1.0).contains(&billowy_noise_2d(x, y, &config)));
            assert!((0.0..=1.0).contains(&warped_noise_2d(x, y, &config, 2.0)));
        }
    }

    #[test]
    fn spherical_noise_has_no_seam_at_date_line() {
        let config = NoiseConfig::with_seed(5);
        for lat in [-60.0, -10.0, 0.0, 25.0, 70.0] {
            let west = spherical_noise(lat, -180.0, &config);
            let east = spherical_noise(lat, 180.0, &config);
            assert!((west - east).abs() < 1e-9);
        }
    }

    #[test]
    fn unit_vector_is_normalized() {
        for seed in 0..100 {
            let [x, y, z] = unit_vector(seed);
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-9);
        }
    }
}
