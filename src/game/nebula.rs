use serde::{Deserialize, Serialize};

use crate::game::body::{NebulaType, StarType};
use crate::game::config::GenerationConfig;
use crate::game::naming::nebula_name;
use crate::game::random::{chance, random_in, random_int, random_range, sub_seed, unit_vector, Seed};

/// Rarity multiplier when the star type is one the nebula type favours.
pub const PREFERRED_STAR_AFFINITY: f64 = 2.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NebulaData {
    pub id: String,
    pub name: String,
    pub nebula_type: NebulaType,
    pub position: [f64; 3],
    /// Radius in AU.
    pub size: f64,
    pub density: f64,
    pub opacity: f64,
    pub color: String,
    /// Degrees.
    pub rotation: f64,
    pub seed: Seed,
}

/// Background nebulae for a system, always placed clear of its interior.
///
/// `practical_radius` is the distance of the outermost planet or belt.
pub fn generate_nebulae(
    system_id: &str,
    star_type: StarType,
    practical_radius: f64,
    seed: Seed,
    config: &GenerationConfig,
) -> Vec<NebulaData> {
    let mut nebulae = Vec::new();
    for (k, table) in config.nebula_types.iter().enumerate() {
        let nebula_seed = sub_seed(seed, k as u64 * 100);
        let affinity = if table.preferred_stars.contains(&star_type) {
            PREFERRED_STAR_AFFINITY
        } else {
            1.0
        };
        if !chance(table.rarity * affinity, nebula_seed) {
            continue;
        }

        let size = random_in(&table.size, sub_seed(nebula_seed, 1));
        let clearance = practical_radius.max(0.0) * 1.5 + size;
        let distance = clearance + random_range(0.0, practical_radius.max(1.0), sub_seed(nebula_seed, 2));
        let direction = unit_vector(sub_seed(nebula_seed, 3));
        let color = match table.colors.len() {
            0 => "#ffffff".to_string(),
            n => table.colors[random_int(0, n as i64 - 1, sub_seed(nebula_seed, 7)) as usize % n].clone(),
        };

        nebulae.push(NebulaData {
            id: format!("{}-n{}", system_id, nebulae.len()),
            name: nebula_name(table.nebula_type, sub_seed(nebula_seed, 8)),
            nebula_type: table.nebula_type,
            position: direction.map(|axis| axis * distance),
            size,
            density: random_in(&table.density, sub_seed(nebula_seed, 5)),
            opacity: random_in(&table.opacity, sub_seed(nebula_seed, 6)).clamp(0.0, 1.0),
            color,
            rotation: random_range(0.0, 360.0, sub_seed(nebula_seed, 9)),
            seed: nebula_seed,
        });
    }
    nebulae
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nebulae_stay_outside_the_system() {
        let config = GenerationConfig::default();
        for seed in 0..300 {
            for nebula in generate_nebulae("sys", StarType::BlueGiant, 12.0, seed * 31, &config) {
                let [x, y, z] = nebula.position;
                let distance = (x * x + y * y + z * z).sqrt();
                assert!(distance - nebula.size >= 12.0 * 1.5 - 1e-9);
            }
        }
    }

    #[test]
    fn preferred_stars_see_more_nebulae() {
        let config = GenerationConfig::default();
        let count = |star| -> usize {
            (0..2000)
                .map(|seed| {
                    generate_nebulae("sys", star, 5.0, seed * 7, &config)
                        .iter()
                        .filter(|n| n.nebula_type == NebulaType::Emission)
                        .count()
                })
                .sum()
        };
        // emission nebulae favour blue giants
        assert!(count(StarType::BlueGiant) > count(StarType::RedDwarf) * 2);
    }

    #[test]
    fn empty_table_means_no_nebulae() {
        let config = GenerationConfig {
            nebula_types: Vec::new(),
            ..GenerationConfig::default()
        };
        assert!(generate_nebulae("sys", StarType::YellowStar, 5.0, 1, &config).is_empty());
    }
}
