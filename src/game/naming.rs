use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::game::body::NebulaType;
use crate::game::random::Seed;

const ONSETS: &[&str] = &[
    "st", "dr", "kr", "m", "n", "v", "th", "z", "gl", "pr", "t", "k", "r", "s", "l", "ch", "x",
];
const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "ia", "ai", "eo"];
const CODAS: &[&str] = &["n", "r", "s", "th", "l", "x", "k", "m", "sh"];
const ENDINGS: &[&str] = &["os", "ar", "en", "ion", "is", "or", "un", "eth", "eus", "ara"];

fn pick<'a>(rng: &mut ChaCha8Rng, options: &'a [&str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn candidate(rng: &mut ChaCha8Rng) -> String {
    let raw = match rng.gen_range(0..4) {
        0 => format!("{}{}{}", pick(rng, ONSETS), pick(rng, VOWELS), pick(rng, ENDINGS)),
        1 => format!(
            "{}{}{}{}",
            pick(rng, ONSETS),
            pick(rng, VOWELS),
            pick(rng, CODAS),
            pick(rng, ENDINGS)
        ),
        2 => format!(
            "{}{}{}{}{}",
            pick(rng, ONSETS),
            pick(rng, VOWELS),
            pick(rng, ONSETS),
            pick(rng, VOWELS),
            pick(rng, ENDINGS)
        ),
        _ => format!(
            "{}{}{}{}",
            pick(rng, ONSETS),
            pick(rng, VOWELS),
            pick(rng, ENDINGS),
            pick(rng, CODAS)
        ),
    };
    capitalize(&raw)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Pronounceable star-system name derived only from `seed`.
pub fn system_name(seed: Seed) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    candidate(&mut rng)
}

/// `base 2`, `base 3`, … whichever is free first.
pub fn with_suffix(base: &str, used: &mut HashSet<String>) -> String {
    let mut n = 2usize;
    loop {
        let name = format!("{base} {n}");
        if used.insert(name.clone()) {
            return name;
        }
        n += 1;
    }
}

/// `b` for the first planet, `c` for the second, and so on past `z` as `b2`, `c2`.
pub fn planet_letter(index: usize) -> String {
    let letter = (b'b' + (index % 25) as u8) as char;
    match index / 25 {
        0 => letter.to_string(),
        lap => format!("{letter}{}", lap + 1),
    }
}

pub fn planet_name(system_name: &str, index: usize) -> String {
    format!("{} {}", system_name, planet_letter(index))
}

pub fn roman_numeral(mut n: usize) -> String {
    const TABLE: &[(usize, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= *value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Moons are numbered from one: `Planet I`, `Planet II`, …
pub fn moon_name(planet_name: &str, index: usize) -> String {
    format!("{} {}", planet_name, roman_numeral(index + 1))
}

const ARTICLES: &[&str] = &["The", "The", "A"];
const ADJECTIVES: &[&str] = &[
    "Silent", "Vagrant", "Crimson", "Glass", "Fallen", "Wandering", "Hidden", "Ashen", "Amber",
    "Sable", "Gilded", "Distant", "Forgotten", "Cold", "Veiled", "Drifting", "Silver", "Restless",
];
const NOUNS: &[&str] = &[
    "Veil", "Shroud", "Cradle", "Tide", "Crown", "Wake", "Halo", "Chorus", "Garden", "Ember",
    "Drift", "Hollow", "Gulf", "Bloom", "Mantle", "Reach",
];

fn themed_adjectives(nebula_type: NebulaType) -> &'static [&'static str] {
    match nebula_type {
        NebulaType::Emission => &["Burning", "Scarlet", "Kindled"],
        NebulaType::Reflection => &["Pale", "Azure", "Mirrored"],
        NebulaType::Dark => &["Starless", "Umbral", "Hungry", "Blind"],
        NebulaType::Planetary => &["Dying", "Hollow", "Ringed"],
        NebulaType::SupernovaRemnant => &["Shattered", "Scattered", "Sundered"],
    }
}

fn themed_nouns(nebula_type: NebulaType) -> &'static [&'static str] {
    match nebula_type {
        NebulaType::Emission => &["Furnace", "Blaze", "Rose"],
        NebulaType::Reflection => &["Mirror", "Lantern", "Glow"],
        NebulaType::Dark => &["Void", "Maw", "Curtain"],
        NebulaType::Planetary => &["Eye", "Shell", "Bubble"],
        NebulaType::SupernovaRemnant => &["Wreath", "Scar", "Echo", "Shard"],
    }
}

/// Evocative nebula names such as "The Umbral Veil" or "Amber Furnace".
pub fn nebula_name(nebula_type: NebulaType, seed: Seed) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let adjective = if rng.gen::<f64>() < 0.4 {
        pick(&mut rng, themed_adjectives(nebula_type))
    } else {
        pick(&mut rng, ADJECTIVES)
    };
    let noun = if rng.gen::<f64>() < 0.4 {
        pick(&mut rng, themed_nouns(nebula_type))
    } else {
        pick(&mut rng, NOUNS)
    };

    if rng.gen::<f64>() < 0.6 {
        format!("{} {} {}", pick(&mut rng, ARTICLES), adjective, noun)
    } else {
        format!("{adjective} {noun}")
    }
}
