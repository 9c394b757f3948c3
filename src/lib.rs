use std::cell::RefCell;
use wasm_bindgen::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
pub mod galaxy;
pub mod game;

use game::body::{CometType, StarType};
use game::comet::{calculate_tail_intensity, calculate_tail_length, TailState};
use game::config::GenerationConfig;
use game::system::{generate_solar_system, SystemRequest};

thread_local! {
    static CONFIG: RefCell<GenerationConfig> = RefCell::new(GenerationConfig::default());
}

fn with_config<R>(f: impl FnOnce(&GenerationConfig) -> R) -> R {
    CONFIG.with(|cell| f(&cell.borrow()))
}

fn replace_config(json: &str) -> Result<(), String> {
    let config = GenerationConfig::from_json(json).map_err(|err| err.to_string())?;
    CONFIG.with(|cell| *cell.borrow_mut() = config);
    Ok(())
}

fn system_json(seed: u64, star_type: Option<&str>) -> Result<String, String> {
    let mut request = SystemRequest::new(seed);
    if let Some(label) = star_type {
        let star_type = StarType::from_label(label).ok_or_else(|| format!("unknown star type {label}"))?;
        request = request.star_type(star_type);
    }
    let system = with_config(|config| generate_solar_system(&request, config));
    serde_json::to_string(&system).map_err(|err| err.to_string())
}

fn tail_json(distance: f64, comet_type: &str) -> Result<String, String> {
    let comet_type: CometType =
        serde_json::from_value(serde_json::Value::String(comet_type.to_string()))
            .map_err(|_| format!("unknown comet type {comet_type}"))?;
    let intensity = calculate_tail_intensity(distance);
    let tail = TailState {
        intensity,
        length: calculate_tail_length(intensity, comet_type),
    };
    serde_json::to_string(&tail).map_err(|err| err.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Replace the generation tables used by [`generate_system`].
#[wasm_bindgen]
pub fn load_generation_config(json: &str) -> Result<(), JsValue> {
    replace_config(json).map_err(|err| {
        web_sys::console::warn_1(&format!("keeping previous generation tables: {err}").into());
        JsValue::from_str(&err)
    })
}

/// A whole solar system as JSON.
#[wasm_bindgen]
pub fn generate_system(seed: u64, star_type: Option<String>) -> Result<String, JsValue> {
    system_json(seed, star_type.as_deref()).map_err(|err| JsValue::from_str(&err))
}

/// Tail intensity and length for a comet at `distance` AU, recomputed per frame.
#[wasm_bindgen]
pub fn comet_tail(distance: f64, comet_type: &str) -> Result<String, JsValue> {
    tail_json(distance, comet_type).map_err(|err| JsValue::from_str(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::system::SolarSystem;

    #[test]
    fn system_json_is_deterministic() {
        let first = system_json(1000, Some("yellow_star")).unwrap();
        assert_eq!(first, system_json(1000, Some("yellow_star")).unwrap());
        let system: SolarSystem = serde_json::from_str(&first).unwrap();
        assert_eq!(system.star.star_type, StarType::YellowStar);
    }

    #[test]
    fn unknown_labels_are_errors() {
        assert!(system_json(1, Some("purple_star")).is_err());
        assert!(tail_json(1.0, "rogue").is_err());
    }

    #[test]
    fn tails_fade_with_distance() {
        let near: TailState = serde_json::from_str(&tail_json(0.5, "long_period").unwrap()).unwrap();
        let far: TailState = serde_json::from_str(&tail_json(1_000.0, "long_period").unwrap()).unwrap();
        assert!(near.intensity > far.intensity);
        assert_eq!(far.intensity, 0.0);
        assert!(near.length > far.length);
    }

    #[test]
    fn bad_config_keeps_the_previous_tables() {
        assert!(replace_config("{ nope").is_err());
        assert!(replace_config("{}").is_ok());
        assert!(system_json(5, None).is_ok());
    }
}
