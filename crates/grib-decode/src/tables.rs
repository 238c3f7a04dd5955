//! Parameter and level lookup tables.
//!
//! Short names follow the eccodes convention so the variables coming out of
//! the decoder line up with the names the downstream rename map and denylist
//! expect. Unrecognised parameters decode as `"unknown"`.

/// Short name for a (discipline, category, number) triple.
pub fn parameter_short_name(discipline: u8, category: u8, number: u8) -> String {
    let name = match (discipline, category, number) {
        // Temperature
        (0, 0, 0) => "t",
        (0, 0, 6) => "dpt",

        // Moisture
        (0, 1, 1) => "r",
        (0, 1, 7) => "prate",
        (0, 1, 11) => "sde",

        // Momentum
        (0, 2, 1) => "si10",
        (0, 2, 2) => "u",
        (0, 2, 3) => "v",
        (0, 2, 22) => "fg",

        // Mass
        (0, 3, 0) => "pres",
        (0, 3, 1) => "prmsl",

        // Radiation
        (0, 4, 7) => "dswrf",
        (0, 5, 3) => "dlwrf",

        // Cloud
        (0, 6, 1) => "tcc",
        (0, 6, 3) => "lcc",
        (0, 6, 4) => "mcc",
        (0, 6, 5) => "hcc",

        // Physical atmospheric properties
        (0, 19, 0) => "vis",

        _ => return "unknown".to_string(),
    };
    name.to_string()
}

/// Coordinate name a fixed-surface type attaches to the loaded grid.
///
/// These names deliberately match the auxiliary coordinates the original
/// parser emitted, so the aggregation denylist recognises them.
pub fn level_coordinate(level_type: u8) -> &'static str {
    match level_type {
        1 => "surface",
        2 => "cloudBase",
        10 | 200 => "atmosphere",
        101 => "meanSea",
        103 => "heightAboveGround",
        106 => "heightAboveGroundLayer",
        _ => "level",
    }
}

/// Human-readable level description.
pub fn level_description(level_type: u8, level_value: u32) -> String {
    match level_type {
        1 => "surface".to_string(),
        2 => "cloud base".to_string(),
        10 | 200 => "entire atmosphere".to_string(),
        100 => format!("{} mb", level_value),
        101 => "mean sea level".to_string(),
        102 => format!("{} m above MSL", level_value),
        103 => format!("{} m above ground", level_value),
        _ => format!("level type {} value {}", level_type, level_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_parameters_resolve() {
        assert_eq!(parameter_short_name(0, 0, 0), "t");
        assert_eq!(parameter_short_name(0, 6, 5), "hcc");
        assert_eq!(parameter_short_name(0, 19, 0), "vis");
    }

    #[test]
    fn unknown_parameters_fall_back() {
        assert_eq!(parameter_short_name(3, 99, 99), "unknown");
    }

    #[test]
    fn level_coordinates_match_denylist_names() {
        assert_eq!(level_coordinate(103), "heightAboveGround");
        assert_eq!(level_coordinate(101), "meanSea");
        assert_eq!(level_coordinate(1), "surface");
    }
}
