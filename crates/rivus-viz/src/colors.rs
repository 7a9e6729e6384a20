//! Colours of commodities and building types.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

pub const BASE: Rgb = Rgb(192, 192, 192);
pub const DECORATION: Rgb = Rgb(128, 128, 128);

pub static COLORS: &[(&str, Rgb)] = &[
    ("base", BASE),
    ("building", Rgb(192, 192, 192)),
    ("decoration", DECORATION),
    // commodities
    ("Heat", Rgb(230, 112, 36)),
    ("Cool", Rgb(0, 0, 255)),
    ("Elec", Rgb(255, 170, 0)),
    ("Demand", Rgb(0, 255, 0)),
    ("Gas", Rgb(128, 64, 0)),
    ("CO2", Rgb(11, 12, 13)),
    // buildings
    ("industrial", Rgb(240, 198, 116)),
    ("residential", Rgb(181, 189, 104)),
    ("commercial", Rgb(129, 162, 190)),
    ("basin", Rgb(110, 75, 56)),
    ("chapel", Rgb(177, 121, 91)),
    ("church", Rgb(177, 121, 91)),
    ("farm", Rgb(202, 178, 214)),
    ("farm_auxiliary", Rgb(106, 61, 154)),
    ("garage", Rgb(253, 191, 111)),
    ("greenhouse", Rgb(255, 127, 0)),
    ("hospital", Rgb(129, 221, 190)),
    ("hotel", Rgb(227, 26, 28)),
    ("house", Rgb(181, 189, 104)),
    ("office", Rgb(129, 162, 190)),
    ("public", Rgb(129, 162, 190)),
    ("restaurant", Rgb(227, 26, 28)),
    ("retail", Rgb(129, 162, 190)),
    ("school", Rgb(29, 103, 214)),
    ("warehouse", Rgb(98, 134, 6)),
];

/// Colour registered for `name`, or [`BASE`] for unknown names.
pub fn color(name: &str) -> Rgb {
    COLORS
        .iter()
        .find(|(key, _)| *key == name)
        .map_or(BASE, |(_, rgb)| *rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(color("Heat").to_string(), "rgb(230,112,36)");
        assert_eq!(color("Plasma"), BASE);
    }
}
