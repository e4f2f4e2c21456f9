//! Named geological and archaeological periods on the BP scale.

use crate::units::BpRange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePeriod {
    pub name: &'static str,
    /// `[min, max)` in years BP.
    pub range: BpRange,
}

const fn period(name: &'static str, min: f64, max: f64) -> TimePeriod {
    TimePeriod {
        name,
        range: BpRange::new(min, max),
    }
}

pub static TIME_PERIODS: &[TimePeriod] = &[
    // Historical
    period("lastcentury", 0.0, 100.0),
    period("Industrial", 0.0, 170.0),
    period("LastMillennium", 0.0, 1_000.0),
    period("CommonEra", 0.0, 2_000.0),
    // Holocene
    period("LateHolocene", 0.0, 4_200.0),
    period("MidHolocene", 4_200.0, 8_200.0),
    period("EarlyHolocene", 8_200.0, 11_700.0),
    period("Holocene", 0.0, 11_700.0),
    // Late Pleistocene
    period("YoungerDryas", 11_700.0, 12_900.0),
    period("BøllingAllerød", 12_900.0, 14_700.0),
    period("LastGlacialMaximum", 19_000.0, 26_500.0),
    period("LastGlacial", 11_700.0, 115_000.0),
    period("LastInterglacial", 115_000.0, 130_000.0),
    // Quaternary
    period("Pleistocene", 11_700.0, 2_580_000.0),
    period("Quaternary", 0.0, 2_580_000.0),
    period("Gelasian", 1_800_000.0, 2_580_000.0),
    period("Calabrian", 781_000.0, 1_800_000.0),
    period("MiddlePleistocene", 126_000.0, 781_000.0),
    period("LatePleistocene", 11_700.0, 126_000.0),
    // Neogene
    period("Pliocene", 2_580_000.0, 5_333_000.0),
    period("Zanclean", 3_600_000.0, 5_333_000.0),
    period("Piacenzian", 2_580_000.0, 3_600_000.0),
    period("Miocene", 5_333_000.0, 23_030_000.0),
    period("EarlyMiocene", 15_970_000.0, 23_030_000.0),
    period("MiddleMiocene", 11_630_000.0, 15_970_000.0),
    period("LateMiocene", 5_333_000.0, 11_630_000.0),
    period("Neogene", 2_580_000.0, 23_030_000.0),
    // Paleogene
    period("Oligocene", 23_030_000.0, 33_900_000.0),
    period("Rupelian", 28_100_000.0, 33_900_000.0),
    period("Chattian", 23_030_000.0, 28_100_000.0),
    period("Eocene", 33_900_000.0, 56_000_000.0),
    period("EarlyEocene", 47_800_000.0, 56_000_000.0),
    period("MiddleEocene", 38_000_000.0, 47_800_000.0),
    period("LateEocene", 33_900_000.0, 38_000_000.0),
    period("Paleocene", 56_000_000.0, 66_000_000.0),
    period("Paleogene", 23_030_000.0, 66_000_000.0),
    // Cenozoic
    period("Cenozoic", 0.0, 66_000_000.0),
    // Mesozoic
    period("Cretaceous", 66_000_000.0, 145_000_000.0),
    period("EarlyCretaceous", 100_500_000.0, 145_000_000.0),
    period("LateCretaceous", 66_000_000.0, 100_500_000.0),
    period("Jurassic", 145_000_000.0, 201_300_000.0),
    period("EarlyJurassic", 174_100_000.0, 201_300_000.0),
    period("MiddleJurassic", 163_500_000.0, 174_100_000.0),
    period("LateJurassic", 145_000_000.0, 163_500_000.0),
    period("Triassic", 201_300_000.0, 251_902_000.0),
    period("EarlyTriassic", 247_200_000.0, 251_902_000.0),
    period("MiddleTriassic", 237_000_000.0, 247_200_000.0),
    period("LateTriassic", 201_300_000.0, 237_000_000.0),
    period("Mesozoic", 66_000_000.0, 251_902_000.0),
    // Paleozoic
    period("Permian", 251_902_000.0, 298_900_000.0),
    period("Carboniferous", 298_900_000.0, 358_900_000.0),
    period("Pennsylvanian", 298_900_000.0, 323_200_000.0),
    period("Mississippian", 323_200_000.0, 358_900_000.0),
    period("Devonian", 358_900_000.0, 419_200_000.0),
    period("Silurian", 419_200_000.0, 443_800_000.0),
    period("Ordovician", 443_800_000.0, 485_400_000.0),
    period("Cambrian", 485_400_000.0, 538_800_000.0),
    period("Paleozoic", 251_902_000.0, 538_800_000.0),
    // Precambrian
    period("Ediacaran", 538_800_000.0, 635_000_000.0),
    period("Cryogenian", 635_000_000.0, 720_000_000.0),
    period("Tonian", 720_000_000.0, 1_000_000_000.0),
    period("Neoproterozoic", 538_800_000.0, 1_000_000_000.0),
    period("Mesoproterozoic", 1_000_000_000.0, 1_600_000_000.0),
    period("Paleoproterozoic", 1_600_000_000.0, 2_500_000_000.0),
    period("Proterozoic", 538_800_000.0, 2_500_000_000.0),
    period("Archean", 2_500_000_000.0, 4_000_000_000.0),
    period("Hadean", 4_000_000_000.0, 4_600_000_000.0),
    period("Precambrian", 538_800_000.0, 4_600_000_000.0),
];

/// Look up a period by name.
///
/// Exact match first, then a match that ignores case and any
/// non-alphanumeric characters, so `"Last Glacial Maximum"` and
/// `"last_glacial_maximum"` both resolve to `LastGlacialMaximum`.
pub fn lookup(name: &str) -> Option<&'static TimePeriod> {
    if let Some(p) = TIME_PERIODS.iter().find(|p| p.name == name) {
        return Some(p);
    }
    let wanted = fold(name);
    if wanted.is_empty() {
        return None;
    }
    TIME_PERIODS.iter().find(|p| fold(p.name) == wanted)
}

pub fn iter() -> impl Iterator<Item = &'static TimePeriod> {
    TIME_PERIODS.iter()
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
