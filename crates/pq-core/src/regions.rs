//! Named geographic regions and their bounding boxes.

/// Latitude/longitude box in decimal degrees (south and west negative).
///
/// `min_lon > max_lon` means the box crosses the antimeridian: it spans
/// eastward from `min_lon` through 180° to `max_lon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let lat_ok = lat >= self.min_lat && lat <= self.max_lat;
        let lon_ok = if self.crosses_antimeridian() {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        };
        lat_ok && lon_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub bbox: BoundingBox,
}

const fn region(
    name: &'static str,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) -> Region {
    Region {
        name,
        bbox: BoundingBox::new(min_lat, max_lat, min_lon, max_lon),
    }
}

pub static REGIONS: &[Region] = &[
    // Continents
    region("North America", 10.0, 72.0, -170.0, -50.0),
    region("South America", -56.0, 15.0, -90.0, -30.0),
    region("Europe", 36.0, 72.0, -10.0, 40.0),
    region("Asia", 0.0, 80.0, 40.0, 180.0),
    region("Africa", -35.0, 37.0, -20.0, 52.0),
    region("Australia", -45.0, -10.0, 110.0, 155.0),
    region("Antarctica", -90.0, -60.0, -180.0, 180.0),
    // Ocean basins
    region("Pacific Ocean", -60.0, 65.0, 120.0, -70.0),
    region("Atlantic Ocean", -70.0, 65.0, -80.0, 20.0),
    region("Indian Ocean", -70.0, 30.0, 20.0, 120.0),
    region("Arctic Ocean", 65.0, 90.0, -180.0, 180.0),
    region("Southern Ocean", -90.0, -60.0, -180.0, 180.0),
    // Sub-continental regions
    region("Mediterranean", 30.0, 46.0, -5.0, 36.0),
    region("Caribbean", 8.0, 28.0, -90.0, -60.0),
    region("Middle East", 12.0, 42.0, 24.0, 63.0),
    region("Southeast Asia", -10.0, 30.0, 90.0, 150.0),
    // Latitude bands
    region("Tropics", -23.5, 23.5, -180.0, 180.0),
    region("Arctic", 66.5, 90.0, -180.0, 180.0),
    region("Antarctic", -90.0, -66.5, -180.0, 180.0),
    // ENSO index boxes
    region("Niño 3.4", -5.0, 5.0, -170.0, -120.0),
    region("Niño 3", -5.0, 5.0, -150.0, -90.0),
    region("Niño 4", -5.0, 5.0, 160.0, -150.0),
    region("Niño 1+2", -10.0, 0.0, -90.0, -80.0),
    // Basins, plateaus and sub-regions
    region("Tropical Pacific", -23.5, 23.5, 120.0, -70.0),
    region("North Atlantic", 30.0, 65.0, -80.0, 0.0),
    region("South Atlantic", -60.0, 0.0, -70.0, 20.0),
    region("North Pacific", 30.0, 65.0, 120.0, -100.0),
    region("South Pacific", -60.0, 0.0, 150.0, -70.0),
    region("Western Europe", 36.0, 72.0, -10.0, 20.0),
    region("Eastern Europe", 36.0, 72.0, 20.0, 40.0),
    region("East Asia", 10.0, 50.0, 100.0, 145.0),
    region("South Asia", 5.0, 40.0, 60.0, 100.0),
    region("Central America", 7.0, 33.0, -120.0, -60.0),
    region("Greenland", 60.0, 85.0, -75.0, -10.0),
    region("Amazon Basin", -20.0, 5.0, -80.0, -45.0),
    region("Sahara", 15.0, 35.0, -15.0, 35.0),
    region("Tibetan Plateau", 25.0, 40.0, 70.0, 105.0),
    region("Himalayas", 25.0, 40.0, 70.0, 95.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// Registry name contains the query, or the query contains the registry name.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatch {
    pub region: &'static Region,
    pub kind: MatchKind,
}

/// Resolve a region name: case-insensitive exact match, then substring match
/// in either direction. First hit in table order wins.
pub fn lookup(name: &str) -> Option<RegionMatch> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    if let Some(region) = REGIONS.iter().find(|r| r.name.to_lowercase() == wanted) {
        return Some(RegionMatch {
            region,
            kind: MatchKind::Exact,
        });
    }

    REGIONS
        .iter()
        .find(|r| {
            let candidate = r.name.to_lowercase();
            candidate.contains(&wanted) || wanted.contains(&candidate)
        })
        .map(|region| RegionMatch {
            region,
            kind: MatchKind::Partial,
        })
}

pub fn iter() -> impl Iterator<Item = &'static Region> {
    REGIONS.iter()
}
