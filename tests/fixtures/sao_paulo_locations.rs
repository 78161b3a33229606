//! São Paulo locations for realistic test fixtures.
//!
//! Coordinates of public landmarks, rounded to 4 decimals.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Depot
// ============================================================================

pub const DEPOT: Location = Location::new("CEAGESP", -23.5380, -46.7420);

// ============================================================================
// West Zone
// ============================================================================

pub const WEST: &[Location] = &[
    Location::new("Parque Villa-Lobos", -23.5465, -46.7225),
    Location::new("Shopping Eldorado", -23.5727, -46.6961),
    Location::new("Largo da Batata", -23.5667, -46.6935),
    Location::new("Allianz Parque", -23.5275, -46.6786),
    Location::new("USP Butantã", -23.5614, -46.7307),
];

// ============================================================================
// Center / East
// ============================================================================

pub const EAST: &[Location] = &[
    Location::new("Mercado Municipal", -23.5417, -46.6297),
    Location::new("Estação da Luz", -23.5347, -46.6353),
    Location::new("Parque do Carmo", -23.5790, -46.4781),
    Location::new("Neo Química Arena", -23.5453, -46.4742),
    Location::new("Tatuapé", -23.5404, -46.5762),
];

/// West zone followed by center/east.
pub fn all_locations() -> Vec<Location> {
    WEST.iter().chain(EAST.iter()).cloned().collect()
}
