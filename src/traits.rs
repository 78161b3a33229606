//! Core domain traits for the CVRP planner.
//!
//! These are intentionally minimal. Concrete apps should implement them for
//! their own data models, or use [`OrderRecord`] / [`VehicleRecord`] for flat
//! records handed over by an import or persistence layer.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Unique identifier for planner entities.
pub trait Id: Clone + Eq + Hash + fmt::Debug {}

impl<T> Id for T where T: Clone + Eq + Hash + fmt::Debug {}

/// A delivery order to be routed.
pub trait Order {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Location coordinates (lat, lng), if geocoded.
    fn location(&self) -> Option<(f64, f64)>;

    /// Capacity consumed by this order (weight or item count), if known.
    fn demand(&self) -> Option<f64>;

    /// Explicit region label assigned upstream.
    fn region(&self) -> Option<i32> {
        None
    }
}

/// A capacity-limited vehicle departing from the depot.
pub trait Vehicle {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Raw capacity before adjustment, if known.
    fn capacity(&self) -> Option<f64>;
}

/// Order columns a caller may require before solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderField {
    Demand,
    Location,
    Region,
}

impl OrderField {
    /// Whether `order` carries a usable value for this field.
    pub fn present_on<O: Order>(self, order: &O) -> bool {
        match self {
            OrderField::Demand => order.demand().is_some(),
            OrderField::Location => order.location().is_some(),
            OrderField::Region => order.region().is_some(),
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderField::Demand => "demand",
            OrderField::Location => "location",
            OrderField::Region => "region",
        };
        f.write_str(name)
    }
}

/// Fleet columns a caller may require before solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FleetField {
    Capacity,
}

impl FleetField {
    pub fn present_on<V: Vehicle>(self, vehicle: &V) -> bool {
        match self {
            FleetField::Capacity => vehicle.capacity().is_some(),
        }
    }
}

impl fmt::Display for FleetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetField::Capacity => f.write_str("capacity"),
        }
    }
}

/// Flat order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub demand: Option<f64>,
    #[serde(default)]
    pub region: Option<i32>,
}

impl OrderRecord {
    pub fn new(id: impl Into<String>, demand: f64) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
            demand: Some(demand),
            region: None,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }
}

impl Order for OrderRecord {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    fn demand(&self) -> Option<f64> {
        self.demand
    }

    fn region(&self) -> Option<i32> {
        self.region
    }
}

/// Flat vehicle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Plate or fleet identifier; `vehicle_<n>` when the import had none.
    pub id: String,
    #[serde(default)]
    pub capacity: Option<f64>,
}

impl VehicleRecord {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            capacity: Some(capacity),
        }
    }

    /// Builds a record for the vehicle at 0-based `position` lacking a plate.
    pub fn unlabeled(position: usize, capacity: Option<f64>) -> Self {
        Self {
            id: format!("vehicle_{}", position + 1),
            capacity,
        }
    }
}

impl Vehicle for VehicleRecord {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn capacity(&self) -> Option<f64> {
        self.capacity
    }
}
