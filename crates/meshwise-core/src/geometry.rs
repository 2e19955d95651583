//! Building geometry and node placements
//!
//! Spatial context for the position estimator and coverage mapper:
//!
//! - [`Point3`]: position in meters on a per-floor grid
//! - [`FloorPlan`] / [`Building`]: simplified floor dimensions and rooms
//! - [`WallMaterial`]: per-material signal attenuation
//! - [`NodePlacement`] / [`PlacementRegistry`]: where mesh nodes physically sit
//!
//! The model is deliberately simple: floors are axis-aligned rectangles,
//! rooms carry a wall material but no geometry, and all coordinates are in
//! meters relative to the floor's south-west corner.

use crate::state::NeighborNetwork;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point in building coordinates (meters). `z` is height above the
/// current floor's ground level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Full 3D Euclidean distance to another point (meters).
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Horizontal (same-floor) distance to another point (meters).
    pub fn distance_2d(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Wall construction material, used to estimate interior attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallMaterial {
    Drywall,
    Wood,
    Glass,
    Brick,
    Concrete,
    Metal,
}

impl WallMaterial {
    /// Typical 2.4GHz attenuation per wall of this material (dB).
    pub fn attenuation_db(&self) -> f64 {
        match self {
            WallMaterial::Drywall => 3.0,
            WallMaterial::Wood => 4.0,
            WallMaterial::Glass => 2.0,
            WallMaterial::Brick => 8.0,
            WallMaterial::Concrete => 12.0,
            WallMaterial::Metal => 26.0,
        }
    }
}

impl Default for WallMaterial {
    fn default() -> Self {
        WallMaterial::Drywall
    }
}

/// A room on a floor. Rooms carry no geometry; their materials feed the
/// floor's average interior-wall attenuation estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Human-readable name ("kitchen", "office", ...)
    pub name: String,
    /// Dominant wall material
    pub wall_material: WallMaterial,
}

impl Room {
    /// Create a new room.
    pub fn new(name: &str, wall_material: WallMaterial) -> Self {
        Self {
            name: name.to_string(),
            wall_material,
        }
    }
}

/// A single floor of the building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    /// Floor number (0 = ground floor, negative = basement)
    pub floor: i32,
    /// Display label ("Ground floor", "Attic", ...)
    pub label: String,
    /// East-west extent in meters
    pub width_m: f64,
    /// North-south extent in meters
    pub length_m: f64,
    /// Rooms on this floor
    pub rooms: Vec<Room>,
}

impl FloorPlan {
    /// Create a floor with the given number and dimensions.
    pub fn new(floor: i32, label: &str, width_m: f64, length_m: f64) -> Self {
        Self {
            floor,
            label: label.to_string(),
            width_m,
            length_m,
            rooms: Vec::new(),
        }
    }

    /// Add a room (builder style).
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Average per-wall attenuation over this floor's room materials (dB).
    /// Falls back to drywall when no rooms are annotated.
    pub fn average_wall_attenuation_db(&self) -> f64 {
        if self.rooms.is_empty() {
            return WallMaterial::default().attenuation_db();
        }
        let total: f64 = self
            .rooms
            .iter()
            .map(|r| r.wall_material.attenuation_db())
            .sum();
        total / self.rooms.len() as f64
    }
}

/// Building model: floors plus ambient neighbor networks visible inside it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Building {
    /// Floors, any order; looked up by floor number
    pub floors: Vec<FloorPlan>,
    /// Vertical distance between floor ground levels (meters)
    pub floor_height_m: f64,
    /// Foreign networks audible inside the building; the coverage mapper
    /// treats them as ambient interference sources
    pub neighbor_networks: Vec<NeighborNetwork>,
}

impl Building {
    /// Create a building with the default 3m floor height.
    pub fn new(floors: Vec<FloorPlan>) -> Self {
        Self {
            floors,
            floor_height_m: 3.0,
            neighbor_networks: Vec::new(),
        }
    }

    /// Override the floor height (builder style).
    pub fn with_floor_height(mut self, height_m: f64) -> Self {
        self.floor_height_m = height_m;
        self
    }

    /// Record ambient neighbor networks (builder style).
    pub fn with_neighbors(mut self, neighbors: Vec<NeighborNetwork>) -> Self {
        self.neighbor_networks = neighbors;
        self
    }

    /// Find a floor by number.
    pub fn floor(&self, number: i32) -> Option<&FloorPlan> {
        self.floors.iter().find(|f| f.floor == number)
    }
}

/// Physical placement of a mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    /// Mesh node id this placement belongs to
    pub node_id: String,
    /// Floor number
    pub floor: i32,
    /// Floor display label
    pub floor_label: String,
    /// Position on the floor (meters)
    pub position: Point3,
    /// Expected 2.4GHz coverage radius (meters)
    pub coverage_radius_24_m: f64,
    /// Expected 5GHz coverage radius (meters)
    pub coverage_radius_5_m: f64,
}

impl NodePlacement {
    /// Create a placement with typical indoor coverage radii (30m / 15m).
    pub fn new(node_id: &str, floor: i32, floor_label: &str, position: Point3) -> Self {
        Self {
            node_id: node_id.to_string(),
            floor,
            floor_label: floor_label.to_string(),
            position,
            coverage_radius_24_m: 30.0,
            coverage_radius_5_m: 15.0,
        }
    }
}

/// Registry of node placements, keyed by node id. One placement per node;
/// upserting the same node id replaces the previous entry (latest write
/// wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementRegistry {
    placements: HashMap<String, NodePlacement>,
}

impl PlacementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the placement for a node.
    pub fn upsert(&mut self, placement: NodePlacement) {
        self.placements
            .insert(placement.node_id.clone(), placement);
    }

    /// Look up a placement by node id.
    pub fn get(&self, node_id: &str) -> Option<&NodePlacement> {
        self.placements.get(node_id)
    }

    /// Remove a placement. Returns the removed entry if present.
    pub fn remove(&mut self, node_id: &str) -> Option<NodePlacement> {
        self.placements.remove(node_id)
    }

    /// All placements, unordered.
    pub fn all(&self) -> impl Iterator<Item = &NodePlacement> {
        self.placements.values()
    }

    /// Placements on a specific floor.
    pub fn on_floor(&self, floor: i32) -> Vec<&NodePlacement> {
        self.placements
            .values()
            .filter(|p| p.floor == floor)
            .collect()
    }

    /// Number of placed nodes.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Check if no nodes are placed.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
