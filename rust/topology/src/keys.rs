// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology key types for arena-based storage.
//!
//! Each sketch entity gets a unique, type-safe key for O(1) lookup in the
//! arena. Keys are created by `slotmap::SlotMap` and remain valid even after
//! other entities are removed (generational indices). Keys are only
//! meaningful for the sketch generation that issued them; a rebuild produces
//! a new sketch with new keys, and stable identity is carried by names.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a point (canonical 2D location shared by every edge touching it).
    pub struct PointKey;

    /// Key for an edge (line or arc segment between two points).
    pub struct EdgeKey;

    /// Key for a coedge (one directed traversal of an edge inside a wire).
    pub struct CoedgeKey;

    /// Key for a wire (closed ring of coedges).
    pub struct WireKey;

    /// Key for a face (outer wire plus hole wires).
    pub struct FaceKey;

    /// Key for a guide line (decorative curve outside the face graph).
    pub struct GuideLineKey;
}

/// A key that can reference any sketch entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKey {
    Point(PointKey),
    Edge(EdgeKey),
    Coedge(CoedgeKey),
    Wire(WireKey),
    Face(FaceKey),
    GuideLine(GuideLineKey),
}

impl TopologyKey {
    /// Returns the topology type of this key.
    pub fn topology_type(&self) -> TopologyType {
        match self {
            TopologyKey::Point(_) => TopologyType::Point,
            TopologyKey::Edge(_) => TopologyType::Edge,
            TopologyKey::Coedge(_) => TopologyType::Coedge,
            TopologyKey::Wire(_) => TopologyType::Wire,
            TopologyKey::Face(_) => TopologyType::Face,
            TopologyKey::GuideLine(_) => TopologyType::GuideLine,
        }
    }
}

/// Discriminant for sketch entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyType {
    Point,
    Edge,
    Coedge,
    Wire,
    Face,
    GuideLine,
}

impl TopologyType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyType::Point => "Point",
            TopologyType::Edge => "Edge",
            TopologyType::Coedge => "Coedge",
            TopologyType::Wire => "Wire",
            TopologyType::Face => "Face",
            TopologyType::GuideLine => "GuideLine",
        }
    }
}

impl std::fmt::Display for TopologyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_from_key {
    ($key:ident => $variant:ident) => {
        impl From<$key> for TopologyKey {
            fn from(k: $key) -> Self {
                TopologyKey::$variant(k)
            }
        }
    };
}

impl_from_key!(PointKey => Point);
impl_from_key!(EdgeKey => Edge);
impl_from_key!(CoedgeKey => Coedge);
impl_from_key!(WireKey => Wire);
impl_from_key!(FaceKey => Face);
impl_from_key!(GuideLineKey => GuideLine);
