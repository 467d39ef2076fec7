// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for sketch topology operations.

use crate::boolean::BoolError;
use crate::keys::*;

/// Result type alias for sketch topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or rebuilding a sketch.
///
/// Every variant aborts the rebuild that raised it; the host sketch is left
/// exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced topology entity was not found in the sketch.
    #[error("topology entity not found: {0:?}")]
    NotFound(TopologyKey),

    /// Point key not found in the sketch.
    #[error("point not found: {0:?}")]
    PointNotFound(PointKey),

    /// Edge key not found in the sketch.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Coedge key not found in the sketch.
    #[error("coedge not found: {0:?}")]
    CoedgeNotFound(CoedgeKey),

    /// Wire key not found in the sketch.
    #[error("wire not found: {0:?}")]
    WireNotFound(WireKey),

    /// Face key not found in the sketch.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// Guide line key not found in the sketch.
    #[error("guide line not found: {0:?}")]
    GuideLineNotFound(GuideLineKey),

    /// An input curve is shorter than the build tolerance.
    #[error("curve '{id}' is degenerate: length {length} is below tolerance")]
    DegenerateCurve { id: String, length: f64 },

    /// Consecutive curves of a loop do not meet.
    #[error("loop of region '{0}' is not closed: curve {1} does not end where curve {2} starts")]
    OpenLoop(String, usize, usize),

    /// Two non-adjacent curves of a loop cross each other.
    #[error("loop of region '{0}' self-intersects between curves {1} and {2}")]
    SelfIntersectingLoop(String, usize, usize),

    /// A wire must have at least one coedge.
    #[error("wire must have at least one coedge")]
    EmptyWire,

    /// Coedges handed to a wire are not connected end-to-end.
    #[error("wire coedges are not connected: coedge {0} end does not match coedge {1} start")]
    DisconnectedWire(usize, usize),

    /// An edge would be traversed by more than two coedges.
    #[error("edge {0:?} already has two coedges")]
    EdgeOverused(EdgeKey),

    /// The build tolerance must be finite and strictly positive.
    #[error("invalid tolerance: {0}")]
    InvalidTolerance(f64),

    /// The external boolean engine failed.
    #[error("boolean engine failed: {0}")]
    Boolean(#[from] BoolError),

    /// The boolean engine returned data that cannot be reconciled.
    #[error("boolean engine returned an invalid result: {0}")]
    InvalidBooleanResult(String),

    /// A rebuilt sketch violates a topology invariant.
    #[error("topology invariant violated: {0}")]
    InvariantViolation(String),

    /// Arcs can only be moved by similarity transforms.
    #[error("unsupported transform: {0}")]
    UnsupportedTransform(String),
}
