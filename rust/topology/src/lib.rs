// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FloorSketch Topology
//!
//! Boundary-representation graph for 2D floor plan sketches, rebuilt
//! through a polygon boolean on every edit.
//!
//! A [`Sketch`] stores points, edges, coedges (half-edges), wires and faces
//! in slot maps with stable keys, plus guide lines that never bound a face.
//! Edits go through a [`SketchBuilder`]: the live faces and the pending
//! edits are flattened into tagged curves, a [`BooleanEngine`] computes the
//! planar subdivision, and the result is reconciled against the previous
//! generation so faces and edges keep their **names** and region payloads
//! across rebuilds. Keys are per generation; names are what callers hold on
//! to.
//!
//! ```
//! use floorsketch_topology::{BuilderRegion, Sketch};
//! use nalgebra::Point2;
//!
//! let mut sketch: Sketch = Sketch::new();
//! let p = Point2::new;
//! sketch
//!     .create_builder()
//!     .add_regions(vec![
//!         BuilderRegion::polygon("A", &[p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)]),
//!         BuilderRegion::polygon("B", &[p(4.0, 0.0), p(8.0, 0.0), p(8.0, 3.0), p(4.0, 3.0)]),
//!     ])
//!     .unwrap();
//!
//! let a = sketch.face_by_name("A").unwrap();
//! let b = sketch.face_by_name("B").unwrap();
//! sketch.create_builder().merge_faces(vec![a, b]).unwrap();
//! assert_eq!(sketch.face_count(), 1);
//! ```

pub mod arena;
pub mod arrangement;
pub mod boolean;
pub mod builder;
pub mod config;
pub mod construction;
pub mod curve;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod keys;
pub mod naming;
pub mod reconcile;
pub mod region;
pub mod spatial;
pub mod synchronize;
pub mod transform;
pub mod traversal;
pub mod validate;

pub use arena::Sketch;
pub use arrangement::ArrangementEngine;
pub use boolean::{
    BoolCoedge, BoolEdge, BoolError, BoolOptions, BoolRegion, BoolResult, BooleanEngine,
    PointInEdge,
};
pub use builder::{SketchBuilder, Sketchable};
pub use config::BuilderOptions;
pub use curve::{Arc2d, Curve2d, Line2d};
pub use error::{Error, Result};
pub use flatten::EditBatch;
pub use keys::{
    CoedgeKey, EdgeKey, FaceKey, GuideLineKey, PointKey, TopologyKey, TopologyType, WireKey,
};
pub use region::{BuilderCurve, BuilderRegion};
pub use synchronize::BuildReport;
