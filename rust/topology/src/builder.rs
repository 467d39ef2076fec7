// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public mutation API.
//!
//! Every boundary edit is a thin wrapper that fills an [`EditBatch`] and
//! runs the whole pipeline once through [`SketchBuilder::update`]:
//!
//! ```text
//! host.sketch() ─► flatten ─► engine.exbool ─► reconcile ─► synchronize
//!                                                              │
//!                                     host.update_sketch(next) ◄┘
//! ```
//!
//! Nothing is written to the host until the new generation has been built
//! and validated, so a failed call leaves the host's sketch untouched.
//! Guide lines, the background and transforms bypass the pipeline.

use nalgebra::{Matrix3, Point2, Vector2};

use crate::arena::{GuideLineData, Sketch};
use crate::arrangement::ArrangementEngine;
use crate::boolean::{BoolResult, BooleanEngine};
use crate::config::BuilderOptions;
use crate::error::{Error, Result};
use crate::flatten::{flatten, EditBatch};
use crate::keys::*;
use crate::reconcile::reconcile;
use crate::region::{BuilderCurve, BuilderRegion};
use crate::synchronize::{synchronize, BuildReport};

/// An object that owns a sketch the builder reads and replaces.
pub trait Sketchable {
    /// Region payload carried by the sketch's faces.
    type Payload: Clone;

    /// The current sketch, if there is one yet.
    fn sketch(&self) -> Option<&Sketch<Self::Payload>>;

    /// Replaces the current sketch. The only side effect of a rebuild.
    fn update_sketch(&mut self, sketch: Sketch<Self::Payload>);
}

impl<P: Clone> Sketchable for Sketch<P> {
    type Payload = P;

    fn sketch(&self) -> Option<&Sketch<P>> {
        Some(self)
    }

    fn update_sketch(&mut self, sketch: Sketch<P>) {
        *self = sketch;
    }
}

impl<P: Clone> Sketchable for Option<Sketch<P>> {
    type Payload = P;

    fn sketch(&self) -> Option<&Sketch<P>> {
        self.as_ref()
    }

    fn update_sketch(&mut self, sketch: Sketch<P>) {
        *self = Some(sketch);
    }
}

impl<P: Clone> Sketch<P> {
    /// A builder that edits this sketch in place with default options.
    pub fn create_builder(&mut self) -> SketchBuilder<'_, Self> {
        SketchBuilder::new(self)
    }
}

/// Funnels edits on a [`Sketchable`] host through the rebuild pipeline.
pub struct SketchBuilder<'a, H: Sketchable + ?Sized, E: BooleanEngine = ArrangementEngine> {
    host: &'a mut H,
    engine: E,
    options: BuilderOptions,
}

impl<'a, H: Sketchable + ?Sized> SketchBuilder<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            engine: ArrangementEngine,
            options: BuilderOptions::default(),
        }
    }
}

impl<'a, H: Sketchable + ?Sized, E: BooleanEngine> SketchBuilder<'a, H, E> {
    /// Swaps the boolean engine.
    pub fn with_engine<F: BooleanEngine>(self, engine: F) -> SketchBuilder<'a, H, F> {
        SketchBuilder {
            host: self.host,
            engine,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    // --- Pipeline ---

    /// Applies one batch of boundary edits as a single rebuild.
    pub fn update(&mut self, batch: EditBatch) -> Result<BuildReport> {
        self.options.validate()?;
        let tolerance = self.options.tolerance;
        let arc_segments = self.options.arc_segments;

        let span = tracing::debug_span!(
            "sketch_rebuild",
            regions = batch.regions.len(),
            paths = batch.paths.len(),
            removed_edges = batch.remove_edges.len(),
            removed_faces = batch.remove_faces.len(),
        );
        let _enter = span.enter();

        let empty;
        let prior = match self.host.sketch() {
            Some(sketch) => sketch,
            None => {
                empty = Sketch::new();
                &empty
            }
        };

        let mut names = prior.names.clone();
        let mut flat = flatten(prior, &batch, &mut names, tolerance, arc_segments)?;
        tracing::debug!(
            curves = flat.edges.len(),
            fill_sources = flat.sources.len(),
            points = flat.points.len(),
            "Flattened sketch and edits"
        );

        let result = if flat.edges.is_empty() {
            BoolResult::default()
        } else {
            self.engine
                .exbool(&flat.edges, tolerance, self.options.bool_options())?
        };
        tracing::debug!(
            pieces = result.edges.len(),
            regions = result.regions.len(),
            "Boolean step complete"
        );

        let reconciled = reconcile(prior, &mut flat, &result, &mut names, tolerance, arc_segments)?;
        let (next, report) = synchronize(prior, &flat, &result, reconciled, names, tolerance)?;

        tracing::info!(
            faces = next.face_count(),
            edges = next.edge_count(),
            points = next.point_count(),
            added = report.added_faces.len(),
            removed = report.removed_faces.len(),
            "Sketch rebuilt"
        );
        self.host.update_sketch(next);
        Ok(report)
    }

    // --- Boundary edits ---

    /// Adds open or closed curve chains. Closed chains enclose a new face;
    /// open ones only split what they cross.
    pub fn add_paths(&mut self, paths: Vec<Vec<BuilderCurve>>) -> Result<BuildReport> {
        self.update(EditBatch {
            paths,
            ..Default::default()
        })
    }

    /// Adds a full circle as a closed region.
    pub fn add_circle_path(
        &mut self,
        center: Point2<f64>,
        radius: f64,
        topology_id: impl Into<String>,
    ) -> Result<BuildReport> {
        self.add_regions(vec![BuilderRegion::circle(topology_id, center, radius)])
    }

    pub fn add_regions(&mut self, regions: Vec<BuilderRegion>) -> Result<BuildReport> {
        self.update(EditBatch {
            regions,
            ..Default::default()
        })
    }

    /// Removes edges. A shared edge merges its two faces; a boundary edge
    /// removes its face.
    pub fn remove_edges(&mut self, edges: Vec<EdgeKey>) -> Result<BuildReport> {
        self.update(EditBatch {
            remove_edges: edges,
            ..Default::default()
        })
    }

    pub fn remove_face(&mut self, face: FaceKey) -> Result<BuildReport> {
        self.remove_faces(vec![face])
    }

    pub fn remove_faces(&mut self, faces: Vec<FaceKey>) -> Result<BuildReport> {
        self.update(EditBatch {
            remove_faces: faces,
            ..Default::default()
        })
    }

    /// Merges faces into one; the largest keeps its name.
    pub fn merge_faces(&mut self, faces: Vec<FaceKey>) -> Result<BuildReport> {
        self.update(EditBatch {
            merge_groups: vec![faces],
            ..Default::default()
        })
    }

    /// Splits `edge` at the point on it closest to `point`.
    pub fn add_split_point(&mut self, point: Point2<f64>, edge: EdgeKey) -> Result<BuildReport> {
        self.update(EditBatch {
            split_points: vec![(point, edge)],
            ..Default::default()
        })
    }

    /// Adds a copy of `face` moved by `offset`, carrying the face's payload.
    pub fn copy_face(&mut self, face: FaceKey, offset: Vector2<f64>) -> Result<BuildReport> {
        self.update(EditBatch {
            copies: vec![(face, offset)],
            ..Default::default()
        })
    }

    /// Removes every face. Guide lines and the background stay.
    pub fn clear(&mut self) -> Result<BuildReport> {
        let Some(prior) = self.host.sketch() else {
            return Ok(BuildReport::default());
        };
        let report = BuildReport {
            removed_faces: prior.faces.values().map(|f| f.name.clone()).collect(),
            ..Default::default()
        };
        let next = prior.next_generation(prior.names.clone());
        tracing::info!(removed = report.removed_faces.len(), "Sketch cleared");
        self.host.update_sketch(next);
        Ok(report)
    }

    // --- Guide lines ---

    /// Adds guide lines, skipping any that repeat an existing one. Returns
    /// the keys of the lines actually added.
    pub fn add_guide_lines(&mut self, curves: Vec<BuilderCurve>) -> Result<Vec<GuideLineKey>> {
        let tolerance = self.options.tolerance;
        self.options.validate()?;
        for c in &curves {
            let length = c.curve.length();
            if length.is_nan() || length < tolerance {
                return Err(Error::DegenerateCurve {
                    id: c.topology_id.clone(),
                    length,
                });
            }
        }

        let mut next = self.current();
        let mut added = Vec::new();
        for c in curves {
            let duplicate = next
                .guide_lines
                .values()
                .any(|g| g.curve.same_span(&c.curve, tolerance));
            if duplicate {
                continue;
            }
            let taken = |n: &str| next.guide_lines.values().any(|g| g.name == n);
            let name = if !c.topology_id.is_empty() && !taken(&c.topology_id) {
                c.topology_id
            } else {
                let mut names = next.names.clone();
                let fresh = names.fresh_guide(taken);
                next.names = names;
                fresh
            };
            added.push(next.guide_lines.insert(GuideLineData {
                curve: c.curve,
                name,
            }));
        }
        tracing::debug!(added = added.len(), "Added guide lines");
        self.host.update_sketch(next);
        Ok(added)
    }

    /// Removes guide lines. Fails without changes if any key is unknown.
    pub fn remove_guide_lines(&mut self, keys: Vec<GuideLineKey>) -> Result<()> {
        let mut next = self.current();
        if let Some(&missing) = keys.iter().find(|&&k| !next.guide_lines.contains_key(k)) {
            return Err(Error::GuideLineNotFound(missing));
        }
        for k in keys {
            next.guide_lines.remove(k);
        }
        self.host.update_sketch(next);
        Ok(())
    }

    // --- Background ---

    /// Stores a region that [`add_background`](Self::add_background) can
    /// re-add later, for example after [`clear`](Self::clear).
    pub fn set_background(&mut self, region: BuilderRegion) {
        let mut next = self.current();
        next.background = Some(region);
        self.host.update_sketch(next);
    }

    /// Adds the stored background region. Does nothing when none is set.
    pub fn add_background(&mut self) -> Result<BuildReport> {
        let background = self.host.sketch().and_then(|s| s.background.clone());
        match background {
            Some(region) => self.add_regions(vec![region]),
            None => Ok(BuildReport::default()),
        }
    }

    // --- Transforms ---

    /// Applies a 2D homogeneous transform to the host's sketch in place.
    pub fn transform(&mut self, matrix: &Matrix3<f64>) -> Result<()> {
        let Some(sketch) = self.host.sketch() else {
            return Ok(());
        };
        let mut next = sketch.clone();
        next.transform(matrix)?;
        self.host.update_sketch(next);
        Ok(())
    }

    // --- Queries ---

    pub fn get_all_points(&self) -> Vec<Point2<f64>> {
        self.host
            .sketch()
            .map(Sketch::get_all_points)
            .unwrap_or_default()
    }

    pub fn get_all_builder_regions(&self) -> Vec<BuilderRegion> {
        self.host
            .sketch()
            .map(Sketch::get_all_builder_regions)
            .unwrap_or_default()
    }

    pub fn find_face_by_coedge(&self, coedge: CoedgeKey) -> Option<FaceKey> {
        self.host.sketch()?.find_face_by_coedge(coedge)
    }

    /// A copy of the host's sketch (or an empty one) to edit outside the
    /// pipeline.
    fn current(&self) -> Sketch<H::Payload> {
        self.host.sketch().cloned().unwrap_or_default()
    }
}
