#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-in-polygon neighborhood resolution.
//!
//! Maps a coordinate to the first neighborhood in catalog order whose
//! boundary contains it. Containment uses [`geo::Contains`] and is
//! boundary-exclusive: a point exactly on an edge or vertex is not inside.
//!
//! Two strategies give identical answers. [`ResolverStrategy::Linear`]
//! tests every boundary in order. [`ResolverStrategy::Indexed`] prunes with
//! an R-tree over boundary envelopes, then picks the lowest catalog
//! position among the candidates that contain the point.

use crime_bot_crime_models::{AxisOrder, Coordinate};
use crime_bot_neighborhood::PolygonCatalog;
use crime_bot_neighborhood_models::Neighborhood;
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Converts a coordinate to a planar point under the given axis order.
#[must_use]
pub fn to_point(coordinate: Coordinate, axis: AxisOrder) -> Point<f64> {
    let (x, y) = axis.xy(coordinate);
    Point::new(x, y)
}

/// Returns `true` if `point` lies strictly inside `boundary`.
#[must_use]
pub fn contains(boundary: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    boundary.contains(point)
}

/// Outcome of a neighborhood lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The first neighborhood in catalog order containing the point.
    Found(&'a Neighborhood),
    /// No neighborhood contains the point.
    NotFound,
}

impl<'a> Resolution<'a> {
    /// Returns the resolved neighborhood, if any.
    #[must_use]
    pub const fn neighborhood(&self) -> Option<&'a Neighborhood> {
        match *self {
            Self::Found(nbhd) => Some(nbhd),
            Self::NotFound => None,
        }
    }

    /// Returns `true` if a neighborhood was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Linear scan over the catalog; first match in catalog order wins.
#[must_use]
pub fn resolve(point: Point<f64>, catalog: &PolygonCatalog) -> Resolution<'_> {
    catalog
        .all()
        .iter()
        .find(|nbhd| contains(nbhd.boundary(), &point))
        .map_or(Resolution::NotFound, Resolution::Found)
}

/// How [`NeighborhoodResolver`] searches the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolverStrategy {
    /// Test every boundary in catalog order.
    #[default]
    Linear,
    /// Prune candidates with an R-tree over boundary envelopes.
    Indexed,
}

/// A boundary envelope stored in the R-tree, pointing back at its catalog
/// position.
#[derive(Debug)]
struct BoundaryEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Owns the polygon catalog and answers coordinate lookups against it.
///
/// Constructed once at startup and shared read-only across queries.
#[derive(Debug)]
pub struct NeighborhoodResolver {
    catalog: PolygonCatalog,
    axis: AxisOrder,
    index: Option<RTree<BoundaryEntry>>,
}

impl NeighborhoodResolver {
    /// Creates a resolver, building the R-tree if `strategy` asks for one.
    #[must_use]
    pub fn new(catalog: PolygonCatalog, strategy: ResolverStrategy, axis: AxisOrder) -> Self {
        let index = match strategy {
            ResolverStrategy::Linear => None,
            ResolverStrategy::Indexed => {
                let entries = catalog
                    .all()
                    .iter()
                    .enumerate()
                    .map(|(position, nbhd)| BoundaryEntry {
                        position,
                        envelope: compute_envelope(nbhd.boundary()),
                    })
                    .collect();
                let tree = RTree::bulk_load(entries);
                log::info!("Built spatial index over {} neighborhoods", tree.size());
                Some(tree)
            }
        };

        Self {
            catalog,
            axis,
            index,
        }
    }

    /// Resolves a coordinate, converting it with the configured axis order.
    #[must_use]
    pub fn resolve(&self, coordinate: Coordinate) -> Resolution<'_> {
        let resolution = self.resolve_point(to_point(coordinate, self.axis));
        match resolution {
            Resolution::Found(nbhd) => log::debug!("{coordinate} resolved to '{}'", nbhd.name()),
            Resolution::NotFound => log::debug!("{coordinate} is outside every neighborhood"),
        }
        resolution
    }

    /// Resolves a point already in the catalog's axis order.
    #[must_use]
    pub fn resolve_point(&self, point: Point<f64>) -> Resolution<'_> {
        let Some(index) = &self.index else {
            return resolve(point, &self.catalog);
        };

        let neighborhoods = self.catalog.all();
        let query_env = AABB::from_point([point.x(), point.y()]);

        index
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| contains(neighborhoods[entry.position].boundary(), &point))
            .map(|entry| entry.position)
            .min()
            .map_or(Resolution::NotFound, |position| {
                Resolution::Found(&neighborhoods[position])
            })
    }

    /// The catalog this resolver searches.
    #[must_use]
    pub const fn catalog(&self) -> &PolygonCatalog {
        &self.catalog
    }

    /// Axis order used to convert query coordinates.
    #[must_use]
    pub const fn axis(&self) -> AxisOrder {
        self.axis
    }

    /// The active search strategy.
    #[must_use]
    pub const fn strategy(&self) -> ResolverStrategy {
        if self.index.is_some() {
            ResolverStrategy::Indexed
        } else {
            ResolverStrategy::Linear
        }
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
