//! Resolution of the entities referenced by a route.

use crate::error::Error;
use netex_model::{NetexEntitiesIndex, Route, RoutePoint};
use rustc_hash::FxHashSet;

/// The route points referenced by a route.
///
/// The route carried here is a copy of the source route whose point
/// references are pinned to the versions of the resolved route points. The
/// collected route points are deduplicated (a circular route visits its
/// terminus twice) but keep the order in which the route first visits them.
#[derive(Debug, Clone)]
pub struct RouteReferences {
    pub route: Route,
    pub route_points: Vec<RoutePoint>,
}

impl RouteReferences {
    /// Resolves every point of the route's ordered point sequence against the
    /// common file.
    pub fn resolve(
        route: &Route,
        common_index: &NetexEntitiesIndex,
    ) -> Result<RouteReferences, Error> {
        let mut route = route.clone();
        let mut route_points = Vec::with_capacity(route.points_in_sequence.len());
        let mut seen = FxHashSet::default();

        for point_on_route in &mut route.points_in_sequence {
            let route_point = common_index
                .route_point(&point_on_route.point_ref.id)
                .ok_or_else(|| Error::ReferenceError(point_on_route.point_ref.id.clone()))?;
            point_on_route.point_ref = point_on_route.point_ref.pinned_to(&route_point.version);
            if seen.insert(route_point.id.clone()) {
                route_points.push(route_point.clone());
            }
        }

        Ok(RouteReferences {
            route,
            route_points,
        })
    }
}
