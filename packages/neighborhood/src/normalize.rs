//! Normalizes raw `GeoJSON` features into [`Neighborhood`] values.
//!
//! Uses the source's name field and [`GeometryExtractor`] to pull the
//! neighborhood name and boundary out of each feature, regardless of how
//! the export names its properties.

use crime_bot_neighborhood_models::{BoundarySource, GeometryExtractor, Neighborhood};
use geo::MultiPolygon;

/// What became of a single feature.
#[derive(Debug)]
pub enum FeatureOutcome {
    /// The feature produced a catalog entry.
    Retained(Neighborhood),
    /// The feature's geometry is `null` or absent.
    NullGeometry,
    /// The feature has no usable name.
    MissingName,
    /// The geometry is not a polygon type, or could not be parsed.
    Unusable {
        /// Description of what went wrong.
        reason: String,
    },
}

/// Normalizes a single `GeoJSON` feature.
#[must_use]
pub fn normalize_feature(feature: &serde_json::Value, source: &BoundarySource) -> FeatureOutcome {
    let geometry = feature.get("geometry").filter(|g| !g.is_null());
    let Some(geometry) = geometry else {
        return FeatureOutcome::NullGeometry;
    };

    let name = feature
        .get("properties")
        .and_then(|props| props.get(&source.name_field))
        .and_then(property_as_name);
    let Some(name) = name else {
        return FeatureOutcome::MissingName;
    };

    let boundary = match source.geometry {
        GeometryExtractor::Geojson => parse_boundary(geometry.clone()),
        GeometryExtractor::EsriRings => esri_to_geojson(geometry)
            .ok_or_else(|| "geometry has no rings".to_string())
            .and_then(parse_boundary),
    };

    match boundary {
        Ok(boundary) => FeatureOutcome::Retained(Neighborhood::new(name, boundary)),
        Err(reason) => FeatureOutcome::Unusable { reason },
    }
}

/// Names are usually strings, but numbered sectors come through as numbers.
fn property_as_name(value: &serde_json::Value) -> Option<String> {
    let name = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

/// Parses a `GeoJSON` geometry object into a non-empty [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn parse_boundary(geometry: serde_json::Value) -> Result<MultiPolygon<f64>, String> {
    let geometry: geojson::Geometry =
        serde_json::from_value(geometry).map_err(|e| format!("invalid GeoJSON geometry: {e}"))?;
    let geometry: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| format!("unconvertible geometry: {e}"))?;

    let boundary = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        other => {
            return Err(format!(
                "unsupported geometry type {}",
                geometry_type_name(&other)
            ));
        }
    };

    if boundary.0.is_empty() || boundary.0.iter().all(|p| p.exterior().0.is_empty()) {
        return Err("empty polygon".to_string());
    }

    Ok(boundary)
}

const fn geometry_type_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

/// Converts Esri JSON geometry (`{ "rings": [...] }`) to a `GeoJSON`
/// Polygon/`MultiPolygon`.
///
/// Esri rings carry no nesting, so multiple rings become one single-ring
/// polygon each.
fn esri_to_geojson(esri_geom: &serde_json::Value) -> Option<serde_json::Value> {
    let rings = esri_geom.get("rings")?.as_array()?;

    if rings.is_empty() {
        return None;
    }

    if rings.len() == 1 {
        Some(serde_json::json!({
            "type": "Polygon",
            "coordinates": rings,
        }))
    } else {
        let polygons: Vec<serde_json::Value> =
            rings.iter().map(|ring| serde_json::json!([ring])).collect();

        Some(serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": polygons,
        }))
    }
}
