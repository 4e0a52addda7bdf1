//! Built-in interchange kit - geometry, built elements and a host converter
//!
//! Provides a ready-made catalog for the demo binary and tests:
//! - `geometry`: points, lines, polylines and polycurves
//! - `elements`: levels, walls, beams and floors
//! - `other`: miscellaneous annotation types
//! - `host`: a host-side value model and its domain converter

pub mod elements;
pub mod geometry;
pub mod host;
pub mod other;

use crate::catalog::TemplateCatalog;
use crate::model::CastTable;

/// Catalog of every schema type in the kit
pub fn catalog() -> TemplateCatalog {
    let mut catalog = TemplateCatalog::new();
    for schema_type in geometry::types()
        .into_iter()
        .chain(elements::types())
        .chain(other::types())
    {
        catalog.register_type(schema_type);
    }
    catalog
}

/// Explicit casts between kit object types
pub fn casts() -> CastTable {
    let mut casts = CastTable::new();
    casts.register(
        geometry::POLYLINE_TYPE,
        geometry::POLYCURVE_TYPE,
        geometry::polyline_to_polycurve,
    );
    casts.register(geometry::LINE_TYPE, geometry::POLYCURVE_TYPE, geometry::line_to_polycurve);
    casts
}
