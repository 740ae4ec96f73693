//! Builders that assemble property bags for composite elements

mod property_facet;

pub use property_facet::PropertyFacetBuilder;
