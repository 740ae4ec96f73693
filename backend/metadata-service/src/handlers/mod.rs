//! Typed façades over the metadata graph
//!
//! Every handler wraps a [`GenericHandler`] labelled with its own name so
//! that operation metrics are reported per handler.

pub mod generic;
mod glossary_term;
mod property_facet;
mod reference_value;
mod relational_data;

pub use generic::{GenericHandler, LinkEnd, SearchOptions};
pub use glossary_term::GlossaryTermHandler;
pub use property_facet::{PropertyFacetHandler, VENDOR_PROPERTIES_SOURCE};
pub use reference_value::ReferenceValueHandler;
pub use relational_data::RelationalDataHandler;
