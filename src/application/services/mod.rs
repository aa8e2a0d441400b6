//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (TaxonomyProvider, AnalyticsSink)
//! but are themselves concrete structs, not traits.

mod catalog;
mod expansion;
mod facet;

pub use catalog::{sort_by_text, TaxonomyCatalog};
pub use expansion::{
    BootstrapReport, ExpansionEngine, ExpansionPolicy, NodeView, ToggleOutcome,
};
pub use facet::FacetTree;
