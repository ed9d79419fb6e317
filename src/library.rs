//! Track catalog, directory scanning and the segment exclusion filter.

mod catalog;
mod exclusion;
mod model;
mod scan;

pub use catalog::{Catalog, CatalogHandle, lock_catalog};
pub use exclusion::{ExclusionSet, normalize_segment_name};
pub use model::{Track, TrackId};
pub use scan::scan;
pub(crate) use scan::{has_extension, require_file};
