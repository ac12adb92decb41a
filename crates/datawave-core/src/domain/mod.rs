//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QueryParameters`] | Immutable query definition sent on session create |
//! | [`RawPage`] | One `next.json` page in the service's nested wire shape |
//! | [`NormalizedRecord`] | Flattened field-name → value event |
//! | [`QueryMetadata`] | Query-level facts captured after the last page |
//! | [`QueryResults`] | Metadata plus accumulated events, the persisted artifact |

mod metadata;
mod page;
mod params;
mod record;

pub use metadata::{now_unix_ms, QueryMetadata, QueryResults};
pub use page::{RawEvent, RawField, RawPage, RawValue};
pub use params::QueryParameters;
pub use record::NormalizedRecord;
