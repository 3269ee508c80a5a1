//! Headless engine for a searchable, groupable select control.
//! Classifies item collections, keeps an externally bound value in step with the internal
//! selection, and filters and groups items for whatever presents them.

mod classify;
mod config;
mod error;
mod events;
mod filter;
mod grouping;
mod ids;
mod presenter;
mod selectable;
pub mod statics;
mod sync;
mod value;

pub use classify::{ItemModel, RepresentationMode, classify};
pub use config::{Manifest, SelectableConfig};
pub use error::{ConfigError, OperationError};
pub use events::{EventBus, EventLog, Notification, SelectableEvent, SelectableObserver, StyleState};
pub use filter::{FilterOutcome, FilterPass, filter_groups, normalize_search, run_filter};
pub use grouping::{Group, are_groups_empty, group_items, grouping_enabled};
pub use ids::IdGenerator;
pub use presenter::{HeadlessPresenter, PresentHandle, PresentRequest, Presenter, ViewSnapshot};
pub use selectable::{LabelText, Selectable, SelectableBuilder};
pub use sync::{Origin, ReentrancyGuard, ResolveContext, encode_value, parse_encoded_value, resolve_value};
pub use value::{ItemValue, Number};
