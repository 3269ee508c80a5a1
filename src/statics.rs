// Central place for non-localized constants.
// Keep literal spellings and defaults out of the engine modules.

// Identifier prefix for controls created without an explicit id.
pub const ID_PREFIX: &str = "selectable-";

// Defaults mirrored by `SelectableConfig::default()`.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_SHOULD_BACKDROP_CLOSE: bool = true;

// Joins the display texts of several committed values.
pub const DISPLAY_SEPARATOR: &str = ", ";

pub const LITERAL_NULL: &str = "null";
