//! Configuration surface of a selectable control, loadable from JSON5.

use crate::error::ConfigError;
use crate::{ItemValue, statics};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Recognized options. Field names follow the camelCase spelling used in manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectableConfig {
    /// Explicit identifier; unnamed controls draw one from an `IdGenerator`.
    pub id: Option<String>,
    pub is_multiple: bool,
    /// Always effectively true when `is_multiple` is set.
    pub has_confirm_button: bool,
    pub can_clear: bool,
    pub can_add_item: bool,
    pub can_search: bool,
    pub should_delegate_search_to_event: bool,
    /// Presentation concern; carried for the presenter, never applied by the engine.
    pub search_debounce: u64,
    pub search_text: String,
    pub item_value_field: Option<String>,
    pub item_text_field: Option<String>,
    pub group_value_field: Option<String>,
    pub group_text_field: Option<String>,
    /// `None` lets the classifier pick: forced on for primitives, off for objects.
    pub should_store_item_value: Option<bool>,
    /// An external virtualizer groups on its own, which disables the grouping engine.
    pub has_virtual_scroll: bool,
    pub has_infinite_scroll: bool,
    pub should_backdrop_close: bool,
    pub modal_css_class: Option<String>,
    pub placeholder: Option<String>,
    pub selected_text: Option<String>,
    pub is_disabled: bool,
    pub disabled_items: Vec<ItemValue>,
}

impl Default for SelectableConfig {
    fn default() -> Self {
        Self {
            id: None,
            is_multiple: false,
            has_confirm_button: false,
            can_clear: false,
            can_add_item: false,
            can_search: false,
            should_delegate_search_to_event: false,
            search_debounce: statics::DEFAULT_SEARCH_DEBOUNCE_MS,
            search_text: String::new(),
            item_value_field: None,
            item_text_field: None,
            group_value_field: None,
            group_text_field: None,
            should_store_item_value: None,
            has_virtual_scroll: false,
            has_infinite_scroll: false,
            should_backdrop_close: statics::DEFAULT_SHOULD_BACKDROP_CLOSE,
            modal_css_class: None,
            placeholder: None,
            selected_text: None,
            is_disabled: false,
            disabled_items: Vec::new(),
        }
    }
}

impl SelectableConfig {
    /// Confirm mode: multiple selection always confirms explicitly.
    pub fn confirms(&self) -> bool {
        self.is_multiple || self.has_confirm_button
    }

    /// Field path for group keys, falling back to the group label field.
    pub fn group_key_field(&self) -> Option<&str> {
        non_blank(self.group_value_field.as_deref())
            .or_else(|| non_blank(self.group_text_field.as_deref()))
    }

    pub fn footer_button_count(&self) -> usize {
        usize::from(self.can_clear) + usize::from(self.confirms()) + usize::from(self.can_add_item)
    }
}

/// A config plus the data it is applied to, as stored in a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    #[serde(flatten)]
    pub config: SelectableConfig,
    /// Must be an array; kept loose so the shape is validated with a proper error.
    pub items: ItemValue,
    pub value: ItemValue,
}

impl Manifest {
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        json5::from_str::<Manifest>(text).map_err(|e| ConfigError::MalformedConfig {
            message: e.to_string(),
        })
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        let manifest =
            Self::from_json5(&text).with_context(|| format!("parsing manifest {path:?}"))?;
        Ok(manifest)
    }
}

/// `None` for absent, empty or whitespace-only text.
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}
