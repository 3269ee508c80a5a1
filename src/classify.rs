//! Item classification: decides once per item collection whether items are primitives or
//! records, validates the field configuration against that, and carries the result to
//! every component that needs to read keys, texts or stored forms.

use crate::config::{SelectableConfig, non_blank};
use crate::error::ConfigError;
use crate::ItemValue;

pub const FIELD_ITEM_VALUE: &str = "itemValueField";
pub const FIELD_ITEM_TEXT: &str = "itemTextField";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationMode {
    Primitive,
    Object,
}

/// Classifier output. Fixed until the item collection or the field configuration changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemModel {
    mode: RepresentationMode,
    store_item_value: bool,
    value_field: Option<String>,
    text_field: Option<String>,
}

impl ItemModel {
    pub fn mode(&self) -> RepresentationMode {
        self.mode
    }

    pub fn is_object(&self) -> bool {
        self.mode == RepresentationMode::Object
    }

    /// Storage policy: `true` stores keys, `false` stores whole items.
    pub fn stores_item_value(&self) -> bool {
        self.store_item_value
    }

    /// Identity of an item: the key field of a record, or the primitive itself.
    pub fn key_of(&self, item: &ItemValue) -> ItemValue {
        match (&self.mode, &self.value_field) {
            (RepresentationMode::Object, Some(field)) => {
                item.get_path(field).cloned().unwrap_or_default()
            }
            _ => item.clone(),
        }
    }

    /// What the selection set and the external value hold for `item`.
    pub fn stored_form(&self, item: &ItemValue) -> ItemValue {
        if self.is_object() && self.store_item_value {
            self.key_of(item)
        } else {
            item.clone()
        }
    }

    /// Identity of something already in stored form.
    pub fn key_of_stored(&self, stored: &ItemValue) -> ItemValue {
        if self.is_object() && !self.store_item_value {
            self.key_of(stored)
        } else {
            stored.clone()
        }
    }

    /// Text shown for an item and matched by the filter.
    pub fn display_text(&self, item: &ItemValue) -> String {
        match (&self.mode, &self.text_field) {
            (RepresentationMode::Object, Some(field)) => item
                .get_path(field)
                .map(ItemValue::text_form)
                .unwrap_or_default(),
            _ => item.text_form(),
        }
    }

    /// Resolve an arbitrary key back to an item of the collection.
    pub fn find<'a>(&self, items: &'a [ItemValue], key: &ItemValue) -> Option<&'a ItemValue> {
        items.iter().find(|item| self.key_of(item).key_eq(key))
    }
}

/// Inspect `items` and validate `config` against the detected representation mode.
pub fn classify(
    id: &str,
    items: &[ItemValue],
    config: &SelectableConfig,
) -> Result<ItemModel, ConfigError> {
    let value_field = non_blank(config.item_value_field.as_deref());
    let text_field = non_blank(config.item_text_field.as_deref());

    let mode = detect_mode(id, items)?.unwrap_or(
        // Nothing to inspect yet: trust the field configuration.
        if value_field.is_some() {
            RepresentationMode::Object
        } else {
            RepresentationMode::Primitive
        },
    );

    match mode {
        RepresentationMode::Object => {
            require_field(id, value_field, FIELD_ITEM_VALUE)?;
            require_field(id, text_field, FIELD_ITEM_TEXT)?;
        }
        RepresentationMode::Primitive => {
            forbid_field(id, value_field, FIELD_ITEM_VALUE)?;
            forbid_field(id, text_field, FIELD_ITEM_TEXT)?;
        }
    }

    let store_item_value = match (mode, config.should_store_item_value) {
        (RepresentationMode::Primitive, Some(false)) => {
            return Err(ConfigError::PrimitiveMustStoreValue { id: id.to_string() });
        }
        (RepresentationMode::Primitive, _) => true,
        (RepresentationMode::Object, stored) => stored.unwrap_or(false),
    };

    Ok(ItemModel {
        mode,
        store_item_value,
        value_field: value_field.map(str::to_string),
        text_field: text_field.map(str::to_string),
    })
}

fn detect_mode(id: &str, items: &[ItemValue]) -> Result<Option<RepresentationMode>, ConfigError> {
    let mut detected = None;
    for (index, item) in items.iter().enumerate() {
        let mode = if item.is_structured() {
            RepresentationMode::Object
        } else if item.is_primitive() {
            RepresentationMode::Primitive
        } else {
            return Err(ConfigError::UnsupportedItem {
                id: id.to_string(),
                index,
                kind: item.type_name(),
            });
        };

        match detected {
            None => detected = Some(mode),
            Some(first) if first != mode => {
                return Err(ConfigError::MixedItems {
                    id: id.to_string(),
                    index,
                });
            }
            Some(_) => {}
        }
    }
    Ok(detected)
}

fn require_field(id: &str, field: Option<&str>, name: &'static str) -> Result<(), ConfigError> {
    match field {
        Some(_) => Ok(()),
        None => Err(ConfigError::ObjectFieldRequired {
            id: id.to_string(),
            field: name,
        }),
    }
}

fn forbid_field(id: &str, field: Option<&str>, name: &'static str) -> Result<(), ConfigError> {
    match field {
        Some(_) => Err(ConfigError::PrimitiveFieldForbidden {
            id: id.to_string(),
            field: name,
        }),
        None => Ok(()),
    }
}
