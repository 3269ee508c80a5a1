//! Value synchronization between the externally bound value and the internal selection.
//!
//! The control keeps the two in step through [`resolve_value`] (external to internal) and
//! [`encode_value`] (internal to external). Writes the control makes itself are tagged with
//! a [`ReentrancyGuard`] so the observer of the external value skips exactly one echo.

use crate::classify::ItemModel;
use crate::error::ConfigError;
use crate::ItemValue;
use std::slice;

/// Where a write to the external value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Internal,
    External,
}

/// One-shot "ignore the next echo" marker.
///
/// Armed right before the control writes the external value; the value observer consumes
/// it, after which writes count as external again.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    armed: bool,
}

impl ReentrancyGuard {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Returns whether the observed change was internal, and resets the guard.
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

/// What the value resolver needs to know about the control.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub id: &'a str,
    pub items: &'a [ItemValue],
    pub model: &'a ItemModel,
    pub multiple: bool,
}

/// Null and empty strings mean "nothing selected".
pub fn is_empty_value(value: &ItemValue) -> bool {
    match value {
        ItemValue::Null => true,
        ItemValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// The canonical "nothing selected" value for a mode.
pub fn empty_value(multiple: bool) -> ItemValue {
    if multiple {
        ItemValue::Array(Vec::new())
    } else {
        ItemValue::Null
    }
}

/// Decode a string-encoded value (a JSON5 list or object literal; single quotes allowed).
pub fn parse_encoded_value(id: &str, text: &str) -> Result<ItemValue, ConfigError> {
    if text.trim().is_empty() {
        return Ok(ItemValue::Null);
    }
    ItemValue::parse_json5(text).map_err(|e| ConfigError::MalformedValue {
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Map an external value onto stored values of items in the current collection.
///
/// Shape errors fail the whole call; references to items that are not in the collection
/// are dropped. Single selection keeps the last resolved element.
pub fn resolve_value(value: &ItemValue, ctx: ResolveContext<'_>) -> Result<Vec<ItemValue>, ConfigError> {
    if is_empty_value(value) {
        return Ok(Vec::new());
    }

    let (elements, is_array) = match value {
        ItemValue::Array(values) => (values.as_slice(), true),
        other => (slice::from_ref(other), false),
    };
    let id = || ctx.id.to_string();

    if ctx.multiple && !is_array {
        return Err(ConfigError::ValueMustBeArray { id: id() });
    }
    if !ctx.multiple && is_array {
        return Err(ConfigError::ValueMustBeScalar { id: id() });
    }

    let stores_key = ctx.model.stores_item_value();
    for element in elements {
        let structured = matches!(element, ItemValue::Object(_) | ItemValue::Array(_));
        if stores_key && structured {
            return Err(ConfigError::ValueMustBePrimitive { id: id() });
        }
        if !stores_key && !structured {
            return Err(ConfigError::ValueMustBeObject { id: id() });
        }
    }

    let mut resolved: Vec<ItemValue> = elements
        .iter()
        .filter_map(|element| {
            let key = if element.is_structured() {
                ctx.model.key_of(element)
            } else {
                element.clone()
            };
            ctx.model
                .find(ctx.items, &key)
                .map(|item| ctx.model.stored_form(item))
        })
        .collect();

    if !ctx.multiple {
        resolved = resolved.pop().into_iter().collect();
    }
    Ok(resolved)
}

/// The external form of a list of stored values.
pub fn encode_value(stored: &[ItemValue], multiple: bool) -> ItemValue {
    if multiple {
        ItemValue::Array(stored.to_vec())
    } else {
        stored.last().cloned().unwrap_or_default()
    }
}
