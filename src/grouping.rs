//! Grouping engine: partitions records into groups by a field path.

use crate::ItemValue;
use crate::classify::ItemModel;
use crate::config::{SelectableConfig, non_blank};

/// An ordered run of items sharing a group key. `key == None` marks the sentinel group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub key: Option<String>,
    pub label: Option<String>,
    pub items: Vec<ItemValue>,
}

impl Group {
    pub fn sentinel(items: Vec<ItemValue>) -> Self {
        Self {
            key: None,
            label: None,
            items,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.key.is_none()
    }
}

/// Grouping applies to records only, and never when a virtualizer groups on its own.
pub fn grouping_enabled(model: &ItemModel, config: &SelectableConfig) -> bool {
    model.is_object() && config.group_key_field().is_some() && !config.has_virtual_scroll
}

/// Partition `items` into groups in first-seen key order.
///
/// Always yields at least one group: consumers bind to the first group even when there is
/// nothing in it.
pub fn group_items(items: &[ItemValue], model: &ItemModel, config: &SelectableConfig) -> Vec<Group> {
    let key_field = match config.group_key_field() {
        Some(field) if grouping_enabled(model, config) && !items.is_empty() => field,
        _ => return vec![Group::sentinel(items.to_vec())],
    };
    let label_field = non_blank(config.group_text_field.as_deref());

    let mut groups: Vec<Group> = Vec::new();
    for item in items {
        let key = field_text(item, key_field);
        match groups.iter_mut().find(|g| g.key.as_deref() == Some(key.as_str())) {
            Some(group) => group.items.push(item.clone()),
            None => groups.push(Group {
                key: Some(key),
                label: label_field.map(|field| field_text(item, field)),
                items: vec![item.clone()],
            }),
        }
    }
    groups
}

/// True when no group holds any item.
pub fn are_groups_empty(groups: &[Group]) -> bool {
    groups.iter().all(|g| g.items.is_empty())
}

fn field_text(item: &ItemValue, field: &str) -> String {
    item.get_path(field)
        .map(ItemValue::text_form)
        .unwrap_or_default()
}
