//! Filter engine: narrows grouped items to those whose display text matches a search.

use crate::classify::ItemModel;
use crate::grouping::{Group, are_groups_empty};

/// Result of one filter pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPass {
    /// Filtering belongs to an external observer; only the search text was normalized.
    Delegated { search_text: String },
    Local(FilterOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub search_text: String,
    pub groups: Vec<Group>,
    /// Drives the search-succeeded / search-failed signal.
    pub has_items: bool,
}

/// Trimmed search text; whitespace-only input becomes empty.
pub fn normalize_search(text: &str) -> String {
    text.trim().to_string()
}

pub fn run_filter(groups: &[Group], search_text: &str, delegate: bool, model: &ItemModel) -> FilterPass {
    let search_text = normalize_search(search_text);
    if delegate {
        return FilterPass::Delegated { search_text };
    }
    FilterPass::Local(filter_groups(groups, &search_text, model))
}

/// Keep items whose display text contains the search text, case-insensitively.
///
/// Groups left empty are dropped; when nothing survives a single sentinel group marks the
/// empty result.
pub fn filter_groups(groups: &[Group], search_text: &str, model: &ItemModel) -> FilterOutcome {
    let search_text = normalize_search(search_text);
    if search_text.is_empty() {
        return FilterOutcome {
            has_items: !are_groups_empty(groups),
            groups: groups.to_vec(),
            search_text,
        };
    }

    let needle = search_text.to_lowercase();
    let mut filtered: Vec<Group> = groups
        .iter()
        .filter_map(|group| {
            let items: Vec<_> = group
                .items
                .iter()
                .filter(|item| model.display_text(item).to_lowercase().contains(&needle))
                .cloned()
                .collect();
            (!items.is_empty()).then(|| Group {
                key: group.key.clone(),
                label: group.label.clone(),
                items,
            })
        })
        .collect();

    if filtered.is_empty() {
        filtered.push(Group::sentinel(Vec::new()));
    }

    FilterOutcome {
        has_items: !are_groups_empty(&filtered),
        groups: filtered,
        search_text,
    }
}
