//! The selectable control: owns items, groups, the selection and the bound value, and keeps
//! them consistent across user interaction and external writes.

use crate::classify::{ItemModel, RepresentationMode, classify};
use crate::config::{Manifest, SelectableConfig, non_blank};
use crate::error::{ConfigError, OperationError};
use crate::events::{EventBus, Notification, SelectableObserver, StyleState};
use crate::filter::{FilterPass, normalize_search, run_filter};
use crate::grouping::{Group, are_groups_empty, group_items};
use crate::ids::IdGenerator;
use crate::presenter::{HeadlessPresenter, PresentHandle, PresentRequest, Presenter, ViewSnapshot};
use crate::sync::{
    Origin, ReentrancyGuard, ResolveContext, empty_value, encode_value, is_empty_value,
    parse_encoded_value, resolve_value,
};
use crate::{ItemValue, statics};
use tracing::{debug, trace, warn};

/// Text shown in the closed control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelText {
    pub text: String,
    pub is_placeholder: bool,
}

pub struct SelectableBuilder {
    config: SelectableConfig,
    items: ItemValue,
    value: ItemValue,
    presenter: Option<Box<dyn Presenter>>,
    events: EventBus,
}

impl SelectableBuilder {
    pub fn items(mut self, items: Vec<ItemValue>) -> Self {
        self.items = ItemValue::Array(items);
        self
    }

    pub fn value(mut self, value: ItemValue) -> Self {
        self.value = value;
        self
    }

    pub fn presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Observers attached here also see the notifications emitted while loading.
    pub fn observer(mut self, observer: impl SelectableObserver + 'static) -> Self {
        self.events.subscribe(observer);
        self
    }

    /// Classify and group the items, apply the initial value, and mark the control loaded.
    pub fn build(self, ids: &IdGenerator) -> Result<Selectable, ConfigError> {
        let id = non_blank(self.config.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| ids.next_id());
        let items = items_from_value(&id, self.items)?;
        let model = classify(&id, &items, &self.config)?;
        let groups = group_items(&items, &model, &self.config);

        let mut selectable = Selectable {
            has_search_text: !normalize_search(&self.config.search_text).is_empty(),
            has_filtered_items: !are_groups_empty(&groups),
            filtered_groups: groups.clone(),
            groups,
            id,
            config: self.config,
            items,
            model,
            value: ItemValue::Null,
            value_items: Vec::new(),
            selected: Vec::new(),
            staged: Vec::new(),
            value_guard: ReentrancyGuard::default(),
            is_inited: false,
            overlay: None,
            presenter: self
                .presenter
                .unwrap_or_else(|| Box::new(HeadlessPresenter::default()) as Box<dyn Presenter>),
            events: self.events,
        };

        selectable.apply_value(self.value, Origin::Internal)?;
        selectable.is_inited = true;
        selectable.emit_style();
        debug!(id = %selectable.id, items = selectable.items.len(), "selectable loaded");
        Ok(selectable)
    }
}

pub struct Selectable {
    id: String,
    config: SelectableConfig,
    items: Vec<ItemValue>,
    model: ItemModel,
    groups: Vec<Group>,
    filtered_groups: Vec<Group>,
    has_filtered_items: bool,
    has_search_text: bool,
    /// The externally bound value.
    value: ItemValue,
    /// Stored values of the committed value.
    value_items: Vec<ItemValue>,
    selected: Vec<ItemValue>,
    /// Selection snapshot awaiting confirmation.
    staged: Vec<ItemValue>,
    value_guard: ReentrancyGuard,
    is_inited: bool,
    /// `Some` while open.
    overlay: Option<PresentHandle>,
    presenter: Box<dyn Presenter>,
    events: EventBus,
}

impl std::fmt::Debug for Selectable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selectable")
            .field("id", &self.id)
            .field("mode", &self.model.mode())
            .field("items", &self.items.len())
            .field("value", &self.value)
            .field("selected", &self.selected)
            .field("staged", &self.staged)
            .field("is_open", &self.is_open())
            .finish()
    }
}

impl Selectable {
    pub fn builder(config: SelectableConfig) -> SelectableBuilder {
        SelectableBuilder {
            config,
            items: ItemValue::Array(Vec::new()),
            value: ItemValue::Null,
            presenter: None,
            events: EventBus::default(),
        }
    }

    pub fn from_manifest(manifest: Manifest) -> SelectableBuilder {
        let mut builder = Self::builder(manifest.config);
        if manifest.items != ItemValue::Null {
            builder.items = manifest.items;
        }
        builder.value = manifest.value;
        builder
    }

    pub fn subscribe(&mut self, observer: impl SelectableObserver + 'static) {
        self.events.subscribe(observer);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &SelectableConfig {
        &self.config
    }

    pub fn mode(&self) -> RepresentationMode {
        self.model.mode()
    }

    pub fn items(&self) -> &[ItemValue] {
        &self.items
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn filtered_groups(&self) -> &[Group] {
        &self.filtered_groups
    }

    pub fn has_filtered_items(&self) -> bool {
        self.has_filtered_items
    }

    pub fn value(&self) -> &ItemValue {
        &self.value
    }

    pub fn selected_items(&self) -> &[ItemValue] {
        &self.selected
    }

    /// Items selected and awaiting confirmation.
    pub fn staged_items(&self) -> &[ItemValue] {
        &self.staged
    }

    pub fn is_open(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled
    }

    pub fn search_text(&self) -> &str {
        &self.config.search_text
    }

    pub fn has_search_text(&self) -> bool {
        self.has_search_text
    }

    pub fn footer_button_count(&self) -> usize {
        self.config.footer_button_count()
    }

    pub fn has_value(&self) -> bool {
        !self.value_items.is_empty()
    }

    /// Compact JSON of the committed value, as mirrored into a form field.
    pub fn serialized_value(&self) -> String {
        encode_value(&self.value_items, self.config.is_multiple).to_json5_compact()
    }

    pub fn label_text(&self) -> LabelText {
        let text = match non_blank(self.config.selected_text.as_deref()) {
            Some(text) => text.to_string(),
            None => self
                .value_items
                .iter()
                .filter_map(|stored| {
                    let key = self.model.key_of_stored(stored);
                    self.model.find(&self.items, &key)
                })
                .map(|item| self.model.display_text(item))
                .collect::<Vec<_>>()
                .join(statics::DISPLAY_SEPARATOR),
        };

        match &self.config.placeholder {
            Some(placeholder) if text.is_empty() => LabelText {
                text: placeholder.clone(),
                is_placeholder: true,
            },
            _ => LabelText {
                text,
                is_placeholder: false,
            },
        }
    }

    pub fn is_item_selected(&self, item: &ItemValue) -> bool {
        self.contains(&self.selected, item)
    }

    /// Whether `item` is part of the committed value.
    pub fn is_item_value(&self, item: &ItemValue) -> bool {
        self.contains(&self.value_items, item)
    }

    pub fn is_item_disabled(&self, item: &ItemValue) -> bool {
        let key = self.model.key_of(item);
        self.config
            .disabled_items
            .iter()
            .any(|disabled| self.reference_key(disabled).key_eq(&key))
    }

    pub fn set_items(&mut self, items: Vec<ItemValue>) -> Result<(), ConfigError> {
        let model = classify(&self.id, &items, &self.config).inspect_err(|e| {
            warn!(id = %self.id, error = %e, "rejected item collection");
        })?;
        debug!(id = %self.id, items = items.len(), mode = ?model.mode(), "items replaced");
        let previous = std::mem::replace(&mut self.model, model);
        self.items = items;
        self.rebase_selection(&previous);
        self.regroup();
        Ok(())
    }

    /// Replace items from a loosely typed value, which must be an array.
    pub fn set_items_from_value(&mut self, items: ItemValue) -> Result<(), ConfigError> {
        let items = items_from_value(&self.id, items)?;
        self.set_items(items)
    }

    /// External write of the bound value.
    pub fn set_value(&mut self, value: ItemValue) -> Result<(), ConfigError> {
        let previous = std::mem::replace(&mut self.value, value);
        if let Err(e) = self.observe_value_change() {
            warn!(id = %self.id, error = %e, "rejected value");
            self.value = previous;
            return Err(e);
        }
        Ok(())
    }

    /// External write of a string-encoded value such as `"[{'id': 1}]"`.
    pub fn set_value_encoded(&mut self, text: &str) -> Result<(), ConfigError> {
        let value = parse_encoded_value(&self.id, text)?;
        self.set_value(value)
    }

    /// Commit stored values as the new bound value.
    pub fn commit(&mut self, stored: &[ItemValue]) -> Result<(), ConfigError> {
        debug!(id = %self.id, count = stored.len(), "commit value");
        let value = encode_value(stored, self.config.is_multiple);
        self.apply_value(value, Origin::Internal)
    }

    /// The user activated `item` in the open list.
    pub fn toggle_item(&mut self, item: &ItemValue) -> Result<(), OperationError> {
        if !self.is_open() {
            return Err(OperationError::NotOpen {
                id: self.id.clone(),
            });
        }
        if self.is_item_disabled(item) {
            return Err(OperationError::ItemDisabled {
                id: self.id.clone(),
            });
        }

        let was_selected = self.is_item_selected(item);
        if self.config.confirms() {
            if !self.config.is_multiple {
                // At most one item may be staged.
                self.selected.clear();
            }
            if was_selected {
                self.remove_selected(item);
            } else {
                self.selected.push(self.model.stored_form(item));
            }
            self.staged = self.selected.clone();
            self.refresh_view();
            // Staged items are in place before observers hear about the toggle.
            self.publish(Notification::Selected {
                item: item.clone(),
                is_selected: !was_selected,
            });
            return Ok(());
        }

        if self.config.is_disabled {
            return Err(OperationError::AlreadyClosedOrDisabled {
                id: self.id.clone(),
            });
        }
        if !self.is_item_value(item) {
            let stored = self.model.stored_form(item);
            self.selected = vec![stored.clone()];
            self.publish(Notification::Selected {
                item: item.clone(),
                is_selected: true,
            });
            self.commit(&[stored])?;
        }
        self.close()
    }

    /// Commit the selection: all of it when multiple, the staged item in confirm mode.
    pub fn confirm(&mut self) -> Result<(), ConfigError> {
        if self.config.is_multiple {
            let selected = self.selected.clone();
            self.commit(&selected)
        } else if self.config.has_confirm_button {
            let first: Vec<_> = self.selected.first().cloned().into_iter().collect();
            self.commit(&first)
        } else {
            Ok(())
        }
    }

    pub fn confirm_selection(&mut self) -> Result<(), OperationError> {
        self.confirm()?;
        self.close()
    }

    /// Drop the selection and staged items. The bound value is left for the caller to commit.
    pub fn clear(&mut self) {
        self.publish(Notification::Cleared {
            items: self.selected.clone(),
        });
        self.selected.clear();
        self.staged.clear();
        self.refresh_view();
    }

    pub fn open(&mut self) -> Result<(), OperationError> {
        if self.config.is_disabled || self.is_open() {
            return Err(OperationError::AlreadyOpenOrDisabled {
                id: self.id.clone(),
            });
        }

        let request = PresentRequest {
            control_id: self.id.clone(),
            backdrop_dismiss: self.config.should_backdrop_close,
            css_class: self.config.modal_css_class.clone(),
        };
        let handle = self
            .presenter
            .present(&request)
            .map_err(OperationError::Presentation)?;
        self.overlay = Some(handle);
        // Refresh a stale filter from the previous session.
        let search_text = self.config.search_text.clone();
        self.filter(&search_text);
        debug!(id = %self.id, "opened");
        self.publish(Notification::Opened);
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), OperationError> {
        let handle = match self.overlay {
            Some(handle) if !self.config.is_disabled => handle,
            _ => {
                return Err(OperationError::AlreadyClosedOrDisabled {
                    id: self.id.clone(),
                });
            }
        };
        self.presenter
            .dismiss(handle)
            .map_err(OperationError::Presentation)?;

        self.overlay = None;
        self.staged.clear();
        if !self.config.should_delegate_search_to_event {
            self.store_search_text(String::new());
        }
        debug!(id = %self.id, "closed");
        self.publish(Notification::Closed { by_backdrop: false });
        Ok(())
    }

    /// Presenter callback for dismissals it initiated itself.
    pub fn handle_dismissed(&mut self, by_backdrop: bool) {
        if self.overlay.take().is_none() {
            return;
        }
        self.staged.clear();
        debug!(id = %self.id, by_backdrop, "dismissed by presenter");
        if by_backdrop {
            self.publish(Notification::Closed { by_backdrop: true });
        }
    }

    /// Searchbar input; always runs a filter pass.
    pub fn search(&mut self, text: &str) {
        self.filter(text);
    }

    /// External write of the search text; filters only while open.
    pub fn set_search_text(&mut self, text: &str) {
        if self.is_open() {
            self.filter(text);
        } else {
            self.store_search_text(normalize_search(text));
        }
    }

    pub fn enable_infinite_scroll(&mut self) {
        if self.config.has_infinite_scroll {
            self.presenter.set_infinite_scroll_enabled(true);
        }
    }

    pub fn disable_infinite_scroll(&mut self) {
        if self.config.has_infinite_scroll {
            self.presenter.set_infinite_scroll_enabled(false);
        }
    }

    /// The next page has been appended to the items; regroup them.
    pub fn end_infinite_scroll(&mut self) -> Result<(), ConfigError> {
        if !self.config.has_infinite_scroll {
            return Ok(());
        }
        self.presenter.complete_infinite_scroll();
        let items = self.items.clone();
        self.set_items(items)
    }

    pub fn request_more_items(&mut self) {
        self.publish(Notification::MoreItemsRequested {
            search_text: self.config.search_text.clone(),
        });
    }

    pub fn scroll_to_top(&mut self) -> Result<(), OperationError> {
        self.require_open()?;
        self.presenter
            .scroll_to_top()
            .map_err(OperationError::Presentation)
    }

    pub fn scroll_to_bottom(&mut self) -> Result<(), OperationError> {
        self.require_open()?;
        self.presenter
            .scroll_to_bottom()
            .map_err(OperationError::Presentation)
    }

    pub fn request_add_item(&mut self) {
        self.publish(Notification::AddItemRequested);
    }

    pub fn focus(&mut self) {
        self.publish(Notification::FocusGained);
    }

    pub fn blur(&mut self) {
        self.publish(Notification::FocusLost);
    }

    pub fn set_item_value_field(&mut self, field: Option<String>) -> Result<(), ConfigError> {
        self.reconfigure(|config| config.item_value_field = field)
    }

    pub fn set_item_text_field(&mut self, field: Option<String>) -> Result<(), ConfigError> {
        self.reconfigure(|config| config.item_text_field = field)
    }

    pub fn set_should_store_item_value(&mut self, store: Option<bool>) -> Result<(), ConfigError> {
        self.reconfigure(|config| config.should_store_item_value = store)
    }

    pub fn set_group_fields(
        &mut self,
        value_field: Option<String>,
        text_field: Option<String>,
    ) -> Result<(), ConfigError> {
        self.reconfigure(|config| {
            config.group_value_field = value_field;
            config.group_text_field = text_field;
        })
    }

    /// Switch between single and multiple selection, re-committing the value in the new shape.
    pub fn set_multiple(&mut self, multiple: bool) -> Result<(), ConfigError> {
        if self.config.is_multiple == multiple {
            return Ok(());
        }
        self.config.is_multiple = multiple;
        let committed = self.value_items.clone();
        self.commit(&committed)?;
        self.refresh_view();
        Ok(())
    }

    pub fn set_has_confirm_button(&mut self, value: bool) {
        self.config.has_confirm_button = value;
        self.refresh_view();
    }

    pub fn set_can_clear(&mut self, value: bool) {
        self.config.can_clear = value;
        self.refresh_view();
    }

    pub fn set_can_add_item(&mut self, value: bool) {
        self.config.can_add_item = value;
        self.refresh_view();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.is_disabled = disabled;
        self.emit_style();
    }

    pub fn set_placeholder(&mut self, placeholder: Option<String>) {
        self.config.placeholder = placeholder;
        self.emit_style();
    }

    pub fn set_disabled_items(&mut self, items: Vec<ItemValue>) {
        self.config.disabled_items = items;
        self.refresh_view();
    }

    /// Validate a changed configuration against the items before adopting it.
    fn reconfigure(&mut self, change: impl FnOnce(&mut SelectableConfig)) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        change(&mut next);
        let model = classify(&self.id, &self.items, &next).inspect_err(|e| {
            warn!(id = %self.id, error = %e, "rejected configuration");
        })?;
        self.config = next;
        let previous = std::mem::replace(&mut self.model, model);
        self.rebase_selection(&previous);
        self.regroup();
        Ok(())
    }

    fn regroup(&mut self) {
        self.groups = group_items(&self.items, &self.model, &self.config);
        self.filtered_groups = self.groups.clone();
        self.has_filtered_items = !are_groups_empty(&self.filtered_groups);
        self.refresh_view();
    }

    /// Re-resolve the selection and staged items after the items or the item model changed.
    /// Dangling references drop out. The bound value is left alone: a delegated search
    /// replaces the items without touching what was committed.
    fn rebase_selection(&mut self, previous: &ItemModel) {
        self.selected = self.rebase(&self.selected, previous);
        self.staged = self.rebase(&self.staged, previous);
    }

    fn rebase(&self, stored: &[ItemValue], previous: &ItemModel) -> Vec<ItemValue> {
        stored
            .iter()
            .filter_map(|s| {
                let key = previous.key_of_stored(s);
                self.model.find(&self.items, &key)
            })
            .map(|item| self.model.stored_form(item))
            .collect()
    }

    fn resolve_context(&self) -> ResolveContext<'_> {
        ResolveContext {
            id: &self.id,
            items: &self.items,
            model: &self.model,
            multiple: self.config.is_multiple,
        }
    }

    /// External-to-internal synchronization. Nothing is mutated when the value is rejected.
    fn apply_value(&mut self, value: ItemValue, origin: Origin) -> Result<(), ConfigError> {
        let resolved = resolve_value(&value, self.resolve_context())?;
        debug!(id = %self.id, ?origin, resolved = resolved.len(), "apply value");

        self.selected = resolved.clone();
        self.value_items = resolved;
        self.staged.clear();

        match origin {
            Origin::Internal => {
                self.value_guard.arm();
                let encoded = encode_value(&self.value_items, self.config.is_multiple);
                self.write_value(encoded)?;
            }
            Origin::External => {
                if is_empty_value(&self.value) {
                    self.value = empty_value(self.config.is_multiple);
                }
                self.refresh_view();
            }
        }

        if self.is_inited {
            self.publish(Notification::Changed {
                value: encode_value(&self.value_items, self.config.is_multiple),
            });
        }
        Ok(())
    }

    fn write_value(&mut self, value: ItemValue) -> Result<(), ConfigError> {
        self.value = value;
        self.observe_value_change()
    }

    /// Observer of the bound value. Skips the one echo of an internal write.
    fn observe_value_change(&mut self) -> Result<(), ConfigError> {
        if self.value_guard.consume() {
            trace!(id = %self.id, "value echo skipped");
            return Ok(());
        }
        if self.is_inited {
            let value = self.value.clone();
            self.apply_value(value, Origin::External)?;
        }
        self.emit_style();
        Ok(())
    }

    fn filter(&mut self, text: &str) {
        match run_filter(
            &self.groups,
            text,
            self.config.should_delegate_search_to_event,
            &self.model,
        ) {
            FilterPass::Delegated { search_text } => {
                self.store_search_text(search_text.clone());
                self.publish(Notification::SearchRequested { search_text });
            }
            FilterPass::Local(outcome) => {
                trace!(id = %self.id, search = %outcome.search_text, found = outcome.has_items, "filter pass");
                self.store_search_text(outcome.search_text.clone());
                self.filtered_groups = outcome.groups;
                self.has_filtered_items = outcome.has_items;
                let search_text = outcome.search_text;
                self.publish(if outcome.has_items {
                    Notification::SearchSucceeded { search_text }
                } else {
                    Notification::SearchFailed { search_text }
                });
                self.refresh_view();
            }
        }
    }

    fn store_search_text(&mut self, search_text: String) {
        self.has_search_text = !search_text.is_empty();
        self.config.search_text = search_text;
    }

    fn require_open(&self) -> Result<(), OperationError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(OperationError::NotOpen {
                id: self.id.clone(),
            })
        }
    }

    fn contains(&self, stored: &[ItemValue], item: &ItemValue) -> bool {
        let key = self.model.key_of(item);
        stored
            .iter()
            .any(|s| self.model.key_of_stored(s).key_eq(&key))
    }

    fn remove_selected(&mut self, item: &ItemValue) {
        let key = self.model.key_of(item);
        let model = &self.model;
        self.selected
            .retain(|s| !model.key_of_stored(s).key_eq(&key));
    }

    /// Key of something that may be given either as an item or as a bare key.
    fn reference_key(&self, reference: &ItemValue) -> ItemValue {
        if reference.is_structured() {
            self.model.key_of(reference)
        } else {
            reference.clone()
        }
    }

    fn emit_style(&mut self) {
        let style = StyleState {
            has_placeholder: self.config.placeholder.is_some(),
            has_value: self.has_value(),
            is_disabled: self.config.is_disabled,
        };
        self.publish(Notification::StyleChanged(style));
    }

    fn refresh_view(&mut self) {
        if self.overlay.is_none() {
            return;
        }
        self.presenter.refresh(ViewSnapshot {
            groups: &self.groups,
            filtered_groups: &self.filtered_groups,
            selected: &self.selected,
            staged: &self.staged,
        });
    }

    fn publish(&mut self, notification: Notification) {
        self.events.publish(&self.id, notification);
    }
}

fn items_from_value(id: &str, items: ItemValue) -> Result<Vec<ItemValue>, ConfigError> {
    match items {
        ItemValue::Array(items) => Ok(items),
        _ => Err(ConfigError::ItemsNotSequence { id: id.to_string() }),
    }
}
