use crate::ItemValue;
use std::{cell::RefCell, fmt, rc::Rc};

/// Flags an external stylesheet keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleState {
    pub has_placeholder: bool,
    pub has_value: bool,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An item was toggled; `is_selected` is its new membership.
    Selected { item: ItemValue, is_selected: bool },
    /// The committed value changed.
    Changed { value: ItemValue },
    Opened,
    Closed { by_backdrop: bool },
    /// Carries the selection that is about to be discarded.
    Cleared { items: Vec<ItemValue> },
    /// Filtering is delegated and the search text changed.
    SearchRequested { search_text: String },
    SearchSucceeded { search_text: String },
    SearchFailed { search_text: String },
    AddItemRequested,
    MoreItemsRequested { search_text: String },
    FocusGained,
    FocusLost,
    StyleChanged(StyleState),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Selected { .. } => "selected",
            Notification::Changed { .. } => "changed",
            Notification::Opened => "opened",
            Notification::Closed { .. } => "closed",
            Notification::Cleared { .. } => "cleared",
            Notification::SearchRequested { .. } => "search-requested",
            Notification::SearchSucceeded { .. } => "search-succeeded",
            Notification::SearchFailed { .. } => "search-failed",
            Notification::AddItemRequested => "add-item-requested",
            Notification::MoreItemsRequested { .. } => "more-items-requested",
            Notification::FocusGained => "focus-gained",
            Notification::FocusLost => "focus-lost",
            Notification::StyleChanged(_) => "style-state-changed",
        }
    }
}

/// A notification tagged with the id of the control that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableEvent {
    pub source: String,
    pub notification: Notification,
}

pub trait SelectableObserver {
    fn notify(&mut self, event: &SelectableEvent);
}

impl<F: FnMut(&SelectableEvent)> SelectableObserver for F {
    fn notify(&mut self, event: &SelectableEvent) {
        self(event)
    }
}

/// Fans notifications out to every subscribed observer, in subscription order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn SelectableObserver>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(&mut self, observer: impl SelectableObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn publish(&mut self, source: &str, notification: Notification) {
        tracing::trace!(id = %source, event = notification.name(), "publish");
        let event = SelectableEvent {
            source: source.to_string(),
            notification,
        };
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }
}

/// Shared, cloneable recorder of everything a control emits.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SelectableEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    /// Names of the recorded notifications, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.notification.name())
            .collect()
    }

    pub fn take(&self) -> Vec<SelectableEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl SelectableObserver for EventLog {
    fn notify(&mut self, event: &SelectableEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
