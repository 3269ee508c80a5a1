//! The presentation/overlay collaborator. The engine never renders; it asks a presenter to
//! show or hide the item list and tells it when the view is stale.

use crate::ItemValue;
use crate::grouping::Group;

/// Opaque token for a presented overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PresentRequest {
    pub control_id: String,
    pub backdrop_dismiss: bool,
    pub css_class: Option<String>,
}

/// Everything a renderer reads after a refresh.
#[derive(Debug, Clone, Copy)]
pub struct ViewSnapshot<'a> {
    pub groups: &'a [Group],
    pub filtered_groups: &'a [Group],
    pub selected: &'a [ItemValue],
    pub staged: &'a [ItemValue],
}

/// Dismissals the presenter initiates itself (backdrop taps, hardware back) are reported
/// to the control through `Selectable::handle_dismissed`.
pub trait Presenter {
    fn present(&mut self, request: &PresentRequest) -> anyhow::Result<PresentHandle>;

    fn dismiss(&mut self, handle: PresentHandle) -> anyhow::Result<()>;

    /// Groups, filtered groups, selection or staged items changed while open.
    fn refresh(&mut self, _view: ViewSnapshot<'_>) {}

    fn set_infinite_scroll_enabled(&mut self, _enabled: bool) {}

    fn complete_infinite_scroll(&mut self) {}

    fn scroll_to_top(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Presenter for running the engine without any UI: hands out handles and counts calls.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    next_handle: u64,
    pub presented: Option<PresentHandle>,
    pub refreshes: usize,
    pub infinite_scroll_enabled: Option<bool>,
}

impl Presenter for HeadlessPresenter {
    fn present(&mut self, _request: &PresentRequest) -> anyhow::Result<PresentHandle> {
        let handle = PresentHandle(self.next_handle);
        self.next_handle += 1;
        self.presented = Some(handle);
        Ok(handle)
    }

    fn dismiss(&mut self, handle: PresentHandle) -> anyhow::Result<()> {
        if self.presented == Some(handle) {
            self.presented = None;
        }
        Ok(())
    }

    fn refresh(&mut self, _view: ViewSnapshot<'_>) {
        self.refreshes += 1;
    }

    fn set_infinite_scroll_enabled(&mut self, enabled: bool) {
        self.infinite_scroll_enabled = Some(enabled);
    }
}
