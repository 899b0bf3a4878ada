//! View model the orchestrator keeps current for whatever front end renders it.

/// Callback invoked after every state change.
pub type ViewListener = Box<dyn FnMut(&ViewState) + Send>;

/// Header of the info card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoCard {
    pub title: String,
    /// `By <uploader>` or empty.
    pub uploader: String,
    /// `<minutes> min • <views> views`.
    pub details: String,
    pub description: String,
    pub thumbnail: Option<String>,
}

/// One entry of the format picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
    pub filesize: Option<u64>,
    /// Used in the client file name.
    pub resolution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub info_visible: bool,
    /// Metadata request in flight; front ends animate a loading bar meanwhile.
    pub loading: bool,
    pub download_enabled: bool,
    /// Status line (errors, download progress).
    pub message: String,
    pub size_hint: String,
    pub card: InfoCard,
    pub options: Vec<FormatOption>,
    pub selected: Option<String>,
    /// Pending blocking alert; front ends show it and clear it.
    pub alert: Option<String>,
}

impl ViewState {
    pub fn option(&self, format_id: &str) -> Option<&FormatOption> {
        self.options.iter().find(|o| o.format_id == format_id)
    }

    pub fn selected_option(&self) -> Option<&FormatOption> {
        self.selected.as_deref().and_then(|id| self.option(id))
    }
}

/// State plus the listener that is told about every change.
#[derive(Default)]
pub(super) struct Presenter {
    pub(super) state: ViewState,
    listener: Option<ViewListener>,
}

impl Presenter {
    pub(super) fn set_listener(&mut self, listener: ViewListener) {
        self.listener = Some(listener);
    }

    pub(super) fn update(&mut self, f: impl FnOnce(&mut ViewState)) {
        f(&mut self.state);
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.state);
        }
    }

    pub(super) fn alert(&mut self, text: String) {
        tracing::warn!("{}", text);
        self.update(|s| s.alert = Some(text));
    }
}
