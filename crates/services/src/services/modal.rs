//! Single-slot modal orchestration.

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::watch;
use tracing::debug;

pub const MODAL_NOT_FOUND: &str = "Modal type not found";

/// Modal tags the dashboard knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display, AsRefStr)]
pub enum ModalKind {
    #[strum(serialize = "addClientModal")]
    #[serde(rename = "addClientModal")]
    AddClient,
    #[strum(serialize = "addProjectModal")]
    #[serde(rename = "addProjectModal")]
    AddProject,
    #[strum(serialize = "addFinanceModal")]
    #[serde(rename = "addFinanceModal")]
    AddFinance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModalConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub footer: Option<String>,
}

impl ModalConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenModal {
    /// Tag as requested; may not name a known modal
    pub tag: String,
    pub config: ModalConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalBody {
    ClientForm,
    ProjectForm,
    FinanceForm,
    NotFound,
}

impl ModalBody {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some(MODAL_NOT_FOUND),
            _ => None,
        }
    }
}

impl From<ModalKind> for ModalBody {
    fn from(kind: ModalKind) -> Self {
        match kind {
            ModalKind::AddClient => Self::ClientForm,
            ModalKind::AddProject => Self::ProjectForm,
            ModalKind::AddFinance => Self::FinanceForm,
        }
    }
}

/// What to draw for `modal`: its config wrapped around the tag's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedModal {
    pub config: ModalConfig,
    pub body: ModalBody,
}

/// Map a tag to its content. Unknown tags get the placeholder body.
pub fn render_modal(modal: &OpenModal) -> RenderedModal {
    let body = ModalKind::from_str(&modal.tag)
        .map(ModalBody::from)
        .unwrap_or(ModalBody::NotFound);
    RenderedModal {
        config: modal.config.clone(),
        body,
    }
}

#[derive(Debug)]
pub struct ModalService {
    current: watch::Sender<Option<OpenModal>>,
}

impl Default for ModalService {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalService {
    pub fn new() -> Self {
        Self {
            current: watch::Sender::new(None),
        }
    }

    /// Show `tag`, replacing whatever is open.
    pub fn open_modal(&self, tag: impl Into<String>, config: ModalConfig) {
        let tag = tag.into();
        debug!(tag = %tag, "Opening modal");
        self.current.send_replace(Some(OpenModal { tag, config }));
    }

    pub fn open(&self, kind: ModalKind, config: ModalConfig) {
        self.open_modal(kind.as_ref(), config);
    }

    pub fn close_modal(&self) {
        if self.current.send_replace(None).is_some() {
            debug!("Modal closed");
        }
    }

    pub fn current(&self) -> Option<OpenModal> {
        self.current.borrow().clone()
    }

    pub fn rendered(&self) -> Option<RenderedModal> {
        self.current.borrow().as_ref().map(render_modal)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<OpenModal>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_map_to_forms() {
        let modals = ModalService::new();
        modals.open(ModalKind::AddFinance, ModalConfig::titled("Добавить новый расчет"));

        let rendered = modals.rendered().unwrap();
        assert_eq!(rendered.body, ModalBody::FinanceForm);
        assert_eq!(rendered.config.title.as_deref(), Some("Добавить новый расчет"));
        assert_eq!(modals.current().unwrap().tag, "addFinanceModal");
    }

    #[test]
    fn test_unknown_tag_renders_placeholder() {
        let modals = ModalService::new();
        modals.open_modal("editProject", ModalConfig::default());

        let rendered = modals.rendered().unwrap();
        assert_eq!(rendered.body, ModalBody::NotFound);
        assert_eq!(rendered.body.placeholder(), Some(MODAL_NOT_FOUND));
    }

    #[test]
    fn test_open_replaces_and_close_clears() {
        let modals = ModalService::new();
        let mut rx = modals.subscribe();
        modals.open(ModalKind::AddClient, ModalConfig::default());
        modals.open(ModalKind::AddProject, ModalConfig::default());

        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|m| m.tag.as_str()),
            Some("addProjectModal")
        );

        modals.close_modal();
        assert!(modals.current().is_none());
        assert!(modals.rendered().is_none());
    }
}
