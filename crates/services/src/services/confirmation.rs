//! Promise-style confirmation dialogs.
//!
//! A caller awaits [`ConfirmationService::show_confirmation`]; whatever renders
//! dialogs watches [`ConfirmationService::subscribe`] and answers through
//! [`ConfirmationService::answer`]. Only one dialog can be open at a time.

use std::{
    future::Future,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use models::resource::ResourceKind;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::debug;

pub const DEFAULT_CONFIRM_LABEL: &str = "Confirm";
pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

const DELETE_LABEL: &str = "Удалить";
const CANCEL_LABEL_RU: &str = "Отмена";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationOptions {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmationOptions {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confirm_label: DEFAULT_CONFIRM_LABEL.to_string(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_string(),
        }
    }

    pub fn with_labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    pub fn delete_finance_entry() -> Self {
        Self::new(
            "Удаление записи о расчете",
            "Вы уверены, что хотите удалить эту запись? Это действие нельзя отменить.",
        )
        .with_labels(DELETE_LABEL, CANCEL_LABEL_RU)
    }

    pub fn delete_project() -> Self {
        Self::new(
            "Удаление проекта",
            "Вы уверены, что хотите удалить этот проект? Это действие нельзя отменить.",
        )
        .with_labels(DELETE_LABEL, CANCEL_LABEL_RU)
    }

    pub fn delete_client() -> Self {
        Self::new(
            "Удаление клиента",
            "Вы уверены, что хотите удалить этого клиента? Это действие нельзя отменить.",
        )
        .with_labels(DELETE_LABEL, CANCEL_LABEL_RU)
    }

    /// Dialog shown before deleting a record of `kind`.
    pub fn delete(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Clients => Self::delete_client(),
            ResourceKind::Projects => Self::delete_project(),
            ResourceKind::Incomes | ResourceKind::Expenses => Self::delete_finance_entry(),
        }
    }
}

/// The dialog currently waiting for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingConfirmation {
    pub id: u64,
    pub options: ConfirmationOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("another confirmation is already open")]
    AlreadyPending,
    #[error("no confirmation is open")]
    NothingPending,
    #[error("confirmation dialog was dismissed without an answer")]
    Dismissed,
}

#[derive(Debug)]
struct Slot {
    id: u64,
    responder: oneshot::Sender<bool>,
}

#[derive(Debug)]
struct Inner {
    slot: Mutex<Option<Slot>>,
    next_id: AtomicU64,
    open: watch::Sender<Option<PendingConfirmation>>,
}

#[derive(Debug, Clone)]
pub struct ConfirmationService {
    inner: Arc<Inner>,
}

impl Default for ConfirmationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                next_id: AtomicU64::new(1),
                open: watch::Sender::new(None),
            }),
        }
    }

    /// Open a dialog and wait for the answer: `true` on confirm, `false` on cancel.
    ///
    /// Dropping the returned future closes the dialog.
    pub async fn show_confirmation(
        &self,
        options: ConfirmationOptions,
    ) -> Result<bool, ConfirmationError> {
        let (responder, answer) = oneshot::channel();
        let id = {
            let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(ConfirmationError::AlreadyPending);
            }
            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            *slot = Some(Slot { id, responder });
            debug!(id, title = %options.title, "Confirmation opened");
            // Published under the slot lock so an answer cannot interleave.
            self.inner
                .open
                .send_replace(Some(PendingConfirmation { id, options }));
            id
        };

        let _open = OpenDialog {
            inner: &self.inner,
            id,
        };

        answer.await.map_err(|_| ConfirmationError::Dismissed)
    }

    /// Resolve the open dialog.
    pub fn answer(&self, confirmed: bool) -> Result<(), ConfirmationError> {
        let slot = {
            let mut guard = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = guard.take().ok_or(ConfirmationError::NothingPending)?;
            self.inner.open.send_replace(None);
            slot
        };

        debug!(id = slot.id, confirmed, "Confirmation answered");
        // The asker may already be gone; its guard cleaned up nothing we still hold.
        let _ = slot.responder.send(confirmed);
        Ok(())
    }

    pub fn confirm(&self) -> Result<(), ConfirmationError> {
        self.answer(true)
    }

    pub fn cancel(&self) -> Result<(), ConfirmationError> {
        self.answer(false)
    }

    pub fn pending(&self) -> Option<PendingConfirmation> {
        self.inner.open.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PendingConfirmation>> {
        self.inner.open.subscribe()
    }

    /// Run `action` once if the user confirms. `Ok(None)` when declined.
    pub async fn confirm_then<F, Fut, T>(
        &self,
        options: ConfirmationOptions,
        action: F,
    ) -> Result<Option<T>, ConfirmationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.show_confirmation(options).await? {
            Ok(Some(action().await))
        } else {
            Ok(None)
        }
    }
}

/// Clears the slot when the asking future goes away unanswered.
struct OpenDialog<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for OpenDialog<'_> {
    fn drop(&mut self) {
        let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|s| s.id == self.id) {
            *slot = None;
            self.inner.open.send_replace(None);
            debug!(id = self.id, "Confirmation abandoned");
        }
    }
}
