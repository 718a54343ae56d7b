use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use shared::{
    domain::{Contact, ContactId},
    protocol::{ContactPage, ContactPatch, NewContact},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod form;
pub use form::{
    ContactDraft, ContactForm, DraftField, FormMode, FormPhase, SubmitOutcome, ValidationError,
};

/// The collection endpoint is always queried for its first page only.
const FETCH_PAGE_LIMIT: u32 = 10;

const FETCH_FAILED_ERROR: &str = "Failed to load contacts. Please try again.";
const ADD_FAILED_ERROR: &str = "Failed to add new contact. Please try again.";
const UPDATE_FAILED_ERROR: &str = "Failed to update contact. Please try again.";
const DELETE_FAILED_ERROR: &str = "Failed to delete contact. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Success,
    Error,
}

/// Events published to the presentation layer. `StateChanged` fires on
/// every mutation of the shared state; `Notice` carries the transient
/// status line the UI shows after each operation.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    StateChanged,
    Notice {
        severity: NoticeSeverity,
        message: String,
    },
}

/// Point-in-time copy of the store state for rendering.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub contacts: Vec<Contact>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct StoreState {
    contacts: Vec<Contact>,
    loading: bool,
    error: Option<String>,
}

/// Single source of truth for the contact collection and the only
/// component issuing contact API calls. Constructed once per session and
/// injected into consumers; failures never cross this boundary as errors,
/// only as a `false` return plus the shared error slot.
pub struct ContactStore {
    http: Client,
    base_url: String,
    inner: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ContactStore {
    pub fn new(base_url: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            http: Client::new(),
            base_url: base_url.into(),
            inner: Mutex::new(StoreState::default()),
            events,
        })
    }

    /// Session entry point: builds the store and runs the initial fetch as
    /// an explicit first call. A failed first fetch still yields a usable
    /// store with the error slot set.
    pub async fn connect(base_url: impl Into<String>) -> Arc<Self> {
        let store = Self::new(base_url);
        store.fetch_all().await;
        store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.lock().await;
        StoreSnapshot {
            contacts: state.contacts.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.inner.lock().await.contacts.clone()
    }

    pub async fn contact(&self, id: ContactId) -> Option<Contact> {
        self.inner
            .lock()
            .await
            .contacts
            .iter()
            .find(|contact| contact.id == id)
            .cloned()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    /// Replaces the collection wholesale with the first page of the remote
    /// collection. On failure the previous collection is left untouched.
    pub async fn fetch_all(&self) -> bool {
        self.begin_operation().await;
        match self.fetch_all_request().await {
            Ok(users) => {
                let count = users.len();
                {
                    let mut state = self.inner.lock().await;
                    state.contacts = users;
                }
                info!(count, "contacts: collection refreshed");
                self.succeed_operation("Contacts fetched successfully!")
                    .await;
                true
            }
            Err(err) => {
                warn!("contacts: fetch failed: {err:#}");
                self.fail_operation(FETCH_FAILED_ERROR, "Failed to load contacts.")
                    .await;
                false
            }
        }
    }

    /// Creates a contact and prepends the server's echo of it. The echo is
    /// trusted as-is: a duplicate id from a misbehaving server is not
    /// deduplicated.
    pub async fn add(&self, payload: NewContact) -> bool {
        self.begin_operation().await;
        match self.add_request(&payload).await {
            Ok(created) => {
                info!(contact_id = created.id.0, "contacts: entry created");
                {
                    let mut state = self.inner.lock().await;
                    state.contacts.insert(0, created);
                }
                self.succeed_operation("Contact added successfully!").await;
                true
            }
            Err(err) => {
                warn!("contacts: add failed: {err:#}");
                self.fail_operation(ADD_FAILED_ERROR, "Failed to add new contact.")
                    .await;
                false
            }
        }
    }

    /// Sends the payload to the update endpoint and merges the returned
    /// partial contact into the entry matching `id`: returned fields take
    /// precedence, fields absent from the response keep their prior value.
    pub async fn update(&self, id: ContactId, payload: NewContact) -> bool {
        self.begin_operation().await;
        match self.update_request(id, &payload).await {
            Ok(patch) => {
                info!(contact_id = id.0, "contacts: entry updated");
                {
                    let mut state = self.inner.lock().await;
                    if let Some(existing) =
                        state.contacts.iter_mut().find(|contact| contact.id == id)
                    {
                        patch.apply_to(existing);
                    }
                }
                self.succeed_operation("Contact updated successfully!")
                    .await;
                true
            }
            Err(err) => {
                warn!(contact_id = id.0, "contacts: update failed: {err:#}");
                self.fail_operation(UPDATE_FAILED_ERROR, "Failed to update contact.")
                    .await;
                false
            }
        }
    }

    /// Deletes the contact addressed by `id` and drops the local entry.
    /// A 404 for an already-absent id is an ordinary failure: the
    /// collection stays unchanged and the error slot is set.
    pub async fn delete(&self, id: ContactId) -> bool {
        self.begin_operation().await;
        match self.delete_request(id).await {
            Ok(()) => {
                info!(contact_id = id.0, "contacts: entry removed");
                {
                    let mut state = self.inner.lock().await;
                    state.contacts.retain(|contact| contact.id != id);
                }
                self.succeed_operation("Contact deleted successfully!")
                    .await;
                true
            }
            Err(err) => {
                warn!(contact_id = id.0, "contacts: delete failed: {err:#}");
                self.fail_operation(DELETE_FAILED_ERROR, "Failed to delete contact.")
                    .await;
                false
            }
        }
    }

    async fn fetch_all_request(&self) -> Result<Vec<Contact>> {
        let page: ContactPage = self
            .http
            .get(&self.base_url)
            .query(&[("limit", FETCH_PAGE_LIMIT)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid contact page payload from server")?;
        Ok(page.users)
    }

    async fn add_request(&self, payload: &NewContact) -> Result<Contact> {
        self.http
            .post(format!("{}/add", self.base_url))
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid created contact payload from server")
    }

    async fn update_request(&self, id: ContactId, payload: &NewContact) -> Result<ContactPatch> {
        self.http
            .put(format!("{}/{}", self.base_url, id.0))
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid updated contact payload from server")
    }

    async fn delete_request(&self, id: ContactId) -> Result<()> {
        // Response body is ignored; any 2xx counts as deleted.
        self.http
            .delete(format!("{}/{}", self.base_url, id.0))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn begin_operation(&self) {
        {
            let mut state = self.inner.lock().await;
            state.loading = true;
            state.error = None;
        }
        let _ = self.events.send(StoreEvent::StateChanged);
    }

    async fn succeed_operation(&self, notice: &str) {
        {
            let mut state = self.inner.lock().await;
            state.loading = false;
        }
        let _ = self.events.send(StoreEvent::StateChanged);
        let _ = self.events.send(StoreEvent::Notice {
            severity: NoticeSeverity::Success,
            message: notice.to_string(),
        });
    }

    async fn fail_operation(&self, slot_message: &str, notice: &str) {
        {
            let mut state = self.inner.lock().await;
            state.loading = false;
            state.error = Some(slot_message.to_string());
        }
        let _ = self.events.send(StoreEvent::StateChanged);
        let _ = self.events.send(StoreEvent::Notice {
            severity: NoticeSeverity::Error,
            message: notice.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
