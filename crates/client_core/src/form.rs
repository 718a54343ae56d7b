//! Draft collection, required-field validation, and submit delegation for
//! the add/edit contact form.

use shared::{
    domain::{Address, Contact, ContactId},
    protocol::NewContact,
};
use thiserror::Error;

use crate::ContactStore;

/// Shown when any required field is blank after trimming.
pub const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required.";

/// The form never collects a city; every payload carries this placeholder.
const DRAFT_CITY_PLACEHOLDER: &str = "Anytown";

/// Unsaved field values held by the form before submission. `address` is
/// the flat street line; it is re-wrapped into the store's nested shape at
/// submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ContactDraft {
    fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            address: contact.address.address.clone(),
        }
    }

    fn missing_required_field(&self) -> bool {
        // The street line is deliberately not required.
        [&self.first_name, &self.last_name, &self.email, &self.phone]
            .iter()
            .any(|field| field.trim().is_empty())
    }

    fn to_payload(&self) -> NewContact {
        NewContact {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: Address {
                address: self.address.clone(),
                city: DRAFT_CITY_PLACEHOLDER.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ContactId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Draft at its defaults; create mode or an edit-mode lookup miss.
    Empty,
    /// Draft populated from an existing contact.
    Populated,
    /// Store call in flight.
    Submitting,
    /// Terminal: the caller should navigate back to the list.
    Succeeded,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

/// Outcome of a submit attempt. `Rejected` never touched the network and
/// leaves the store's error slot alone; `Failed` means the store call ran
/// and recorded its failure there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    Rejected(ValidationError),
    Failed,
}

/// Stateless-between-invocations controller for one create or edit flow.
pub struct ContactForm {
    mode: FormMode,
    phase: FormPhase,
    draft: ContactDraft,
}

impl ContactForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            phase: FormPhase::Empty,
            draft: ContactDraft::default(),
        }
    }

    pub fn edit(id: ContactId) -> Self {
        Self {
            mode: FormMode::Edit(id),
            phase: FormPhase::Empty,
            draft: ContactDraft::default(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &ContactDraft {
        &self.draft
    }

    /// Edit mode: populate the draft from the store's current collection.
    /// A lookup miss is not an error; the collection may simply not have
    /// loaded yet, and a later call can still populate the draft. No-op in
    /// create mode.
    pub async fn sync_from_store(&mut self, store: &ContactStore) {
        let FormMode::Edit(id) = self.mode else {
            return;
        };
        if let Some(contact) = store.contact(id).await {
            self.draft = ContactDraft::from_contact(&contact);
            if self.phase == FormPhase::Empty {
                self.phase = FormPhase::Populated;
            }
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::FirstName => self.draft.first_name = value,
            DraftField::LastName => self.draft.last_name = value,
            DraftField::Email => self.draft.email = value,
            DraftField::Phone => self.draft.phone = value,
            DraftField::Address => self.draft.address = value,
        }
    }

    /// Validate the draft and delegate to the store. Required fields are
    /// checked first: a blank one aborts before any network call. On store
    /// failure the prior phase is restored so the form can be resubmitted.
    pub async fn submit(&mut self, store: &ContactStore) -> SubmitOutcome {
        if self.draft.missing_required_field() {
            return SubmitOutcome::Rejected(ValidationError {
                message: REQUIRED_FIELDS_MESSAGE.to_string(),
            });
        }

        let payload = self.draft.to_payload();
        let resume_phase = self.phase;
        self.phase = FormPhase::Submitting;

        let saved = match self.mode {
            FormMode::Edit(id) => store.update(id, payload).await,
            FormMode::Create => store.add(payload).await,
        };

        if saved {
            self.phase = FormPhase::Succeeded;
            SubmitOutcome::Saved
        } else {
            self.phase = resume_phase;
            SubmitOutcome::Failed
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
