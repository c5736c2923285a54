//! Create/edit dialog lifecycle.
//!
//! `Closed -> Open -> Submitting -> Closed`, or back to `Open` with the
//! failure message and field errors when the submission fails.

use crate::auth::Session;
use crate::forms::{DraftForm, FieldInput, FormDraft};
use crate::gateway::SessionExpired;
use crate::models::{AdminEntity, Envelope};
use crate::mutation::{Mutations, Snapshot};
use crate::permissions::{Action, PermissionSet};
use crate::schema::{DraftSchema, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    /// Accepting input. `error` holds the last failed submission's message.
    Open { error: Option<String> },
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalError {
    NotOpen,
    /// A submission is already in flight.
    AlreadySubmitting,
    SessionExpired,
}

impl std::fmt::Display for ModalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModalError::NotOpen => f.write_str("The dialog is not open"),
            ModalError::AlreadySubmitting => f.write_str("A submission is already in progress"),
            ModalError::SessionExpired => f.write_str("Session expired"),
        }
    }
}

impl std::error::Error for ModalError {}

impl From<SessionExpired> for ModalError {
    fn from(_: SessionExpired) -> Self {
        ModalError::SessionExpired
    }
}

pub struct ModalSession<E: AdminEntity> {
    state: ModalState,
    editing: Option<E>,
    form: FormDraft,
}

impl<E: AdminEntity> Default for ModalSession<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AdminEntity> ModalSession<E> {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
            editing: None,
            form: E::Draft::default().to_form(),
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, ModalState::Closed)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ModalState::Open { error } => error.as_deref(),
            _ => None,
        }
    }

    /// The record being edited, `None` in create mode.
    pub fn editing(&self) -> Option<&E> {
        self.editing.as_ref()
    }

    pub fn form(&self) -> &FormDraft {
        &self.form
    }

    pub fn open_create(&mut self) {
        self.editing = None;
        self.form = E::Draft::default().to_form();
        self.state = ModalState::Open { error: None };
    }

    /// Open pre-populated with `entity`.
    pub fn open_edit(&mut self, entity: &E) {
        self.form = E::Draft::from_entity(entity).to_form();
        for name in <E::Draft as DraftForm>::immutable_fields() {
            if let Some(field) = self.form.field_mut(name) {
                field.read_only = true;
            }
        }
        self.editing = Some(entity.clone());
        self.state = ModalState::Open { error: None };
    }

    /// Field input is ignored while closed or submitting.
    pub fn input(&mut self, field: &str, input: FieldInput) -> bool {
        match self.state {
            ModalState::Open { .. } => self.form.input(field, input),
            _ => false,
        }
    }

    pub fn can_submit(&self, permissions: &PermissionSet) -> bool {
        let action = if self.editing.is_some() {
            Action::Update
        } else {
            Action::Create
        };
        permissions.shows(E::KIND, action)
    }

    pub fn is_submit_disabled(&self, permissions: &PermissionSet) -> bool {
        !matches!(self.state, ModalState::Open { .. }) || !self.can_submit(permissions)
    }

    /// Enter `Submitting` and hand out the draft collected by the form.
    pub fn begin_submit(&mut self) -> Result<E::Draft, ModalError> {
        match self.state {
            ModalState::Closed => Err(ModalError::NotOpen),
            ModalState::Submitting => Err(ModalError::AlreadySubmitting),
            ModalState::Open { .. } => {
                self.form.clear_errors();
                self.state = ModalState::Submitting;
                Ok(E::Draft::from_form(&self.form))
            }
        }
    }

    /// Settle a submission. Closes and resets only on success; ignored
    /// unless a submission is in flight.
    pub fn complete<T>(&mut self, envelope: &Envelope<T>) {
        if self.state != ModalState::Submitting {
            tracing::debug!("Ignoring a submission result outside Submitting");
            return;
        }
        if !envelope.error {
            self.close();
            return;
        }

        if let Some(field_errors) = &envelope.field_errors {
            self.form.apply_errors(&ValidationErrors::from(field_errors.clone()));
        }
        self.state = ModalState::Open {
            error: envelope.message.clone(),
        };
    }

    /// Close without submitting. Refused while a submission is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.state == ModalState::Submitting {
            return false;
        }
        self.close();
        true
    }

    /// Run a whole submission through `mutations`.
    pub async fn submit(
        &mut self,
        mutations: &Mutations,
        session: &Session,
        snapshot: Snapshot<'_, E>,
    ) -> Result<Envelope<E>, ModalError> {
        let draft = self.begin_submit()?;
        let editing_id = self.editing.as_ref().map(|e| e.id().to_string());

        let result = match editing_id {
            Some(id) => mutations.update::<E>(session, &id, &draft, snapshot).await,
            None => mutations.create::<E>(session, &draft, snapshot).await,
        };

        match result {
            Ok(envelope) => {
                self.complete(&envelope);
                Ok(envelope)
            }
            Err(expired) => {
                self.close();
                Err(expired.into())
            }
        }
    }

    fn close(&mut self) {
        self.state = ModalState::Closed;
        self.editing = None;
        self.form = E::Draft::default().to_form();
    }
}
