//! Mutation service behind the create, edit and delete flows.
//!
//! Every mutation runs the same pipeline: permission gate, field validation,
//! uniqueness against a snapshot, the gateway call, then a notification.
//! Nothing reaches the backend until the first three steps pass.

use std::sync::Arc;

use crate::auth::Session;
use crate::gateway::{FilePart, Gateway, GatewayResult};
use crate::models::{AdminEntity, Envelope, ResourceKind, SystemConfiguration, Warehouse};
use crate::notify::Notifier;
use crate::permissions::{denied_message, Action};
use crate::schema::{DraftMode, DraftSchema};

/// Records the uniqueness check runs against.
pub enum Snapshot<'a, E> {
    /// Rows the caller already holds, e.g. the full list behind a dialog.
    Provided(&'a [E]),
    /// Fetch every record through the gateway.
    Fetch,
}

#[derive(Clone)]
pub struct Mutations {
    gateway: Gateway,
    notifier: Arc<dyn Notifier>,
    snapshot_size: u32,
}

impl Mutations {
    pub fn new(gateway: Gateway, notifier: Arc<dyn Notifier>, snapshot_size: u32) -> Self {
        Self {
            gateway,
            notifier,
            snapshot_size,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub async fn create<E: AdminEntity>(
        &self,
        session: &Session,
        draft: &E::Draft,
        snapshot: Snapshot<'_, E>,
    ) -> GatewayResult<E> {
        if let Some(denied) = self.gate(session, E::KIND, Action::Create) {
            return Ok(denied);
        }
        let payload = match draft.validate(DraftMode::Create) {
            Ok(payload) => payload,
            Err(errors) => return Ok(Envelope::invalid(errors)),
        };
        if let Some(rejected) = self.check_unique::<E>(session, draft, snapshot, None).await? {
            return Ok(rejected);
        }

        let envelope = self.gateway.create::<E>(session.token(), &payload).await?;
        self.report(&envelope, || format!("{} created", E::KIND.label()));
        Ok(envelope)
    }

    pub async fn update<E: AdminEntity>(
        &self,
        session: &Session,
        id: &str,
        draft: &E::Draft,
        snapshot: Snapshot<'_, E>,
    ) -> GatewayResult<E> {
        if let Some(denied) = self.gate(session, E::KIND, Action::Update) {
            return Ok(denied);
        }
        let payload = match draft.validate(DraftMode::Update) {
            Ok(payload) => payload,
            Err(errors) => return Ok(Envelope::invalid(errors)),
        };
        if let Some(rejected) = self.check_unique::<E>(session, draft, snapshot, Some(id)).await? {
            return Ok(rejected);
        }

        let envelope = self.gateway.update::<E>(session.token(), id, &payload).await?;
        self.report(&envelope, || format!("{} updated", E::KIND.label()));
        Ok(envelope)
    }

    pub async fn delete<E: AdminEntity>(&self, session: &Session, id: &str) -> GatewayResult<()> {
        if let Some(denied) = self.gate(session, E::KIND, Action::Delete) {
            return Ok(denied);
        }

        let envelope = self.gateway.delete::<E>(session.token(), id).await?;
        self.report(&envelope, || format!("{} deleted", E::KIND.label()));
        Ok(envelope)
    }

    pub async fn set_current(&self, session: &Session, id: &str) -> GatewayResult<SystemConfiguration> {
        if let Some(denied) = self.gate(session, ResourceKind::Configuration, Action::SetCurrent) {
            return Ok(denied);
        }

        let envelope = self.gateway.set_current(session.token(), id).await?;
        self.report(&envelope, || "Configuration is now current".to_string());
        Ok(envelope)
    }

    /// Image uploads count as a warehouse update.
    pub async fn upload_warehouse_image(
        &self,
        session: &Session,
        id: &str,
        file: FilePart,
    ) -> GatewayResult<Warehouse> {
        if let Some(denied) = self.gate(session, ResourceKind::Warehouse, Action::Update) {
            return Ok(denied);
        }

        let envelope = self
            .gateway
            .upload_warehouse_image(session.token(), id, file)
            .await?;
        self.report(&envelope, || "Warehouse image uploaded".to_string());
        Ok(envelope)
    }

    fn gate<T>(&self, session: &Session, kind: ResourceKind, action: Action) -> Option<Envelope<T>> {
        if session.permissions.allows(kind, action) {
            return None;
        }
        let message = denied_message(kind, action);
        self.notifier.error(&message);
        Some(Envelope::failure(403, message))
    }

    /// `Some` carries the envelope to return instead of mutating.
    async fn check_unique<E: AdminEntity>(
        &self,
        session: &Session,
        draft: &E::Draft,
        snapshot: Snapshot<'_, E>,
        exclude_id: Option<&str>,
    ) -> Result<Option<Envelope<E>>, crate::gateway::SessionExpired> {
        let result = match snapshot {
            Snapshot::Provided(rows) => draft.check_unique(rows, exclude_id),
            Snapshot::Fetch => {
                let fetched = self
                    .gateway
                    .snapshot::<E>(session.token(), self.snapshot_size)
                    .await?;
                match fetched.data {
                    Some(rows) => draft.check_unique(&rows, exclude_id),
                    None => {
                        let envelope: Envelope<E> = fetched.cast();
                        self.report(&envelope, String::new);
                        return Ok(Some(envelope));
                    }
                }
            }
        };

        Ok(result.err().map(Envelope::invalid))
    }

    fn report<T>(&self, envelope: &Envelope<T>, success: impl FnOnce() -> String) {
        let message = || envelope.message.clone().unwrap_or_else(|| "Request failed".to_string());
        if envelope.is_success() {
            self.notifier.success(&success());
        } else if envelope.is_conflict() {
            self.notifier.warning(&message());
        } else {
            self.notifier.error(&message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TagCache;
    use crate::models::{ConfigurationDraft, Role, RoleDraft};
    use crate::notify::NoticeLevel;
    use crate::test_support::RecordingNotifier;
    use crate::permissions::PermissionSet;
    use crate::test_support::ScriptedBackend;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        notifier: Arc<RecordingNotifier>,
        mutations: Mutations,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(ScriptedBackend::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let gateway = Gateway::new(backend.clone(), Arc::new(TagCache::new(Duration::from_secs(60))));
        let mutations = Mutations::new(gateway, notifier.clone(), 100);
        Fixture {
            backend,
            notifier,
            mutations,
        }
    }

    fn session(codes: &[&str]) -> Session {
        Session::new("token", PermissionSet::new(codes.iter().copied()))
    }

    fn role(id: &str, name: &str) -> Role {
        Role {
            id: id.into(),
            name: name.into(),
            description: None,
            permission_ids: Vec::new(),
            is_active: true,
        }
    }

    fn role_draft(name: &str) -> RoleDraft {
        RoleDraft {
            name: name.into(),
            ..RoleDraft::default()
        }
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden_without_a_request() {
        let f = fixture();
        let envelope = f
            .mutations
            .create::<Role>(&session(&["ROLE_VIEW"]), &role_draft("Clerk"), Snapshot::Provided(&[]))
            .await
            .unwrap();

        assert_eq!(envelope.status, 403);
        assert!(f.backend.requests().is_empty());
        assert_eq!(f.notifier.last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_the_backend() {
        let f = fixture();
        let draft = ConfigurationDraft {
            configuration_type: "tax rules".into(),
            country_id: "12".into(),
            additional_settings: String::new(),
        };

        let envelope = f
            .mutations
            .create::<SystemConfiguration>(
                &session(&["SYSTEM_CONFIGURATION_CREATE"]),
                &draft,
                Snapshot::Fetch,
            )
            .await
            .unwrap();

        assert_eq!(envelope.status, 400);
        assert!(envelope
            .field_errors
            .unwrap()
            .contains_key("configurationType"));
        assert!(f.backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_name_collision_is_rejected_before_the_call() {
        let f = fixture();
        let existing = [role("r-1", "Store Manager")];

        let envelope = f
            .mutations
            .create::<Role>(
                &session(&["ROLE_CREATE"]),
                &role_draft("  store manager "),
                Snapshot::Provided(&existing),
            )
            .await
            .unwrap();

        assert_eq!(envelope.status, 400);
        assert_eq!(
            envelope.field_errors.unwrap()["name"],
            vec!["name already in use".to_string()]
        );
        assert!(f.backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_editing_keeps_own_name() {
        let f = fixture();
        f.backend
            .respond(200, json!({"data": {"id": "r-1", "name": "Store Manager", "permissionIds": []}}));
        let existing = [role("r-1", "Store Manager")];

        let envelope = f
            .mutations
            .update::<Role>(
                &session(&["ROLE_UPDATE"]),
                "r-1",
                &role_draft("Store Manager"),
                Snapshot::Provided(&existing),
            )
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(f.backend.requests()[0].path, "roles/r-1");
        assert_eq!(f.notifier.last().unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_conflict_raises_a_warning() {
        let f = fixture();
        f.backend.respond(
            409,
            json!({"message": "Warehouse has active inventory and cannot be deleted"}),
        );

        let envelope = f
            .mutations
            .delete::<Warehouse>(&session(&["WAREHOUSE_DELETE"]), "w-1")
            .await
            .unwrap();

        assert!(envelope.is_conflict());
        let notice = f.notifier.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(
            notice.message,
            "Warehouse has active inventory and cannot be deleted"
        );
    }

    #[tokio::test]
    async fn test_fetched_snapshot_feeds_uniqueness() {
        let f = fixture();
        f.backend.respond(
            200,
            json!({"data": {
                "data": [{"id": "r-1", "name": "Auditor", "permissionIds": []}],
                "totalCount": 1,
                "page": 1,
                "pageSize": 100
            }}),
        );

        let envelope = f
            .mutations
            .create::<Role>(&session(&["ROLE_CREATE"]), &role_draft("AUDITOR"), Snapshot::Fetch)
            .await
            .unwrap();

        assert_eq!(envelope.status, 400);
        let requests = f.backend.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .query
            .contains(&("pageSize".to_string(), "100".to_string())));
    }

    #[tokio::test]
    async fn test_set_current_requires_its_own_code() {
        let f = fixture();
        let envelope = f
            .mutations
            .set_current(&session(&["SYSTEM_CONFIGURATION_UPDATE"]), "c-1")
            .await
            .unwrap();
        assert_eq!(envelope.status, 403);
    }
}
