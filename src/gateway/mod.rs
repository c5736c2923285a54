//! Remote data gateway.
//!
//! Every operation forwards one request to the backend and normalizes the
//! answer into an [`Envelope`]. Only a 401 escapes as an error
//! ([`SessionExpired`]); every other failure is data the caller renders.

mod backend;
mod cache;
mod http;
mod local;

pub use backend::*;
pub use cache::{Generation, TagCache, MAX_ENTRIES_PER_TAG};
pub use http::HttpBackend;
pub use local::{seed_demo, LocalBackend, CONFIGURATION_IS_CURRENT, WAREHOUSE_HAS_INVENTORY};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::forms::SelectOption;
use crate::listing::ViewState;
use crate::models::{AdminEntity, EntityPayload, Envelope, Page, ResourceKind, SystemConfiguration, Warehouse};

/// The backend rejected the bearer token. Callers must end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpired;

impl std::fmt::Display for SessionExpired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Session expired")
    }
}

impl std::error::Error for SessionExpired {}

pub type GatewayResult<T> = Result<Envelope<T>, SessionExpired>;

/// Upper bound on pages walked by [`Gateway::snapshot`].
const MAX_SNAPSHOT_PAGES: u32 = 50;

#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    cache: Arc<TagCache>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<TagCache>) -> Self {
        Self { backend, cache }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    /// One page of `E` for the given view state.
    pub async fn list<E: AdminEntity>(&self, token: &str, view: &ViewState) -> GatewayResult<Page<E>> {
        let request = BackendRequest::get(E::KIND.route())
            .with_query(view.backend_query())
            .with_bearer(token);
        let envelope = self.read(E::KIND, request).await?;
        Ok(decode::<Page<E>>(envelope).map(Page::normalized))
    }

    pub async fn get<E: AdminEntity>(&self, token: &str, id: &str) -> GatewayResult<E> {
        let Some(path) = item_route(E::KIND, id) else {
            return Ok(invalid_id(id));
        };
        let request = BackendRequest::get(path).with_bearer(token);
        Ok(decode(self.read(E::KIND, request).await?))
    }

    pub async fn create<E: AdminEntity>(&self, token: &str, payload: &EntityPayload) -> GatewayResult<E> {
        let body = match payload_body::<E>(payload) {
            Ok(body) => body,
            Err(envelope) => return Ok(envelope),
        };
        let request = BackendRequest::post(E::KIND.route())
            .with_json(body)
            .with_bearer(token);
        Ok(decode(self.mutate(E::KIND, request).await?))
    }

    pub async fn update<E: AdminEntity>(
        &self,
        token: &str,
        id: &str,
        payload: &EntityPayload,
    ) -> GatewayResult<E> {
        let Some(path) = item_route(E::KIND, id) else {
            return Ok(invalid_id(id));
        };
        let body = match payload_body::<E>(payload) {
            Ok(body) => body,
            Err(envelope) => return Ok(envelope),
        };
        let request = BackendRequest::put(path)
            .with_json(body)
            .with_bearer(token);
        Ok(decode(self.mutate(E::KIND, request).await?))
    }

    pub async fn delete<E: AdminEntity>(&self, token: &str, id: &str) -> GatewayResult<()> {
        let Some(path) = item_route(E::KIND, id) else {
            return Ok(invalid_id(id));
        };
        let request = BackendRequest::delete(path).with_bearer(token);
        Ok(self.mutate(E::KIND, request).await?.map(|_| ()))
    }

    /// Make a configuration the current one of its country.
    pub async fn set_current(&self, token: &str, id: &str) -> GatewayResult<SystemConfiguration> {
        let kind = ResourceKind::Configuration;
        let Some(path) = item_route(kind, id) else {
            return Ok(invalid_id(id));
        };
        let request = BackendRequest::post(format!("{}/set-current", path)).with_bearer(token);
        Ok(decode(self.mutate(kind, request).await?))
    }

    /// Forward an uploaded image to the backend as multipart form data.
    pub async fn upload_warehouse_image(
        &self,
        token: &str,
        id: &str,
        file: FilePart,
    ) -> GatewayResult<Warehouse> {
        let kind = ResourceKind::Warehouse;
        let Some(path) = item_route(kind, id) else {
            return Ok(invalid_id(id));
        };
        let body = MultipartBody {
            fields: Vec::new(),
            files: vec![file],
        };
        let request = BackendRequest::post(format!("{}/image", path))
            .with_multipart(body)
            .with_bearer(token);
        Ok(decode(self.mutate(kind, request).await?))
    }

    /// Every record of `E`, walking pages of `page_size` until the last one.
    pub async fn snapshot<E: AdminEntity>(&self, token: &str, page_size: u32) -> GatewayResult<Vec<E>> {
        let page_size = page_size.max(1);
        let mut rows = Vec::new();

        for page in 1..=MAX_SNAPSHOT_PAGES {
            let request = BackendRequest::get(E::KIND.route())
                .with_query(vec![
                    ("page".to_string(), page.to_string()),
                    ("pageSize".to_string(), page_size.to_string()),
                ])
                .with_bearer(token);
            let envelope = decode::<Page<E>>(self.read(E::KIND, request).await?);
            let status = envelope.status;

            let Some(chunk) = envelope.data else {
                return Ok(envelope.cast());
            };
            // Compare against the backend's total, not the normalized flags, so
            // a backend that clamps the page size is still walked to the end.
            let total = chunk.total_count;
            let received = chunk.data.len();
            rows.extend(chunk.data);
            if received == 0 || rows.len() as u64 >= total {
                return Ok(Envelope::ok(rows, status));
            }
        }

        tracing::warn!(
            "Snapshot of {} stopped after {} pages with {} rows",
            E::KIND,
            MAX_SNAPSHOT_PAGES,
            rows.len()
        );
        Ok(Envelope::ok(rows, 200))
    }

    /// Select options built from the records of `kind`: id as value, name (or code) as label.
    pub async fn lookup_options(
        &self,
        token: &str,
        kind: ResourceKind,
        page_size: u32,
    ) -> GatewayResult<Vec<SelectOption>> {
        let request = BackendRequest::get(kind.route())
            .with_query(vec![
                ("page".to_string(), "1".to_string()),
                ("pageSize".to_string(), page_size.max(1).to_string()),
            ])
            .with_bearer(token);
        let envelope = decode::<Page<Value>>(self.read(kind, request).await?);

        Ok(envelope.map(|page| {
            page.data
                .iter()
                .filter_map(|row| {
                    let id = row.get("id")?.as_str()?;
                    let label = ["name", "code"]
                        .iter()
                        .find_map(|field| row.get(*field).and_then(Value::as_str))
                        .unwrap_or(id);
                    Some(SelectOption::new(id, label))
                })
                .collect()
        }))
    }

    /// Cached read. Only successful envelopes are stored, and only when no
    /// mutation invalidated the tag while the request was in flight.
    async fn read(&self, kind: ResourceKind, request: BackendRequest) -> GatewayResult<Value> {
        let tag = kind.cache_tag();
        let key = cache_key(&request);
        if let Some(data) = self.cache.get(tag, &key).await {
            tracing::debug!("Cache hit {} {} {}", tag, request.method, request.path);
            return Ok(Envelope::ok(data, 200));
        }

        let seen = self.cache.generation(tag);
        let envelope = self.call(request).await?;
        if let (false, Some(data)) = (envelope.error, &envelope.data) {
            if !self.cache.put(tag, key, data.clone(), seen).await {
                tracing::debug!("Read of {} raced an invalidation, not cached", tag);
            }
        }
        Ok(envelope)
    }

    /// Mutation. Tags are invalidated only after the backend accepted it.
    async fn mutate(&self, kind: ResourceKind, request: BackendRequest) -> GatewayResult<Value> {
        let envelope = self.call(request).await?;
        if envelope.is_success() {
            self.cache.invalidate(kind.invalidates().to_vec()).await;
        }
        Ok(envelope)
    }

    async fn call(&self, request: BackendRequest) -> GatewayResult<Value> {
        let method = request.method;
        let path = request.path.clone();

        let response = match self.backend.send(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("{} backend {} {} failed: {}", self.backend.name(), method, path, err);
                return Ok(Envelope::failure(502, format!("Backend unavailable: {}", err)));
            }
        };

        tracing::debug!("{} backend {} {} -> {}", self.backend.name(), method, path, response.status);

        if response.status == 401 {
            tracing::warn!("Session rejected by backend on {} {}", method, path);
            return Err(SessionExpired);
        }

        let message = message_of(&response.body);
        if !response.is_success() {
            let message = message.unwrap_or_else(|| default_message(response.status).to_string());
            tracing::warn!("{} {} -> {}: {}", method, path, response.status, message);
            return Ok(Envelope::failure(response.status, message));
        }

        let envelope = Envelope::ok(extract(response.body), response.status);
        Ok(match message {
            Some(message) => envelope.with_message(message),
            None => envelope,
        })
    }
}

fn payload_body<E: AdminEntity>(payload: &EntityPayload) -> Result<Value, Envelope<E>> {
    if payload.kind() != E::KIND {
        return Err(Envelope::failure(
            400,
            format!("Expected a {} payload, got {}", E::KIND.label(), payload.kind().label()),
        ));
    }
    payload
        .to_json()
        .map_err(|e| Envelope::failure(400, format!("Invalid payload: {}", e)))
}

fn decode<T: DeserializeOwned>(envelope: Envelope<Value>) -> Envelope<T> {
    if envelope.error {
        return envelope.cast();
    }
    let status = envelope.status;
    let message = envelope.message.clone();
    match serde_json::from_value::<T>(envelope.data.unwrap_or(Value::Null)) {
        Ok(data) => {
            let envelope = Envelope::ok(data, status);
            match message {
                Some(message) => envelope.with_message(message),
                None => envelope,
            }
        }
        Err(err) => {
            tracing::warn!("Unexpected backend response shape: {}", err);
            Envelope::failure(502, format!("Unexpected backend response: {}", err))
        }
    }
}

/// `{ data: .. }` bodies are unwrapped; anything else is the data itself.
fn extract(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// First of `message`, `detail`, `title`; a bare string body is its own message.
fn message_of(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["message", "detail", "title"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        422 => "Unprocessable entity",
        500..=599 => "Backend error",
        _ => "Request failed",
    }
}

/// Reads are cached per session: the backend sees every token at least once.
fn cache_key(request: &BackendRequest) -> String {
    let query: Vec<String> = request
        .query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!(
        "{} {} {}?{}",
        request.bearer.as_deref().unwrap_or_default(),
        request.method,
        request.path,
        query.join("&")
    )
}

/// Route of one record, or `None` when `id` is not a single plain path segment.
fn item_route(kind: ResourceKind, id: &str) -> Option<String> {
    let plain = !id.trim().is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '%', '?', '#']);
    plain.then(|| format!("{}/{}", kind.route(), id))
}

fn invalid_id<T>(id: &str) -> Envelope<T> {
    tracing::warn!("Rejected record id {:?}", id);
    Envelope::failure(400, format!("Invalid record id {:?}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigurationPayload, Role, RolePayload};
    use crate::test_support::ScriptedBackend;
    use serde_json::json;
    use std::time::Duration;

    fn gateway(backend: Arc<ScriptedBackend>) -> Gateway {
        Gateway::new(backend, Arc::new(TagCache::new(Duration::from_secs(60))))
    }

    fn role_page() -> Value {
        json!({
            "data": {
                "data": [{"id": "r-1", "name": "Admin", "permissionIds": [], "isActive": true}],
                "totalCount": 1,
                "page": 1,
                "pageSize": 10
            }
        })
    }

    fn role_page_named(name: &str) -> Value {
        json!({
            "data": {
                "data": [{"id": "r-1", "name": name, "permissionIds": [], "isActive": true}],
                "totalCount": 1,
                "page": 1,
                "pageSize": 10
            }
        })
    }

    #[tokio::test]
    async fn test_list_unwraps_data_and_normalizes_page() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(200, role_page());
        let gateway = gateway(backend.clone());

        let envelope = gateway
            .list::<Role>("token", &ViewState::new(ResourceKind::Role))
            .await
            .unwrap();

        let page = envelope.data.unwrap();
        assert_eq!(page.data[0].name, "Admin");
        assert!(!page.has_next);
        let request = backend.requests().remove(0);
        assert_eq!(request.path, "roles");
        assert_eq!(request.bearer.as_deref(), Some("token"));
        assert!(request.query.contains(&("pageSize".to_string(), "10".to_string())));
    }

    #[tokio::test]
    async fn test_unauthorized_is_session_expired() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(401, json!({"message": "expired"}));
        let gateway = gateway(backend);

        let result = gateway.get::<Role>("token", "r-1").await;
        assert_eq!(result, Err(SessionExpired));
    }

    #[tokio::test]
    async fn test_failure_message_is_read_from_detail_or_title() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(404, json!({"title": "Not Found", "detail": "Role r-9 does not exist"}));
        backend.respond(500, Value::Null);
        let gateway = gateway(backend);

        let missing = gateway.get::<Role>("token", "r-9").await.unwrap();
        assert!(missing.error);
        assert_eq!(missing.status, 404);
        assert_eq!(missing.message.as_deref(), Some("Role r-9 does not exist"));

        let broken = gateway.get::<Role>("token", "r-9").await.unwrap();
        assert_eq!(broken.status, 500);
        assert_eq!(broken.message.as_deref(), Some("Backend error"));
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_bad_gateway() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.fail("connection refused");
        let gateway = gateway(backend);

        let envelope = gateway.get::<Role>("token", "r-1").await.unwrap();
        assert!(envelope.error);
        assert_eq!(envelope.status, 502);
    }

    #[tokio::test]
    async fn test_reads_are_cached_until_a_mutation_succeeds() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(200, role_page());
        backend.respond(409, json!({"message": "Role name already exists"}));
        backend.respond(201, json!({"data": {"id": "r-2", "name": "Clerk", "permissionIds": []}}));
        backend.respond(200, role_page());
        let gateway = gateway(backend.clone());
        let view = ViewState::new(ResourceKind::Role);
        let payload = EntityPayload::Role(RolePayload {
            name: "Clerk".into(),
            description: None,
            permission_ids: Vec::new(),
            is_active: true,
        });

        gateway.list::<Role>("token", &view).await.unwrap();
        gateway.list::<Role>("token", &view).await.unwrap();
        assert_eq!(backend.requests().len(), 1);

        let conflict = gateway.create::<Role>("token", &payload).await.unwrap();
        assert!(conflict.is_conflict());
        gateway.list::<Role>("token", &view).await.unwrap();
        assert_eq!(backend.requests().len(), 2);

        let created = gateway.create::<Role>("token", &payload).await.unwrap();
        assert_eq!(created.status, 201);
        gateway.list::<Role>("token", &view).await.unwrap();
        assert_eq!(backend.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_cached_reads_are_scoped_to_the_token() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(200, role_page());
        backend.respond(401, json!({"message": "Token revoked"}));
        let gateway = gateway(backend.clone());
        let view = ViewState::new(ResourceKind::Role);

        gateway.list::<Role>("alice-token", &view).await.unwrap();
        gateway.list::<Role>("alice-token", &view).await.unwrap();
        assert_eq!(backend.requests().len(), 1);

        let revoked = gateway.list::<Role>("revoked-token", &view).await;
        assert!(matches!(revoked, Err(SessionExpired)));
        assert_eq!(backend.requests().len(), 2);
        assert_eq!(backend.requests()[1].bearer.as_deref(), Some("revoked-token"));
    }

    #[tokio::test]
    async fn test_read_in_flight_during_a_mutation_is_not_cached() {
        let backend = Arc::new(ScriptedBackend::new());
        let release = backend.pause_next();
        backend.respond(200, role_page_named("Old"));
        backend.respond(200, json!({"data": {"id": "r-1", "name": "New", "permissionIds": []}}));
        backend.respond(200, role_page_named("New"));
        let gateway = gateway(backend.clone());
        let view = ViewState::new(ResourceKind::Role);
        let payload = EntityPayload::Role(RolePayload {
            name: "New".into(),
            description: None,
            permission_ids: Vec::new(),
            is_active: true,
        });

        let slow = {
            let gateway = gateway.clone();
            let view = view.clone();
            tokio::spawn(async move { gateway.list::<Role>("token", &view).await })
        };
        while backend.requests().is_empty() {
            tokio::task::yield_now().await;
        }

        let updated = gateway.update::<Role>("token", "r-1", &payload).await.unwrap();
        assert!(updated.is_success());
        release.notify_one();

        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale.data.unwrap().data[0].name, "Old");

        let fresh = gateway.list::<Role>("token", &view).await.unwrap();
        assert_eq!(fresh.data.unwrap().data[0].name, "New");
        assert_eq!(backend.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_ids_are_single_route_segments() {
        let backend = Arc::new(ScriptedBackend::new());
        let gateway = gateway(backend.clone());

        for id in ["../permissions/p-1", "..", ".", "a%2Fb", "r-1?x=1", " "] {
            let envelope = gateway.delete::<Role>("token", id).await.unwrap();
            assert_eq!(envelope.status, 400, "{:?}", id);
        }
        let rejected = gateway.set_current("token", "../roles/r-1").await.unwrap();
        assert_eq!(rejected.status, 400);
        assert!(backend.requests().is_empty());

        backend.respond(200, Value::Null);
        let deleted = gateway.delete::<Role>("token", "r-1").await.unwrap();
        assert!(deleted.is_success());
        assert_eq!(backend.requests()[0].path, "roles/r-1");
    }

    #[tokio::test]
    async fn test_payload_of_another_kind_is_rejected_without_a_request() {
        let backend = Arc::new(ScriptedBackend::new());
        let gateway = gateway(backend.clone());
        let payload = EntityPayload::Configuration(ConfigurationPayload {
            configuration_type: "TAX_RULES".into(),
            country_id: 12,
            additional_settings: String::new(),
        });

        let envelope = gateway.create::<Role>("token", &payload).await.unwrap();
        assert_eq!(envelope.status, 400);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_walks_every_page() {
        let backend = Arc::new(ScriptedBackend::new());
        for (page, id) in [(1, "r-1"), (2, "r-2")] {
            backend.respond(
                200,
                json!({"data": {
                    "data": [{"id": id, "name": id, "permissionIds": []}],
                    "totalCount": 2,
                    "page": page,
                    "pageSize": 1
                }}),
            );
        }
        let gateway = gateway(backend.clone());

        let rows = gateway.snapshot::<Role>("token", 1).await.unwrap().data.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(backend.requests().len(), 2);
    }

    #[test]
    fn test_extract_falls_back_to_whole_body() {
        assert_eq!(extract(json!({"data": [1]})), json!([1]));
        assert_eq!(extract(json!([1, 2])), json!([1, 2]));
        assert_eq!(message_of(&json!("Bad Gateway")).as_deref(), Some("Bad Gateway"));
    }
}
