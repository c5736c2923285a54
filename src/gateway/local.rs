//! SQLite-backed stand-in for the remote admin API.
//!
//! Answers the same route table as the real backend so the console can run
//! without one. Successful bodies are wrapped as `{ "data": .. }` and failures
//! as `{ "message": .. }`, the shapes the gateway expects upstream.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::backend::{Backend, BackendRequest, BackendResponse, HttpMethod, RequestBody, TransportError};
use crate::db::{init_database, RecordWrite, Repository};
use crate::errors::AppError;
use crate::models::{Page, ResourceKind};
use crate::permissions::{permission_code, Action};

pub const WAREHOUSE_HAS_INVENTORY: &str = "Warehouse has active inventory and cannot be deleted";
pub const CONFIGURATION_IS_CURRENT: &str = "The current configuration cannot be deleted";

type Handled = Result<(u16, Value), AppError>;

pub struct LocalBackend {
    repo: Repository,
    /// Held by every write so conflict checks see the state they write over.
    writes: Mutex<()>,
}

impl LocalBackend {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            writes: Mutex::new(()),
        }
    }

    /// Open (or create) the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self, AppError> {
        let pool = init_database(db_path).await?;
        Ok(Self::new(Repository::new(pool)))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    async fn handle(&self, request: &BackendRequest) -> Handled {
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let Some(kind) = segments.first().and_then(|s| ResourceKind::from_route(s)) else {
            return Err(AppError::NotFound(format!("No route for {}", request.path)));
        };

        let _write = match request.method {
            HttpMethod::Get => None,
            _ => Some(self.writes.lock().await),
        };

        match (request.method, &segments[1..]) {
            (HttpMethod::Get, []) => self.list(kind, &request.query).await,
            (HttpMethod::Post, []) => self.create(kind, json_object(&request.body)?).await,
            (HttpMethod::Get, [id]) => self.get(kind, id).await,
            (HttpMethod::Put, [id]) => self.update(kind, id, json_object(&request.body)?).await,
            (HttpMethod::Delete, [id]) => self.delete(kind, id).await,
            (HttpMethod::Post, [id, "set-current"]) if kind == ResourceKind::Configuration => {
                self.set_current(id).await
            }
            (HttpMethod::Post, [id, "image"]) if kind == ResourceKind::Warehouse => {
                self.attach_image(id, &request.body).await
            }
            _ => Err(AppError::NotFound(format!(
                "No route for {} {}",
                request.method, request.path
            ))),
        }
    }

    async fn list(&self, kind: ResourceKind, query: &[(String, String)]) -> Handled {
        // Later duplicates win, as with any query-string decoder.
        let params: BTreeMap<&str, &str> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let page = parse_or(params.get("page"), 1u32);
        let page_size = parse_or(params.get("pageSize"), 10u32);
        let mut records = self.repo.list_records(kind).await?;

        if let Some(search) = params.get("search").map(|s| s.trim().to_lowercase()) {
            if !search.is_empty() {
                records.retain(|record| {
                    kind.search_fields().iter().any(|field| {
                        text(record, field).is_some_and(|v| v.to_lowercase().contains(&search))
                    })
                });
            }
        }

        for filter in kind.filters() {
            let field = kind.upstream_filter(filter);
            let Some(wanted) = params.get(field).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
                continue;
            };

            if kind == ResourceKind::Permission && field == "roleId" {
                let granted: HashSet<String> = self
                    .repo
                    .get_record(ResourceKind::Role, wanted)
                    .await?
                    .and_then(|role| role.get("permissionIds").cloned())
                    .and_then(|ids| serde_json::from_value::<Vec<String>>(ids).ok())
                    .unwrap_or_default()
                    .into_iter()
                    .collect();
                records.retain(|record| text(record, "id").is_some_and(|id| granted.contains(&id)));
            } else {
                records.retain(|record| matches_filter(record.get(field), wanted));
            }
        }

        if let Some(sort_by) = params.get("sortBy").filter(|s| !s.is_empty()) {
            let descending = params.get("isDescending").is_some_and(|v| *v == "true");
            records.sort_by(|a, b| {
                let ordering = compare_values(a.get(*sort_by), b.get(*sort_by));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let page = Page::from_all(records, page, page_size);
        Ok((200, serde_json::to_value(page)?))
    }

    async fn get(&self, kind: ResourceKind, id: &str) -> Handled {
        let record = self.find(kind, id).await?;
        Ok((200, record))
    }

    async fn create(&self, kind: ResourceKind, body: Map<String, Value>) -> Handled {
        let existing = self.repo.list_records(kind).await?;
        let mut record = body;
        record.remove("id");

        check_conflicts(kind, &record, &existing, None)?;

        record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        match kind {
            ResourceKind::Permission | ResourceKind::Role => {
                record.entry("isActive").or_insert(Value::Bool(true));
                if kind == ResourceKind::Role {
                    record.entry("permissionIds").or_insert_with(|| json!([]));
                }
            }
            ResourceKind::Warehouse => {
                record.insert("inventoryCount".into(), json!(0));
                record.entry("isActive").or_insert(Value::Bool(true));
                record.entry("isDefault").or_insert(Value::Bool(false));
            }
            ResourceKind::Configuration => {
                // The first configuration of a country becomes its current one.
                let country = record.get("countryId").cloned();
                let has_current = existing
                    .iter()
                    .any(|c| c.get("countryId") == country.as_ref() && flag(c, "isActive"));
                record.insert("isActive".into(), Value::Bool(!has_current));
                record.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
            }
        }

        let record = Value::Object(record);
        let mut writes = Vec::new();
        if kind == ResourceKind::Warehouse && flag(&record, "isDefault") {
            writes.extend(clear_other_defaults(&existing, None));
        }
        writes.push(RecordWrite::Insert(kind, record.clone()));
        self.repo.apply(&writes).await?;

        tracing::debug!("Local backend created {} {}", kind.label(), text(&record, "id").unwrap_or_default());
        Ok((201, record))
    }

    async fn update(&self, kind: ResourceKind, id: &str, body: Map<String, Value>) -> Handled {
        let current = self.find(kind, id).await?;
        let existing = self.repo.list_records(kind).await?;

        let Value::Object(mut record) = current else {
            return Err(AppError::Internal(format!("{} {} is not an object", kind.label(), id)));
        };
        for (key, value) in body {
            let immutable = match kind {
                ResourceKind::Permission => key == "code",
                ResourceKind::Warehouse => key == "inventoryCount",
                // Only set-current moves the current flag.
                ResourceKind::Configuration => key == "isActive",
                ResourceKind::Role => false,
            };
            if key != "id" && !immutable {
                record.insert(key, value);
            }
        }

        check_conflicts(kind, &record, &existing, Some(id))?;
        if kind == ResourceKind::Configuration {
            record.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
        }

        let record = Value::Object(record);
        let mut writes = Vec::new();
        if kind == ResourceKind::Warehouse && flag(&record, "isDefault") {
            writes.extend(clear_other_defaults(&existing, Some(id)));
        }
        writes.push(RecordWrite::Update(kind, record.clone()));
        self.repo.apply(&writes).await?;
        Ok((200, record))
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Handled {
        let record = self.find(kind, id).await?;
        let mut writes = Vec::new();

        match kind {
            ResourceKind::Warehouse if record.get("inventoryCount").and_then(Value::as_u64).unwrap_or(0) > 0 => {
                return Err(AppError::Conflict(WAREHOUSE_HAS_INVENTORY.to_string()));
            }
            ResourceKind::Configuration if flag(&record, "isActive") => {
                return Err(AppError::Conflict(CONFIGURATION_IS_CURRENT.to_string()));
            }
            ResourceKind::Permission => {
                // Drop the permission from every role that grants it.
                let roles = self.repo.list_records(ResourceKind::Role).await?;
                writes.extend(roles.into_iter().filter_map(|mut role| {
                    let ids = role.get_mut("permissionIds")?.as_array_mut()?;
                    let before = ids.len();
                    ids.retain(|granted| granted.as_str() != Some(id));
                    let changed = ids.len() != before;
                    changed.then(|| RecordWrite::Update(ResourceKind::Role, role))
                }));
            }
            _ => {}
        }

        writes.push(RecordWrite::Delete(kind, id.to_string()));
        self.repo.apply(&writes).await?;
        Ok((200, Value::Null))
    }

    async fn set_current(&self, id: &str) -> Handled {
        let kind = ResourceKind::Configuration;
        let target = self.find(kind, id).await?;
        let country = target.get("countryId").cloned();
        let now = Utc::now().to_rfc3339();

        let mut changed = Vec::new();
        let mut current = Value::Null;
        for mut record in self.repo.list_records(kind).await? {
            if record.get("countryId") != country.as_ref() {
                continue;
            }
            let is_target = text(&record, "id").as_deref() == Some(id);
            if flag(&record, "isActive") == is_target {
                if is_target {
                    current = record;
                }
                continue;
            }
            record["isActive"] = Value::Bool(is_target);
            record["updatedAt"] = Value::String(now.clone());
            if is_target {
                current = record.clone();
            }
            changed.push(record);
        }

        self.repo.update_records(kind, &changed).await?;
        Ok((200, current))
    }

    async fn attach_image(&self, id: &str, body: &RequestBody) -> Handled {
        let mut record = self.find(ResourceKind::Warehouse, id).await?;

        let RequestBody::Multipart(form) = body else {
            return Err(AppError::BadRequest("Expected a multipart body".to_string()));
        };
        let Some(file) = form.files.first() else {
            return Err(AppError::BadRequest("No image file was uploaded".to_string()));
        };
        if !file.content_type.starts_with("image/") {
            return Err(AppError::BadRequest("Only image uploads are accepted".to_string()));
        }

        record["imageUrl"] = Value::String(format!("/uploads/warehouses/{}/{}", id, file.file_name));
        self.repo.update_record(ResourceKind::Warehouse, &record).await?;
        Ok((200, record))
    }

    async fn find(&self, kind: ResourceKind, id: &str) -> Result<Value, AppError> {
        self.repo
            .get_record(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), id)))
    }
}

/// Updates unsetting the default flag of every warehouse but `keep`.
fn clear_other_defaults(existing: &[Value], keep: Option<&str>) -> Vec<RecordWrite> {
    existing
        .iter()
        .filter(|w| flag(w, "isDefault") && text(w, "id").as_deref() != keep)
        .cloned()
        .map(|mut w| {
            w["isDefault"] = Value::Bool(false);
            RecordWrite::Update(ResourceKind::Warehouse, w)
        })
        .collect()
}

#[async_trait]
impl Backend for LocalBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, TransportError> {
        if request.bearer.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Ok(BackendResponse::new(401, json!({ "message": "Unauthorized" })));
        }

        let response = match self.handle(&request).await {
            Ok((status, data)) => BackendResponse::new(status, json!({ "data": data })),
            Err(err) => {
                let status = err.status_code().as_u16();
                BackendResponse::new(status, json!({ "message": err.message() }))
            }
        };
        tracing::debug!(
            "Local backend {} {} -> {}",
            request.method,
            request.path,
            response.status
        );
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Populate an empty database with a small demo data set. Returns how many
/// records were inserted.
pub async fn seed_demo(repo: &Repository) -> Result<usize, AppError> {
    if repo.count_records(ResourceKind::Permission).await? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    let mut permission_ids = Vec::new();
    for kind in ResourceKind::ALL {
        for action in Action::for_kind(kind) {
            let id = Uuid::new_v4().to_string();
            let code = permission_code(kind, *action);
            repo.insert_record(
                ResourceKind::Permission,
                &json!({
                    "id": id,
                    "code": code,
                    "name": format!("{} {}", kind.label(), action.as_str().to_lowercase().replace('_', " ")),
                    "entity": kind.permission_prefix(),
                    "isActive": true
                }),
            )
            .await?;
            permission_ids.push(id);
            inserted += 1;
        }
    }

    let now = Utc::now().to_rfc3339();
    let records = [
        (
            ResourceKind::Role,
            json!({
                "id": Uuid::new_v4().to_string(),
                "name": "Administrator",
                "description": "Full access to the admin console",
                "permissionIds": permission_ids,
                "isActive": true
            }),
        ),
        (
            ResourceKind::Warehouse,
            json!({
                "id": Uuid::new_v4().to_string(),
                "code": "MAIN_HUB",
                "name": "Main warehouse",
                "city": "Lisbon",
                "countryId": 1,
                "capacity": 5000,
                "inventoryCount": 120,
                "isActive": true,
                "isDefault": true
            }),
        ),
        (
            ResourceKind::Warehouse,
            json!({
                "id": Uuid::new_v4().to_string(),
                "code": "OVERFLOW",
                "name": "Overflow storage",
                "countryId": 1,
                "capacity": 800,
                "inventoryCount": 0,
                "isActive": true,
                "isDefault": false
            }),
        ),
        (
            ResourceKind::Configuration,
            json!({
                "id": Uuid::new_v4().to_string(),
                "configurationType": "TAX_RULES",
                "countryId": 1,
                "additionalSettings": "{\"vatRate\": 23}",
                "isActive": true,
                "updatedAt": now
            }),
        ),
    ];
    for (kind, record) in &records {
        repo.insert_record(*kind, record).await?;
        inserted += 1;
    }

    tracing::info!("Seeded {} demo records", inserted);
    Ok(inserted)
}

fn json_object(body: &RequestBody) -> Result<Map<String, Value>, AppError> {
    match body {
        RequestBody::Json(Value::Object(map)) => Ok(map.clone()),
        _ => Err(AppError::BadRequest("Expected a JSON object body".to_string())),
    }
}

fn parse_or(value: Option<&&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(record: &Value, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn matches_filter(value: Option<&Value>, wanted: &str) -> bool {
    match value {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(Value::Number(n)) => n.to_string() == wanted,
        Some(Value::Bool(b)) => b.to_string() == wanted.to_lowercase(),
        _ => false,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Uniqueness backstop for writes that bypassed the console's own checks.
fn check_conflicts(
    kind: ResourceKind,
    record: &Map<String, Value>,
    existing: &[Value],
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let record = Value::Object(record.clone());
    let others = existing
        .iter()
        .filter(|other| text(other, "id").as_deref() != exclude_id);

    let unique_fields: &[&str] = match kind {
        ResourceKind::Permission | ResourceKind::Warehouse => &["code", "name"],
        ResourceKind::Role => &["name"],
        ResourceKind::Configuration => &[],
    };

    for other in others {
        for field in unique_fields {
            if let (Some(mine), Some(theirs)) = (text(&record, field), text(other, field)) {
                if !mine.trim().is_empty() && same_label(&mine, &theirs) {
                    return Err(AppError::Conflict(format!(
                        "{} {} already exists",
                        kind.label(),
                        field
                    )));
                }
            }
        }
        if kind == ResourceKind::Configuration
            && text(&record, "configurationType") == text(other, "configurationType")
            && text(&record, "countryId") == text(other, "countryId")
        {
            return Err(AppError::Conflict(
                "A configuration of this type already exists for the country".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::backend::{FilePart, MultipartBody};
    use tempfile::TempDir;

    async fn backend() -> (LocalBackend, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = LocalBackend::open(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to open local backend");
        (backend, temp_dir)
    }

    async fn send(backend: &LocalBackend, request: BackendRequest) -> BackendResponse {
        backend.send(request.with_bearer("token")).await.unwrap()
    }

    async fn create(backend: &LocalBackend, route: &str, body: Value) -> Value {
        let response = send(backend, BackendRequest::post(route).with_json(body)).await;
        assert_eq!(response.status, 201, "{:?}", response.body);
        response.body["data"].clone()
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_creates_conflict() {
        let (backend, _dir) = backend().await;
        let backend = std::sync::Arc::new(backend);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let backend = backend.clone();
            tasks.push(tokio::spawn(async move {
                let request = BackendRequest::post("roles")
                    .with_json(json!({"name": "Auditor"}))
                    .with_bearer("token");
                backend.send(request).await.unwrap().status
            }));
        }

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                201 => created += 1,
                status => assert_eq!(status, 409),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(backend.repository().count_records(ResourceKind::Role).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_bearer_is_unauthorized() {
        let (backend, _dir) = backend().await;
        let response = backend.send(BackendRequest::get("roles")).await.unwrap();
        assert_eq!(response.status, 401);

        let blank = backend
            .send(BackendRequest::get("roles").with_bearer("  "))
            .await
            .unwrap();
        assert_eq!(blank.status, 401);
    }

    #[tokio::test]
    async fn test_list_searches_sorts_and_paginates() {
        let (backend, _dir) = backend().await;
        for (code, name) in [("NORTH", "North hub"), ("SOUTH", "South hub"), ("EAST", "East depot")] {
            create(
                &backend,
                "warehouses",
                json!({"code": code, "name": name, "countryId": 1, "capacity": 10}),
            )
            .await;
        }

        let response = send(
            &backend,
            BackendRequest::get("warehouses").with_query(query(&[
                ("search", "HUB"),
                ("sortBy", "name"),
                ("isDescending", "true"),
                ("page", "1"),
                ("pageSize", "1"),
            ])),
        )
        .await;

        let page = &response.body["data"];
        assert_eq!(page["totalCount"], 2);
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["data"][0]["name"], "South hub");
        assert_eq!(page["hasNext"], true);
        assert_eq!(page["hasPrevious"], false);
    }

    #[tokio::test]
    async fn test_permissions_filter_by_role() {
        let (backend, _dir) = backend().await;
        let view = create(
            &backend,
            "permissions",
            json!({"code": "ROLE_VIEW", "name": "View roles", "entity": "ROLE"}),
        )
        .await;
        create(
            &backend,
            "permissions",
            json!({"code": "ROLE_DELETE", "name": "Delete roles", "entity": "ROLE"}),
        )
        .await;
        let role = create(
            &backend,
            "roles",
            json!({"name": "Viewer", "permissionIds": [view["id"]]}),
        )
        .await;

        let role_id = role["id"].as_str().unwrap();
        let response = send(
            &backend,
            BackendRequest::get("permissions").with_query(query(&[("roleId", role_id)])),
        )
        .await;

        let rows = response.body["data"]["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["code"], "ROLE_VIEW");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (backend, _dir) = backend().await;
        let response = send(&backend, BackendRequest::get("roles/missing")).await;
        assert_eq!(response.status, 404);
        assert!(response.body["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (backend, _dir) = backend().await;
        create(&backend, "roles", json!({"name": "Auditor"})).await;
        let response = send(
            &backend,
            BackendRequest::post("roles").with_json(json!({"name": " auditor "})),
        )
        .await;
        assert_eq!(response.status, 409);
    }

    #[tokio::test]
    async fn test_warehouse_with_inventory_cannot_be_deleted() {
        let (backend, _dir) = backend().await;
        let warehouse = create(
            &backend,
            "warehouses",
            json!({"code": "WEST", "name": "West", "countryId": 1}),
        )
        .await;
        assert_eq!(warehouse["inventoryCount"], 0);

        let mut stocked = warehouse.clone();
        stocked["inventoryCount"] = json!(4);
        backend
            .repository()
            .update_record(ResourceKind::Warehouse, &stocked)
            .await
            .unwrap();

        let path = format!("warehouses/{}", warehouse["id"].as_str().unwrap());
        let response = send(&backend, BackendRequest::delete(&path)).await;
        assert_eq!(response.status, 409);
        assert_eq!(response.body["message"], WAREHOUSE_HAS_INVENTORY);
    }

    #[tokio::test]
    async fn test_set_current_swaps_active_configuration() {
        let (backend, _dir) = backend().await;
        let first = create(
            &backend,
            "system-configurations",
            json!({"configurationType": "TAX_RULES", "countryId": 12, "additionalSettings": ""}),
        )
        .await;
        let second = create(
            &backend,
            "system-configurations",
            json!({"configurationType": "CURRENCY", "countryId": 12, "additionalSettings": ""}),
        )
        .await;
        assert_eq!(first["isActive"], true);
        assert_eq!(second["isActive"], false);

        let first_path = format!("system-configurations/{}", first["id"].as_str().unwrap());
        let blocked = send(&backend, BackendRequest::delete(&first_path)).await;
        assert_eq!(blocked.status, 409);

        let path = format!("system-configurations/{}/set-current", second["id"].as_str().unwrap());
        let response = send(&backend, BackendRequest::post(&path)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["data"]["isActive"], true);

        let first_now = send(&backend, BackendRequest::get(&first_path)).await;
        assert_eq!(first_now.body["data"]["isActive"], false);
    }

    #[tokio::test]
    async fn test_update_keeps_immutable_fields() {
        let (backend, _dir) = backend().await;
        let permission = create(
            &backend,
            "permissions",
            json!({"code": "ROLE_VIEW", "name": "View roles", "entity": "ROLE"}),
        )
        .await;

        let path = format!("permissions/{}", permission["id"].as_str().unwrap());
        let response = send(
            &backend,
            BackendRequest::put(&path).with_json(json!({"code": "OTHER", "name": "See roles"})),
        )
        .await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["data"]["code"], "ROLE_VIEW");
        assert_eq!(response.body["data"]["name"], "See roles");
    }

    #[tokio::test]
    async fn test_image_upload_sets_url() {
        let (backend, _dir) = backend().await;
        let warehouse = create(
            &backend,
            "warehouses",
            json!({"code": "WEST", "name": "West", "countryId": 1}),
        )
        .await;

        let path = format!("warehouses/{}/image", warehouse["id"].as_str().unwrap());
        let body = MultipartBody {
            fields: Vec::new(),
            files: vec![FilePart {
                field: "image".into(),
                file_name: "front.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            }],
        };
        let response = send(&backend, BackendRequest::post(&path).with_multipart(body)).await;

        assert_eq!(response.status, 200);
        assert!(response.body["data"]["imageUrl"]
            .as_str()
            .unwrap()
            .ends_with("/front.png"));
    }

    #[tokio::test]
    async fn test_seed_demo_runs_once() {
        let (backend, _dir) = backend().await;
        let inserted = seed_demo(backend.repository()).await.unwrap();
        assert!(inserted > 0);
        assert_eq!(seed_demo(backend.repository()).await.unwrap(), 0);
    }
}
