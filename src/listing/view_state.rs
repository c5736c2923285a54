//! Filter, pagination and modal state carried in the URL query string.

use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

use crate::models::ResourceKind;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which dialog the URL asks to open.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ModalMarker {
    #[default]
    None,
    Create,
    Edit(String),
    View(String),
}

/// Shareable list state of one resource page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(skip)]
    kind: ResourceKind,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub is_descending: bool,
    pub filters: BTreeMap<String, String>,
    pub modal: ModalMarker,
}

impl ViewState {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            search: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            is_descending: false,
            filters: BTreeMap::new(),
            modal: ModalMarker::None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Read the state from a query string. Unknown keys and malformed values
    /// fall back to defaults; when several modal markers appear the last wins.
    pub fn decode(kind: ResourceKind, query: &str) -> Self {
        let mut state = Self::new(kind);
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "search" => state.search = non_empty(value),
                "page" => {
                    state.page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|page| *page >= 1)
                        .unwrap_or(DEFAULT_PAGE)
                }
                "pageSize" => {
                    state.page_size = value
                        .parse::<u32>()
                        .map(|size| size.clamp(1, MAX_PAGE_SIZE))
                        .unwrap_or(DEFAULT_PAGE_SIZE)
                }
                "sortBy" => state.sort_by = non_empty(value),
                "isDescending" => state.is_descending = matches!(value, "true" | "1"),
                "create" => {
                    if matches!(value, "true" | "1") {
                        state.modal = ModalMarker::Create;
                    }
                }
                "edit" => {
                    if let Some(id) = non_empty(value) {
                        state.modal = ModalMarker::Edit(id);
                    }
                }
                "view" => {
                    if let Some(id) = non_empty(value) {
                        state.modal = ModalMarker::View(id);
                    }
                }
                filter if kind.filters().contains(&filter) => {
                    if let Some(value) = non_empty(value) {
                        state.filters.insert(filter.to_string(), value);
                    }
                }
                _ => {}
            }
        }

        state
    }

    /// Query string for the console URL. Defaults are omitted.
    pub fn encode(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            query.append_pair("search", search);
        }
        if self.page != DEFAULT_PAGE {
            query.append_pair("page", &self.page.to_string());
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            query.append_pair("pageSize", &self.page_size.to_string());
        }
        if let Some(sort_by) = &self.sort_by {
            query.append_pair("sortBy", sort_by);
        }
        if self.is_descending {
            query.append_pair("isDescending", "true");
        }
        for (key, value) in &self.filters {
            query.append_pair(key, value);
        }
        match &self.modal {
            ModalMarker::None => {}
            ModalMarker::Create => {
                query.append_pair("create", "true");
            }
            ModalMarker::Edit(id) => {
                query.append_pair("edit", id);
            }
            ModalMarker::View(id) => {
                query.append_pair("view", id);
            }
        }
        query.finish()
    }

    /// Parameters forwarded to the backend list route. Modal markers stay local.
    pub fn backend_query(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            params.push(("sortBy".to_string(), sort_by.clone()));
            params.push(("isDescending".to_string(), self.is_descending.to_string()));
        }
        for (key, value) in &self.filters {
            params.push((self.kind.upstream_filter(key).to_string(), value.clone()));
        }
        params
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = non_empty(search.trim());
        self.page = DEFAULT_PAGE;
        self
    }

    /// Set or, with an empty value, remove a recognized filter.
    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        if !self.kind.filters().contains(&key) {
            return self;
        }
        match non_empty(value.trim()) {
            Some(value) => {
                self.filters.insert(key.to_string(), value);
            }
            None => {
                self.filters.remove(key);
            }
        }
        self.page = DEFAULT_PAGE;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.page = DEFAULT_PAGE;
        self
    }

    /// Sorting by the current column flips direction; a new column sorts ascending.
    pub fn sorted_by(mut self, column: &str) -> Self {
        if self.sort_by.as_deref() == Some(column) {
            self.is_descending = !self.is_descending;
        } else {
            self.sort_by = Some(column.to_string());
            self.is_descending = false;
        }
        self
    }

    pub fn open_create(mut self) -> Self {
        self.modal = ModalMarker::Create;
        self
    }

    pub fn open_edit(mut self, id: &str) -> Self {
        self.modal = ModalMarker::Edit(id.to_string());
        self
    }

    pub fn open_view(mut self, id: &str) -> Self {
        self.modal = ModalMarker::View(id.to_string());
        self
    }

    pub fn close_modal(mut self) -> Self {
        self.modal = ModalMarker::None;
        self
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_recognized_parameters() {
        let state = ViewState::decode(
            ResourceKind::Permission,
            "?search=ware&page=3&pageSize=25&sortBy=name&isDescending=true&roleId=r-1&bogus=1",
        );

        assert_eq!(state.search.as_deref(), Some("ware"));
        assert_eq!(state.page, 3);
        assert_eq!(state.page_size, 25);
        assert_eq!(state.sort_by.as_deref(), Some("name"));
        assert!(state.is_descending);
        assert_eq!(state.filters.get("roleId").map(String::as_str), Some("r-1"));
        assert!(!state.filters.contains_key("bogus"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let state = ViewState::decode(ResourceKind::Role, "page=0&pageSize=5000&isDescending=yes");
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, MAX_PAGE_SIZE);
        assert!(!state.is_descending);

        let state = ViewState::decode(ResourceKind::Role, "page=abc&pageSize=-1");
        assert_eq!(state.page, DEFAULT_PAGE);
        assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_filters_are_per_resource() {
        let state = ViewState::decode(ResourceKind::Role, "entity=WAREHOUSE&isActive=true");
        assert!(!state.filters.contains_key("entity"));
        assert_eq!(state.filters.get("isActive").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_modal_markers() {
        assert_eq!(
            ViewState::decode(ResourceKind::Warehouse, "create=true").modal,
            ModalMarker::Create
        );
        assert_eq!(
            ViewState::decode(ResourceKind::Warehouse, "edit=w-1").modal,
            ModalMarker::Edit("w-1".into())
        );
        assert_eq!(
            ViewState::decode(ResourceKind::Warehouse, "edit=w-1&view=w-2").modal,
            ModalMarker::View("w-2".into())
        );
        assert_eq!(
            ViewState::decode(ResourceKind::Warehouse, "create=false&edit=").modal,
            ModalMarker::None
        );
    }

    #[test]
    fn test_encode_omits_defaults() {
        assert_eq!(ViewState::new(ResourceKind::Role).encode(), "");
        let state = ViewState::new(ResourceKind::Configuration)
            .with_search("tax rules")
            .with_filter("countryId", "12")
            .with_filter("type", "TAX_RULES")
            .with_page(2)
            .open_edit("c 1");
        assert_eq!(
            state.encode(),
            "search=tax+rules&page=2&countryId=12&type=TAX_RULES&edit=c+1"
        );
    }

    #[test]
    fn test_decode_encode_is_stable() {
        let state = ViewState::new(ResourceKind::Warehouse)
            .with_search("north & south")
            .with_filter("countryId", "7")
            .with_page_size(50)
            .sorted_by("name")
            .sorted_by("name")
            .with_page(4)
            .open_view("w-9");

        let decoded = ViewState::decode(ResourceKind::Warehouse, &state.encode());
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_search_and_filters_reset_page() {
        let state = ViewState::new(ResourceKind::Warehouse).with_page(5).with_search("x");
        assert_eq!(state.page, 1);
        let state = state.with_page(5).with_filter("isActive", "true");
        assert_eq!(state.page, 1);
        let state = state.with_page(5).with_filter("unknown", "1");
        assert_eq!(state.page, 5);
    }

    #[test]
    fn test_sort_toggles() {
        let state = ViewState::new(ResourceKind::Role).sorted_by("name");
        assert!(!state.is_descending);
        let state = state.sorted_by("name");
        assert!(state.is_descending);
        let state = state.sorted_by("isActive");
        assert_eq!(state.sort_by.as_deref(), Some("isActive"));
        assert!(!state.is_descending);
    }

    #[test]
    fn test_backend_query_renames_type_and_drops_modal() {
        let state = ViewState::decode(
            ResourceKind::Configuration,
            "type=TAX_RULES&create=true&sortBy=countryId",
        );
        let params = state.backend_query();

        assert!(params.contains(&("configurationType".into(), "TAX_RULES".into())));
        assert!(params.contains(&("isDescending".into(), "false".into())));
        assert!(params.contains(&("page".into(), "1".into())));
        assert!(!params.iter().any(|(key, _)| key == "create" || key == "type"));
    }
}
