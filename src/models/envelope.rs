//! Response envelope and paginated collection shared by every resource.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::ValidationErrors;

/// The `{ data, error, status, message }` contract returned by every gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field-indexed validation messages, present only for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, status: u16) -> Self {
        Self {
            data: Some(data),
            error: false,
            status,
            message: None,
            field_errors: None,
        }
    }

    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: true,
            status,
            message: Some(message.into()),
            field_errors: None,
        }
    }

    /// Client-side validation failure; no request was issued.
    pub fn invalid(errors: ValidationErrors) -> Self {
        Self {
            data: None,
            error: true,
            status: 400,
            message: Some("Validation failed".to_string()),
            field_errors: Some(errors.into_map()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        !self.error
    }

    pub fn is_conflict(&self) -> bool {
        self.error && self.status == 409
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            message: self.message,
            field_errors: self.field_errors,
        }
    }

    /// Re-type a failure envelope. Any data is dropped.
    pub fn cast<U>(self) -> Envelope<U> {
        Envelope {
            data: None,
            error: self.error,
            status: self.status,
            message: self.message,
            field_errors: self.field_errors,
        }
    }
}

/// One page of a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        Self {
            data,
            total_count,
            page,
            page_size,
            has_next: false,
            has_previous: false,
        }
        .normalized()
    }

    /// Slice one page out of the full, already ordered collection.
    pub fn from_all(items: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_count = items.len() as u64;
        let skip = (page as usize - 1).saturating_mul(page_size as usize);
        let data = items
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();
        Self::new(data, total_count, page, page_size)
    }

    /// Enforce `data.len() <= page_size` and recompute the navigation flags.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.max(1);
        if self.data.len() > self.page_size as usize {
            tracing::warn!(
                "Page {} holds {} rows for page size {}, truncating",
                self.page,
                self.data.len(),
                self.page_size
            );
            self.data.truncate(self.page_size as usize);
        }
        self.has_next = u64::from(self.page) * u64::from(self.page_size) < self.total_count;
        self.has_previous = self.page > 1;
        self
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size.max(1)));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
