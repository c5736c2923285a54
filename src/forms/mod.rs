//! Form field bindings used by the create/edit dialogs.
//!
//! A `FormDraft` is an ordered list of named fields. Input is normalized per
//! field kind before it is stored, and validation errors are bound back to the
//! fields by name.

mod bindings;
pub mod number;
pub mod richtext;

use serde::Serialize;

use crate::schema::ValidationErrors;

/// One option of a select or multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Password,
    Textarea,
    RichText,
    Select { options: Vec<SelectOption> },
    MultiSelect { options: Vec<SelectOption> },
    Checkbox,
    Switch,
    #[serde(rename_all = "camelCase")]
    File { accept: Vec<String>, max_bytes: u64 },
}

impl FieldKind {
    fn empty_value(&self) -> FieldValue {
        match self {
            FieldKind::Checkbox | FieldKind::Switch => FieldValue::Bool(false),
            FieldKind::MultiSelect { .. } => FieldValue::List(Vec::new()),
            FieldKind::File { .. } => FieldValue::File(None),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn options(&self) -> Option<&[SelectOption]> {
        match self {
            FieldKind::Select { options } | FieldKind::MultiSelect { options } => Some(options),
            _ => None,
        }
    }
}

/// Metadata of a chosen file; the bytes travel separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    File(Option<FileMeta>),
}

/// A user interaction with a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// Replace the text (typing into text fields, pasting into number fields).
    Text(String),
    /// One keystroke.
    Key(char),
    Backspace,
    /// Pick an option of a select; an empty value clears it.
    Select(String),
    /// Toggle an option of a multi-select.
    Toggle(String),
    Check(bool),
    File(FileMeta),
    ClearFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub required: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Password fields only: whether the value is shown in plain text.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub revealed: bool,
    /// Value the field was built with; `reset` returns to it.
    #[serde(skip)]
    initial: FieldValue,
}

impl FormField {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        let value = kind.empty_value();
        let kind_empty = value.clone();
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            value,
            required: false,
            read_only: false,
            error: None,
            revealed: false,
            initial: kind_empty,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn password(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Password)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea)
    }

    pub fn rich_text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::RichText)
    }

    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(name, label, FieldKind::Select { options })
    }

    pub fn multi_select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(name, label, FieldKind::MultiSelect { options })
    }

    pub fn checkbox(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Checkbox)
    }

    pub fn switch(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Switch)
    }

    pub fn file(name: &str, label: &str, accept: &[&str], max_bytes: u64) -> Self {
        Self::new(
            name,
            label,
            FieldKind::File {
                accept: accept.iter().map(|ext| ext.to_lowercase()).collect(),
                max_bytes,
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.value = match self.kind {
            FieldKind::Number => FieldValue::Text(number::normalize(&value)),
            _ => FieldValue::Text(value),
        };
        self.initial = self.value.clone();
        self
    }

    pub fn with_flag(mut self, value: bool) -> Self {
        self.value = FieldValue::Bool(value);
        self.initial = self.value.clone();
        self
    }

    pub fn with_list(mut self, values: Vec<String>) -> Self {
        self.value = FieldValue::List(values);
        self.initial = self.value.clone();
        self
    }

    pub fn as_text(&self) -> &str {
        match &self.value {
            FieldValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self.value, FieldValue::Bool(true))
    }

    pub fn as_list(&self) -> &[String] {
        match &self.value {
            FieldValue::List(values) => values,
            _ => &[],
        }
    }

    pub fn as_file(&self) -> Option<&FileMeta> {
        match &self.value {
            FieldValue::File(file) => file.as_ref(),
            _ => None,
        }
    }

    /// Text as rendered: password values are masked until revealed.
    pub fn display(&self) -> String {
        match self.kind {
            FieldKind::Password if !self.revealed => "•".repeat(self.as_text().chars().count()),
            _ => self.as_text().to_string(),
        }
    }

    /// Flip a password field between masked and plain text.
    pub fn toggle_visibility(&mut self) -> bool {
        if self.kind == FieldKind::Password {
            self.revealed = !self.revealed;
        }
        self.revealed
    }

    /// Apply an interaction. Returns whether the value changed.
    pub fn input(&mut self, input: FieldInput) -> bool {
        if self.read_only {
            return false;
        }

        let next = match (&self.kind, input) {
            (FieldKind::Number, FieldInput::Key(key)) => {
                Some(FieldValue::Text(number::apply_keystroke(self.as_text(), key)))
            }
            (FieldKind::Number, FieldInput::Text(text)) => {
                Some(FieldValue::Text(number::normalize(&text)))
            }
            (
                FieldKind::Text | FieldKind::Password | FieldKind::Textarea | FieldKind::RichText,
                FieldInput::Text(text),
            ) => Some(FieldValue::Text(text)),
            (
                FieldKind::Text | FieldKind::Password | FieldKind::Textarea | FieldKind::RichText,
                FieldInput::Key(key),
            ) => Some(FieldValue::Text(format!("{}{}", self.as_text(), key))),
            (
                FieldKind::Text
                | FieldKind::Password
                | FieldKind::Textarea
                | FieldKind::RichText
                | FieldKind::Number,
                FieldInput::Backspace,
            ) => {
                let mut text = self.as_text().to_string();
                text.pop();
                Some(FieldValue::Text(text))
            }
            (FieldKind::Select { options }, FieldInput::Select(value)) => {
                if value.is_empty() || options.iter().any(|option| option.value == value) {
                    Some(FieldValue::Text(value))
                } else {
                    None
                }
            }
            (FieldKind::MultiSelect { options }, FieldInput::Toggle(value)) => {
                if options.iter().any(|option| option.value == value) {
                    let mut values = self.as_list().to_vec();
                    match values.iter().position(|existing| *existing == value) {
                        Some(index) => {
                            values.remove(index);
                        }
                        None => values.push(value),
                    }
                    Some(FieldValue::List(values))
                } else {
                    None
                }
            }
            (FieldKind::Checkbox | FieldKind::Switch, FieldInput::Check(checked)) => {
                Some(FieldValue::Bool(checked))
            }
            (FieldKind::File { accept, max_bytes }, FieldInput::File(meta)) => {
                if let Some(message) = file_problem(&meta, accept, *max_bytes) {
                    self.error = Some(message);
                    return false;
                }
                Some(FieldValue::File(Some(meta)))
            }
            (FieldKind::File { .. }, FieldInput::ClearFile) => Some(FieldValue::File(None)),
            _ => None,
        };

        match next {
            Some(value) if value != self.value => {
                self.value = value;
                self.error = None;
                true
            }
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.value = self.initial.clone();
        self.error = None;
        self.revealed = false;
    }
}

fn file_problem(meta: &FileMeta, accept: &[String], max_bytes: u64) -> Option<String> {
    if meta.size > max_bytes {
        return Some(format!(
            "{} is too large ({} bytes, at most {})",
            meta.file_name, meta.size, max_bytes
        ));
    }
    let lower = meta.file_name.to_lowercase();
    if !accept.is_empty() && !accept.iter().any(|ext| lower.ends_with(ext.as_str())) {
        return Some(format!(
            "{} is not an accepted file type ({})",
            meta.file_name,
            accept.join(", ")
        ));
    }
    None
}

/// The fields of one dialog, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormDraft {
    pub fields: Vec<FormField>,
}

impl FormDraft {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    /// Route an interaction to the named field.
    pub fn input(&mut self, name: &str, input: FieldInput) -> bool {
        self.field_mut(name)
            .map(|field| field.input(input))
            .unwrap_or(false)
    }

    pub fn text(&self, name: &str) -> String {
        self.field(name)
            .map(|field| field.as_text().to_string())
            .unwrap_or_default()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.field(name).is_some_and(FormField::as_flag)
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        self.field(name)
            .map(|field| field.as_list().to_vec())
            .unwrap_or_default()
    }

    /// Show the first message of each field; fields without errors are cleared.
    pub fn apply_errors(&mut self, errors: &ValidationErrors) {
        for field in &mut self.fields {
            field.error = errors.first(&field.name).map(str::to_string);
        }
    }

    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.error = None;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|field| field.error.is_some())
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// Replace the options of a select or multi-select.
    pub fn set_options(&mut self, name: &str, options: Vec<SelectOption>) {
        if let Some(field) = self.field_mut(name) {
            match &mut field.kind {
                FieldKind::Select { options: current } | FieldKind::MultiSelect { options: current } => {
                    *current = options;
                }
                _ => {}
            }
        }
    }

    pub fn options(&self, name: &str) -> &[SelectOption] {
        self.field(name)
            .and_then(|field| field.kind.options())
            .unwrap_or(&[])
    }

    /// Detail dialogs render the same fields without accepting input.
    pub fn read_only(mut self) -> Self {
        for field in &mut self.fields {
            field.read_only = true;
        }
        self
    }
}

/// Conversion between a typed draft and its form fields.
pub trait DraftForm: Sized {
    fn to_form(&self) -> FormDraft;

    fn from_form(form: &FormDraft) -> Self;

    /// Multi-select fields whose options are lookups of another resource.
    fn lookups() -> &'static [(&'static str, crate::models::ResourceKind)] {
        &[]
    }

    /// Fields fixed once the record exists; read-only in edit dialogs.
    fn immutable_fields() -> &'static [&'static str] {
        &[]
    }
}
