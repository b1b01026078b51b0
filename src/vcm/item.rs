//! Work items returned by the VCM service

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a work item or nested item represents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Member,
    Archive,
    Revision,
    ChangePackage,
    Other(String),
}

impl ModelKind {
    /// Classify a model type string
    ///
    /// Accepts the service's qualified names (`si.Member`) and the short
    /// names (`member`).
    pub fn parse(model_type: &str) -> Self {
        match model_type {
            "si.Member" | "member" => ModelKind::Member,
            "si.Archive" | "archive" => ModelKind::Archive,
            "si.Revision" | "revision" => ModelKind::Revision,
            "si.ChangePackage" | "change-package" => ModelKind::ChangePackage,
            other => ModelKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Member => write!(f, "member"),
            ModelKind::Archive => write!(f, "archive"),
            ModelKind::Revision => write!(f, "revision"),
            ModelKind::ChangePackage => write!(f, "change-package"),
            ModelKind::Other(other) => write!(f, "{other}"),
        }
    }
}

/// An item embedded in a field of another item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

/// Value of a named field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    /// A plain string value
    Scalar(String),
    /// A nested item; its identifier is the meaningful value
    #[serde(rename = "item")]
    Reference(ItemRef),
}

impl FieldValue {
    fn variant(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Reference(_) => "item",
        }
    }
}

/// One record of a query response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub model_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// 1-based position in the response, assigned while walking
    #[serde(skip)]
    pub position: usize,
}

impl WorkItem {
    pub fn kind(&self) -> ModelKind {
        ModelKind::parse(&self.model_type)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Value of a scalar field; fails if the field holds an item
    pub fn scalar(&self, name: &str) -> Result<Option<&str>> {
        match self.field(name) {
            None => Ok(None),
            Some(FieldValue::Scalar(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(self.mismatch(name, "scalar", other)),
        }
    }

    /// Identifier of the item referenced by a field; fails on a scalar
    pub fn reference_id(&self, name: &str) -> Result<Option<&str>> {
        match self.field(name) {
            None => Ok(None),
            Some(FieldValue::Reference(item)) => Ok(Some(item.id.as_str())),
            Some(other) => Err(self.mismatch(name, "item", other)),
        }
    }

    fn mismatch(&self, name: &str, expected: &str, found: &FieldValue) -> IngestError {
        IngestError::MalformedItem {
            position: self.position,
            item: self.id.clone(),
            reason: format!(
                "field `{name}` holds {} value, expected {expected}",
                found.variant()
            ),
        }
    }
}
