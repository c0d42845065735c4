//! Object model: the declarative spec, the fetched record and the derived document.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::key::ObjectKey;

/// Kind name recorded in owner references that point at a [`SyncSpec`].
pub const SYNC_SPEC_KIND: &str = "PokemonSync";

/// Field mapping of a [`TargetDocument`].
pub type DocumentData = BTreeMap<String, String>;

/// Declarative object naming the subject to fetch and the document to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSpec {
    pub key: ObjectKey,
    /// Subject looked up in the external source (e.g. `pikachu`).
    pub subject_name: String,
    /// Name of the derived document, created in the spec's namespace.
    pub target_document_name: String,
}

impl SyncSpec {
    pub fn new(
        key: ObjectKey,
        subject_name: impl Into<String>,
        target_document_name: impl Into<String>,
    ) -> Self {
        Self {
            key,
            subject_name: subject_name.into(),
            target_document_name: target_document_name.into(),
        }
    }

    /// Key of the document this spec derives.
    pub fn target_key(&self) -> ObjectKey {
        self.key.sibling(self.target_document_name.clone())
    }
}

/// A [`SyncSpec`] as held by the spec store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSpec {
    pub spec: SyncSpec,
    /// Stable for the lifetime of the object; a re-created spec gets a new uid.
    pub uid: String,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StoredSpec {
    pub fn key(&self) -> &ObjectKey {
        &self.spec.key
    }

    /// Controller reference to this spec, recorded on derived documents.
    pub fn controller_reference(&self) -> OwnerReference {
        OwnerReference {
            kind: SYNC_SPEC_KIND.to_string(),
            name: self.spec.key.name.clone(),
            uid: self.uid.clone(),
            controller: true,
        }
    }
}

/// Link from a derived object to the object that owns it.
///
/// The owner lives in the same namespace as the owned object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default)]
    pub controller: bool,
}

/// Record returned by the external data source for one subject.
///
/// Missing or `null` fields decode as zero values; PokeAPI serves
/// `"base_experience": null` for many alternate forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_experience: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Derived key/value document with its optional controller owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDocument {
    #[serde(default)]
    pub data: DocumentData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerReference>,
}

impl TargetDocument {
    pub fn new(data: DocumentData, owner: Option<OwnerReference>) -> Self {
        Self { data, owner }
    }

    /// Owner of the document, if it is an object other than `uid`.
    pub fn foreign_owner(&self, uid: &str) -> Option<&OwnerReference> {
        self.owner.as_ref().filter(|owner| owner.uid != uid)
    }
}
