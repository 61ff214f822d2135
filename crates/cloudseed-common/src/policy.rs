//! IAM policy document model
//!
//! The document is built by the caller and handed to the provider unchanged;
//! it is only turned into JSON at the API boundary. Document and statement
//! keys this model does not name (`Id`, `Condition`, `NotAction`,
//! `NotResource`, ...) are carried through verbatim.

use crate::defaults::POLICY_VERSION;
use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};

/// A versioned, ordered list of statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement", deserialize_with = "one_or_many")]
    pub statements: Vec<Statement>,
    /// Other top-level keys such as `Id`
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Whether a statement grants or refuses its actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// The `Resource` element: a single selector or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceSelector {
    One(String),
    Many(Vec<String>),
}

/// One policy statement
///
/// `Action` and `Resource` are optional: statements written with `NotAction`
/// or `NotResource` keep those keys in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "some_one_or_many"
    )]
    pub action: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceSelector>,
    /// Any other statement keys, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PolicyDocument {
    /// Create a document with the current policy language version
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements,
            extra: serde_json::Map::new(),
        }
    }

    /// Serialize to the wire format the provider expects
    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string(self).map_err(|e| ValidationError::PolicyDocument(e.to_string()))
    }

    /// Parse a document from JSON
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::PolicyDocument(e.to_string()))
    }
}

impl Statement {
    /// An `Allow` statement over `actions` on `resource`
    pub fn allow<I, S>(actions: I, resource: ResourceSelector) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_effect(Effect::Allow, actions, resource)
    }

    /// A `Deny` statement over `actions` on `resource`
    pub fn deny<I, S>(actions: I, resource: ResourceSelector) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_effect(Effect::Deny, actions, resource)
    }

    fn with_effect<I, S>(effect: Effect, actions: I, resource: ResourceSelector) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sid: None,
            effect,
            action: Some(actions.into_iter().map(Into::into).collect()),
            resource: Some(resource),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }
}

impl ResourceSelector {
    /// Selector matching every resource
    pub fn any() -> Self {
        ResourceSelector::One("*".to_string())
    }
}

/// The policy language allows a bare value wherever a list is expected.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

fn some_one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    one_or_many(deserializer).map(Some)
}
