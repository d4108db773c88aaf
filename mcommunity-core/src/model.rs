//! Identifiers and request bodies for the people and groups endpoints.
//!
//! This module defines:
//! - [`Uniqname`] - Per-person identifier
//! - [`GroupCn`] - Group common name
//! - [`PersonDn`] - Distinguished name of a person entry
//! - [`SearchRequest`] - Body of `/people/search/` and `/people/find/`
//! - [`NewGroup`], [`GroupPatch`], [`AttributeChange`], [`ExpireRequest`] - Group bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unique per-person identifier in the directory (e.g., "bjensen").
///
/// Normalized to lowercase.
///
/// # Examples
///
/// ```
/// use mcommunity_core::Uniqname;
///
/// let uid = Uniqname::new("BJensen");
/// assert_eq!(uid.as_str(), "bjensen");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uniqname(String);

impl Uniqname {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The person's DN, e.g. `uid=bjensen,ou=People,dc=umich,dc=edu`.
    pub fn dn(&self) -> PersonDn {
        PersonDn::new(self)
    }
}

impl fmt::Display for Uniqname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uniqname {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Uniqname {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Common name of a group. Kept as given; group names may contain spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupCn(String);

impl GroupCn {
    pub fn new(cn: impl Into<String>) -> Self {
        Self(cn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupCn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupCn {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for GroupCn {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Distinguished name of a person entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonDn(String);

impl PersonDn {
    /// Suffix of every person entry.
    pub const PEOPLE_BASE: &'static str = "ou=People,dc=umich,dc=edu";

    pub fn new(uid: &Uniqname) -> Self {
        Self(format!("uid={},{}", uid.as_str(), Self::PEOPLE_BASE))
    }

    /// Accept a DN as-is, or build one if given a bare uniqname.
    pub fn parse(value: &str) -> Self {
        if value.contains('=') {
            Self(value.to_string())
        } else {
            Self::new(&Uniqname::new(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonDn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a search part matches its attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Start,
    End,
    Contain,
    Exact,
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "contain" | "contains" => Ok(Self::Contain),
            "exact" => Ok(Self::Exact),
            _ => Err(format!("unknown search type: {} (start, end, contain, exact)", s)),
        }
    }
}

/// How search parts are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// One attribute criterion of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPart {
    pub attribute: String,
    pub value: String,
    pub search_type: SearchType,
}

impl SearchPart {
    pub fn new(attribute: impl Into<String>, search_type: SearchType, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            search_type,
        }
    }
}

/// Body of `POST /people/search/` and `POST /people/find/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_parts: Vec<SearchPart>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_entries: Option<u32>,

    /// Serialized as `null` when unset; the API accepts that for single-part searches.
    pub logical_operator: Option<LogicalOperator>,

    /// Attributes to return for each match.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(search_parts: Vec<SearchPart>) -> Self {
        Self {
            search_parts,
            num_entries: None,
            logical_operator: None,
            attributes: Vec::new(),
        }
    }

    /// Exact match on `uid`, returning `uid` and `mail`.
    pub fn exact_uid(uid: &Uniqname) -> Self {
        Self::new(vec![SearchPart::new("uid", SearchType::Exact, uid.as_str())])
            .with_attributes(["uid", "mail"])
    }

    pub fn with_num_entries(mut self, n: u32) -> Self {
        self.num_entries = Some(n);
        self
    }

    pub fn with_operator(mut self, op: LogicalOperator) -> Self {
        self.logical_operator = Some(op);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Body of `POST /groups/`.
///
/// `cn`, `umichGroupEmail`, `owner` and `umichDescription` are required by
/// the API; anything else goes in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroup {
    pub cn: GroupCn,

    /// Local part only, without the mail domain.
    #[serde(rename = "umichGroupEmail")]
    pub email: String,

    pub owner: Vec<PersonDn>,

    #[serde(rename = "umichDescription")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member: Vec<PersonDn>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewGroup {
    pub fn new(
        cn: impl Into<GroupCn>,
        email: impl Into<String>,
        owners: Vec<PersonDn>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            cn: cn.into(),
            email: email.into(),
            owner: owners,
            description: description.into(),
            member: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_members(mut self, members: Vec<PersonDn>) -> Self {
        self.member = members;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Body of `PATCH /groups/{cn}/`: attributes to replace.
///
/// A `null` value removes the attribute. Multi-valued attributes go through
/// [`AttributeChange`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupPatch(Map<String, Value>);

impl GroupPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(attribute.into(), value.into());
        self
    }

    pub fn remove(mut self, attribute: impl Into<String>) -> Self {
        self.0.insert(attribute.into(), Value::Null);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body of `POST /groups/{cn}/{attribute}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl AttributeChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, value: impl Into<String>) -> Self {
        self.add.push(value.into());
        self
    }

    pub fn delete(mut self, value: impl Into<String>) -> Self {
        self.delete.push(value.into());
        self
    }
}

/// Body of `POST /groups/{cn}/expire/`.
///
/// `days` until permanent deletion; the API accepts 7 to 365.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireRequest {
    pub days: u32,
}
