//! Salesforce record types
//!
//! Only the handful of standard objects the enrollment sync touches are
//! modelled. Field names follow the Salesforce REST API casing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Field map posted as the JSON body of an sObject create call.
pub type SObjectProperties = serde_json::Map<String, serde_json::Value>;

/// Standard objects the client can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// `Account`
    Account,
    /// `Contact`
    Contact,
    /// `Contract`
    Contract,
}

impl ObjectType {
    /// API name used in REST paths and search record attributes.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Contact => "Contact",
            Self::Contract => "Contract",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for ObjectType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Account" => Ok(Self::Account),
            "Contact" => Ok(Self::Contact),
            "Contract" => Ok(Self::Contract),
            other => Err(DomainError::UnknownObjectType(other.to_string())),
        }
    }
}

/// `attributes` block carried by every record in a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttributes {
    /// sObject API name, e.g. `Contact`.
    #[serde(rename = "type")]
    pub object_type: String,
    /// REST URL of the record, when the API returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A Contact as returned by the search endpoint.
///
/// Search results only guarantee `attributes`; every other field is
/// optional and extra fields are preserved untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmContact {
    /// Record metadata.
    pub attributes: RecordAttributes,
    /// Salesforce record id.
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Parent account id.
    #[serde(rename = "AccountId", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Given name.
    #[serde(rename = "FirstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(rename = "LastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address used for lookup.
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Title (the course title at creation time).
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Any other fields present on the record.
    #[serde(flatten)]
    pub extra: SObjectProperties,
}

impl CrmContact {
    /// Returns true if a raw search record is typed as a Contact.
    #[must_use]
    pub fn is_contact_record(record: &serde_json::Value) -> bool {
        record
            .pointer("/attributes/type")
            .and_then(serde_json::Value::as_str)
            == Some(ObjectType::Contact.api_name())
    }
}

/// An Account created as the parent of a new Contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmAccount {
    /// Salesforce record id.
    pub id: String,
    /// Account name (the learner's display name).
    pub name: String,
}
