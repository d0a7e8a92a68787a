//! Resource models and the paginated wire envelope.
//!
//! The server paginates list endpoints in the conventional
//! `{results, count, next, previous}` shape; [`ApiPage`] is the wire-side
//! envelope and converts into the caller-facing
//! [`ListResult`](crate::ListResult).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::query::ListResult;

/// One page of a paginated list endpoint as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPage<T> {
    /// The items on this page.
    pub results: Vec<T>,
    /// Total number of matching items across all pages.
    pub count: u64,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> ApiPage<T> {
    /// Convert the wire envelope into a [`ListResult`] carrying the
    /// page/page-size of the query that produced it.
    pub fn into_list_result(self, page: u32, page_size: u32) -> ListResult<T> {
        ListResult {
            items: self.results,
            total_count: self.count,
            page,
            page_size,
        }
    }
}

/// A student record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub national_code: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub advisor_id: Option<i64>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An advisor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A supervisor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supervisor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A dashboard user account, for user/role management screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Writable fields for creating or updating a student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisor_id: Option<i64>,
}

/// Writable fields for creating or updating an advisor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<i64>,
}

fn default_active() -> bool {
    true
}
