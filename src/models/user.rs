//! User rows and the request/response bodies of `/api/mysql-test`.

use serde::{Deserialize, Serialize};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
}

/// Request body for inserting a user.
///
/// ```json
/// { "name": "a", "age": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub age: i32,
}

/// Response body for `GET /api/mysql-test`.
///
/// ```json
/// {
///   "success": true,
///   "message": "Database connection succeeded",
///   "testData": [{ "id": 1, "name": "a", "age": 1 }]
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub success: bool,
    pub message: &'static str,
    pub test_data: Vec<User>,
}

impl ListUsersResponse {
    pub fn new(test_data: Vec<User>) -> Self {
        Self {
            success: true,
            message: "Database connection succeeded",
            test_data,
        }
    }
}

/// Response body for `POST /api/mysql-test` (201 Created).
///
/// ```json
/// { "success": true, "message": "Data inserted", "insertId": 42 }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: &'static str,
    pub insert_id: u64,
}

impl CreateUserResponse {
    pub fn new(insert_id: u64) -> Self {
        Self {
            success: true,
            message: "Data inserted",
            insert_id,
        }
    }
}
