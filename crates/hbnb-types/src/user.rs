//! User types

use crate::base::BaseModel;
use serde::{Deserialize, Serialize};

/// User account
///
/// `password` only ever holds a hash. It is part of the durable snapshot but
/// is stripped from the public view (see [`crate::View`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Create a user from an already hashed password
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            email: email.into(),
            password: Some(password_hash.into()),
            first_name: None,
            last_name: None,
        }
    }
}
