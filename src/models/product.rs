use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_PRODUCT_VERSION: &str = "1.0.0";
pub const DEFAULT_EXPIRATION_DAYS: i32 = 365;
pub const DEFAULT_USAGE_LIMIT: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Days from issuance until a new key expires (<= 0 = keys never expire)
    pub default_expiration_days: i32,
    /// Activation ceiling copied onto new keys (0 = unlimited)
    pub default_usage_limit: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Expiration timestamp for a key issued at `issued_at`.
    pub fn expiration_from(&self, issued_at: i64) -> Option<i64> {
        (self.default_expiration_days > 0)
            .then(|| issued_at + i64::from(self.default_expiration_days) * crate::util::SECONDS_PER_DAY)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub default_expiration_days: Option<i32>,
    #[serde(default)]
    pub default_usage_limit: Option<i32>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Product name is required".into()));
        }
        if self.default_usage_limit.is_some_and(|l| l < 0) {
            return Err(AppError::Validation(
                "Default usage limit cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub default_expiration_days: Option<i32>,
    pub default_usage_limit: Option<i32>,
}

impl UpdateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Product name cannot be empty".into()));
        }
        if self.default_usage_limit.is_some_and(|l| l < 0) {
            return Err(AppError::Validation(
                "Default usage limit cannot be negative".into(),
            ));
        }
        Ok(())
    }
}
