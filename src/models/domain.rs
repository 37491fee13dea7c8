//! Domain records stored in the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Essential,
    Wants,
    Extra,
}

/// Registered account. The password hash never leaves the ledger.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email.clone(),
            nickname: record.nickname.clone(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub importance: Option<Importance>,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields of a category about to be created.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionType,
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
}

/// Fields of a transaction about to be created.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category_id: Uuid,
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub importance: Option<Importance>,
    pub transaction_date: NaiveDate,
}

/// Categories seeded for every new account: (name, colour, icon).
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 8] = [
    ("Transportation", "#FF6B6B", "car"),
    ("Food", "#4ECDC4", "restaurant"),
    ("Clothes", "#45B7D1", "shirt"),
    ("Gadget", "#96CEB4", "laptop"),
    ("Grocery", "#FFEAA7", "shopping-cart"),
    ("Rent", "#DDA0DD", "home"),
    ("Bills", "#98D8C8", "file-text"),
    ("Health", "#FF9500", "medical-outline"),
];

/// Colour given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#007AFF";
