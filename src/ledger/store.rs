//! Ledger Store Module
//!
//! In-memory tables for users, categories and transactions behind an async
//! CRUD interface. The rest of the service treats it as a remote data store:
//! every call is awaited and may fail.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Category, NewCategory, NewTransaction, Transaction, TransactionType, UserRecord,
    DEFAULT_CATEGORIES,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    categories: HashMap<Uuid, Category>,
    transactions: HashMap<Uuid, Transaction>,
}

// == Ledger ==
/// Shared handle to the data store. Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    tables: Arc<RwLock<Tables>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // == Users ==
    /// Registers a user. Emails are unique.
    pub async fn create_user(
        &self,
        email: &str,
        nickname: &str,
        password_hash: String,
    ) -> Result<UserRecord, LedgerError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|user| user.email == email) {
            return Err(LedgerError::Conflict("User already registered".to_string()));
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            nickname: nickname.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<UserRecord> {
        let tables = self.tables.read().await;
        tables.users.values().find(|user| user.email == email).cloned()
    }

    pub async fn update_nickname(
        &self,
        user_id: Uuid,
        nickname: &str,
    ) -> Result<UserRecord, LedgerError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("User '{user_id}'")))?;
        user.nickname = nickname.to_string();
        Ok(user.clone())
    }

    // == Categories ==
    /// Lists a user's categories ordered by name.
    pub async fn list_categories(&self, user_id: Uuid) -> Result<Vec<Category>, LedgerError> {
        let tables = self.tables.read().await;
        Self::require_user(&tables, user_id)?;

        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|category| category.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// Creates a category. Names are unique per user, ignoring case.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        new: NewCategory,
    ) -> Result<Category, LedgerError> {
        let mut tables = self.tables.write().await;
        Self::require_user(&tables, user_id)?;

        let duplicate = tables.categories.values().any(|category| {
            category.user_id == user_id && category.name.eq_ignore_ascii_case(&new.name)
        });
        if duplicate {
            return Err(LedgerError::Conflict(format!(
                "Category '{}' already exists",
                new.name
            )));
        }

        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: new.name,
            kind: new.kind,
            color: new.color,
            icon: new.icon,
            is_default: new.is_default,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    /// Deletes a category and every transaction filed under it.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), LedgerError> {
        let mut tables = self.tables.write().await;
        match tables.categories.get(&category_id) {
            Some(category) if category.user_id == user_id => {}
            _ => return Err(LedgerError::NotFound(format!("Category '{category_id}'"))),
        }

        tables.categories.remove(&category_id);
        tables
            .transactions
            .retain(|_, transaction| transaction.category_id != category_id);
        Ok(())
    }

    /// Seeds the default expense categories for a new user.
    pub async fn seed_default_categories(&self, user_id: Uuid) -> Result<Vec<Category>, LedgerError> {
        for (name, color, icon) in DEFAULT_CATEGORIES {
            let new = NewCategory {
                name: name.to_string(),
                kind: TransactionType::Expense,
                color: color.to_string(),
                icon: Some(icon.to_string()),
                is_default: true,
            };
            match self.create_category(user_id, new).await {
                Ok(_) | Err(LedgerError::Conflict(_)) => {}
                Err(err) => return Err(err),
            }
        }
        self.list_categories(user_id).await
    }

    // == Transactions ==
    /// Lists a user's transactions, newest transaction date first.
    pub async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let tables = self.tables.read().await;
        Self::require_user(&tables, user_id)?;

        let mut transactions: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|transaction| transaction.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(transactions)
    }

    /// Records a transaction against one of the user's categories.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let mut tables = self.tables.write().await;
        Self::require_user(&tables, user_id)?;

        match tables.categories.get(&new.category_id) {
            Some(category) if category.user_id == user_id => {}
            _ => {
                return Err(LedgerError::NotFound(format!(
                    "Category '{}'",
                    new.category_id
                )))
            }
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id,
            category_id: new.category_id,
            kind: new.kind,
            amount: new.amount,
            description: new.description,
            importance: new.importance,
            transaction_date: new.transaction_date,
            created_at: Utc::now(),
        };
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    pub async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), LedgerError> {
        let mut tables = self.tables.write().await;
        match tables.transactions.get(&transaction_id) {
            Some(transaction) if transaction.user_id == user_id => {
                tables.transactions.remove(&transaction_id);
                Ok(())
            }
            _ => Err(LedgerError::NotFound(format!(
                "Transaction '{transaction_id}'"
            ))),
        }
    }

    fn require_user(tables: &Tables, user_id: Uuid) -> Result<(), LedgerError> {
        if tables.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("User '{user_id}'")))
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn ledger_with_user() -> (Ledger, Uuid) {
        let ledger = Ledger::new();
        let user = ledger
            .create_user("a@example.com", "alice", "hash".to_string())
            .await
            .unwrap();
        (ledger, user.id)
    }

    fn expense(category_id: Uuid, day: u32) -> NewTransaction {
        NewTransaction {
            category_id,
            kind: TransactionType::Expense,
            amount: 10.0,
            description: format!("day {day}"),
            importance: None,
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (ledger, _) = ledger_with_user().await;
        let result = ledger
            .create_user("a@example.com", "again", "hash".to_string())
            .await;
        assert!(matches!(result, Err(LedgerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_seed_default_categories() {
        let (ledger, user_id) = ledger_with_user().await;

        let categories = ledger.seed_default_categories(user_id).await.unwrap();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0].name, "Bills");
        assert!(categories.iter().all(|c| c.is_default));

        // Seeding twice does not duplicate
        let again = ledger.seed_default_categories(user_id).await.unwrap();
        assert_eq!(again.len(), 8);
    }

    #[tokio::test]
    async fn test_transactions_sorted_newest_first() {
        let (ledger, user_id) = ledger_with_user().await;
        let category = ledger.seed_default_categories(user_id).await.unwrap()[0].id;

        for day in [3, 1, 2] {
            ledger
                .create_transaction(user_id, expense(category, day))
                .await
                .unwrap();
        }

        let days: Vec<u32> = ledger
            .list_transactions(user_id)
            .await
            .unwrap()
            .iter()
            .map(|t| chrono::Datelike::day(&t.transaction_date))
            .collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_transaction_requires_own_category() {
        let (ledger, user_id) = ledger_with_user().await;
        let other = ledger
            .create_user("b@example.com", "bob", "hash".to_string())
            .await
            .unwrap();
        let foreign = ledger.seed_default_categories(other.id).await.unwrap()[0].id;

        let result = ledger.create_transaction(user_id, expense(foreign, 1)).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_category_cascades() {
        let (ledger, user_id) = ledger_with_user().await;
        let category = ledger.seed_default_categories(user_id).await.unwrap()[0].id;
        ledger
            .create_transaction(user_id, expense(category, 1))
            .await
            .unwrap();

        ledger.delete_category(user_id, category).await.unwrap();

        assert!(ledger.list_transactions(user_id).await.unwrap().is_empty());
        assert_eq!(ledger.list_categories(user_id).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_delete_transaction_of_other_user_is_not_found() {
        let (ledger, user_id) = ledger_with_user().await;
        let category = ledger.seed_default_categories(user_id).await.unwrap()[0].id;
        let transaction = ledger
            .create_transaction(user_id, expense(category, 1))
            .await
            .unwrap();

        let result = ledger.delete_transaction(Uuid::new_v4(), transaction.id).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
        assert!(ledger.delete_transaction(user_id, transaction.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let ledger = Ledger::new();
        assert!(ledger.list_categories(Uuid::new_v4()).await.is_err());
        assert!(ledger.update_nickname(Uuid::new_v4(), "x").await.is_err());
    }
}
