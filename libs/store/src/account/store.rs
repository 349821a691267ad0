use chrono::Utc;
use sqlx::{Error, SqliteConnection};

use crate::account::model::Account;
use crate::client::Client;

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ---------------------------
    // ACCOUNTS
    // ---------------------------

    pub async fn get_account(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
    ) -> Result<Option<Account>, Error> {
        let query = r#"
            SELECT address, token, amount, created_at
            FROM accounts
            WHERE address = ? AND token = ?
            "#;
        let account =
            sqlx::query_as(query).bind(address).bind(token).fetch_optional(&mut *conn).await?;

        Ok(account)
    }

    /// Creates the account at a zero balance unless it already exists.
    /// Returns whether a row was created.
    pub async fn insert_account(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
    ) -> Result<bool, Error> {
        let query = r#"
            INSERT OR IGNORE INTO accounts (address, token, amount, created_at)
            VALUES (?, ?, 0, ?)
            "#;
        let result = sqlx::query(query)
            .bind(address)
            .bind(token)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds `delta` to the stored balance in a single statement.
    /// Returns whether the account existed.
    pub async fn increment_account_balance(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
        delta: i64,
    ) -> Result<bool, Error> {
        let query = r#"
            UPDATE accounts
            SET amount = amount + ?
            WHERE address = ? AND token = ?
            "#;
        let result =
            sqlx::query(query).bind(delta).bind(address).bind(token).execute(&mut *conn).await?;

        Ok(result.rows_affected() == 1)
    }

    /// Like [`Store::increment_account_balance`], but leaves the row untouched
    /// and returns `false` when the result would be negative.
    pub async fn increment_account_balance_non_negative(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        token: &str,
        delta: i64,
    ) -> Result<bool, Error> {
        let query = r#"
            UPDATE accounts
            SET amount = amount + ?
            WHERE address = ? AND token = ? AND amount + ? >= 0
            "#;
        let result = sqlx::query(query)
            .bind(delta)
            .bind(address)
            .bind(token)
            .bind(delta)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_account(&self, address: &str, token: &str) -> Result<Option<Account>, Error> {
        let mut conn = self.client.pool().acquire().await?;
        self.get_account(&mut conn, address, token).await
    }

    pub async fn get_accounts_by_address(&self, address: &str) -> Result<Vec<Account>, Error> {
        let query = r#"
            SELECT address, token, amount, created_at
            FROM accounts
            WHERE address = ?
            ORDER BY token ASC
            "#;
        let accounts = sqlx::query_as(query).bind(address).fetch_all(self.client.pool()).await?;

        Ok(accounts)
    }

    pub async fn get_accounts(&self) -> Result<Vec<Account>, Error> {
        let query = r#"
            SELECT address, token, amount, created_at
            FROM accounts
            ORDER BY address ASC, token ASC
            "#;
        let accounts = sqlx::query_as(query).fetch_all(self.client.pool()).await?;

        Ok(accounts)
    }
}
