use std::path::Path;

use rusqlite::{OptionalExtension, params};

use super::database::Database;
use crate::common::Credential;
use crate::error::ClientResult;

/// Key của credential trong bảng `session`.
pub const TOKEN_KEY: &str = "token";

/// Lưu credential bền vững giữa các lần khởi động.
///
/// Chỉ giữ đúng một giá trị dưới key [`TOKEN_KEY`]; `set` ghi đè giá trị cũ.
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn with_path<P: AsRef<Path>>(path: P) -> ClientResult<Self> {
        Self::from_database(Database::open(path)?)
    }

    #[cfg(test)]
    pub fn in_memory() -> ClientResult<Self> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> ClientResult<Self> {
        let store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> ClientResult<()> {
        self.db.connection().execute(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    pub fn load(&self) -> ClientResult<Option<Credential>> {
        let token = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![TOKEN_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(token.map(Credential::new))
    }

    pub fn set(&self, credential: &Credential) -> ClientResult<()> {
        self.db.connection().execute(
            "INSERT OR REPLACE INTO session (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![TOKEN_KEY, credential.as_str()],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> ClientResult<()> {
        self.db
            .connection()
            .execute("DELETE FROM session WHERE key = ?1", params![TOKEN_KEY])?;
        Ok(())
    }
}
