use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::error::ClientResult;

/// Kết nối SQLite của client (file dữ liệu cục bộ).
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Mở file database, tạo thư mục cha nếu chưa có.
    pub fn open<P: AsRef<Path>>(path: P) -> ClientResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> ClientResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
