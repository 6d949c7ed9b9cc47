//! SQLite persistence for visitor identities.
//!
//! One connection behind a mutex. Every request runs its whole
//! read-modify-write inside [`UserStore::transaction`], so transitions are
//! serialised and the last committed write wins.

use crate::core::config::DatabaseTarget;
use crate::core::error::StoreError;
use crate::models::user::User;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Mutex, PoisonError};

const USER_COLUMNS: &str = "id, ip_address, username, username_unfinished, unicode_string, \
     color, color_red, color_green, color_blue, registration_time, last_seen";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        ip_address          TEXT NOT NULL,
        username            TEXT NOT NULL DEFAULT '',
        username_unfinished TEXT NOT NULL DEFAULT '',
        unicode_string      TEXT NOT NULL DEFAULT '',
        color               TEXT NOT NULL DEFAULT '#ffffff',
        color_red           INTEGER NOT NULL DEFAULT 255,
        color_green         INTEGER NOT NULL DEFAULT 255,
        color_blue          INTEGER NOT NULL DEFAULT 255,
        registration_time   INTEGER NOT NULL,
        last_seen           INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_users_ip_address
        ON users(ip_address);

    CREATE INDEX IF NOT EXISTS idx_users_registration_time
        ON users(registration_time);
";

/// Persistent user table backed by SQLite
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open or create the database and bootstrap the schema
    pub fn open(target: &DatabaseTarget) -> Result<Self, StoreError> {
        let conn = match target {
            DatabaseTarget::Memory => Connection::open_in_memory()?,
            DatabaseTarget::File(path) => {
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
                conn
            }
        };

        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&DatabaseTarget::Memory)
    }

    /// Run `f` inside one transaction, committing only if it succeeds
    pub fn transaction<T, E>(&self, f: impl FnOnce(&UserTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = UserTx {
            tx: conn.transaction().map_err(StoreError::from)?,
        };

        let value = f(&tx)?;
        tx.tx.commit().map_err(StoreError::from)?;

        Ok(value)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Operations available inside [`UserStore::transaction`]
pub struct UserTx<'conn> {
    tx: Transaction<'conn>,
}

impl UserTx<'_> {
    /// The identity currently bound to `ip_address`.
    ///
    /// After a "login as" two rows can share an address; the most recently
    /// seen one resolves.
    pub fn find_by_ip(&self, ip_address: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ip_address = ?1
             ORDER BY last_seen DESC, id DESC LIMIT 1"
        );
        let user = self
            .tx
            .query_row(&sql, params![ip_address], user_from_row)
            .optional()?;
        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = self
            .tx
            .query_row(&sql, params![id], user_from_row)
            .optional()?;
        Ok(user)
    }

    /// Insert a new row and return it with its assigned id
    pub fn insert(&self, user: &User) -> Result<User, StoreError> {
        self.tx.execute(
            "INSERT INTO users (ip_address, username, username_unfinished, unicode_string,
                                color, color_red, color_green, color_blue,
                                registration_time, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.ip_address,
                user.username,
                user.username_unfinished,
                user.unicode_string,
                user.color,
                user.color_red,
                user.color_green,
                user.color_blue,
                user.registration_time,
                user.last_seen,
            ],
        )?;

        let id = self.tx.last_insert_rowid();
        self.find_by_id(id)?
            .ok_or(StoreError::MissingAfterInsert(id))
    }

    /// Write every mutable column back. `registration_time` is never updated.
    pub fn save(&self, user: &User) -> Result<(), StoreError> {
        self.tx.execute(
            "UPDATE users SET ip_address = ?2, username = ?3, username_unfinished = ?4,
                              unicode_string = ?5, color = ?6, color_red = ?7,
                              color_green = ?8, color_blue = ?9, last_seen = ?10
             WHERE id = ?1",
            params![
                user.id,
                user.ip_address,
                user.username,
                user.username_unfinished,
                user.unicode_string,
                user.color,
                user.color_red,
                user.color_green,
                user.color_blue,
                user.last_seen,
            ],
        )?;
        Ok(())
    }

    /// Returns true if a row was removed
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self.tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Finished users, newest registration first
    pub fn finished_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username != ''
             ORDER BY registration_time DESC, id DESC"
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        ip_address: row.get(1)?,
        username: row.get(2)?,
        username_unfinished: row.get(3)?,
        unicode_string: row.get(4)?,
        color: row.get(5)?,
        color_red: row.get(6)?,
        color_green: row.get(7)?,
        color_blue: row.get(8)?,
        registration_time: row.get(9)?,
        last_seen: row.get(10)?,
    })
}
