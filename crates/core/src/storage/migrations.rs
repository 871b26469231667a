//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Shared room store migrations
pub const ROOM_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Rooms and participants",
        sql: r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                -- JSON array of YYYY-MM-DD strings
                candidate_dates TEXT NOT NULL,
                confirmed_date TEXT,
                confirmed_location TEXT,
                treasurer TEXT,
                roulette_title TEXT NOT NULL DEFAULT '누가 쏴?',
                host_token TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS participants (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL,
                nickname TEXT NOT NULL,
                voted_dates TEXT NOT NULL DEFAULT '[]',
                location_lat REAL,
                location_lng REAL,
                location_name TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (room_id, nickname),
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_participants_room
                ON participants(room_id, created_at);
        "#,
    },
];

/// Client-local store migrations
pub const LOCAL_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Local key/value state",
        sql: r#"
            CREATE TABLE IF NOT EXISTS local_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
];

fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations from the given set
#[instrument(skip(conn, migrations))]
pub fn run_migrations(conn: &Connection, migrations: &[Migration]) -> Result<()> {
    init_migrations_table(conn)?;

    let current = current_version(conn)?;
    info!(current_version = current, "Checking for pending migrations");

    for migration in migrations.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        conn.execute_batch(migration.sql)?;
        record_migration(conn, migration)?;
    }

    let new_version = current_version(conn)?;
    if new_version > current {
        info!(from = current, to = new_version, "Database schema updated");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest(migrations: &[Migration]) -> u32 {
        migrations.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, ROOM_MIGRATIONS).unwrap();
        run_migrations(&conn, ROOM_MIGRATIONS).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest(ROOM_MIGRATIONS));
    }

    #[test]
    fn test_migrations_sequential() {
        for set in [ROOM_MIGRATIONS, LOCAL_MIGRATIONS] {
            for (i, migration) in set.iter().enumerate() {
                assert_eq!(
                    migration.version as usize,
                    i + 1,
                    "Migration {} should have version {}",
                    migration.description,
                    i + 1
                );
            }
        }
    }

    #[test]
    fn test_nickname_unique_per_room() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, ROOM_MIGRATIONS).unwrap();
        conn.execute_batch(
            "INSERT INTO rooms (id, name, candidate_dates, host_token, created_at, updated_at)
             VALUES ('r1', 'a', '[]', 't', 'now', 'now'), ('r2', 'b', '[]', 't', 'now', 'now');
             INSERT INTO participants (id, room_id, nickname, created_at) VALUES ('p1', 'r1', 'kim', 'now');
             INSERT INTO participants (id, room_id, nickname, created_at) VALUES ('p2', 'r2', 'kim', 'now');",
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO participants (id, room_id, nickname, created_at) VALUES ('p3', 'r1', 'kim', 'now')",
            [],
        );
        assert!(super::super::parse::is_unique_violation(&dup.unwrap_err()));
    }
}
