use diesel::prelude::*;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path;

use crate::errors::*;
use crate::schema;

embed_migrations!("migrations");

/// Best-effort key-value store for resolved identifiers, cached snapshots
/// and server knowledge tokens.  It must survive starting cold or being
/// wiped: everything in it can be re-derived from the remote service.
pub struct Cache {
    connection: SqliteConnection,
    dry_run: bool,
}

impl Cache {
    pub fn establish_connection(database_file: &str, dry_run: bool) -> Result<Cache> {
        let parent = path::Path::new(database_file).parent().chain_err(|| {
            format!(
                "Failed to determine parent directory of database file path: {}",
                database_file
            )
        })?;
        fs::create_dir_all(parent)
            .chain_err(|| format!("Failed to create database directory: {}", parent.display()))?;
        debug!("Using database file: {}", database_file);
        let connection = SqliteConnection::establish(database_file)
            .chain_err(|| "Failed to establish SQLite database connection")?;
        embedded_migrations::run(&connection)
            .chain_err(|| "Failed to perform database schema migrations")?;
        Ok(Cache {
            connection,
            dry_run,
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key_: &str) -> Result<Option<T>> {
        use schema::cache_entries::dsl::*;
        schema::cache_entries::table
            .select(value)
            .filter(key.eq(key_))
            .first::<String>(&self.connection)
            .optional()
            .chain_err(|| format!("Failed to load cache entry: {}", key_))?
            .map(|json| {
                serde_json::from_str(&json).chain_err(|| {
                    format!(
                        "Failed to parse cache entry (try clearing the cache): {}",
                        key_
                    )
                })
            })
            .transpose()
    }

    /// Upsert a cache entry.  Skipped in dry-run mode so that a dry run never
    /// advances knowledge tokens or pins resolved identifiers.
    pub fn put<T: Serialize>(&self, key_: &str, value_: &T) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        use schema::cache_entries::dsl::*;
        let json = serde_json::to_string(value_)
            .chain_err(|| format!("Failed to serialize cache entry: {}", key_))?;
        diesel::replace_into(schema::cache_entries::table)
            .values((key.eq(key_), value.eq(json)))
            .execute(&self.connection)
            .chain_err(|| format!("Failed to save cache entry: {}", key_))?;
        Ok(())
    }

    /// Wipe every entry.  Not gated on dry run: the wipe is itself the
    /// operation the user asked for.
    pub fn clear(&self) -> Result<()> {
        diesel::delete(schema::cache_entries::table)
            .execute(&self.connection)
            .chain_err(|| "Failed to clear cache")?;
        Ok(())
    }
}
