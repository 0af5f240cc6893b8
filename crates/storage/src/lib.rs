use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{Kingdom, Species, SpeciesFields, SpeciesId, UserId},
    protocol::OwnerScope,
};

const SPECIES_COLUMNS: &str =
    "id, owner_id, scientific_name, common_name, kingdom, total_population, description, image, created_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite database url '{database_url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply species migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_species(&self, owner: UserId, fields: &SpeciesFields) -> Result<SpeciesId> {
        let rec = sqlx::query(
            "INSERT INTO species (owner_id, scientific_name, common_name, kingdom, total_population, description, image)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(owner.0)
        .bind(&fields.scientific_name)
        .bind(&fields.common_name)
        .bind(fields.kingdom.as_str())
        .bind(fields.total_population)
        .bind(&fields.description)
        .bind(&fields.image)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert species")?;
        Ok(SpeciesId(rec.get::<i64, _>(0)))
    }

    pub async fn get_species(&self, species_id: SpeciesId) -> Result<Option<Species>> {
        let row = sqlx::query(&format!("SELECT {SPECIES_COLUMNS} FROM species WHERE id = ?"))
            .bind(species_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| species_from_row(&row)).transpose()
    }

    /// Lists every species, oldest first.
    pub async fn list_species(&self) -> Result<Vec<Species>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(species_from_row).collect()
    }

    pub async fn list_species_for_owner(&self, owner: UserId) -> Result<Vec<Species>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species WHERE owner_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(species_from_row).collect()
    }

    /// Rewrites the editable columns of one species. Returns the number of rows
    /// touched, which is zero unless both id and owner match.
    pub async fn update_species_owned(&self, scope: OwnerScope, fields: &SpeciesFields) -> Result<u64> {
        let updated = sqlx::query(
            "UPDATE species
             SET scientific_name = ?, common_name = ?, kingdom = ?, total_population = ?, description = ?, image = ?
             WHERE id = ? AND owner_id = ?",
        )
        .bind(&fields.scientific_name)
        .bind(&fields.common_name)
        .bind(fields.kingdom.as_str())
        .bind(fields.total_population)
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(scope.id.0)
        .bind(scope.owner.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update species {}", scope.id))?
        .rows_affected();
        Ok(updated)
    }

    pub async fn delete_species_owned(&self, scope: OwnerScope) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM species WHERE id = ? AND owner_id = ?")
            .bind(scope.id.0)
            .bind(scope.owner.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete species {}", scope.id))?
            .rows_affected();
        Ok(deleted)
    }
}

fn species_from_row(row: &SqliteRow) -> Result<Species> {
    let id = SpeciesId(row.get::<i64, _>("id"));
    let kingdom_raw: String = row.get("kingdom");
    let kingdom = Kingdom::from_str(&kingdom_raw)
        .map_err(|err| anyhow!("species {id} has invalid kingdom: {err}"))?;
    Ok(Species {
        id,
        owner: UserId(row.get::<i64, _>("owner_id")),
        scientific_name: row.get("scientific_name"),
        common_name: row.get("common_name"),
        kingdom,
        total_population: row.get("total_population"),
        description: row.get("description"),
        image: row.get("image"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
