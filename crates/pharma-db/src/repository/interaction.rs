//! # Interaction Repository
//!
//! Known drug-drug interactions. Each pair is stored once; lookups match
//! either order and ignore case and surrounding whitespace.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use pharma_core::{Interaction, ValidationError};

/// Repository for drug interaction lookups.
#[derive(Debug, Clone)]
pub struct InteractionRepository {
    pool: SqlitePool,
}

impl InteractionRepository {
    /// Creates a new InteractionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InteractionRepository { pool }
    }

    /// Looks up the interaction between two drugs, in either order.
    ///
    /// `Ok(None)` means no known interaction, not that the pair is safe.
    pub async fn check(&self, drug_a: &str, drug_b: &str) -> DbResult<Option<Interaction>> {
        let drug_a = required("drug_a", drug_a)?;
        let drug_b = required("drug_b", drug_b)?;

        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT id, drug_a, drug_b, interaction, severity, recommendation
            FROM interactions
            WHERE (drug_a = ?1 COLLATE NOCASE AND drug_b = ?2 COLLATE NOCASE)
               OR (drug_a = ?2 COLLATE NOCASE AND drug_b = ?1 COLLATE NOCASE)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(drug_a)
        .bind(drug_b)
        .fetch_optional(&self.pool)
        .await?;

        debug!(drug_a, drug_b, found = interaction.is_some(), "Interaction lookup");
        Ok(interaction)
    }

    /// Every known interaction involving one drug.
    pub async fn list_for(&self, drug: &str) -> DbResult<Vec<Interaction>> {
        let drug = required("drug", drug)?;

        let interactions = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT id, drug_a, drug_b, interaction, severity, recommendation
            FROM interactions
            WHERE drug_a = ?1 COLLATE NOCASE OR drug_b = ?1 COLLATE NOCASE
            ORDER BY id
            "#,
        )
        .bind(drug)
        .fetch_all(&self.pool)
        .await?;

        Ok(interactions)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
