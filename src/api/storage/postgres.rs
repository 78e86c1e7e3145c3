//! PostgreSQL store backend.
//!
//! Uses sqlx for database operations and implements the [`FormStore`]
//! trait. Entities are stored as JSONB `data` columns alongside the id
//! and parent-id columns used for filtering; cascades are enforced by
//! the schema's foreign keys (see `migrations/`). Multi-row operations
//! run inside a single transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{StoreError, traits::FormStore};
use crate::models::{
    Field, FieldResponse, Form, FormSubmission, FormSummary, FormTree, Member, Section,
    SectionTree, SubmissionDetail,
};

/// PostgreSQL [`FormStore`] implementation.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(row: &sqlx::postgres::PgRow) -> Result<T, StoreError> {
    let data: serde_json::Value = row.try_get("data").map_err(db_err)?;
    serde_json::from_value(data)
        .map_err(|e| StoreError::Other(format!("failed to deserialize row: {}", e)))
}

fn encode<T: serde::Serialize>(entity: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(entity)
        .map_err(|e| StoreError::Other(format!("failed to serialize entity: {}", e)))
}

async fn insert_section(
    tx: &mut Transaction<'_, Postgres>,
    section: &Section,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO sections (id, form_id, ord, data, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(section.id)
    .bind(section.form_id)
    .bind(section.order)
    .bind(encode(section)?)
    .bind(section.created_at)
    .bind(section.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_field(
    tx: &mut Transaction<'_, Postgres>,
    field: &Field,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO fields (id, section_id, ord, data, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(field.id)
    .bind(field.section_id)
    .bind(field.order)
    .bind(encode(field)?)
    .bind(field.created_at)
    .bind(field.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_submission_row(
    tx: &mut Transaction<'_, Postgres>,
    submission: &FormSubmission,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO submissions (id, form_id, data, submitted_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(submission.id)
    .bind(submission.form_id)
    .bind(encode(submission)?)
    .bind(submission.submitted_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_response_row(
    tx: &mut Transaction<'_, Postgres>,
    response: &FieldResponse,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO responses (id, submission_id, field_id, data) VALUES ($1, $2, $3, $4)",
    )
    .bind(response.id)
    .bind(response.submission_id)
    .bind(response.field_id)
    .bind(encode(response)?)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Ids of fields that belong to the given form, restricted to `candidates`.
async fn fields_in_form(
    pool: &PgPool,
    form_id: Uuid,
    candidates: &[Uuid],
) -> Result<Vec<Uuid>, StoreError> {
    let rows = sqlx::query(
        "SELECT f.id FROM fields f
         JOIN sections s ON s.id = f.section_id
         WHERE s.form_id = $1 AND f.id = ANY($2)",
    )
    .bind(form_id)
    .bind(candidates)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;
    rows.iter()
        .map(|r| r.try_get::<Uuid, _>("id").map_err(db_err))
        .collect()
}

#[async_trait]
impl FormStore for PostgresStore {
    // ---- members ----

    async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query("SELECT data FROM members ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(decode).collect()
    }

    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query("SELECT data FROM members WHERE id = $1")
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(decode).transpose()
    }

    async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query("SELECT data FROM members WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(decode).transpose()
    }

    async fn create_member(&self, member: Member) -> Result<Member, StoreError> {
        if self.get_member_by_email(&member.email).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "member email already registered: {}",
                member.email
            )));
        }
        sqlx::query(
            "INSERT INTO members (id, email, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(member.id)
        .bind(&member.email)
        .bind(encode(&member)?)
        .bind(member.joined_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(member)
    }

    async fn update_member(&self, member: Member) -> Result<Member, StoreError> {
        if let Some(existing) = self.get_member_by_email(&member.email).await? {
            if existing.id != member.id {
                return Err(StoreError::Conflict(format!(
                    "member email already registered: {}",
                    member.email
                )));
            }
        }
        let result = sqlx::query(
            "UPDATE members SET email = $2, data = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(member.id)
        .bind(&member.email)
        .bind(encode(&member)?)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("member", member.id));
        }
        Ok(member)
    }

    async fn delete_member(&self, member_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("member", member_id));
        }
        Ok(())
    }

    // ---- forms ----

    async fn create_form(&self, form: Form, initial_section: Section) -> Result<Form, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            "INSERT INTO forms (id, name, data, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(form.id)
        .bind(&form.name)
        .bind(encode(&form)?)
        .bind(form.created_by)
        .bind(form.created_at)
        .bind(form.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        insert_section(&mut tx, &initial_section).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(form)
    }

    async fn list_form_summaries(&self) -> Result<Vec<FormSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT f.data,
                    (SELECT count(*) FROM sections s WHERE s.form_id = f.id) AS section_count,
                    (SELECT count(*) FROM fields fl
                       JOIN sections s ON s.id = fl.section_id
                      WHERE s.form_id = f.id) AS field_count,
                    (SELECT count(*) FROM submissions sub WHERE sub.form_id = f.id) AS submission_count
             FROM forms f
             ORDER BY f.updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let form: Form = decode(row)?;
                let section_count: i64 = row.try_get("section_count").map_err(db_err)?;
                let field_count: i64 = row.try_get("field_count").map_err(db_err)?;
                let submission_count: i64 = row.try_get("submission_count").map_err(db_err)?;
                Ok(FormSummary {
                    id: form.id,
                    name: form.name,
                    description: form.description,
                    is_active: form.is_active,
                    created_by: form.created_by,
                    section_count: section_count as usize,
                    field_count: field_count as usize,
                    submission_count: submission_count as usize,
                    updated_at: form.updated_at,
                })
            })
            .collect()
    }

    async fn get_form(&self, form_id: Uuid) -> Result<Option<Form>, StoreError> {
        let row = sqlx::query("SELECT data FROM forms WHERE id = $1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(decode).transpose()
    }

    async fn get_form_tree(&self, form_id: Uuid) -> Result<Option<FormTree>, StoreError> {
        let Some(form) = self.get_form(form_id).await? else {
            return Ok(None);
        };
        let sections = self.list_sections(form_id).await?;
        let mut tree = Vec::with_capacity(sections.len());
        for section in sections {
            let fields = self.list_fields(section.id).await?;
            tree.push(SectionTree { section, fields });
        }
        Ok(Some(FormTree {
            form,
            sections: tree,
        }))
    }

    async fn update_form(&self, form: Form) -> Result<Form, StoreError> {
        let result = sqlx::query(
            "UPDATE forms SET name = $2, data = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(form.id)
        .bind(&form.name)
        .bind(encode(&form)?)
        .bind(form.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("form", form.id));
        }
        Ok(form)
    }

    async fn delete_form(&self, form_id: Uuid) -> Result<(), StoreError> {
        // Foreign keys cascade sections -> fields and submissions -> responses.
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(form_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("form", form_id));
        }
        Ok(())
    }

    async fn insert_form_bundle(
        &self,
        form: Form,
        sections: Vec<Section>,
        fields: Vec<Field>,
        submissions: Vec<FormSubmission>,
        responses: Vec<FieldResponse>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            "INSERT INTO forms (id, name, data, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(form.id)
        .bind(&form.name)
        .bind(encode(&form)?)
        .bind(form.created_by)
        .bind(form.created_at)
        .bind(form.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        for section in &sections {
            insert_section(&mut tx, section).await?;
        }
        for field in &fields {
            insert_field(&mut tx, field).await?;
        }
        for submission in &submissions {
            insert_submission_row(&mut tx, submission).await?;
        }
        for response in &responses {
            insert_response_row(&mut tx, response).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    // ---- sections ----

    async fn create_section(&self, section: Section) -> Result<Section, StoreError> {
        if self.get_form(section.form_id).await?.is_none() {
            return Err(StoreError::not_found("form", section.form_id));
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_section(&mut tx, &section).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(section)
    }

    async fn insert_section_bundle(
        &self,
        section: Section,
        fields: Vec<Field>,
    ) -> Result<Section, StoreError> {
        if self.get_form(section.form_id).await?.is_none() {
            return Err(StoreError::not_found("form", section.form_id));
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_section(&mut tx, &section).await?;
        for field in &fields {
            insert_field(&mut tx, field).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(section)
    }

    async fn list_sections(&self, form_id: Uuid) -> Result<Vec<Section>, StoreError> {
        let rows = sqlx::query("SELECT data FROM sections WHERE form_id = $1 ORDER BY ord")
            .bind(form_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(decode).collect()
    }

    async fn get_section(&self, section_id: Uuid) -> Result<Option<Section>, StoreError> {
        let row = sqlx::query("SELECT data FROM sections WHERE id = $1")
            .bind(section_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(decode).transpose()
    }

    async fn update_section(&self, section: Section) -> Result<Section, StoreError> {
        let result = sqlx::query(
            "UPDATE sections SET ord = $2, data = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(section.id)
        .bind(section.order)
        .bind(encode(&section)?)
        .bind(section.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("section", section.id));
        }
        Ok(section)
    }

    async fn delete_section(&self, section_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(section_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("section", section_id));
        }
        Ok(())
    }

    async fn reorder_sections(
        &self,
        form_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Section>, StoreError> {
        let owned: Vec<Uuid> = self
            .list_sections(form_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        for (id, _) in orders {
            if !owned.contains(id) {
                return Err(StoreError::ScopeMismatch {
                    entity_type: "section".to_string(),
                    entity_id: id.to_string(),
                    scope_type: "form".to_string(),
                    scope_id: form_id.to_string(),
                });
            }
        }
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for (id, order) in orders {
            sqlx::query(
                "UPDATE sections
                 SET ord = $2,
                     data = jsonb_set(jsonb_set(data, '{order}', to_jsonb($2::int)),
                                      '{updated_at}', to_jsonb($3::timestamptz)),
                     updated_at = $3
                 WHERE id = $1",
            )
            .bind(id)
            .bind(order)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        self.list_sections(form_id).await
    }

    // ---- fields ----

    async fn create_field(&self, field: Field) -> Result<Field, StoreError> {
        if self.get_section(field.section_id).await?.is_none() {
            return Err(StoreError::not_found("section", field.section_id));
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_field(&mut tx, &field).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(field)
    }

    async fn list_fields(&self, section_id: Uuid) -> Result<Vec<Field>, StoreError> {
        let rows = sqlx::query("SELECT data FROM fields WHERE section_id = $1 ORDER BY ord")
            .bind(section_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(decode).collect()
    }

    async fn get_field(&self, field_id: Uuid) -> Result<Option<Field>, StoreError> {
        let row = sqlx::query("SELECT data FROM fields WHERE id = $1")
            .bind(field_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(decode).transpose()
    }

    async fn update_field(&self, field: Field) -> Result<Field, StoreError> {
        let result = sqlx::query(
            "UPDATE fields SET section_id = $2, ord = $3, data = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(field.id)
        .bind(field.section_id)
        .bind(field.order)
        .bind(encode(&field)?)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("field", field.id));
        }
        Ok(field)
    }

    async fn delete_field(&self, field_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM fields WHERE id = $1")
            .bind(field_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("field", field_id));
        }
        Ok(())
    }

    async fn reorder_fields(
        &self,
        section_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Field>, StoreError> {
        let owned: Vec<Uuid> = self
            .list_fields(section_id)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        for (id, _) in orders {
            if !owned.contains(id) {
                return Err(StoreError::ScopeMismatch {
                    entity_type: "field".to_string(),
                    entity_id: id.to_string(),
                    scope_type: "section".to_string(),
                    scope_id: section_id.to_string(),
                });
            }
        }
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for (id, order) in orders {
            sqlx::query(
                "UPDATE fields
                 SET ord = $2,
                     data = jsonb_set(jsonb_set(data, '{order}', to_jsonb($2::int)),
                                      '{updated_at}', to_jsonb($3::timestamptz)),
                     updated_at = $3
                 WHERE id = $1",
            )
            .bind(id)
            .bind(order)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        self.list_fields(section_id).await
    }

    async fn move_field(
        &self,
        field_id: Uuid,
        new_section_id: Uuid,
        new_order: i32,
    ) -> Result<Field, StoreError> {
        if self.get_section(new_section_id).await?.is_none() {
            return Err(StoreError::not_found("section", new_section_id));
        }
        let mut field = self
            .get_field(field_id)
            .await?
            .ok_or_else(|| StoreError::not_found("field", field_id))?;
        field.section_id = new_section_id;
        field.order = new_order;
        field.updated_at = chrono::Utc::now();
        self.update_field(field).await
    }

    // ---- submissions ----

    async fn create_submission(
        &self,
        submission: FormSubmission,
        responses: Vec<FieldResponse>,
    ) -> Result<SubmissionDetail, StoreError> {
        if self.get_form(submission.form_id).await?.is_none() {
            return Err(StoreError::not_found("form", submission.form_id));
        }
        let referenced: Vec<Uuid> = responses.iter().map(|r| r.field_id).collect();
        let in_form = fields_in_form(&self.pool, submission.form_id, &referenced).await?;
        for response in &responses {
            if !in_form.contains(&response.field_id) {
                return Err(StoreError::Integrity(format!(
                    "response references field {} outside form {}",
                    response.field_id, submission.form_id
                )));
            }
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_submission_row(&mut tx, &submission).await?;
        for response in &responses {
            insert_response_row(&mut tx, response).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(SubmissionDetail {
            submission,
            responses,
        })
    }

    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<SubmissionDetail>, StoreError> {
        let rows =
            sqlx::query("SELECT data FROM submissions WHERE form_id = $1 ORDER BY submitted_at")
                .bind(form_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        let submissions: Vec<FormSubmission> =
            rows.iter().map(decode).collect::<Result<_, _>>()?;
        let mut details = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let response_rows =
                sqlx::query("SELECT data FROM responses WHERE submission_id = $1")
                    .bind(submission.id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_err)?;
            let responses = response_rows.iter().map(decode).collect::<Result<_, _>>()?;
            details.push(SubmissionDetail {
                submission,
                responses,
            });
        }
        Ok(details)
    }

    async fn get_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SubmissionDetail>, StoreError> {
        let row = sqlx::query("SELECT data FROM submissions WHERE id = $1")
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let submission: FormSubmission = decode(&row)?;
        let response_rows = sqlx::query("SELECT data FROM responses WHERE submission_id = $1")
            .bind(submission.id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let responses = response_rows.iter().map(decode).collect::<Result<_, _>>()?;
        Ok(Some(SubmissionDetail {
            submission,
            responses,
        }))
    }

    async fn delete_submission(&self, submission_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(submission_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("submission", submission_id));
        }
        Ok(())
    }

    async fn delete_form_submissions(&self, form_id: Uuid) -> Result<usize, StoreError> {
        if self.get_form(form_id).await?.is_none() {
            return Err(StoreError::not_found("form", form_id));
        }
        let result = sqlx::query("DELETE FROM submissions WHERE form_id = $1")
            .bind(form_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() as usize)
    }
}
