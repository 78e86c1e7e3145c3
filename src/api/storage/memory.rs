//! In-memory store backend.
//!
//! The default backend when no `DATABASE_URL` is configured. Entities
//! live in per-type arenas keyed by id, with parent ids as
//! back-references; the whole registry sits behind one `RwLock`, so a
//! mutating call is all-or-nothing by construction. An optional YAML
//! snapshot keeps the registry across restarts.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{StoreError, traits::FormStore};
use crate::models::{
    Field, FieldResponse, Form, FormSubmission, FormSummary, FormTree, Member, Section,
    SectionTree, SubmissionDetail,
};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Registry {
    members: HashMap<Uuid, Member>,
    forms: HashMap<Uuid, Form>,
    sections: HashMap<Uuid, Section>,
    fields: HashMap<Uuid, Field>,
    submissions: HashMap<Uuid, FormSubmission>,
    responses: HashMap<Uuid, FieldResponse>,
}

impl Registry {
    fn sections_of(&self, form_id: Uuid) -> Vec<Section> {
        let mut out: Vec<Section> = self
            .sections
            .values()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.order);
        out
    }

    fn fields_of(&self, section_id: Uuid) -> Vec<Field> {
        let mut out: Vec<Field> = self
            .fields
            .values()
            .filter(|f| f.section_id == section_id)
            .cloned()
            .collect();
        out.sort_by_key(|f| f.order);
        out
    }

    fn responses_of(&self, submission_id: Uuid) -> Vec<FieldResponse> {
        self.responses
            .values()
            .filter(|r| r.submission_id == submission_id)
            .cloned()
            .collect()
    }

    fn submissions_of(&self, form_id: Uuid) -> Vec<FormSubmission> {
        let mut out: Vec<FormSubmission> = self
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.submitted_at);
        out
    }

    /// Form id owning a field, walking field -> section -> form.
    fn form_of_field(&self, field_id: Uuid) -> Option<Uuid> {
        let field = self.fields.get(&field_id)?;
        self.sections.get(&field.section_id).map(|s| s.form_id)
    }

    fn detail(&self, submission: FormSubmission) -> SubmissionDetail {
        let responses = self.responses_of(submission.id);
        SubmissionDetail {
            submission,
            responses,
        }
    }
}

/// In-memory [`FormStore`] with optional YAML snapshot persistence.
pub struct MemoryStore {
    inner: RwLock<Registry>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
            snapshot_path: None,
        }
    }

    /// Loads the registry from a YAML snapshot if one exists, and saves
    /// back to the same file after every mutation.
    pub fn with_snapshot(path: &Path) -> Self {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create snapshot directory {:?}: {}", parent, e);
            }
        }
        let registry = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<Registry>(&raw) {
                Ok(reg) => {
                    info!(
                        "Loaded registry snapshot from {:?}: {} forms, {} members",
                        path,
                        reg.forms.len(),
                        reg.members.len()
                    );
                    reg
                }
                Err(e) => {
                    warn!("Snapshot {:?} unreadable, starting empty: {}", path, e);
                    Registry::default()
                }
            },
            Err(_) => Registry::default(),
        };
        Self {
            inner: RwLock::new(registry),
            snapshot_path: Some(path.to_path_buf()),
        }
    }

    fn persist(&self, registry: &Registry) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        match serde_yaml::to_string(registry) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(path, raw) {
                    warn!("Failed to write registry snapshot {:?}: {}", path, e);
                }
            }
            Err(e) => warn!("Failed to serialize registry snapshot: {}", e),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that every id in a bulk-reorder request belongs to the
/// claimed scope before anything is written.
fn check_scope(
    orders: &[(Uuid, i32)],
    scope_type: &str,
    scope_id: Uuid,
    entity_type: &str,
    belongs: impl Fn(Uuid) -> bool,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for (id, _) in orders {
        if !seen.insert(*id) {
            return Err(StoreError::Conflict(format!(
                "{} {} listed twice in reorder request",
                entity_type, id
            )));
        }
        if !belongs(*id) {
            return Err(StoreError::ScopeMismatch {
                entity_type: entity_type.to_string(),
                entity_id: id.to_string(),
                scope_type: scope_type.to_string(),
                scope_id: scope_id.to_string(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl FormStore for MemoryStore {
    // ---- members ----

    async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let reg = self.inner.read().await;
        let mut members: Vec<Member> = reg.members.values().cloned().collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>, StoreError> {
        Ok(self.inner.read().await.members.get(&member_id).cloned())
    }

    async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        let reg = self.inner.read().await;
        Ok(reg
            .members
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_member(&self, member: Member) -> Result<Member, StoreError> {
        let mut reg = self.inner.write().await;
        if reg
            .members
            .values()
            .any(|m| m.email.eq_ignore_ascii_case(&member.email))
        {
            return Err(StoreError::Conflict(format!(
                "member email already registered: {}",
                member.email
            )));
        }
        reg.members.insert(member.id, member.clone());
        self.persist(&reg);
        Ok(member)
    }

    async fn update_member(&self, member: Member) -> Result<Member, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.members.contains_key(&member.id) {
            return Err(StoreError::not_found("member", member.id));
        }
        if reg
            .members
            .values()
            .any(|m| m.id != member.id && m.email.eq_ignore_ascii_case(&member.email))
        {
            return Err(StoreError::Conflict(format!(
                "member email already registered: {}",
                member.email
            )));
        }
        reg.members.insert(member.id, member.clone());
        self.persist(&reg);
        Ok(member)
    }

    async fn delete_member(&self, member_id: Uuid) -> Result<(), StoreError> {
        let mut reg = self.inner.write().await;
        reg.members
            .remove(&member_id)
            .ok_or_else(|| StoreError::not_found("member", member_id))?;
        self.persist(&reg);
        Ok(())
    }

    // ---- forms ----

    async fn create_form(&self, form: Form, initial_section: Section) -> Result<Form, StoreError> {
        let mut reg = self.inner.write().await;
        reg.sections
            .insert(initial_section.id, initial_section);
        reg.forms.insert(form.id, form.clone());
        self.persist(&reg);
        Ok(form)
    }

    async fn list_form_summaries(&self) -> Result<Vec<FormSummary>, StoreError> {
        let reg = self.inner.read().await;
        let mut summaries: Vec<FormSummary> = reg
            .forms
            .values()
            .map(|form| {
                let sections = reg.sections_of(form.id);
                let field_count = sections
                    .iter()
                    .map(|s| reg.fields.values().filter(|f| f.section_id == s.id).count())
                    .sum();
                FormSummary {
                    id: form.id,
                    name: form.name.clone(),
                    description: form.description.clone(),
                    is_active: form.is_active,
                    created_by: form.created_by,
                    section_count: sections.len(),
                    field_count,
                    submission_count: reg
                        .submissions
                        .values()
                        .filter(|s| s.form_id == form.id)
                        .count(),
                    updated_at: form.updated_at,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn get_form(&self, form_id: Uuid) -> Result<Option<Form>, StoreError> {
        Ok(self.inner.read().await.forms.get(&form_id).cloned())
    }

    async fn get_form_tree(&self, form_id: Uuid) -> Result<Option<FormTree>, StoreError> {
        let reg = self.inner.read().await;
        let Some(form) = reg.forms.get(&form_id).cloned() else {
            return Ok(None);
        };
        let sections = reg
            .sections_of(form_id)
            .into_iter()
            .map(|section| {
                let fields = reg.fields_of(section.id);
                SectionTree { section, fields }
            })
            .collect();
        Ok(Some(FormTree { form, sections }))
    }

    async fn update_form(&self, form: Form) -> Result<Form, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&form.id) {
            return Err(StoreError::not_found("form", form.id));
        }
        reg.forms.insert(form.id, form.clone());
        self.persist(&reg);
        Ok(form)
    }

    async fn delete_form(&self, form_id: Uuid) -> Result<(), StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&form_id) {
            return Err(StoreError::not_found("form", form_id));
        }
        // Children first: responses, submissions, fields, sections, form.
        let submission_ids: HashSet<Uuid> = reg
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .map(|s| s.id)
            .collect();
        reg.responses
            .retain(|_, r| !submission_ids.contains(&r.submission_id));
        reg.submissions.retain(|_, s| s.form_id != form_id);

        let section_ids: HashSet<Uuid> = reg
            .sections
            .values()
            .filter(|s| s.form_id == form_id)
            .map(|s| s.id)
            .collect();
        reg.fields.retain(|_, f| !section_ids.contains(&f.section_id));
        reg.sections.retain(|_, s| s.form_id != form_id);
        reg.forms.remove(&form_id);
        self.persist(&reg);
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
        let mut reg = self.inner.write().await;
        reg.forms.insert(form.id, form);
        for section in sections {
            reg.sections.insert(section.id, section);
        }
        for field in fields {
            reg.fields.insert(field.id, field);
        }
        for submission in submissions {
            reg.submissions.insert(submission.id, submission);
        }
        for response in responses {
            reg.responses.insert(response.id, response);
        }
        self.persist(&reg);
        Ok(())
    }

    // ---- sections ----

    async fn create_section(&self, section: Section) -> Result<Section, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&section.form_id) {
            return Err(StoreError::not_found("form", section.form_id));
        }
        reg.sections.insert(section.id, section.clone());
        self.persist(&reg);
        Ok(section)
    }

    async fn insert_section_bundle(
        &self,
        section: Section,
        fields: Vec<Field>,
    ) -> Result<Section, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&section.form_id) {
            return Err(StoreError::not_found("form", section.form_id));
        }
        reg.sections.insert(section.id, section.clone());
        for field in fields {
            reg.fields.insert(field.id, field);
        }
        self.persist(&reg);
        Ok(section)
    }

    async fn list_sections(&self, form_id: Uuid) -> Result<Vec<Section>, StoreError> {
        Ok(self.inner.read().await.sections_of(form_id))
    }

    async fn get_section(&self, section_id: Uuid) -> Result<Option<Section>, StoreError> {
        Ok(self.inner.read().await.sections.get(&section_id).cloned())
    }

    async fn update_section(&self, section: Section) -> Result<Section, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.sections.contains_key(&section.id) {
            return Err(StoreError::not_found("section", section.id));
        }
        reg.sections.insert(section.id, section.clone());
        self.persist(&reg);
        Ok(section)
    }

    async fn delete_section(&self, section_id: Uuid) -> Result<(), StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.sections.contains_key(&section_id) {
            return Err(StoreError::not_found("section", section_id));
        }
        reg.fields.retain(|_, f| f.section_id != section_id);
        reg.sections.remove(&section_id);
        self.persist(&reg);
        Ok(())
    }

    async fn reorder_sections(
        &self,
        form_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Section>, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&form_id) {
            return Err(StoreError::not_found("form", form_id));
        }
        check_scope(orders, "form", form_id, "section", |id| {
            reg.sections.get(&id).map(|s| s.form_id) == Some(form_id)
        })?;
        let now = chrono::Utc::now();
        for (id, order) in orders {
            if let Some(section) = reg.sections.get_mut(id) {
                section.order = *order;
                section.updated_at = now;
            }
        }
        let updated = reg.sections_of(form_id);
        self.persist(&reg);
        Ok(updated)
    }

    // ---- fields ----

    async fn create_field(&self, field: Field) -> Result<Field, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.sections.contains_key(&field.section_id) {
            return Err(StoreError::not_found("section", field.section_id));
        }
        reg.fields.insert(field.id, field.clone());
        self.persist(&reg);
        Ok(field)
    }

    async fn list_fields(&self, section_id: Uuid) -> Result<Vec<Field>, StoreError> {
        Ok(self.inner.read().await.fields_of(section_id))
    }

    async fn get_field(&self, field_id: Uuid) -> Result<Option<Field>, StoreError> {
        Ok(self.inner.read().await.fields.get(&field_id).cloned())
    }

    async fn update_field(&self, field: Field) -> Result<Field, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.fields.contains_key(&field.id) {
            return Err(StoreError::not_found("field", field.id));
        }
        reg.fields.insert(field.id, field.clone());
        self.persist(&reg);
        Ok(field)
    }

    async fn delete_field(&self, field_id: Uuid) -> Result<(), StoreError> {
        let mut reg = self.inner.write().await;
        if reg.fields.remove(&field_id).is_none() {
            return Err(StoreError::not_found("field", field_id));
        }
        reg.responses.retain(|_, r| r.field_id != field_id);
        self.persist(&reg);
        Ok(())
    }

    async fn reorder_fields(
        &self,
        section_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Field>, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.sections.contains_key(&section_id) {
            return Err(StoreError::not_found("section", section_id));
        }
        check_scope(orders, "section", section_id, "field", |id| {
            reg.fields.get(&id).map(|f| f.section_id) == Some(section_id)
        })?;
        let now = chrono::Utc::now();
        for (id, order) in orders {
            if let Some(field) = reg.fields.get_mut(id) {
                field.order = *order;
                field.updated_at = now;
            }
        }
        let updated = reg.fields_of(section_id);
        self.persist(&reg);
        Ok(updated)
    }

    async fn move_field(
        &self,
        field_id: Uuid,
        new_section_id: Uuid,
        new_order: i32,
    ) -> Result<Field, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.sections.contains_key(&new_section_id) {
            return Err(StoreError::not_found("section", new_section_id));
        }
        let field = reg
            .fields
            .get_mut(&field_id)
            .ok_or_else(|| StoreError::not_found("field", field_id))?;
        field.section_id = new_section_id;
        field.order = new_order;
        field.updated_at = chrono::Utc::now();
        let moved = field.clone();
        self.persist(&reg);
        Ok(moved)
    }

    // ---- submissions ----

    async fn create_submission(
        &self,
        submission: FormSubmission,
        responses: Vec<FieldResponse>,
    ) -> Result<SubmissionDetail, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&submission.form_id) {
            return Err(StoreError::not_found("form", submission.form_id));
        }
        for response in &responses {
            match reg.form_of_field(response.field_id) {
                Some(owner) if owner == submission.form_id => {}
                Some(_) | None => {
                    return Err(StoreError::Integrity(format!(
                        "response references field {} outside form {}",
                        response.field_id, submission.form_id
                    )));
                }
            }
        }
        reg.submissions.insert(submission.id, submission.clone());
        for response in &responses {
            reg.responses.insert(response.id, response.clone());
        }
        self.persist(&reg);
        Ok(SubmissionDetail {
            submission,
            responses,
        })
    }

    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<SubmissionDetail>, StoreError> {
        let reg = self.inner.read().await;
        Ok(reg
            .submissions_of(form_id)
            .into_iter()
            .map(|s| reg.detail(s))
            .collect())
    }

    async fn get_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SubmissionDetail>, StoreError> {
        let reg = self.inner.read().await;
        Ok(reg
            .submissions
            .get(&submission_id)
            .cloned()
            .map(|s| reg.detail(s)))
    }

    async fn delete_submission(&self, submission_id: Uuid) -> Result<(), StoreError> {
        let mut reg = self.inner.write().await;
        if reg.submissions.remove(&submission_id).is_none() {
            return Err(StoreError::not_found("submission", submission_id));
        }
        reg.responses.retain(|_, r| r.submission_id != submission_id);
        self.persist(&reg);
        Ok(())
    }

    async fn delete_form_submissions(&self, form_id: Uuid) -> Result<usize, StoreError> {
        let mut reg = self.inner.write().await;
        if !reg.forms.contains_key(&form_id) {
            return Err(StoreError::not_found("form", form_id));
        }
        let submission_ids: HashSet<Uuid> = reg
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .map(|s| s.id)
            .collect();
        reg.responses
            .retain(|_, r| !submission_ids.contains(&r.submission_id));
        reg.submissions.retain(|_, s| s.form_id != form_id);
        self.persist(&reg);
        Ok(submission_ids.len())
    }
}
