//! Form tree CRUD service.
//!
//! Every operation follows the same shape: resolve permission, mutate
//! through the store, then mark the owning form's page paths stale.
//! Reorders and duplications are single store calls so they commit
//! together or not at all.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::analytics::{self, FormAnalytics};
use super::ordering::{self, OrderUpdate};
use super::page_cache::{self, PageCache};
use super::permission::{Caller, PermissionResolver};
use super::validation::{self, ValidationReport};
use super::ServiceError;
use crate::models::{
    Field, FieldOption, FieldResponse, FieldType, Form, FormSubmission, FormSummary, FormTree,
    Section, SubmissionDetail,
};
use crate::storage::FormStore;

/// Input for creating or patching a field. Optional payloads default to
/// "leave unchanged" on update and "empty" on create.
#[derive(Debug, Default, Clone)]
pub struct FieldInput {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    pub order: Option<i32>,
    pub options: Option<Vec<FieldOption>>,
    pub default_value: Option<serde_json::Value>,
    pub validation: Option<serde_json::Value>,
    pub styling: Option<serde_json::Value>,
    pub logic: Option<serde_json::Value>,
}

pub struct FormService {
    store: Arc<dyn FormStore>,
    permissions: PermissionResolver,
    page_cache: Arc<dyn PageCache>,
}

impl FormService {
    pub fn new(store: Arc<dyn FormStore>, page_cache: Arc<dyn PageCache>) -> Self {
        Self {
            permissions: PermissionResolver::new(store.clone()),
            store,
            page_cache,
        }
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    fn notify(&self, form_id: Uuid) {
        self.page_cache.mark_stale(&page_cache::form_paths(form_id));
    }

    // ---- forms ----

    pub async fn list_forms(&self, caller: &Caller) -> Result<Vec<FormSummary>, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        Ok(self.store.list_form_summaries().await?)
    }

    pub async fn get_form(&self, caller: &Caller, form_id: Uuid) -> Result<FormTree, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        self.store
            .get_form_tree(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))
    }

    /// Creates a form with its initial "Section 1", so the at-least-one
    /// -section invariant holds from birth.
    pub async fn create_form(
        &self,
        caller: &Caller,
        name: &str,
        description: Option<String>,
        image_url: Option<String>,
    ) -> Result<FormTree, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Form name is required".to_string()));
        }
        let mut form = Form::new(name.to_string(), description, caller.member_id);
        form.image_url = image_url;
        let initial = Section::new(form.id, Some("Section 1".to_string()), 0);
        let form = self.store.create_form(form, initial).await?;
        info!("form {} created by {}", form.id, caller.email);
        self.notify(form.id);
        self.store
            .get_form_tree(form.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form.id))
    }

    pub async fn update_form(
        &self,
        caller: &Caller,
        form_id: Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
        image_url: Option<Option<String>>,
    ) -> Result<Form, ServiceError> {
        let mut form = self.permissions.authorize_form_write(caller, form_id).await?;
        if let Some(name) = name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::Validation("Form name is required".to_string()));
            }
            form.name = name;
        }
        if let Some(description) = description {
            form.description = description;
        }
        if let Some(image_url) = image_url {
            form.image_url = image_url;
        }
        form.updated_at = Utc::now();
        let form = self.store.update_form(form).await?;
        self.notify(form.id);
        Ok(form)
    }

    pub async fn delete_form(&self, caller: &Caller, form_id: Uuid) -> Result<(), ServiceError> {
        self.permissions.authorize_form_write(caller, form_id).await?;
        self.store.delete_form(form_id).await?;
        info!("form {} deleted by {}", form_id, caller.email);
        self.notify(form_id);
        Ok(())
    }

    /// Publish gate: activation runs the structure validator first and
    /// is rejected with the aggregated issue list when it fails.
    pub async fn publish_form(
        &self,
        caller: &Caller,
        form_id: Uuid,
        is_active: bool,
    ) -> Result<Form, ServiceError> {
        let mut form = self.permissions.authorize_form_write(caller, form_id).await?;
        if is_active {
            let tree = self
                .store
                .get_form_tree(form_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("form", form_id))?;
            let report = validation::validate_form_structure(&tree);
            if !report.valid {
                return Err(ServiceError::Validation(report.issues.join("; ")));
            }
        }
        form.is_active = is_active;
        form.updated_at = Utc::now();
        let form = self.store.update_form(form).await?;
        info!(
            "form {} {} by {}",
            form.id,
            if is_active { "published" } else { "unpublished" },
            caller.email
        );
        self.notify(form.id);
        Ok(form)
    }

    pub async fn validate_form(
        &self,
        caller: &Caller,
        form_id: Uuid,
    ) -> Result<ValidationReport, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        let tree = self
            .store
            .get_form_tree(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;
        Ok(validation::validate_form_structure(&tree))
    }

    /// Deep-copies a form and everything it owns. Responses are carried
    /// through an explicit old-field-id -> new-field-id map, so cloned
    /// answers always land on the intended copy of their field.
    pub async fn clone_form(
        &self,
        caller: &Caller,
        form_id: Uuid,
        title: Option<String>,
        include_submissions: bool,
    ) -> Result<FormTree, ServiceError> {
        self.permissions.authorize_form_write(caller, form_id).await?;
        let tree = self
            .store
            .get_form_tree(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;

        let now = Utc::now();
        let mut new_form = tree.form.clone();
        new_form.id = Uuid::new_v4();
        new_form.name = title.unwrap_or_else(|| format!("{} (Copy)", tree.form.name));
        new_form.created_by = caller.member_id;
        new_form.is_active = false;
        new_form.created_at = now;
        new_form.updated_at = now;

        let mut sections = Vec::new();
        let mut fields = Vec::new();
        let mut field_ids: HashMap<Uuid, Uuid> = HashMap::new();
        for entry in &tree.sections {
            let mut section = entry.section.clone();
            section.id = Uuid::new_v4();
            section.form_id = new_form.id;
            section.created_at = now;
            section.updated_at = now;
            for field in &entry.fields {
                let mut copy = field.clone();
                copy.id = Uuid::new_v4();
                copy.section_id = section.id;
                copy.created_at = now;
                copy.updated_at = now;
                field_ids.insert(field.id, copy.id);
                fields.push(copy);
            }
            sections.push(section);
        }

        let mut submissions = Vec::new();
        let mut responses = Vec::new();
        if include_submissions {
            for detail in self.store.list_submissions(form_id).await? {
                let mut submission = detail.submission.clone();
                submission.id = Uuid::new_v4();
                submission.form_id = new_form.id;
                for response in &detail.responses {
                    let new_field_id = field_ids.get(&response.field_id).ok_or_else(|| {
                        ServiceError::Invariant(format!(
                            "response references field {} missing from form {}",
                            response.field_id, form_id
                        ))
                    })?;
                    let mut copy = response.clone();
                    copy.id = Uuid::new_v4();
                    copy.submission_id = submission.id;
                    copy.field_id = *new_field_id;
                    responses.push(copy);
                }
                submissions.push(submission);
            }
        }

        let new_id = new_form.id;
        self.store
            .insert_form_bundle(new_form, sections, fields, submissions, responses)
            .await?;
        info!("form {} cloned to {} by {}", form_id, new_id, caller.email);
        self.notify(new_id);
        self.store
            .get_form_tree(new_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", new_id))
    }

    // ---- sections ----

    pub async fn create_section(
        &self,
        caller: &Caller,
        form_id: Uuid,
        title: Option<String>,
        order: Option<i32>,
    ) -> Result<Section, ServiceError> {
        self.permissions.authorize_form_write(caller, form_id).await?;
        let existing = self.store.list_sections(form_id).await?;
        let order = order.unwrap_or_else(|| ordering::next_order(existing.iter().map(|s| s.order)));
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Section {}", existing.len() + 1));
        let section = self
            .store
            .create_section(Section::new(form_id, Some(title), order))
            .await?;
        self.notify(form_id);
        Ok(section)
    }

    pub async fn update_section(
        &self,
        caller: &Caller,
        section_id: Uuid,
        title: Option<Option<String>>,
        order: Option<i32>,
    ) -> Result<Section, ServiceError> {
        let (mut section, form) = self
            .permissions
            .authorize_section_write(caller, section_id)
            .await?;
        if let Some(title) = title {
            section.title = title.filter(|t| !t.trim().is_empty());
        }
        if let Some(order) = order {
            section.order = order;
        }
        section.updated_at = Utc::now();
        let section = self.store.update_section(section).await?;
        self.notify(form.id);
        Ok(section)
    }

    /// Rejected when the section is the form's only one; the count is
    /// taken from live rows, not a cached value.
    pub async fn delete_section(
        &self,
        caller: &Caller,
        section_id: Uuid,
    ) -> Result<(), ServiceError> {
        let (section, form) = self
            .permissions
            .authorize_section_write(caller, section_id)
            .await?;
        let live = self.store.list_sections(form.id).await?;
        if live.len() <= 1 {
            return Err(ServiceError::Invariant(
                "Cannot delete the only section of a form".to_string(),
            ));
        }
        self.store.delete_section(section.id).await?;
        self.notify(form.id);
        Ok(())
    }

    /// Copies a section and its fields, appended at the end of the form.
    pub async fn duplicate_section(
        &self,
        caller: &Caller,
        section_id: Uuid,
    ) -> Result<Section, ServiceError> {
        let (section, form) = self
            .permissions
            .authorize_section_write(caller, section_id)
            .await?;
        let siblings = self.store.list_sections(form.id).await?;
        let now = Utc::now();

        let mut copy = section.clone();
        copy.id = Uuid::new_v4();
        copy.order = ordering::next_order(siblings.iter().map(|s| s.order));
        copy.created_at = now;
        copy.updated_at = now;

        let fields = self
            .store
            .list_fields(section.id)
            .await?
            .into_iter()
            .map(|mut field| {
                field.id = Uuid::new_v4();
                field.section_id = copy.id;
                field.created_at = now;
                field.updated_at = now;
                field
            })
            .collect();

        let created = self.store.insert_section_bundle(copy, fields).await?;
        self.notify(form.id);
        Ok(created)
    }

    /// All-or-nothing: any id outside the form fails the whole request
    /// and no order changes.
    pub async fn reorder_sections(
        &self,
        caller: &Caller,
        form_id: Uuid,
        updates: &[OrderUpdate],
    ) -> Result<Vec<Section>, ServiceError> {
        self.permissions.authorize_form_write(caller, form_id).await?;
        let sections = self
            .store
            .reorder_sections(form_id, &ordering::to_pairs(updates))
            .await?;
        self.notify(form_id);
        Ok(sections)
    }

    // ---- fields ----

    pub async fn get_section_fields(
        &self,
        caller: &Caller,
        section_id: Uuid,
    ) -> Result<Vec<Field>, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        self.store
            .get_section(section_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("section", section_id))?;
        Ok(self.store.list_fields(section_id).await?)
    }

    pub async fn create_field(
        &self,
        caller: &Caller,
        section_id: Uuid,
        input: FieldInput,
    ) -> Result<Field, ServiceError> {
        let (section, form) = self
            .permissions
            .authorize_section_write(caller, section_id)
            .await?;
        let label = input
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ServiceError::Validation("Field label is required".to_string()))?;
        let field_type = input
            .field_type
            .ok_or_else(|| ServiceError::Validation("Field type is required".to_string()))?;

        let order = match input.order {
            Some(order) => order,
            None => {
                let siblings = self.store.list_fields(section.id).await?;
                ordering::next_order(siblings.iter().map(|f| f.order))
            }
        };

        let mut field = Field::new(section.id, label.to_string(), field_type, order);
        field.placeholder = input.placeholder;
        field.required = input.required.unwrap_or(false);
        field.options = input.options.unwrap_or_default();
        field.default_value = input.default_value;
        field.validation = input.validation;
        field.styling = input.styling;
        field.logic = input.logic;

        let field = self.store.create_field(field).await?;
        self.notify(form.id);
        Ok(field)
    }

    pub async fn update_field(
        &self,
        caller: &Caller,
        field_id: Uuid,
        input: FieldInput,
    ) -> Result<Field, ServiceError> {
        let (mut field, _section, form) = self
            .permissions
            .authorize_field_write(caller, field_id)
            .await?;
        if let Some(label) = input.label {
            let label = label.trim().to_string();
            if label.is_empty() {
                return Err(ServiceError::Validation("Field label is required".to_string()));
            }
            field.label = label;
        }
        if let Some(field_type) = input.field_type {
            field.field_type = field_type;
        }
        if input.placeholder.is_some() {
            field.placeholder = input.placeholder;
        }
        if let Some(required) = input.required {
            field.required = required;
        }
        if let Some(order) = input.order {
            field.order = order;
        }
        if let Some(options) = input.options {
            field.options = options;
        }
        if input.default_value.is_some() {
            field.default_value = input.default_value;
        }
        if input.validation.is_some() {
            field.validation = input.validation;
        }
        if input.styling.is_some() {
            field.styling = input.styling;
        }
        if input.logic.is_some() {
            field.logic = input.logic;
        }
        field.updated_at = Utc::now();
        let field = self.store.update_field(field).await?;
        self.notify(form.id);
        Ok(field)
    }

    pub async fn delete_field(&self, caller: &Caller, field_id: Uuid) -> Result<(), ServiceError> {
        let (field, _section, form) = self
            .permissions
            .authorize_field_write(caller, field_id)
            .await?;
        self.store.delete_field(field.id).await?;
        self.notify(form.id);
        Ok(())
    }

    pub async fn duplicate_field(
        &self,
        caller: &Caller,
        field_id: Uuid,
    ) -> Result<Field, ServiceError> {
        let (field, section, form) = self
            .permissions
            .authorize_field_write(caller, field_id)
            .await?;
        let siblings = self.store.list_fields(section.id).await?;
        let now = Utc::now();
        let mut copy = field.clone();
        copy.id = Uuid::new_v4();
        copy.order = ordering::next_order(siblings.iter().map(|f| f.order));
        copy.created_at = now;
        copy.updated_at = now;
        let created = self.store.create_field(copy).await?;
        self.notify(form.id);
        Ok(created)
    }

    pub async fn reorder_fields(
        &self,
        caller: &Caller,
        section_id: Uuid,
        updates: &[OrderUpdate],
    ) -> Result<Vec<Field>, ServiceError> {
        let (section, form) = self
            .permissions
            .authorize_section_write(caller, section_id)
            .await?;
        let fields = self
            .store
            .reorder_fields(section.id, &ordering::to_pairs(updates))
            .await?;
        self.notify(form.id);
        Ok(fields)
    }

    /// Cross-section move within one form. A destination in another
    /// form is rejected and the field stays where it was.
    pub async fn move_field(
        &self,
        caller: &Caller,
        field_id: Uuid,
        new_section_id: Uuid,
        new_order: Option<i32>,
    ) -> Result<Field, ServiceError> {
        let (field, _section, form) = self
            .permissions
            .authorize_field_write(caller, field_id)
            .await?;
        let target = self
            .store
            .get_section(new_section_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("section", new_section_id))?;
        if target.form_id != form.id {
            return Err(ServiceError::Invariant(
                "Cannot move a field to a section of another form".to_string(),
            ));
        }
        let order = match new_order {
            Some(order) => order,
            None => {
                let siblings = self.store.list_fields(target.id).await?;
                ordering::next_order(siblings.iter().map(|f| f.order))
            }
        };
        let moved = self.store.move_field(field.id, target.id, order).await?;
        self.notify(form.id);
        Ok(moved)
    }

    // ---- submissions ----

    /// Records an end-user fill-out. No builder permission: the gate is
    /// that the form is live. Each response must name a field of this
    /// form and every required field must be answered.
    pub async fn submit_form(
        &self,
        form_id: Uuid,
        submitted_by: Option<String>,
        values: Vec<(Uuid, serde_json::Value)>,
    ) -> Result<SubmissionDetail, ServiceError> {
        let tree = self
            .store
            .get_form_tree(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;
        if !tree.form.is_active {
            return Err(ServiceError::Validation(
                "This form is not accepting submissions".to_string(),
            ));
        }

        let answered: std::collections::HashSet<Uuid> =
            values.iter().map(|(field_id, _)| *field_id).collect();
        for entry in &tree.sections {
            for field in &entry.fields {
                if field.required && !answered.contains(&field.id) {
                    return Err(ServiceError::Validation(format!(
                        "Required field \"{}\" is missing",
                        field.label
                    )));
                }
            }
        }

        let submission = FormSubmission::new(form_id, submitted_by);
        let responses = values
            .into_iter()
            .map(|(field_id, value)| FieldResponse::new(submission.id, field_id, value))
            .collect();
        let detail = self.store.create_submission(submission, responses).await?;
        self.notify(form_id);
        Ok(detail)
    }

    pub async fn list_submissions(
        &self,
        caller: &Caller,
        form_id: Uuid,
    ) -> Result<Vec<SubmissionDetail>, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        self.store
            .get_form(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;
        Ok(self.store.list_submissions(form_id).await?)
    }

    pub async fn delete_submission(
        &self,
        caller: &Caller,
        submission_id: Uuid,
    ) -> Result<(), ServiceError> {
        let detail = self
            .store
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("submission", submission_id))?;
        self.permissions
            .authorize_form_write(caller, detail.submission.form_id)
            .await?;
        self.store.delete_submission(submission_id).await?;
        self.notify(detail.submission.form_id);
        Ok(())
    }

    /// Form "reset": drops every submission and response.
    pub async fn reset_submissions(
        &self,
        caller: &Caller,
        form_id: Uuid,
    ) -> Result<usize, ServiceError> {
        self.permissions.authorize_form_write(caller, form_id).await?;
        let removed = self.store.delete_form_submissions(form_id).await?;
        info!(
            "form {} reset by {}: {} submissions removed",
            form_id, caller.email, removed
        );
        self.notify(form_id);
        Ok(removed)
    }

    // ---- analytics ----

    pub async fn form_analytics(
        &self,
        caller: &Caller,
        form_id: Uuid,
    ) -> Result<FormAnalytics, ServiceError> {
        self.permissions.ensure_can_view(caller)?;
        let tree = self
            .store
            .get_form_tree(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;
        let submissions = self.store.list_submissions(form_id).await?;
        Ok(analytics::aggregate(&tree, &submissions))
    }
}
