//! Permission resolution for builder operations.
//!
//! A pure guard: the caller identity is explicit input, the current
//! role is whatever the member store said for this request, and the
//! decision is made fresh on every call. Section and field checks walk
//! up to the owning form before applying the form rule.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::ServiceError;
use crate::models::{Field, Form, MemberRole, Section};
use crate::storage::FormStore;

/// Authenticated caller identity, threaded into every operation.
#[derive(Debug, Clone)]
pub struct Caller {
    pub member_id: Uuid,
    pub email: String,
    pub role: MemberRole,
}

impl Caller {
    pub fn new(member_id: Uuid, email: impl Into<String>, role: MemberRole) -> Self {
        Self {
            member_id,
            email: email.into(),
            role,
        }
    }
}

/// Resolves whether a caller may read or mutate a form-tree resource.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn FormStore>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn FormStore>) -> Self {
        Self { store }
    }

    /// Any elevated role may browse the builder, including the
    /// all-forms listing; plain members are rejected outright.
    pub fn ensure_can_view(&self, caller: &Caller) -> Result<(), ServiceError> {
        if caller.role.is_elevated() {
            Ok(())
        } else {
            warn!("member {} denied builder access", caller.email);
            Err(ServiceError::Unauthorized)
        }
    }

    /// Admins and organizers may act on any form; other elevated roles
    /// only on forms they created.
    pub fn ensure_can_mutate(&self, caller: &Caller, form: &Form) -> Result<(), ServiceError> {
        if !caller.role.is_elevated() {
            warn!("member {} denied builder write", caller.email);
            return Err(ServiceError::Unauthorized);
        }
        if caller.role.is_staff() || form.created_by == caller.member_id {
            Ok(())
        } else {
            warn!(
                "{} {} denied write on form {} owned by {}",
                caller.role, caller.email, form.id, form.created_by
            );
            Err(ServiceError::Unauthorized)
        }
    }

    /// Member management is admin-only for writes.
    pub fn ensure_admin(&self, caller: &Caller) -> Result<(), ServiceError> {
        if caller.role == MemberRole::Admin {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    /// Resolves a form and checks write permission against it.
    pub async fn authorize_form_write(
        &self,
        caller: &Caller,
        form_id: Uuid,
    ) -> Result<Form, ServiceError> {
        self.ensure_can_view(caller)?;
        let form = self
            .store
            .get_form(form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", form_id))?;
        self.ensure_can_mutate(caller, &form)?;
        Ok(form)
    }

    /// Walks section -> form, then applies the form write rule.
    pub async fn authorize_section_write(
        &self,
        caller: &Caller,
        section_id: Uuid,
    ) -> Result<(Section, Form), ServiceError> {
        self.ensure_can_view(caller)?;
        let section = self
            .store
            .get_section(section_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("section", section_id))?;
        let form = self
            .store
            .get_form(section.form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", section.form_id))?;
        self.ensure_can_mutate(caller, &form)?;
        Ok((section, form))
    }

    /// Walks field -> section -> form, then applies the form write rule.
    pub async fn authorize_field_write(
        &self,
        caller: &Caller,
        field_id: Uuid,
    ) -> Result<(Field, Section, Form), ServiceError> {
        self.ensure_can_view(caller)?;
        let field = self
            .store
            .get_field(field_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("field", field_id))?;
        let section = self
            .store
            .get_section(field.section_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("section", field.section_id))?;
        let form = self
            .store
            .get_form(section.form_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("form", section.form_id))?;
        self.ensure_can_mutate(caller, &form)?;
        Ok((field, section, form))
    }
}
