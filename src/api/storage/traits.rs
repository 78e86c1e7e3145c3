//! Store trait definition for the form-builder backends.

use uuid::Uuid;

use super::StoreError;
use crate::models::{
    Field, FieldResponse, Form, FormSubmission, FormSummary, FormTree, Member, Section,
    SubmissionDetail,
};

/// Storage backend for the form tree, submissions, and members.
///
/// Ownership is a strict tree: Form -> Section -> Field, and
/// Form -> Submission -> Response. Deletes cascade children-first.
/// Bulk operations (`reorder_*`, `insert_form_bundle`,
/// `create_submission`) are all-or-nothing within a single call; there
/// is no isolation between concurrent calls — last write wins.
#[async_trait::async_trait]
pub trait FormStore: Send + Sync {
    // ---- members ----

    async fn list_members(&self) -> Result<Vec<Member>, StoreError>;

    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>, StoreError>;

    async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError>;

    /// Rejects with [`StoreError::Conflict`] when the email is taken.
    async fn create_member(&self, member: Member) -> Result<Member, StoreError>;

    async fn update_member(&self, member: Member) -> Result<Member, StoreError>;

    async fn delete_member(&self, member_id: Uuid) -> Result<(), StoreError>;

    // ---- forms ----

    /// Persists a new form together with its initial section.
    async fn create_form(&self, form: Form, initial_section: Section) -> Result<Form, StoreError>;

    async fn list_form_summaries(&self) -> Result<Vec<FormSummary>, StoreError>;

    async fn get_form(&self, form_id: Uuid) -> Result<Option<Form>, StoreError>;

    /// Full tree, sections and fields sorted by `order` ascending.
    async fn get_form_tree(&self, form_id: Uuid) -> Result<Option<FormTree>, StoreError>;

    async fn update_form(&self, form: Form) -> Result<Form, StoreError>;

    /// Cascades: sections, fields, submissions, responses.
    async fn delete_form(&self, form_id: Uuid) -> Result<(), StoreError>;

    /// Atomically inserts a pre-built form tree (used by cloning).
    /// Submissions and responses, when present, land in the same commit.
    async fn insert_form_bundle(
        &self,
        form: Form,
        sections: Vec<Section>,
        fields: Vec<Field>,
        submissions: Vec<FormSubmission>,
        responses: Vec<FieldResponse>,
    ) -> Result<(), StoreError>;

    // ---- sections ----

    async fn create_section(&self, section: Section) -> Result<Section, StoreError>;

    /// Atomically inserts a section together with its fields (used by
    /// section duplication).
    async fn insert_section_bundle(
        &self,
        section: Section,
        fields: Vec<Field>,
    ) -> Result<Section, StoreError>;

    /// Sorted by `order` ascending. Gaps are expected after deletions.
    async fn list_sections(&self, form_id: Uuid) -> Result<Vec<Section>, StoreError>;

    async fn get_section(&self, section_id: Uuid) -> Result<Option<Section>, StoreError>;

    async fn update_section(&self, section: Section) -> Result<Section, StoreError>;

    /// Cascades the section's fields.
    async fn delete_section(&self, section_id: Uuid) -> Result<(), StoreError>;

    /// All-or-nothing: if any id is not a section of `form_id`, nothing
    /// changes and the offending id is named in the error.
    async fn reorder_sections(
        &self,
        form_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Section>, StoreError>;

    // ---- fields ----

    async fn create_field(&self, field: Field) -> Result<Field, StoreError>;

    /// Sorted by `order` ascending.
    async fn list_fields(&self, section_id: Uuid) -> Result<Vec<Field>, StoreError>;

    async fn get_field(&self, field_id: Uuid) -> Result<Option<Field>, StoreError>;

    async fn update_field(&self, field: Field) -> Result<Field, StoreError>;

    async fn delete_field(&self, field_id: Uuid) -> Result<(), StoreError>;

    /// All-or-nothing, same contract as [`FormStore::reorder_sections`].
    async fn reorder_fields(
        &self,
        section_id: Uuid,
        orders: &[(Uuid, i32)],
    ) -> Result<Vec<Field>, StoreError>;

    /// Reparents a field. Callers must have verified that the target
    /// section belongs to the same form.
    async fn move_field(
        &self,
        field_id: Uuid,
        new_section_id: Uuid,
        new_order: i32,
    ) -> Result<Field, StoreError>;

    // ---- submissions ----

    /// Inserts a submission with its responses in one commit. Rejects
    /// with [`StoreError::Integrity`] when any response references a
    /// field outside the submission's form.
    async fn create_submission(
        &self,
        submission: FormSubmission,
        responses: Vec<FieldResponse>,
    ) -> Result<SubmissionDetail, StoreError>;

    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<SubmissionDetail>, StoreError>;

    async fn get_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SubmissionDetail>, StoreError>;

    async fn delete_submission(&self, submission_id: Uuid) -> Result<(), StoreError>;

    /// Form "reset": drops every submission and response for the form.
    /// Returns how many submissions were removed.
    async fn delete_form_submissions(&self, form_id: Uuid) -> Result<usize, StoreError>;
}
