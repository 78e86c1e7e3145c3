// Models module - Form, Section, Field, submissions, members, and enums

pub mod enums;
pub mod field;
pub mod form;
pub mod member;
pub mod section;
pub mod submission;

pub use enums::{FieldType, MemberRole};
pub use field::{Field, FieldLogic, FieldOption, LogicCondition};
pub use form::{Form, FormSummary, FormTree, SectionTree};
pub use member::Member;
pub use section::Section;
pub use submission::{FieldResponse, FormSubmission, SubmissionDetail};
