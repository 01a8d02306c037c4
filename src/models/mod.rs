pub mod record;
pub mod session;

pub use record::{
  FieldProblem, NewTrainingRecord, RawTrainingRecord, RecordForm, RecordId, RecordIssue,
  RecordSet, TrainingRecord, UserId, ValidationError,
};
pub use session::SessionContext;
