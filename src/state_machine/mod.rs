mod job;
mod state;

pub use job::{AcademicLevel, AssignmentJob, AssignmentParams, JobSummary, LengthBand, Tone};
pub use state::{Action, Stage, StateMachine};
