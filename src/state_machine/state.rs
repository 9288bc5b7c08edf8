use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::AssignmentJob;
use crate::error::WorkflowError;

/// The five stages of an assignment.
///
/// INPUT → PLAN → DRAFT → CRITIQUE → { DRAFT (revise, bounded), FINAL }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Input,
    Plan,
    Draft,
    Critique,
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "INPUT"),
            Stage::Plan => write!(f, "PLAN"),
            Stage::Draft => write!(f, "DRAFT"),
            Stage::Critique => write!(f, "CRITIQUE"),
            Stage::Final => write!(f, "FINAL"),
        }
    }
}

/// A user action that may move a job between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePlan,
    EditPlan,
    LoadPlan,
    CreateDraft,
    EditDraft,
    LoadDraft,
    RequestCritique,
    Revise,
    Back,
    Finalize,
    Export,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::CreatePlan => "create a plan",
            Action::EditPlan => "edit the plan",
            Action::LoadPlan => "load a saved plan",
            Action::CreateDraft => "create a draft",
            Action::EditDraft => "edit the draft",
            Action::LoadDraft => "load a saved draft",
            Action::RequestCritique => "request a critique",
            Action::Revise => "revise the draft",
            Action::Back => "go back",
            Action::Finalize => "finalize",
            Action::Export => "export",
        };
        f.write_str(name)
    }
}

/// Decides which stage an action leads to, and records the move on the job.
pub struct StateMachine;

impl StateMachine {
    /// Compute the stage `action` would move `job` to, without touching the job.
    ///
    /// - `Revise` is only allowed from `Critique` while
    ///   `revision_count <= max_revisions`.
    /// - `Back` steps `Draft → Plan` and `Critique → Draft`.
    /// - `Final` accepts nothing but `Export`; only a reset leaves it.
    pub fn target(job: &AssignmentJob, action: Action) -> Result<Stage, WorkflowError> {
        use Stage::*;

        let target = match (action, job.stage) {
            (Action::CreatePlan, Input) => Some(Plan),
            (Action::EditPlan | Action::LoadPlan, Plan) => Some(Plan),
            (Action::CreateDraft, Plan | Critique) => Some(Draft),
            (Action::EditDraft, Plan | Draft | Critique) => Some(Draft),
            (Action::LoadDraft, Draft) => Some(Draft),
            (Action::RequestCritique, Draft | Critique) => Some(Critique),
            (Action::Revise, Critique) => {
                if !Self::can_revise(job) {
                    return Err(WorkflowError::RevisionLimitExceeded {
                        revision_count: job.revision_count,
                        max_revisions: job.max_revisions,
                    });
                }
                Some(Draft)
            }
            (Action::Back, Draft) => Some(Plan),
            (Action::Back, Critique) => Some(Draft),
            (Action::Finalize, Critique) => Some(Final),
            (Action::Export, Final) => Some(Final),
            _ => None,
        };

        target.ok_or(WorkflowError::InvalidStage {
            action,
            stage: job.stage,
        })
    }

    /// Whether one more revision fits under the cap.
    pub fn can_revise(job: &AssignmentJob) -> bool {
        job.stage == Stage::Critique && job.revision_count <= job.max_revisions
    }

    /// Move the job to `next`, appending the stage it leaves to the history.
    pub fn enter(job: &mut AssignmentJob, next: Stage) {
        if job.stage != next {
            job.stage_history.push(job.stage);
            job.stage = next;
        }
        job.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_at(stage: Stage) -> AssignmentJob {
        let mut job = AssignmentJob::new(3);
        job.stage = stage;
        job.revision_count = 1;
        job
    }

    fn target(stage: Stage, action: Action) -> Result<Stage, WorkflowError> {
        StateMachine::target(&job_at(stage), action)
    }

    #[test]
    fn happy_path_targets() {
        assert_eq!(target(Stage::Input, Action::CreatePlan).unwrap(), Stage::Plan);
        assert_eq!(target(Stage::Plan, Action::CreateDraft).unwrap(), Stage::Draft);
        assert_eq!(target(Stage::Draft, Action::RequestCritique).unwrap(), Stage::Critique);
        assert_eq!(target(Stage::Critique, Action::Revise).unwrap(), Stage::Draft);
        assert_eq!(target(Stage::Critique, Action::Finalize).unwrap(), Stage::Final);
    }

    #[test]
    fn back_edges() {
        assert_eq!(target(Stage::Draft, Action::Back).unwrap(), Stage::Plan);
        assert_eq!(target(Stage::Critique, Action::Back).unwrap(), Stage::Draft);
        assert!(target(Stage::Plan, Action::Back).is_err());
        assert!(target(Stage::Final, Action::Back).is_err());
    }

    #[test]
    fn final_is_terminal() {
        let job = job_at(Stage::Final);
        for action in [
            Action::CreatePlan,
            Action::CreateDraft,
            Action::EditDraft,
            Action::RequestCritique,
            Action::Revise,
            Action::Finalize,
        ] {
            let err = StateMachine::target(&job, action).unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidStage { stage: Stage::Final, .. }));
        }
        assert_eq!(StateMachine::target(&job, Action::Export).unwrap(), Stage::Final);
    }

    #[test]
    fn create_plan_only_from_input() {
        let err = StateMachine::target(&job_at(Stage::Draft), Action::CreatePlan).unwrap_err();
        assert_eq!(err.to_string(), "cannot create a plan while in stage DRAFT");
    }

    #[test]
    fn revise_outside_critique_is_invalid_stage() {
        let err = StateMachine::target(&job_at(Stage::Draft), Action::Revise).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStage { .. }));
    }

    #[test]
    fn revise_is_blocked_past_the_cap() {
        let mut job = job_at(Stage::Critique);
        job.revision_count = 3;
        assert!(StateMachine::can_revise(&job));

        job.revision_count = 4;
        assert!(!StateMachine::can_revise(&job));
        let err = StateMachine::target(&job, Action::Revise).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::RevisionLimitExceeded {
                revision_count: 4,
                max_revisions: 3
            }
        ));
    }

    #[test]
    fn enter_records_history_only_on_change() {
        let mut job = job_at(Stage::Input);
        StateMachine::enter(&mut job, Stage::Plan);
        StateMachine::enter(&mut job, Stage::Plan);
        StateMachine::enter(&mut job, Stage::Draft);
        assert_eq!(job.stage, Stage::Draft);
        assert_eq!(job.stage_history, vec![Stage::Input, Stage::Plan]);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Input.to_string(), "INPUT");
        assert_eq!(Stage::Plan.to_string(), "PLAN");
        assert_eq!(Stage::Draft.to_string(), "DRAFT");
        assert_eq!(Stage::Critique.to_string(), "CRITIQUE");
        assert_eq!(Stage::Final.to_string(), "FINAL");
    }
}
