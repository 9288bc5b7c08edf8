use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::artifacts::naming::export_file_name;
use crate::artifacts::{
    ArtifactError, ArtifactId, ArtifactKind, ArtifactStore, META_LENGTH, META_LEVEL, META_TONE,
    Metadata,
};
use crate::error::WorkflowError;
use crate::generation::{GenerationError, ModelConfig, TextGenerator};
use crate::prompts;
use crate::stats;
use crate::state_machine::{
    AcademicLevel, Action, AssignmentJob, AssignmentParams, LengthBand, Stage, StateMachine, Tone,
};

/// What happened to the text a step produced, persistence-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Saved(ArtifactId),
    /// The write failed; the job still advanced.
    Failed(String),
    /// Critiques are shown, never stored.
    Ephemeral,
}

/// Result of a step that produced or accepted text.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub stage: Stage,
    pub text: String,
    pub persisted: Persisted,
    /// 1-based positions of paragraphs not present in the draft this one replaced.
    pub changed_paragraphs: Option<Vec<usize>>,
}

/// Drives an [`AssignmentJob`] through plan, draft, critique and revision.
///
/// Generation failures leave the job exactly as it was. Persistence failures
/// are reported in the [`StepReport`] but do not undo the step.
pub struct Workflow<G> {
    generator: G,
    store: ArtifactStore,
    model: ModelConfig,
    progress: Option<Box<dyn Fn(&str)>>,
}

impl<G: TextGenerator> Workflow<G> {
    pub fn new(generator: G, store: ArtifactStore, model: ModelConfig) -> Self {
        Self {
            generator,
            store,
            model,
            progress: None,
        }
    }

    /// Receive each generated fragment as it arrives.
    pub fn set_progress(&mut self, sink: impl Fn(&str) + 'static) {
        self.progress = Some(Box::new(sink));
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Plan a new assignment. The job must be in `Input`.
    pub async fn create_plan(
        &mut self,
        job: &mut AssignmentJob,
        params: AssignmentParams,
    ) -> Result<StepReport, WorkflowError> {
        let params = validate_params(params)?;
        let next = StateMachine::target(job, Action::CreatePlan)?;

        let plan = self.generate(&prompts::plan_prompt(&params)).await?;

        let persisted = self.persist(ArtifactKind::Plan, &params.topic, &plan, &Metadata::new());
        job.params = params;
        job.plan = Some(plan.clone());
        job.draft = None;
        job.critique = None;
        job.revision_count = 1;
        job.plan_artifact = saved_id(&persisted);
        job.draft_artifact = None;
        StateMachine::enter(job, next);

        info!(job = %job.id, topic = %job.params.topic, "plan created");
        Ok(StepReport {
            stage: next,
            text: plan,
            persisted,
            changed_paragraphs: None,
        })
    }

    /// Replace the plan with user-edited text and store it as a new artifact.
    pub fn edit_plan(
        &mut self,
        job: &mut AssignmentJob,
        text: &str,
    ) -> Result<StepReport, WorkflowError> {
        let next = StateMachine::target(job, Action::EditPlan)?;
        let plan = require_text(text, "plan")?;

        let persisted =
            self.persist(ArtifactKind::Plan, &job.params.topic, &plan, &Metadata::new());
        job.plan = Some(plan.clone());
        if let Some(id) = saved_id(&persisted) {
            job.plan_artifact = Some(id);
        }
        StateMachine::enter(job, next);

        Ok(StepReport {
            stage: next,
            text: plan,
            persisted,
            changed_paragraphs: None,
        })
    }

    /// Generate a draft from the current plan.
    pub async fn create_draft(
        &mut self,
        job: &mut AssignmentJob,
    ) -> Result<StepReport, WorkflowError> {
        let next = StateMachine::target(job, Action::CreateDraft)?;
        let plan = job
            .plan_text()
            .ok_or_else(|| WorkflowError::Validation("a plan is required before drafting".into()))?;

        let draft = self
            .generate(&prompts::draft_prompt(&job.params, plan))
            .await?;

        let report = self.accept_draft(job, draft, next);
        info!(job = %job.id, "draft created");
        Ok(report)
    }

    /// Replace the draft with user-edited text; stored and staged like a generated one.
    pub fn edit_draft(
        &mut self,
        job: &mut AssignmentJob,
        text: &str,
    ) -> Result<StepReport, WorkflowError> {
        let next = StateMachine::target(job, Action::EditDraft)?;
        let draft = require_text(text, "draft")?;
        Ok(self.accept_draft(job, draft, next))
    }

    /// Ask the model to evaluate the current draft. The critique is not stored.
    pub async fn request_critique(
        &mut self,
        job: &mut AssignmentJob,
    ) -> Result<StepReport, WorkflowError> {
        let next = StateMachine::target(job, Action::RequestCritique)?;
        let draft = job
            .draft_text()
            .ok_or_else(|| WorkflowError::Validation("there is no draft to critique".into()))?;

        let critique = self
            .generate(&prompts::critique_prompt(
                draft,
                job.params.level,
                job.params.length,
                job.params.tone,
            ))
            .await?;

        job.critique = Some(critique.clone());
        StateMachine::enter(job, next);

        info!(job = %job.id, revision = job.revision_count, "critique received");
        Ok(StepReport {
            stage: next,
            text: critique,
            persisted: Persisted::Ephemeral,
            changed_paragraphs: None,
        })
    }

    /// Rewrite the draft to address the critique. Bounded by `max_revisions`.
    pub async fn revise_draft(
        &mut self,
        job: &mut AssignmentJob,
    ) -> Result<StepReport, WorkflowError> {
        let next = StateMachine::target(job, Action::Revise)?;
        let (Some(plan), Some(draft), Some(critique)) =
            (job.plan_text(), job.draft_text(), job.critique_text())
        else {
            return Err(WorkflowError::Validation(
                "revision needs a plan, a draft and a critique".into(),
            ));
        };

        let revised = self
            .generate(&prompts::revision_prompt(&job.params, plan, draft, critique))
            .await?;

        job.revision_count += 1;
        let report = self.accept_draft(job, revised, next);
        info!(
            job = %job.id,
            revision = job.revision_count,
            max = job.max_revisions,
            "draft revised"
        );
        Ok(report)
    }

    /// Close the loop: `Critique → Final`.
    pub fn finalize(&self, job: &mut AssignmentJob) -> Result<Stage, WorkflowError> {
        let next = StateMachine::target(job, Action::Finalize)?;
        StateMachine::enter(job, next);
        info!(job = %job.id, revisions = job.revisions_done(), "assignment finalized");
        Ok(next)
    }

    /// Step back one stage (`Draft → Plan`, `Critique → Draft`) without touching any text.
    pub fn back(&self, job: &mut AssignmentJob) -> Result<Stage, WorkflowError> {
        let next = StateMachine::target(job, Action::Back)?;
        StateMachine::enter(job, next);
        Ok(next)
    }

    /// Discard the job and start over in `Input`. Saved artifacts stay on disk.
    pub fn reset(&self, job: &mut AssignmentJob) {
        let old = job.id.clone();
        *job = AssignmentJob::new(job.max_revisions);
        info!(old_job = %old, new_job = %job.id, "job reset");
    }

    /// Whether `revise_draft` would be accepted right now.
    pub fn can_revise(&self, job: &AssignmentJob) -> bool {
        StateMachine::can_revise(job)
    }

    /// Replace the plan with a saved one. Stage `Plan` only.
    pub fn load_plan(&self, job: &mut AssignmentJob, id: &ArtifactId) -> Result<(), WorkflowError> {
        StateMachine::target(job, Action::LoadPlan)?;
        let body = self.load_body(ArtifactKind::Plan, id)?;
        job.plan = Some(body);
        job.plan_artifact = Some(id.clone());
        job.touch();
        Ok(())
    }

    /// Replace the draft with a saved one. Stage `Draft` only.
    pub fn load_draft(
        &self,
        job: &mut AssignmentJob,
        id: &ArtifactId,
    ) -> Result<(), WorkflowError> {
        StateMachine::target(job, Action::LoadDraft)?;
        let body = self.load_body(ArtifactKind::Draft, id)?;
        job.draft = Some(body);
        job.draft_artifact = Some(id.clone());
        job.touch();
        Ok(())
    }

    /// Start a fresh job from saved artifacts.
    ///
    /// An empty topic is taken from the plan's title; a draft's level, length
    /// and tone headers override `params`. The area must be supplied, since
    /// plan files do not record it.
    pub fn resume(
        &self,
        mut params: AssignmentParams,
        plan_id: &ArtifactId,
        draft_id: Option<&ArtifactId>,
        max_revisions: u32,
    ) -> Result<AssignmentJob, WorkflowError> {
        let plan = self.store.load_artifact(plan_id)?;
        if plan.kind != ArtifactKind::Plan {
            return Err(ArtifactError::NotFound(plan_id.to_string()).into());
        }
        require_body(&plan.body, plan_id)?;
        if params.topic.trim().is_empty() {
            params.topic = plan.topic.clone();
        }

        let draft = match draft_id {
            Some(id) => {
                let draft = self.store.load_artifact(id)?;
                if draft.kind != ArtifactKind::Draft {
                    return Err(ArtifactError::NotFound(id.to_string()).into());
                }
                require_body(&draft.body, id)?;
                apply_draft_metadata(&mut params, &draft.metadata);
                Some(draft)
            }
            None => None,
        };

        let params = validate_params(params)?;
        let mut job = AssignmentJob::new(max_revisions);
        job.params = params;
        job.plan = Some(plan.body);
        job.plan_artifact = Some(plan.id);
        job.revision_count = 1;
        StateMachine::enter(&mut job, Stage::Plan);

        if let Some(draft) = draft {
            job.draft = Some(draft.body);
            job.draft_artifact = Some(draft.id);
            StateMachine::enter(&mut job, Stage::Draft);
        }

        info!(job = %job.id, stage = %job.stage, "job resumed from artifacts");
        Ok(job)
    }

    /// Write the final draft as `theology_assignment_{topic}.txt` inside `dir`.
    ///
    /// An existing file of that name is replaced.
    pub fn export_final(&self, job: &AssignmentJob, dir: &Path) -> Result<PathBuf, WorkflowError> {
        StateMachine::target(job, Action::Export)?;
        let draft = job
            .draft_text()
            .ok_or_else(|| WorkflowError::Validation("the final assignment has no text".into()))?;

        let path = dir.join(export_file_name(&job.params.topic));
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .and_then(|mut file| file.write_all(draft.as_bytes()))
            .map_err(|source| ArtifactError::Persistence {
                path: path.clone(),
                source,
            })?;

        info!(job = %job.id, path = %path.display(), "final assignment exported");
        Ok(path)
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let fragments = self.generator.generate(prompt, &self.model).await?;
        let text = fragments
            .collect_text(|fragment| {
                if let Some(sink) = &self.progress {
                    sink(fragment);
                }
            })
            .await
            .inspect_err(|e| warn!(error = %e, "generation failed"))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }

    fn accept_draft(&mut self, job: &mut AssignmentJob, draft: String, next: Stage) -> StepReport {
        let persisted = self.persist(
            ArtifactKind::Draft,
            &job.params.topic,
            &draft,
            &draft_metadata(&job.params),
        );
        let changed_paragraphs = job
            .draft_text()
            .map(|old| stats::changed_paragraphs(old, &draft));
        job.draft = Some(draft.clone());
        if let Some(id) = saved_id(&persisted) {
            job.draft_artifact = Some(id);
        }
        StateMachine::enter(job, next);

        StepReport {
            stage: next,
            text: draft,
            persisted,
            changed_paragraphs,
        }
    }

    fn persist(
        &mut self,
        kind: ArtifactKind,
        topic: &str,
        body: &str,
        metadata: &Metadata,
    ) -> Persisted {
        match self.store.save(kind, topic, body, metadata) {
            Ok(id) => Persisted::Saved(id),
            Err(e) => {
                warn!(kind = %kind, error = %e, "artifact could not be saved");
                Persisted::Failed(e.to_string())
            }
        }
    }

    fn load_body(&self, kind: ArtifactKind, id: &ArtifactId) -> Result<String, WorkflowError> {
        if id.kind() != Some(kind) {
            return Err(ArtifactError::NotFound(id.to_string()).into());
        }
        let body = self.store.load(id)?;
        require_body(&body, id)?;
        Ok(body)
    }
}

fn validate_params(mut params: AssignmentParams) -> Result<AssignmentParams, WorkflowError> {
    params.topic = params.topic.trim().to_string();
    params.area = params.area.trim().to_string();
    if params.topic.is_empty() || params.area.is_empty() {
        return Err(WorkflowError::Validation(
            "both a topic and an area are required".into(),
        ));
    }
    Ok(params)
}

fn require_text(text: &str, what: &str) -> Result<String, WorkflowError> {
    if text.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("cannot save an empty {what}")));
    }
    Ok(text.to_string())
}

/// Loaded plans and drafts must carry text.
fn require_body(body: &str, id: &ArtifactId) -> Result<(), WorkflowError> {
    if body.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{id} has no text")));
    }
    Ok(())
}

fn draft_metadata(params: &AssignmentParams) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert(META_LEVEL.into(), params.level.label().into());
    meta.insert(META_LENGTH.into(), params.length.label());
    meta.insert(META_TONE.into(), params.tone.label().into());
    meta
}

fn apply_draft_metadata(params: &mut AssignmentParams, meta: &Metadata) {
    if let Some(level) = meta.get(META_LEVEL).and_then(|v| AcademicLevel::from_label(v)) {
        params.level = level;
    }
    if let Some(length) = meta.get(META_LENGTH).and_then(|v| LengthBand::from_label(v)) {
        params.length = length;
    }
    if let Some(tone) = meta.get(META_TONE).and_then(|v| Tone::from_label(v)) {
        params.tone = tone;
    }
}

fn saved_id(persisted: &Persisted) -> Option<ArtifactId> {
    match persisted {
        Persisted::Saved(id) => Some(id.clone()),
        _ => None,
    }
}
