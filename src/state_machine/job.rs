use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::Stage;
use crate::artifacts::ArtifactId;

/// Academic level the assignment is written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    #[default]
    Undergraduate,
    Graduate,
    Thesis,
}

impl AcademicLevel {
    /// Label used in prompts and artifact headers.
    pub fn label(&self) -> &'static str {
        match self {
            AcademicLevel::Undergraduate => "undergraduate",
            AcademicLevel::Graduate => "a master level",
            AcademicLevel::Thesis => "thesis",
        }
    }

    /// Parse a label as written by [`label`](Self::label), plus the plain variant name.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "undergraduate" => Some(AcademicLevel::Undergraduate),
            "a master level" | "master" | "graduate" => Some(AcademicLevel::Graduate),
            "thesis" => Some(AcademicLevel::Thesis),
            _ => None,
        }
    }
}

impl fmt::Display for AcademicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Word-count band the assignment must land in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthBand {
    Words750To1000,
    #[default]
    Words1500To2000,
    Words2500To3000,
    Words4000To5000,
    Words7000To8000,
}

impl LengthBand {
    pub const ALL: [LengthBand; 5] = [
        LengthBand::Words750To1000,
        LengthBand::Words1500To2000,
        LengthBand::Words2500To3000,
        LengthBand::Words4000To5000,
        LengthBand::Words7000To8000,
    ];

    /// Inclusive word range of the band.
    pub fn range(&self) -> (usize, usize) {
        match self {
            LengthBand::Words750To1000 => (750, 1000),
            LengthBand::Words1500To2000 => (1500, 2000),
            LengthBand::Words2500To3000 => (2500, 3000),
            LengthBand::Words4000To5000 => (4000, 5000),
            LengthBand::Words7000To8000 => (7000, 8000),
        }
    }

    pub fn contains(&self, words: usize) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&words)
    }

    pub fn label(&self) -> String {
        let (min, max) = self.range();
        format!("{min}-{max} words")
    }

    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|band| {
                let label = band.label();
                label == wanted || label.trim_end_matches(" words") == wanted
            })
    }
}

impl fmt::Display for LengthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Stylistic tone requested for the writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Academic,
    Analytical,
    Reflective,
    Critical,
    Expository,
}

impl Tone {
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Academic => "Academic",
            Tone::Analytical => "Analytical",
            Tone::Reflective => "Reflective",
            Tone::Critical => "Critical",
            Tone::Expository => "Expository",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "academic" => Some(Tone::Academic),
            "analytical" => Some(Tone::Analytical),
            "reflective" => Some(Tone::Reflective),
            "critical" => Some(Tone::Critical),
            "expository" => Some(Tone::Expository),
            _ => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user-supplied description of an assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentParams {
    pub topic: String,
    pub area: String,
    pub level: AcademicLevel,
    pub length: LengthBand,
    pub tone: Tone,
}

/// One assignment moving through plan, draft, critique and revision.
///
/// Owned by a single session; every workflow operation takes it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentJob {
    pub id: String,
    pub params: AssignmentParams,
    pub plan: Option<String>,
    pub draft: Option<String>,
    pub critique: Option<String>,
    /// 1 after planning, +1 per completed revision.
    pub revision_count: u32,
    pub max_revisions: u32,
    pub stage: Stage,
    pub stage_history: Vec<Stage>,
    pub plan_artifact: Option<ArtifactId>,
    pub draft_artifact: Option<ArtifactId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentJob {
    pub fn new(max_revisions: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            params: AssignmentParams::default(),
            plan: None,
            draft: None,
            critique: None,
            revision_count: 0,
            max_revisions: max_revisions.max(1),
            stage: Stage::Input,
            stage_history: Vec::new(),
            plan_artifact: None,
            draft_artifact: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of revise passes completed so far.
    pub fn revisions_done(&self) -> u32 {
        self.revision_count.saturating_sub(1)
    }

    /// Revise passes still allowed before the cap.
    pub fn revisions_remaining(&self) -> u32 {
        if self.revision_count == 0 {
            return self.max_revisions;
        }
        (self.max_revisions + 1).saturating_sub(self.revision_count)
    }

    pub fn plan_text(&self) -> Option<&str> {
        non_empty(self.plan.as_deref())
    }

    pub fn draft_text(&self) -> Option<&str> {
        non_empty(self.draft.as_deref())
    }

    pub fn critique_text(&self) -> Option<&str> {
        non_empty(self.critique.as_deref())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|t| !t.trim().is_empty())
}

/// Structured snapshot of a job, printed by `draftsmith status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub topic: String,
    pub area: String,
    pub level: String,
    pub length: String,
    pub tone: String,
    pub stage: Stage,
    pub stage_transitions: Vec<Stage>,
    pub revision_count: u32,
    pub max_revisions: u32,
    pub revisions_remaining: u32,
    pub plan_artifact: Option<ArtifactId>,
    pub draft_artifact: Option<ArtifactId>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSummary {
    pub fn from_job(job: &AssignmentJob) -> Self {
        let mut transitions = job.stage_history.clone();
        transitions.push(job.stage);

        Self {
            job_id: job.id.clone(),
            topic: job.params.topic.clone(),
            area: job.params.area.clone(),
            level: job.params.level.label().to_string(),
            length: job.params.length.label(),
            tone: job.params.tone.label().to_string(),
            stage: job.stage,
            stage_transitions: transitions,
            revision_count: job.revision_count,
            max_revisions: job.max_revisions,
            revisions_remaining: job.revisions_remaining(),
            plan_artifact: job.plan_artifact.clone(),
            draft_artifact: job.draft_artifact.clone(),
            started_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
