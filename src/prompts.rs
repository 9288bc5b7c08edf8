//! Prompt templates for each workflow step.
//!
//! Every prompt is a pure function of the job fields it embeds, so the same
//! job always produces the same prompt.

use crate::state_machine::{AcademicLevel, AssignmentParams, LengthBand, Tone};

pub fn plan_prompt(params: &AssignmentParams) -> String {
    let AssignmentParams {
        topic,
        area,
        level,
        length,
        tone,
    } = params;
    format!(
        "You are a theology education expert tasked with planning an assignment.\n\
         \n\
         ASSIGNMENT TOPIC: {topic}\n\
         AREA OF THEOLOGY: {area}\n\
         ACADEMIC LEVEL: {level}\n\
         LENGTH REQUIREMENT: {length}\n\
         TONE OF LANGUAGE: {tone}\n\
         \n\
         Create a detailed outline for this assignment. Include:\n\
         1. A clear thesis statement or research question\n\
         2. 3-5 main sections or arguments to develop, with depth suited to {length}\n\
         3. Key theological concepts that need to be addressed\n\
         4. Essential texts, scriptures, or theological sources to engage with\n\
         5. A methodological approach appropriate for this assignment\n\
         \n\
         Keep the outline structured and academically rigorous for a student at {level} level, \
         and shape it so the final paper can keep a {tone} tone."
    )
}

pub fn draft_prompt(params: &AssignmentParams, plan: &str) -> String {
    let AssignmentParams {
        topic,
        area,
        level,
        length,
        tone,
    } = params;
    format!(
        "You are a theology writing expert drafting an assignment.\n\
         \n\
         ASSIGNMENT TOPIC: {topic}\n\
         AREA OF THEOLOGY: {area}\n\
         ACADEMIC LEVEL: {level}\n\
         LENGTH REQUIREMENT: {length}\n\
         TONE OF LANGUAGE: {tone}\n\
         \n\
         Follow this plan:\n\
         {plan}\n\
         \n\
         Write a complete, well-structured draft. Include:\n\
         1. An introduction with a clear thesis statement\n\
         2. Main body sections as outlined in the plan\n\
         3. Substantive theological arguments with appropriate depth\n\
         4. Engagement with relevant theological sources\n\
         5. A conclusion that synthesizes the key points\n\
         \n\
         Keep a {tone} tone throughout and aim for approximately {length}."
    )
}

pub fn critique_prompt(
    draft: &str,
    level: AcademicLevel,
    length: LengthBand,
    tone: Tone,
) -> String {
    format!(
        "You are a theology professor evaluating a student assignment at {level} level.\n\
         \n\
         Review this draft:\n\
         {draft}\n\
         \n\
         Requirements:\n\
         - Length: {length}\n\
         - Tone: {tone}\n\
         - Academic level: {level}\n\
         \n\
         Give a detailed critique covering:\n\
         1. Theological depth and accuracy of the arguments\n\
         2. Quality of engagement with sources and concepts\n\
         3. Clarity of the thesis and supporting evidence\n\
         4. Structure, organization and academic style\n\
         5. Whether the length meets the {length} requirement\n\
         6. Consistency and effectiveness of the {tone} tone\n\
         7. Specific, actionable improvements\n\
         \n\
         Be constructive but thorough: name strengths as well as weaknesses."
    )
}

pub fn revision_prompt(
    params: &AssignmentParams,
    plan: &str,
    draft: &str,
    critique: &str,
) -> String {
    let AssignmentParams {
        topic,
        area,
        level,
        length,
        tone,
    } = params;
    format!(
        "You are a theology writing expert revising an assignment.\n\
         \n\
         ASSIGNMENT TOPIC: {topic}\n\
         AREA OF THEOLOGY: {area}\n\
         ACADEMIC LEVEL: {level}\n\
         LENGTH REQUIREMENT: {length}\n\
         TONE OF LANGUAGE: {tone}\n\
         \n\
         Original plan:\n\
         {plan}\n\
         \n\
         Previous draft:\n\
         {draft}\n\
         \n\
         Critique received:\n\
         {critique}\n\
         \n\
         Write a revised assignment that addresses every point of the critique while \
         keeping the core thesis. In particular:\n\
         1. Deepen the theological analysis and scholarly quality\n\
         2. Meet the {length} requirement, neither too short nor too long\n\
         3. Keep a consistent {tone} tone\n\
         4. Resolve each specific issue raised in the critique\n\
         \n\
         Return only the complete revised assignment."
    )
}
