//! Instruction templates for the four stages.

use crate::context::PipelineContext;
use crate::core::StageId;

const ANALYSIS_SYSTEM: &str = "You are a senior marketing strategist. You read client briefs \
and distill them into a precise, structured analysis that copywriters can work from.";

const PAIN_POINTS_SYSTEM: &str = "You are a customer research specialist. You turn a business \
analysis into concrete, emotionally specific customer pain points.";

const COPY_SYSTEM: &str = "You are a direct-response copywriter. You write short, specific, \
benefit-led marketing copy that speaks to one pain point at a time.";

const STRATEGY_SYSTEM: &str = "You are a campaign strategist. You turn research and draft copy \
into an actionable content strategy a small team can execute.";

/// Returns the base system instruction for a stage.
#[must_use]
pub fn system_instruction(stage: StageId) -> &'static str {
    match stage {
        StageId::Analysis => ANALYSIS_SYSTEM,
        StageId::PainPoints => PAIN_POINTS_SYSTEM,
        StageId::Copy => COPY_SYSTEM,
        StageId::Strategy => STRATEGY_SYSTEM,
    }
}

/// Returns the system instruction with brand guidelines appended verbatim.
#[must_use]
pub fn system_with_guidelines(stage: StageId, guidelines: Option<&str>) -> String {
    let base = system_instruction(stage);
    match guidelines {
        Some(guidelines) => format!(
            "{base}\n\nFollow these brand guidelines in everything you write:\n\n{guidelines}"
        ),
        None => base.to_string(),
    }
}

/// Builds the user turn for a stage from the accumulated context.
#[must_use]
pub fn user_instruction(stage: StageId, ctx: &PipelineContext) -> String {
    let brief = ctx.brief().text();
    let analysis = ctx.output(StageId::Analysis).unwrap_or_default();
    let pain_points = ctx.output(StageId::PainPoints).unwrap_or_default();
    let copy = ctx.output(StageId::Copy).unwrap_or_default();

    match stage {
        StageId::Analysis => format!(
            "Analyze this client brief.\n\n\
             BRIEF:\n{brief}\n\n\
             Respond with exactly these four labeled fields:\n\
             INDUSTRY: <one line>\n\
             TARGET AUDIENCE: <who buys, and why>\n\
             PAIN POINTS: <comma-separated list of the audience's main problems>\n\
             DIFFERENTIATORS: <what sets this business apart>"
        ),
        StageId::PainPoints => format!(
            "BRIEF:\n{brief}\n\n\
             ANALYSIS:\n{analysis}\n\n\
             For each pain point named in the analysis, write one numbered entry. \
             Each entry names the pain point, describes how the customer experiences it \
             day to day, and states the cost of leaving it unsolved. Produce exactly as \
             many entries as the analysis lists pain points."
        ),
        StageId::Copy => format!(
            "BRIEF:\n{brief}\n\n\
             ANALYSIS:\n{analysis}\n\n\
             PAIN POINTS:\n{pain_points}\n\n\
             For each pain point, write a section headed by the pain point containing \
             three labeled variations:\n\
             HEADLINE: <under 12 words>\n\
             SOCIAL POST: <2-3 sentences>\n\
             EMAIL OPENER: <one short paragraph>"
        ),
        StageId::Strategy => format!(
            "BRIEF:\n{brief}\n\n\
             ANALYSIS:\n{analysis}\n\n\
             PAIN POINTS:\n{pain_points}\n\n\
             COPY:\n{copy}\n\n\
             Write a content strategy with these sections:\n\
             1. KEY MESSAGES (required): the three messages to lead with, and why.\n\
             2. CHANNEL PLAN (required): where each piece of copy should run.\n\
             3. NEXT STEPS (required): the first five actions, in order.\n\
             4. RISKS (optional): include only if the brief suggests real risks."
        ),
    }
}
