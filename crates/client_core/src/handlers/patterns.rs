use shared::{
    domain::Pattern,
    protocol::{PatternUpdateRequest, PA_ATTRIBUTE_ENABLED_KEY},
};
use tracing::info;

use super::update_configuration_flag;
use crate::{
    error::{OrchestratorError, Result},
    orchestrator::Context,
    store::{merge_created, Mutation},
    transport::ApiRequest,
    urls,
};

/// Creating the first pattern also switches pattern analysis on. Deleting the
/// last one leaves the flag alone.
pub(crate) async fn add(ctx: &Context, pattern: Pattern) -> Result<()> {
    let project = ctx.project()?;
    let response = ctx
        .send(ApiRequest::post(
            urls::project_add_pattern(&project),
            serde_json::to_value(&pattern)?,
        ))
        .await?;

    if ctx.store.select(|state| state.patterns().is_empty()) {
        info!(project = %project, "patterns: first pattern created, enabling pattern analysis");
        update_configuration_flag(ctx, &project, PA_ATTRIBUTE_ENABLED_KEY, true).await?;
    }

    let created = merge_created(&response, &pattern)?;
    ctx.commit(Mutation::PatternAdded(created));
    Ok(())
}

pub(crate) async fn update(ctx: &Context, pattern: Pattern) -> Result<()> {
    let project = ctx.project()?;
    let id = pattern
        .id
        .ok_or_else(|| OrchestratorError::precondition("pattern has no id"))?;
    let body = PatternUpdateRequest {
        name: pattern.name.clone(),
        enabled: pattern.enabled,
    };
    ctx.send(ApiRequest::put(
        urls::project_update_pattern(&project, id),
        serde_json::to_value(&body)?,
    ))
    .await?;
    ctx.commit(Mutation::PatternUpdated(pattern));
    Ok(())
}

pub(crate) async fn delete(ctx: &Context, pattern: Pattern) -> Result<()> {
    let project = ctx.project()?;
    let id = pattern
        .id
        .ok_or_else(|| OrchestratorError::precondition("pattern has no id"))?;
    ctx.send(ApiRequest::delete(urls::project_update_pattern(&project, id)))
        .await?;
    ctx.commit(Mutation::PatternDeleted(pattern));
    Ok(())
}

pub(crate) async fn set_analysis_state(ctx: &Context, enabled: bool) -> Result<()> {
    let project = ctx.project()?;
    update_configuration_flag(ctx, &project, PA_ATTRIBUTE_ENABLED_KEY, enabled).await
}
