use shared::{
    domain::ProjectName,
    protocol::{ProjectPreferences, ProjectResource},
};

use crate::{
    error::Result,
    orchestrator::Context,
    store::Mutation,
    transport::ApiRequest,
    urls,
};

/// Loads the project and, unless only the info is wanted, the current user's
/// preferences for it.
pub(crate) async fn fetch(ctx: &Context, project: ProjectName, info_only: bool) -> Result<()> {
    let response = ctx
        .send(ApiRequest::get(urls::project_by_name(&project)))
        .await?;
    let resource: ProjectResource = serde_json::from_value(response)?;
    ctx.commit(Mutation::ProjectFetched(resource));

    if !info_only {
        fetch_preferences(ctx, &project).await?;
    }
    Ok(())
}

pub(crate) async fn fetch_preferences(ctx: &Context, project: &ProjectName) -> Result<()> {
    let user = ctx.user()?;
    let response = ctx
        .send(ApiRequest::get(urls::project_preferences(project, &user, None)))
        .await?;
    let preferences: ProjectPreferences = serde_json::from_value(response)?;
    ctx.commit(Mutation::LaunchFiltersSet(preferences.filters.clone()));
    ctx.commit(Mutation::PreferencesFetched(preferences));
    Ok(())
}

pub(crate) async fn fetch_configuration_attributes(
    ctx: &Context,
    project: &ProjectName,
) -> Result<()> {
    let response = ctx
        .send(ApiRequest::get(urls::project_by_name(project)))
        .await?;
    let resource: ProjectResource = serde_json::from_value(response)?;
    ctx.commit(Mutation::AttributesUpdated(resource.configuration.attributes));
    Ok(())
}
