//! Launch filter tabs. The tab list changes locally before the preference
//! write is confirmed.

use shared::{
    domain::{Filter, FilterId},
    protocol::PreferenceMethod,
};

use crate::{
    error::Result,
    orchestrator::Context,
    store::Mutation,
    transport::{ApiRequest, HttpMethod},
    urls,
};

pub(crate) async fn hide_on_launches(ctx: &Context, filter: Filter) -> Result<()> {
    ctx.project()?;
    ctx.user()?;
    ctx.commit(Mutation::FilterRemoved(filter.id));
    update_preferences(ctx, filter.id, PreferenceMethod::Delete).await
}

pub(crate) async fn show_on_launches(ctx: &Context, filter: Filter) -> Result<()> {
    let active = ctx.store.select(|state| state.filters.active);
    if active == Some(filter.id) {
        return Ok(());
    }
    ctx.project()?;
    ctx.user()?;
    let filter_id = filter.id;
    ctx.commit(Mutation::FilterAdded(filter));
    update_preferences(ctx, filter_id, PreferenceMethod::Put).await
}

pub(crate) async fn update_preferences(
    ctx: &Context,
    filter_id: FilterId,
    method: PreferenceMethod,
) -> Result<()> {
    let project = ctx.project()?;
    let user = ctx.user()?;
    let method = match method {
        PreferenceMethod::Put => HttpMethod::Put,
        PreferenceMethod::Delete => HttpMethod::Delete,
    };
    ctx.send(ApiRequest::new(
        method,
        urls::project_preferences(&project, &user, Some(filter_id)),
        None,
    ))
    .await?;
    Ok(())
}
