use shared::{
    domain::{NotificationRule, NotificationRuleId},
    protocol::NOTIFICATIONS_ATTRIBUTE_ENABLED_KEY,
};
use tracing::info;

use super::update_configuration_flag;
use crate::{
    error::{OrchestratorError, Result},
    orchestrator::Context,
    store::{merge_created, Mutation, Store},
    transport::ApiRequest,
    urls,
};

/// Clears the loading flag on every exit path.
struct LoadingFlag<'a> {
    store: &'a Store,
}

impl<'a> LoadingFlag<'a> {
    fn raise(store: &'a Store) -> Self {
        store.commit(Mutation::NotificationsLoading(true));
        Self { store }
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.store.commit(Mutation::NotificationsLoading(false));
    }
}

/// Loads the rules and the existing launch names together. Nothing is
/// mirrored unless both requests succeed.
pub(crate) async fn fetch(ctx: &Context) -> Result<()> {
    let project = ctx.project()?;
    let _loading = LoadingFlag::raise(&ctx.store);

    let (rules, launch_names) = tokio::join!(
        ctx.send(ApiRequest::get(urls::notification(&project))),
        ctx.send(ApiRequest::get(urls::launches_existing_names(&project))),
    );
    let rules: Vec<NotificationRule> = serde_json::from_value(rules?)?;
    let launch_names: Vec<String> = serde_json::from_value(launch_names?)?;

    ctx.commit(Mutation::NotificationRulesFetched(rules));
    ctx.commit(Mutation::ExistingLaunchNamesFetched(launch_names));
    Ok(())
}

/// Creating the first rule also switches project notifications on.
pub(crate) async fn add(ctx: &Context, rule: NotificationRule) -> Result<()> {
    let project = ctx.project()?;
    let response = ctx
        .send(ApiRequest::post(
            urls::notification(&project),
            serde_json::to_value(&rule)?,
        ))
        .await?;

    if ctx.store.select(|state| state.notification_rules().is_empty()) {
        info!(project = %project, "notifications: first rule created, enabling notifications");
        update_configuration_flag(ctx, &project, NOTIFICATIONS_ATTRIBUTE_ENABLED_KEY, true)
            .await?;
    }

    let created = merge_created(&response, &rule)?;
    ctx.commit(Mutation::NotificationRuleAdded(created));
    Ok(())
}

pub(crate) async fn update(ctx: &Context, rule: NotificationRule) -> Result<()> {
    let project = ctx.project()?;
    if rule.id.is_none() {
        return Err(OrchestratorError::precondition("notification rule has no id"));
    }
    ctx.send(ApiRequest::put(
        urls::notification(&project),
        serde_json::to_value(&rule)?,
    ))
    .await?;
    ctx.commit(Mutation::NotificationRuleUpdated(rule));
    Ok(())
}

pub(crate) async fn delete(ctx: &Context, id: NotificationRuleId) -> Result<()> {
    let project = ctx.project()?;
    ctx.send(ApiRequest::delete(urls::notification_by_id(&project, id)))
        .await?;
    ctx.commit(Mutation::NotificationRuleDeleted(id));
    Ok(())
}

pub(crate) async fn set_state(ctx: &Context, enabled: bool) -> Result<()> {
    let project = ctx.project()?;
    update_configuration_flag(ctx, &project, NOTIFICATIONS_ATTRIBUTE_ENABLED_KEY, enabled).await
}
