//! Per-intent handlers. Each one resolves its identifiers, performs the
//! network exchange and commits the mirror update; the orchestrator owns
//! locking and notifications.

use shared::{domain::ProjectName, protocol::ConfigurationUpdate};

use crate::{
    error::Result,
    intent::Intent,
    orchestrator::Context,
    store::Mutation,
    transport::ApiRequest,
    urls,
};

pub mod defect_types;
pub mod filters;
pub mod notifications;
pub mod patterns;
pub mod project;
pub mod triage;

pub(crate) async fn handle(ctx: &Context, intent: Intent) -> Result<()> {
    match intent {
        Intent::UpdateDefectTypes(defect_types) => defect_types::update(ctx, defect_types).await,
        Intent::AddDefectType(defect_type) => defect_types::add(ctx, defect_type).await,
        Intent::DeleteDefectType(defect_type) => defect_types::delete(ctx, defect_type).await,
        Intent::AddPattern(pattern) => patterns::add(ctx, pattern).await,
        Intent::UpdatePattern(pattern) => patterns::update(ctx, pattern).await,
        Intent::DeletePattern(pattern) => patterns::delete(ctx, pattern).await,
        Intent::UpdatePatternAnalysisState(enabled) => {
            patterns::set_analysis_state(ctx, enabled).await
        }
        Intent::FetchProject { project, info_only } => {
            project::fetch(ctx, project, info_only).await
        }
        Intent::FetchProjectPreferences(project) => project::fetch_preferences(ctx, &project).await,
        Intent::FetchConfigurationAttributes(project) => {
            project::fetch_configuration_attributes(ctx, &project).await
        }
        Intent::HideFilterOnLaunches(filter) => filters::hide_on_launches(ctx, filter).await,
        Intent::ShowFilterOnLaunches(filter) => filters::show_on_launches(ctx, filter).await,
        Intent::UpdateProjectFilterPreferences { filter_id, method } => {
            filters::update_preferences(ctx, filter_id, method).await
        }
        Intent::FetchProjectNotifications => notifications::fetch(ctx).await,
        Intent::AddNotificationRule(rule) => notifications::add(ctx, rule).await,
        Intent::UpdateNotificationRule(rule) => notifications::update(ctx, rule).await,
        Intent::DeleteNotificationRule(id) => notifications::delete(ctx, id).await,
        Intent::UpdateNotificationsState(enabled) => {
            notifications::set_state(ctx, enabled).await
        }
        Intent::SaveDefectDecision(decision) => triage::save_decision(ctx, decision).await,
        Intent::FetchMlSuggestions(item_id) => triage::fetch_suggestions(ctx, item_id).await,
    }
}

/// Writes one boolean configuration attribute and mirrors it.
pub(crate) async fn update_configuration_flag(
    ctx: &Context,
    project: &ProjectName,
    key: &str,
    enabled: bool,
) -> Result<()> {
    let update = ConfigurationUpdate::flag(key, enabled);
    ctx.send(ApiRequest::put(
        urls::project_by_name(project),
        serde_json::to_value(&update)?,
    ))
    .await?;
    ctx.commit(Mutation::AttributesUpdated(update.configuration.attributes));
    Ok(())
}
