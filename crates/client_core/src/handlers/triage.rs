//! Defect triage: assigning a defect type and comment to one or many test items.

use shared::{
    domain::{TestItem, TestItemId, TestItemIssue},
    protocol::{DefineIssuesRequest, IssueDefinition, SuggestInfo, SuggestedItem},
};
use tracing::warn;

use crate::{
    error::Result,
    messages,
    orchestrator::Context,
    store::Mutation,
    transport::ApiRequest,
    urls, ClientEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionMode {
    /// Manual decision for the opened item and, optionally, similar items.
    Single,
    /// Decision copied from an earlier run of the same item.
    CopyFromHistory,
    Bulk { replace_comment: bool },
}

#[derive(Debug, Clone)]
pub struct DefectDecision {
    /// Item the decision was made for; it receives `userChoice = 1` among the suggestions.
    pub source_item_id: Option<TestItemId>,
    pub issue: TestItemIssue,
    pub items: Vec<TestItem>,
    pub mode: DecisionMode,
    pub suggestions: Vec<SuggestedItem>,
}

fn join_comments(existing: Option<&str>, added: Option<&str>) -> String {
    format!(
        "{}\n{}",
        existing.unwrap_or_default(),
        added.unwrap_or_default()
    )
    .trim()
    .to_string()
}

/// Builds the issue list sent to the server. Analyzer flags are always reset.
pub fn prepare_issues(decision: &DefectDecision) -> Vec<IssueDefinition> {
    let source = &decision.issue;
    decision
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let issue = match decision.mode {
                DecisionMode::Bulk { replace_comment } => {
                    let mut issue = item.issue.clone();
                    // An empty issue type means a comment-only decision.
                    if !source.issue_type.is_empty() {
                        issue.issue_type = source.issue_type.clone();
                        issue.ignore_analyzer = source.ignore_analyzer;
                    }
                    issue.comment = if replace_comment {
                        source.comment.clone()
                    } else {
                        Some(join_comments(
                            item.issue.comment.as_deref(),
                            source.comment.as_deref(),
                        ))
                    };
                    if !source.external_system_issues.is_empty() {
                        issue.external_system_issues = source.external_system_issues.clone();
                    }
                    issue.auto_analyzed = false;
                    issue
                }
                DecisionMode::Single | DecisionMode::CopyFromHistory => {
                    let append = source.comment != item.issue.comment
                        && (decision.mode == DecisionMode::CopyFromHistory || index != 0);
                    let comment = if append {
                        join_comments(item.issue.comment.as_deref(), source.comment.as_deref())
                    } else {
                        source.comment.clone().unwrap_or_default()
                    };
                    TestItemIssue {
                        comment: Some(comment),
                        auto_analyzed: false,
                        ..source.clone()
                    }
                }
            };
            IssueDefinition {
                test_item_id: item.id,
                issue,
            }
        })
        .collect()
}

/// Suggestion feedback: the chosen item is marked with `userChoice = 1`.
pub fn suggestion_choices(decision: &DefectDecision) -> Vec<SuggestInfo> {
    decision
        .suggestions
        .iter()
        .map(|suggestion| {
            let mut info = suggestion.suggest_rs.clone();
            if Some(suggestion.test_item_resource.id) == decision.source_item_id {
                info.user_choice = Some(1);
            }
            info
        })
        .collect()
}

/// Saves the decision. Suggestion feedback is sent alongside and reports its
/// own notification without affecting the decision's outcome.
pub(crate) async fn save_decision(ctx: &Context, decision: DefectDecision) -> Result<()> {
    let project = ctx.project()?;
    let issues = prepare_issues(&decision);
    let body = serde_json::to_value(DefineIssuesRequest {
        issues: issues.clone(),
    })?;

    let choices = suggestion_choices(&decision);
    let send_choices = async {
        if choices.is_empty() {
            return;
        }
        let request = match serde_json::to_value(&choices) {
            Ok(value) => ApiRequest::put(urls::choice_suggested_items(&project), value),
            Err(err) => {
                warn!("triage: could not encode suggestion choice: {err}");
                ctx.notifications.error_key(messages::SUGGESTED_CHOICE_FAILED);
                return;
            }
        };
        match ctx.send(request).await {
            Ok(_) => {
                ctx.notifications.success(messages::SUGGESTED_CHOICE_SUCCESS);
            }
            Err(err) => {
                warn!(error = %err, "triage: suggestion choice rejected");
                ctx.notifications.error_key(messages::SUGGESTED_CHOICE_FAILED);
            }
        }
    };
    let save = ctx.send(ApiRequest::put(urls::test_items(&project), body));

    let ((), saved) = tokio::join!(send_choices, save);
    saved?;

    ctx.emit(ClientEvent::TestItemsUpdated(issues));
    Ok(())
}

pub(crate) async fn fetch_suggestions(ctx: &Context, item_id: TestItemId) -> Result<()> {
    let project = ctx.project()?;
    let response = ctx
        .send(ApiRequest::get(urls::ml_suggestions(&project, item_id)))
        .await?;
    let suggestions: Vec<SuggestedItem> = serde_json::from_value(response)?;
    ctx.commit(Mutation::SuggestionsFetched(suggestions));
    Ok(())
}

#[cfg(test)]
#[path = "../tests/triage_tests.rs"]
mod tests;
