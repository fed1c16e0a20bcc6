use super::*;
use serde_json::json;
use shared::domain::ExternalSystemIssue;

use crate::{
    notification::{NotificationContent, NotificationKind},
    orchestrator::IntentPhase,
    test_support::{api_error, demo_orchestrator, project, ScriptedTransport},
    transport::HttpMethod,
    Intent,
};

fn issue(issue_type: &str, comment: Option<&str>) -> TestItemIssue {
    TestItemIssue {
        issue_type: issue_type.to_string(),
        comment: comment.map(str::to_string),
        auto_analyzed: true,
        ignore_analyzer: false,
        external_system_issues: Vec::new(),
    }
}

fn item(id: i64, comment: Option<&str>) -> TestItem {
    TestItem {
        id: TestItemId(id),
        name: format!("test {id}"),
        issue: issue("ti001", comment),
    }
}

fn ticket(id: &str) -> ExternalSystemIssue {
    ExternalSystemIssue {
        ticket_id: id.to_string(),
        url: None,
        bts_url: None,
        bts_project: None,
    }
}

fn decision(mode: DecisionMode, comment: Option<&str>, items: Vec<TestItem>) -> DefectDecision {
    DefectDecision {
        source_item_id: items.first().map(|i| i.id),
        issue: issue("pb001", comment),
        items,
        mode,
        suggestions: Vec::new(),
    }
}

fn suggestion(id: i64) -> SuggestedItem {
    serde_json::from_value(json!({
        "suggestRs": { "testItem": id, "matchScore": 90 },
        "testItemResource": { "id": id, "name": format!("test {id}") }
    }))
    .expect("suggestion")
}

fn comments(issues: &[IssueDefinition]) -> Vec<Option<&str>> {
    issues.iter().map(|i| i.issue.comment.as_deref()).collect()
}

#[test]
fn single_mode_appends_comment_to_similar_items_only() {
    let decision = decision(
        DecisionMode::Single,
        Some("flaky network"),
        vec![item(1, Some("old")), item(2, Some("seen before")), item(3, Some("flaky network"))],
    );

    let issues = prepare_issues(&decision);

    assert_eq!(
        comments(&issues),
        vec![
            Some("flaky network"),
            Some("seen before\nflaky network"),
            Some("flaky network"),
        ]
    );
    assert!(issues.iter().all(|i| !i.issue.auto_analyzed));
    assert!(issues.iter().all(|i| i.issue.issue_type == "pb001"));
}

#[test]
fn history_mode_appends_to_every_differing_item() {
    let decision = decision(
        DecisionMode::CopyFromHistory,
        Some("known bug"),
        vec![item(1, Some("triaged")), item(2, None)],
    );

    let issues = prepare_issues(&decision);

    assert_eq!(
        comments(&issues),
        vec![Some("triaged\nknown bug"), Some("known bug")]
    );
}

#[test]
fn bulk_mode_replaces_or_joins_comments() {
    let items = vec![item(1, Some("first")), item(2, None)];

    let replaced = prepare_issues(&decision(
        DecisionMode::Bulk {
            replace_comment: true,
        },
        Some("bulk"),
        items.clone(),
    ));
    assert_eq!(comments(&replaced), vec![Some("bulk"), Some("bulk")]);

    let joined = prepare_issues(&decision(
        DecisionMode::Bulk {
            replace_comment: false,
        },
        Some("bulk"),
        items,
    ));
    assert_eq!(comments(&joined), vec![Some("first\nbulk"), Some("bulk")]);
}

#[test]
fn bulk_mode_keeps_item_tickets_unless_decision_has_some() {
    let mut linked = item(1, None);
    linked.issue.external_system_issues = vec![ticket("JIRA-1")];
    let mut bulk = decision(
        DecisionMode::Bulk {
            replace_comment: true,
        },
        None,
        vec![linked],
    );

    let kept = prepare_issues(&bulk);
    assert_eq!(kept[0].issue.external_system_issues, vec![ticket("JIRA-1")]);

    bulk.issue.external_system_issues = vec![ticket("JIRA-2")];
    let replaced = prepare_issues(&bulk);
    assert_eq!(replaced[0].issue.external_system_issues, vec![ticket("JIRA-2")]);
}

#[test]
fn comment_only_bulk_decision_keeps_item_defect_type() {
    let mut ignored = item(1, Some("first"));
    ignored.issue.ignore_analyzer = true;
    let mut bulk = decision(
        DecisionMode::Bulk {
            replace_comment: false,
        },
        Some("note"),
        vec![ignored, item(2, None)],
    );
    bulk.issue.issue_type = String::new();

    let issues = prepare_issues(&bulk);

    assert!(issues.iter().all(|i| i.issue.issue_type == "ti001"));
    assert!(issues[0].issue.ignore_analyzer);
    assert!(!issues[1].issue.ignore_analyzer);
    assert!(issues.iter().all(|i| !i.issue.auto_analyzed));
    assert_eq!(comments(&issues), vec![Some("first\nnote"), Some("note")]);
}

#[test]
fn bulk_decision_with_defect_type_overrides_item_flags() {
    let mut ignored = item(1, None);
    ignored.issue.ignore_analyzer = true;

    let issues = prepare_issues(&decision(
        DecisionMode::Bulk {
            replace_comment: true,
        },
        Some("bulk"),
        vec![ignored],
    ));

    assert_eq!(issues[0].issue.issue_type, "pb001");
    assert!(!issues[0].issue.ignore_analyzer);
}

#[test]
fn replacing_with_no_comment_omits_the_field() {
    let issues = prepare_issues(&decision(
        DecisionMode::Bulk {
            replace_comment: true,
        },
        None,
        vec![item(1, Some("old"))],
    ));

    assert_eq!(issues[0].issue.comment, None);
    let body = serde_json::to_value(&issues[0]).expect("serialize");
    assert!(body["issue"].get("comment").is_none());
}

#[test]
fn only_the_source_item_is_marked_as_chosen() {
    let mut decision = decision(DecisionMode::Single, None, vec![item(7, None)]);
    decision.suggestions = vec![suggestion(7), suggestion(8)];

    let choices = suggestion_choices(&decision);

    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].user_choice, Some(1));
    assert_eq!(choices[1].user_choice, None);
    assert_eq!(choices[0].details["matchScore"], 90);
}

#[tokio::test]
async fn saving_a_decision_reports_both_outcomes() {
    let transport = ScriptedTransport::new();
    let orchestrator = demo_orchestrator(transport.clone());
    orchestrator
        .store()
        .commit(Mutation::ModalShown("editDefectModal".to_string()));
    let mut events = orchestrator.subscribe_events();

    let mut decision = decision(DecisionMode::Single, Some("bug"), vec![item(7, None)]);
    decision.suggestions = vec![suggestion(7)];
    let outcome = orchestrator
        .run(Intent::SaveDefectDecision(decision))
        .await;

    assert!(outcome.is_resolved());
    assert_eq!(orchestrator.store().select(|s| s.active_modal.clone()), None);
    let saved = transport.calls_to(HttpMethod::Put, &urls::test_items(&project()));
    assert_eq!(saved.len(), 1);
    assert_eq!(
        saved[0].body.as_ref().expect("body")["issues"][0]["testItemId"],
        7
    );
    let choice = transport.calls_to(HttpMethod::Put, &urls::choice_suggested_items(&project()));
    assert_eq!(choice[0].body.as_ref().expect("body")[0]["userChoice"], 1);

    let mut keys: Vec<_> = orchestrator
        .notifications()
        .snapshot()
        .into_iter()
        .map(|n| n.content)
        .collect();
    keys.sort_by_key(|c| format!("{c:?}"));
    assert_eq!(
        keys,
        vec![
            NotificationContent::MessageId(messages::SUGGESTED_CHOICE_SUCCESS),
            NotificationContent::MessageId(messages::UPDATE_DEFECTS_SUCCESS),
        ]
    );

    let mut updated = None;
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::TestItemsUpdated(issues) = event {
            updated = Some(issues);
        }
    }
    assert_eq!(updated.map(|issues| issues.len()), Some(1));
}

#[tokio::test]
async fn failed_save_uses_catalog_message() {
    let transport = ScriptedTransport::new();
    transport.fail(
        HttpMethod::Put,
        urls::test_items(&project()),
        api_error(400, "Incorrect defect type"),
    );
    let orchestrator = demo_orchestrator(transport.clone());

    let outcome = orchestrator
        .run(Intent::SaveDefectDecision(decision(
            DecisionMode::Single,
            None,
            vec![item(1, None)],
        )))
        .await;

    assert_eq!(outcome.phase, IntentPhase::Rejected);
    let shown = orchestrator.notifications().snapshot();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].kind, NotificationKind::Error);
    assert_eq!(
        shown[0].content,
        NotificationContent::MessageId(messages::UPDATE_DEFECTS_FAILED)
    );
    assert!(transport
        .calls_to(HttpMethod::Put, &urls::choice_suggested_items(&project()))
        .is_empty());
}

#[tokio::test]
async fn rejected_choice_does_not_fail_the_decision() {
    let transport = ScriptedTransport::new();
    transport.fail(
        HttpMethod::Put,
        urls::choice_suggested_items(&project()),
        api_error(500, "analyzer offline"),
    );
    let orchestrator = demo_orchestrator(transport.clone());
    let mut decision = decision(DecisionMode::Single, None, vec![item(7, None)]);
    decision.suggestions = vec![suggestion(7)];

    let outcome = orchestrator
        .run(Intent::SaveDefectDecision(decision))
        .await;

    assert!(outcome.is_resolved());
    let kinds: Vec<_> = orchestrator
        .notifications()
        .snapshot()
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationKind::Error));
    assert!(kinds.contains(&NotificationKind::Success));
}

#[tokio::test]
async fn fetched_suggestions_are_mirrored() {
    let transport = ScriptedTransport::new();
    transport.respond(
        HttpMethod::Get,
        urls::ml_suggestions(&project(), TestItemId(7)),
        json!([
            { "suggestRs": { "matchScore": 70 }, "testItemResource": { "id": 31 } }
        ]),
    );
    let orchestrator = demo_orchestrator(transport);

    let outcome = orchestrator
        .run(Intent::FetchMlSuggestions(TestItemId(7)))
        .await;

    assert!(outcome.is_resolved());
    let suggestions = orchestrator.store().select(|s| s.triage.suggestions.clone());
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].test_item_resource.id, TestItemId(31));
}
