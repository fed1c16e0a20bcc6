//! Endpoint paths, relative to the server base url.

use shared::domain::{DefectTypeId, FilterId, NotificationRuleId, PatternId, ProjectName, TestItemId};

const API: &str = "api/v1";

pub fn project_defect_type(project: &ProjectName) -> String {
    format!("{API}/{project}/settings/sub-type")
}

pub fn project_delete_defect_type(project: &ProjectName, id: DefectTypeId) -> String {
    format!("{API}/{project}/settings/sub-type/{id}")
}

pub fn project_add_pattern(project: &ProjectName) -> String {
    format!("{API}/{project}/settings/pattern")
}

pub fn project_update_pattern(project: &ProjectName, id: PatternId) -> String {
    format!("{API}/{project}/settings/pattern/{id}")
}

pub fn project_by_name(project: &ProjectName) -> String {
    format!("{API}/project/{project}")
}

pub fn notification(project: &ProjectName) -> String {
    format!("{API}/project/{project}/notification")
}

pub fn notification_by_id(project: &ProjectName, id: NotificationRuleId) -> String {
    format!("{API}/project/{project}/notification/{id}")
}

pub fn launches_existing_names(project: &ProjectName) -> String {
    format!("{API}/{project}/launch/names")
}

pub fn project_preferences(project: &ProjectName, user: &str, filter: Option<FilterId>) -> String {
    match filter {
        Some(filter) => format!("{API}/project/{project}/preference/{user}/{filter}"),
        None => format!("{API}/project/{project}/preference/{user}"),
    }
}

pub fn plugin_file_import(project: &ProjectName, plugin: &str) -> String {
    format!("{API}/plugin/{project}/{plugin}/import")
}

pub fn test_items(project: &ProjectName) -> String {
    format!("{API}/{project}/item")
}

pub fn ml_suggestions(project: &ProjectName, item: TestItemId) -> String {
    format!("{API}/{project}/item/suggest/{item}")
}

pub fn choice_suggested_items(project: &ProjectName) -> String {
    format!("{API}/{project}/item/suggest/choice")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_path_appends_filter_when_present() {
        let project = ProjectName::from("demo");
        assert_eq!(
            project_preferences(&project, "alice", None),
            "api/v1/project/demo/preference/alice"
        );
        assert_eq!(
            project_preferences(&project, "alice", Some(FilterId(42))),
            "api/v1/project/demo/preference/alice/42"
        );
    }

    #[test]
    fn pattern_paths_are_project_scoped() {
        let project = ProjectName::from("demo");
        assert_eq!(project_add_pattern(&project), "api/v1/demo/settings/pattern");
        assert_eq!(
            project_update_pattern(&project, PatternId(3)),
            "api/v1/demo/settings/pattern/3"
        );
    }
}
