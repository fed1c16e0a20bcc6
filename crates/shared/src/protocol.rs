use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    DefectType, Filter, Integration, Pattern, TestItemId, TestItemIssue,
};

pub const PA_ATTRIBUTE_ENABLED_KEY: &str = "analyzer.isAutoPatternAnalysisEnabled";
pub const NOTIFICATIONS_ATTRIBUTE_ENABLED_KEY: &str = "notifications.enabled";

/// Body of `PUT project/{project}`. Boolean flags travel as `"true"` / `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigurationUpdate {
    pub configuration: ConfigurationAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigurationAttributes {
    pub attributes: BTreeMap<String, String>,
}

impl ConfigurationUpdate {
    pub fn flag(key: &str, enabled: bool) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(key.to_string(), enabled.to_string());
        Self {
            configuration: ConfigurationAttributes { attributes },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectTypesUpdateRequest {
    pub ids: Vec<DefectType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternUpdateRequest {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Defect types grouped by their parent type ref.
    #[serde(default)]
    pub sub_types: BTreeMap<String, Vec<DefectType>>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResource {
    pub project_id: i64,
    pub project_name: String,
    #[serde(default)]
    pub configuration: ProjectConfiguration,
    #[serde(default)]
    pub integrations: Vec<Integration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPreferences {
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceMethod {
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDefinition {
    pub test_item_id: TestItemId,
    pub issue: TestItemIssue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineIssuesRequest {
    pub issues: Vec<IssueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_choice: Option<u8>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTestItem {
    pub id: TestItemId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedItem {
    pub suggest_rs: SuggestInfo,
    pub test_item_resource: SuggestedTestItem,
}
