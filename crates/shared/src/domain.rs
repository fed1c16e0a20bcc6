use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DefectTypeId);
id_newtype!(PatternId);
id_newtype!(NotificationRuleId);
id_newtype!(FilterId);
id_newtype!(TestItemId);
id_newtype!(IntegrationId);

/// Projects are addressed by name in every project-scoped URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(pub String);

impl ProjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DefectTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Parent group, e.g. `PRODUCT_BUG` or `TO_INVESTIGATE`.
    pub type_ref: String,
    pub long_name: String,
    pub short_name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    String,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PatternId>,
    pub name: String,
    pub enabled: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PatternKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendCase {
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "toInvestigate")]
    ToInvestigate,
    #[serde(rename = "more10")]
    More10,
    #[serde(rename = "more20")]
    More20,
    #[serde(rename = "more50")]
    More50,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NotificationRuleId>,
    pub rule_name: String,
    pub enabled: bool,
    pub send_case: SendCase,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub launch_names: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<ItemAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_operator: Option<String>,
    #[serde(default)]
    pub inform_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationType {
    pub name: String,
    #[serde(default)]
    pub group_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: IntegrationId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    pub integration_type: IntegrationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub id: FilterId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSystemIssue {
    pub ticket_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub bts_url: Option<String>,
    #[serde(default)]
    pub bts_project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestItemIssue {
    /// Locator of the defect type assigned to the item.
    pub issue_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub auto_analyzed: bool,
    #[serde(default)]
    pub ignore_analyzer: bool,
    #[serde(default)]
    pub external_system_issues: Vec<ExternalSystemIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestItem {
    pub id: TestItemId,
    pub name: String,
    #[serde(default)]
    pub issue: TestItemIssue,
}
