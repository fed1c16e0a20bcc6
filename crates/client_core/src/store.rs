//! Application state container.
//!
//! Every field is written through [`Store::commit`], which applies a
//! [`Mutation`] in a short synchronous critical section. Reads go through
//! [`Store::select`]. Mirrors of server records only change from orchestrator
//! outcome handlers.

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::{
    domain::{
        DefectType, Filter, FilterId, Integration, NotificationRule, NotificationRuleId, Pattern,
        ProjectName,
    },
    protocol::{ProjectConfiguration, ProjectPreferences, ProjectResource, SuggestedItem},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub project: Option<ProjectName>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMirror {
    pub info: Option<ProjectInfo>,
    pub configuration: ProjectConfiguration,
    pub integrations: Vec<Integration>,
    pub preferences: ProjectPreferences,
    pub notification_rules: Vec<NotificationRule>,
    pub notifications_loading: bool,
    pub existing_launch_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMirror {
    pub launches: Vec<Filter>,
    pub active: Option<FilterId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriageMirror {
    pub suggestions: Vec<SuggestedItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: Session,
    pub project: ProjectMirror,
    pub filters: FilterMirror,
    pub triage: TriageMirror,
    pub active_modal: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SessionStarted(Session),
    DefectTypesUpdated(Vec<DefectType>),
    DefectTypeAdded(DefectType),
    DefectTypeDeleted(DefectType),
    PatternAdded(Pattern),
    PatternUpdated(Pattern),
    PatternDeleted(Pattern),
    AttributesUpdated(BTreeMap<String, String>),
    ProjectFetched(ProjectResource),
    PreferencesFetched(ProjectPreferences),
    LaunchFiltersSet(Vec<Filter>),
    FilterAdded(Filter),
    FilterRemoved(FilterId),
    ActiveFilterSet(Option<FilterId>),
    NotificationRulesFetched(Vec<NotificationRule>),
    NotificationRuleAdded(NotificationRule),
    NotificationRuleUpdated(NotificationRule),
    NotificationRuleDeleted(NotificationRuleId),
    NotificationsLoading(bool),
    ExistingLaunchNamesFetched(Vec<String>),
    SuggestionsFetched(Vec<SuggestedItem>),
    ModalShown(String),
    ModalHidden,
}

impl AppState {
    pub fn apply(&mut self, mutation: Mutation) {
        let project = &mut self.project;
        let configuration = &mut project.configuration;
        match mutation {
            Mutation::SessionStarted(session) => self.session = session,
            Mutation::DefectTypesUpdated(updated) => {
                for defect_type in updated {
                    let Some(group) = configuration.sub_types.get_mut(&defect_type.type_ref)
                    else {
                        continue;
                    };
                    if let Some(existing) = group.iter_mut().find(|d| d.id == defect_type.id) {
                        *existing = defect_type;
                    }
                }
            }
            Mutation::DefectTypeAdded(defect_type) => configuration
                .sub_types
                .entry(defect_type.type_ref.clone())
                .or_default()
                .push(defect_type),
            Mutation::DefectTypeDeleted(defect_type) => {
                if let Some(group) = configuration.sub_types.get_mut(&defect_type.type_ref) {
                    group.retain(|d| d.id != defect_type.id);
                }
            }
            Mutation::PatternAdded(pattern) => configuration.patterns.push(pattern),
            Mutation::PatternUpdated(pattern) => {
                if let Some(existing) = configuration
                    .patterns
                    .iter_mut()
                    .find(|p| p.id == pattern.id)
                {
                    *existing = pattern;
                }
            }
            Mutation::PatternDeleted(pattern) => {
                configuration.patterns.retain(|p| p.id != pattern.id)
            }
            Mutation::AttributesUpdated(attributes) => configuration.attributes.extend(attributes),
            Mutation::ProjectFetched(resource) => {
                project.info = Some(ProjectInfo {
                    id: resource.project_id,
                    name: resource.project_name,
                });
                project.configuration = resource.configuration;
                project.integrations = resource.integrations;
            }
            Mutation::PreferencesFetched(preferences) => project.preferences = preferences,
            Mutation::LaunchFiltersSet(filters) => self.filters.launches = filters,
            Mutation::FilterAdded(filter) => {
                self.filters.active = Some(filter.id);
                if !self.filters.launches.iter().any(|f| f.id == filter.id) {
                    self.filters.launches.push(filter);
                }
            }
            Mutation::FilterRemoved(id) => {
                self.filters.launches.retain(|f| f.id != id);
                if self.filters.active == Some(id) {
                    self.filters.active = self.filters.launches.first().map(|f| f.id);
                }
            }
            Mutation::ActiveFilterSet(id) => self.filters.active = id,
            Mutation::NotificationRulesFetched(rules) => project.notification_rules = rules,
            Mutation::NotificationRuleAdded(rule) => project.notification_rules.push(rule),
            Mutation::NotificationRuleUpdated(rule) => {
                if let Some(existing) = project
                    .notification_rules
                    .iter_mut()
                    .find(|r| r.id == rule.id)
                {
                    *existing = rule;
                }
            }
            Mutation::NotificationRuleDeleted(id) => {
                project.notification_rules.retain(|r| r.id != Some(id))
            }
            Mutation::NotificationsLoading(loading) => project.notifications_loading = loading,
            Mutation::ExistingLaunchNamesFetched(names) => project.existing_launch_names = names,
            Mutation::SuggestionsFetched(items) => self.triage.suggestions = items,
            Mutation::ModalShown(id) => self.active_modal = Some(id),
            Mutation::ModalHidden => self.active_modal = None,
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.project.configuration.patterns
    }

    pub fn notification_rules(&self) -> &[NotificationRule] {
        &self.project.notification_rules
    }

    pub fn defect_types(&self, type_ref: &str) -> &[DefectType] {
        self.project
            .configuration
            .sub_types
            .get(type_ref)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.project
            .configuration
            .attributes
            .get(key)
            .map(String::as_str)
    }
}

#[derive(Default)]
pub struct Store {
    state: RwLock<AppState>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn with_session(project: Option<ProjectName>, user: Option<String>) -> Self {
        let mut state = AppState::default();
        state.apply(Mutation::SessionStarted(Session { project, user }));
        Self::new(state)
    }

    pub fn select<R>(&self, selector: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        selector(&state)
    }

    pub fn commit(&self, mutation: Mutation) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.apply(mutation);
    }

    pub fn snapshot(&self) -> AppState {
        self.select(AppState::clone)
    }
}

/// Builds the mirror record for a created entity: the server response seeds the
/// record and every field the client sent overrides the echoed value.
pub fn merge_created<T>(response: &Value, payload: &T) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match response {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    if let Value::Object(fields) = serde_json::to_value(payload)? {
        merged.extend(fields);
    }
    serde_json::from_value(Value::Object(merged))
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
