use shared::{
    domain::{DefectType, Filter, FilterId, NotificationRule, NotificationRuleId, Pattern, ProjectName, TestItemId},
    protocol::PreferenceMethod,
};

use crate::{handlers::triage::DefectDecision, lock::LockCategory, messages};

/// A discrete user action, consumed exactly once by the orchestrator.
#[derive(Debug, Clone)]
pub enum Intent {
    UpdateDefectTypes(Vec<DefectType>),
    AddDefectType(DefectType),
    DeleteDefectType(DefectType),
    AddPattern(Pattern),
    UpdatePattern(Pattern),
    DeletePattern(Pattern),
    UpdatePatternAnalysisState(bool),
    FetchProject {
        project: ProjectName,
        info_only: bool,
    },
    FetchProjectPreferences(ProjectName),
    FetchConfigurationAttributes(ProjectName),
    HideFilterOnLaunches(Filter),
    ShowFilterOnLaunches(Filter),
    UpdateProjectFilterPreferences {
        filter_id: FilterId,
        method: PreferenceMethod,
    },
    FetchProjectNotifications,
    AddNotificationRule(NotificationRule),
    UpdateNotificationRule(NotificationRule),
    DeleteNotificationRule(NotificationRuleId),
    UpdateNotificationsState(bool),
    SaveDefectDecision(DefectDecision),
    FetchMlSuggestions(TestItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    UpdateDefectTypes,
    AddDefectType,
    DeleteDefectType,
    AddPattern,
    UpdatePattern,
    DeletePattern,
    UpdatePatternAnalysisState,
    FetchProject,
    FetchProjectPreferences,
    FetchConfigurationAttributes,
    HideFilterOnLaunches,
    ShowFilterOnLaunches,
    UpdateProjectFilterPreferences,
    FetchProjectNotifications,
    AddNotificationRule,
    UpdateNotificationRule,
    DeleteNotificationRule,
    UpdateNotificationsState,
    SaveDefectDecision,
    FetchMlSuggestions,
}

/// When the modal that raised an intent gets closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPolicy {
    Keep,
    CloseOnSuccess,
    CloseImmediately,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::UpdateDefectTypes(_) => IntentKind::UpdateDefectTypes,
            Self::AddDefectType(_) => IntentKind::AddDefectType,
            Self::DeleteDefectType(_) => IntentKind::DeleteDefectType,
            Self::AddPattern(_) => IntentKind::AddPattern,
            Self::UpdatePattern(_) => IntentKind::UpdatePattern,
            Self::DeletePattern(_) => IntentKind::DeletePattern,
            Self::UpdatePatternAnalysisState(_) => IntentKind::UpdatePatternAnalysisState,
            Self::FetchProject { .. } => IntentKind::FetchProject,
            Self::FetchProjectPreferences(_) => IntentKind::FetchProjectPreferences,
            Self::FetchConfigurationAttributes(_) => IntentKind::FetchConfigurationAttributes,
            Self::HideFilterOnLaunches(_) => IntentKind::HideFilterOnLaunches,
            Self::ShowFilterOnLaunches(_) => IntentKind::ShowFilterOnLaunches,
            Self::UpdateProjectFilterPreferences { .. } => {
                IntentKind::UpdateProjectFilterPreferences
            }
            Self::FetchProjectNotifications => IntentKind::FetchProjectNotifications,
            Self::AddNotificationRule(_) => IntentKind::AddNotificationRule,
            Self::UpdateNotificationRule(_) => IntentKind::UpdateNotificationRule,
            Self::DeleteNotificationRule(_) => IntentKind::DeleteNotificationRule,
            Self::UpdateNotificationsState(_) => IntentKind::UpdateNotificationsState,
            Self::SaveDefectDecision(_) => IntentKind::SaveDefectDecision,
            Self::FetchMlSuggestions(_) => IntentKind::FetchMlSuggestions,
        }
    }
}

impl IntentKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::UpdateDefectTypes => "update_defect_types",
            Self::AddDefectType => "add_defect_type",
            Self::DeleteDefectType => "delete_defect_type",
            Self::AddPattern => "add_pattern",
            Self::UpdatePattern => "update_pattern",
            Self::DeletePattern => "delete_pattern",
            Self::UpdatePatternAnalysisState => "update_pattern_analysis_state",
            Self::FetchProject => "fetch_project",
            Self::FetchProjectPreferences => "fetch_project_preferences",
            Self::FetchConfigurationAttributes => "fetch_configuration_attributes",
            Self::HideFilterOnLaunches => "hide_filter_on_launches",
            Self::ShowFilterOnLaunches => "show_filter_on_launches",
            Self::UpdateProjectFilterPreferences => "update_project_filter_preferences",
            Self::FetchProjectNotifications => "fetch_project_notifications",
            Self::AddNotificationRule => "add_notification_rule",
            Self::UpdateNotificationRule => "update_notification_rule",
            Self::DeleteNotificationRule => "delete_notification_rule",
            Self::UpdateNotificationsState => "update_notifications_state",
            Self::SaveDefectDecision => "save_defect_decision",
            Self::FetchMlSuggestions => "fetch_ml_suggestions",
        }
    }

    /// Lock taken for the whole lifetime of the intent. Plain pattern and
    /// first-rule adds run unlocked.
    pub fn lock_category(self) -> Option<LockCategory> {
        match self {
            Self::UpdateDefectTypes | Self::AddDefectType | Self::DeleteDefectType => {
                Some(LockCategory::DefectTypes)
            }
            Self::UpdatePatternAnalysisState => Some(LockCategory::PatternAnalysis),
            Self::UpdateNotificationRule
            | Self::DeleteNotificationRule
            | Self::UpdateNotificationsState => Some(LockCategory::Notifications),
            _ => None,
        }
    }

    pub fn success_message(self) -> Option<&'static str> {
        match self {
            Self::UpdateDefectTypes => Some(messages::UPDATE_DEFECT_TYPE_SUCCESS),
            Self::AddDefectType => Some(messages::ADD_DEFECT_TYPE_SUCCESS),
            Self::DeleteDefectType => Some(messages::DELETE_DEFECT_TYPE_SUCCESS),
            Self::AddPattern => Some(messages::ADD_PATTERN_SUCCESS),
            Self::UpdatePattern => Some(messages::UPDATE_PATTERN_SUCCESS),
            Self::DeletePattern => Some(messages::DELETE_PATTERN_SUCCESS),
            Self::UpdatePatternAnalysisState => Some(messages::UPDATE_PA_STATE_SUCCESS),
            Self::AddNotificationRule
            | Self::UpdateNotificationRule
            | Self::DeleteNotificationRule
            | Self::UpdateNotificationsState => Some(messages::UPDATE_NOTIFICATIONS_SUCCESS),
            Self::SaveDefectDecision => Some(messages::UPDATE_DEFECTS_SUCCESS),
            _ => None,
        }
    }

    /// Catalog key replacing the transport message on failure, if any.
    pub fn failure_message(self) -> Option<&'static str> {
        match self {
            Self::SaveDefectDecision => Some(messages::UPDATE_DEFECTS_FAILED),
            _ => None,
        }
    }

    pub fn modal_policy(self) -> ModalPolicy {
        match self {
            Self::UpdateDefectTypes
            | Self::AddDefectType
            | Self::DeleteDefectType
            | Self::AddNotificationRule
            | Self::UpdateNotificationRule
            | Self::DeleteNotificationRule => ModalPolicy::CloseOnSuccess,
            Self::SaveDefectDecision => ModalPolicy::CloseImmediately,
            _ => ModalPolicy::Keep,
        }
    }
}
