//! Message-catalog keys used by success and failure notifications.

pub const UPDATE_DEFECT_TYPE_SUCCESS: &str = "updateDefectTypeSuccess";
pub const ADD_DEFECT_TYPE_SUCCESS: &str = "addDefectTypeSuccess";
pub const DELETE_DEFECT_TYPE_SUCCESS: &str = "deleteDefectTypeSuccess";
pub const ADD_PATTERN_SUCCESS: &str = "addPatternSuccess";
pub const UPDATE_PATTERN_SUCCESS: &str = "updatePatternSuccess";
pub const DELETE_PATTERN_SUCCESS: &str = "deletePatternSuccess";
pub const UPDATE_PA_STATE_SUCCESS: &str = "updatePAStateSuccess";
pub const UPDATE_NOTIFICATIONS_SUCCESS: &str = "updateProjectNotificationsConfigurationSuccess";
pub const UPDATE_DEFECTS_SUCCESS: &str = "updateDefectsSuccess";
pub const UPDATE_DEFECTS_FAILED: &str = "updateDefectsFailed";
pub const SUGGESTED_CHOICE_SUCCESS: &str = "suggestedChoiceSuccess";
pub const SUGGESTED_CHOICE_FAILED: &str = "suggestedChoiceFailed";

/// English fallback text for a catalog key.
pub fn default_text(key: &str) -> Option<&'static str> {
    let text = match key {
        UPDATE_DEFECT_TYPE_SUCCESS => "Defect types have been updated successfully",
        ADD_DEFECT_TYPE_SUCCESS => "Defect type has been added successfully",
        DELETE_DEFECT_TYPE_SUCCESS => "Defect type has been deleted successfully",
        ADD_PATTERN_SUCCESS => "Pattern rule has been created successfully",
        UPDATE_PATTERN_SUCCESS => "Pattern rule has been updated successfully",
        DELETE_PATTERN_SUCCESS => "Pattern rule has been deleted successfully",
        UPDATE_PA_STATE_SUCCESS => "Pattern-analysis settings have been updated successfully",
        UPDATE_NOTIFICATIONS_SUCCESS => "Notification settings have been updated successfully",
        UPDATE_DEFECTS_SUCCESS => "Defects have been updated",
        UPDATE_DEFECTS_FAILED => "Defects update failed",
        SUGGESTED_CHOICE_SUCCESS => "Suggested choice has been saved",
        SUGGESTED_CHOICE_FAILED => "Suggested choice could not be saved",
        _ => return None,
    };
    Some(text)
}
