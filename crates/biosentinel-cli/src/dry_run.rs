use crate::output::OutputWriter;
use serde::Serialize;

/// A step `predict`, `extract` or `prepare` would take
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub action_type: ActionType,
    pub description: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    FetchLayer,
    ReuseLayer,
    Predict,
    SubmitChunk,
    SkipChunk,
    WriteFile,
}

impl ActionType {
    fn label(self) -> &'static str {
        match self {
            ActionType::FetchLayer => "fetch",
            ActionType::ReuseLayer => "cached",
            ActionType::Predict => "predict",
            ActionType::SubmitChunk => "submit",
            ActionType::SkipChunk => "skip",
            ActionType::WriteFile => "write",
        }
    }

    /// Whether executing the action contacts the remote services
    pub fn is_remote(self) -> bool {
        matches!(self, ActionType::FetchLayer | ActionType::Predict | ActionType::SubmitChunk)
    }
}

impl PlannedAction {
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self { action_type, description: description.into(), details: Vec::new() }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

pub fn display_planned_actions(output: &OutputWriter, actions: &[PlannedAction]) -> anyhow::Result<()> {
    let remote_calls = actions.iter().filter(|a| a.action_type.is_remote()).count();

    if output.is_json() {
        return output.result(serde_json::json!({
            "dry_run": true,
            "remote_calls": remote_calls,
            "planned_actions": actions,
        }));
    }

    output.section("Planned Actions (Dry Run)");
    for (i, action) in actions.iter().enumerate() {
        output.info(format!("{:>3}. [{}] {}", i + 1, action.action_type.label(), action.description));
        for detail in &action.details {
            output.info(format!("       {}", detail));
        }
    }
    output.kv("Remote calls", remote_calls);
    output.info("Dry run: no remote calls were made and nothing was written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planned_action_collects_details() {
        let action = PlannedAction::new(ActionType::FetchLayer, "Fetch NDVI")
            .with_detail("Dataset: COPERNICUS/S2_SR_HARMONIZED")
            .with_detail("Scale: 1000 m");

        assert_eq!(action.description, "Fetch NDVI");
        assert_eq!(action.details.len(), 2);
    }

    #[test]
    fn test_only_fetch_predict_and_submit_are_remote() {
        assert!(ActionType::FetchLayer.is_remote());
        assert!(ActionType::SubmitChunk.is_remote());
        assert!(!ActionType::ReuseLayer.is_remote());
        assert!(!ActionType::SkipChunk.is_remote());
        assert!(!ActionType::WriteFile.is_remote());
    }

    #[test]
    fn test_action_type_serializes_snake_case() {
        let action = PlannedAction::new(ActionType::SkipChunk, "Skip amphibians_chunk_1");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"skip_chunk\""));
    }
}
