use serde::Serialize;

use crate::{Action, PlantState, Status};

/// Result of an operator command. Rejections are ordinary values carrying a
/// message for the operator, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub applied: bool,
    pub message: String,
}

impl ActionOutcome {
    fn applied(message: String) -> Self {
        Self {
            applied: true,
            message,
        }
    }

    fn rejected(message: String) -> Self {
        Self {
            applied: false,
            message,
        }
    }
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Status × action transition table.
///
/// `None` means the action is not legal from `status`. Power-bearing modules
/// pass through a transient state that the tick engine resolves; the rest
/// switch immediately.
pub fn transition(status: Status, action: Action, power_bearing: bool) -> Option<Status> {
    match (action, status) {
        (Action::Stop, Status::Online | Status::Active) => Some(if power_bearing {
            Status::ShuttingDown
        } else {
            Status::Offline
        }),
        (Action::Start, Status::Offline | Status::Standby) => Some(if power_bearing {
            Status::StartingUp
        } else {
            Status::Active
        }),
        (
            Action::Stop,
            Status::Standby
            | Status::Offline
            | Status::Ready
            | Status::Operational
            | Status::ShuttingDown
            | Status::StartingUp,
        )
        | (
            Action::Start,
            Status::Online
            | Status::Active
            | Status::Ready
            | Status::Operational
            | Status::ShuttingDown
            | Status::StartingUp,
        ) => None,
    }
}

/// Apply `raw_action` to the module whose derived identifier is `identifier`.
pub fn apply_action(state: &mut PlantState, identifier: &str, raw_action: &str) -> ActionOutcome {
    let failed = |reason: String| {
        ActionOutcome::rejected(format!(
            "Action '{raw_action}' on '{identifier}' could not be completed: {reason}."
        ))
    };

    let Some(action) = Action::parse(raw_action) else {
        return failed("unknown action".to_string());
    };
    let Some(module) = state.registry.find_by_identifier_mut(identifier) else {
        return failed("no such module".to_string());
    };
    let Some(next) = transition(module.status, action, module.telemetry.is_power_bearing())
    else {
        return failed(format!("{} is {}", module.name, module.status));
    };

    tracing::debug!(
        module = %module.name,
        %action,
        from = %module.status,
        to = %next,
        "operator command applied"
    );
    module.status = next;
    ActionOutcome::applied(format!("{} is {}.", module.name, action.progressive()))
}
