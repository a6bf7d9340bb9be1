//! Cross-model field synchronization.
//!
//! Several models ask for the same fact under their own field (the current
//! stock price, EPS, net cash, ...). Editing one copy pushes the value into
//! every other copy in the same group, one hop, no cascading.

use serde::Serialize;
use tracing::trace;

use crate::input::{fields, InputState};
use crate::types::ModelId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Gate on a group member, evaluated against the state after the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// The given toggle of the given model must have this value.
    ToggleIs {
        model: ModelId,
        field: &'static str,
        value: bool,
    },
}

impl Condition {
    pub fn holds(&self, state: &InputState) -> bool {
        match self {
            Condition::ToggleIs {
                model,
                field,
                value,
            } => state.record(*model).toggle(field) == *value,
        }
    }
}

/// One model's copy of a shared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub model: ModelId,
    pub field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl GroupMember {
    pub fn is(&self, model: ModelId, field: &str) -> bool {
        self.model == model && self.field == field
    }

    /// Members without a condition always accept.
    pub fn accepts(&self, state: &InputState) -> bool {
        self.condition.map_or(true, |c| c.holds(state))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SharedFieldGroup {
    pub name: &'static str,
    pub members: &'static [GroupMember],
}

impl SharedFieldGroup {
    pub fn contains(&self, model: ModelId, field: &str) -> bool {
        self.members.iter().any(|m| m.is(model, field))
    }
}

/// One write performed by propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagatedEdit {
    pub group: &'static str,
    pub model: ModelId,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMember {
    pub group: &'static str,
    pub model: ModelId,
    pub field: &'static str,
}

/// What a single synchronize call did besides the edit itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub applied: Vec<PropagatedEdit>,
    /// Members whose condition was false.
    pub skipped: Vec<SkippedMember>,
}

// ---------------------------------------------------------------------------
// Group table
// ---------------------------------------------------------------------------

const fn member(model: ModelId, field: &'static str) -> GroupMember {
    GroupMember {
        model,
        field,
        condition: None,
    }
}

const fn member_when(
    model: ModelId,
    field: &'static str,
    toggle: &'static str,
    value: bool,
) -> GroupMember {
    GroupMember {
        model,
        field,
        condition: Some(Condition::ToggleIs {
            model,
            field: toggle,
            value,
        }),
    }
}

pub static SHARED_FIELD_GROUPS: &[SharedFieldGroup] = &[
    SharedFieldGroup {
        name: "current_price",
        members: &[
            member(ModelId::Dcf, fields::CURRENT_PRICE),
            member(ModelId::PriceToFcf, fields::CURRENT_PRICE),
            member(ModelId::RuleOne, fields::CURRENT_PRICE),
            member(ModelId::PeterLynch, fields::CURRENT_PRICE),
            member(ModelId::BenGraham, fields::CURRENT_PRICE),
        ],
    },
    SharedFieldGroup {
        name: "eps",
        members: &[
            member(ModelId::PeterLynch, fields::EPS),
            member(ModelId::BenGraham, fields::EPS),
            member(ModelId::RuleOne, fields::EPS),
        ],
    },
    SharedFieldGroup {
        name: "eps_growth_rate",
        members: &[
            member(ModelId::PeterLynch, fields::EPS_GROWTH_RATE),
            member(ModelId::BenGraham, fields::EPS_GROWTH_RATE),
            member(ModelId::RuleOne, fields::EPS_GROWTH_RATE),
        ],
    },
    SharedFieldGroup {
        name: "shares_outstanding",
        members: &[
            member(ModelId::Dcf, fields::SHARES_OUTSTANDING),
            member(ModelId::PriceToFcf, fields::SHARES_OUTSTANDING),
        ],
    },
    SharedFieldGroup {
        name: "net_cash",
        members: &[
            member(ModelId::Dcf, fields::NET_CASH),
            member(ModelId::MarginOfSafety, fields::NET_CASH),
        ],
    },
    SharedFieldGroup {
        name: "free_cash_flow",
        members: &[
            member(ModelId::PriceToFcf, fields::FCF),
            member(ModelId::MarginOfSafety, fields::FCF),
            // Only when the DCF runs on free cash flow
            member_when(ModelId::Dcf, fields::CASH_FLOW, fields::USE_FCF, true),
        ],
    },
    SharedFieldGroup {
        name: "market_cap",
        members: &[
            member(ModelId::TenCap, fields::MARKET_CAP),
            member(ModelId::MarginOfSafety, fields::MARKET_CAP),
        ],
    },
    SharedFieldGroup {
        name: "capital_expenditure",
        members: &[
            member(ModelId::MarginOfSafety, fields::CAPEX),
            // Total capex only feeds Ten Cap in the indirect mode
            member_when(
                ModelId::TenCap,
                fields::TOTAL_CAPEX,
                fields::USE_DIRECT_MAINT_CAPEX,
                false,
            ),
        ],
    },
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Every group the field belongs to.
pub fn groups_for(model: ModelId, field: &str) -> Vec<&'static SharedFieldGroup> {
    SHARED_FIELD_GROUPS
        .iter()
        .filter(|g| g.contains(model, field))
        .collect()
}

/// Apply one edit and propagate it.
pub fn synchronize(model: ModelId, field: &str, value: &str, state: InputState) -> InputState {
    synchronize_with_report(model, field, value, state).0
}

/// As [`synchronize`], also returning what was propagated.
///
/// The edited member's own condition is never consulted. Conditions of the
/// other members are read from the state after the edit, so a toggle edit
/// that happens to share a group sees its own new value.
pub fn synchronize_with_report(
    model: ModelId,
    field: &str,
    value: &str,
    mut state: InputState,
) -> (InputState, SyncReport) {
    state.set(model, field, value);
    let mut report = SyncReport::default();

    for group in groups_for(model, field) {
        // Decide every target before writing any of them
        let targets: Vec<&GroupMember> = group
            .members
            .iter()
            .filter(|m| !m.is(model, field))
            .collect();
        let (accepted, rejected): (Vec<&GroupMember>, Vec<&GroupMember>) =
            targets.into_iter().partition(|m| m.accepts(&state));

        for target in accepted {
            state.set(target.model, target.field, value);
            trace!(
                group = group.name,
                source = %model,
                target = %target.model,
                field = target.field,
                "propagated shared field"
            );
            report.applied.push(PropagatedEdit {
                group: group.name,
                model: target.model,
                field: target.field,
            });
        }
        for target in rejected {
            trace!(
                group = group.name,
                target = %target.model,
                field = target.field,
                "skipped shared field, condition false"
            );
            report.skipped.push(SkippedMember {
                group: group.name,
                model: target.model,
                field: target.field,
            });
        }
    }

    (state, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_groups_for_current_price() {
        let groups = groups_for(ModelId::Dcf, fields::CURRENT_PRICE);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "current_price");
        assert!(groups_for(ModelId::TenCap, fields::CURRENT_PRICE).is_empty());
    }

    #[test]
    fn test_every_member_field_is_declared() {
        for group in SHARED_FIELD_GROUPS {
            for m in group.members {
                assert!(
                    crate::input::field_spec(m.model, m.field).is_some(),
                    "{}.{} in group {} is not a declared field",
                    m.model,
                    m.field,
                    group.name
                );
            }
        }
    }

    #[test]
    fn test_propagates_to_other_members() {
        let (state, report) = synchronize_with_report(
            ModelId::BenGraham,
            fields::EPS,
            "4.2",
            InputState::new(),
        );
        assert_eq!(state.record(ModelId::PeterLynch).text(fields::EPS), "4.2");
        assert_eq!(state.record(ModelId::RuleOne).text(fields::EPS), "4.2");
        assert_eq!(report.applied.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_field_outside_groups_only_sets_itself() {
        let before = InputState::new();
        let (state, report) =
            synchronize_with_report(ModelId::Dcf, fields::DISCOUNT_RATE, "9", before.clone());
        assert!(report.applied.is_empty());
        let mut expected = before;
        expected.set(ModelId::Dcf, fields::DISCOUNT_RATE, "9");
        assert_eq!(state, expected);
    }

    #[test]
    fn test_condition_blocks_dcf_cash_flow() {
        let mut state = InputState::new();
        state.set(ModelId::Dcf, fields::USE_FCF, "false");
        state.set(ModelId::Dcf, fields::CASH_FLOW, "77");
        let (state, report) =
            synchronize_with_report(ModelId::PriceToFcf, fields::FCF, "500", state);
        assert_eq!(state.record(ModelId::Dcf).text(fields::CASH_FLOW), "77");
        assert_eq!(state.record(ModelId::MarginOfSafety).text(fields::FCF), "500");
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_edited_member_condition_ignored() {
        let mut state = InputState::new();
        state.set(ModelId::Dcf, fields::USE_FCF, "false");
        let state = synchronize(ModelId::Dcf, fields::CASH_FLOW, "900", state);
        assert_eq!(state.record(ModelId::PriceToFcf).text(fields::FCF), "900");
        assert_eq!(state.record(ModelId::MarginOfSafety).text(fields::FCF), "900");
    }
}
