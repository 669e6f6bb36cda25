use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use brandforge_refinement::RefinementStrategy;

use crate::types::Stage;

/// What the router is reacting to: plain stage completion, a refinement
/// strategy, or the forced end when the retry budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Advance,
    Approve,
    Enhance,
    Regenerate,
    Reject,
    End,
}

impl From<RefinementStrategy> for Decision {
    fn from(strategy: RefinementStrategy) -> Self {
        match strategy {
            RefinementStrategy::Approve => Decision::Approve,
            RefinementStrategy::Enhance => Decision::Enhance,
            RefinementStrategy::Regenerate => Decision::Regenerate,
            RefinementStrategy::Reject => Decision::Reject,
        }
    }
}

/// Where a transition lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stage(Stage),
    End,
}

/// A single valid transition in the workflow graph.
#[derive(Debug, Clone, Copy)]
pub struct StageTransition {
    pub from: Stage,
    pub decision: Decision,
    pub to: Next,
}

/// Explicit transition table for the workflow loop. The cyclic control
/// flow lives entirely in this table; the engine only looks transitions
/// up, it never invents them.
#[derive(Debug, Clone)]
pub struct StageMachine {
    transitions: Vec<StageTransition>,
}

impl StageMachine {
    /// Build the table and validate it exhaustively: every stage has a
    /// route out, and every refinement decision is covered.
    pub fn new() -> Self {
        let transitions = vec![
            StageTransition {
                from: Stage::BrandProfile,
                decision: Decision::Advance,
                to: Next::Stage(Stage::Generate),
            },
            StageTransition {
                from: Stage::Generate,
                decision: Decision::Advance,
                to: Next::Stage(Stage::Critique),
            },
            StageTransition {
                from: Stage::Critique,
                decision: Decision::Advance,
                to: Next::Stage(Stage::Refine),
            },
            StageTransition {
                from: Stage::Refine,
                decision: Decision::Approve,
                to: Next::End,
            },
            StageTransition {
                from: Stage::Refine,
                decision: Decision::Reject,
                to: Next::End,
            },
            StageTransition {
                from: Stage::Refine,
                decision: Decision::Regenerate,
                to: Next::Stage(Stage::Generate),
            },
            StageTransition {
                from: Stage::Refine,
                decision: Decision::Enhance,
                to: Next::Stage(Stage::Critique),
            },
            StageTransition {
                from: Stage::Refine,
                decision: Decision::End,
                to: Next::End,
            },
        ];

        let machine = Self { transitions };
        machine.validate();
        machine
    }

    /// Construction-time exhaustiveness check. A gap here is a
    /// programming error, not a runtime condition.
    fn validate(&self) {
        for stage in [Stage::BrandProfile, Stage::Generate, Stage::Critique] {
            assert!(
                self.lookup(stage, Decision::Advance).is_some(),
                "stage {stage} has no advance transition"
            );
        }
        for decision in [
            Decision::Approve,
            Decision::Reject,
            Decision::Regenerate,
            Decision::Enhance,
            Decision::End,
        ] {
            assert!(
                self.lookup(Stage::Refine, decision).is_some(),
                "refine stage does not route decision {decision:?}"
            );
        }
    }

    fn lookup(&self, from: Stage, decision: Decision) -> Option<Next> {
        self.transitions
            .iter()
            .find(|t| t.from == from && t.decision == decision)
            .map(|t| t.to)
    }

    /// Returns `true` if the given transition is allowed.
    pub fn can_transition(&self, from: Stage, decision: Decision) -> bool {
        self.lookup(from, decision).is_some()
    }

    /// Resolve the next hop for `(from, decision)`. Returns an error
    /// for a pair outside the table.
    pub fn route(&self, from: Stage, decision: Decision) -> Result<Next> {
        self.lookup(from, decision)
            .ok_or_else(|| anyhow!("No transition from {from} on decision {decision:?}"))
    }
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new()
    }
}
