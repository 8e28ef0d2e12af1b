use serde::{Deserialize, Serialize};

use crate::common::{AggregateRef, GameEventId, PlayerRef};
use crate::domains::game_events::GameTime;

/// One substitution inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRequest {
    /// Presence event of the outgoing player.
    pub out_event_id: GameEventId,
    pub incoming: PlayerRef,
    /// When the outgoing player actually left; defaults to the batch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<GameTime>,
}

/// One side of a position swap.
///
/// A player who is only on the field because of a substitution in the same
/// batch has no presence event yet, so it is addressed by the index of that
/// substitution instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwapSide {
    EventId(GameEventId),
    SubstitutionIndex {
        #[serde(rename = "substitutionIndex")]
        substitution_index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub first: SwapSide,
    pub second: SwapSide,
}

/// All-or-nothing lineup change for one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBatchRequest {
    pub aggregate: AggregateRef,
    pub period: String,
    pub period_second: u32,
    pub substitutions: Vec<SubstitutionRequest>,
    pub swaps: Vec<SwapRequest>,
}

impl CommitBatchRequest {
    pub fn at(&self) -> GameTime {
        GameTime::new(self.period.clone(), self.period_second)
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty() && self.swaps.is_empty()
    }
}

/// Ids created by a committed batch, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceipt {
    /// Presence event of each incoming substitute.
    pub substitution_event_ids: Vec<GameEventId>,
    pub swap_event_ids: Vec<GameEventId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalRequest {
    pub aggregate: AggregateRef,
    pub at: GameTime,
    pub out_event_id: GameEventId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BringOnRequest {
    pub aggregate: AggregateRef,
    pub at: GameTime,
    pub player: PlayerRef,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Batch,
    Removal,
    BringOn,
}

/// What listeners on other devices are told after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub kind: CommitKind,
    pub at: GameTime,
    pub event_ids: Vec<GameEventId>,
}

impl CommitSummary {
    pub fn batch(at: GameTime, receipt: &BatchReceipt) -> Self {
        let mut event_ids = receipt.substitution_event_ids.clone();
        event_ids.extend_from_slice(&receipt.swap_event_ids);
        Self {
            kind: CommitKind::Batch,
            at,
            event_ids,
        }
    }

    pub fn single(kind: CommitKind, at: GameTime, event_id: GameEventId) -> Self {
        Self {
            kind,
            at,
            event_ids: vec![event_id],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_side_wire_format() {
        let id = GameEventId::new();
        let swap = SwapRequest {
            first: SwapSide::EventId(id),
            second: SwapSide::SubstitutionIndex {
                substitution_index: 1,
            },
        };

        let json = serde_json::to_value(swap).unwrap();
        assert_eq!(json["first"], serde_json::json!(id.to_string()));
        assert_eq!(json["second"], serde_json::json!({"substitutionIndex": 1}));

        let parsed: SwapRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, swap);
    }
}
