use crate::common::PlayerRef;
use crate::domains::timeline::RosterPlayer;

/// What the operator has picked so far. Replaced wholesale on every
/// transition, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    FieldFirst(RosterPlayer),
    BenchFirst(PlayerRef),
}

/// Operator input at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    TapFieldPlayer(RosterPlayer),
    TapBenchPlayer(PlayerRef),
    RequestRemoval,
    TapEmptyPosition { position: String },
}
