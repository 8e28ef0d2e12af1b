//! Typed ID definitions for match entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Match entities.
pub struct Match;

/// Marker type for a team's participation in one match.
pub struct TeamInMatch;

/// Marker type for registered Player entities.
pub struct Player;

/// Marker type for GameEvent records.
pub struct GameEvent;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type MatchId = Id<Match>;

pub type TeamInMatchId = Id<TeamInMatch>;

pub type PlayerId = Id<Player>;

pub type GameEventId = Id<GameEvent>;
