pub mod operation;
pub mod selection;

pub use operation::{engaged_players, PendingOperation};
pub use selection::{Selection, SelectionAction};
