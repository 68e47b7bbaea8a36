//! Object graph and change tracking

pub mod difference;
pub mod system_state;

pub use difference::{StateChangeEvent, StateDifference};
pub use system_state::{Link, ObjectState, SystemState};
