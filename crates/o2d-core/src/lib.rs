pub mod clock;
pub mod error;
pub mod io;
pub mod paths;
pub mod scenario;
pub mod sequencer;
pub mod summary;
pub mod types;

pub use error::{Result, SimError};
pub use scenario::Scenario;
pub use sequencer::Sequencer;
