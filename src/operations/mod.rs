pub mod matching;
pub mod openings;
pub mod partition;
pub mod signature;

pub use matching::{AlignedRoom, Alignment, MatchRooms};
pub use openings::{Opening, OpeningKind, Openings, PlaceOpenings};
pub use partition::{PartitionBoundary, RoomPartition};
pub use signature::TurningFunction;
