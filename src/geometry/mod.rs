pub mod graph;
pub mod polygon;
pub mod room_box;
pub mod segment;

pub use graph::AdjacencyGraph;
pub use polygon::{Boundary, Polygon};
pub use room_box::{RoomBox, RoomType, UnknownRoomType};
pub use segment::{merge_segments, shared_segment, shared_segments, Segment};
