//! Output tree types.

mod node;

pub use node::{AlignKind, Node, NodeValue, Point, Position};
