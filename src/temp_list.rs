use crate::document::NodeId;

/// Scratch space for the ids of freed nodes, reused across removals.
#[derive(Debug, Default)]
pub struct TempNodeList(Vec<NodeId>);
impl TempNodeList {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	pub fn temp(&mut self) -> &mut Vec<NodeId> {
		// Cleared before each borrow, so no ids can leak between removals even after a panic.
		self.0.clear();
		&mut self.0
	}

	/// Retrieves the list's capacity without clearing it first.
	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}
}
