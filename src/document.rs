//! A small arena node tree with the insertion, removal and sibling primitives that regions are built from.
//!
//! Nodes are addressed through [`NodeId`]s, which stay valid until the node is [removed](`Document::remove`).
//! Freed slots are reused, but with a new generation, so a stale [`NodeId`] never refers to a newer node.

use core::fmt::{self, Write as _};
use tracing::trace;

/// A stable handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: u32,
	generation: u32,
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}v{}", self.index, self.generation)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Element { name: String, attributes: Vec<(String, String)> },
	Text(String),
	Comment(String),
	/// A zero-content sentinel delimiting a region.
	Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
	#[error("node {0} is not (or no longer) part of the document")]
	Stale(NodeId),
	#[error("node {0} has no parent")]
	Orphan(NodeId),
	#[error("inserting node {node} into {parent} would make it its own ancestor")]
	Hierarchy { node: NodeId, parent: NodeId },
	#[error("node {0} is not an element")]
	NotAnElement(NodeId),
	#[error("node {0} holds no character data")]
	NotCharacterData(NodeId),
}

#[derive(Debug)]
struct Node {
	kind: NodeKind,
	parent: Option<NodeId>,
	previous_sibling: Option<NodeId>,
	next_sibling: Option<NodeId>,
	first_child: Option<NodeId>,
	last_child: Option<NodeId>,
}

#[derive(Debug)]
struct Slot {
	generation: u32,
	node: Option<Node>,
}

#[derive(Debug, Default)]
pub struct Document {
	slots: Vec<Slot>,
	vacant: Vec<u32>,
	live: usize,
	mutation_count: u64,
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn create(&mut self, kind: NodeKind) -> NodeId {
		let node = Node {
			kind,
			parent: None,
			previous_sibling: None,
			next_sibling: None,
			first_child: None,
			last_child: None,
		};
		self.live += 1;
		if let Some(index) = self.vacant.pop() {
			let slot = &mut self.slots[index as usize];
			slot.node = Some(node);
			NodeId { index, generation: slot.generation }
		} else {
			let index = u32::try_from(self.slots.len()).expect("region-dom: More than `u32::MAX` nodes in one document");
			self.slots.push(Slot { generation: 0, node: Some(node) });
			NodeId { index, generation: 0 }
		}
	}

	pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
		self.create(NodeKind::Element { name: name.into(), attributes: Vec::new() })
	}

	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.create(NodeKind::Text(text.into()))
	}

	pub fn create_comment(&mut self, comment: impl Into<String>) -> NodeId {
		self.create(NodeKind::Comment(comment.into()))
	}

	pub fn create_marker(&mut self) -> NodeId {
		self.create(NodeKind::Marker)
	}

	fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
		self.slots
			.get(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_ref())
			.ok_or(TreeError::Stale(id))
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_mut())
			.ok_or(TreeError::Stale(id))
	}

	/// Whether `id` refers to a node that hasn't been removed.
	#[must_use]
	pub fn contains(&self, id: NodeId) -> bool {
		self.node(id).is_ok()
	}

	/// The number of live nodes, attached or not.
	#[must_use]
	pub fn len(&self) -> usize {
		self.live
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.live == 0
	}

	/// Counts insertions, detachments, removals and content writes since creation.
	#[must_use]
	pub fn mutation_count(&self) -> u64 {
		self.mutation_count
	}

	#[must_use]
	pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
		self.node(id).ok().map(|node| &node.kind)
	}

	#[must_use]
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.parent)
	}

	#[must_use]
	pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.next_sibling)
	}

	#[must_use]
	pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.previous_sibling)
	}

	#[must_use]
	pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.first_child)
	}

	#[must_use]
	pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.last_child)
	}

	#[must_use]
	pub fn children(&self, id: NodeId) -> Children<'_> {
		Children { document: self, next: self.first_child(id) }
	}

	/// The data of a text or comment node.
	#[must_use]
	pub fn text(&self, id: NodeId) -> Option<&str> {
		match self.kind(id)? {
			NodeKind::Text(text) | NodeKind::Comment(text) => Some(text),
			NodeKind::Element { .. } | NodeKind::Marker => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		match self.kind(id)? {
			NodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
			_ => None,
		}
	}

	pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
		match &mut self.node_mut(id)?.kind {
			NodeKind::Text(data) | NodeKind::Comment(data) => *data = text.into(),
			NodeKind::Element { .. } | NodeKind::Marker => return Err(TreeError::NotCharacterData(id)),
		}
		self.mutation_count += 1;
		Ok(())
	}

	pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<(), TreeError> {
		let attributes = match &mut self.node_mut(id)?.kind {
			NodeKind::Element { attributes, .. } => attributes,
			_ => return Err(TreeError::NotAnElement(id)),
		};
		let value = value.into();
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => *existing = value,
			None => attributes.push((name.to_owned(), value)),
		}
		self.mutation_count += 1;
		Ok(())
	}

	/// Returns whether an attribute was removed.
	pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, TreeError> {
		let attributes = match &mut self.node_mut(id)?.kind {
			NodeKind::Element { attributes, .. } => attributes,
			_ => return Err(TreeError::NotAnElement(id)),
		};
		let len = attributes.len();
		attributes.retain(|(n, _)| n != name);
		let removed = attributes.len() != len;
		if removed {
			self.mutation_count += 1;
		}
		Ok(removed)
	}

	/// Unlinks `id` from its parent and siblings without freeing it.
	pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
		let node = self.node_mut(id)?;
		let (parent, previous, next) = match node.parent.take() {
			Some(parent) => (parent, node.previous_sibling.take(), node.next_sibling.take()),
			None => return Ok(()),
		};

		match previous {
			Some(previous) => self.node_mut(previous)?.next_sibling = next,
			None => self.node_mut(parent)?.first_child = next,
		}
		match next {
			Some(next) => self.node_mut(next)?.previous_sibling = previous,
			None => self.node_mut(parent)?.last_child = previous,
		}
		self.mutation_count += 1;
		Ok(())
	}

	fn check_insertion(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
		match self.node(parent)?.kind {
			NodeKind::Element { .. } => (),
			_ => return Err(TreeError::NotAnElement(parent)),
		}
		self.node(node)?;

		let mut ancestor = Some(parent);
		while let Some(current) = ancestor {
			if current == node {
				return Err(TreeError::Hierarchy { node, parent });
			}
			ancestor = self.parent(current);
		}
		Ok(())
	}

	/// Links the (already detached) `node` between two siblings under `parent`.
	fn link(&mut self, parent: NodeId, previous: Option<NodeId>, next: Option<NodeId>, node: NodeId) -> Result<(), TreeError> {
		{
			let node = self.node_mut(node)?;
			node.parent = Some(parent);
			node.previous_sibling = previous;
			node.next_sibling = next;
		}
		match previous {
			Some(previous) => self.node_mut(previous)?.next_sibling = Some(node),
			None => self.node_mut(parent)?.first_child = Some(node),
		}
		match next {
			Some(next) => self.node_mut(next)?.previous_sibling = Some(node),
			None => self.node_mut(parent)?.last_child = Some(node),
		}
		self.mutation_count += 1;
		Ok(())
	}

	pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
		self.check_insertion(parent, node)?;
		self.detach(node)?;
		let last_child = self.last_child(parent);
		self.link(parent, last_child, None, node)
	}

	pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), TreeError> {
		if reference == node {
			return Ok(());
		}
		let parent = self.node(reference)?.parent.ok_or(TreeError::Orphan(reference))?;
		self.check_insertion(parent, node)?;
		self.detach(node)?;
		let previous = self.previous_sibling(reference);
		self.link(parent, previous, Some(reference), node)
	}

	pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), TreeError> {
		if reference == node {
			return Ok(());
		}
		let parent = self.node(reference)?.parent.ok_or(TreeError::Orphan(reference))?;
		self.check_insertion(parent, node)?;
		self.detach(node)?;
		let next = self.next_sibling(reference);
		self.link(parent, Some(reference), next, node)
	}

	/// Inserts `fragment` in order directly after `reference`.
	pub fn insert_fragment_after(&mut self, reference: NodeId, fragment: &[NodeId]) -> Result<(), TreeError> {
		let mut anchor = reference;
		for &node in fragment {
			self.insert_after(anchor, node)?;
			anchor = node;
		}
		Ok(())
	}

	/// Detaches `id` and frees it along with all of its descendants.
	///
	/// Every freed [`NodeId`] is appended to `freed`, so that state attached to them elsewhere can be dropped.
	pub fn remove(&mut self, id: NodeId, freed: &mut Vec<NodeId>) -> Result<(), TreeError> {
		self.detach(id)?;

		let first_freed = freed.len();
		freed.push(id);
		let mut i = first_freed;
		while i < freed.len() {
			let current = freed[i];
			let mut child = self.first_child(current);
			while let Some(c) = child {
				freed.push(c);
				child = self.next_sibling(c);
			}
			i += 1;
		}

		for &current in &freed[first_freed..] {
			let slot = &mut self.slots[current.index as usize];
			slot.node = None;
			slot.generation = slot.generation.wrapping_add(1);
			self.vacant.push(current.index);
		}
		self.live -= freed.len() - first_freed;
		self.mutation_count += 1;
		trace!("Freed {} node(s).", freed.len() - first_freed);
		Ok(())
	}

	/// Serializes `id` including itself.
	#[must_use]
	pub fn outer_html(&self, id: NodeId) -> String {
		let mut html = String::new();
		self.write_html(&mut html, id).expect("Writing to a `String` is infallible.");
		html
	}

	/// Serializes the children of `id`.
	#[must_use]
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut html = String::new();
		for child in self.children(id) {
			self.write_html(&mut html, child).expect("Writing to a `String` is infallible.");
		}
		html
	}

	fn write_html(&self, w: &mut impl fmt::Write, id: NodeId) -> fmt::Result {
		match self.kind(id) {
			None => Ok(()),
			Some(NodeKind::Marker) => w.write_str("<!---->"),
			Some(NodeKind::Comment(comment)) => write!(w, "<!--{}-->", comment),
			Some(NodeKind::Text(text)) => write_escaped(w, text, false),
			Some(NodeKind::Element { name, attributes }) => {
				write!(w, "<{}", name)?;
				for (name, value) in attributes {
					write!(w, " {}=\"", name)?;
					write_escaped(w, value, true)?;
					w.write_char('"')?;
				}
				w.write_char('>')?;
				for child in self.children(id) {
					self.write_html(w, child)?;
				}
				write!(w, "</{}>", name)
			}
		}
	}
}

fn write_escaped(w: &mut impl fmt::Write, text: &str, attribute: bool) -> fmt::Result {
	for c in text.chars() {
		match c {
			'&' => w.write_str("&amp;")?,
			'<' => w.write_str("&lt;")?,
			'>' => w.write_str("&gt;")?,
			'"' if attribute => w.write_str("&quot;")?,
			c => w.write_char(c)?,
		}
	}
	Ok(())
}

pub struct Children<'a> {
	document: &'a Document,
	next: Option<NodeId>,
}

impl Iterator for Children<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = self.document.next_sibling(current);
		Some(current)
	}
}
