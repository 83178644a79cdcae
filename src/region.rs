use crate::{
	description::{Description, Instance, Materializer, Updater},
	document::{Document, NodeId, TreeError},
	temp_list::TempNodeList,
};
use core::fmt::{self, Debug};
use hashbrown::HashMap;
use tracing::{error, instrument, trace, trace_span, warn};

/// The default maximum nesting of [`Reconciler::render_region`] calls.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Two sibling markers delimiting a region. The region's content is everything strictly between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
	pub start: NodeId,
	pub end: NodeId,
}

/// The last [`Description`] rendered into a region and the [`Updater`]s of its live content.
struct Cache<D: Description> {
	description: D,
	updaters: Vec<Updater<D>>,
}

/// Region state, keyed by node.
///
/// Entries are dropped whenever the node they are keyed by is freed through the [`Reconciler`].
struct Tables<D: Description> {
	/// Target → top-level region.
	rendered: HashMap<NodeId, Boundary>,
	/// Start marker → last single render.
	caches: HashMap<NodeId, Cache<D>>,
	/// Start marker → sub-regions of the last sequence render.
	sequences: HashMap<NodeId, Vec<Boundary>>,
}

impl<D: Description> Tables<D> {
	fn forget(&mut self, freed: &[NodeId]) {
		for id in freed {
			self.rendered.remove(id);
			self.caches.remove(id);
			self.sequences.remove(id);
		}
	}
}

/// Owns a [`Document`] and keeps marker-delimited regions in it up to date with [`Description`]s.
///
/// Unchanged shapes are patched in place, calling only the [`Updater`]s of slots whose values changed.
/// Anything else is cleared and materialized again.
///
/// # Correct Use
///
/// Region markers must only be removed through the [`Reconciler`] (directly via [`Reconciler::remove`],
/// or indirectly by clearing an enclosing region).
/// A region must not be rendered again from within one of its own [`Updater`]s.
pub struct Reconciler<D: Description> {
	document: Document,
	materializer: Box<dyn Materializer<D>>,
	tables: Tables<D>,
	freed: TempNodeList,
	depth: usize,
	depth_limit: usize,
}

impl<D: Description> Debug for Reconciler<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("document", &self.document)
			.field("rendered", &self.tables.rendered)
			.field("cached_regions", &self.tables.caches.len())
			.field("sequences", &self.tables.sequences)
			.field("depth", &self.depth)
			.field("depth_limit", &self.depth_limit)
			.finish_non_exhaustive()
	}
}

impl<D: Description> Reconciler<D> {
	#[must_use]
	pub fn new(materializer: impl 'static + Materializer<D>) -> Self {
		Self::with_document(Document::new(), materializer)
	}

	#[must_use]
	pub fn with_document(document: Document, materializer: impl 'static + Materializer<D>) -> Self {
		Self {
			document,
			materializer: Box::new(materializer),
			tables: Tables {
				rendered: HashMap::new(),
				caches: HashMap::new(),
				sequences: HashMap::new(),
			},
			freed: TempNodeList::new(),
			depth: 0,
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	/// Limits how deeply [`Reconciler::render_region`] may nest through [`Updater`]s.
	///
	/// Regions beyond the limit are left as they are and an error is logged.
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Direct access to the [`Document`].
	///
	/// Don't use this to remove or move region markers. See [`Reconciler`#correct-use].
	pub fn document_mut(&mut self) -> &mut Document {
		&mut self.document
	}

	#[must_use]
	pub fn into_document(self) -> Document {
		self.document
	}

	/// The top-level region of `target`, if anything was [rendered](`Reconciler::render`) into it.
	#[must_use]
	pub fn boundary(&self, target: NodeId) -> Option<Boundary> {
		self.tables.rendered.get(&target).copied()
	}

	/// The sub-regions of the sequence last rendered between `start` and its end marker.
	#[must_use]
	pub fn sequence(&self, start: NodeId) -> Option<&[Boundary]> {
		self.tables.sequences.get(&start).map(Vec::as_slice)
	}

	/// Whether the region starting at `start` holds a patchable single render.
	#[must_use]
	pub fn is_cached(&self, start: NodeId) -> bool {
		self.tables.caches.contains_key(&start)
	}

	/// Renders `description` into `target`, appending a pair of region markers to it on first use.
	#[instrument(skip(self, description))]
	pub fn render(&mut self, target: NodeId, description: D) {
		let existing = self.tables.rendered.get(&target).copied();
		let boundary = match existing {
			Some(boundary) if self.document.contains(boundary.start) && self.document.contains(boundary.end) => boundary,
			_ => {
				if existing.is_some() {
					warn!("Region markers of {} were removed externally. Attaching new ones.", target);
				}
				let boundary = match self.attach_boundary(target) {
					Ok(boundary) => boundary,
					Err(error) => return error!("Failed to attach region markers to {}: {}", target, error),
				};
				trace!(start = %boundary.start, end = %boundary.end, "Attached region markers.");
				self.tables.rendered.insert(target, boundary);
				boundary
			}
		};
		self.render_region(boundary.start, boundary.end, description);
	}

	/// Makes the content strictly between `start` and `end` match `description`.
	#[instrument(skip(self, description))]
	pub fn render_region(&mut self, start: NodeId, end: NodeId, description: D) {
		if self.depth >= self.depth_limit {
			return error!("Depth limit ({}) reached. Leaving the region as-is.", self.depth_limit);
		}

		self.depth += 1;
		match self.tables.caches.remove(&start) {
			Some(cache) if cache.description.same_shape(&description) => self.patch(start, cache, description),
			_ => self.replace(start, end, description),
		}
		self.depth -= 1;
	}

	/// Fast path: Calls only the [`Updater`]s of changed slots.
	fn patch(&mut self, start: NodeId, mut cache: Cache<D>, description: D) {
		let span = trace_span!("Patching region");
		let _enter = span.enter();

		debug_assert_eq!(cache.updaters.len(), description.values().len(), "Slot count mismatch between descriptions of the same shape");

		let mut changed = 0_usize;
		for (slot, (updater, (previous, next))) in cache.updaters.iter_mut().zip(cache.description.values().iter().zip(description.values())).enumerate() {
			if previous != next {
				trace_slot(slot, next);
				updater(self, next);
				changed += 1;
			}
		}
		trace!("{} of {} slot(s) changed.", changed, cache.updaters.len());

		cache.description = description;
		self.store_cache(start, cache);
	}

	/// Slow path: Clears the region, then materializes `description` into it and applies all of its values.
	fn replace(&mut self, start: NodeId, end: NodeId, description: D) {
		let span = trace_span!("Replacing region");
		let _enter = span.enter();

		self.tables.sequences.remove(&start);
		self.clear_nodes(start, end);

		let Instance { fragment, mut updaters } = self.materializer.materialize(&mut self.document, &description);
		debug_assert_eq!(updaters.len(), description.values().len(), "Updater count doesn't match the description's slot count");
		trace!("Materialized {} node(s) with {} slot(s).", fragment.len(), updaters.len());

		if let Err(error) = self.document.insert_fragment_after(start, &fragment) {
			error!("Failed to insert materialized content after {}: {}", start, error);
			return self.discard(&fragment);
		}

		for (slot, (updater, value)) in updaters.iter_mut().zip(description.values()).enumerate() {
			trace_slot(slot, value);
			updater(self, value);
		}

		self.store_cache(start, Cache { description, updaters });
	}

	fn store_cache(&mut self, start: NodeId, cache: Cache<D>) {
		if self.document.contains(start) {
			self.tables.caches.insert(start, cache);
		} else {
			warn!("Start marker {} was removed while its region rendered. Dropping its state.", start);
		}
	}

	pub(crate) fn store_sequence(&mut self, start: NodeId, sequence: Vec<Boundary>) {
		if self.document.contains(start) {
			self.tables.sequences.insert(start, sequence);
		} else {
			warn!("Start marker {} was removed while its sequence rendered. Dropping its state.", start);
		}
	}

	pub(crate) fn take_sequence(&mut self, start: NodeId) -> Option<Vec<Boundary>> {
		self.tables.sequences.remove(&start)
	}

	pub(crate) fn forget_cache(&mut self, start: NodeId) {
		self.tables.caches.remove(&start);
	}

	/// Removes everything between `start` and `end` and drops the render state recorded for the region.
	#[instrument(skip(self))]
	pub fn clear_region(&mut self, start: NodeId, end: NodeId) {
		self.tables.caches.remove(&start);
		if let Some(sequence) = self.tables.sequences.get_mut(&start) {
			sequence.clear();
		}
		self.clear_nodes(start, end);
	}

	/// Removes all siblings strictly between `start` and `end`.
	pub(crate) fn clear_nodes(&mut self, start: NodeId, end: NodeId) {
		let freed = self.freed.temp();
		let mut current = self.document.next_sibling(start);
		while let Some(node) = current {
			if node == end {
				break;
			}
			if let Err(error) = self.document.remove(node, freed) {
				error!("Failed to remove {} from region {}..{}: {}", node, start, end, error);
				break;
			}
			current = self.document.next_sibling(start);
		}
		if current.is_none() {
			error!("End marker {} not found after start marker {}.", end, start);
		}

		let cleared = freed.len();
		self.tables.forget(freed);
		trace!("Cleared {} node(s). Scratch capacity: {}", cleared, self.freed.capacity());
	}

	/// Removes `node` and its descendants from the document, dropping any region state keyed by them.
	pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
		let freed = self.freed.temp();
		self.document.remove(node, freed)?;
		self.tables.forget(freed);
		Ok(())
	}

	fn discard(&mut self, nodes: &[NodeId]) {
		for &node in nodes {
			if let Err(error) = self.remove(node) {
				error!("Failed to discard {}: {}", node, error);
			}
		}
	}

	fn attach_boundary(&mut self, target: NodeId) -> Result<Boundary, TreeError> {
		let start = self.document.create_marker();
		let end = self.document.create_marker();
		match self.document.append_child(target, start).and_then(|()| self.document.append_child(target, end)) {
			Ok(()) => Ok(Boundary { start, end }),
			Err(error) => {
				self.discard(&[start, end]);
				Err(error)
			}
		}
	}

	/// Creates a new (empty) region directly before `reference`.
	pub(crate) fn insert_boundary_before(&mut self, reference: NodeId) -> Result<Boundary, TreeError> {
		let start = self.document.create_marker();
		let end = self.document.create_marker();
		match self.document.insert_before(reference, start).and_then(|()| self.document.insert_before(reference, end)) {
			Ok(()) => Ok(Boundary { start, end }),
			Err(error) => {
				self.discard(&[start, end]);
				Err(error)
			}
		}
	}
}

fn trace_slot(slot: usize, value: &impl Debug) {
	if cfg!(feature = "dangerous-logging") {
		trace!(slot, ?value, "Applying value.");
	} else {
		trace!(slot, "Applying value.");
	}
}
