use crate::{description::Description, document::NodeId, Boundary, Reconciler};
use tracing::{error, instrument, trace};

impl<D: Description> Reconciler<D> {
	/// Makes the sub-regions between `start` and `end` represent `descriptions`, by position.
	///
	/// Existing sub-regions are reused in order and patched where their shape allows it.
	/// Excess trailing sub-regions are removed, missing ones are appended directly before `end`.
	/// There is no key matching: Reordering `descriptions` updates each position in place.
	#[instrument(skip(self, descriptions), fields(len = descriptions.len()))]
	pub fn render_sequence(&mut self, start: NodeId, end: NodeId, descriptions: Vec<D>) {
		if descriptions.is_empty() {
			trace!("Clearing sequence.");
			return self.clear_region(start, end);
		}

		let mut sequence = match self.take_sequence(start) {
			Some(sequence) if !sequence.is_empty() => sequence,
			sequence => {
				// The region may still hold a single render.
				self.forget_cache(start);
				self.clear_nodes(start, end);

				let mut sequence = sequence.unwrap_or_default();
				trace!("Building {} sub-region(s).", descriptions.len());
				self.extend_sequence(&mut sequence, end, descriptions);
				return self.store_sequence(start, sequence);
			}
		};

		let len = descriptions.len();
		if len < sequence.len() {
			let tail = Boundary {
				start: sequence[len].start,
				end: sequence[sequence.len() - 1].end,
			};
			trace!("Removing {} trailing sub-region(s).", sequence.len() - len);

			self.clear_nodes(tail.start, tail.end);
			for marker in [tail.start, tail.end] {
				if let Err(error) = self.remove(marker) {
					error!("Failed to remove sub-region marker {}: {}", marker, error);
				}
			}
			sequence.truncate(len);
		}

		let mut descriptions = descriptions.into_iter();
		let retained: Vec<D> = descriptions.by_ref().take(sequence.len()).collect();
		if !descriptions.as_slice().is_empty() {
			trace!("Appending {} sub-region(s).", descriptions.len());
			self.extend_sequence(&mut sequence, end, descriptions);
		}

		// Newly appended sub-regions were materialized just now and are skipped by `zip`.
		for (boundary, description) in sequence.iter().zip(retained) {
			self.render_region(boundary.start, boundary.end, description);
		}

		self.store_sequence(start, sequence);
	}

	/// Appends one new sub-region per description directly before `end`, rendering each as it is created.
	fn extend_sequence(&mut self, sequence: &mut Vec<Boundary>, end: NodeId, descriptions: impl IntoIterator<Item = D>) {
		for description in descriptions {
			let boundary = match self.insert_boundary_before(end) {
				Ok(boundary) => boundary,
				Err(error) => return error!("Failed to insert sub-region markers before {}: {}", end, error),
			};
			self.render_region(boundary.start, boundary.end, description);
			sequence.push(boundary);
		}
	}
}
