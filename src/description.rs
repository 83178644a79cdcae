//! The interfaces a [`Reconciler`] consumes from template compilation and instantiation.

use crate::{
	document::{Document, NodeId},
	Reconciler,
};
use core::fmt::Debug;

/// A compiled description of desired content: a static shape plus an ordered list of dynamic values.
pub trait Description {
	type Value: PartialEq + Debug;

	/// The dynamic values, one per slot of the shape.
	fn values(&self) -> &[Self::Value];

	/// Whether `self` and `other` have the same static structure, regardless of their values.
	fn same_shape(&self, other: &Self) -> bool;
}

/// Applies one dynamic value to its location in the live tree.
///
/// Receives the [`Reconciler`] so that it can reach the [`Document`] and render nested regions.
/// Must be safe to call repeatedly with different values.
pub type Updater<D> = Box<dyn FnMut(&mut Reconciler<D>, &<D as Description>::Value)>;

/// Detached content created from a [`Description`], along with one [`Updater`] per dynamic slot.
///
/// None of the values have been applied yet.
pub struct Instance<D: Description> {
	/// Detached top-level nodes, in order.
	pub fragment: Vec<NodeId>,
	pub updaters: Vec<Updater<D>>,
}

pub trait Materializer<D: Description> {
	fn materialize(&self, document: &mut Document, description: &D) -> Instance<D>;
}
