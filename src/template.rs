//! Structural templates: A minimal [`Description`] and [`Materializer`] implementation.
//!
//! A [`Shape`] is the static part of a template. Its dynamic slots are either attribute values or child regions,
//! numbered in document order (an element's attributes before its children).
//! A [`Template`] pairs a shared [`Shape`] with one [`Value`] per slot.
//!
//! Child slots are materialized as marker pairs, so their content is reconciled recursively:
//! A [`Value::Template`] is [rendered as a region](`Reconciler::render_region`)
//! and a [`Value::Sequence`] is [rendered as a sequence](`Reconciler::render_sequence`).

use crate::{
	description::{Description, Instance, Materializer, Updater},
	document::{Document, NodeId, NodeKind},
	Boundary, Reconciler,
};
use std::rc::Rc;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeAttribute {
	Static { name: String, value: String },
	Dynamic { name: String },
}

impl ShapeAttribute {
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Static { name: name.into(), value: value.into() }
	}

	pub fn dynamic(name: impl Into<String>) -> Self {
		Self::Dynamic { name: name.into() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeNode {
	Element { name: String, attributes: Vec<ShapeAttribute>, children: Vec<ShapeNode> },
	Text(String),
	/// A dynamic child region.
	Child,
}

impl ShapeNode {
	pub fn element(name: impl Into<String>, attributes: impl IntoIterator<Item = ShapeAttribute>, children: impl IntoIterator<Item = ShapeNode>) -> Self {
		Self::Element {
			name: name.into(),
			attributes: attributes.into_iter().collect(),
			children: children.into_iter().collect(),
		}
	}

	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	fn slot_count(&self) -> usize {
		match self {
			ShapeNode::Element { attributes, children, .. } => {
				attributes.iter().filter(|attribute| matches!(attribute, ShapeAttribute::Dynamic { .. })).count() + children.iter().map(ShapeNode::slot_count).sum::<usize>()
			}
			ShapeNode::Text(_) => 0,
			ShapeNode::Child => 1,
		}
	}
}

/// The static structure of a [`Template`].
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
	nodes: Vec<ShapeNode>,
	slot_count: usize,
}

impl Shape {
	#[must_use]
	pub fn new(nodes: impl IntoIterator<Item = ShapeNode>) -> Rc<Self> {
		let nodes: Vec<_> = nodes.into_iter().collect();
		let slot_count = nodes.iter().map(ShapeNode::slot_count).sum();
		Rc::new(Self { nodes, slot_count })
	}

	#[must_use]
	pub fn nodes(&self) -> &[ShapeNode] {
		&self.nodes
	}

	#[must_use]
	pub fn slot_count(&self) -> usize {
		self.slot_count
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	shape: Rc<Shape>,
	values: Vec<Value>,
}

impl Template {
	/// # Panics
	///
	/// With debug assertions, iff the number of `values` doesn't match `shape`'s slot count.
	pub fn new(shape: &Rc<Shape>, values: impl IntoIterator<Item = Value>) -> Self {
		let values: Vec<_> = values.into_iter().collect();
		debug_assert_eq!(values.len(), shape.slot_count(), "Value count doesn't match the shape's slot count");
		Self { shape: Rc::clone(shape), values }
	}

	#[must_use]
	pub fn shape(&self) -> &Rc<Shape> {
		&self.shape
	}
}

impl Description for Template {
	type Value = Value;

	fn values(&self) -> &[Value] {
		&self.values
	}

	fn same_shape(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.shape, &other.shape) || self.shape == other.shape
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	Text(String),
	Template(Template),
	Sequence(Vec<Template>),
}

impl Value {
	fn kind_name(&self) -> &'static str {
		match self {
			Value::Text(_) => "text",
			Value::Template(_) => "template",
			Value::Sequence(_) => "sequence",
		}
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<Template> for Value {
	fn from(template: Template) -> Self {
		Self::Template(template)
	}
}

impl From<Vec<Template>> for Value {
	fn from(templates: Vec<Template>) -> Self {
		Self::Sequence(templates)
	}
}

/// Instantiates [`Template`]s into a [`Document`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateMaterializer;

impl Materializer<Template> for TemplateMaterializer {
	fn materialize(&self, document: &mut Document, template: &Template) -> Instance<Template> {
		let mut instance = Instance {
			fragment: Vec::with_capacity(template.shape.nodes().len()),
			updaters: Vec::with_capacity(template.shape.slot_count()),
		};
		for node in template.shape.nodes() {
			build(document, node, &mut instance.updaters, &mut instance.fragment);
		}
		instance
	}
}

/// Creates the detached nodes for `node`, pushing them to `out` and the updaters of its slots to `updaters`.
fn build(document: &mut Document, node: &ShapeNode, updaters: &mut Vec<Updater<Template>>, out: &mut Vec<NodeId>) {
	match node {
		ShapeNode::Text(text) => out.push(document.create_text(text.as_str())),
		ShapeNode::Child => {
			let boundary = Boundary {
				start: document.create_marker(),
				end: document.create_marker(),
			};
			out.extend([boundary.start, boundary.end]);
			updaters.push(child_updater(boundary));
		}
		ShapeNode::Element { name, attributes, children } => {
			let element = document.create_element(name.as_str());
			for attribute in attributes {
				match attribute {
					ShapeAttribute::Static { name, value } => {
						if let Err(error) = document.set_attribute(element, name, value.as_str()) {
							error!("Failed to set static attribute `{}`: {}", name, error);
						}
					}
					ShapeAttribute::Dynamic { name } => updaters.push(attribute_updater(element, name.clone())),
				}
			}

			let mut content = Vec::with_capacity(children.len());
			for child in children {
				build(document, child, updaters, &mut content);
			}
			for child in content {
				if let Err(error) = document.append_child(element, child) {
					error!("Failed to append child to <{}>: {}", name, error);
				}
			}
			out.push(element);
		}
	}
}

fn attribute_updater(element: NodeId, name: String) -> Updater<Template> {
	Box::new(move |reconciler: &mut Reconciler<Template>, value: &Value| {
		let document = reconciler.document_mut();
		let result = match value {
			Value::Text(text) => document.set_attribute(element, &name, text.as_str()),
			other => {
				warn!("Attribute `{}` can only hold text, but got a {} value. Removing it.", name, other.kind_name());
				document.remove_attribute(element, &name).map(|_| ())
			}
		};
		if let Err(error) = result {
			error!("Failed to update attribute `{}`: {}", name, error);
		}
	})
}

fn child_updater(Boundary { start, end }: Boundary) -> Updater<Template> {
	Box::new(move |reconciler: &mut Reconciler<Template>, value: &Value| match value {
		Value::Text(text) => render_text(reconciler, start, end, text),
		Value::Template(template) => reconciler.render_region(start, end, template.clone()),
		Value::Sequence(templates) => reconciler.render_sequence(start, end, templates.clone()),
	})
}

/// Makes a single text node the content of the region, reusing the current one if that's all there is.
fn render_text(reconciler: &mut Reconciler<Template>, start: NodeId, end: NodeId, text: &str) {
	let document = reconciler.document();
	let lone_text = document
		.next_sibling(start)
		.filter(|&current| document.next_sibling(current) == Some(end) && matches!(document.kind(current), Some(NodeKind::Text(_))));

	match lone_text {
		Some(current) if !reconciler.is_cached(start) => {
			if let Err(error) = reconciler.document_mut().set_text(current, text) {
				error!("Failed to update text: {}", error);
			}
		}
		_ => {
			reconciler.clear_region(start, end);
			let node = reconciler.document_mut().create_text(text);
			if let Err(error) = reconciler.document_mut().insert_before(end, node) {
				error!("Failed to insert text before {}: {}", end, error);
				let _ = reconciler.remove(node);
			}
		}
	}
}
