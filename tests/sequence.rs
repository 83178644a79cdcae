use harness_::{append_boundary, assert_contiguous, between, probe, probe_reconciler, Probe};
use region_dom::{Boundary, Reconciler};

fn setup() -> (Reconciler<Probe>, region_dom::document::NodeId, Boundary, std::rc::Rc<std::cell::RefCell<harness_::Log>>) {
	let (mut reconciler, body, log) = probe_reconciler();
	let boundary = append_boundary(&mut reconciler, body);
	(reconciler, body, boundary, log)
}

#[test]
fn fresh_sequence() {
	let (mut reconciler, body, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(1, &[2]), probe(0, &[3])]);

	let sequence = reconciler.sequence(boundary.start).unwrap().to_vec();
	assert_eq!(sequence.len(), 3);
	assert_contiguous(reconciler.document(), boundary, &sequence);
	assert_eq!(
		reconciler.document().inner_html(body),
		"<!----><!----><p0><i>1</i></p0><!----><!----><p1><i>2</i></p1><!----><!----><p0><i>3</i></p0><!----><!---->"
	);
	// Materialized and applied once each.
	assert_eq!(log.borrow().materialized, 3);
	assert_eq!(log.borrow().applied.len(), 3);
}

#[test]
fn shrink() {
	let (mut reconciler, body, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(0, &[2]), probe(0, &[3])]);
	let before = reconciler.sequence(boundary.start).unwrap().to_vec();
	let removed = between(reconciler.document(), before[2]);
	log.borrow_mut().applied.clear();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[10]), probe(0, &[20])]);

	let after = reconciler.sequence(boundary.start).unwrap().to_vec();
	assert_eq!(after, before[..2]);
	assert_contiguous(reconciler.document(), boundary, &after);
	assert_eq!(log.borrow().applied, [(0, 10), (0, 20)]);
	assert_eq!(log.borrow().materialized, 3);
	for node in removed.into_iter().chain([before[2].start, before[2].end]) {
		assert!(!reconciler.document().contains(node));
	}
	assert!(!reconciler.is_cached(before[2].start));
	assert_eq!(
		reconciler.document().inner_html(body),
		"<!----><!----><p0><i>10</i></p0><!----><!----><p0><i>20</i></p0><!----><!---->"
	);
}

#[test]
fn shrink_by_several() {
	let (mut reconciler, body, boundary, _) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, (0..5).map(|i| probe(0, &[i])).collect());
	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[0])]);

	let sequence = reconciler.sequence(boundary.start).unwrap().to_vec();
	assert_eq!(sequence.len(), 1);
	assert_contiguous(reconciler.document(), boundary, &sequence);
	assert_eq!(reconciler.document().inner_html(body), "<!----><!----><p0><i>0</i></p0><!----><!---->");
}

#[test]
fn grow() {
	let (mut reconciler, body, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1])]);
	let first = reconciler.sequence(boundary.start).unwrap()[0];
	let first_content = between(reconciler.document(), first);
	log.borrow_mut().applied.clear();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(1, &[2])]);

	let sequence = reconciler.sequence(boundary.start).unwrap().to_vec();
	assert_eq!(sequence.len(), 2);
	assert_eq!(sequence[0], first);
	assert_eq!(between(reconciler.document(), first), first_content);
	assert_eq!(reconciler.document().next_sibling(sequence[1].end), Some(boundary.end));
	assert_contiguous(reconciler.document(), boundary, &sequence);
	assert_eq!(log.borrow().applied, [(0, 2)]);
	assert_eq!(log.borrow().materialized, 2);
	assert_eq!(
		reconciler.document().inner_html(body),
		"<!----><!----><p0><i>1</i></p0><!----><!----><p1><i>2</i></p1><!----><!---->"
	);
}

#[test]
fn grow_patches_existing_after_appending() {
	let (mut reconciler, _, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1])]);
	log.borrow_mut().applied.clear();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[5]), probe(0, &[6]), probe(0, &[7])]);

	assert_eq!(log.borrow().applied, [(0, 6), (0, 7), (0, 5)]);
}

#[test]
fn empty_round_trip() {
	let (mut reconciler, body, boundary, _) = setup();
	let items = || vec![probe(0, &[1]), probe(1, &[2])];

	reconciler.render_sequence(boundary.start, boundary.end, items());
	let direct = reconciler.document().inner_html(body);

	reconciler.render_sequence(boundary.start, boundary.end, vec![]);
	assert_eq!(reconciler.document().inner_html(body), "<!----><!---->");
	assert_eq!(reconciler.sequence(boundary.start), Some(&[][..]));

	// Repeated empty renders are no-ops.
	let mutations = reconciler.document().mutation_count();
	reconciler.render_sequence(boundary.start, boundary.end, vec![]);
	assert_eq!(reconciler.document().mutation_count(), mutations);

	reconciler.render_sequence(boundary.start, boundary.end, items());
	assert_eq!(reconciler.document().inner_html(body), direct);
	let sequence = reconciler.sequence(boundary.start).unwrap().to_vec();
	assert_contiguous(reconciler.document(), boundary, &sequence);
}

#[test]
fn empty_first_render() {
	let (mut reconciler, body, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![]);

	assert_eq!(reconciler.sequence(boundary.start), None);
	assert_eq!(log.borrow().materialized, 0);
	assert_eq!(reconciler.document().inner_html(body), "<!----><!---->");
}

#[test]
fn reorder_is_positional() {
	let (mut reconciler, body, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(0, &[2]), probe(0, &[3])]);
	let before = reconciler.sequence(boundary.start).unwrap().to_vec();
	log.borrow_mut().applied.clear();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[3]), probe(0, &[2]), probe(0, &[1])]);

	assert_eq!(reconciler.sequence(boundary.start).unwrap(), &before[..]);
	assert_eq!(log.borrow().materialized, 3);
	assert_eq!(log.borrow().applied, [(0, 3), (0, 1)]);
	assert_eq!(
		reconciler.document().inner_html(body),
		"<!----><!----><p0><i>3</i></p0><!----><!----><p0><i>2</i></p0><!----><!----><p0><i>1</i></p0><!----><!---->"
	);
}

#[test]
fn item_shape_change_rebuilds_only_that_item() {
	let (mut reconciler, _, boundary, log) = setup();

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(0, &[2])]);
	let first = reconciler.sequence(boundary.start).unwrap()[0];
	let first_content = between(reconciler.document(), first);

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1]), probe(1, &[2])]);

	assert_eq!(log.borrow().materialized, 3);
	assert_eq!(between(reconciler.document(), first), first_content);
}

#[test]
fn boundary_containment_over_many_renders() {
	let (mut reconciler, _, boundary, _) = setup();

	for len in [3, 5, 0, 2, 2, 7, 1, 0, 0, 4] {
		let descriptions = (0..len).map(|i| probe((i % 2) as u32, &[i * len])).collect();
		reconciler.render_sequence(boundary.start, boundary.end, descriptions);

		let sequence = reconciler.sequence(boundary.start).map(<[Boundary]>::to_vec).unwrap_or_default();
		assert_eq!(sequence.len(), len as usize);
		assert_contiguous(reconciler.document(), boundary, &sequence);
		for (i, sub) in sequence.iter().enumerate() {
			let content = between(reconciler.document(), *sub);
			assert_eq!(content.len(), 1);
			let expected = format!("<p{}><i>{}</i></p{}>", i % 2, i as i32 * len, i % 2);
			assert_eq!(reconciler.document().outer_html(content[0]), expected);
		}
	}
}

#[test]
fn single_render_then_sequence_then_single_render() {
	let (mut reconciler, body, boundary, _) = setup();

	reconciler.render_region(boundary.start, boundary.end, probe(9, &[9]));
	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[1])]);
	assert!(!reconciler.is_cached(boundary.start));
	assert_eq!(reconciler.document().inner_html(body), "<!----><!----><p0><i>1</i></p0><!----><!---->");

	reconciler.render_region(boundary.start, boundary.end, probe(9, &[9]));
	assert_eq!(reconciler.sequence(boundary.start), None);
	assert_eq!(reconciler.document().inner_html(body), "<!----><p9><i>9</i></p9><!---->");

	reconciler.render_sequence(boundary.start, boundary.end, vec![probe(0, &[2])]);
	assert_eq!(reconciler.document().inner_html(body), "<!----><!----><p0><i>2</i></p0><!----><!---->");
}
