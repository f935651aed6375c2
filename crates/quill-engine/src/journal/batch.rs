//! Batch boundaries.
//!
//! A batch is a maximal contiguous run of entries for which a predicate holds
//! between every pair of neighbors. Runs are never reordered: draw order is
//! submission order, which keeps overlapping blended geometry correct.

use crate::material;

use super::JournalEntry;

/// Splits `items` into maximal runs where `can_batch(prev, next)` holds and
/// calls `on_batch(start, run)` once per run, in order.
///
/// Single linear pass. The runs exactly cover `items`.
pub fn batch_and_call<'a, T, C, F>(items: &'a [T], mut can_batch: C, mut on_batch: F)
where
    C: FnMut(&T, &T) -> bool,
    F: FnMut(usize, &'a [T]),
{
    if items.is_empty() {
        return;
    }
    let mut start = 0;
    for i in 1..items.len() {
        if !can_batch(&items[i - 1], &items[i]) {
            on_batch(start, &items[start..i]);
            start = i;
        }
    }
    on_batch(start, &items[start..]);
}

/// Same vertex layout. Zero, one and two layers share the padded layout.
#[inline]
pub fn same_stride(a: &JournalEntry, b: &JournalEntry) -> bool {
    a.n_layers == b.n_layers || (a.n_layers <= 2 && b.n_layers <= 2)
}

/// Same number of texture coordinate bindings.
#[inline]
pub fn same_layer_count(a: &JournalEntry, b: &JournalEntry) -> bool {
    a.n_layers == b.n_layers
}

/// One material flush can serve both entries.
#[inline]
pub fn same_material_state(a: &JournalEntry, b: &JournalEntry) -> bool {
    a.fallback_layers == b.fallback_layers
        && a.disable_layers == b.disable_layers
        && a.layer0_override == b.layer0_override
        && material::same_batch(&a.material, &b.material)
}

/// Bit-identical modelview snapshots (or none on either side).
#[inline]
pub fn same_modelview(a: &JournalEntry, b: &JournalEntry) -> bool {
    match (&a.modelview, &b.modelview) {
        (Some(x), Some(y)) => x.bits_eq(y),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(items: &[u32], pred: impl Fn(&u32, &u32) -> bool) -> Vec<(usize, Vec<u32>)> {
        let mut out = Vec::new();
        batch_and_call(items, |a, b| pred(a, b), |start, run| out.push((start, run.to_vec())));
        out
    }

    #[test]
    fn empty_input_produces_no_batches() {
        assert!(runs(&[], |_, _| true).is_empty());
    }

    #[test]
    fn equal_neighbors_merge() {
        let r = runs(&[1, 1, 2, 2, 2, 1], |a, b| a == b);
        assert_eq!(r, vec![(0, vec![1, 1]), (2, vec![2, 2, 2]), (5, vec![1])]);
    }

    #[test]
    fn never_reorders_equal_but_separated_items() {
        let r = runs(&[1, 2, 1], |a, b| a == b);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn runs_cover_input_exactly() {
        let items: Vec<u32> = (0..97).map(|i| (i * 7919 % 13) / 4).collect();
        let r = runs(&items, |a, b| a == b);
        let mut next = 0;
        for (start, run) in &r {
            assert_eq!(*start, next);
            assert_eq!(run.as_slice(), &items[*start..*start + run.len()]);
            next += run.len();
        }
        assert_eq!(next, items.len());
    }

    #[test]
    fn all_different_gives_one_batch_each() {
        let r = runs(&[0, 1, 2, 3], |_, _| false);
        assert_eq!(r.len(), 4);
    }
}
