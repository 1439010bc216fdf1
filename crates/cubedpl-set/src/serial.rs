use crate::{Comparator, MaskTag, Relation, SetOperation};

/// Result of [bounded_set_op].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetOutcome {
    /// Number of elements written to the output.
    pub count: usize,
    /// Elements of `A` consumed, the first unconsumed position.
    pub a_consumed: usize,
    /// Elements of `B` consumed, the first unconsumed position.
    pub b_consumed: usize,
    /// Merge steps performed, one mask entry each.
    pub steps: usize,
}

/// Serial set operation on sorted inputs, bounded by the capacity of its outputs.
///
/// Every merge step consumes the head of `A`, of `B`, or of both when they are equivalent, and
/// records which in the mask. Steps that emit nothing are still taken, so the inputs are consumed
/// to their end unless the output runs out first. The element that would have produced an output
/// that doesn't fit is never consumed, so the operation can resume from the returned positions.
///
/// The mask takes one entry per step. A partition needs at most `a.len() + b.len()` entries, and
/// the operation also stops once the mask is full, before consuming the element of the step
/// that has no entry left.
pub fn bounded_set_op<T: Copy, C: Comparator<T>>(
    a: &[T],
    b: &[T],
    output: &mut [T],
    mut mask: Option<&mut [MaskTag]>,
    comp: &C,
    op: SetOperation,
) -> SetOutcome {
    let mut outcome = SetOutcome::default();

    loop {
        let (i, j) = (outcome.a_consumed, outcome.b_consumed);
        if i >= a.len() && j >= b.len() {
            break;
        }

        let relation = match (a.get(i), b.get(j)) {
            (Some(_), None) => Relation::ALess,
            (None, Some(_)) => Relation::BLess,
            (Some(x), Some(y)) if comp.less(x, y) => Relation::ALess,
            (Some(x), Some(y)) if comp.less(y, x) => Relation::BLess,
            _ => Relation::Equal,
        };
        let step = op.step(relation);

        if step.emit && outcome.count == output.len() {
            break;
        }
        if let Some(mask) = mask.as_deref_mut() {
            match mask.get_mut(outcome.steps) {
                Some(tag) => *tag = relation.into(),
                None => break,
            }
        }

        if step.emit {
            output[outcome.count] = match relation {
                Relation::BLess => b[j],
                Relation::ALess | Relation::Equal => a[i],
            };
            outcome.count += 1;
        }
        outcome.a_consumed += step.advance_a as usize;
        outcome.b_consumed += step.advance_b as usize;
        outcome.steps += 1;
    }

    outcome
}

/// Serial set operation returning every output.
pub fn serial_set_op<T: Copy + Default, C: Comparator<T>>(
    a: &[T],
    b: &[T],
    comp: &C,
    op: SetOperation,
) -> Vec<T> {
    let mut output = vec![T::default(); op.max_output_len(a.len(), b.len())];
    let outcome = bounded_set_op(a, b, &mut output, None, comp, op);
    output.truncate(outcome.count);
    output
}

/// Stable serial merge into `output`, elements of `A` first on ties.
pub fn serial_merge<T: Copy, C: Comparator<T>>(a: &[T], b: &[T], output: &mut [T], comp: &C) {
    debug_assert_eq!(output.len(), a.len() + b.len());

    let (mut i, mut j) = (0, 0);
    for slot in output.iter_mut() {
        let take_a = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => !comp.less(y, x),
            (Some(_), None) => true,
            _ => false,
        };

        match take_a {
            true => {
                *slot = a[i];
                i += 1;
            }
            false => {
                *slot = b[j];
                j += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LessThan;
    use pretty_assertions::assert_eq;

    #[test]
    fn union_keeps_the_maximum_multiplicity() {
        let output = serial_set_op(&[1, 2, 2, 5], &[2, 3, 5, 5], &LessThan, SetOperation::Union);
        assert_eq!(output, vec![1, 2, 2, 3, 5, 5]);
    }

    #[test]
    fn intersection_keeps_the_minimum_multiplicity() {
        let output = serial_set_op(&[2, 2, 2, 3], &[2, 2], &LessThan, SetOperation::Intersection);
        assert_eq!(output, vec![2, 2]);
    }

    #[test]
    fn differences() {
        let a = [1, 2, 2, 4, 6];
        let b = [2, 3, 4, 4, 7];

        assert_eq!(
            serial_set_op(&a, &b, &LessThan, SetOperation::Difference),
            vec![1, 2, 6]
        );
        assert_eq!(
            serial_set_op(&a, &b, &LessThan, SetOperation::SymmetricDifference),
            vec![1, 2, 3, 4, 6, 7]
        );
    }

    #[test]
    fn stops_before_exceeding_the_capacity() {
        let a = [1, 3, 5];
        let b = [2, 4];
        let mut output = [0; 3];

        let outcome = bounded_set_op(&a, &b, &mut output, None, &LessThan, SetOperation::Union);

        assert_eq!(output, [1, 2, 3]);
        assert_eq!(
            outcome,
            SetOutcome {
                count: 3,
                a_consumed: 2,
                b_consumed: 1,
                steps: 3
            }
        );
    }

    #[test]
    fn non_emitting_steps_are_recorded() {
        let a = [1, 2, 4];
        let b = [2, 3];
        let mut output = [0; 1];
        let mut mask = [MaskTag::Both; 8];

        let outcome = bounded_set_op(
            &a,
            &b,
            &mut output,
            Some(&mut mask),
            &LessThan,
            SetOperation::Intersection,
        );

        assert_eq!(output, [2]);
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.steps, 4);
        assert_eq!(
            &mask[..4],
            &[MaskTag::AOnly, MaskTag::Both, MaskTag::BOnly, MaskTag::AOnly]
        );
        assert_eq!((outcome.a_consumed, outcome.b_consumed), (3, 2));
    }

    #[test]
    fn inputs_are_consumed_past_the_last_output() {
        let mut output = [0; 2];
        let mut mask = [MaskTag::Both; 6];

        let outcome = bounded_set_op(
            &[1, 5],
            &[2, 3, 6, 7],
            &mut output,
            Some(&mut mask),
            &LessThan,
            SetOperation::Difference,
        );

        assert_eq!(&output[..outcome.count], &[1, 5]);
        assert_eq!((outcome.a_consumed, outcome.b_consumed), (2, 4));
        assert_eq!(outcome.steps, 6);
        assert_eq!(
            mask,
            [
                MaskTag::AOnly,
                MaskTag::BOnly,
                MaskTag::BOnly,
                MaskTag::AOnly,
                MaskTag::BOnly,
                MaskTag::BOnly
            ]
        );
    }

    #[test]
    fn stops_when_the_mask_is_full() {
        let mut output = [0; 8];
        let mut mask = [MaskTag::Both; 2];

        let outcome = bounded_set_op(
            &[1, 2, 3],
            &[4],
            &mut output,
            Some(&mut mask),
            &LessThan,
            SetOperation::Union,
        );

        assert_eq!(outcome.steps, 2);
        assert_eq!(&output[..outcome.count], &[1, 2]);
    }

    #[test]
    fn resumes_from_the_returned_positions() {
        let a = [1, 2, 2, 3, 8, 9];
        let b = [2, 3, 3, 7, 9];
        let expected = serial_set_op(&a, &b, &LessThan, SetOperation::SymmetricDifference);

        let mut output = Vec::new();
        let (mut i, mut j) = (0, 0);
        loop {
            let mut chunk = [0; 2];
            let outcome = bounded_set_op(
                &a[i..],
                &b[j..],
                &mut chunk,
                None,
                &LessThan,
                SetOperation::SymmetricDifference,
            );
            output.extend_from_slice(&chunk[..outcome.count]);
            i += outcome.a_consumed;
            j += outcome.b_consumed;
            if outcome.count < chunk.len() {
                break;
            }
        }

        assert_eq!(output, expected);
    }

    #[test]
    fn merge_is_stable() {
        let a = [(1, 'a'), (3, 'a')];
        let b = [(1, 'b'), (2, 'b'), (3, 'b')];
        let mut output = [(0, ' '); 5];
        let by_key = crate::CompareFn::new(|x: &(i32, char), y: &(i32, char)| x.0 < y.0);

        serial_merge(&a, &b, &mut output, &by_key);

        assert_eq!(output, [(1, 'a'), (1, 'b'), (2, 'b'), (3, 'a'), (3, 'b')]);
    }
}
