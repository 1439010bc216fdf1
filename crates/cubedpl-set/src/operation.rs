/// A set operation on sorted multisets.
///
/// Equal elements of both inputs are matched in pairs, in order: the union keeps the maximum of
/// both multiplicities, the intersection the minimum, the difference the excess of `A` and the
/// symmetric difference the excess of either input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperation {
    /// Elements of `A` or `B`.
    Union,
    /// Elements of `A` and `B`.
    Intersection,
    /// Elements of `A` not in `B`.
    Difference,
    /// Elements of only one of `A` and `B`.
    SymmetricDifference,
}

/// How the heads of both inputs compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The head of `A` comes first, or `B` is exhausted.
    ALess,
    /// The head of `B` comes first, or `A` is exhausted.
    BLess,
    /// The heads are equivalent.
    Equal,
}

/// Which input advanced at a merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MaskTag {
    /// Only `A` advanced.
    AOnly = 1,
    /// Only `B` advanced.
    BOnly = 2,
    /// Both inputs advanced.
    Both = 3,
}

impl From<Relation> for MaskTag {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::ALess => MaskTag::AOnly,
            Relation::BLess => MaskTag::BOnly,
            Relation::Equal => MaskTag::Both,
        }
    }
}

/// Decision of a merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Consume the head of `A`.
    pub advance_a: bool,
    /// Consume the head of `B`.
    pub advance_b: bool,
    /// Emit the consumed element, the head of `A` when both advance.
    pub emit: bool,
}

const fn step(advance_a: bool, advance_b: bool, emit: bool) -> Step {
    Step {
        advance_a,
        advance_b,
        emit,
    }
}

// Rows: union, intersection, difference, symmetric difference.
// Columns: A first, B first, equal.
const STEPS: [[Step; 3]; 4] = [
    [step(true, false, true), step(false, true, true), step(true, true, true)],
    [step(true, false, false), step(false, true, false), step(true, true, true)],
    [step(true, false, true), step(false, true, false), step(true, true, false)],
    [step(true, false, true), step(false, true, true), step(true, true, false)],
];

impl SetOperation {
    /// The decision of a merge step.
    pub fn step(&self, relation: Relation) -> Step {
        let row = match self {
            SetOperation::Union => 0,
            SetOperation::Intersection => 1,
            SetOperation::Difference => 2,
            SetOperation::SymmetricDifference => 3,
        };
        let column = match relation {
            Relation::ALess => 0,
            Relation::BLess => 1,
            Relation::Equal => 2,
        };

        STEPS[row][column]
    }

    /// Maximum number of outputs of the operation.
    pub fn max_output_len(&self, a_len: usize, b_len: usize) -> usize {
        match self {
            SetOperation::Union | SetOperation::SymmetricDifference => a_len + b_len,
            SetOperation::Intersection => a_len.min(b_len),
            SetOperation::Difference => a_len,
        }
    }
}
