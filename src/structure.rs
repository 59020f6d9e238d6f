use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies one immutable tensor value. Allocated monotonically by a
/// [`Session`](crate::session::Session) and never reused.
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display(fmt = "T{}", _0)]
#[serde(transparent)]
pub struct TensorId(pub usize);

/// Identifies one leg (dimension instance) of a tensor.
///
/// Before canonicalization a leg id also serves as a contraction subscript label.
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}", _0)]
#[serde(transparent)]
pub struct LegId(pub usize);

impl TensorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl LegId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Malformed operation or edit, detected when it is constructed.
///
/// The attempted edit has to be discarded, nothing was appended.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Contraction without input tensors")]
    EmptyContraction,
    #[error("Inconsistent number of tensors for contraction: {inputs} inputs but {subscripts} subscript lists")]
    InputSubscriptMismatch { inputs: usize, subscripts: usize },
    #[error("Tensor {tensor} has rank {rank} but {found} subscripts were given")]
    RankMismatch {
        tensor: TensorId,
        rank: usize,
        found: usize,
    },
    #[error("Output label {0} is shared by more than one input")]
    SharedOutputLabel(LegId),
    #[error("Output label {0} appears more than once in the output dimensions")]
    RepeatedOutputLabel(LegId),
    #[error("Invalid permutation array: entry {0} missing")]
    NotAPermutation(usize),
    #[error("Permutation of length {found} does not match rank {rank} of {tensor}")]
    PermutationLength {
        tensor: TensorId,
        rank: usize,
        found: usize,
    },
    #[error("Input tensor for QR splitting must have at least 2 dimensions, got {0}")]
    RankTooSmall(usize),
    #[error("Number of left dimensions for QR splitting must be in [1, {}], got {left}", .rank.saturating_sub(1))]
    LeftRankOutOfRange { left: usize, rank: usize },
    #[error("Tensor {0} not found")]
    UnknownTensor(TensorId),
    #[error("Leg {0} not found")]
    UnknownLeg(LegId),
    #[error("Leg {0} is linked more than once")]
    LegLinkedTwice(LegId),
    #[error("To-be joined leg group must contain at least two legs, got {0}")]
    LonelyLegGroup(usize),
    #[error("Subscripts given for tensor {0}, which is in no contraction group")]
    UngroupedSubscripts(TensorId),
}
