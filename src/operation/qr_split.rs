use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::structure::{StructureError, TensorId};

/// QR decomposition of a tensor without permuting its dimensions.
///
/// The leading `left_rank_count` dimensions go to the Q factor, the remaining ones to the R
/// factor. Q gains a trailing bond dimension and R a leading one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QrSplit {
    input: TensorId,
    rank: usize,
    left_rank_count: usize,
    q_output: TensorId,
    r_output: TensorId,
}

impl QrSplit {
    pub fn new(
        input: TensorId,
        rank: usize,
        left_rank_count: usize,
        q_output: TensorId,
        r_output: TensorId,
    ) -> Result<Self, StructureError> {
        let split = QrSplit {
            input,
            rank,
            left_rank_count,
            q_output,
            r_output,
        };
        split.validate()?;
        Ok(split)
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        if self.rank < 2 {
            return Err(StructureError::RankTooSmall(self.rank));
        }
        if self.left_rank_count < 1 || self.left_rank_count >= self.rank {
            return Err(StructureError::LeftRankOutOfRange {
                left: self.left_rank_count,
                rank: self.rank,
            });
        }
        Ok(())
    }

    pub fn input(&self) -> TensorId {
        self.input
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn left_rank_count(&self) -> usize {
        self.left_rank_count
    }

    pub fn right_rank_count(&self) -> usize {
        self.rank - self.left_rank_count
    }

    pub fn q_output(&self) -> TensorId {
        self.q_output
    }

    pub fn r_output(&self) -> TensorId {
        self.r_output
    }
}

impl Display for QrSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} = qr({}, {}|{})",
            self.q_output,
            self.r_output,
            self.input,
            self.left_rank_count,
            self.right_rank_count()
        )
    }
}
