use std::fmt::Display;

use bitvec::bitvec;
use serde::{Deserialize, Serialize};

use crate::structure::{StructureError, TensorId};

use super::write_list;

/// A general transposition, following the convention of `numpy.transpose`: dimension `i` of
/// the output is dimension `permutation[i]` of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transposition {
    input: TensorId,
    permutation: Vec<usize>,
    output: TensorId,
}

impl Transposition {
    pub fn new(
        input: TensorId,
        permutation: Vec<usize>,
        output: TensorId,
    ) -> Result<Self, StructureError> {
        let transposition = Transposition {
            input,
            permutation,
            output,
        };
        transposition.validate()?;
        Ok(transposition)
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        check_permutation(&self.permutation)
    }

    pub fn input(&self) -> TensorId {
        self.input
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn output(&self) -> TensorId {
        self.output
    }

    pub fn rank(&self) -> usize {
        self.permutation.len()
    }
}

/// Fails with the first entry of `0..perm.len()` that is missing from `perm`.
pub fn check_permutation(perm: &[usize]) -> Result<(), StructureError> {
    let mut seen = bitvec![0; perm.len()];
    for &p in perm {
        if p < perm.len() {
            seen.set(p, true);
        }
    }
    match seen.first_zero() {
        Some(missing) => Err(StructureError::NotAPermutation(missing)),
        None => Ok(()),
    }
}

pub fn is_identity(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}

impl Display for Transposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = transpose({}, ", self.output, self.input)?;
        write_list(f, &self.permutation)?;
        write!(f, ")")
    }
}
