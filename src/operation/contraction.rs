use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::structure::{LegId, StructureError, TensorId};

use super::write_list;

/// A general tensor contraction, following the sublist convention of `numpy.einsum`.
///
/// Dimensions to be contracted carry the same label. Labels listed in
/// [`output_dims`](Contraction::output_dims) are kept and give the dimension ordering of the
/// output tensor; every other label shared by two or more inputs is summed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contraction {
    inputs: Vec<TensorId>,
    subscripts: Vec<Vec<LegId>>,
    output_dims: Vec<LegId>,
    output: TensorId,
}

impl Contraction {
    pub fn new(
        inputs: Vec<TensorId>,
        subscripts: Vec<Vec<LegId>>,
        output_dims: Vec<LegId>,
        output: TensorId,
    ) -> Result<Self, StructureError> {
        let contraction = Contraction {
            inputs,
            subscripts,
            output_dims,
            output,
        };
        contraction.validate()?;
        Ok(contraction)
    }

    /// Checks that there is one subscript list per input and that every output label is owned by
    /// a single input and listed once.
    ///
    /// Output labels that appear in no input at all are left to
    /// [`canonicalize`](Contraction::canonicalize), which reports them.
    pub fn validate(&self) -> Result<(), StructureError> {
        if self.inputs.is_empty() {
            return Err(StructureError::EmptyContraction);
        }
        if self.inputs.len() != self.subscripts.len() {
            return Err(StructureError::InputSubscriptMismatch {
                inputs: self.inputs.len(),
                subscripts: self.subscripts.len(),
            });
        }

        for (i, label) in self.output_dims.iter().enumerate() {
            if self.output_dims[..i].contains(label) {
                return Err(StructureError::RepeatedOutputLabel(*label));
            }
            let owners = self
                .subscripts
                .iter()
                .filter(|s| s.contains(label))
                .count();
            if owners > 1 {
                return Err(StructureError::SharedOutputLabel(*label));
            }
        }
        Ok(())
    }

    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    pub fn subscripts(&self) -> &[Vec<LegId>] {
        &self.subscripts
    }

    pub fn output_dims(&self) -> &[LegId] {
        &self.output_dims
    }

    pub fn output(&self) -> TensorId {
        self.output
    }

    /// Iterates over `(input tensor, its subscript labels)`.
    pub fn operands(&self) -> impl Iterator<Item = (TensorId, &[LegId])> {
        self.inputs
            .iter()
            .copied()
            .zip(self.subscripts.iter().map(Vec::as_slice))
    }

    /// Labels that are summed over, in order of first appearance.
    pub fn contracted_labels(&self) -> Vec<LegId> {
        let mut contracted = vec![];
        for label in self.subscripts.iter().flatten() {
            if !self.output_dims.contains(label) && !contracted.contains(label) {
                contracted.push(*label);
            }
        }
        contracted
    }

    pub(super) fn relabeled(&self, subscripts: Vec<Vec<LegId>>, output_dims: Vec<LegId>) -> Self {
        Contraction {
            inputs: self.inputs.clone(),
            subscripts,
            output_dims,
            output: self.output,
        }
    }
}

impl Display for Contraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = contract(", self.output)?;
        for (i, (tensor, labels)) in self.operands().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tensor}")?;
            write_list(f, labels)?;
        }
        write!(f, " -> ")?;
        write_list(f, &self.output_dims)?;
        write!(f, ")")
    }
}
