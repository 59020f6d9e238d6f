use std::fmt::Display;

use delegate::delegate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    operation::{CanonicalizationError, Operation},
    structure::StructureError,
};

/// The append-only log of operations recorded by a session.
///
/// Operations are only ever pushed; nothing already recorded can be modified. The whole log is
/// cleared by [`Session::reset`](crate::session::Session::reset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    operations: Vec<Operation>,
}

#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Operation {index} is malformed: {source}")]
    Structure {
        index: usize,
        source: StructureError,
    },
    #[error("Contraction {index} cannot be canonicalized: {source}")]
    Canonicalization {
        index: usize,
        source: CanonicalizationError,
    },
}

impl Program {
    pub fn new() -> Self {
        Program { operations: vec![] }
    }

    /// Appends an operation, returning its position in the log.
    pub fn push(&mut self, operation: impl Into<Operation>) -> usize {
        self.operations.push(operation.into());
        self.operations.len() - 1
    }

    delegate! {
        to self.operations {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            pub fn iter(&self) -> std::slice::Iter<'_, Operation>;
            pub fn get(&self, index: usize) -> Option<&Operation>;
            pub fn last(&self) -> Option<&Operation>;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn to_json(&self) -> Result<String, ProgramError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a program saved with [`to_json`](Program::to_json), re-checking every operation.
    ///
    /// Contractions are brought to canonical labels, so a hand-edited file loads the same as
    /// the program it is equivalent to. Operations of an unknown kind are kept as
    /// [`Operation::Unsupported`]; they only fail once the program is compiled.
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        let loaded: Vec<Operation> = serde_json::from_str(json)?;
        let mut program = Program::new();
        for (index, operation) in loaded.into_iter().enumerate() {
            operation
                .validate()
                .map_err(|source| ProgramError::Structure { index, source })?;
            let operation = match operation {
                Operation::Contraction(c) => c
                    .canonicalize()
                    .map_err(|source| ProgramError::Canonicalization { index, source })?
                    .into(),
                other => other,
            };
            program.push(operation);
        }
        Ok(program)
    }
}

impl FromIterator<Operation> for Program {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Program {
            operations: Vec::from_iter(iter),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, operation) in self.iter().enumerate() {
            writeln!(f, "{i}: {operation}")?;
        }
        Ok(())
    }
}
