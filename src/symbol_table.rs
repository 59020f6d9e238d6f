//! Classification of every tensor of a program as program input and/or program output.
//!
//! A tensor consumed before it is produced is an input of the generated function. A tensor that
//! is produced and never consumed afterwards is returned by it. Every tensor may be produced at
//! most once (static single assignment).

use std::collections::{btree_map, BTreeMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};
use thiserror::Error;

use crate::{operation::Operation, program::Program, structure::TensorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Tensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub kind: SymbolKind,
    pub is_program_input: bool,
    pub is_program_output: bool,
}

impl SymbolEntry {
    fn input() -> Self {
        SymbolEntry {
            kind: SymbolKind::Tensor,
            is_program_input: true,
            is_program_output: false,
        }
    }

    fn produced() -> Self {
        SymbolEntry {
            kind: SymbolKind::Tensor,
            is_program_input: false,
            is_program_output: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolTableError {
    #[error("Output tensor {tensor} of operation {index} appeared previously")]
    DuplicateOutput { tensor: TensorId, index: usize },
    #[error("At least one output tensor expected")]
    NoOutput,
    #[error("Operation {index} has an unsupported kind")]
    UnsupportedOperation { index: usize },
}

/// Symbol table of a [`Program`], enumerated by ascending [`TensorId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: BTreeMap<TensorId, SymbolEntry>,
}

impl SymbolTable {
    /// Builds the table in a single pass over `program`.
    ///
    /// For every operation the inputs are visited first: an unseen tensor becomes a program
    /// input, a known one loses its output status. Then every output is registered, and must not
    /// have been seen before.
    pub fn build(program: &Program) -> Result<Self, SymbolTableError> {
        let mut table = SymbolTable::default();

        for (index, operation) in program.iter().enumerate() {
            match operation {
                Operation::Contraction(c) => {
                    for &tensor in c.inputs() {
                        table.consume(tensor);
                    }
                    table.produce(c.output(), index)?;
                }
                Operation::Transposition(t) => {
                    table.consume(t.input());
                    table.produce(t.output(), index)?;
                }
                Operation::QrSplit(q) => {
                    table.consume(q.input());
                    table.produce(q.q_output(), index)?;
                    table.produce(q.r_output(), index)?;
                }
                Operation::Unsupported => {
                    return Err(SymbolTableError::UnsupportedOperation { index });
                }
            }
        }

        if table.outputs().next().is_none() {
            return Err(SymbolTableError::NoOutput);
        }
        Ok(table)
    }

    fn consume(&mut self, tensor: TensorId) {
        self.entries
            .entry(tensor)
            .and_modify(|e| e.is_program_output = false)
            .or_insert_with(SymbolEntry::input);
    }

    fn produce(&mut self, tensor: TensorId, index: usize) -> Result<(), SymbolTableError> {
        match self.entries.entry(tensor) {
            btree_map::Entry::Occupied(_) => {
                Err(SymbolTableError::DuplicateOutput { tensor, index })
            }
            btree_map::Entry::Vacant(v) => {
                v.insert(SymbolEntry::produced());
                Ok(())
            }
        }
    }

    pub fn get(&self, tensor: TensorId) -> Option<&SymbolEntry> {
        self.entries.get(&tensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TensorId, &SymbolEntry)> {
        self.entries.iter().map(|(t, e)| (*t, e))
    }

    /// Program inputs in ascending order.
    pub fn inputs(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.iter()
            .filter(|(_, e)| e.is_program_input)
            .map(|(t, _)| t)
    }

    /// Program outputs in ascending order.
    pub fn outputs(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.iter()
            .filter(|(_, e)| e.is_program_output)
            .map(|(t, _)| t)
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = Builder::new();

        table.push_record(["tensor".to_string(), "input".into(), "output".into()]);
        for (tensor, entry) in self.iter() {
            table.push_record([
                tensor.to_string(),
                entry.is_program_input.to_string(),
                entry.is_program_output.to_string(),
            ]);
        }
        write!(f, "{}", table.build().with(Style::rounded()))
    }
}
