use thiserror::Error;

use crate::{
    codegen::{CodegenError, SettingsError}, operation::CanonicalizationError, program::ProgramError,
    structure::StructureError, symbol_table::SymbolTableError,
};

/// Any failure surfaced by a [`Session`](crate::session::Session).
///
/// Failures are never recovered from internally: a failed edit appends nothing, and a failed
/// regeneration leaves the previously generated text in place.
#[derive(Error, Debug)]
pub enum TenetError {
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),
    #[error("Canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    #[error("Symbol table error: {0}")]
    SymbolTable(#[from] SymbolTableError),
    #[error("Codegen error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),
}
