//! Compilation of a [`Program`] into the source text of a single callable.
//!
//! The callable takes the program inputs as parameters (ascending [`TensorId`]) and returns the
//! program outputs (ascending, a tuple when there are several). Each operation becomes one or a
//! few statements of the chosen [`ArrayDialect`].

use std::fmt::{Display, Write};

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    operation::{Contraction, Operation, QrSplit, Transposition},
    program::Program,
    structure::TensorId,
    symbol_table::{SymbolTable, SymbolTableError},
};

pub mod dialect;

pub use dialect::{ArrayDialect, NumPy, Torch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Operation {index} has an unsupported kind")]
    UnsupportedOperation { index: usize },
    #[error("Symbol table error: {0}")]
    SymbolTable(#[from] SymbolTableError),
    #[error("Settings error: {0}")]
    Settings(#[from] InvalidSetting),
    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),
}

pub trait CodeGenerator {
    /// Emits the full program text. Neither `program` nor `table` is modified.
    fn generate(&self, program: &Program, table: &SymbolTable) -> Result<String, CodegenError>;

    /// Builds the symbol table of `program` and generates its text.
    fn compile(&self, program: &Program) -> Result<String, CodegenError> {
        let table = SymbolTable::build(program)?;
        self.generate(program, &table)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    NumPy,
    Torch,
}

impl Target {
    pub fn dialect(self) -> &'static dyn ArrayDialect {
        match self {
            Target::NumPy => &NumPy,
            Target::Torch => &Torch,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid setting {field} = {value:?}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub value: String,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] InvalidSetting),
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Settings of the emitted program. Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenSettings {
    pub target: Target,
    pub function_name: String,
    /// Variable name of tensor `i` is the prefix followed by `i`.
    pub tensor_prefix: String,
    pub indent: String,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        CodegenSettings {
            target: Target::NumPy,
            function_name: "f".into(),
            tensor_prefix: "T".into(),
            indent: "    ".into(),
        }
    }
}

impl CodegenSettings {
    /// Reads settings and checks them with [`validate`](CodegenSettings::validate).
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: CodegenSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The function name must be a Python identifier other than a keyword, the tensor prefix
    /// must start one, and the indent must be non-empty spaces or tabs.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        let invalid = |field, value: &String| InvalidSetting {
            field,
            value: value.clone(),
        };

        if !is_identifier(&self.function_name)
            || PYTHON_KEYWORDS.contains(&self.function_name.as_str())
        {
            return Err(invalid("function_name", &self.function_name));
        }
        if !is_identifier(&self.tensor_prefix) {
            return Err(invalid("tensor_prefix", &self.tensor_prefix));
        }
        if self.indent.is_empty() || !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(invalid("indent", &self.indent));
        }
        Ok(())
    }
}

/// Emits Python source for the dialect selected in its [`CodegenSettings`].
#[derive(Debug, Clone, Default)]
pub struct PythonGenerator {
    settings: CodegenSettings,
}

impl PythonGenerator {
    pub fn new(settings: CodegenSettings) -> Self {
        PythonGenerator { settings }
    }

    pub fn settings(&self) -> &CodegenSettings {
        &self.settings
    }

    fn var(&self, tensor: TensorId) -> String {
        format!("{}{}", self.settings.tensor_prefix, tensor.index())
    }

    fn contraction(&self, out: &mut String, c: &Contraction) -> std::fmt::Result {
        let dialect = self.settings.target.dialect();
        write!(
            out,
            "{}{} = {}(",
            self.settings.indent,
            self.var(c.output()),
            dialect.einsum()
        )?;
        for (tensor, labels) in c.operands() {
            write!(
                out,
                "{}, {}, ",
                self.var(tensor),
                dialect.sublist(&labels.iter().map(|l| l.index()).collect::<Vec<_>>())
            )?;
        }
        writeln!(
            out,
            "{})",
            dialect.sublist(&c.output_dims().iter().map(|l| l.index()).collect::<Vec<_>>())
        )
    }

    fn transposition(&self, out: &mut String, t: &Transposition) -> std::fmt::Result {
        writeln!(
            out,
            "{}{} = {}({}, {})",
            self.settings.indent,
            self.var(t.output()),
            self.settings.target.dialect().transpose(),
            self.var(t.input()),
            python_tuple(t.permutation())
        )
    }

    /// Matrices are factorized directly. Higher rank tensors are flattened to a matrix of
    /// (leading dimensions) x (trailing dimensions), factorized, and each factor is reshaped
    /// back unless its side holds a single dimension.
    fn qr_split(&self, out: &mut String, q: &QrSplit) -> std::fmt::Result {
        let dialect = self.settings.target.dialect();
        let indent = &self.settings.indent;
        let (input, tq, tr) = (
            self.var(q.input()),
            self.var(q.q_output()),
            self.var(q.r_output()),
        );
        let left = q.left_rank_count();

        if q.rank() == 2 {
            return writeln!(
                out,
                "{indent}{tq}, {tr} = {}({input}, mode='reduced')",
                dialect.qr()
            );
        }

        let prod = dialect.product();
        writeln!(
            out,
            "{indent}{tq}, {tr} = {}({input}.reshape(({prod}({input}.shape[:{left}]), {prod}({input}.shape[{left}:]))), mode='reduced')",
            dialect.qr()
        )?;
        if left > 1 {
            writeln!(
                out,
                "{indent}{tq} = {tq}.reshape({input}.shape[:{left}] + ({tq}.shape[1],))"
            )?;
        }
        if q.right_rank_count() > 1 {
            writeln!(
                out,
                "{indent}{tr} = {tr}.reshape(({tr}.shape[0],) + {input}.shape[{left}:])"
            )?;
        }
        Ok(())
    }
}

impl CodeGenerator for PythonGenerator {
    fn generate(&self, program: &Program, table: &SymbolTable) -> Result<String, CodegenError> {
        self.settings.validate()?;
        let dialect = self.settings.target.dialect();
        let inputs: Vec<String> = table.inputs().map(|t| self.var(t)).collect();
        let outputs: Vec<String> = table.outputs().map(|t| self.var(t)).collect();
        trace!(
            "generating {} operations, {} inputs, {} outputs",
            program.len(),
            inputs.len(),
            outputs.len()
        );

        let mut out = String::new();
        for import in dialect.imports() {
            writeln!(out, "{import}")?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "def {}({}):",
            self.settings.function_name,
            inputs.join(", ")
        )?;

        for (index, operation) in program.iter().enumerate() {
            match operation {
                Operation::Contraction(c) => self.contraction(&mut out, c)?,
                Operation::Transposition(t) => self.transposition(&mut out, t)?,
                Operation::QrSplit(q) => self.qr_split(&mut out, q)?,
                Operation::Unsupported => {
                    return Err(CodegenError::UnsupportedOperation { index });
                }
            }
        }

        match outputs.as_slice() {
            [] => return Err(SymbolTableError::NoOutput.into()),
            [single] => writeln!(out, "{}return {single}", self.settings.indent)?,
            several => writeln!(
                out,
                "{}return {}",
                self.settings.indent,
                python_tuple(several)
            )?,
        }

        Ok(out)
    }
}

/// Python tuple literal: `()`, `(a,)` or `(a, b)`.
pub fn python_tuple<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    match items.as_slice() {
        [single] => format!("({single},)"),
        _ => format!("({})", items.join(", ")),
    }
}
