use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::structure::StructureError;

pub mod canonical;
pub mod contraction;
pub mod qr_split;
pub mod transposition;

pub use canonical::CanonicalizationError;
pub use contraction::Contraction;
pub use qr_split::QrSplit;
pub use transposition::Transposition;

/// One elementary tensor operation of a [`Program`](crate::program::Program).
///
/// Every tensor is immutable: an operation always produces fresh tensors instead of
/// overwriting its inputs. Operations are validated on construction and never mutated once
/// appended.
///
/// The [`Unsupported`](Operation::Unsupported) variant only arises when reading a saved program
/// that contains an operation kind this version does not know. Compiling such a program fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Contraction(Contraction),
    Transposition(Transposition),
    QrSplit(QrSplit),
    #[serde(other)]
    Unsupported,
}

impl Operation {
    /// Checks the structural invariants of the wrapped operation.
    pub fn validate(&self) -> Result<(), StructureError> {
        match self {
            Operation::Contraction(c) => c.validate(),
            Operation::Transposition(t) => t.validate(),
            Operation::QrSplit(q) => q.validate(),
            Operation::Unsupported => Ok(()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Contraction(_) => "contraction",
            Operation::Transposition(_) => "transposition",
            Operation::QrSplit(_) => "qr_split",
            Operation::Unsupported => "unsupported",
        }
    }
}

impl From<Contraction> for Operation {
    fn from(value: Contraction) -> Self {
        Operation::Contraction(value)
    }
}

impl From<Transposition> for Operation {
    fn from(value: Transposition) -> Self {
        Operation::Transposition(value)
    }
}

impl From<QrSplit> for Operation {
    fn from(value: QrSplit) -> Self {
        Operation::QrSplit(value)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Contraction(c) => Display::fmt(c, f),
            Operation::Transposition(t) => Display::fmt(t, f),
            Operation::QrSplit(q) => Display::fmt(q, f),
            Operation::Unsupported => write!(f, "<unsupported>"),
        }
    }
}

pub(crate) fn write_list<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::structure::{LegId, TensorId};

    fn legs(l: &[usize]) -> Vec<LegId> {
        l.iter().copied().map(LegId).collect()
    }

    #[test]
    fn serde_tags() {
        let op: Operation = QrSplit::new(TensorId(0), 3, 2, TensorId(1), TensorId(2))
            .unwrap()
            .into();
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"qr_split","input":0,"rank":3,"left_rank_count":2,"q_output":1,"r_output":2}"#
        );
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let op: Operation =
            serde_json::from_str(r#"{"kind":"svd_split","input":0,"rank":2}"#).unwrap();
        assert_eq!(op, Operation::Unsupported);
        assert_eq!(op.kind(), "unsupported");
        assert!(op.validate().is_ok());
    }

    #[test]
    fn display() {
        let c: Operation = Contraction::new(
            vec![TensorId(0), TensorId(1)],
            vec![legs(&[0, 1]), legs(&[1, 2])],
            legs(&[0, 2]),
            TensorId(2),
        )
        .unwrap()
        .into();
        assert_eq!(c.to_string(), "T2 = contract(T0[0,1], T1[1,2] -> [0,2])");

        let t: Operation = Transposition::new(TensorId(2), vec![1, 0], TensorId(3))
            .unwrap()
            .into();
        assert_eq!(t.to_string(), "T3 = transpose(T2, [1,0])");

        let q: Operation = QrSplit::new(TensorId(3), 2, 1, TensorId(4), TensorId(5))
            .unwrap()
            .into();
        assert_eq!(q.to_string(), "T4, T5 = qr(T3, 1|1)");
    }
}
