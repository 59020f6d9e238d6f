use super::python_tuple;

/// The numeric-array library a generated Python program calls into.
pub trait ArrayDialect: Sync {
    /// Import lines heading the program.
    fn imports(&self) -> &'static [&'static str];
    /// Einsum taking operands in sublist format.
    fn einsum(&self) -> &'static str;
    fn transpose(&self) -> &'static str;
    /// Reduced QR decomposition of a matrix, returning `(q, r)`.
    fn qr(&self) -> &'static str;
    /// Product of the entries of a shape.
    fn product(&self) -> &'static str;

    /// Subscript labels of one einsum operand.
    fn sublist(&self, labels: &[usize]) -> String {
        python_tuple(labels)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumPy;

impl ArrayDialect for NumPy {
    fn imports(&self) -> &'static [&'static str] {
        &["import numpy as np"]
    }

    fn einsum(&self) -> &'static str {
        "np.einsum"
    }

    fn transpose(&self) -> &'static str {
        "np.transpose"
    }

    fn qr(&self) -> &'static str {
        "np.linalg.qr"
    }

    fn product(&self) -> &'static str {
        "np.prod"
    }
}

/// PyTorch. Sublists are emitted as lists, which is what `torch.einsum` accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Torch;

impl ArrayDialect for Torch {
    fn imports(&self) -> &'static [&'static str] {
        &["import math", "import torch"]
    }

    fn einsum(&self) -> &'static str {
        "torch.einsum"
    }

    fn transpose(&self) -> &'static str {
        "torch.permute"
    }

    fn qr(&self) -> &'static str {
        "torch.linalg.qr"
    }

    fn product(&self) -> &'static str {
        "math.prod"
    }

    fn sublist(&self, labels: &[usize]) -> String {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        format!("[{}]", labels.join(", "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sublists() {
        assert_eq!(NumPy.sublist(&[]), "()");
        assert_eq!(NumPy.sublist(&[4]), "(4,)");
        assert_eq!(NumPy.sublist(&[0, 1]), "(0, 1)");
        assert_eq!(Torch.sublist(&[4]), "[4]");
        assert_eq!(Torch.sublist(&[]), "[]");
    }
}
