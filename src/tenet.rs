/*!

An intermediate representation for tensor network diagrams, and a compiler from that
representation to callable numeric-array source code.

A diagram editor drives a [`Session`](session::Session): it creates tensors, joins their legs,
transposes them or splits them in two. Every edit is recorded as an immutable
[`Operation`](operation::Operation) in an append-only [`Program`](program::Program).

Three operation kinds exist:
- [`Contraction`](operation::Contraction), an einsum-style product of several tensors,
- [`Transposition`](operation::Transposition), a reordering of dimensions,
- [`QrSplit`](operation::QrSplit), a two-factor splitting at a dimension boundary.

Contractions are stored with canonical subscript labels (see [`operation::canonical`]), so
equivalent contractions compare equal no matter which legs the editor allocated.

From a program, the [`SymbolTable`](symbol_table::SymbolTable) classifies every tensor as program
input and/or output while enforcing single assignment, and a
[`CodeGenerator`](codegen::CodeGenerator) emits the full source text of one function.

```
use tenet_ir::session::Session;

let mut session = Session::new();
let a = session.create_tensor(2);
let b = session.create_tensor(2);
let (a_legs, b_legs) = (session.legs(a).unwrap().to_vec(), session.legs(b).unwrap().to_vec());

session.join_legs(&[vec![a_legs[1], b_legs[0]]]).unwrap();
let code = session.regenerate().unwrap();
assert!(code.contains("np.einsum(T0, (0, 1), T1, (1, 2), (0, 2))"));
```

*/
extern crate self as tenet_ir;

pub mod codegen;
pub mod error;
/// Merging of overlapping tensor groups
pub mod grouping;
pub mod operation;
pub mod program;
pub mod session;
/// Tensor and leg identifiers
pub mod structure;
pub mod symbol_table;

pub use error::TenetError;

#[cfg(test)]
mod tests;
