//! Canonical subscript labels for contractions.
//!
//! Leg ids handed out by an editor depend on the whole editing history. Renumbering them in
//! order of first appearance makes structurally equal contractions compare equal, and removes the
//! need for a global label namespace downstream.

use indexmap::IndexSet;
use thiserror::Error;

use crate::structure::LegId;

use super::Contraction;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("Contraction output subscript label {0} never appeared in input")]
    UnknownOutputLabel(LegId),
}

/// Relabels `subscripts` with `0, 1, 2, ..` in order of first appearance (inputs in order,
/// dimensions within an input in order), and applies the same relabeling to `output_dims`.
///
/// ```
/// # use tenet_ir::{operation::canonical::canonical_labels, structure::LegId};
/// let l = |v: &[usize]| v.iter().copied().map(LegId).collect::<Vec<_>>();
/// let (subscripts, output_dims) =
///     canonical_labels(&[l(&[7, 8]), l(&[8, 9])], &l(&[7, 9])).unwrap();
/// assert_eq!(subscripts, vec![l(&[0, 1]), l(&[1, 2])]);
/// assert_eq!(output_dims, l(&[0, 2]));
/// ```
pub fn canonical_labels(
    subscripts: &[Vec<LegId>],
    output_dims: &[LegId],
) -> Result<(Vec<Vec<LegId>>, Vec<LegId>), CanonicalizationError> {
    let mut first_appearance = IndexSet::new();

    let subscripts: Vec<Vec<LegId>> = subscripts
        .iter()
        .map(|labels| {
            labels
                .iter()
                .map(|label| LegId(first_appearance.insert_full(*label).0))
                .collect()
        })
        .collect();

    let output_dims: Vec<LegId> = output_dims
        .iter()
        .map(|label| {
            first_appearance
                .get_index_of(label)
                .map(LegId)
                .ok_or(CanonicalizationError::UnknownOutputLabel(*label))
        })
        .collect::<Result<_, _>>()?;

    Ok((subscripts, output_dims))
}

impl Contraction {
    /// The same contraction with canonical subscript labels.
    pub fn canonicalize(self) -> Result<Self, CanonicalizationError> {
        let (subscripts, output_dims) = canonical_labels(self.subscripts(), self.output_dims())?;
        Ok(self.relabeled(subscripts, output_dims))
    }

    pub fn is_canonical(&self) -> bool {
        canonical_labels(self.subscripts(), self.output_dims())
            .is_ok_and(|(s, o)| s == self.subscripts() && o == self.output_dims())
    }
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro64Star;

    use super::*;
    use crate::structure::TensorId;

    fn legs(l: &[usize]) -> Vec<LegId> {
        l.iter().copied().map(LegId).collect()
    }

    #[test]
    fn matrix_product() {
        let c = Contraction::new(
            vec![TensorId(0), TensorId(1)],
            vec![legs(&[7, 8]), legs(&[8, 9])],
            legs(&[7, 9]),
            TensorId(2),
        )
        .unwrap();
        assert!(!c.is_canonical());

        let c = c.canonicalize().unwrap();
        assert_eq!(c.subscripts(), &[legs(&[0, 1]), legs(&[1, 2])]);
        assert_eq!(c.output_dims(), legs(&[0, 2]).as_slice());
        assert_eq!(c.inputs(), &[TensorId(0), TensorId(1)]);
        assert_eq!(c.output(), TensorId(2));
        assert!(c.is_canonical());
    }

    #[test]
    fn history_independent() {
        let a = Contraction::new(
            vec![TensorId(3), TensorId(4)],
            vec![legs(&[41, 17, 2]), legs(&[2, 90])],
            legs(&[90, 41, 17]),
            TensorId(5),
        )
        .unwrap()
        .canonicalize()
        .unwrap();
        let b = Contraction::new(
            vec![TensorId(3), TensorId(4)],
            vec![legs(&[5, 6, 7]), legs(&[7, 8])],
            legs(&[8, 5, 6]),
            TensorId(5),
        )
        .unwrap()
        .canonicalize()
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.output_dims(), legs(&[3, 0, 1]).as_slice());
    }

    #[test]
    fn unknown_output_label() {
        let err = canonical_labels(&[legs(&[1, 2])], &legs(&[3])).unwrap_err();
        assert_eq!(err, CanonicalizationError::UnknownOutputLabel(LegId(3)));
        assert_eq!(
            err.to_string(),
            "Contraction output subscript label 3 never appeared in input"
        );
    }

    #[test]
    fn trace_keeps_repeated_labels() {
        let (subscripts, output_dims) =
            canonical_labels(&[legs(&[5, 9, 5])], &legs(&[9])).unwrap();
        assert_eq!(subscripts, vec![legs(&[0, 1, 0])]);
        assert_eq!(output_dims, legs(&[1]));
    }

    #[test]
    fn random_relabeling_is_idempotent() {
        let mut rng = Xoroshiro64Star::seed_from_u64(225);

        for _ in 0..200 {
            let ninputs = rng.random_range(1..5);
            let subscripts: Vec<Vec<LegId>> = (0..ninputs)
                .map(|_| {
                    let rank = rng.random_range(0..4);
                    (0..rank).map(|_| LegId(rng.random_range(0..1000))).collect()
                })
                .collect();
            let output_dims: Vec<LegId> = subscripts
                .iter()
                .flatten()
                .filter(|_| rng.random_bool(0.3))
                .copied()
                .collect();

            let (s1, o1) = canonical_labels(&subscripts, &output_dims).unwrap();
            let (s2, o2) = canonical_labels(&s1, &o1).unwrap();
            assert_eq!(s1, s2);
            assert_eq!(o1, o2);

            let distinct: IndexSet<_> = subscripts.iter().flatten().collect();
            assert!(s1.iter().flatten().all(|l| l.index() < distinct.len()));
        }
    }
}
