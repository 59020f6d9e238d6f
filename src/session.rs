//! The editing context driven by a diagram editor.
//!
//! A [`Session`] owns the [`Program`] being recorded together with the live diagram: which
//! tensors currently exist and which legs each of them carries. Every edit is validated in full
//! before anything is recorded, so a failed edit leaves the session untouched.

use ahash::{AHashMap, AHashSet};
use bitvec::{bitvec, vec::BitVec};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::{
    codegen::{CodeGenerator, CodegenError, CodegenSettings, PythonGenerator},
    error::TenetError,
    grouping::merge_overlapping,
    operation::{
        transposition::{check_permutation, is_identity},
        Contraction, QrSplit, Transposition,
    },
    program::Program,
    structure::{LegId, StructureError, TensorId},
    symbol_table::SymbolTable,
};

/// The two factors of a QR split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QrOutputs {
    pub q: TensorId,
    pub r: TensorId,
}

#[derive(Debug, Clone)]
pub struct Session {
    program: Program,
    tensors: IndexMap<TensorId, Vec<LegId>>,
    next_tensor: usize,
    next_leg: usize,
    generator: PythonGenerator,
    generated: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_settings(CodegenSettings::default())
    }

    pub fn with_settings(settings: CodegenSettings) -> Self {
        Session {
            program: Program::new(),
            tensors: IndexMap::new(),
            next_tensor: 0,
            next_leg: 0,
            generator: PythonGenerator::new(settings),
            generated: None,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn settings(&self) -> &CodegenSettings {
        self.generator.settings()
    }

    /// Legs of a live tensor, in dimension order.
    pub fn legs(&self, tensor: TensorId) -> Option<&[LegId]> {
        self.tensors.get(&tensor).map(Vec::as_slice)
    }

    pub fn rank(&self, tensor: TensorId) -> Option<usize> {
        self.tensors.get(&tensor).map(Vec::len)
    }

    /// Tensors currently present in the diagram, oldest first.
    pub fn live_tensors(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.tensors.keys().copied()
    }

    /// Adds a tensor with `rank` fresh legs to the diagram. Nothing is recorded: the tensor
    /// becomes a program input once an operation consumes it.
    pub fn create_tensor(&mut self, rank: usize) -> TensorId {
        let tensor = self.fresh_tensor();
        let legs: Vec<LegId> = (0..rank).map(|_| self.fresh_leg()).collect();
        debug!("created {tensor} with legs {legs:?}");
        self.tensors.insert(tensor, legs);
        tensor
    }

    /// Joins groups of coinciding legs and contracts every resulting cluster of tensors.
    ///
    /// The legs of a group are relabeled with the smallest leg id of the group. Tensors linked
    /// directly or through other tensors are contracted together, one contraction per cluster,
    /// keeping the legs that were not joined. Returns the new tensors.
    pub fn join_legs(&mut self, leg_groups: &[Vec<LegId>]) -> Result<Vec<TensorId>, TenetError> {
        let owners: AHashMap<LegId, (TensorId, usize)> = self
            .tensors
            .iter()
            .flat_map(|(t, legs)| legs.iter().enumerate().map(move |(i, l)| (*l, (*t, i))))
            .collect();

        let mut linked: BitVec = bitvec![0; self.next_leg];
        let mut subscripts: AHashMap<TensorId, Vec<LegId>> = AHashMap::new();
        let mut tensor_groups = Vec::with_capacity(leg_groups.len());

        for group in leg_groups {
            let label = match group.iter().min() {
                Some(&label) if group.len() >= 2 => label,
                _ => return Err(StructureError::LonelyLegGroup(group.len()).into()),
            };

            let mut tensors = Vec::with_capacity(group.len());
            for &leg in group {
                let &(tensor, position) = owners.get(&leg).ok_or(StructureError::UnknownLeg(leg))?;
                if linked.replace(leg.index(), true) {
                    return Err(StructureError::LegLinkedTwice(leg).into());
                }
                subscripts
                    .entry(tensor)
                    .or_insert_with(|| self.tensors[&tensor].clone())[position] = label;
                tensors.push(tensor);
            }
            tensor_groups.push(tensors);
        }

        self.append_contraction(tensor_groups, subscripts)
    }

    /// Contracts groups of tensors given the subscript labels of each tensor.
    ///
    /// Overlapping groups are merged first. Within a merged group, labels occurring once are
    /// kept as output dimensions (in order of appearance), labels occurring several times are
    /// summed over. A tensor without subscripts keeps its own legs as labels, and subscripts of
    /// a tensor outside every group are rejected. The new tensor carries the legs found at the
    /// kept positions. Returns the new tensors, one per merged group.
    pub fn append_contraction<G, I, S>(
        &mut self,
        groups: I,
        subscripts: S,
    ) -> Result<Vec<TensorId>, TenetError>
    where
        G: IntoIterator<Item = TensorId>,
        I: IntoIterator<Item = G>,
        S: IntoIterator<Item = (TensorId, Vec<LegId>)>,
    {
        let subscripts: AHashMap<TensorId, Vec<LegId>> = subscripts.into_iter().collect();
        let merged = merge_overlapping(groups);

        let grouped: AHashSet<TensorId> = merged.iter().flatten().copied().collect();
        if let Some(&stray) = subscripts.keys().filter(|t| !grouped.contains(*t)).min() {
            return Err(StructureError::UngroupedSubscripts(stray).into());
        }

        let mut planned = Vec::with_capacity(merged.len());
        for (k, group) in merged.into_iter().enumerate() {
            let output = TensorId(self.next_tensor + k);
            planned.push(self.plan_contraction(group, &subscripts, output)?);
        }

        let mut outputs = Vec::with_capacity(planned.len());
        for (contraction, legs) in planned {
            let tensor = self.fresh_tensor();
            for input in contraction.inputs() {
                self.tensors.shift_remove(input);
            }
            self.tensors.insert(tensor, legs);
            debug!("appending {contraction}");
            self.program.push(contraction);
            outputs.push(tensor);
        }
        Ok(outputs)
    }

    fn plan_contraction(
        &self,
        group: Vec<TensorId>,
        subscripts: &AHashMap<TensorId, Vec<LegId>>,
        output: TensorId,
    ) -> Result<(Contraction, Vec<LegId>), TenetError> {
        let mut labels = Vec::with_capacity(group.len());
        for &tensor in &group {
            let legs = self.tensor_legs(tensor)?;
            let tensor_labels = subscripts
                .get(&tensor)
                .cloned()
                .unwrap_or_else(|| legs.to_vec());
            if tensor_labels.len() != legs.len() {
                return Err(StructureError::RankMismatch {
                    tensor,
                    rank: legs.len(),
                    found: tensor_labels.len(),
                }
                .into());
            }
            labels.push(tensor_labels);
        }

        let mut occurrences: AHashMap<LegId, usize> = AHashMap::new();
        for label in labels.iter().flatten() {
            *occurrences.entry(*label).or_default() += 1;
        }

        let mut output_dims = vec![];
        let mut kept_legs = vec![];
        for (&tensor, tensor_labels) in group.iter().zip(&labels) {
            for (label, leg) in tensor_labels.iter().zip(self.tensor_legs(tensor)?) {
                if occurrences.get(label) == Some(&1) {
                    output_dims.push(*label);
                    kept_legs.push(*leg);
                }
            }
        }

        let contraction = Contraction::new(group, labels, output_dims, output)?.canonicalize()?;
        Ok((contraction, kept_legs))
    }

    /// Reorders the dimensions of `tensor`: dimension `i` of the result is dimension
    /// `permutation[i]` of `tensor`.
    ///
    /// The identity permutation records nothing and returns `tensor` itself.
    pub fn append_transposition(
        &mut self,
        tensor: TensorId,
        permutation: &[usize],
    ) -> Result<TensorId, TenetError> {
        let legs = self.tensor_legs(tensor)?;
        if permutation.len() != legs.len() {
            return Err(StructureError::PermutationLength {
                tensor,
                rank: legs.len(),
                found: permutation.len(),
            }
            .into());
        }
        check_permutation(permutation)?;
        if is_identity(permutation) {
            debug!("identity transposition of {tensor}, nothing appended");
            return Ok(tensor);
        }

        let permuted: Vec<LegId> = permutation.iter().map(|&p| legs[p]).collect();
        let transposition =
            Transposition::new(tensor, permutation.to_vec(), TensorId(self.next_tensor))?;

        let output = self.fresh_tensor();
        self.tensors.shift_remove(&tensor);
        self.tensors.insert(output, permuted);
        debug!("appending {transposition}");
        self.program.push(transposition);
        Ok(output)
    }

    /// Splits `tensor` into Q, carrying its leading `left_rank_count` legs, and R, carrying the
    /// remaining ones. Q gets a new trailing bond leg and R a new leading one.
    pub fn append_qr_split(
        &mut self,
        tensor: TensorId,
        left_rank_count: usize,
    ) -> Result<QrOutputs, TenetError> {
        let rank = self.tensor_legs(tensor)?.len();
        let split = QrSplit::new(
            tensor,
            rank,
            left_rank_count,
            TensorId(self.next_tensor),
            TensorId(self.next_tensor + 1),
        )?;

        let legs = self
            .tensors
            .shift_remove(&tensor)
            .ok_or(StructureError::UnknownTensor(tensor))?;
        let (left, right) = legs.split_at(left_rank_count);

        let q = self.fresh_tensor();
        let r = self.fresh_tensor();

        let mut q_legs = left.to_vec();
        q_legs.push(self.fresh_leg());
        let mut r_legs = vec![self.fresh_leg()];
        r_legs.extend_from_slice(right);

        self.tensors.insert(q, q_legs);
        self.tensors.insert(r, r_legs);
        debug!("appending {split}");
        self.program.push(split);
        Ok(QrOutputs { q, r })
    }

    /// Permutes the dimensions of `tensor`, then splits the result with QR at
    /// `left_rank_count`.
    ///
    /// Both steps are checked before either is recorded. The transposition is skipped for the
    /// identity permutation.
    pub fn split(
        &mut self,
        tensor: TensorId,
        permutation: &[usize],
        left_rank_count: usize,
    ) -> Result<QrOutputs, TenetError> {
        let rank = self.tensor_legs(tensor)?.len();
        if permutation.len() != rank {
            return Err(StructureError::PermutationLength {
                tensor,
                rank,
                found: permutation.len(),
            }
            .into());
        }
        check_permutation(permutation)?;
        QrSplit::new(
            tensor,
            rank,
            left_rank_count,
            TensorId(self.next_tensor),
            TensorId(self.next_tensor + 1),
        )?;

        let permuted = self.append_transposition(tensor, permutation)?;
        self.append_qr_split(permuted, left_rank_count)
    }

    /// Rebuilds the symbol table and the full program text.
    ///
    /// On failure the error is returned and the last successfully generated text, available
    /// through [`generated`](Session::generated), is left as it was.
    pub fn regenerate(&mut self) -> Result<String, TenetError> {
        let code = SymbolTable::build(&self.program)
            .map_err(CodegenError::from)
            .and_then(|table| self.generator.generate(&self.program, &table));

        match code {
            Ok(code) => {
                self.generated = Some(code.clone());
                Ok(code)
            }
            Err(e) => {
                warn!("regeneration failed, keeping previous program text: {e}");
                Err(e.into())
            }
        }
    }

    pub fn generated(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    pub fn program_json(&self) -> Result<String, TenetError> {
        Ok(self.program.to_json()?)
    }

    /// Clears the program, the diagram and the generated text. Ids start over from zero.
    pub fn reset(&mut self) {
        self.program.clear();
        self.tensors.clear();
        self.next_tensor = 0;
        self.next_leg = 0;
        self.generated = None;
    }

    fn tensor_legs(&self, tensor: TensorId) -> Result<&[LegId], StructureError> {
        self.legs(tensor).ok_or(StructureError::UnknownTensor(tensor))
    }

    fn fresh_tensor(&mut self) -> TensorId {
        let tensor = TensorId(self.next_tensor);
        self.next_tensor += 1;
        tensor
    }

    fn fresh_leg(&mut self) -> LegId {
        let leg = LegId(self.next_leg);
        self.next_leg += 1;
        leg
    }
}
