//! Single-threaded CPU implementation of [LikelihoodKernel].
//!
//! Buffers are laid out category-major: a partials buffer holds
//! `category_count * pattern_count * state_count` values, a transition matrix
//! buffer `category_count * state_count * state_count` values in row-major order.
//! Tip states at or beyond `state_count` are read as fully missing.
//! There is no rescaling; very long branches or many sites can underflow.

use crate::character::StateCode;
use crate::likelihood::kernel::{
    KernelConfig, KernelError, KernelErrorKind, KernelResult, LikelihoodKernel, PeelOperation,
};

#[derive(Debug, Clone)]
struct EigenSystem {
    eigenvectors: Vec<f64>,
    inverse_eigenvectors: Vec<f64>,
    eigenvalues: Vec<f64>,
}

/// Source of per-state likelihoods for one child in a peeling step.
enum ChildBuffer<'a> {
    States(&'a [StateCode]),
    Partials(&'a [f64]),
}

/// In-process likelihood kernel.
#[derive(Debug, Clone)]
pub struct CpuKernel {
    config: KernelConfig,
    tip_states: Vec<Option<Vec<StateCode>>>,
    partials: Vec<Option<Vec<f64>>>,
    matrices: Vec<Option<Vec<f64>>>,
    eigen_systems: Vec<Option<EigenSystem>>,
    state_frequencies: Vec<Option<Vec<f64>>>,
    category_weights: Vec<Option<Vec<f64>>>,
    category_rates: Vec<f64>,
    pattern_weights: Vec<f64>,
    finalized: bool,
}

fn check_index(index: usize, count: usize, what: &str) -> KernelResult<()> {
    if index < count {
        Ok(())
    } else {
        Err(KernelError::new(
            KernelErrorKind::OutOfRange,
            format!("{what} index {index} not below {count}"),
        ))
    }
}

fn check_len(actual: usize, expected: usize, what: &str) -> KernelResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(KernelError::new(
            KernelErrorKind::SizeMismatch,
            format!("{what} has {actual} values, expected {expected}"),
        ))
    }
}

fn uninitialized(what: &str, index: usize) -> KernelError {
    KernelError::new(
        KernelErrorKind::UninitializedBuffer,
        format!("{what} {index} not set"),
    )
}

impl CpuKernel {
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Returns the transition matrix at `index` (all categories), if computed.
    pub fn transition_matrix(&self, index: usize) -> Option<&[f64]> {
        self.matrices.get(index)?.as_deref()
    }

    /// Returns the partials buffer at `index`, if set or computed.
    pub fn partials(&self, index: usize) -> Option<&[f64]> {
        self.partials.get(index)?.as_deref()
    }

    fn ensure_live(&self) -> KernelResult<()> {
        if self.finalized {
            Err(KernelError::new(KernelErrorKind::Finalized, "instance released"))
        } else {
            Ok(())
        }
    }

    fn partials_len(&self) -> usize {
        self.config.category_count * self.config.pattern_count * self.config.state_count
    }

    fn child_buffer(&self, index: usize) -> KernelResult<ChildBuffer<'_>> {
        check_index(index, self.config.buffer_count(), "buffer")?;
        if let Some(states) = self.tip_states.get(index).and_then(Option::as_deref) {
            return Ok(ChildBuffer::States(states));
        }
        match self.partials[index].as_deref() {
            Some(partials) => Ok(ChildBuffer::Partials(partials)),
            None => Err(uninitialized("buffer", index)),
        }
    }

    fn matrix(&self, index: usize) -> KernelResult<&[f64]> {
        check_index(index, self.config.matrix_buffer_count, "matrix")?;
        self.matrices[index]
            .as_deref()
            .ok_or_else(|| uninitialized("matrix", index))
    }

    /// Computes `sum_j P[i][j] * L[j]` for every state `i` of one category and pattern.
    fn propagate(
        &self,
        child: &ChildBuffer<'_>,
        matrix: &[f64],
        category: usize,
        pattern: usize,
        out: &mut [f64],
    ) {
        let s = self.config.state_count;
        let p = &matrix[category * s * s..(category + 1) * s * s];
        match child {
            ChildBuffer::States(states) => {
                let state = states[pattern] as usize;
                for (i, value) in out.iter_mut().enumerate() {
                    *value = if state < s {
                        p[i * s + state]
                    } else {
                        p[i * s..(i + 1) * s].iter().sum()
                    };
                }
            }
            ChildBuffer::Partials(partials) => {
                let offset = (category * self.config.pattern_count + pattern) * s;
                let l = &partials[offset..offset + s];
                for (i, value) in out.iter_mut().enumerate() {
                    *value = p[i * s..(i + 1) * s]
                        .iter()
                        .zip(l)
                        .map(|(pij, lj)| pij * lj)
                        .sum();
                }
            }
        }
    }
}

impl LikelihoodKernel for CpuKernel {
    fn create(config: &KernelConfig) -> KernelResult<Self> {
        if config.state_count == 0 || config.category_count == 0 || config.eigen_buffer_count == 0
        {
            return Err(KernelError::new(
                KernelErrorKind::ResourceExhausted,
                format!("degenerate configuration {config:?}"),
            ));
        }
        log::debug!(
            "Creating CPU kernel: {} buffers, {} matrices, {} patterns",
            config.buffer_count(),
            config.matrix_buffer_count,
            config.pattern_count
        );
        Ok(CpuKernel {
            config: *config,
            tip_states: vec![None; config.tip_count],
            partials: vec![None; config.buffer_count()],
            matrices: vec![None; config.matrix_buffer_count],
            eigen_systems: vec![None; config.eigen_buffer_count],
            state_frequencies: vec![None; config.eigen_buffer_count],
            category_weights: vec![None; config.eigen_buffer_count],
            category_rates: vec![1.0; config.category_count],
            pattern_weights: vec![1.0; config.pattern_count],
            finalized: false,
        })
    }

    fn set_tip_states(&mut self, tip: usize, states: &[StateCode]) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(tip, self.config.tip_count, "tip")?;
        check_len(states.len(), self.config.pattern_count, "tip states")?;
        self.tip_states[tip] = Some(states.to_vec());
        self.partials[tip] = None;
        Ok(())
    }

    fn set_tip_partials(&mut self, tip: usize, partials: &[f64]) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(tip, self.config.tip_count, "tip")?;
        let per_category = self.config.pattern_count * self.config.state_count;
        check_len(partials.len(), per_category, "tip partials")?;

        let mut buffer = Vec::with_capacity(self.partials_len());
        for _ in 0..self.config.category_count {
            buffer.extend_from_slice(partials);
        }
        self.partials[tip] = Some(buffer);
        self.tip_states[tip] = None;
        Ok(())
    }

    fn set_pattern_weights(&mut self, weights: &[f64]) -> KernelResult<()> {
        self.ensure_live()?;
        check_len(weights.len(), self.config.pattern_count, "pattern weights")?;
        self.pattern_weights.copy_from_slice(weights);
        Ok(())
    }

    fn set_state_frequencies(&mut self, index: usize, frequencies: &[f64]) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(index, self.state_frequencies.len(), "frequencies")?;
        check_len(frequencies.len(), self.config.state_count, "frequencies")?;
        self.state_frequencies[index] = Some(frequencies.to_vec());
        Ok(())
    }

    fn set_category_weights(&mut self, index: usize, weights: &[f64]) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(index, self.category_weights.len(), "category weights")?;
        check_len(weights.len(), self.config.category_count, "category weights")?;
        self.category_weights[index] = Some(weights.to_vec());
        Ok(())
    }

    fn set_category_rates(&mut self, rates: &[f64]) -> KernelResult<()> {
        self.ensure_live()?;
        check_len(rates.len(), self.config.category_count, "category rates")?;
        self.category_rates.copy_from_slice(rates);
        Ok(())
    }

    fn set_eigen_decomposition(
        &mut self,
        index: usize,
        eigenvectors: &[f64],
        inverse_eigenvectors: &[f64],
        eigenvalues: &[f64],
    ) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(index, self.eigen_systems.len(), "eigen")?;
        let s = self.config.state_count;
        check_len(eigenvectors.len(), s * s, "eigenvectors")?;
        check_len(inverse_eigenvectors.len(), s * s, "inverse eigenvectors")?;
        check_len(eigenvalues.len(), s, "eigenvalues")?;
        self.eigen_systems[index] = Some(EigenSystem {
            eigenvectors: eigenvectors.to_vec(),
            inverse_eigenvectors: inverse_eigenvectors.to_vec(),
            eigenvalues: eigenvalues.to_vec(),
        });
        Ok(())
    }

    fn update_transition_matrices(
        &mut self,
        eigen_index: usize,
        matrix_indices: &[usize],
        edge_lengths: &[f64],
    ) -> KernelResult<()> {
        self.ensure_live()?;
        check_index(eigen_index, self.eigen_systems.len(), "eigen")?;
        check_len(edge_lengths.len(), matrix_indices.len(), "edge lengths")?;
        let eigen = self.eigen_systems[eigen_index]
            .as_ref()
            .ok_or_else(|| uninitialized("eigen decomposition", eigen_index))?;

        let s = self.config.state_count;
        let mut exp_values = vec![0.0; s];
        for (&index, &edge_length) in matrix_indices.iter().zip(edge_lengths) {
            check_index(index, self.config.matrix_buffer_count, "matrix")?;
            let mut matrix = self.matrices[index]
                .take()
                .unwrap_or_else(|| vec![0.0; self.config.category_count * s * s]);

            for (category, &rate) in self.category_rates.iter().enumerate() {
                let t = edge_length * rate;
                for (k, value) in exp_values.iter_mut().enumerate() {
                    *value = (eigen.eigenvalues[k] * t).exp();
                }
                let block = &mut matrix[category * s * s..(category + 1) * s * s];
                for i in 0..s {
                    for j in 0..s {
                        block[i * s + j] = (0..s)
                            .map(|k| {
                                eigen.eigenvectors[i * s + k]
                                    * exp_values[k]
                                    * eigen.inverse_eigenvectors[k * s + j]
                            })
                            .sum();
                    }
                }
            }
            self.matrices[index] = Some(matrix);
        }
        Ok(())
    }

    fn update_partials(&mut self, operations: &[PeelOperation]) -> KernelResult<()> {
        self.ensure_live()?;
        let s = self.config.state_count;
        let mut left = vec![0.0; s];
        let mut right = vec![0.0; s];

        for op in operations {
            check_index(op.destination, self.config.buffer_count(), "destination")?;
            let mut destination = self.partials[op.destination]
                .take()
                .unwrap_or_else(|| vec![0.0; self.partials_len()]);

            let result = (|| -> KernelResult<()> {
                let child1 = self.child_buffer(op.child1)?;
                let child2 = self.child_buffer(op.child2)?;
                let matrix1 = self.matrix(op.child1_matrix)?;
                let matrix2 = self.matrix(op.child2_matrix)?;

                for category in 0..self.config.category_count {
                    for pattern in 0..self.config.pattern_count {
                        self.propagate(&child1, matrix1, category, pattern, &mut left);
                        self.propagate(&child2, matrix2, category, pattern, &mut right);
                        let offset = (category * self.config.pattern_count + pattern) * s;
                        for i in 0..s {
                            destination[offset + i] = left[i] * right[i];
                        }
                    }
                }
                Ok(())
            })();

            self.partials[op.destination] = Some(destination);
            if self.tip_states.len() > op.destination {
                self.tip_states[op.destination] = None;
            }
            result?;
        }
        Ok(())
    }

    fn calculate_root_log_likelihood(
        &mut self,
        root: usize,
        category_weights_index: usize,
        state_frequencies_index: usize,
    ) -> KernelResult<f64> {
        self.ensure_live()?;
        check_index(root, self.config.buffer_count(), "root")?;
        check_index(category_weights_index, self.category_weights.len(), "category weights")?;
        check_index(state_frequencies_index, self.state_frequencies.len(), "frequencies")?;
        let partials = self.partials[root]
            .as_deref()
            .ok_or_else(|| uninitialized("buffer", root))?;
        let weights = self.category_weights[category_weights_index]
            .as_deref()
            .ok_or_else(|| uninitialized("category weights", category_weights_index))?;
        let frequencies = self.state_frequencies[state_frequencies_index]
            .as_deref()
            .ok_or_else(|| uninitialized("frequencies", state_frequencies_index))?;

        let s = self.config.state_count;
        let mut log_likelihood = 0.0;
        for pattern in 0..self.config.pattern_count {
            let site_likelihood: f64 = weights
                .iter()
                .enumerate()
                .map(|(category, weight)| {
                    let offset = (category * self.config.pattern_count + pattern) * s;
                    let l = &partials[offset..offset + s];
                    weight * frequencies.iter().zip(l).map(|(f, x)| f * x).sum::<f64>()
                })
                .sum();
            log_likelihood += self.pattern_weights[pattern] * site_likelihood.ln();
        }

        if log_likelihood.is_finite() {
            Ok(log_likelihood)
        } else {
            Err(KernelError::new(
                KernelErrorKind::NumericalFailure,
                format!("root log-likelihood is {log_likelihood}"),
            ))
        }
    }

    fn finalize(&mut self) -> KernelResult<()> {
        self.ensure_live()?;
        self.finalized = true;
        self.tip_states.clear();
        self.partials.clear();
        self.matrices.clear();
        Ok(())
    }
}
