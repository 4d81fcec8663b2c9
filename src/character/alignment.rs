//! Fixed-capacity alignment buffer binding sequence slots to tree nodes.

use crate::character::sequence::NucleotideSequence;
use crate::character::state::{StateCode, NUM_STATES};
use crate::error::{Error, Result};
use crate::model::NodeId;
use std::collections::HashMap;

/// Pool of `max_sequences` rows of `max_sites` columns each.
///
/// Rows are handed out to tree nodes on demand through [NucleotideAlignment::new_sequence].
/// The alignment is rectangular: a shared `num_active_sites` counter says how many
/// leading columns are real data, the rest of each row is missing-state padding.
///
/// # Invariants
/// - `num_active_sites <= max_sites`
/// - A row is bound to at most one node and a node to at most one row
/// - Every row is exactly `max_sites` long; unset columns hold the missing state
#[derive(Debug, Clone)]
pub struct NucleotideAlignment {
    max_sites: usize,
    slots: Vec<NucleotideSequence>,
    /// Free row positions; top of stack is handed out next
    available: Vec<usize>,
    slot_by_node: HashMap<NodeId, usize>,
    node_by_slot: Vec<Option<NodeId>>,
    num_active_sites: usize,
}

impl NucleotideAlignment {
    /// Allocates all rows up front, each filled with the missing state.
    pub fn new(max_sequences: usize, max_sites: usize) -> Self {
        log::debug!("Allocating alignment of {max_sequences} x {max_sites} sites");
        NucleotideAlignment {
            max_sites,
            slots: (0..max_sequences)
                .map(|_| NucleotideSequence::missing("", max_sites))
                .collect(),
            available: (0..max_sequences).rev().collect(),
            slot_by_node: HashMap::with_capacity(max_sequences),
            node_by_slot: vec![None; max_sequences],
            num_active_sites: 0,
        }
    }

    /// Binds a free row to `node`, optionally filling it from `source`.
    ///
    /// Columns beyond `source.len()` are set to the missing state. The shared
    /// active-site count grows to `source.len()` if needed and never shrinks.
    ///
    /// # Returns
    /// The position of the bound row.
    ///
    /// # Errors
    /// - [Error::NodeAlreadyBound] if `node` already has a row
    /// - [Error::SequenceTooLong] if `source` is longer than `max_sites`
    /// - [Error::TooManySequences] if no row is free
    pub fn new_sequence(
        &mut self,
        node: NodeId,
        label: &str,
        source: Option<&NucleotideSequence>,
    ) -> Result<usize> {
        if self.slot_by_node.contains_key(&node) {
            return Err(Error::NodeAlreadyBound(node));
        }
        if let Some(source) = source {
            if source.len() > self.max_sites {
                return Err(Error::SequenceTooLong {
                    len: source.len(),
                    max: self.max_sites,
                });
            }
        }
        let slot = self.available.pop().ok_or(Error::TooManySequences {
            max: self.max_sequences(),
        })?;

        self.slot_by_node.insert(node, slot);
        self.node_by_slot[slot] = Some(node);

        let row = &mut self.slots[slot];
        row.set_label(label);
        match source {
            Some(source) => {
                row.overwrite_padded(source);
                self.num_active_sites = self.num_active_sites.max(source.len());
            }
            None => row.fill_missing_from(0),
        }

        Ok(slot)
    }

    /// Unbinds the row of `node`, resets it to missing states and returns it to the pool.
    ///
    /// # Errors
    /// [Error::NodeNotBound] if `node` has no row.
    pub fn release_sequence(&mut self, node: NodeId) -> Result<()> {
        let slot = self
            .slot_by_node
            .remove(&node)
            .ok_or(Error::NodeNotBound(node))?;
        self.node_by_slot[slot] = None;
        let row = &mut self.slots[slot];
        row.set_label("");
        row.fill_missing_from(0);
        self.available.push(slot);
        Ok(())
    }

    /// Releases every row and resets the active-site count.
    pub fn clear(&mut self) {
        let bound: Vec<NodeId> = self.slot_by_node.keys().copied().collect();
        for node in bound {
            // Keys come from the map itself
            let _ = self.release_sequence(node);
        }
        self.num_active_sites = 0;
    }

    pub fn max_sequences(&self) -> usize {
        self.slots.len()
    }

    pub fn max_sites(&self) -> usize {
        self.max_sites
    }

    /// Returns the number of rows currently bound to a node.
    pub fn num_bound(&self) -> usize {
        self.slot_by_node.len()
    }

    pub fn num_active_sites(&self) -> usize {
        self.num_active_sites
    }

    /// Sets the number of leading columns treated as data.
    ///
    /// # Errors
    /// [Error::SequenceTooLong] if `num_sites` exceeds `max_sites`.
    pub fn set_num_active_sites(&mut self, num_sites: usize) -> Result<()> {
        if num_sites > self.max_sites {
            return Err(Error::SequenceTooLong {
                len: num_sites,
                max: self.max_sites,
            });
        }
        self.num_active_sites = num_sites;
        Ok(())
    }

    /// Returns the row position bound to `node`.
    pub fn slot_of(&self, node: NodeId) -> Option<usize> {
        self.slot_by_node.get(&node).copied()
    }

    /// Returns the node bound to the row at `slot`.
    pub fn node_of(&self, slot: usize) -> Option<NodeId> {
        self.node_by_slot.get(slot).copied().flatten()
    }

    /// Returns the full-width row bound to `node`.
    pub fn sequence(&self, node: NodeId) -> Option<&NucleotideSequence> {
        self.slot_of(node).map(|slot| &self.slots[slot])
    }

    /// Returns the first `num_active_sites` states of `node`'s row.
    pub fn active_states(&self, node: NodeId) -> Option<&[StateCode]> {
        self.sequence(node)
            .map(|row| &row.states()[..self.num_active_sites])
    }

    /// Returns the partials of the first `num_active_sites` columns of `node`'s row.
    pub fn active_partials(&self, node: NodeId) -> Option<&[f64]> {
        self.sequence(node)
            .map(|row| &row.partials()[..NUM_STATES * self.num_active_sites])
    }

    /// Iterates over `(node, row)` pairs of all bound rows, in row order.
    pub fn bound_sequences(&self) -> impl Iterator<Item = (NodeId, &NucleotideSequence)> {
        self.node_by_slot
            .iter()
            .zip(&self.slots)
            .filter_map(|(node, row)| node.map(|node| (node, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_handed_out_in_order() {
        let mut alignment = NucleotideAlignment::new(3, 4);
        assert_eq!(alignment.new_sequence(10, "a", None).unwrap(), 0);
        assert_eq!(alignment.new_sequence(11, "b", None).unwrap(), 1);
        assert_eq!(alignment.node_of(1), Some(11));
        assert_eq!(alignment.node_of(2), None);
    }

    #[test]
    fn test_release_recycles_row() {
        let mut alignment = NucleotideAlignment::new(1, 4);
        let source = NucleotideSequence::from_symbols("a", "ACGT").unwrap();
        let slot = alignment.new_sequence(3, "a", Some(&source)).unwrap();
        alignment.release_sequence(3).unwrap();

        assert_eq!(alignment.num_bound(), 0);
        assert_eq!(alignment.new_sequence(4, "b", None).unwrap(), slot);
        assert_eq!(alignment.sequence(4).unwrap().states(), &[4, 4, 4, 4]);
        assert!(matches!(
            alignment.release_sequence(3),
            Err(Error::NodeNotBound(3))
        ));
    }
}
