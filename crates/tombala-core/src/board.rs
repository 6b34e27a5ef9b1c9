// Player boards: 15 distinct numbers laid out as 3 rows of 5.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

pub const ROWS: usize = 3;
pub const ROW_LEN: usize = 5;
/// Distinct numbers on one board.
pub const BOARD_SIZE: usize = ROWS * ROW_LEN;

/// An immutable player board. Each row is sorted ascending; rows carry no
/// ordering relative to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: [[u8; ROW_LEN]; ROWS],
}

impl Board {
    /// Sample a fresh board from `1..=max_number`.
    ///
    /// The 15 numbers are drawn uniformly without replacement, split into
    /// three groups of five in sample order, and each group is sorted.
    pub fn generate<R: Rng + ?Sized>(max_number: u8, rng: &mut R) -> Result<Self, BoardError> {
        if usize::from(max_number) < BOARD_SIZE {
            return Err(BoardError::RangeTooSmall {
                max_number,
                required: BOARD_SIZE,
            });
        }

        let mut range: Vec<u8> = (1..=max_number).collect();
        let (sample, _) = range.partial_shuffle(rng, BOARD_SIZE);

        let mut rows = [[0u8; ROW_LEN]; ROWS];
        for (row, group) in rows.iter_mut().zip(sample.chunks_exact(ROW_LEN)) {
            row.copy_from_slice(group);
            row.sort_unstable();
        }

        Ok(Board { rows })
    }

    pub fn rows(&self) -> &[[u8; ROW_LEN]; ROWS] {
        &self.rows
    }

    /// All 15 numbers in row-major order.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().flatten().copied()
    }

    /// Indices of the rows whose five numbers are all in `marked`.
    pub fn completed_rows(&self, marked: &BTreeSet<u8>) -> BTreeSet<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|n| marked.contains(n)))
            .map(|(idx, _)| idx)
            .collect()
    }
}
