// The shared number pool: what is still undrawn and what was drawn, in order.

use rand::Rng;

/// Tracks the numbers `1..=max_number`. Every number is always in exactly
/// one of `available` or `drawn`.
#[derive(Debug, Clone)]
pub struct DrawPool {
    max_number: u8,
    /// Undrawn numbers. Order carries no meaning.
    available: Vec<u8>,
    drawn: Vec<u8>,
}

impl DrawPool {
    pub fn new(max_number: u8) -> Self {
        DrawPool {
            max_number,
            available: (1..=max_number).collect(),
            drawn: Vec::with_capacity(usize::from(max_number)),
        }
    }

    /// Move one uniformly chosen undrawn number to the end of the drawn
    /// sequence and return it. Returns `None` without touching anything once
    /// the pool is exhausted.
    pub fn draw_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u8> {
        if self.available.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.available.len());
        let number = self.available.swap_remove(idx);
        self.drawn.push(number);
        Some(number)
    }

    /// Put every number back and forget the drawn sequence.
    pub fn reset(&mut self) {
        self.available = (1..=self.max_number).collect();
        self.drawn.clear();
    }

    pub fn drawn(&self) -> &[u8] {
        &self.drawn
    }

    pub fn available(&self) -> &[u8] {
        &self.available
    }

    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    pub fn max_number(&self) -> u8 {
        self.max_number
    }
}
