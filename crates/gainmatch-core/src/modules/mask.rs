//! Known-defective ring/wedge pairs, per SABRE board.
//!
//! A board entry can drop whole rings, whole wedges, or single pairs. Boards
//! without an entry keep every pair.

use super::slopes::all_pairs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardExclusions {
    pub board: usize,
    pub rings: &'static [usize],
    pub wedges: &'static [usize],
    pub pairs: &'static [(usize, usize)],
}

impl BoardExclusions {
    fn excludes(&self, ring: usize, wedge: usize) -> bool {
        self.rings.contains(&ring)
            || self.wedges.contains(&wedge)
            || self.pairs.contains(&(ring, wedge))
    }
}

pub const BAD_CHANNEL_TABLE: [BoardExclusions; 3] = [
    BoardExclusions {
        board: 1,
        rings: &[13],
        wedges: &[],
        pairs: &[],
    },
    BoardExclusions {
        board: 2,
        rings: &[],
        wedges: &[1],
        pairs: &[],
    },
    BoardExclusions {
        board: 4,
        rings: &[1],
        wedges: &[4],
        pairs: &[],
    },
];

pub fn is_excluded(board: usize, ring: usize, wedge: usize) -> bool {
    BadChannelMask::for_board(board).excludes(ring, wedge)
}

/// The exclusion rules of one board, resolved once from [`BAD_CHANNEL_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadChannelMask {
    board: usize,
    rules: Option<&'static BoardExclusions>,
}

impl BadChannelMask {
    pub fn for_board(board: usize) -> Self {
        Self::from_table(board, &BAD_CHANNEL_TABLE)
    }

    pub fn from_table(board: usize, table: &'static [BoardExclusions]) -> Self {
        Self {
            board,
            rules: table.iter().find(|entry| entry.board == board),
        }
    }

    pub fn board(&self) -> usize {
        self.board
    }

    pub fn excludes(&self, ring: usize, wedge: usize) -> bool {
        self.rules.is_some_and(|rules| rules.excludes(ring, wedge))
    }

    pub fn excluded_pairs(&self) -> Vec<(usize, usize)> {
        all_pairs()
            .filter(|&(ring, wedge)| self.excludes(ring, wedge))
            .collect()
    }
}
