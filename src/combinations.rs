use smallvec::SmallVec;

/// Iterates over every way of choosing `k` positions out of `n`, in lexicographic order.
///
/// Each combination is a strictly ascending list of positions. Starting from `0..k`, every step
/// advances the rightmost position that still has room and resets all positions after it to
/// follow on consecutively.
///
/// ```
/// use hug_miner::Combinations;
///
/// let all: Vec<Vec<usize>> = Combinations::new(4, 2).map(|c| c.to_vec()).collect();
/// assert_eq!(
///     all,
///     vec![
///         vec![0, 1],
///         vec![0, 2],
///         vec![0, 3],
///         vec![1, 2],
///         vec![1, 3],
///         vec![2, 3],
///     ]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Combinations {
    n: usize,
    positions: SmallVec<[usize; 8]>,
    done: bool,
}

impl Combinations {
    /// Creates an iterator over the `k`-element combinations of `n` positions.
    ///
    /// If `k > n` there are no combinations. If `k == 0` there is exactly one, which is empty.
    pub fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            positions: (0..k).collect(),
            done: k > n,
        }
    }

    fn advance(&mut self) {
        let k = self.positions.len();
        // Position i can hold at most n - k + i, leaving room for everything after it.
        match (0..k).rev().find(|&i| self.positions[i] < self.n - k + i) {
            Some(i) => {
                self.positions[i] += 1;
                for j in i + 1..k {
                    self.positions[j] = self.positions[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
    }
}

impl Iterator for Combinations {
    type Item = SmallVec<[usize; 8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.positions.clone();
        self.advance();
        Some(current)
    }
}

impl std::iter::FusedIterator for Combinations {}
