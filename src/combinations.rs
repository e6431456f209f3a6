/// Binomial coefficient `C(n, k)`, saturating at `usize::MAX`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1_usize, |acc, i| {
        // exact at every step since acc * (n - i) is divisible by (i + 1)
        acc.saturating_mul(n - i) / (i + 1)
    })
}

/// The `rank`-th `k`-combination of `0..n` in lexicographic order.
pub fn unrank(mut rank: usize, k: usize, n: usize) -> Option<Vec<usize>> {
    if rank >= binomial(n, k) {
        return None;
    }
    let mut combination = Vec::with_capacity(k);
    let mut next = 0;
    for remaining in (1..=k).rev() {
        loop {
            let with_next = binomial(n - next - 1, remaining - 1);
            if rank < with_next {
                break;
            }
            rank -= with_next;
            next += 1;
        }
        combination.push(next);
        next += 1;
    }
    Some(combination)
}

/// Iterator over all `k`-combinations of `0..n` in lexicographic (rank)
/// order. Only the current combination is kept in memory.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    rank: usize,
    total: usize,
    current: Vec<usize>,
}

impl Combinations {
    /// All `k`-subsets of `0..n`.
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            rank: 0,
            total: binomial(n, k),
            current: (0..k).collect(),
        }
    }

    fn advance(&mut self) {
        let (n, k) = (self.n, self.k);
        if let Some(i) = (0..k).rev().find(|&i| self.current[i] < n - k + i) {
            self.current[i] += 1;
            for j in i + 1..k {
                self.current[j] = self.current[j - 1] + 1;
            }
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rank >= self.total {
            return None;
        }
        let combination = self.current.clone();
        self.rank += 1;
        if self.rank < self.total {
            self.advance();
        }
        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.rank;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let rank = self.rank.saturating_add(n);
        match unrank(rank, self.k, self.n) {
            Some(combination) => {
                self.rank = rank;
                self.current = combination;
                self.next()
            }
            None => {
                self.rank = self.total;
                None
            }
        }
    }
}

impl ExactSizeIterator for Combinations {}
