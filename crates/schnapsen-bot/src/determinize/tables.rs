/// Pascal's triangle and factorials up to a fixed size, in `u128`.
///
/// Exact for up to 34 cards; larger inputs saturate.
#[derive(Debug, Clone)]
pub(crate) struct CombinatoricsTable {
    binomial: Vec<Vec<u128>>,
    factorial: Vec<u128>,
}

impl CombinatoricsTable {
    pub(crate) fn new(size: usize) -> Self {
        let mut binomial = vec![vec![0u128; size + 1]; size + 1];
        for n in 0..=size {
            binomial[n][0] = 1;
            for k in 1..=n {
                binomial[n][k] = binomial[n - 1][k - 1].saturating_add(binomial[n - 1][k]);
            }
        }
        let mut factorial = vec![1u128; size + 1];
        for n in 1..=size {
            factorial[n] = factorial[n - 1].saturating_mul(n as u128);
        }
        Self {
            binomial,
            factorial,
        }
    }

    pub(crate) fn choose(&self, n: usize, k: usize) -> u128 {
        if k > n {
            0
        } else {
            self.binomial[n][k]
        }
    }

    pub(crate) fn factorial(&self, n: usize) -> u128 {
        self.factorial[n]
    }

    /// The `rank`-th `k`-subset of `0..n` in lexicographic order.
    pub(crate) fn unrank_combination(&self, mut rank: u128, n: usize, k: usize) -> Vec<usize> {
        let mut chosen = Vec::with_capacity(k);
        let mut candidate = 0;
        for slot in 0..k {
            loop {
                let remaining = k - slot - 1;
                let with_candidate = self.choose(n - candidate - 1, remaining);
                if rank < with_candidate {
                    chosen.push(candidate);
                    candidate += 1;
                    break;
                }
                rank -= with_candidate;
                candidate += 1;
            }
        }
        chosen
    }

    /// Reorders `items` into their `rank`-th lexicographic permutation.
    pub(crate) fn unrank_permutation<T>(&self, mut rank: u128, mut items: Vec<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(items.len());
        while !items.is_empty() {
            let block = self.factorial(items.len() - 1);
            let index = (rank / block) as usize;
            rank %= block;
            out.push(items.remove(index));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::CombinatoricsTable;

    #[test]
    fn binomials_and_factorials() {
        let table = CombinatoricsTable::new(10);
        assert_eq!(table.choose(6, 4), 15);
        assert_eq!(table.choose(4, 6), 0);
        assert_eq!(table.factorial(6), 720);
    }

    #[test]
    fn combinations_unrank_in_lexicographic_order() {
        let table = CombinatoricsTable::new(5);
        assert_eq!(table.unrank_combination(0, 5, 2), vec![0, 1]);
        assert_eq!(table.unrank_combination(3, 5, 2), vec![0, 4]);
        assert_eq!(table.unrank_combination(4, 5, 2), vec![1, 2]);
        assert_eq!(table.unrank_combination(9, 5, 2), vec![3, 4]);
        assert!(table.unrank_combination(0, 5, 0).is_empty());
    }

    #[test]
    fn permutations_unrank_in_lexicographic_order() {
        let table = CombinatoricsTable::new(4);
        assert_eq!(table.unrank_permutation(0, vec!['a', 'b', 'c']), vec!['a', 'b', 'c']);
        assert_eq!(table.unrank_permutation(3, vec!['a', 'b', 'c']), vec!['b', 'c', 'a']);
        assert_eq!(table.unrank_permutation(5, vec!['a', 'b', 'c']), vec!['c', 'b', 'a']);
    }
}
