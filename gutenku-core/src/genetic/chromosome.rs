//! Haiku genome: indices into the five/seven/five syllable pools

use crate::types::{Quote, VersePools};
use rand::Rng;

/// Pool sizes bounding each gene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneBounds {
    pub five: usize,
    pub seven: usize,
}

impl GeneBounds {
    pub fn of(pools: &VersePools) -> Self {
        Self {
            five: pools.five_syllable.len(),
            seven: pools.seven_syllable.len(),
        }
    }

    /// Exclusive upper bound for the gene at `position`
    pub fn limit(&self, position: usize) -> usize {
        if position == 1 {
            self.seven
        } else {
            self.five
        }
    }

    /// Whether any genome can be built at all
    pub fn is_viable(&self) -> bool {
        self.five > 0 && self.seven > 0
    }

    /// Number of distinct genomes
    pub fn search_space(&self) -> usize {
        self.five.saturating_mul(self.five).saturating_mul(self.seven)
    }
}

/// Three genes: five-syllable, seven-syllable, five-syllable pool index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chromosome {
    genes: [usize; 3],
}

impl Chromosome {
    pub fn new(genes: [usize; 3]) -> Self {
        Self { genes }
    }

    pub fn random<R: Rng + ?Sized>(bounds: GeneBounds, rng: &mut R) -> Self {
        Self {
            genes: [
                rng.gen_range(0..bounds.five),
                rng.gen_range(0..bounds.seven),
                rng.gen_range(0..bounds.five),
            ],
        }
    }

    pub fn genes(&self) -> [usize; 3] {
        self.genes
    }

    pub(crate) fn set_gene(&mut self, position: usize, value: usize) {
        self.genes[position] = value;
    }

    pub(crate) fn swap_outer(&mut self) {
        self.genes.swap(0, 2);
    }

    /// Resolve the genome to its quotes
    pub fn quotes<'a>(&self, pools: &'a VersePools) -> Option<[&'a Quote; 3]> {
        Some([
            pools.five_syllable.get(self.genes[0])?,
            pools.seven_syllable.get(self.genes[1])?,
            pools.five_syllable.get(self.genes[2])?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pools() -> VersePools {
        VersePools {
            five_syllable: vec![
                Quote::new("an old silent pond", 0, 5),
                Quote::new("silence returns now", 2, 5),
            ],
            seven_syllable: vec![Quote::new("a frog jumps into the pond", 1, 7)],
        }
    }

    #[test]
    fn test_random_respects_bounds() {
        let bounds = GeneBounds { five: 3, seven: 2 };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let genes = Chromosome::random(bounds, &mut rng).genes();
            assert!(genes[0] < 3 && genes[2] < 3);
            assert!(genes[1] < 2);
        }
    }

    #[test]
    fn test_quotes_resolves_pools() {
        let pools = pools();
        let quotes = Chromosome::new([1, 0, 0]).quotes(&pools).unwrap();
        assert_eq!(quotes[0].text, "silence returns now");
        assert_eq!(quotes[1].syllable_count, 7);
        assert!(Chromosome::new([0, 3, 0]).quotes(&pools).is_none());
    }

    #[test]
    fn test_bounds() {
        let bounds = GeneBounds::of(&pools());
        assert_eq!(bounds.limit(0), 2);
        assert_eq!(bounds.limit(1), 1);
        assert_eq!(bounds.search_space(), 4);
        assert!(bounds.is_viable());
        assert!(!GeneBounds { five: 0, seven: 4 }.is_viable());
    }
}
