//! Page plans: how the model kernel splits a result into pages.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Page sizes for one information result.
///
/// Sizes are consumed in order; once exhausted the last size repeats. A
/// plan never produces an empty page while objects remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PagePlan {
    /// As many records per page as the requested block length allows
    #[default]
    Fill,
    /// Fixed page sizes
    Sizes(Vec<u32>),
}

impl PagePlan {
    /// Fixed page sizes, e.g. `[2, 3]` for five objects in two pages.
    pub fn sizes(sizes: impl Into<Vec<u32>>) -> Self {
        Self::Sizes(sizes.into())
    }

    /// Random split of `total` objects into pages of 1..=`max_page`,
    /// reproducible from `seed`.
    pub fn seeded(seed: u64, total: u32, max_page: u32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_page = max_page.max(1);
        let mut left = total;
        let mut sizes = Vec::new();
        while left > 0 {
            let size = rng.gen_range(1..=max_page.min(left));
            sizes.push(size);
            left -= size;
        }
        Self::Sizes(sizes)
    }

    /// Split `total` objects, at most `capacity` per page.
    pub fn split(&self, total: u32, capacity: u32) -> Vec<u32> {
        let capacity = capacity.max(1);
        let mut pages = Vec::new();
        let mut left = total;
        let mut index = 0;
        while left > 0 {
            let wanted = match self {
                Self::Fill => capacity,
                Self::Sizes(sizes) => sizes.get(index).or(sizes.last()).copied().unwrap_or(capacity),
            };
            let size = wanted.clamp(1, capacity).min(left);
            pages.push(size);
            left -= size;
            index += 1;
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sizes_respect_capacity() {
        assert_eq!(PagePlan::sizes([2, 3]).split(5, 10), vec![2, 3]);
        assert_eq!(PagePlan::sizes([4]).split(10, 3), vec![3, 3, 3, 1]);
        assert_eq!(PagePlan::sizes([0]).split(2, 3), vec![1, 1]);
        assert_eq!(PagePlan::Fill.split(7, 3), vec![3, 3, 1]);
        assert!(PagePlan::Fill.split(0, 3).is_empty());
    }

    #[test]
    fn seeded_plans_are_reproducible() {
        let a = PagePlan::seeded(42, 50, 7);
        assert_eq!(a, PagePlan::seeded(42, 50, 7));
        let PagePlan::Sizes(sizes) = a else {
            unreachable!("seeded plans are explicit");
        };
        assert_eq!(sizes.iter().sum::<u32>(), 50);
        assert!(sizes.iter().all(|&s| (1..=7).contains(&s)));
    }
}
