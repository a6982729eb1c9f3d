use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config;

// Essential gene indices. Everything past REPRODUCTION_THRESHOLD is junk.
pub const GENE_SIZE: usize = 0;
pub const GENE_RED: usize = 1;
pub const GENE_GREEN: usize = 2;
pub const GENE_BLUE: usize = 3;
pub const GENE_MOVEMENT: usize = 4;
pub const GENE_PHOTOSYNTHESIS: usize = 5;
pub const GENE_DIGESTION: usize = 6;
pub const GENE_REPRODUCTION_THRESHOLD: usize = 7;

const MIN_REPRODUCTION_THRESHOLD: f32 = 0.3;
const MAX_REPRODUCTION_THRESHOLD: f32 = 0.9;

/// Variable-length genome. Every gene is normalized to [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub genes: Vec<f32>,
}

/// Gene-level mutation operators, in the order weights are accumulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    PointMutation,
    Deletion,
    Duplication,
    Inversion,
    Translocation,
    Insertion,
}

impl MutationKind {
    pub const ALL: [MutationKind; 6] = [
        MutationKind::PointMutation,
        MutationKind::Deletion,
        MutationKind::Duplication,
        MutationKind::Inversion,
        MutationKind::Translocation,
        MutationKind::Insertion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PointMutation => "PointMutation",
            Self::Deletion => "Deletion",
            Self::Duplication => "Duplication",
            Self::Inversion => "Inversion",
            Self::Translocation => "Translocation",
            Self::Insertion => "Insertion",
        }
    }
}

/// Relative weights used to pick a mutation operator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationWeights(pub Vec<(MutationKind, f32)>);

impl Default for MutationWeights {
    fn default() -> Self {
        Self(vec![
            (MutationKind::PointMutation, 0.6),
            (MutationKind::Deletion, 0.1),
            (MutationKind::Duplication, 0.1),
            (MutationKind::Inversion, 0.1),
            (MutationKind::Translocation, 0.05),
            (MutationKind::Insertion, 0.05),
        ])
    }
}

impl MutationWeights {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn only(kind: MutationKind) -> Self {
        Self(vec![(kind, 1.0)])
    }

    pub fn weight(&self, kind: MutationKind) -> f32 {
        self.0
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn set_weight(&mut self, kind: MutationKind, weight: f32) {
        match self.0.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = weight,
            None => self.0.push((kind, weight)),
        }
    }

    pub fn total(&self) -> f32 {
        self.0.iter().map(|(_, w)| w.max(0.0)).sum()
    }

    /// Weighted pick: the first operator whose cumulative weight reaches the draw.
    pub fn choose(&self, rng: &mut impl Rng) -> MutationKind {
        let total = self.total();
        if self.0.is_empty() || total <= 0.0 {
            return MutationKind::PointMutation;
        }
        let draw = rng.gen_range(0.0..=total);
        let mut cumulative = 0.0;
        for &(kind, weight) in &self.0 {
            cumulative += weight.max(0.0);
            if cumulative >= draw {
                return kind;
            }
        }
        MutationKind::PointMutation
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

impl Genome {
    pub fn new(genes: Vec<f32>) -> Self {
        Self { genes }
    }

    /// Random genome carrying exactly the essential genes.
    pub fn random(rng: &mut impl Rng) -> Self {
        let genes = (0..config::ESSENTIAL_GENE_COUNT)
            .map(|_| rng.gen_range(0.0..=1.0))
            .collect();
        Self { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn gene(&self, index: usize) -> Option<f32> {
        self.genes.get(index).copied()
    }

    // --- Derived traits ---

    /// Body size in [0, MAX_ORGANISM_SIZE]; 0 when the size gene is missing.
    pub fn size(&self) -> f32 {
        self.gene(GENE_SIZE)
            .map(|g| lerp(0.0, config::MAX_ORGANISM_SIZE, g))
            .unwrap_or(0.0)
    }

    pub fn radius(&self) -> f32 {
        self.size() * 0.5
    }

    fn channel(&self, index: usize) -> u8 {
        self.gene(index)
            .map(|g| (g.clamp(0.0, 1.0) * 255.0) as u8)
            .unwrap_or(0)
    }

    pub fn red(&self) -> u8 {
        self.channel(GENE_RED)
    }

    pub fn green(&self) -> u8 {
        self.channel(GENE_GREEN)
    }

    pub fn blue(&self) -> u8 {
        self.channel(GENE_BLUE)
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.red(), self.green(), self.blue()]
    }

    /// Movement speed in [0, 1].
    pub fn movement_speed(&self) -> f32 {
        self.gene(GENE_MOVEMENT).unwrap_or(0.0)
    }

    pub fn photosynthesis_efficiency(&self) -> f32 {
        self.gene(GENE_PHOTOSYNTHESIS).unwrap_or(0.0)
    }

    pub fn can_photosynthesize(&self) -> bool {
        self.photosynthesis_efficiency() >= config::PHOTOSYNTHESIS_THRESHOLD
    }

    /// Herbivore (-1) to carnivore (+1).
    pub fn digestion_spectrum(&self) -> f32 {
        self.gene(GENE_DIGESTION)
            .map(|g| lerp(-1.0, 1.0, g))
            .unwrap_or(0.0)
    }

    /// Fraction of max energy required before reproducing; `None` means infertile.
    pub fn reproduction_threshold(&self) -> Option<f32> {
        self.gene(GENE_REPRODUCTION_THRESHOLD)
            .map(|g| lerp(MIN_REPRODUCTION_THRESHOLD, MAX_REPRODUCTION_THRESHOLD, g))
    }

    pub fn is_viable(&self) -> bool {
        self.size() > 0.0 && self.gene(GENE_DIGESTION).is_some()
    }

    pub fn is_fertile(&self) -> bool {
        self.gene(GENE_REPRODUCTION_THRESHOLD).is_some()
    }

    // --- Mutation engine ---

    /// Copy this genome for an offspring, mutating it once with probability `mutation_rate`.
    /// Returns `None` for infertile genomes. Viability of the result is not checked here.
    pub fn reproduce(
        &self,
        mutation_rate: f32,
        weights: &MutationWeights,
        rng: &mut impl Rng,
    ) -> Option<Genome> {
        if !self.is_fertile() {
            return None;
        }
        let mut child = self.clone();
        if rng.gen::<f32>() < mutation_rate {
            let kind = weights.choose(rng);
            child.mutate(kind, rng);
        }
        Some(child)
    }

    pub fn mutate(&mut self, kind: MutationKind, rng: &mut impl Rng) {
        match kind {
            MutationKind::PointMutation => self.point_mutation(rng),
            MutationKind::Deletion => self.deletion(rng),
            MutationKind::Duplication => self.duplication(rng),
            MutationKind::Inversion => self.inversion(rng),
            MutationKind::Translocation => self.translocation(rng),
            MutationKind::Insertion => self.insertion(rng),
        }
    }

    /// Random `(start, len)` with `len` in [min_len, min(max_len, remaining)].
    fn random_window(
        &self,
        min_len: usize,
        max_len: usize,
        rng: &mut impl Rng,
    ) -> (usize, usize) {
        let start = rng.gen_range(0..=self.genes.len() - min_len);
        let remaining = self.genes.len() - start;
        let len = rng.gen_range(min_len..=max_len.min(remaining));
        (start, len)
    }

    fn point_mutation(&mut self, rng: &mut impl Rng) {
        if self.genes.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.genes.len());
        let spread = config::POINT_MUTATION_SPREAD;
        let gene = &mut self.genes[idx];
        *gene = (*gene + rng.gen_range(-spread..=spread)).clamp(0.0, 1.0);
    }

    fn deletion(&mut self, rng: &mut impl Rng) {
        if self.genes.len() <= 1 {
            return;
        }
        let (start, len) = self.random_window(1, 3, rng);
        self.genes.drain(start..start + len);
    }

    fn duplication(&mut self, rng: &mut impl Rng) {
        if self.genes.is_empty() {
            return;
        }
        let (start, len) = self.random_window(1, 3, rng);
        let copy: Vec<f32> = self.genes[start..start + len].to_vec();
        let at = rng.gen_range(0..=self.genes.len());
        self.genes.splice(at..at, copy);
    }

    fn inversion(&mut self, rng: &mut impl Rng) {
        if self.genes.len() < 2 {
            return;
        }
        let (start, len) = self.random_window(2, 4, rng);
        self.genes[start..start + len].reverse();
    }

    fn translocation(&mut self, rng: &mut impl Rng) {
        if self.genes.len() < 3 {
            return;
        }
        let (start, len) = self.random_window(1, 3, rng);
        let segment: Vec<f32> = self.genes.drain(start..start + len).collect();
        let at = rng.gen_range(0..=self.genes.len());
        self.genes.splice(at..at, segment);
    }

    fn insertion(&mut self, rng: &mut impl Rng) {
        let at = rng.gen_range(0..=self.genes.len());
        self.genes.insert(at, rng.gen_range(0.0..=1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn sorted(mut genes: Vec<f32>) -> Vec<f32> {
        genes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        genes
    }

    prop_compose! {
        fn arb_genes(min: usize, max: usize)(
            genes in prop::collection::vec(0.0f32..=1.0, min..max)
        ) -> Vec<f32> {
            genes
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn derived_traits_stay_in_range(genes in arb_genes(0, 12)) {
            let g = Genome::new(genes);
            prop_assert!((0.0..=config::MAX_ORGANISM_SIZE).contains(&g.size()));
            prop_assert!((0.0..=1.0).contains(&g.movement_speed()));
            prop_assert!((-1.0..=1.0).contains(&g.digestion_spectrum()));
            if let Some(t) = g.reproduction_threshold() {
                let range = MIN_REPRODUCTION_THRESHOLD..=MAX_REPRODUCTION_THRESHOLD;
                prop_assert!(range.contains(&t));
            }
        }

        #[test]
        fn point_mutation_keeps_length(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::PointMutation, &mut rng);
            prop_assert_eq!(g.len(), genes.len());
            prop_assert!(g.genes.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        #[test]
        fn deletion_removes_one_to_three(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::Deletion, &mut rng);
            if genes.len() <= 1 {
                prop_assert_eq!(g.len(), genes.len());
            } else {
                let removed = genes.len() - g.len();
                prop_assert!((1..=3).contains(&removed));
            }
        }

        #[test]
        fn duplication_adds_one_to_three(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::Duplication, &mut rng);
            if genes.is_empty() {
                prop_assert!(g.is_empty());
            } else {
                let added = g.len() - genes.len();
                prop_assert!((1..=3).contains(&added));
            }
        }

        #[test]
        fn inversion_only_reorders(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::Inversion, &mut rng);
            prop_assert_eq!(g.len(), genes.len());
            prop_assert_eq!(sorted(g.genes.clone()), sorted(genes));
        }

        #[test]
        fn translocation_preserves_multiset(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::Translocation, &mut rng);
            prop_assert_eq!(g.len(), genes.len());
            prop_assert_eq!(sorted(g.genes.clone()), sorted(genes));
        }

        #[test]
        fn insertion_adds_exactly_one(genes in arb_genes(0, 16), seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut g = Genome::new(genes.clone());
            g.mutate(MutationKind::Insertion, &mut rng);
            prop_assert_eq!(g.len(), genes.len() + 1);
        }

        #[test]
        fn missing_size_or_digestion_is_never_viable(genes in arb_genes(0, 6)) {
            // Fewer than 7 genes means index 6 is absent.
            prop_assert!(!Genome::new(genes).is_viable());
        }
    }

    #[test]
    fn zero_size_gene_is_not_viable() {
        let g = Genome::new(vec![0.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]);
        assert_eq!(g.size(), 0.0);
        assert!(!g.is_viable());
    }

    #[test]
    fn missing_optional_genes_fall_back_to_defaults() {
        let g = Genome::new(vec![0.5]);
        assert_eq!(g.size(), 10.0);
        assert_eq!(g.rgb(), [0, 0, 0]);
        assert_eq!(g.movement_speed(), 0.0);
        assert!(!g.can_photosynthesize());
        assert_eq!(g.reproduction_threshold(), None);
        assert!(!g.is_fertile());
        assert!(!g.is_viable());
    }

    #[test]
    fn photosynthesis_threshold_is_inclusive() {
        let mut genes = vec![0.5; 8];
        genes[GENE_PHOTOSYNTHESIS] = 0.7;
        assert!(Genome::new(genes.clone()).can_photosynthesize());
        genes[GENE_PHOTOSYNTHESIS] = 0.69;
        assert!(!Genome::new(genes).can_photosynthesize());
    }

    #[test]
    fn infertile_genome_produces_no_offspring() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let g = Genome::new(vec![0.5; 7]);
        assert!(g
            .reproduce(1.0, &MutationWeights::default(), &mut rng)
            .is_none());
    }

    #[test]
    fn reproduce_without_mutation_is_an_exact_copy() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let g = Genome::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
        let child = g.reproduce(0.0, &MutationWeights::default(), &mut rng).unwrap();
        assert_eq!(child, g);
    }

    #[test]
    fn empty_weights_fall_back_to_point_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(
                MutationWeights::empty().choose(&mut rng),
                MutationKind::PointMutation
            );
        }
        let zeroed = MutationWeights(vec![(MutationKind::Insertion, 0.0)]);
        assert_eq!(zeroed.choose(&mut rng), MutationKind::PointMutation);
    }

    #[test]
    fn single_weighted_operator_is_always_chosen() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let weights = MutationWeights(vec![
            (MutationKind::PointMutation, 0.0),
            (MutationKind::Inversion, 1.0),
        ]);
        let mut inversions = 0;
        for _ in 0..200 {
            if weights.choose(&mut rng) == MutationKind::Inversion {
                inversions += 1;
            }
        }
        // Only a draw of exactly 0.0 could select the zero-weight entry.
        assert!(inversions >= 199);
    }

    #[test]
    fn inversion_on_two_genes_swaps_them() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut g = Genome::new(vec![0.1, 0.9]);
        g.mutate(MutationKind::Inversion, &mut rng);
        assert_eq!(g.genes, vec![0.9, 0.1]);
    }

    #[test]
    fn translocation_needs_three_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut g = Genome::new(vec![0.1, 0.9]);
        g.mutate(MutationKind::Translocation, &mut rng);
        assert_eq!(g.genes, vec![0.1, 0.9]);
    }

    #[test]
    fn insertion_into_empty_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut g = Genome::new(Vec::new());
        g.mutate(MutationKind::Insertion, &mut rng);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn serialized_genome_restores_identical_traits() {
        let g = Genome::new(vec![0.75, 0.5, 0.25, 0.125, 0.375, 0.875, 0.625, 0.0625, 0.5]);
        let json = serde_json::to_string(&g).unwrap();
        let restored: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.size(), g.size());
        assert_eq!(restored.rgb(), g.rgb());
        assert_eq!(restored.movement_speed(), g.movement_speed());
        assert_eq!(restored.digestion_spectrum(), g.digestion_spectrum());
        assert_eq!(restored.reproduction_threshold(), g.reproduction_threshold());
        assert_eq!(restored.is_viable(), g.is_viable());
    }
}
