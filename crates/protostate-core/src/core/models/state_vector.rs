use super::site::Site;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateVectorError {
    #[error("Site {site} has no instances")]
    EmptySite { site: usize },

    #[error("Failed to allocate storage for {count} sites")]
    Allocation { count: usize },

    #[error("Site index {site} is out of range for a vector of {n_sites} sites")]
    SiteOutOfRange { site: usize, n_sites: usize },

    #[error("Instance {instance} does not belong to site {site}")]
    InstanceOutsideSite { site: usize, instance: usize },
}

/// An ordered sequence of sites behaving as a mixed-radix odometer over the joint instance
/// space.
///
/// Site 0 is the fastest-varying digit. The vector stores no global counter: the current
/// microstate is implied by the per-site active indices, and [`StateVector::index`] recovers
/// its coordinate in `[0, n_states)` when needed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateVector {
    sites: Vec<Site>,
}

impl StateVector {
    /// Lays out contiguous, disjoint instance blocks, one per entry of `site_sizes`, starting
    /// at global instance 0.
    pub fn from_site_sizes(site_sizes: &[usize]) -> Result<Self, StateVectorError> {
        let mut sites = Vec::new();
        sites
            .try_reserve_exact(site_sizes.len())
            .map_err(|_| StateVectorError::Allocation {
                count: site_sizes.len(),
            })?;

        let mut first = 0;
        for (site, &count) in site_sizes.iter().enumerate() {
            if count == 0 {
                return Err(StateVectorError::EmptySite { site });
            }
            sites.push(Site::spanning(first, count));
            first += count;
        }

        Ok(Self { sites })
    }

    #[inline]
    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    /// Total number of instances covered by all sites.
    pub fn n_instances(&self) -> usize {
        self.sites.last().map_or(0, |site| site.last() + 1)
    }

    /// Number of microstates, the product of the site radices. `None` if it does not fit in
    /// `usize`.
    pub fn n_states(&self) -> Option<usize> {
        self.sites
            .iter()
            .try_fold(1usize, |acc, site| acc.checked_mul(site.len()))
    }

    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub(crate) fn sites_mut(&mut self) -> &mut [Site] {
        &mut self.sites
    }

    pub fn site(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    /// Active instance of every site, in site order. Cloneable so pairs can be walked.
    pub fn actives(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        self.sites.iter().map(Site::active)
    }

    pub fn set_active(&mut self, site: usize, instance: usize) -> Result<(), StateVectorError> {
        let n_sites = self.sites.len();
        let target = self
            .sites
            .get_mut(site)
            .ok_or(StateVectorError::SiteOutOfRange { site, n_sites })?;
        if target.set_active(instance) {
            Ok(())
        } else {
            Err(StateVectorError::InstanceOutsideSite { site, instance })
        }
    }

    /// Two vectors conform when they have the same number of sites with identical instance
    /// blocks. Active indices are not compared.
    pub fn conforms_to(&self, other: &StateVector) -> bool {
        self.sites.len() == other.sites.len()
            && self
                .sites
                .iter()
                .zip(&other.sites)
                .all(|(a, b)| a.same_block_as(b))
    }

    /// Moves every site to its first instance: the enumeration starting point.
    pub fn reset(&mut self) {
        for site in &mut self.sites {
            site.reset();
        }
    }

    /// Advances to the next microstate with carry propagation from site 0 upwards.
    ///
    /// After the last microstate the vector wraps back to the reset state. Callers bound the
    /// number of increments themselves.
    pub fn increment(&mut self) {
        for site in &mut self.sites {
            if !site.advance() {
                return;
            }
        }
    }

    /// Positions the vector directly on the microstate with odometer coordinate `index`
    /// (taken modulo `n_states`).
    pub fn set_from_index(&mut self, mut index: usize) {
        for site in &mut self.sites {
            let radix = site.len();
            site.set_offset(index % radix);
            index /= radix;
        }
    }

    /// Odometer coordinate of the current microstate, the inverse of
    /// [`StateVector::set_from_index`].
    pub fn index(&self) -> usize {
        self.sites
            .iter()
            .rev()
            .fold(0, |acc, site| acc * site.len() + site.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn actives_of(vector: &StateVector) -> Vec<usize> {
        vector.actives().collect()
    }

    #[test]
    fn from_site_sizes_lays_out_contiguous_blocks() {
        let vector = StateVector::from_site_sizes(&[2, 3, 1]).unwrap();
        let bounds: Vec<_> = vector
            .sites()
            .iter()
            .map(|s| (s.first(), s.last()))
            .collect();
        assert_eq!(bounds, vec![(0, 1), (2, 4), (5, 5)]);
        assert_eq!(vector.n_instances(), 6);
        assert_eq!(vector.n_states(), Some(6));
    }

    #[test]
    fn from_site_sizes_rejects_empty_site() {
        let result = StateVector::from_site_sizes(&[2, 0, 1]);
        assert_eq!(result, Err(StateVectorError::EmptySite { site: 1 }));
    }

    #[test]
    fn vector_without_sites_has_a_single_empty_microstate() {
        let vector = StateVector::from_site_sizes(&[]).unwrap();
        assert_eq!(vector.n_sites(), 0);
        assert_eq!(vector.n_instances(), 0);
        assert_eq!(vector.n_states(), Some(1));
    }

    #[test]
    fn n_states_reports_overflow_as_none() {
        let sizes = vec![1usize << 16; 8];
        let vector = StateVector::from_site_sizes(&sizes).unwrap();
        assert_eq!(vector.n_states(), None);
    }

    #[test]
    fn increment_visits_every_microstate_once_and_wraps() {
        let mut vector = StateVector::from_site_sizes(&[2, 3]).unwrap();
        vector.reset();
        let initial = actives_of(&vector);

        let mut seen = HashSet::new();
        seen.insert(initial.clone());
        for _ in 0..5 {
            vector.increment();
            assert!(seen.insert(actives_of(&vector)), "microstate visited twice");
        }
        assert_eq!(seen.len(), 6);

        vector.increment();
        assert_eq!(actives_of(&vector), initial);
    }

    #[test]
    fn first_site_is_the_fastest_varying_digit() {
        let mut vector = StateVector::from_site_sizes(&[2, 3]).unwrap();
        vector.reset();
        assert_eq!(actives_of(&vector), vec![0, 2]);
        vector.increment();
        assert_eq!(actives_of(&vector), vec![1, 2]);
        vector.increment();
        assert_eq!(actives_of(&vector), vec![0, 3]);
    }

    #[test]
    fn set_from_index_agrees_with_sequential_increments() {
        let mut sequential = StateVector::from_site_sizes(&[3, 1, 2, 4]).unwrap();
        sequential.reset();
        let mut direct = sequential.clone();
        let n_states = sequential.n_states().unwrap();

        for k in 0..n_states {
            direct.set_from_index(k);
            assert_eq!(direct, sequential, "mismatch at index {}", k);
            assert_eq!(sequential.index(), k);
            sequential.increment();
        }
    }

    #[test]
    fn reset_restores_first_instances_after_external_assignment() {
        let mut vector = StateVector::from_site_sizes(&[2, 2]).unwrap();
        vector.set_active(1, 3).unwrap();
        assert_eq!(actives_of(&vector), vec![0, 3]);
        vector.reset();
        assert_eq!(actives_of(&vector), vec![0, 2]);
    }

    #[test]
    fn set_active_validates_site_and_instance() {
        let mut vector = StateVector::from_site_sizes(&[2, 2]).unwrap();
        assert_eq!(
            vector.set_active(2, 0),
            Err(StateVectorError::SiteOutOfRange { site: 2, n_sites: 2 })
        );
        assert_eq!(
            vector.set_active(0, 2),
            Err(StateVectorError::InstanceOutsideSite {
                site: 0,
                instance: 2
            })
        );
    }

    #[test]
    fn actives_yield_every_site_pair_once() {
        use itertools::Itertools;

        let mut vector = StateVector::from_site_sizes(&[2, 2, 2]).unwrap();
        vector.set_active(1, 3).unwrap();
        let pairs: Vec<(usize, usize)> = vector.actives().tuple_combinations().collect();
        assert_eq!(pairs, vec![(0, 3), (0, 4), (3, 4)]);
    }

    #[test]
    fn conforms_to_compares_blocks_but_not_active_indices() {
        let a = StateVector::from_site_sizes(&[2, 3]).unwrap();
        let mut b = a.clone();
        b.increment();
        assert!(a.conforms_to(&b));

        let c = StateVector::from_site_sizes(&[3, 2]).unwrap();
        assert!(!a.conforms_to(&c));
        let d = StateVector::from_site_sizes(&[2]).unwrap();
        assert!(!a.conforms_to(&d));
    }
}
