//! Run-wide deduplication.
//!
//! The aggregator owns the only copy of every admitted place plus the set of
//! ids seen so far. Borough views are index lists into the same storage, so a
//! place lives in exactly one borough and in the global list once.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::config::DedupPolicy;
use crate::place::CollectedPlace;

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Admitted,
    Duplicate,
    /// Duplicate whose fields replaced the stored record.
    Replaced,
    MissingId,
}

/// Tally of an [`Aggregator::absorb`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsorbStats {
    pub admitted: usize,
    pub duplicates: usize,
    pub replaced: usize,
    pub missing_id: usize,
}

impl AbsorbStats {
    fn record(&mut self, outcome: AdmitOutcome) {
        match outcome {
            AdmitOutcome::Admitted => self.admitted += 1,
            AdmitOutcome::Duplicate => self.duplicates += 1,
            AdmitOutcome::Replaced => self.replaced += 1,
            AdmitOutcome::MissingId => self.missing_id += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    policy: DedupPolicy,
    places: Vec<CollectedPlace>,
    seen: HashMap<String, usize>,
    by_borough: IndexMap<String, Vec<usize>>,
}

impl Aggregator {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Admit a place unless its id is missing or already seen.
    ///
    /// Admitted places join the global list and the list of the borough they
    /// are annotated with.
    pub fn admit(&mut self, candidate: CollectedPlace) -> AdmitOutcome {
        let Some(id) = candidate.id().map(str::to_string) else {
            return AdmitOutcome::MissingId;
        };

        if let Some(&slot) = self.seen.get(&id) {
            let stored = &mut self.places[slot];
            if self.policy == DedupPolicy::MostComplete
                && candidate.place.populated_fields() > stored.place.populated_fields()
            {
                tracing::debug!(
                    id = %id,
                    from = %candidate.neighborhood,
                    "Replacing with more complete record"
                );
                stored.place = candidate.place;
                return AdmitOutcome::Replaced;
            }
            return AdmitOutcome::Duplicate;
        }

        let slot = self.places.len();
        self.by_borough
            .entry(candidate.borough.clone())
            .or_default()
            .push(slot);
        self.seen.insert(id, slot);
        self.places.push(candidate);
        AdmitOutcome::Admitted
    }

    pub fn absorb(&mut self, candidates: impl IntoIterator<Item = CollectedPlace>) -> AbsorbStats {
        let mut stats = AbsorbStats::default();
        for candidate in candidates {
            stats.record(self.admit(candidate));
        }
        stats
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// All admitted places, in admission order.
    pub fn places(&self) -> &[CollectedPlace] {
        &self.places
    }

    /// Boroughs that admitted at least one place, in first-admission order.
    pub fn boroughs(&self) -> impl Iterator<Item = &str> {
        self.by_borough.keys().map(String::as_str)
    }

    /// Places first admitted under `borough`, in admission order.
    pub fn borough_places<'a>(
        &'a self,
        borough: &str,
    ) -> impl Iterator<Item = &'a CollectedPlace> + 'a {
        self.by_borough
            .get(borough)
            .map(|slots| slots.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&slot| &self.places[slot])
    }

    pub fn borough_len(&self, borough: &str) -> usize {
        self.by_borough.get(borough).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::place;
    use places_client::OpeningHours;
    use std::collections::HashSet;

    fn at(id: &str, neighborhood: &str, borough: &str) -> CollectedPlace {
        CollectedPlace::new(place(id), neighborhood, borough)
    }

    #[test]
    fn test_same_id_admitted_once() {
        let mut agg = Aggregator::new(DedupPolicy::FirstSeen);

        assert_eq!(agg.admit(at("p1", "DUMBO", "Brooklyn")), AdmitOutcome::Admitted);
        assert_eq!(agg.admit(at("p1", "DUMBO", "Brooklyn")), AdmitOutcome::Duplicate);

        assert_eq!(agg.len(), 1);
        assert_eq!(agg.borough_len("Brooklyn"), 1);
    }

    #[test]
    fn test_overlap_between_neighborhoods() {
        let mut agg = Aggregator::new(DedupPolicy::FirstSeen);

        let first = agg.absorb(vec![
            at("p1", "Fort Greene", "Brooklyn"),
            at("p2", "Fort Greene", "Brooklyn"),
        ]);
        let second = agg.absorb(vec![
            at("p1", "Clinton Hill", "Brooklyn"),
            at("p3", "Clinton Hill", "Brooklyn"),
        ]);

        assert_eq!(first.admitted, 2);
        assert_eq!(second, AbsorbStats { admitted: 1, duplicates: 1, ..Default::default() });

        let ids: Vec<_> = agg.places().iter().filter_map(|p| p.id()).collect();
        assert_eq!(ids, ["p1", "p2", "p3"]);
        assert_eq!(agg.places()[0].neighborhood, "Fort Greene");
    }

    #[test]
    fn test_missing_or_empty_id_rejected() {
        let mut agg = Aggregator::default();
        let mut anonymous = at("x", "Tribeca", "Manhattan");
        anonymous.place.id = None;
        let mut blank = at("x", "Tribeca", "Manhattan");
        blank.place.id = Some(String::new());

        let stats = agg.absorb(vec![anonymous, blank]);

        assert_eq!(stats.missing_id, 2);
        assert!(agg.is_empty());
        assert_eq!(agg.boroughs().count(), 0);
    }

    #[test]
    fn test_seen_set_spans_boroughs() {
        let mut agg = Aggregator::default();
        agg.absorb(vec![at("edge", "Inwood", "Manhattan"), at("m1", "Inwood", "Manhattan")]);
        agg.absorb(vec![at("edge", "Riverdale", "Bronx"), at("b1", "Riverdale", "Bronx")]);

        let manhattan: Vec<_> = agg.borough_places("Manhattan").filter_map(|p| p.id()).collect();
        let bronx: Vec<_> = agg.borough_places("Bronx").filter_map(|p| p.id()).collect();
        assert_eq!(manhattan, ["edge", "m1"]);
        assert_eq!(bronx, ["b1"]);
        assert_eq!(agg.borough_places("Queens").count(), 0);
    }

    #[test]
    fn test_boroughs_partition_global_list() {
        let mut agg = Aggregator::default();
        let feed = [
            ("a", "Brooklyn"),
            ("b", "Brooklyn"),
            ("a", "Queens"),
            ("c", "Queens"),
            ("b", "Bronx"),
            ("d", "Bronx"),
            ("c", "Staten Island"),
        ];
        for (id, borough) in feed {
            agg.admit(at(id, "somewhere", borough));
        }

        let global: HashSet<_> = agg.places().iter().filter_map(|p| p.id()).collect();
        let mut union = HashSet::new();
        let mut total = 0;
        for borough in agg.boroughs() {
            for p in agg.borough_places(borough) {
                total += 1;
                assert!(union.insert(p.id().unwrap()), "id in two boroughs");
            }
        }
        assert_eq!(union, global);
        assert_eq!(total, agg.len());
        let boroughs: Vec<_> = agg.boroughs().collect();
        assert_eq!(boroughs, ["Brooklyn", "Queens", "Bronx"]);
    }

    #[test]
    fn test_first_seen_keeps_first_record() {
        let mut agg = Aggregator::new(DedupPolicy::FirstSeen);
        agg.admit(at("p1", "Chelsea", "Manhattan"));

        let mut richer = at("p1", "Gramercy", "Manhattan");
        richer.place.regular_opening_hours = Some(OpeningHours::default());

        assert_eq!(agg.admit(richer), AdmitOutcome::Duplicate);
        assert!(agg.places()[0].place.regular_opening_hours.is_none());
    }

    #[test]
    fn test_most_complete_replaces_fields_keeps_annotation() {
        let mut agg = Aggregator::new(DedupPolicy::MostComplete);
        agg.admit(at("p1", "Chelsea", "Manhattan"));

        let mut richer = at("p1", "Gramercy", "Manhattan");
        richer.place.regular_opening_hours = Some(OpeningHours::default());
        assert_eq!(agg.admit(richer), AdmitOutcome::Replaced);

        let stored = &agg.places()[0];
        assert!(stored.place.regular_opening_hours.is_some());
        assert_eq!(stored.neighborhood, "Chelsea");
        assert_eq!(agg.len(), 1);

        // Equal field count is not an improvement
        assert_eq!(agg.admit(at("p1", "Flatiron District", "Manhattan")), AdmitOutcome::Duplicate);
    }
}
