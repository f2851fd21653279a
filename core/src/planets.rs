//! Period matcher: the second stage of the transit search.
//!
//! A single dip could be a starspot, a cosmic-ray artefact or an
//! instrumental glitch.  A planet, by contrast, transits again and again at
//! a fixed period.  This module walks the time-ordered dip list and looks
//! for dips that recur.
//!
//! # Method
//!
//! For every unclaimed pair `(i, j)` with `i < j`, the matcher takes the
//! spacing of their centres as a trial period and extrapolates a probe to
//! `center(i) + 2 * period`.  It then visits the later unclaimed dips `k` in
//! order; whenever the probe lands inside a dip (`start <= probe < end`) that
//! dip is claimed for the trial planet.  If at least one follow-up matched,
//! `i` and `j` are claimed as well and a [`Planet`] is emitted.
//!
//! The search is greedy and order dependent: the first pair that finds a
//! follow-up wins, and claims are never released.  It must therefore run
//! sequentially.
//!
//! # Timing modes
//!
//! Under [`TimingMode::Legacy`] the probe is moved forward by at most one
//! period per visited dip, even if it has fallen further behind, and the
//! transit counter jumps straight to 3 on the first match and climbs by one
//! per match after that.  [`TimingMode::Corrected`] jumps the probe straight
//! to the first multiple of the period at or after the dip's start and
//! counts the seed pair plus every matched follow-up.

use log::{debug, info};

use crate::types::{Dip, Planet, TimingMode};

// ---------------------------------------------------------------------------
// ClaimRegistry
// ---------------------------------------------------------------------------

/// Which planet, if any, owns each dip.
///
/// Planet numbers are 1-based.  A claim is permanent: once a dip belongs to
/// a planet it cannot be handed to another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimRegistry {
    owners: Vec<Option<u32>>,
}

impl ClaimRegistry {
    /// A registry for `n` dips, all unclaimed.
    pub fn new(n: usize) -> Self {
        Self {
            owners: vec![None; n],
        }
    }

    /// Seed a registry from the `planet` tags already on `dips`.
    pub fn from_dips(dips: &[Dip]) -> Self {
        Self {
            owners: dips
                .iter()
                .map(|d| (d.planet != 0).then_some(d.planet))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    #[inline]
    pub fn owner(&self, dip: usize) -> Option<u32> {
        self.owners.get(dip).copied().flatten()
    }

    #[inline]
    pub fn is_claimed(&self, dip: usize) -> bool {
        self.owner(dip).is_some()
    }

    /// Assign `dip` to `planet`.  Returns `false` (and changes nothing) if the
    /// dip is out of range or already owned.
    pub fn claim(&mut self, dip: usize, planet: u32) -> bool {
        match self.owners.get_mut(dip) {
            Some(slot) if slot.is_none() => {
                *slot = Some(planet);
                true
            }
            _ => false,
        }
    }

    /// Indices of the dips owned by `planet`, ascending.
    pub fn members(&self, planet: u32) -> Vec<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter_map(|(idx, owner)| (*owner == Some(planet)).then_some(idx))
            .collect()
    }

    /// Highest planet number in use, 0 if none.
    pub fn highest_planet(&self) -> u32 {
        self.owners.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Copy ownership onto the `planet` field of each dip.
    pub fn apply(&self, dips: &mut [Dip]) {
        for (dip, owner) in dips.iter_mut().zip(&self.owners) {
            dip.planet = owner.unwrap_or(0);
        }
    }
}

// ---------------------------------------------------------------------------
// PeriodMatcher
// ---------------------------------------------------------------------------

/// Groups recurring dips into periodic planet candidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodMatcher {
    mode: TimingMode,
}

impl PeriodMatcher {
    pub fn new(mode: TimingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TimingMode {
        self.mode
    }

    /// Match `dips` in place: tags are read from and written back to each
    /// dip's `planet` field.
    pub fn assign(&self, dips: &mut [Dip]) -> Vec<Planet> {
        let mut claims = ClaimRegistry::from_dips(dips);
        let planets = self.find_planets(dips, &mut claims);
        claims.apply(dips);
        planets
    }

    /// Find planet candidates among `dips` (assumed ordered by start time),
    /// recording ownership in `claims`.
    ///
    /// New planets are numbered from one past the highest number already in
    /// `claims`, so a fresh registry yields planets 1, 2, 3, ...
    pub fn find_planets(&self, dips: &[Dip], claims: &mut ClaimRegistry) -> Vec<Planet> {
        if claims.len() < dips.len() {
            claims.owners.resize(dips.len(), None);
        }

        let n = dips.len();
        let mut planets = Vec::new();
        let mut planet_num = claims.highest_planet() + 1;

        for i in 0..n {
            if claims.is_claimed(i) {
                continue;
            }
            let start = dips[i].center();

            for j in (i + 1)..n {
                // Once `i` has been claimed every remaining `j` is a no-op.
                if claims.is_claimed(i) {
                    break;
                }
                if claims.is_claimed(j) {
                    continue;
                }

                let period = dips[j].center() - start;
                let matched = self.probe_follow_ups(dips, claims, i, j, period, planet_num);

                if matched > 0 {
                    claims.claim(i, planet_num);
                    claims.claim(j, planet_num);
                    let transits = match self.mode {
                        TimingMode::Legacy => matched,
                        TimingMode::Corrected => matched + 2,
                    };
                    debug!(
                        "Planet {}: dips {} and {} at period {:.5} d, {} transits",
                        planet_num, i, j, period, transits
                    );
                    planets.push(Planet::new(period, dips[i].duration, transits, dips[i].depth));
                    planet_num += 1;
                }
            }
        }

        info!("Matched {} planets from {} dips", planets.len(), n);
        planets
    }

    /// Walk the dips after `j`, claiming every one the extrapolated probe
    /// lands in.  Returns the transit counter for the trial.
    fn probe_follow_ups(
        &self,
        dips: &[Dip],
        claims: &mut ClaimRegistry,
        i: usize,
        j: usize,
        period: f64,
        planet_num: u32,
    ) -> u32 {
        let mut probe = dips[i].center() + 2.0 * period;
        let mut transit_count: u32 = 0;

        for (k, dip) in dips.iter().enumerate().skip(j + 1) {
            if claims.is_claimed(k) {
                continue;
            }

            match self.mode {
                TimingMode::Legacy => {
                    if probe < dip.start {
                        probe += period;
                    }
                }
                TimingMode::Corrected => {
                    probe = catch_up(probe, dip.start, period);
                }
            }

            if probe >= dip.start && probe < dip.end() {
                claims.claim(k, planet_num);
                transit_count = match self.mode {
                    TimingMode::Legacy => (transit_count + 1).max(3),
                    TimingMode::Corrected => transit_count + 1,
                };
            }
        }

        transit_count
    }
}

/// First point of the probe train `probe + m * period` (`m >= 0`) at or
/// after `start`, in one step.  A period too small to move the probe, or a
/// jump that overflows, lands it on `start`.
fn catch_up(probe: f64, start: f64, period: f64) -> f64 {
    if period.is_nan() || period <= 0.0 || probe >= start {
        return probe;
    }
    let steps = ((start - probe) / period).ceil();
    let jumped = probe + steps * period;
    if jumped.is_finite() {
        jumped.max(start)
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dips of fixed duration centred on the given times.
    fn dips_at(centers: &[f64], duration: f64) -> Vec<Dip> {
        centers
            .iter()
            .map(|&c| Dip::new(c - duration / 2.0, duration, 0.01))
            .collect()
    }

    #[test]
    fn empty_and_single_dip_lists_yield_no_planets() {
        let matcher = PeriodMatcher::default();
        assert!(matcher.assign(&mut []).is_empty());

        let mut one = dips_at(&[5.0], 0.2);
        assert!(matcher.assign(&mut one).is_empty());
        assert_eq!(one[0].planet, 0);
    }

    #[test]
    fn two_dips_are_not_enough() {
        let mut dips = dips_at(&[5.0, 8.0], 0.2);
        assert!(PeriodMatcher::default().assign(&mut dips).is_empty());
        assert!(dips.iter().all(|d| d.planet == 0));
    }

    #[test]
    fn three_evenly_spaced_dips_form_one_planet() {
        let mut dips = dips_at(&[10.0, 13.5, 17.0], 0.25);
        let planets = PeriodMatcher::default().assign(&mut dips);

        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0].period, 3.5);
        assert_eq!(planets[0].transits, 3);
        assert_eq!(planets[0].duration, 0.25);
        assert!(dips.iter().all(|d| d.planet == 1));
    }

    #[test]
    fn first_follow_up_lifts_counter_to_three() {
        // One follow-up gives 3; each further follow-up adds one.
        let mut dips = dips_at(&[1.0, 3.0, 5.0, 7.0, 9.0], 0.2);
        let planets = PeriodMatcher::new(TimingMode::Legacy).assign(&mut dips);
        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0].transits, 5);
        assert!(dips.iter().all(|d| d.planet == 1));

        let mut corrected = dips_at(&[1.0, 3.0, 5.0, 7.0, 9.0], 0.2);
        let planets = PeriodMatcher::new(TimingMode::Corrected).assign(&mut corrected);
        assert_eq!(planets[0].transits, 5);
    }

    #[test]
    fn legacy_mode_advances_at_most_one_period_per_dip() {
        // The third transit at 5.0 is missing from the list.  When k = 7.0
        // is visited, the probe (5.0) is behind by one period and the single
        // step brings it to 7.0: a match.  With 9.0 also missing, the probe
        // sits at 7.0 when the dip at 11.0 comes up; one step reaches only
        // 9.0, so that dip is missed.  The corrected mode catches up.
        let centers = [1.0, 3.0, 7.0, 11.0];

        let mut legacy = dips_at(&centers, 0.2);
        let planets = PeriodMatcher::new(TimingMode::Legacy).assign(&mut legacy);
        assert_eq!(planets.len(), 1);
        assert_eq!(legacy[2].planet, 1);
        assert_eq!(legacy[3].planet, 0);

        let mut corrected = dips_at(&centers, 0.2);
        let planets = PeriodMatcher::new(TimingMode::Corrected).assign(&mut corrected);
        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0].transits, 4);
        assert!(corrected.iter().all(|d| d.planet == 1));
    }

    #[test]
    fn catch_up_jumps_to_first_step_at_or_after_start() {
        assert_eq!(catch_up(0.0, 10.0, 3.0), 12.0);
        assert_eq!(catch_up(0.0, 9.0, 3.0), 9.0);
        assert_eq!(catch_up(5.0, 2.0, 1.0), 5.0);
        assert_eq!(catch_up(1.0, 2.0, 0.0), 1.0);
        assert_eq!(catch_up(1.0, 2.0, f64::NAN), 1.0);
        // 1.0 + 2^-53 rounds back to 1.0, so stepping alone never arrives.
        assert_eq!(catch_up(1.0, 2.0, f64::EPSILON / 2.0), 2.0);
        assert_eq!(catch_up(0.0, 1e300, 1e-300), 1e300);
    }

    #[test]
    fn corrected_mode_handles_sub_ulp_periods() {
        // Centres at 1 - 2^-53, 1.0 and 2.25: the seed pair is one ulp
        // apart and the follow-up sits a whole day later.
        let half_eps = f64::EPSILON / 2.0;
        let layout = || {
            vec![
                Dip::new(0.75 - half_eps, 0.5, 0.01),
                Dip::new(0.75, 0.5, 0.01),
                Dip::new(2.0, 0.5, 0.01),
            ]
        };

        let mut corrected = layout();
        let planets = PeriodMatcher::new(TimingMode::Corrected).assign(&mut corrected);
        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0].period, half_eps);
        assert_eq!(planets[0].transits, 3);
        assert!(corrected.iter().all(|d| d.planet == 1));

        let mut legacy = layout();
        assert!(PeriodMatcher::new(TimingMode::Legacy).assign(&mut legacy).is_empty());
    }

    #[test]
    fn corrected_mode_crosses_long_gaps_in_one_step() {
        // A microsecond-scale period and a follow-up ~1000 days out would
        // take about 10^9 single steps.
        let mut dips = vec![
            Dip::new(-0.25, 0.5, 0.01),
            Dip::new(1e-6 - 0.25, 0.5, 0.01),
            Dip::new(999.9, 0.5, 0.01),
        ];
        let planets = PeriodMatcher::new(TimingMode::Corrected).assign(&mut dips);
        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0].transits, 3);
        assert_eq!(dips[2].planet, 1);
    }

    #[test]
    fn claimed_dips_are_skipped_by_later_pairs() {
        // Two interleaved periodic trains: 0, 4, 8 and 1, 6, 11.
        let mut dips = dips_at(&[0.0, 1.0, 4.0, 6.0, 8.0, 11.0], 0.2);
        let planets = PeriodMatcher::default().assign(&mut dips);

        assert_eq!(planets.len(), 2);
        assert!((planets[0].period - 4.0).abs() < 1e-12);
        assert!((planets[1].period - 5.0).abs() < 1e-12);
        let tags: Vec<u32> = dips.iter().map(|d| d.planet).collect();
        assert_eq!(tags, vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn registry_refuses_double_claims() {
        let mut claims = ClaimRegistry::new(3);
        assert!(claims.claim(1, 1));
        assert!(!claims.claim(1, 2));
        assert!(!claims.claim(7, 1));
        assert_eq!(claims.owner(1), Some(1));
        assert_eq!(claims.owner(0), None);
        assert_eq!(claims.members(1), vec![1]);
        assert_eq!(claims.highest_planet(), 1);
    }

    #[test]
    fn pre_claimed_dips_are_left_alone() {
        let mut dips = dips_at(&[10.0, 13.5, 17.0, 20.5], 0.25);
        dips[0].planet = 4;
        let planets = PeriodMatcher::default().assign(&mut dips);

        assert_eq!(planets.len(), 1);
        assert_eq!(dips[0].planet, 4);
        assert_eq!(&dips[1..].iter().map(|d| d.planet).collect::<Vec<_>>(), &[5, 5, 5]);
    }
}
