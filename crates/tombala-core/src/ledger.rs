// Prize tiers and the per-round record of who claimed them.

use tracing::debug;

use crate::error::ClaimRejection;
use crate::ConnectionId;

/// One of the three prize levels, claimable at most once per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// One completed row ("çinko").
    FirstRow,
    /// Two completed rows.
    SecondRow,
    /// Full board ("tombala"). Ends the round.
    FullHouse,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::FirstRow, Tier::SecondRow, Tier::FullHouse];

    /// Map a client-reported row count to its tier.
    pub fn from_rows(rows: i64) -> Option<Tier> {
        match rows {
            1 => Some(Tier::FirstRow),
            2 => Some(Tier::SecondRow),
            3 => Some(Tier::FullHouse),
            _ => None,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Tier::FirstRow => 1,
            Tier::SecondRow => 2,
            Tier::FullHouse => 3,
        }
    }

    /// Display name used in player achievements.
    pub fn title(self) -> &'static str {
        match self {
            Tier::FirstRow => "Çinko",
            Tier::SecondRow => "İkinci Çinko",
            Tier::FullHouse => "Tombala",
        }
    }

    pub fn ends_round(self) -> bool {
        self == Tier::FullHouse
    }

    fn index(self) -> usize {
        match self {
            Tier::FirstRow => 0,
            Tier::SecondRow => 1,
            Tier::FullHouse => 2,
        }
    }
}

/// An accepted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub tier: Tier,
    pub points: u32,
}

/// Records which tiers are taken this round and by whom. Each slot moves
/// from open to claimed at most once until [`ClaimLedger::reset`].
#[derive(Debug, Clone, Default)]
pub struct ClaimLedger {
    claimants: [Option<ConnectionId>; 3],
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the tier matching `rows` for `claimant`.
    ///
    /// The row count is trusted as reported. The ledger only decides which
    /// claim reached a tier first.
    pub fn try_claim(&mut self, claimant: &str, rows: i64) -> Result<Claim, ClaimRejection> {
        let tier = Tier::from_rows(rows).ok_or(ClaimRejection::InvalidRows(rows))?;
        let slot = &mut self.claimants[tier.index()];
        if slot.is_some() {
            debug!(claimant, ?tier, "Tier already claimed");
            return Err(ClaimRejection::TierTaken(tier));
        }
        *slot = Some(claimant.to_string());
        Ok(Claim {
            tier,
            points: tier.points(),
        })
    }

    pub fn is_claimed(&self, tier: Tier) -> bool {
        self.claimants[tier.index()].is_some()
    }

    pub fn claimant(&self, tier: Tier) -> Option<&str> {
        self.claimants[tier.index()].as_deref()
    }

    /// Tiers held by `claimant`, lowest first.
    pub fn tiers_held_by(&self, claimant: &str) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|tier| self.claimant(*tier) == Some(claimant))
            .collect()
    }

    pub fn reset(&mut self) {
        self.claimants = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_tier_awards_its_points_once() {
        let mut ledger = ClaimLedger::new();

        assert_eq!(
            ledger.try_claim("a", 1),
            Ok(Claim {
                tier: Tier::FirstRow,
                points: 1
            })
        );
        assert_eq!(ledger.try_claim("b", 2).map(|c| c.points), Ok(2));
        assert_eq!(ledger.try_claim("c", 3).map(|c| c.points), Ok(3));

        for rows in 1..=3 {
            let tier = Tier::from_rows(rows).unwrap();
            assert_eq!(
                ledger.try_claim("d", rows),
                Err(ClaimRejection::TierTaken(tier))
            );
        }
    }

    #[test]
    fn repeat_claim_rejected_regardless_of_requester() {
        let mut ledger = ClaimLedger::new();
        ledger.try_claim("a", 1).unwrap();

        assert!(ledger.try_claim("a", 1).is_err());
        assert!(ledger.try_claim("b", 1).is_err());
        assert_eq!(ledger.claimant(Tier::FirstRow), Some("a"));
    }

    #[test]
    fn invalid_row_counts_change_nothing() {
        let mut ledger = ClaimLedger::new();
        for rows in [0, 4, -1, 15, i64::MAX] {
            assert_eq!(
                ledger.try_claim("a", rows),
                Err(ClaimRejection::InvalidRows(rows))
            );
        }
        assert!(Tier::ALL.iter().all(|t| !ledger.is_claimed(*t)));
    }

    #[test]
    fn tiers_are_independent() {
        let mut ledger = ClaimLedger::new();
        // Full house first does not close the lower tiers.
        ledger.try_claim("a", 3).unwrap();
        assert!(ledger.try_claim("b", 1).is_ok());
        assert!(ledger.try_claim("b", 2).is_ok());
    }

    #[test]
    fn tiers_held_by_lists_only_own_claims() {
        let mut ledger = ClaimLedger::new();
        ledger.try_claim("a", 1).unwrap();
        ledger.try_claim("b", 2).unwrap();
        ledger.try_claim("a", 3).unwrap();

        assert_eq!(
            ledger.tiers_held_by("a"),
            vec![Tier::FirstRow, Tier::FullHouse]
        );
        assert_eq!(ledger.tiers_held_by("b"), vec![Tier::SecondRow]);
        assert!(ledger.tiers_held_by("c").is_empty());
    }

    #[test]
    fn reset_reopens_every_tier() {
        let mut ledger = ClaimLedger::new();
        for rows in 1..=3 {
            ledger.try_claim("a", rows).unwrap();
        }

        ledger.reset();

        assert!(Tier::ALL.iter().all(|t| !ledger.is_claimed(*t)));
        assert!(ledger.try_claim("b", 3).is_ok());
    }

    #[test]
    fn only_full_house_ends_the_round() {
        assert!(!Tier::FirstRow.ends_round());
        assert!(!Tier::SecondRow.ends_round());
        assert!(Tier::FullHouse.ends_round());
    }
}
