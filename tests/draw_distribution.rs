//! Statistical check of the weighted draw. With tickets A=3, B=1, C=1 and
//! two winners, removing every occurrence of a picked participant gives
//! exact inclusion probabilities P(A) = 0.9 and P(B) = P(C) = 0.55; the
//! observed frequencies over 10,000 seeded trials must sit in a tight band
//! around those values.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use souldraw::engine::select_winners;
use souldraw::UserId;

#[test]
fn inclusion_frequencies_match_ticket_weights() {
    const TRIALS: usize = 10_000;

    let participants: BTreeMap<UserId, u32> = [("a", 3), ("b", 1), ("c", 1)]
        .into_iter()
        .map(|(user, tickets)| (UserId::from(user), tickets))
        .collect();

    let mut rng = SmallRng::seed_from_u64(0x50_55_4c);
    let mut hits: BTreeMap<UserId, usize> = BTreeMap::new();
    for _ in 0..TRIALS {
        let winners = select_winners(&participants, 2, &mut rng);
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0], winners[1]);
        for winner in winners {
            *hits.entry(winner).or_default() += 1;
        }
    }

    let freq = |user: &str| hits[&UserId::from(user)] as f64 / TRIALS as f64;

    let a = freq("a");
    assert!((0.88..=0.92).contains(&a), "P(a) drifted: {a}");

    for user in ["b", "c"] {
        let p = freq(user);
        assert!((0.52..=0.58).contains(&p), "P({user}) drifted: {p}");
    }

    // Exactly two winners per trial.
    let total: usize = hits.values().sum();
    assert_eq!(total, 2 * TRIALS);
}
