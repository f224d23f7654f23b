use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

/// A wellness break offered once the hourly budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub id: &'static str,
    pub name: &'static str,
    pub duration_minutes: u32,
    pub description: &'static str,
}

pub const INTERVENTIONS: [Intervention; 5] = [
    Intervention {
        id: "breathing",
        name: "Breathing Exercise",
        duration_minutes: 3,
        description: "Breathe in for four counts, hold for four, out for six.",
    },
    Intervention {
        id: "window",
        name: "Window Fresh Air",
        duration_minutes: 2,
        description: "Open a window or step outside and take in some fresh air.",
    },
    Intervention {
        id: "walk",
        name: "Short Walk",
        duration_minutes: 10,
        description: "Put the phone down and walk around the block.",
    },
    Intervention {
        id: "cold_water",
        name: "Cold Water Splash",
        duration_minutes: 1,
        description: "Splash cold water on your face to reset your focus.",
    },
    Intervention {
        id: "stretching",
        name: "Stretching",
        duration_minutes: 5,
        description: "Stretch your neck, shoulders and back.",
    },
];

/// Uniform pick from the catalog.
pub fn random_intervention<R: Rng + ?Sized>(rng: &mut R) -> &'static Intervention {
    INTERVENTIONS
        .choose(rng)
        .unwrap_or(&INTERVENTIONS[0])
}

pub fn find_intervention(id: &str) -> Option<&'static Intervention> {
    INTERVENTIONS.iter().find(|intervention| intervention.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn catalog_has_expected_durations() {
        let durations: Vec<_> = INTERVENTIONS
            .iter()
            .map(|i| (i.name, i.duration_minutes))
            .collect();
        assert_eq!(
            durations,
            vec![
                ("Breathing Exercise", 3),
                ("Window Fresh Air", 2),
                ("Short Walk", 10),
                ("Cold Water Splash", 1),
                ("Stretching", 5),
            ]
        );
    }

    #[test]
    fn random_pick_covers_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<_> = (0..500).map(|_| random_intervention(&mut rng).id).collect();
        assert_eq!(seen.len(), INTERVENTIONS.len());
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_intervention("walk").map(|i| i.duration_minutes), Some(10));
        assert!(find_intervention("nap").is_none());
    }
}
