//! Property tests over random join/leave/replication sequences.

use insignia_core::{EntityId, RoleName};
use insignia_session::BadgeSession;
use insignia_sync::{serialize_message, HiddenSet, HiddenSetWireMessage};
use insignia_testkit::fixtures::*;
use insignia_testkit::{MockRoster, TestEffects};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
enum Step {
    Join(u32),
    Leave(u32),
    /// A remote writer publishes this hidden set
    Remote(Vec<u32>),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (1u32..10).prop_map(Step::Join),
        2 => (1u32..10).prop_map(Step::Leave),
        2 => proptest::collection::vec(1u32..10, 0..6).prop_map(Step::Remote),
    ]
}

/// Ids 1..=7 are on the roster (odd ids hold a tier); 8 and 9 are not.
fn roster() -> MockRoster {
    let roster = MockRoster::ready();
    for id in 1..=7u32 {
        let roles: Vec<RoleName> = if id % 2 == 1 {
            vec![RoleName::from(ROLE_CADET)]
        } else {
            Vec::new()
        };
        roster.add_member(&format!("p{id}"), roles);
    }
    roster
}

proptest! {
    #[test]
    fn registry_and_visibility_track_state(steps in proptest::collection::vec(step_strategy(), 1..40)) {
        let effects = TestEffects::standalone(EntityId(100), roster());
        let local = effects.local_entity("observer");
        let mut session = BadgeSession::new(standard_config(), local, effects);
        session.on_roster_ready().unwrap();

        let mut joined = BTreeSet::new();
        for step in steps {
            match step {
                Step::Join(id) => {
                    session.on_joined(entity(id, &format!("p{id}"))).unwrap();
                    joined.insert(id);
                }
                Step::Leave(id) => {
                    session.on_left(EntityId(id)).ok();
                    joined.remove(&id);
                }
                Step::Remote(ids) => {
                    let set: HiddenSet = ids.into_iter().map(EntityId).collect();
                    let msg = HiddenSetWireMessage::snapshot(EntityId(50), &set);
                    session.on_replicated(&serialize_message(&msg).unwrap()).unwrap();
                }
            }

            let expected: BTreeSet<u32> = joined.iter().copied().filter(|id| *id <= 7).collect();
            let registered: Vec<EntityId> = session.registry().all().into_iter().map(|(e, _)| e).collect();
            let unique: BTreeSet<EntityId> = registered.iter().copied().collect();
            prop_assert_eq!(registered.len(), unique.len());
            prop_assert_eq!(unique, expected.iter().map(|id| EntityId(*id)).collect::<BTreeSet<_>>());

            let visuals = &session.effects().visuals;
            for id in &expected {
                let entity = EntityId(*id);
                let hidden = session.hidden_set().contains(entity);
                prop_assert_eq!(visuals.canvas_visible(entity), Some(!hidden));
                prop_assert_eq!(session.is_badge_visible(entity), Some(!hidden));
            }
        }
    }
}
