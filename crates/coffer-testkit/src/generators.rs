//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use coffer_core::{EntryId, GroupId, ShareId, UserId};
use coffer_crypto::GroupKey;

/// Generate a random EntryId.
pub fn entry_id() -> impl Strategy<Value = EntryId> {
    any::<[u8; 16]>().prop_map(EntryId::from_bytes)
}

/// Generate a random GroupId.
pub fn group_id() -> impl Strategy<Value = GroupId> {
    any::<[u8; 16]>().prop_map(GroupId::from_bytes)
}

/// Generate a random ShareId.
pub fn share_id() -> impl Strategy<Value = ShareId> {
    any::<[u8; 16]>().prop_map(ShareId::from_bytes)
}

/// Generate a random UserId.
pub fn user_id() -> impl Strategy<Value = UserId> {
    any::<[u8; 16]>().prop_map(UserId::from_bytes)
}

/// Generate a random GroupKey.
pub fn group_key() -> impl Strategy<Value = GroupKey> {
    any::<[u8; 32]>().prop_map(GroupKey::from_bytes)
}

/// Generate an entry title.
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{1,40}".prop_map(String::from)
}

/// Generate an entry category.
pub fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("passwords".to_string()),
        Just("documents".to_string()),
        Just("finance".to_string()),
        Just("notes".to_string()),
    ]
}

/// Generate a JSON scalar.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,32}".prop_map(Value::from),
    ]
}

/// Generate entry data: a flat JSON object.
pub fn entry_data() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,12}", json_scalar(), 0..8)
        .prop_map(|fields| Value::Object(fields.into_iter().collect()))
}

/// What happens to one share during a generated propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareFate {
    /// The caller supplies this share's group key.
    pub has_key: bool,
    /// The store rejects this share's update.
    pub update_fails: bool,
}

impl ShareFate {
    pub fn succeeds(&self) -> bool {
        self.has_key && !self.update_fails
    }
}

impl Arbitrary for ShareFate {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (prop::bool::weighted(0.8), prop::bool::weighted(0.2))
            .prop_map(|(has_key, update_fails)| ShareFate {
                has_key,
                update_fails,
            })
            .boxed()
    }
}

/// A whole propagation: one fate per active share, plus the edit.
#[derive(Debug, Clone)]
pub struct PropagationScenario {
    pub fates: Vec<ShareFate>,
    pub title: String,
    pub category: String,
    pub data: Value,
}

impl PropagationScenario {
    pub fn expected_updates(&self) -> usize {
        self.fates.iter().filter(|f| f.succeeds()).count()
    }

    pub fn expected_failures(&self) -> usize {
        self.fates.len() - self.expected_updates()
    }
}

impl Arbitrary for PropagationScenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::vec(any::<ShareFate>(), 0..8),
            title(),
            category(),
            entry_data(),
        )
            .prop_map(|(fates, title, category, data)| PropagationScenario {
                fates,
                title,
                category,
                data,
            })
            .boxed()
    }
}
