//! Property-based wire-format tests for the board protocol.
//!
//! Uses proptest to verify:
//! 1. Any valid `Task` or `BoardEvent` survives a JSON round-trip.
//! 2. The wire field names (`uid`, `createdAt`) and event tags stay fixed.
//! 3. Arbitrary text never causes a panic in `decode_event`.
//! 4. Client-side draft checks and service-side payload checks agree on
//!    what is valid.

use proptest::prelude::*;
use syncboard_proto::api::{NewTask, NewUser};
use syncboard_proto::codec;
use syncboard_proto::event::BoardEvent;
use syncboard_proto::task::*;
use uuid::Uuid;

// --- Arbitrary implementations for protocol types ---

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating arbitrary `OwnerId` values.
fn arb_owner_id() -> impl Strategy<Value = OwnerId> {
    "[a-zA-Z0-9-]{1,24}".prop_map(OwnerId::new)
}

/// Strategy for generating arbitrary `Category` values.
fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Todo),
        Just(Category::InProgress),
        Just(Category::Done),
    ]
}

/// Strategy for generating arbitrary `Timestamp` values.
fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    any::<u64>().prop_map(Timestamp::from_millis)
}

/// Strategy for task text fields. The codec carries any text; length
/// bounds are a validation concern, not a serialization one.
fn arb_text() -> impl Strategy<Value = String> {
    "[^\x00]{0,80}"
}

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_task_id(),
        arb_owner_id(),
        arb_text(),
        proptest::option::of(arb_text()),
        arb_category(),
        any::<u32>(),
        arb_timestamp(),
    )
        .prop_map(
            |(id, owner, title, description, category, position, created_at)| Task {
                id,
                owner,
                title,
                description,
                category,
                position,
                created_at,
            },
        )
}

/// Strategy for generating arbitrary `BoardEvent` values.
fn arb_event() -> impl Strategy<Value = BoardEvent> {
    prop_oneof![
        arb_task().prop_map(BoardEvent::TaskCreated),
        arb_task().prop_map(BoardEvent::TaskUpdated),
        arb_task_id().prop_map(BoardEvent::TaskDeleted),
    ]
}

proptest! {
    /// Any task survives a JSON round-trip unchanged.
    #[test]
    fn task_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("encode should succeed");
        let decoded: Task = serde_json::from_str(&json).expect("decode should succeed");
        prop_assert_eq!(task, decoded);
    }

    /// Any event survives the channel codec unchanged.
    #[test]
    fn event_round_trip(event in arb_event()) {
        let text = codec::encode_event(&event).expect("encode should succeed");
        let decoded = codec::decode_event(&text).expect("decode should succeed");
        prop_assert_eq!(event, decoded);
    }

    /// Tasks always serialize with the wire field names, never the Rust
    /// ones, and omit the description key when there is no description.
    #[test]
    fn task_wire_field_names_are_fixed(task in arb_task()) {
        let json = serde_json::to_value(&task).expect("encode should succeed");
        prop_assert!(json.get("uid").is_some());
        prop_assert!(json.get("createdAt").is_some());
        prop_assert!(json.get("owner").is_none());
        prop_assert!(json.get("created_at").is_none());
        prop_assert_eq!(json.get("description").is_some(), task.description.is_some());
    }

    /// Every encoded event carries one of the three fixed tags and a
    /// data payload.
    #[test]
    fn event_tags_are_fixed(event in arb_event()) {
        let text = codec::encode_event(&event).expect("encode should succeed");
        let json: serde_json::Value = serde_json::from_str(&text).expect("frame is JSON");
        let tag = json
            .get("event")
            .and_then(serde_json::Value::as_str)
            .expect("frame has an event tag");
        prop_assert!(matches!(tag, "taskCreated" | "taskUpdated" | "taskDeleted"));
        prop_assert!(json.get("data").is_some());
    }

    /// Arbitrary text never panics the decoder; malformed frames come
    /// back as errors.
    #[test]
    fn decode_arbitrary_text_never_panics(text in "\\PC{0,256}") {
        let _ = codec::decode_event(&text);
    }

    /// The client's draft check and the service's payload check accept
    /// exactly the same titles and descriptions, so a request that
    /// passes pre-flight is never rejected on bounds.
    #[test]
    fn draft_and_payload_checks_agree(
        title in "[^\x00]{0,60}",
        description in proptest::option::of("[^\x00]{0,220}"),
    ) {
        let draft_ok = TaskDraft::new(title.clone(), description.clone())
            .normalize()
            .is_ok();
        let payload = NewTask {
            title,
            description,
            owner: OwnerId::new("user-1"),
            category: Category::Todo,
            position: 0,
        };
        prop_assert_eq!(draft_ok, payload.validate().is_ok());
    }

    /// User profiles survive a JSON round-trip.
    #[test]
    fn new_user_round_trip(
        uid in "[a-z0-9-]{1,24}",
        email in "[a-z]{1,12}@[a-z]{1,12}\\.com",
        name in "[^\x00]{1,40}",
    ) {
        let user = NewUser::new(uid, email, name);
        let json = serde_json::to_string(&user).expect("encode should succeed");
        let decoded: NewUser = serde_json::from_str(&json).expect("decode should succeed");
        prop_assert_eq!(user, decoded);
    }
}
