//! Unit tests for the identifiers module
//!
//! Tests cover creation, parsing, conversion and display formatting.

use core_kernel::{
    UserId, RoommateId, ListingId, PictureId, GroupId, InvitationId,
    ConversationId, MessageId, ReviewId, InteractionId,
};
use uuid::Uuid;

mod listing_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = ListingId::new();
        let id2 = ListingId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = ListingId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = ListingId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ListingId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = ListingId::new();
        let parsed: ListingId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: ListingId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("LST-not-a-uuid".parse::<ListingId>().is_err());
    }

    #[test]
    fn test_json_is_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = ListingId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        let back: ListingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

#[test]
fn test_prefixes() {
    assert_eq!(UserId::prefix(), "USR");
    assert_eq!(RoommateId::prefix(), "RMT");
    assert_eq!(ListingId::prefix(), "LST");
    assert_eq!(PictureId::prefix(), "PIC");
    assert_eq!(GroupId::prefix(), "GRP");
    assert_eq!(InvitationId::prefix(), "GIN");
    assert_eq!(ConversationId::prefix(), "CNV");
    assert_eq!(MessageId::prefix(), "MSG");
    assert_eq!(ReviewId::prefix(), "REV");
    assert_eq!(InteractionId::prefix(), "INT");
}

#[test]
fn test_prefix_of_other_type_is_rejected() {
    let group = GroupId::new();
    assert!(group.to_string().parse::<UserId>().is_err());
}
