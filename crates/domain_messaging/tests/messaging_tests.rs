//! Tests for conversations and messages

use core_kernel::{ListingId, UserId};
use domain_messaging::conversation::{Conversation, LeaveResult};
use domain_messaging::message::{mark_read, unread_for, MessageDraft};
use domain_messaging::MessagingError;

fn draft(text: &str) -> MessageDraft {
    MessageDraft { content: Some(text.to_string()) }
}

fn open_conversation() -> (Conversation, UserId, UserId) {
    let tenant = UserId::new();
    let landlord = UserId::new();
    let conversation = Conversation::start(ListingId::new(), landlord, tenant, &[]).unwrap();
    (conversation, tenant, landlord)
}

mod start_tests {
    use super::*;

    #[test]
    fn test_start_with_landlord() {
        let (conversation, tenant, landlord) = open_conversation();
        assert!(conversation.is_participant(tenant));
        assert!(conversation.is_participant(landlord));
        assert_eq!(conversation.participants.len(), 2);
    }

    #[test]
    fn test_start_with_self() {
        let landlord = UserId::new();
        let err = Conversation::start(ListingId::new(), landlord, landlord, &[]).unwrap_err();
        assert!(matches!(err, MessagingError::SelfConversation));
    }

    #[test]
    fn test_duplicate_conversation() {
        let (existing, tenant, landlord) = open_conversation();
        let err = Conversation::start(existing.listing_id, landlord, tenant, &[existing]).unwrap_err();
        assert!(matches!(err, MessagingError::Duplicate));
    }

    #[test]
    fn test_same_pair_on_other_listing_is_fine() {
        let (existing, tenant, landlord) = open_conversation();
        assert!(Conversation::start(ListingId::new(), landlord, tenant, &[existing]).is_ok());
    }

    #[test]
    fn test_after_leaving_a_new_conversation_may_start() {
        let (mut existing, tenant, landlord) = open_conversation();
        existing.leave(landlord).unwrap();
        assert!(Conversation::start(existing.listing_id, landlord, tenant, &[existing]).is_ok());
    }
}

mod message_tests {
    use super::*;

    #[test]
    fn test_send_updates_last_updated() {
        let (mut conversation, tenant, _) = open_conversation();
        let before = conversation.last_updated;
        let message = conversation.send(tenant, draft("Hello!")).unwrap();

        assert_eq!(message.content, "Hello!");
        assert!(!message.read);
        assert_eq!(conversation.last_updated, message.timestamp);
        assert!(conversation.last_updated >= before);
    }

    #[test]
    fn test_non_participant_gets_not_found() {
        let (mut conversation, _, _) = open_conversation();
        let err = conversation.send(UserId::new(), draft("Should not work")).unwrap_err();
        assert!(matches!(err, MessagingError::NotFound));
        assert!(conversation.ensure_participant(UserId::new()).is_err());
    }

    #[test]
    fn test_blank_message_rejected() {
        let (mut conversation, tenant, _) = open_conversation();
        let err = conversation.send(tenant, draft("   ")).unwrap_err();
        assert!(matches!(err, MessagingError::Validation(e) if e.contains("content")));
    }

    #[test]
    fn test_unread_and_mark_read() {
        let (mut conversation, tenant, landlord) = open_conversation();
        let mut messages = vec![
            conversation.send(tenant, draft("Is it available?")).unwrap(),
            conversation.send(landlord, draft("Yes")).unwrap(),
            conversation.send(landlord, draft("Want a viewing?")).unwrap(),
        ];

        assert_eq!(unread_for(tenant, &messages).len(), 2);
        assert_eq!(unread_for(landlord, &messages).len(), 1);

        let changed = mark_read(tenant, &mut messages);
        assert_eq!(changed.len(), 2);
        assert!(unread_for(tenant, &messages).is_empty());
        assert!(!messages[0].read);
    }
}

mod leave_delete_tests {
    use super::*;

    #[test]
    fn test_leave() {
        let (mut conversation, tenant, _) = open_conversation();
        assert_eq!(conversation.leave(tenant).unwrap(), LeaveResult::Remaining(1));
        assert!(!conversation.is_participant(tenant));
    }

    #[test]
    fn test_last_leave_abandons() {
        let (mut conversation, tenant, landlord) = open_conversation();
        conversation.leave(tenant).unwrap();
        assert_eq!(conversation.leave(landlord).unwrap(), LeaveResult::Abandoned);
    }

    #[test]
    fn test_delete_with_multiple_participants_forbidden() {
        let (conversation, tenant, _) = open_conversation();
        assert!(matches!(
            conversation.ensure_deletable_by(tenant),
            Err(MessagingError::OtherParticipantsRemain)
        ));
    }

    #[test]
    fn test_delete_as_sole_participant() {
        let (mut conversation, tenant, landlord) = open_conversation();
        conversation.leave(landlord).unwrap();
        assert!(conversation.ensure_deletable_by(tenant).is_ok());
    }
}
