use super::{non_empty, parse_id, CommandDispatcher, CommandError};
use super::{GetMessages, IineMessage, ModifyMessage, SendMessage};
use crate::domain::database::ChatDatabase;
use crate::domain::event::DeliveryEvent;
use crate::domain::Message;
use crate::library::communication::event::NotificationPublisher;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

type HandlerResult = Result<Option<DeliveryEvent>, CommandError>;

impl<D, P> CommandDispatcher<D, P>
where
    D: ChatDatabase + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    /// Persists a message, requests unread counters to be bumped and delivers it to all members
    #[instrument(skip(self, payload), fields(room = %payload.room))]
    pub(super) async fn send_message(
        &self,
        user: &ObjectId,
        payload: SendMessage,
    ) -> HandlerResult {
        let text = non_empty("message", &payload.message)?;
        let room_id = parse_id("room", &payload.room)?;

        let room = self
            .database
            .find_room(&room_id)
            .await?
            .ok_or_else(|| CommandError::NotFound(format!("room {}", room_id)))?;

        let author = self
            .database
            .find_user(user)
            .await?
            .ok_or_else(|| CommandError::NotFound(format!("user {}", user)))?;

        let message = Message::new(room.id, *user, text.to_owned());
        self.database.insert_message(&message).await?;

        let room_hex = room.id.to_hex();
        let user_hex = user.to_hex();
        self.producer
            .add_unread_queue(&room_hex, Some(&user_hex))
            .await?;

        let members = self.database.member_ids(&room.id).await?;
        let event = DeliveryEvent::MessageReceive {
            message: message.view(Some(author.account)),
            room: room_hex,
        };
        self.producer.add_queue_to_users(&members, &event).await?;

        debug!(message = %message.id, "Message sent");
        Ok(None)
    }

    /// Replaces the text of a message authored by the caller
    #[instrument(skip(self, payload), fields(message = %payload.id))]
    pub(super) async fn modify_message(
        &self,
        user: &ObjectId,
        payload: ModifyMessage,
    ) -> HandlerResult {
        let id = parse_id("id", &payload.id)?;
        let text = non_empty("message", &payload.message)?;

        let message = self
            .database
            .find_message(&id)
            .await?
            .ok_or_else(|| CommandError::NotFound(format!("message {}", id)))?;

        if message.user_id != *user {
            return Err(CommandError::Forbidden(format!(
                "message {} has been written by another user",
                id
            )));
        }

        let updated_at = Utc::now();
        self.database
            .update_message(&id, text, updated_at)
            .await?;

        let account = self.database.find_user(user).await?.map(|u| u.account);
        let modified = Message {
            message: text.to_owned(),
            updated: true,
            updated_at: Some(updated_at),
            ..message
        };

        let members = self.database.member_ids(&modified.room_id).await?;
        let event = DeliveryEvent::MessageModify {
            message: modified.view(account),
            room: modified.room_id.to_hex(),
        };
        self.producer.add_queue_to_users(&members, &event).await?;

        Ok(None)
    }

    /// Adds a reaction to any message and delivers the new count to all members
    #[instrument(skip(self, _user, payload), fields(message = %payload.id))]
    pub(super) async fn iine_message(
        &self,
        _user: &ObjectId,
        payload: IineMessage,
    ) -> HandlerResult {
        let id = parse_id("id", &payload.id)?;

        let message = self
            .database
            .increment_iine(&id)
            .await?
            .ok_or_else(|| CommandError::NotFound(format!("message {}", id)))?;

        let members = self.database.member_ids(&message.room_id).await?;
        let event = DeliveryEvent::MessageIine {
            iine: message.iine,
            room: message.room_id.to_hex(),
            id: message.id.to_hex(),
        };
        self.producer.add_queue_to_users(&members, &event).await?;

        Ok(None)
    }

    /// Returns one page of the message history of a room the caller is a member of
    #[instrument(skip(self, payload), fields(room = %payload.room))]
    pub(super) async fn room_messages(
        &self,
        user: &ObjectId,
        payload: GetMessages,
    ) -> HandlerResult {
        let room = parse_id("room", &payload.room)?;
        let before = payload
            .id
            .as_deref()
            .map(|id| parse_id("id", id))
            .transpose()?;

        if self.database.find_membership(user, &room).await?.is_none() {
            return Err(CommandError::Forbidden(format!(
                "not a member of room {}",
                room
            )));
        }

        // One additional row tells whether an older page exists
        let mut page = self
            .database
            .messages_page(&room, before.as_ref(), self.page_size + 1)
            .await?;
        let exist_history = page.len() > self.page_size;
        page.truncate(self.page_size);

        let authors: Vec<ObjectId> = page
            .iter()
            .map(|message| message.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let accounts: HashMap<ObjectId, String> = self
            .database
            .find_users(&authors)
            .await?
            .into_iter()
            .map(|user| (user.id, user.account))
            .collect();

        let messages = page
            .iter()
            .map(|message| message.view(accounts.get(&message.user_id).cloned()))
            .collect();

        Ok(Some(DeliveryEvent::MessagesRoom {
            room: room.to_hex(),
            messages,
            exist_history,
        }))
    }
}

#[cfg(test)]
mod does {
    use super::super::fixtures::{deliveries, setup};
    use super::*;
    use crate::domain::event::UnreadNotification;
    use crate::domain::Enter;
    use crate::library::communication::event::Notification;
    use pretty_assertions::assert_eq;

    fn send(room: &ObjectId, text: &str) -> String {
        format!(
            r#"{{"cmd":"message:send","message":"{}","room":"{}"}}"#,
            text,
            room.to_hex()
        )
    }

    #[tokio::test]
    async fn deliver_sent_messages_to_every_member() {
        let (database, factory, dispatcher) = setup();
        let alice = database.insert_user("alice");
        let bob = database.insert_user("bob");
        let room = database.insert_room("general");
        database.insert_membership(Enter::new(alice, room));
        database.insert_membership(Enter::new(bob, room));

        let response = dispatcher
            .dispatch(&alice.to_hex(), &send(&room, "  hello  "))
            .await
            .unwrap();
        assert_eq!(response, None);

        let stored = database.messages();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message, "hello");

        let delivered = deliveries(&factory);
        let mut recipients: Vec<String> = delivered
            .iter()
            .map(|notification| notification.user.clone().unwrap())
            .collect();
        recipients.sort();
        let mut expected = vec![alice.to_hex(), bob.to_hex()];
        expected.sort();
        assert_eq!(recipients, expected);

        match &delivered[0].event {
            DeliveryEvent::MessageReceive { message, room: r } => {
                assert_eq!(r, &room.to_hex());
                assert_eq!(message.message, "hello");
                assert_eq!(message.user_account.as_deref(), Some("alice"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let unread: Vec<UnreadNotification> = factory
            .store()
            .payloads(&UnreadNotification::queue(), UnreadNotification::TAG);
        assert_eq!(
            unread,
            vec![UnreadNotification {
                room_id: room.to_hex(),
                user_id: Some(alice.to_hex())
            }]
        );
    }

    #[tokio::test]
    async fn reject_empty_messages_and_rooms() {
        let (database, factory, dispatcher) = setup();
        let alice = database.insert_user("alice");
        let room = database.insert_room("general");

        let result = dispatcher
            .dispatch(&alice.to_hex(), &send(&room, " "))
            .await;
        assert!(matches!(result, Err(CommandError::BadRequest(_))));

        let result = dispatcher
            .dispatch(
                &alice.to_hex(),
                r#"{"cmd":"message:send","message":"hi","room":""}"#,
            )
            .await;
        assert!(matches!(result, Err(CommandError::BadRequest(_))));

        let result = dispatcher
            .dispatch(&alice.to_hex(), &send(&ObjectId::new(), "hi"))
            .await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));

        assert!(database.messages().is_empty());
        assert!(deliveries(&factory).is_empty());
    }

    #[tokio::test]
    async fn allow_only_authors_to_modify_messages() {
        let (database, factory, dispatcher) = setup();
        let alice = database.insert_user("alice");
        let mallory = database.insert_user("mallory");
        let room = database.insert_room("general");
        database.insert_membership(Enter::new(alice, room));
        let message = Message::new(room, alice, "original".into());
        database.insert_message(&message).await.unwrap();

        let payload = format!(
            r#"{{"cmd":"message:modify","id":"{}","message":"tampered"}}"#,
            message.id.to_hex()
        );
        let result = dispatcher.dispatch(&mallory.to_hex(), &payload).await;
        assert!(matches!(result, Err(CommandError::Forbidden(_))));
        assert_eq!(database.message(&message.id).unwrap().message, "original");
        assert!(deliveries(&factory).is_empty());

        let payload = format!(
            r#"{{"cmd":"message:modify","id":"{}","message":"edited"}}"#,
            message.id.to_hex()
        );
        dispatcher.dispatch(&alice.to_hex(), &payload).await.unwrap();

        let stored = database.message(&message.id).unwrap();
        assert_eq!(stored.message, "edited");
        assert!(stored.updated);
        assert!(stored.updated_at.is_some());

        let delivered = deliveries(&factory);
        assert_eq!(delivered.len(), 1);
        match &delivered[0].event {
            DeliveryEvent::MessageModify { message, .. } => {
                assert_eq!(message.message, "edited");
                assert!(message.updated);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn let_anybody_react_to_messages() {
        let (database, factory, dispatcher) = setup();
        let alice = database.insert_user("alice");
        let bob = database.insert_user("bob");
        let room = database.insert_room("general");
        database.insert_membership(Enter::new(alice, room));
        let message = Message::new(room, alice, "hi".into());
        database.insert_message(&message).await.unwrap();

        let payload = format!(r#"{{"cmd":"message:iine","id":"{}"}}"#, message.id.to_hex());
        dispatcher.dispatch(&bob.to_hex(), &payload).await.unwrap();
        dispatcher.dispatch(&bob.to_hex(), &payload).await.unwrap();

        assert_eq!(database.message(&message.id).unwrap().iine, 2);

        let delivered = deliveries(&factory);
        assert_eq!(delivered.len(), 2);
        assert_eq!(
            delivered[1].event,
            DeliveryEvent::MessageIine {
                iine: 2,
                room: room.to_hex(),
                id: message.id.to_hex()
            }
        );
    }

    #[tokio::test]
    async fn page_through_history_newest_first() {
        let (database, _, dispatcher) = setup();
        let dispatcher = dispatcher.with_page_size(2);
        let alice = database.insert_user("alice");
        let room = database.insert_room("general");
        database.insert_membership(Enter::new(alice, room));

        for text in ["one", "two", "three"] {
            let message = Message::new(room, alice, text.into());
            database.insert_message(&message).await.unwrap();
        }

        let payload = format!(r#"{{"cmd":"messages:room","room":"{}"}}"#, room.to_hex());
        let response = dispatcher
            .dispatch(&alice.to_hex(), &payload)
            .await
            .unwrap()
            .unwrap();

        let oldest_seen = match response.event {
            DeliveryEvent::MessagesRoom {
                messages,
                exist_history,
                ..
            } => {
                let texts: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
                assert_eq!(texts, vec!["three", "two"]);
                assert!(exist_history);
                assert!(messages
                    .iter()
                    .all(|m| m.user_account.as_deref() == Some("alice")));
                messages[1].id.clone()
            }
            other => panic!("unexpected event {:?}", other),
        };

        let payload = format!(
            r#"{{"cmd":"messages:room","room":"{}","before":"{}"}}"#,
            room.to_hex(),
            oldest_seen
        );
        let response = dispatcher
            .dispatch(&alice.to_hex(), &payload)
            .await
            .unwrap()
            .unwrap();

        match response.event {
            DeliveryEvent::MessagesRoom {
                messages,
                exist_history,
                ..
            } => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].message, "one");
                assert!(!exist_history);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn hide_history_from_non_members() {
        let (database, _, dispatcher) = setup();
        let alice = database.insert_user("alice");
        let room = database.insert_room("general");

        let payload = format!(r#"{{"cmd":"messages:room","room":"{}"}}"#, room.to_hex());
        let result = dispatcher.dispatch(&alice.to_hex(), &payload).await;

        assert!(matches!(result, Err(CommandError::Forbidden(_))));
    }
}
