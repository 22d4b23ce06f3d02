use super::{non_empty, parse_id, CommandDispatcher, CommandError};
use super::{EnterRoom, RoomReference, SortRooms};
use crate::domain::database::ChatDatabase;
use crate::domain::event::{DeliveryEvent, DeliveryNotification};
use crate::domain::Room;
use crate::library::communication::event::NotificationPublisher;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use tracing::{info, instrument};

type HandlerResult = Result<Option<DeliveryEvent>, CommandError>;

impl<D, P> CommandDispatcher<D, P>
where
    D: ChatDatabase + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    /// Joins a room by id or by name, creating named rooms on first use
    #[instrument(skip(self, payload))]
    pub(super) async fn enter_room(&self, user: &ObjectId, payload: EnterRoom) -> HandlerResult {
        let id = payload
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let room = match (id, payload.name.as_deref()) {
            (Some(id), _) => {
                let id = parse_id("id", id)?;
                self.database
                    .find_room(&id)
                    .await?
                    .ok_or_else(|| CommandError::NotFound(format!("room {}", id)))?
            }
            (None, Some(name)) => {
                let name = non_empty("name", name)?;
                self.database.find_or_create_room(name, user).await?
            }
            (None, None) => {
                return Err(CommandError::BadRequest(
                    "either id or name of the room is required".into(),
                ))
            }
        };

        self.database.enter_room(user, &room.id).await?;
        info!(room = %room.id, name = %room.name, "Entered room");

        Ok(Some(DeliveryEvent::RoomsEnterSuccess {
            id: room.id.to_hex(),
            name: room.name,
        }))
    }

    /// Zeroes the unread counter, notifies the callers sessions and records a read receipt
    #[instrument(skip(self, payload), fields(room = %payload.room))]
    pub(super) async fn read_room(&self, user: &ObjectId, payload: RoomReference) -> HandlerResult {
        let room = parse_id("room", &payload.room)?;

        if self.database.reset_unread(user, &room).await? == 0 {
            return Err(CommandError::NotFound(format!(
                "membership in room {}",
                room
            )));
        }

        let room_hex = room.to_hex();
        let user_hex = user.to_hex();

        let notification = DeliveryNotification::new(
            user_hex.clone(),
            DeliveryEvent::RoomsRead {
                room: room_hex.clone(),
            },
        );
        self.producer.add_message_queue(&notification).await?;
        self.producer.add_replied_queue(&room_hex, &user_hex).await?;

        Ok(None)
    }

    /// Lists the memberships of the caller together with the saved room order
    #[instrument(skip(self))]
    pub(super) async fn list_rooms(&self, user: &ObjectId) -> HandlerResult {
        let account = self
            .database
            .find_user(user)
            .await?
            .ok_or_else(|| CommandError::NotFound(format!("user {}", user)))?;

        let memberships = self.database.memberships_of_user(user).await?;
        let ids: Vec<ObjectId> = memberships.iter().map(|enter| enter.room_id).collect();

        let rooms: HashMap<ObjectId, Room> = self
            .database
            .find_rooms(&ids)
            .await?
            .into_iter()
            .map(|room| (room.id, room))
            .collect();

        let rooms = memberships
            .iter()
            .filter_map(|enter| rooms.get(&enter.room_id).map(|room| enter.view(room)))
            .collect();

        Ok(Some(DeliveryEvent::Rooms {
            rooms,
            room_order: account.room_order.iter().map(|id| id.to_hex()).collect(),
        }))
    }

    /// Saves the order in which the caller wants rooms to be listed
    #[instrument(skip(self, payload))]
    pub(super) async fn sort_rooms(&self, user: &ObjectId, payload: SortRooms) -> HandlerResult {
        let order = payload
            .room_order
            .iter()
            .map(|id| parse_id("roomOrder", id))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.database.set_room_order(user, &order).await? {
            return Err(CommandError::NotFound(format!("user {}", user)));
        }

        let notification = DeliveryNotification::new(
            user.to_hex(),
            DeliveryEvent::RoomsSort {
                room_order: order.iter().map(|id| id.to_hex()).collect(),
            },
        );
        self.producer.add_message_queue(&notification).await?;

        Ok(None)
    }

    /// Shows or hides a room in the callers room list
    #[instrument(skip(self, payload), fields(room = %payload.room))]
    pub(super) async fn set_room_visibility(
        &self,
        user: &ObjectId,
        payload: RoomReference,
        show: bool,
    ) -> HandlerResult {
        let room = parse_id("room", &payload.room)?;

        if self.database.set_visibility(user, &room, show).await? == 0 {
            return Err(CommandError::NotFound(format!(
                "membership in room {}",
                room
            )));
        }

        let room = room.to_hex();
        let event = if show {
            DeliveryEvent::RoomsOpen { room }
        } else {
            DeliveryEvent::RoomsClose { room }
        };

        self.producer
            .add_message_queue(&DeliveryNotification::new(user.to_hex(), event))
            .await?;

        Ok(None)
    }
}
