use super::{parse_id, Command, CommandError};
use crate::domain::database::ChatDatabase;
use crate::domain::event::{DeliveryEvent, DeliveryNotification};
use crate::domain::{Producer, DEFAULT_PAGE_SIZE};
use crate::library::communication::event::NotificationPublisher;
use mongodb::bson::oid::ObjectId;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Treatment of commands rejected because of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Return the error to the caller
    Reject,
    /// Log the error and act as if the command had no response
    Discard,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy::Reject
    }
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(ValidationPolicy::Reject),
            "discard" => Ok(ValidationPolicy::Discard),
            other => Err(format!("unknown validation policy '{}'", other)),
        }
    }
}

/// Routes inbound commands to their handlers
///
/// The dispatcher holds no per-connection state and can be cloned into every connection task.
/// Handlers that change state visible to other users publish their effects through the
/// [`Producer`], queries answer the caller directly with a response record.
#[derive(Clone)]
pub struct CommandDispatcher<D, P> {
    pub(super) database: D,
    pub(super) producer: Producer<P>,
    pub(super) page_size: usize,
    policy: ValidationPolicy,
}

impl<D, P> CommandDispatcher<D, P>
where
    D: ChatDatabase + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    /// Creates a new dispatcher rejecting invalid commands
    pub fn new(database: D, producer: Producer<P>) -> Self {
        Self {
            database,
            producer,
            page_size: DEFAULT_PAGE_SIZE,
            policy: ValidationPolicy::default(),
        }
    }

    /// Changes how commands rejected because of the caller are treated
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Changes the number of messages per history page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Decodes and executes a raw command sent by `user`
    ///
    /// Returns the response record for the caller, if the command has one.
    pub async fn dispatch(
        &self,
        user: &str,
        payload: &str,
    ) -> Result<Option<DeliveryNotification>, CommandError> {
        let result = match Command::from_str(payload) {
            Ok(command) => self.execute(user, command).await,
            Err(e) => Err(e),
        };

        self.apply_policy(result)
    }

    /// Executes an already decoded command sent by `user`
    pub async fn dispatch_command(
        &self,
        user: &str,
        command: Command,
    ) -> Result<Option<DeliveryNotification>, CommandError> {
        let result = self.execute(user, command).await;
        self.apply_policy(result)
    }

    #[instrument(skip(self, command), fields(cmd = command.tag()))]
    async fn execute(
        &self,
        user: &str,
        command: Command,
    ) -> Result<Option<DeliveryNotification>, CommandError> {
        let user_id = parse_id("user", user)?;
        let response = self.route(&user_id, command).await?;

        Ok(response.map(|event| DeliveryNotification::new(user_id.to_hex(), event)))
    }

    async fn route(
        &self,
        user: &ObjectId,
        command: Command,
    ) -> Result<Option<DeliveryEvent>, CommandError> {
        match command {
            Command::MessageSend(payload) => self.send_message(user, payload).await,
            Command::MessageModify(payload) => self.modify_message(user, payload).await,
            Command::MessageIine(payload) => self.iine_message(user, payload).await,
            Command::MessagesRoom(payload) => self.room_messages(user, payload).await,
            Command::RoomsEnter(payload) => self.enter_room(user, payload).await,
            Command::RoomsRead(payload) => self.read_room(user, payload).await,
            Command::RoomsGet => self.list_rooms(user).await,
            Command::RoomsSort(payload) => self.sort_rooms(user, payload).await,
            Command::RoomsOpen(payload) => self.set_room_visibility(user, payload, true).await,
            Command::RoomsClose(payload) => self.set_room_visibility(user, payload, false).await,
        }
    }

    fn apply_policy(
        &self,
        result: Result<Option<DeliveryNotification>, CommandError>,
    ) -> Result<Option<DeliveryNotification>, CommandError> {
        match result {
            Err(e) if e.is_client_error() && self.policy == ValidationPolicy::Discard => {
                debug!(error = %e, "Discarded rejected command");
                Ok(None)
            }
            Err(e) => {
                if !e.is_client_error() {
                    warn!(error = ?e, "Command failed");
                }

                Err(e)
            }
            ok => ok,
        }
    }
}
