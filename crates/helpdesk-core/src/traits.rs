use std::future::Future;

use helpdesk_types::{
    Access, ChannelId, ChannelInfo, GuildId, MessageId, NewChannel, OutgoingMessage, Principal,
    RecentMessage, RoleId, Subject, SubjectId, Target,
};

use crate::error::GatewayError;

/// Everything the core needs from the live chat connection.
///
/// Lookups return `Ok(None)` when the platform reports the entity as
/// unknown; any other failure is an `Err`. Implement this over the real
/// client in the bot crate and over [`crate::mocks::MockGateway`] in tests.
pub trait Gateway: Send + Sync + Clone + 'static {
    /// The bot's own user id (0 before the connection is ready).
    fn bot_id(&self) -> SubjectId;

    fn channel(
        &self,
        channel_id: ChannelId,
    ) -> impl Future<Output = Result<Option<ChannelInfo>, GatewayError>> + Send;

    /// Every channel of the guild, categories included.
    fn guild_channels(
        &self,
        guild_id: GuildId,
    ) -> impl Future<Output = Result<Vec<ChannelInfo>, GatewayError>> + Send;

    fn member(
        &self,
        guild_id: GuildId,
        subject_id: SubjectId,
    ) -> impl Future<Output = Result<Option<Subject>, GatewayError>> + Send;

    fn role_exists(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
    ) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    fn create_text_channel(
        &self,
        channel: NewChannel,
    ) -> impl Future<Output = Result<ChannelInfo, GatewayError>> + Send;

    /// Re-parent a channel under `category_id`.
    fn move_channel(
        &self,
        channel_id: ChannelId,
        category_id: ChannelId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn delete_channel(
        &self,
        channel_id: ChannelId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Set (`Some`) or remove (`None`) the access grant of `principal`.
    fn set_access_grant(
        &self,
        channel_id: ChannelId,
        principal: Principal,
        access: Option<Access>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn send_message(
        &self,
        target: Target,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<MessageId, GatewayError>> + Send;

    /// Up to `limit` messages, newest first.
    fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> impl Future<Output = Result<Vec<RecentMessage>, GatewayError>> + Send;
}
