//! Per-bot API surface and the host-facing handler seam.
//!
//! [`DodoBot`] owns one credential, its REST client, and the cached
//! self-identity. The typed endpoint wrappers are mechanical mirrors of the
//! open-platform API: one request shape in, one typed return out, no per-call
//! logic. [`EventHandler`] is the trait the host framework implements to
//! consume decoded events.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::config::BotConfig;
use crate::error::{AdapterError, Result};
use crate::event::Event;
use crate::message::{Message, MessageSegment};
use crate::model::{
    ArticleAddRequest, ArticleBusinessType, BotInfo, BotInviteInfo, ChannelAddRequest, ChannelData,
    ChannelEditRequest, ChannelInfo, ChannelMessageSendRequest, ChannelVoiceMemberStatusInfo,
    DodoIdMapData, Emoji, GiftAccountInfo, GiftGrossValueInfo, GiftInfo, GiftMemberInfo,
    GiftShareRatioInfo, IntegralInfo, IslandInfo, IslandLevelRankInfo, IslandMuteOrBanData,
    ListResult, ManageOperateType, MemberBanAddRequest, MemberInfo, MemberInvitationInfo,
    MemberMuteAddRequest, MemberRoleInfo, MessageBody, MessageReactionInfo,
    MessageReactionMemberInfo, MessageReturn, PersonalMessageSendRequest, PictureInfo, RoleAddRequest,
    RoleData, RoleEditRequest, RoleInfo, RoleMemberInfo, TargetType, WebSocketConnection,
};

/// Host-facing collaborator: receives every decoded event plus connection
/// lifecycle notifications for each bot.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one decoded event. Called from a per-event task: a slow
    /// handler never stalls frame consumption or the heartbeat.
    async fn dispatch(&self, bot: Arc<DodoBot>, event: Event);

    /// Called when a bot's realtime connection is established.
    async fn on_connect(&self, _bot_info: &BotInfo) {}

    /// Called when a bot's realtime connection is torn down.
    async fn on_disconnect(&self, _bot_info: &BotInfo) {}
}

/// One configured bot: credential, REST client, cached identity.
pub struct DodoBot {
    config: BotConfig,
    api: ApiClient,
    bot_info: RwLock<Option<BotInfo>>,
}

impl DodoBot {
    pub fn new(config: BotConfig, api_base: &str) -> Self {
        let api = ApiClient::new(api_base, &config.client_id, &config.token);
        Self {
            config,
            api,
            bot_info: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Last-known self-identity; `None` until the first successful
    /// `get_bot_info` call.
    pub async fn bot_info(&self) -> Option<BotInfo> {
        self.bot_info.read().await.clone()
    }

    /// Generic escape hatch: calls any endpoint with a raw JSON payload and
    /// returns the envelope's `data`.
    pub async fn call(&self, path: &str, params: Value) -> Result<Value> {
        self.api.call(path, &params).await
    }

    async fn call_parsed<T, P>(&self, path: &str, payload: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let data = self.api.call(path, payload).await?;
        serde_json::from_value(data)
            .map_err(|_| AdapterError::Network("API request error when parsing response".to_string()))
    }

    async fn call_unit<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<()> {
        self.api.call(path, payload).await?;
        Ok(())
    }

    // Sending.

    /// Replies to a message event. Returns the sent message id. Events
    /// without an addressable origin are rejected with
    /// [`AdapterError::ReplyTargetUnavailable`].
    pub async fn send(&self, event: &Event, message: impl Into<Message>) -> Result<String> {
        self.send_with(event, message, false, false).await
    }

    /// [`send`](Self::send) with explicit addressing: `at_sender` prepends a
    /// mention of the event's author, `reply_message` prepends a reply
    /// reference to the triggering message.
    pub async fn send_with(
        &self,
        event: &Event,
        message: impl Into<Message>,
        at_sender: bool,
        reply_message: bool,
    ) -> Result<String> {
        match event {
            Event::ChannelMessage(ev) => {
                let mut message = message.into();
                if at_sender {
                    message.insert(0, MessageSegment::at_user(&ev.dodo_source_id));
                }
                if reply_message {
                    message.insert(0, MessageSegment::reference(&ev.message_id));
                }
                self.send_to_channel(&ev.channel_id, message).await
            }
            Event::PersonalMessage(ev) => {
                let island_source_id = ev
                    .island_source_id
                    .as_deref()
                    .ok_or(AdapterError::ReplyTargetUnavailable)?;
                self.send_to_personal(island_source_id, &ev.dodo_source_id, message)
                    .await
            }
            _ => Err(AdapterError::ReplyTargetUnavailable),
        }
    }

    /// Sends a message to a channel. Returns the sent message id.
    pub async fn send_to_channel(
        &self,
        channel_id: &str,
        message: impl Into<Message>,
    ) -> Result<String> {
        let (body, referenced_message_id) = message.into().to_body();
        Ok(self
            .set_channel_message_send(channel_id, &body, referenced_message_id.as_deref(), None)
            .await?
            .message_id)
    }

    /// Sends a channel message visible only to one user.
    pub async fn send_to_channel_personal(
        &self,
        channel_id: &str,
        dodo_source_id: &str,
        message: impl Into<Message>,
    ) -> Result<String> {
        let (body, referenced_message_id) = message.into().to_body();
        Ok(self
            .set_channel_message_send(
                channel_id,
                &body,
                referenced_message_id.as_deref(),
                Some(dodo_source_id),
            )
            .await?
            .message_id)
    }

    /// Sends a direct message. Any reply reference in the message is
    /// dropped: direct messages cannot reference.
    pub async fn send_to_personal(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        message: impl Into<Message>,
    ) -> Result<String> {
        let (body, _) = message.into().to_body();
        Ok(self
            .set_personal_message_send(island_source_id, dodo_source_id, &body)
            .await?
            .message_id)
    }

    // Bot endpoints.

    /// Fetches and caches the bot's own identity.
    pub async fn get_bot_info(&self) -> Result<BotInfo> {
        let info: BotInfo = self.call_parsed("bot/info", &json!({})).await?;
        *self.bot_info.write().await = Some(info.clone());
        Ok(info)
    }

    pub async fn set_bot_island_leave(&self, island_source_id: &str) -> Result<()> {
        self.call_unit("bot/island/leave", &json!({"islandSourceId": island_source_id}))
            .await
    }

    pub async fn get_bot_invite_list(
        &self,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<BotInviteInfo>> {
        self.call_parsed(
            "bot/invite/list",
            &json!({"pageSize": page_size, "maxId": max_id}),
        )
        .await
    }

    pub async fn set_bot_invite_add(&self, dodo_source_id: &str) -> Result<()> {
        self.call_unit("bot/invite/add", &json!({"dodoSourceId": dodo_source_id}))
            .await
    }

    pub async fn set_bot_invite_remove(&self, dodo_source_id: &str) -> Result<()> {
        self.call_unit("bot/invite/remove", &json!({"dodoSourceId": dodo_source_id}))
            .await
    }

    // Island endpoints.

    pub async fn get_island_list(&self) -> Result<Vec<IslandInfo>> {
        self.call_parsed("island/list", &json!({})).await
    }

    pub async fn get_island_info(&self, island_source_id: &str) -> Result<IslandInfo> {
        self.call_parsed("island/info", &json!({"islandSourceId": island_source_id}))
            .await
    }

    pub async fn get_island_level_rank_list(
        &self,
        island_source_id: &str,
    ) -> Result<Vec<IslandLevelRankInfo>> {
        self.call_parsed(
            "island/level/rank/list",
            &json!({"islandSourceId": island_source_id}),
        )
        .await
    }

    pub async fn get_island_mute_list(
        &self,
        island_source_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<IslandMuteOrBanData>> {
        self.call_parsed(
            "island/mute/list",
            &json!({"islandSourceId": island_source_id, "pageSize": page_size, "maxId": max_id}),
        )
        .await
    }

    pub async fn get_island_ban_list(
        &self,
        island_source_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<IslandMuteOrBanData>> {
        self.call_parsed(
            "island/ban/list",
            &json!({"islandSourceId": island_source_id, "pageSize": page_size, "maxId": max_id}),
        )
        .await
    }

    // Channel endpoints.

    pub async fn get_channel_list(&self, island_source_id: &str) -> Result<Vec<ChannelInfo>> {
        self.call_parsed("channel/list", &json!({"islandSourceId": island_source_id}))
            .await
    }

    pub async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.call_parsed("channel/info", &json!({"channelId": channel_id}))
            .await
    }

    pub async fn set_channel_add(&self, request: ChannelAddRequest<'_>) -> Result<ChannelData> {
        self.call_parsed("channel/add", &request).await
    }

    pub async fn set_channel_edit(&self, request: ChannelEditRequest<'_>) -> Result<()> {
        self.call_unit("channel/edit", &request).await
    }

    pub async fn set_channel_remove(
        &self,
        island_source_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "channel/remove",
            &json!({"islandSourceId": island_source_id, "channelId": channel_id}),
        )
        .await
    }

    // Channel message endpoints.

    pub async fn set_channel_message_send(
        &self,
        channel_id: &str,
        message_body: &MessageBody,
        referenced_message_id: Option<&str>,
        dodo_source_id: Option<&str>,
    ) -> Result<MessageReturn> {
        let request = ChannelMessageSendRequest {
            channel_id,
            message_type: message_body.message_type(),
            message_body,
            referenced_message_id,
            dodo_source_id,
        };
        self.call_parsed("channel/message/send", &request).await
    }

    pub async fn set_channel_message_edit(
        &self,
        message_id: &str,
        message_body: &MessageBody,
    ) -> Result<()> {
        self.call_unit(
            "channel/message/edit",
            &json!({"messageId": message_id, "messageBody": message_body}),
        )
        .await
    }

    pub async fn set_channel_message_withdraw(
        &self,
        message_id: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        let payload = match reason {
            Some(reason) => json!({"messageId": message_id, "reason": reason}),
            None => json!({"messageId": message_id}),
        };
        self.call_unit("channel/message/withdraw", &payload).await
    }

    pub async fn set_channel_message_top(&self, message_id: &str, is_cancel: bool) -> Result<()> {
        self.call_unit(
            "channel/message/top",
            &json!({"messageId": message_id, "operateType": if is_cancel { 0 } else { 1 }}),
        )
        .await
    }

    pub async fn get_channel_message_reaction_list(
        &self,
        message_id: &str,
    ) -> Result<Vec<MessageReactionInfo>> {
        self.call_parsed(
            "channel/message/reaction/list",
            &json!({"messageId": message_id}),
        )
        .await
    }

    pub async fn get_channel_message_reaction_member_list(
        &self,
        message_id: &str,
        emoji: &Emoji,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<MessageReactionMemberInfo>> {
        self.call_parsed(
            "channel/message/reaction/member/list",
            &json!({"messageId": message_id, "emoji": emoji, "pageSize": page_size, "maxId": max_id}),
        )
        .await
    }

    pub async fn set_channel_message_reaction_add(
        &self,
        message_id: &str,
        emoji: &Emoji,
    ) -> Result<()> {
        self.call_unit(
            "channel/message/reaction/add",
            &json!({"messageId": message_id, "emoji": emoji}),
        )
        .await
    }

    pub async fn set_channel_message_reaction_remove(
        &self,
        message_id: &str,
        emoji: &Emoji,
        dodo_source_id: Option<&str>,
    ) -> Result<()> {
        let payload = match dodo_source_id {
            Some(dodo_source_id) => {
                json!({"messageId": message_id, "emoji": emoji, "dodoSourceId": dodo_source_id})
            }
            None => json!({"messageId": message_id, "emoji": emoji}),
        };
        self.call_unit("channel/message/reaction/remove", &payload)
            .await
    }

    // Voice channel endpoints.

    pub async fn get_channel_voice_member_status(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<ChannelVoiceMemberStatusInfo> {
        self.call_parsed(
            "channel/voice/member/status",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn set_channel_voice_member_move(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "channel/voice/member/move",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "channelId": channel_id
            }),
        )
        .await
    }

    pub async fn set_channel_voice_member_edit(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        operate_type: ManageOperateType,
    ) -> Result<()> {
        self.call_unit(
            "channel/voice/member/edit",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "operateType": operate_type
            }),
        )
        .await
    }

    // Article channel endpoints.

    pub async fn set_channel_article_add(
        &self,
        request: ArticleAddRequest<'_>,
    ) -> Result<crate::model::ChannelArticleData> {
        self.call_parsed("channel/article/add", &request).await
    }

    pub async fn set_channel_article_remove(
        &self,
        channel_id: &str,
        business_type: ArticleBusinessType,
        id: &str,
    ) -> Result<()> {
        self.call_unit(
            "channel/article/remove",
            &json!({"channelId": channel_id, "type": business_type, "id": id}),
        )
        .await
    }

    // Role endpoints.

    pub async fn get_role_list(&self, island_source_id: &str) -> Result<Vec<RoleInfo>> {
        self.call_parsed("role/list", &json!({"islandSourceId": island_source_id}))
            .await
    }

    pub async fn set_role_add(&self, request: RoleAddRequest<'_>) -> Result<RoleData> {
        self.call_parsed("role/add", &request).await
    }

    pub async fn set_role_edit(&self, request: RoleEditRequest<'_>) -> Result<()> {
        self.call_unit("role/edit", &request).await
    }

    pub async fn set_role_remove(&self, island_source_id: &str, role_id: &str) -> Result<()> {
        self.call_unit(
            "role/remove",
            &json!({"islandSourceId": island_source_id, "roleId": role_id}),
        )
        .await
    }

    pub async fn get_role_member_list(
        &self,
        island_source_id: &str,
        role_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<RoleMemberInfo>> {
        self.call_parsed(
            "role/member/list",
            &json!({
                "islandSourceId": island_source_id,
                "roleId": role_id,
                "pageSize": page_size,
                "maxId": max_id
            }),
        )
        .await
    }

    pub async fn set_role_member_add(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "role/member/add",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "roleId": role_id
            }),
        )
        .await
    }

    pub async fn set_role_member_remove(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "role/member/remove",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "roleId": role_id
            }),
        )
        .await
    }

    // Member endpoints.

    pub async fn get_member_list(
        &self,
        island_source_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<MemberInfo>> {
        self.call_parsed(
            "member/list",
            &json!({"islandSourceId": island_source_id, "pageSize": page_size, "maxId": max_id}),
        )
        .await
    }

    pub async fn get_member_info(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<MemberInfo> {
        self.call_parsed(
            "member/info",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn get_member_role_list(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<Vec<MemberRoleInfo>> {
        self.call_parsed(
            "member/role/list",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn get_member_invitation_info(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<MemberInvitationInfo> {
        self.call_parsed(
            "member/invitation/info",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn get_member_dodo_id_map_list(
        &self,
        dodo_id_list: &[String],
    ) -> Result<Vec<DodoIdMapData>> {
        self.call_parsed("member/dodoid/map/list", &json!({"dodoIdList": dodo_id_list}))
            .await
    }

    pub async fn set_member_nick_name_edit(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        nick_name: &str,
    ) -> Result<()> {
        self.call_unit(
            "member/nickname/edit",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "nickName": nick_name
            }),
        )
        .await
    }

    pub async fn set_member_mute_add(&self, request: MemberMuteAddRequest<'_>) -> Result<()> {
        self.call_unit("member/mute/add", &request).await
    }

    pub async fn set_member_mute_remove(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "member/mute/remove",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn set_member_ban_add(&self, request: MemberBanAddRequest<'_>) -> Result<()> {
        self.call_unit("member/ban/add", &request).await
    }

    pub async fn set_member_ban_remove(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<()> {
        self.call_unit(
            "member/ban/remove",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    // Gift and integral endpoints.

    pub async fn get_gift_account(&self, island_source_id: &str) -> Result<GiftAccountInfo> {
        self.call_parsed(
            "gift/account/info",
            &json!({"islandSourceId": island_source_id}),
        )
        .await
    }

    pub async fn get_gift_share_ratio_info(
        &self,
        island_source_id: &str,
    ) -> Result<GiftShareRatioInfo> {
        self.call_parsed(
            "gift/share/ratio/info",
            &json!({"islandSourceId": island_source_id}),
        )
        .await
    }

    pub async fn get_gift_list(
        &self,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<Vec<GiftInfo>> {
        self.call_parsed(
            "gift/list",
            &json!({"targetType": target_type, "targetId": target_id}),
        )
        .await
    }

    pub async fn get_gift_member_list(
        &self,
        target_type: TargetType,
        target_id: &str,
        gift_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<GiftMemberInfo>> {
        self.call_parsed(
            "gift/member/list",
            &json!({
                "targetType": target_type,
                "targetId": target_id,
                "giftId": gift_id,
                "pageSize": page_size,
                "maxId": max_id
            }),
        )
        .await
    }

    pub async fn get_gift_gross_value_list(
        &self,
        target_type: TargetType,
        target_id: &str,
        page_size: i64,
        max_id: i64,
    ) -> Result<ListResult<GiftGrossValueInfo>> {
        self.call_parsed(
            "gift/gross/value/list",
            &json!({
                "targetType": target_type,
                "targetId": target_id,
                "pageSize": page_size,
                "maxId": max_id
            }),
        )
        .await
    }

    pub async fn get_integral_info(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
    ) -> Result<IntegralInfo> {
        self.call_parsed(
            "integral/info",
            &json!({"islandSourceId": island_source_id, "dodoSourceId": dodo_source_id}),
        )
        .await
    }

    pub async fn set_integral_edit(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        integral: i64,
        is_add: bool,
    ) -> Result<IntegralInfo> {
        self.call_parsed(
            "integral/edit",
            &json!({
                "islandSourceId": island_source_id,
                "dodoSourceId": dodo_source_id,
                "integral": integral,
                "operateType": if is_add { 1 } else { 2 }
            }),
        )
        .await
    }

    // Personal message and resource endpoints.

    pub async fn set_personal_message_send(
        &self,
        island_source_id: &str,
        dodo_source_id: &str,
        message_body: &MessageBody,
    ) -> Result<MessageReturn> {
        let request = PersonalMessageSendRequest {
            island_source_id,
            dodo_source_id,
            message_type: message_body.message_type(),
            message_body,
        };
        self.call_parsed("personal/message/send", &request).await
    }

    pub async fn set_resource_picture_upload(&self, file: Vec<u8>) -> Result<PictureInfo> {
        let data = self
            .api
            .call_multipart("resource/picture/upload", "file", file)
            .await?;
        serde_json::from_value(data)
            .map_err(|_| AdapterError::Network("API request error when parsing response".to_string()))
    }

    // Gateway endpoint.

    pub async fn get_websocket_connection(&self) -> Result<WebSocketConnection> {
        self.call_parsed("websocket/connection", &json!({})).await
    }
}
