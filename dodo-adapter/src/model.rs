//! Wire data shapes for the open-platform REST API and the event gateway.
//!
//! Everything here is a declarative serde mirror of a platform structure: field
//! names are lowerCamel on the wire (`rename_all = "camelCase"`), integer-coded
//! enums go through [`int_enum!`], optional request fields are skipped when
//! `None`. No behavior lives in this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::Card;

/// Declares an integer-coded wire enum: (de)serializes through `i64`, rejects
/// unknown codes with a descriptive error.
macro_rules! int_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($variant = $value),+
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($name), " value: {}"),
                        other
                    )),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value as i64
            }
        }
    };
}

// The response envelope wrapping every REST call.

/// `{status, message, data}` envelope returned by every REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

// Message bodies (the seven wire message kinds).

int_enum! {
    /// Wire code of a message body kind.
    MessageType {
        Text = 1,
        Picture = 2,
        Video = 3,
        Share = 4,
        File = 5,
        Card = 6,
        RedPacket = 7,
    }
}

int_enum! {
    OriginType {
        Compressed = 0,
        Raw = 1,
    }
}

int_enum! {
    RedPacketType {
        Lucky = 1,
        Normal = 2,
    }
}

int_enum! {
    ReceiverType {
        AllMember = 1,
        Role = 2,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBody {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureBody {
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_original: Option<OriginType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBody {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    pub jump_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBody {
    pub url: String,
    pub name: String,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedPacketBody {
    #[serde(rename = "type")]
    pub packet_type: RedPacketType,
    pub count: i64,
    pub total_amount: f64,
    pub receiver_type: ReceiverType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id_list: Option<Vec<String>>,
}

/// One of the seven wire message kinds. The wire carries no tag inside the
/// body itself (the sibling `messageType` field holds it), so decoding is
/// untagged and ordered most-specific-first: required-field sets keep the
/// variants disjoint without rejecting unknown wire fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Card(CardBody),
    RedPacket(RedPacketBody),
    File(FileBody),
    Picture(PictureBody),
    Share(ShareBody),
    Video(VideoBody),
    Text(TextBody),
}

impl MessageBody {
    /// The `messageType` wire code matching this body.
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Text(_) => MessageType::Text,
            MessageBody::Picture(_) => MessageType::Picture,
            MessageBody::Video(_) => MessageType::Video,
            MessageBody::Share(_) => MessageType::Share,
            MessageBody::File(_) => MessageType::File,
            MessageBody::Card(_) => MessageType::Card,
            MessageBody::RedPacket(_) => MessageType::RedPacket,
        }
    }
}

impl From<&str> for MessageBody {
    fn from(content: &str) -> Self {
        MessageBody::Text(TextBody {
            content: content.to_string(),
        })
    }
}

// Shared message-model shapes.

int_enum! {
    Sex {
        Privacy = -1,
        Female = 0,
        Male = 1,
    }
}

/// Sender profile attached to message and notice events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personal {
    pub nick_name: String,
    pub avatar_url: String,
    pub sex: Sex,
}

/// Island-membership info attached to channel events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub nick_name: String,
    /// Formatted local datetime as sent by the platform (no timezone).
    pub join_time: String,
}

/// Reply reference carried by a channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub message_id: String,
    pub dodo_source_id: String,
    pub nick_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(rename = "type")]
    pub emoji_type: i64,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTarget {
    #[serde(rename = "type")]
    pub target_type: i64,
    pub id: String,
}

int_enum! {
    ReactionType {
        Delete = 0,
        Add = 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: String,
    pub name: String,
    pub count: i64,
}

/// One card-form field submitted back by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    pub key: String,
    pub value: String,
}

/// One card-list option submitted back by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    pub name: String,
}

int_enum! {
    LeaveType {
        Voluntary = 1,
        Kicked = 2,
    }
}

int_enum! {
    /// What a gift was attached to.
    TargetType {
        Message = 1,
        Article = 2,
    }
}

int_enum! {
    OperateType {
        Sign = 1,
        Invite = 2,
        TransferMoney = 3,
        PurchaseGoods = 4,
        ManageIntegral = 5,
        LeaveGroup = 6,
    }
}

int_enum! {
    GoodsType {
        Role = 1,
        Custom = 2,
    }
}

// REST return mirrors.

/// Paged list shape shared by the `pageSize`/`maxId` endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub max_id: i64,
    pub list: Vec<T>,
}

impl<T> IntoIterator for ListResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

/// The bot's own identity as reported by `bot/info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInfo {
    pub client_id: String,
    pub dodo_source_id: String,
    pub nick_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInviteInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandInfo {
    pub island_source_id: String,
    #[serde(default)]
    pub island_id: Option<String>,
    pub island_name: String,
    pub cover_url: String,
    pub member_count: i64,
    pub online_member_count: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub default_channel_id: String,
    pub system_channel_id: String,
    #[serde(default)]
    pub owner_dodo_source_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandLevelRankInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
    pub level: i64,
    pub rank: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandMuteOrBanData {
    pub dodo_source_id: String,
}

int_enum! {
    ChannelType {
        Text = 1,
        Voice = 2,
        Article = 4,
        Link = 5,
        Profile = 6,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_type: ChannelType,
    #[serde(default)]
    pub island_source_id: Option<String>,
    pub default_flag: bool,
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    pub channel_id: String,
}

/// Message id returned by the send/edit family.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReturn {
    pub message_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageReactionInfo {
    pub emoji: Emoji,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReactionMemberInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
}

int_enum! {
    MicSortStatus {
        UnderMic = 1,
        RequestMic = 2,
        OnMic = 3,
    }
}

int_enum! {
    /// Voice-channel member management action.
    ManageOperateType {
        Down = 0,
        Up = 1,
        Close = 2,
        Remove = 3,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVoiceMemberStatusInfo {
    pub channel_id: String,
    pub spk_status: bool,
    pub mic_status: bool,
    pub mic_sort_status: MicSortStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArticleData {
    pub article_id: String,
}

int_enum! {
    /// What `channel/article/remove` points at.
    ArticleBusinessType {
        Article = 1,
        Comment = 2,
        Reply = 3,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub role_id: String,
    pub role_name: String,
    pub role_color: String,
    pub position: i64,
    pub permission: String,
    pub member_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleData {
    pub role_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMemberInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
}

int_enum! {
    OnlineDevice {
        Offline = 0,
        PcOnline = 1,
        MobileOnline = 2,
    }
}

int_enum! {
    OnlineStatus {
        Offline = 0,
        Online = 1,
        NotDisturb = 2,
        Leave = 3,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    #[serde(default)]
    pub island_source_id: Option<String>,
    pub dodo_source_id: String,
    pub nick_name: String,
    pub personal_nick_name: String,
    pub avatar_url: String,
    /// Formatted local datetime as sent by the platform (no timezone).
    pub join_time: String,
    pub sex: Sex,
    pub level: i64,
    pub is_bot: bool,
    pub online_device: OnlineDevice,
    pub online_status: OnlineStatus,
    #[serde(default)]
    pub inviter_dodo_source_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRoleInfo {
    pub role_id: String,
    pub role_name: String,
    pub role_color: String,
    pub position: i64,
    pub permission: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInvitationInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
    pub invitation_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DodoIdMapData {
    pub dodo_id: String,
    pub dodo_source_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftAccountInfo {
    pub total_income: f64,
    pub settlable_income: f64,
    pub transferable_income: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRatio {
    pub island_ratio: f64,
    pub user_ratio: f64,
    pub platform_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRatio {
    pub role_id: String,
    pub role_name: String,
    pub island_ratio: f64,
    pub user_ratio: f64,
    pub platform_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftShareRatioInfo {
    pub default_ratio: DefaultRatio,
    pub role_ratio_list: Vec<RoleRatio>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftInfo {
    pub gift_id: String,
    pub gift_count: i64,
    pub gift_total_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftMemberInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
    pub gift_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftGrossValueInfo {
    pub dodo_source_id: String,
    pub nick_name: String,
    pub gift_total_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegralInfo {
    pub integral_balance: i64,
}

/// Hosted picture returned by `resource/picture/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct PictureInfo {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Gateway endpoint returned by `websocket/connection`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConnection {
    pub endpoint: String,
}

// REST request mirrors (multi-field endpoints only; one- and two-field
// requests are built inline with `json!`).

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessageSendRequest<'a> {
    pub channel_id: &'a str,
    pub message_type: MessageType,
    pub message_body: &'a MessageBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_message_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dodo_source_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAddRequest<'a> {
    pub island_source_id: &'a str,
    pub channel_type: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEditRequest<'a> {
    pub island_source_id: &'a str,
    pub channel_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleAddRequest<'a> {
    pub channel_id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAddRequest<'a> {
    pub island_source_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleEditRequest<'a> {
    pub island_source_id: &'a str,
    pub role_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMuteAddRequest<'a> {
    pub island_source_id: &'a str,
    pub dodo_source_id: &'a str,
    /// Mute duration in seconds.
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBanAddRequest<'a> {
    pub island_source_id: &'a str,
    pub dodo_source_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_channel_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalMessageSendRequest<'a> {
    pub island_source_id: &'a str,
    pub dodo_source_id: &'a str,
    pub message_type: MessageType,
    pub message_body: &'a MessageBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_type_roundtrip() {
        let v = serde_json::to_value(MessageType::Card).unwrap();
        assert_eq!(v, json!(6));
        let t: MessageType = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(t, MessageType::Card);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: std::result::Result<MessageType, _> = serde_json::from_value(json!(42));
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_sex_value() {
        let s: Sex = serde_json::from_value(json!(-1)).unwrap();
        assert_eq!(s, Sex::Privacy);
    }

    #[test]
    fn test_body_union_picks_specific_variant() {
        // A file body carries url/name/size; it must not decode as a video.
        let body: MessageBody = serde_json::from_value(json!({
            "url": "https://img.imdodo.com/x.zip",
            "name": "x.zip",
            "size": 1024
        }))
        .unwrap();
        assert!(matches!(body, MessageBody::File(_)));

        let body: MessageBody = serde_json::from_value(json!({
            "url": "https://img.imdodo.com/x.png",
            "width": 100,
            "height": 50
        }))
        .unwrap();
        assert!(matches!(body, MessageBody::Picture(_)));

        let body: MessageBody =
            serde_json::from_value(json!({"url": "https://img.imdodo.com/x.mp4"})).unwrap();
        assert!(matches!(body, MessageBody::Video(_)));

        let body: MessageBody = serde_json::from_value(json!({"content": "hi"})).unwrap();
        assert!(matches!(body, MessageBody::Text(_)));
    }

    #[test]
    fn test_optional_request_fields_skipped() {
        let req = ChannelMessageSendRequest {
            channel_id: "100",
            message_type: MessageType::Text,
            message_body: &MessageBody::from("hi"),
            referenced_message_id: None,
            dodo_source_id: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "channelId": "100",
                "messageType": 1,
                "messageBody": {"content": "hi"}
            })
        );
    }
}
