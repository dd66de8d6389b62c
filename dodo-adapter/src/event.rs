//! Inbound gateway events: the sixteen typed variants, frame decoding, and
//! the directed-at-bot preparation step for message events.
//!
//! Every event frame is an envelope `{type, data, version}` where `data`
//! carries the discriminant (`eventType`) and a nested `eventBody`. The body
//! map is flattened into its parent before decoding so envelope and body
//! fields share one namespace, exactly as the platform documents them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mention;
use crate::message::Message;
use crate::model::{
    Emoji, FormData, Gift, GoodsType, LeaveType, ListData, Member, MessageBody, MessageType,
    OperateType, Personal, ReactionTarget, ReactionType, Reference, TargetType,
};

/// Outcome of decoding one inbound frame.
#[derive(Debug)]
pub enum DispatchResult {
    /// `{"type": 1}` heartbeat acknowledgement; never forwarded.
    Heartbeat,
    /// A decoded event ready for dispatch.
    Event(Event),
    /// A malformed frame. Reported, never fatal.
    DecodeError {
        payload: Value,
        error: serde_json::Error,
    },
}

/// Decodes one raw gateway frame.
pub fn decode_frame(raw: &str) -> DispatchResult {
    let payload: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            return DispatchResult::DecodeError {
                payload: Value::String(raw.to_string()),
                error,
            }
        }
    };
    if payload.get("type").and_then(Value::as_i64) == Some(1) {
        return DispatchResult::Heartbeat;
    }
    match decode_event(payload.clone()) {
        Ok(event) => DispatchResult::Event(event),
        Err(error) => DispatchResult::DecodeError { payload, error },
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    _frame_type: i64,
    data: Value,
    #[serde(rename = "version", default)]
    _version: String,
}

fn decode_event(payload: Value) -> Result<Event, serde_json::Error> {
    let envelope: EventEnvelope = serde_json::from_value(payload)?;
    let mut data = envelope.data;
    if let Value::Object(map) = &mut data {
        // Flatten the nested body into the envelope fields; body wins on
        // name collisions.
        if let Some(Value::Object(body)) = map.remove("eventBody") {
            for (key, value) in body {
                map.insert(key, value);
            }
        }
    }
    serde_json::from_value(data)
}

/// One gateway event, keyed by the platform's `eventType` discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum Event {
    #[serde(rename = "1001")]
    PersonalMessage(PersonalMessageEvent),
    #[serde(rename = "2001")]
    ChannelMessage(ChannelMessageEvent),
    #[serde(rename = "3001")]
    MessageReaction(MessageReactionEvent),
    #[serde(rename = "3002")]
    CardButtonClick(CardButtonClickEvent),
    #[serde(rename = "3003")]
    CardFormSubmit(CardFormSubmitEvent),
    #[serde(rename = "3004")]
    CardListSubmit(CardListSubmitEvent),
    #[serde(rename = "4001")]
    MemberJoin(MemberJoinEvent),
    #[serde(rename = "4002")]
    MemberLeave(MemberLeaveEvent),
    #[serde(rename = "4003")]
    MemberInvite(MemberInviteEvent),
    #[serde(rename = "5001")]
    VoiceMemberJoin(VoiceMemberJoinEvent),
    #[serde(rename = "5002")]
    VoiceMemberLeave(VoiceMemberLeaveEvent),
    #[serde(rename = "6001")]
    ChannelArticle(ChannelArticleEvent),
    #[serde(rename = "6002")]
    ChannelArticleComment(ChannelArticleCommentEvent),
    #[serde(rename = "7001")]
    GiftSend(GiftSendEvent),
    #[serde(rename = "8001")]
    IntegralChange(IntegralChangeEvent),
    #[serde(rename = "9001")]
    GoodsPurchase(GoodsPurchaseEvent),
}

impl Event {
    pub fn event_id(&self) -> &str {
        self.common().0
    }

    /// The user this event originated from.
    pub fn user_id(&self) -> &str {
        self.common().1
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        *self.common().2
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Event::ChannelMessage(_) | Event::PersonalMessage(_))
    }

    fn common(&self) -> (&str, &str, &DateTime<Utc>) {
        macro_rules! fields {
            ($ev:expr) => {
                (
                    $ev.event_id.as_str(),
                    $ev.dodo_source_id.as_str(),
                    &$ev.timestamp,
                )
            };
        }
        match self {
            Event::PersonalMessage(ev) => fields!(ev),
            Event::ChannelMessage(ev) => fields!(ev),
            Event::MessageReaction(ev) => fields!(ev),
            Event::CardButtonClick(ev) => fields!(ev),
            Event::CardFormSubmit(ev) => fields!(ev),
            Event::CardListSubmit(ev) => fields!(ev),
            Event::MemberJoin(ev) => fields!(ev),
            Event::MemberLeave(ev) => fields!(ev),
            Event::MemberInvite(ev) => fields!(ev),
            Event::VoiceMemberJoin(ev) => fields!(ev),
            Event::VoiceMemberLeave(ev) => fields!(ev),
            Event::ChannelArticle(ev) => fields!(ev),
            Event::ChannelArticleComment(ev) => fields!(ev),
            Event::GiftSend(ev) => fields!(ev),
            Event::IntegralChange(ev) => fields!(ev),
            Event::GoodsPurchase(ev) => fields!(ev),
        }
    }

    /// Runs the message-event preparation step: channel messages go through
    /// mention resolution against the bot's own id, personal messages are
    /// directed at the bot by construction. Idempotent.
    pub(crate) fn prepare(&mut self, self_source_id: &str) {
        match self {
            Event::ChannelMessage(ev) => ev.resolve_to_me(self_source_id),
            Event::PersonalMessage(ev) => {
                ev.to_me = true;
                if ev.message.is_none() {
                    let mut message = Message::from_body(&ev.message_body, None);
                    message.normalize();
                    ev.message = Some(message);
                }
            }
            _ => {}
        }
    }
}

/// A message posted in a channel the bot can read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessageEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub personal: Personal,
    pub member: Member,
    pub message_id: String,
    pub message_type: MessageType,
    pub message_body: MessageBody,
    pub reference: Option<Reference>,
    /// Whether the message explicitly addressed the bot. Derived once during
    /// dispatch; false until then.
    #[serde(skip)]
    pub to_me: bool,
    #[serde(skip)]
    message: Option<Message>,
}

impl ChannelMessageEvent {
    /// The message as decoded from the wire, before mention stripping.
    pub fn original_message(&self) -> Message {
        Message::from_body(&self.message_body, self.reference.as_ref())
    }

    /// The visible message: mention-stripped if this event has been through
    /// dispatch, the original decoding otherwise.
    pub fn message(&self) -> Message {
        self.message
            .clone()
            .unwrap_or_else(|| self.original_message())
    }

    fn resolve_to_me(&mut self, self_source_id: &str) {
        if self.message.is_some() {
            return;
        }
        let mut message = self.original_message();
        self.to_me = mention::resolve(&mut message, self_source_id);
        self.message = Some(message);
    }
}

/// A direct message to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalMessageEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: Option<String>,
    pub personal: Personal,
    pub message_id: String,
    pub message_type: MessageType,
    pub message_body: MessageBody,
    /// Direct messages always address the bot.
    #[serde(skip, default = "default_true")]
    pub to_me: bool,
    #[serde(skip)]
    message: Option<Message>,
}

fn default_true() -> bool {
    true
}

impl PersonalMessageEvent {
    pub fn message(&self) -> Message {
        self.message
            .clone()
            .unwrap_or_else(|| Message::from_body(&self.message_body, None))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReactionEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub personal: Personal,
    pub member: Member,
    pub reaction_target: ReactionTarget,
    pub reaction_emoji: Emoji,
    pub reaction_type: ReactionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardButtonClickEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub personal: Personal,
    pub member: Member,
    pub interact_custom_id: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFormSubmitEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub personal: Personal,
    pub member: Member,
    pub interact_custom_id: Option<String>,
    pub form_data: Vec<FormData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListSubmitEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub personal: Personal,
    pub member: Member,
    pub interact_custom_id: Option<String>,
    pub list_data: Vec<ListData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub personal: Personal,
    /// Formatted local datetime as sent by the platform.
    pub modify_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeaveEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub personal: Personal,
    pub leave_type: LeaveType,
    pub operate_dodo_source_id: String,
    pub modify_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInviteEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub dodo_island_nick_name: String,
    pub to_dodo_source_id: String,
    pub to_dodo_island_nick_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMemberJoinEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub personal: Personal,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMemberLeaveEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub personal: Personal,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArticleEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub personal: Personal,
    pub member: Member,
    pub artical_id: String,
    pub title: String,
    pub image_list: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArticleCommentEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub personal: Personal,
    pub member: Member,
    pub artical_id: String,
    pub comment_id: String,
    pub reply_id: String,
    pub image_list: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSendEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub channel_id: String,
    pub order_no: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub total_amount: f64,
    pub gift: Gift,
    pub island_ratio: f64,
    pub island_income: f64,
    pub dodo_island_nick_name: String,
    pub to_dodo_source_id: String,
    pub to_dodo_island_nick_name: String,
    pub to_dodo_ratio: f64,
    pub to_dodo_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegralChangeEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub operate_type: OperateType,
    pub integral: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsPurchaseEvent {
    pub event_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub dodo_source_id: String,
    pub island_source_id: String,
    pub order_no: String,
    pub goods_type: GoodsType,
    pub goods_id: String,
    pub goods_name: String,
    pub goods_image_list: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel_message_frame(content: &str) -> String {
        json!({
            "type": 0,
            "data": {
                "eventId": "e-1",
                "eventType": "2001",
                "timestamp": 1693300000000i64,
                "eventBody": {
                    "dodoSourceId": "1111",
                    "islandSourceId": "2222",
                    "channelId": "3333",
                    "personal": {"nickName": "n", "avatarUrl": "a", "sex": 1},
                    "member": {"nickName": "n", "joinTime": "2023-01-01 10:00:00"},
                    "messageId": "m-1",
                    "messageType": 1,
                    "messageBody": {"content": content}
                }
            },
            "version": "0"
        })
        .to_string()
    }

    #[test]
    fn test_heartbeat_frame_short_circuits() {
        assert!(matches!(
            decode_frame(r#"{"type":1}"#),
            DispatchResult::Heartbeat
        ));
    }

    #[test]
    fn test_channel_message_decodes() {
        let ev = match decode_frame(&channel_message_frame("hello <@!3344>")) {
            DispatchResult::Event(Event::ChannelMessage(ev)) => ev,
            other => panic!("expected channel message, got {other:?}"),
        };
        assert_eq!(ev.event_id, "e-1");
        assert_eq!(ev.channel_id, "3333");
        assert_eq!(ev.message_type, MessageType::Text);
        assert!(!ev.to_me);
    }

    #[test]
    fn test_prepare_resolves_to_me_once() {
        let result = decode_frame(&channel_message_frame("<@!3344> hi"));
        let DispatchResult::Event(mut event) = result else {
            panic!("expected event");
        };
        event.prepare("3344");
        let Event::ChannelMessage(ev) = &event else {
            panic!("expected channel message");
        };
        assert!(ev.to_me);
        assert_eq!(ev.message().to_string(), "hi");
        // Original decoding is untouched.
        assert_eq!(ev.original_message().to_string(), "<@!3344> hi");

        // Preparing again must not strip twice.
        event.prepare("3344");
        let Event::ChannelMessage(ev) = &event else {
            panic!("expected channel message");
        };
        assert_eq!(ev.message().to_string(), "hi");
    }

    #[test]
    fn test_unknown_event_type_is_decode_error() {
        let frame = json!({
            "type": 0,
            "data": {"eventId": "e", "eventType": "9999", "timestamp": 0, "eventBody": {}},
            "version": "0"
        })
        .to_string();
        assert!(matches!(
            decode_frame(&frame),
            DispatchResult::DecodeError { .. }
        ));
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        assert!(matches!(
            decode_frame("not json"),
            DispatchResult::DecodeError { .. }
        ));
    }

    #[test]
    fn test_event_body_flatten_overrides_envelope_fields() {
        // The nested body's timestamp wins over the outer data field.
        let frame = json!({
            "type": 0,
            "data": {
                "eventId": "e-2",
                "eventType": "8001",
                "timestamp": 1693300000000i64,
                "eventBody": {
                    "timestamp": 1693300001000i64,
                    "dodoSourceId": "1",
                    "islandSourceId": "2",
                    "operateType": 1,
                    "integral": 10
                }
            },
            "version": "0"
        })
        .to_string();
        let DispatchResult::Event(Event::IntegralChange(ev)) = decode_frame(&frame) else {
            panic!("expected integral change");
        };
        assert_eq!(ev.timestamp.timestamp_millis(), 1693300001000);
    }

    #[test]
    fn test_personal_message_prepare_sets_to_me() {
        let frame = json!({
            "type": 0,
            "data": {
                "eventId": "e-3",
                "eventType": "1001",
                "timestamp": 1693300000000i64,
                "eventBody": {
                    "dodoSourceId": "1111",
                    "islandSourceId": "2222",
                    "personal": {"nickName": "n", "avatarUrl": "a", "sex": 0},
                    "messageId": "m-2",
                    "messageType": 1,
                    "messageBody": {"content": "dm"}
                }
            },
            "version": "0"
        })
        .to_string();
        let DispatchResult::Event(mut event) = decode_frame(&frame) else {
            panic!("expected event");
        };
        event.prepare("3344");
        let Event::PersonalMessage(ev) = event else {
            panic!("expected personal message");
        };
        assert!(ev.to_me);
        assert_eq!(ev.message().to_string(), "dm");
    }

    #[test]
    fn test_reaction_event_decodes() {
        let frame = json!({
            "type": 0,
            "data": {
                "eventId": "e-4",
                "eventType": "3001",
                "timestamp": 1693300000000i64,
                "eventBody": {
                    "dodoSourceId": "1",
                    "islandSourceId": "2",
                    "channelId": "3",
                    "messageId": "m",
                    "personal": {"nickName": "n", "avatarUrl": "a", "sex": -1},
                    "member": {"nickName": "n", "joinTime": "2023-01-01 10:00:00"},
                    "reactionTarget": {"type": 1, "id": "m"},
                    "reactionEmoji": {"type": 1, "id": "128516"},
                    "reactionType": 1
                }
            },
            "version": "0"
        })
        .to_string();
        let DispatchResult::Event(Event::MessageReaction(ev)) = decode_frame(&frame) else {
            panic!("expected reaction event");
        };
        assert_eq!(ev.reaction_type, ReactionType::Add);
        assert_eq!(ev.dodo_source_id, "1");
    }

    #[test]
    fn test_common_accessors() {
        let DispatchResult::Event(event) = decode_frame(&channel_message_frame("x")) else {
            panic!("expected event");
        };
        assert_eq!(event.event_id(), "e-1");
        assert_eq!(event.user_id(), "1111");
        assert!(event.is_message());
        assert_eq!(event.timestamp().timestamp_millis(), 1693300000000);
    }
}
