//! Message model: ordered segments, inline-markup scanning, and conversion to
//! and from the single-kind wire body.

use std::fmt;

use crate::model::{
    CardBody, FileBody, MessageBody, PictureBody, RedPacketBody, Reference, ShareBody, TextBody,
    VideoBody,
};

/// One atomic unit of a rich message.
///
/// Textual forms round-trip through [`Message::from_markup`] for the four
/// inline token kinds: `<@!id>` user mention, `<@&id>` role mention,
/// `<@all>`, `<#id>` channel link.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSegment {
    Text { text: String },
    AtUser { dodo_id: String },
    AtRole { role_id: String },
    AtAll,
    ChannelLink { channel_id: String },
    Reference { message_id: String },
    Picture(PictureBody),
    Video(VideoBody),
    Share(ShareBody),
    File(FileBody),
    Card(CardBody),
    RedPacket(RedPacketBody),
}

impl MessageSegment {
    pub fn text(text: impl Into<String>) -> Self {
        MessageSegment::Text { text: text.into() }
    }

    pub fn at_user(dodo_id: impl Into<String>) -> Self {
        MessageSegment::AtUser {
            dodo_id: dodo_id.into(),
        }
    }

    pub fn at_role(role_id: impl Into<String>) -> Self {
        MessageSegment::AtRole {
            role_id: role_id.into(),
        }
    }

    pub fn at_all() -> Self {
        MessageSegment::AtAll
    }

    pub fn channel_link(channel_id: impl Into<String>) -> Self {
        MessageSegment::ChannelLink {
            channel_id: channel_id.into(),
        }
    }

    pub fn reference(message_id: impl Into<String>) -> Self {
        MessageSegment::Reference {
            message_id: message_id.into(),
        }
    }

    pub fn picture(url: impl Into<String>, width: u32, height: u32) -> Self {
        MessageSegment::Picture(PictureBody {
            url: url.into(),
            width,
            height,
            is_original: None,
        })
    }

    pub fn video(url: impl Into<String>) -> Self {
        MessageSegment::Video(VideoBody {
            url: url.into(),
            cover_url: None,
            duration: None,
            size: None,
        })
    }

    pub fn share(jump_url: impl Into<String>) -> Self {
        MessageSegment::Share(ShareBody {
            jump_url: jump_url.into(),
        })
    }

    pub fn file(url: impl Into<String>, name: impl Into<String>, size: i64) -> Self {
        MessageSegment::File(FileBody {
            url: url.into(),
            name: name.into(),
            size,
        })
    }

    pub fn card(card: crate::card::Card) -> Self {
        MessageSegment::Card(CardBody {
            content: None,
            card,
        })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MessageSegment::Text { .. })
    }

    /// True for the single-payload-per-message segment kinds.
    pub fn is_rich(&self) -> bool {
        matches!(
            self,
            MessageSegment::Picture(_)
                | MessageSegment::Video(_)
                | MessageSegment::Share(_)
                | MessageSegment::File(_)
                | MessageSegment::Card(_)
                | MessageSegment::RedPacket(_)
        )
    }

    /// True for segments that contribute to the plain-text rendering of a
    /// message body (text, user mention, channel link).
    fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            MessageSegment::Text { .. }
                | MessageSegment::AtUser { .. }
                | MessageSegment::ChannelLink { .. }
        )
    }

    /// The wire body this segment maps to, for rich segments.
    fn rich_body(&self) -> Option<MessageBody> {
        match self {
            MessageSegment::Picture(body) => Some(MessageBody::Picture(body.clone())),
            MessageSegment::Video(body) => Some(MessageBody::Video(body.clone())),
            MessageSegment::Share(body) => Some(MessageBody::Share(body.clone())),
            MessageSegment::File(body) => Some(MessageBody::File(body.clone())),
            MessageSegment::Card(body) => Some(MessageBody::Card(body.clone())),
            MessageSegment::RedPacket(body) => Some(MessageBody::RedPacket(body.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for MessageSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSegment::Text { text } => write!(f, "{text}"),
            MessageSegment::AtUser { dodo_id } => write!(f, "<@!{dodo_id}>"),
            MessageSegment::AtRole { role_id } => write!(f, "<@&{role_id}>"),
            MessageSegment::AtAll => write!(f, "<@all>"),
            MessageSegment::ChannelLink { channel_id } => write!(f, "<#{channel_id}>"),
            MessageSegment::Reference { message_id } => write!(f, "<reference:{message_id}>"),
            MessageSegment::Picture(body) => write!(f, "<picture:{}>", body.url),
            MessageSegment::Video(body) => write!(f, "<video:{}>", body.url),
            MessageSegment::Share(body) => write!(f, "<share:{}>", body.jump_url),
            MessageSegment::File(body) => write!(f, "<file:{}>", body.url),
            MessageSegment::Card(body) => {
                write!(f, "<card:{}>", body.card.title.as_deref().unwrap_or(""))
            }
            MessageSegment::RedPacket(body) => {
                write!(f, "<red_packet:{}/{}>", body.total_amount, body.count)
            }
        }
    }
}

/// An ordered, mutable sequence of [`MessageSegment`]s. Segment order is
/// significant both for rendering and for mention stripping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    segments: Vec<MessageSegment>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses inline markup into segments: `<@!id>`, `<@&id>`, `<@all>` and
    /// `<#id>` become their segment kinds, everything else stays literal
    /// text. Unrecognized bracket sequences are preserved verbatim.
    pub fn from_markup(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;
        while let Some(pos) = rest.find('<') {
            let (before, from_bracket) = rest.split_at(pos);
            literal.push_str(before);
            match scan_token(from_bracket) {
                Some((consumed, segment)) => {
                    if !literal.is_empty() {
                        segments.push(MessageSegment::text(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                    rest = &from_bracket[consumed..];
                }
                None => {
                    literal.push('<');
                    rest = &from_bracket[1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(MessageSegment::text(literal));
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[MessageSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: MessageSegment) {
        self.segments.push(segment);
    }

    pub fn insert(&mut self, index: usize, segment: MessageSegment) {
        self.segments.insert(index, segment);
    }

    pub fn remove(&mut self, index: usize) -> MessageSegment {
        self.segments.remove(index)
    }

    pub fn truncate(&mut self, len: usize) {
        self.segments.truncate(len);
    }

    pub fn first(&self) -> Option<&MessageSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&MessageSegment> {
        self.segments.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageSegment> {
        self.segments.iter()
    }

    pub(crate) fn segments_mut(&mut self) -> &mut Vec<MessageSegment> {
        &mut self.segments
    }

    /// Replaces an empty segment list with a single empty-text segment.
    pub fn normalize(&mut self) {
        if self.segments.is_empty() {
            self.segments.push(MessageSegment::text(""));
        }
    }

    /// Plain-text rendering of the message: the textual form of every
    /// text-bearing segment (text, user mention, channel link), in order.
    pub fn extract_text_content(&self) -> String {
        self.segments
            .iter()
            .filter(|segment| segment.is_text_bearing())
            .map(ToString::to_string)
            .collect()
    }

    /// Decodes a wire body (plus optional reply reference) into a message:
    /// each body kind maps to exactly one segment, with text bodies scanned
    /// for inline markup and the reference appended last.
    pub fn from_body(body: &MessageBody, reference: Option<&Reference>) -> Self {
        let mut message = match body {
            MessageBody::Text(text) => Message::from_markup(&text.content),
            MessageBody::Picture(body) => MessageSegment::Picture(body.clone()).into(),
            MessageBody::Video(body) => MessageSegment::Video(body.clone()).into(),
            MessageBody::Share(body) => MessageSegment::Share(body.clone()).into(),
            MessageBody::File(body) => MessageSegment::File(body.clone()).into(),
            MessageBody::Card(body) => MessageSegment::Card(body.clone()).into(),
            MessageBody::RedPacket(body) => MessageSegment::RedPacket(body.clone()).into(),
        };
        if let Some(reference) = reference {
            message.push(MessageSegment::reference(&reference.message_id));
        }
        message
    }

    /// Encodes the message into a wire body plus optional referenced message
    /// id. The platform accepts one payload per message, so richer content
    /// wins: the last non-reference rich segment, else the last card (with
    /// the text rendered before it as content), else the plain-text
    /// rendering of the whole message. The last reference segment supplies
    /// the referenced id.
    pub fn to_body(&self) -> (MessageBody, Option<String>) {
        let referenced_message_id = self.segments.iter().rev().find_map(|segment| match segment {
            MessageSegment::Reference { message_id } => Some(message_id.clone()),
            _ => None,
        });

        if let Some(body) = self
            .segments
            .iter()
            .rev()
            .find(|segment| !matches!(segment, MessageSegment::Reference { .. }))
            .and_then(MessageSegment::rich_body)
        {
            return (body, referenced_message_id);
        }

        let last_card = self.segments.iter().enumerate().rev().find_map(
            |(index, segment)| match segment {
                MessageSegment::Card(body) => Some((index, body)),
                _ => None,
            },
        );
        if let Some((index, body)) = last_card {
            let content: String = self.segments[..index]
                .iter()
                .filter(|segment| segment.is_text_bearing())
                .map(ToString::to_string)
                .collect();
            return (
                MessageBody::Card(CardBody {
                    content: (!content.is_empty()).then_some(content),
                    card: body.card.clone(),
                }),
                referenced_message_id,
            );
        }

        (
            MessageBody::Text(TextBody {
                content: self.extract_text_content(),
            }),
            referenced_message_id,
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<MessageSegment> for Message {
    fn from(segment: MessageSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::from_markup(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::from_markup(&text)
    }
}

impl FromIterator<MessageSegment> for Message {
    fn from_iter<I: IntoIterator<Item = MessageSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = MessageSegment;
    type IntoIter = std::vec::IntoIter<MessageSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl Extend<MessageSegment> for Message {
    fn extend<I: IntoIterator<Item = MessageSegment>>(&mut self, iter: I) {
        self.segments.extend(iter);
    }
}

/// Tries to scan one markup token at the head of `input` (which starts with
/// `<`). Returns the consumed byte length and the segment, or `None` when the
/// bracket sequence is not a recognized token.
fn scan_token(input: &str) -> Option<(usize, MessageSegment)> {
    let inner = &input[1..];
    for (prefix, kind) in [
        ("@!", TokenKind::AtUser),
        ("@&", TokenKind::AtRole),
        ("#", TokenKind::ChannelLink),
        ("@", TokenKind::At),
    ] {
        if let Some(after_prefix) = inner.strip_prefix(prefix) {
            let id_len = after_prefix
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after_prefix.len());
            if id_len == 0 || !after_prefix[id_len..].starts_with('>') {
                continue;
            }
            let id = &after_prefix[..id_len];
            let consumed = 1 + prefix.len() + id_len + 1;
            let segment = match kind {
                TokenKind::AtUser => MessageSegment::at_user(id),
                TokenKind::AtRole => MessageSegment::at_role(id),
                TokenKind::ChannelLink => MessageSegment::channel_link(id),
                // Bare `@` is only a token when the id is the literal `all`.
                TokenKind::At if id == "all" => MessageSegment::at_all(),
                TokenKind::At => return None,
            };
            return Some((consumed, segment));
        }
    }
    None
}

enum TokenKind {
    AtUser,
    AtRole,
    ChannelLink,
    At,
}
