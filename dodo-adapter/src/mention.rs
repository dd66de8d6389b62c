//! Pure mention resolution for inbound channel messages: decides whether the
//! bot was addressed and strips the addressing mention from the visible
//! message.

use crate::message::{Message, MessageSegment};

fn is_at_me(segment: &MessageSegment, self_id: &str) -> bool {
    matches!(segment, MessageSegment::AtUser { dodo_id } if dodo_id == self_id)
}

/// Resolves the directed-at-bot flag for `message`, normalizing the
/// addressing mention out of it. `self_id` is the bot's own user id.
///
/// A leading mention of the bot is removed (with one leading no-break space
/// and any further leading whitespace trimmed off the following text);
/// otherwise a trailing mention is removed, skipping one whitespace-only
/// text segment at the end. A leading match suppresses the trailing check,
/// so at most one mention is stripped. A mention anywhere else, or
/// `<@all>`, still sets the flag but leaves the message alone.
pub fn resolve(message: &mut Message, self_id: &str) -> bool {
    message.normalize();

    let mut to_me = message
        .iter()
        .any(|segment| is_at_me(segment, self_id) || matches!(segment, MessageSegment::AtAll));

    let mut deleted = false;
    if message.first().is_some_and(|first| is_at_me(first, self_id)) {
        message.remove(0);
        deleted = true;
        to_me = true;
        if let Some(MessageSegment::Text { text }) = message.first() {
            let trimmed = text
                .strip_prefix('\u{a0}')
                .unwrap_or(text)
                .trim_start()
                .to_string();
            if trimmed.is_empty() {
                message.remove(0);
            } else {
                message.segments_mut()[0] = MessageSegment::text(trimmed);
            }
        }
    }

    if !deleted {
        // Check the last segment, looking past one whitespace-only tail.
        let mut index = message.len().wrapping_sub(1);
        if message.len() >= 2 {
            if let Some(MessageSegment::Text { text }) = message.last() {
                if text.trim().is_empty() {
                    index -= 1;
                }
            }
        }
        if message
            .segments()
            .get(index)
            .is_some_and(|segment| is_at_me(segment, self_id))
        {
            to_me = true;
            message.truncate(index);
        }
    }

    message.normalize();
    to_me
}
