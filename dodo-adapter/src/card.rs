//! Card message component shapes. Structural (de)serialization only; the
//! platform renders them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTheme {
    Grey,
    Red,
    Orange,
    Yellow,
    Green,
    Indigo,
    Blue,
    Purple,
    Black,
    #[default]
    Default,
}

/// Top-level card: a component list plus theme and optional title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Always `"card"` on the wire.
    #[serde(rename = "type", default = "card_tag")]
    pub kind: String,
    pub components: Vec<Component>,
    #[serde(default)]
    pub theme: CardTheme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn card_tag() -> String {
    "card".to_string()
}

impl Card {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            kind: card_tag(),
            components,
            theme: CardTheme::Default,
            title: None,
        }
    }

    pub fn with_theme(mut self, theme: CardTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextKind {
    #[serde(rename = "plain-text")]
    PlainText,
    #[serde(rename = "dodo-md")]
    DodoMd,
}

/// Plain or markdown text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub content: String,
}

/// Multi-column paragraph text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphData {
    /// Always `"paragraph"` on the wire.
    #[serde(rename = "type", default = "paragraph_tag")]
    pub kind: String,
    /// Column count, 2..=6.
    pub cols: u8,
    pub fields: Vec<TextData>,
}

fn paragraph_tag() -> String {
    "paragraph".to_string()
}

/// Text slot of a section: single text or a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionText {
    Paragraph(ParagraphData),
    Text(TextData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemarkKind {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "plain-text")]
    PlainText,
    #[serde(rename = "dodo-md")]
    DodoMd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarkData {
    #[serde(rename = "type")]
    pub kind: RemarkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardImage {
    /// Always `"image"` on the wire.
    #[serde(rename = "type", default = "image_tag")]
    pub kind: String,
    pub src: String,
}

fn image_tag() -> String {
    "image".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStyle {
    Day,
    Hour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    LinkUrl,
    CallBack,
    CopyContent,
    Form,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonClickAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    Grey,
    Red,
    Orange,
    Green,
    Blue,
    Purple,
    #[default]
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardButton {
    /// Always `"button"` on the wire.
    #[serde(rename = "type", default = "button_tag")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interact_custom_id: Option<String>,
    pub click: ButtonClickAction,
    #[serde(default)]
    pub color: ButtonColor,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CallbackForm>,
}

fn button_tag() -> String {
    "button".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSelectorElement {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// One input of a callback form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackFormData {
    /// Always `"input"` on the wire.
    #[serde(rename = "type", default = "input_tag")]
    pub kind: String,
    pub key: String,
    pub title: String,
    /// 1..=4 display rows.
    pub rows: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub min_char: u32,
    pub max_char: u32,
}

fn input_tag() -> String {
    "input".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackForm {
    pub title: String,
    pub elements: Vec<CallbackFormData>,
}

/// Accessory slot of a section: image or button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accessory {
    Button(CardButton),
    Image(CardImage),
}

/// One card component. The wire tag is the `type` field; the original three
/// "section" shapes (text, paragraph, text-with-accessory) share one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    #[serde(rename = "header")]
    Header { text: TextData },
    #[serde(rename = "section")]
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        text: SectionText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<Accessory>,
    },
    #[serde(rename = "remark")]
    Remark { elements: Vec<RemarkData> },
    #[serde(rename = "image")]
    Image { src: String },
    #[serde(rename = "image-group")]
    ImageGroup { elements: Vec<CardImage> },
    #[serde(rename = "video")]
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        cover: String,
        src: String,
    },
    #[serde(rename = "countdown")]
    Countdown {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        style: CountdownStyle,
        #[serde(rename = "endTime")]
        end_time: i64,
    },
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "button-group")]
    ButtonGroup { elements: Vec<CardButton> },
    #[serde(rename = "list-selector")]
    ListSelector {
        #[serde(rename = "interactCustomId", skip_serializing_if = "Option::is_none")]
        interact_custom_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        elements: Vec<ListSelectorElement>,
        min: u32,
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_serializes_with_type_tag() {
        let card = Card::new(vec![Component::Header {
            text: TextData {
                kind: TextKind::DodoMd,
                content: "Title".to_string(),
            },
        }])
        .with_theme(CardTheme::Blue);
        let v = serde_json::to_value(&card).unwrap();
        assert_eq!(v["type"], json!("card"));
        assert_eq!(v["theme"], json!("blue"));
        assert_eq!(v["components"][0]["type"], json!("header"));
    }

    #[test]
    fn test_section_with_accessory_roundtrip() {
        let component = Component::Section {
            align: Some(Align::Right),
            text: SectionText::Text(TextData {
                kind: TextKind::PlainText,
                content: "hello".to_string(),
            }),
            accessory: Some(Accessory::Image(CardImage {
                kind: "image".to_string(),
                src: "https://img.imdodo.com/a.png".to_string(),
            })),
        };
        let v = serde_json::to_value(&component).unwrap();
        let back: Component = serde_json::from_value(v).unwrap();
        assert_eq!(back, component);
    }

    #[test]
    fn test_divider_decodes() {
        let c: Component = serde_json::from_value(json!({"type": "divider"})).unwrap();
        assert_eq!(c, Component::Divider);
    }
}
