//! Notion page properties.
//!
//! Notion property objects are tagged by a `type` field whose value names the
//! key holding the content (`{"type": "title", "title": [...]}`). They are
//! decoded explicitly into [`PropertyValue`] rather than inspected ad hoc, and
//! kinds the service never reads are kept as [`PropertyValue::Unsupported`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::types::PageId;

/// A single page property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// The page title, as concatenated plain text.
    Title(String),
    /// A rich-text property, as concatenated plain text.
    RichText(String),
    Number(Option<f64>),
    /// A select property; holds the option name.
    Select(Option<String>),
    /// Any other property kind.
    Unsupported { kind: String },
}

impl PropertyValue {
    /// Decodes a Notion property object.
    pub fn decode(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
        let content = value.get(kind);

        match kind {
            "title" => PropertyValue::Title(rich_text_plain(content)),
            "rich_text" => PropertyValue::RichText(rich_text_plain(content)),
            "number" => PropertyValue::Number(content.and_then(Value::as_f64)),
            "select" => PropertyValue::Select(
                content
                    .and_then(|s| s.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            ),
            other => PropertyValue::Unsupported {
                kind: other.to_string(),
            },
        }
    }

    /// Encodes the value as a Notion property update.
    ///
    /// Returns `None` for unsupported kinds, which are never written.
    pub fn encode(&self) -> Option<Value> {
        match self {
            PropertyValue::Title(text) => Some(json!({ "title": text_fragments(text) })),
            PropertyValue::RichText(text) => Some(json!({ "rich_text": text_fragments(text) })),
            PropertyValue::Number(n) => Some(json!({ "number": n })),
            PropertyValue::Select(Some(name)) => Some(json!({ "select": { "name": name } })),
            PropertyValue::Select(None) => Some(json!({ "select": null })),
            PropertyValue::Unsupported { .. } => None,
        }
    }

    /// Reads the value as plain text.
    ///
    /// Empty text and empty selects/numbers read as `None`.
    pub fn plain_text(&self) -> Option<String> {
        let text = match self {
            PropertyValue::Title(t) | PropertyValue::RichText(t) => t.clone(),
            PropertyValue::Number(n) => n.map(|n| n.to_string())?,
            PropertyValue::Select(s) => s.clone()?,
            PropertyValue::Unsupported { .. } => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Joins the `plain_text` of a rich-text array, falling back to `text.content`.
fn rich_text_plain(content: Option<&Value>) -> String {
    content
        .and_then(Value::as_array)
        .map(|fragments| {
            fragments
                .iter()
                .filter_map(|f| {
                    f.get("plain_text")
                        .or_else(|| f.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn text_fragments(text: &str) -> Value {
    json!([{ "type": "text", "text": { "content": text } }])
}

/// The current properties of a page, fetched once per update attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub id: PageId,
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Deserialize)]
struct RawPage {
    id: String,
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
}

impl PageSnapshot {
    /// Decodes a page object as returned by `GET /v1/pages/{id}`.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawPage::deserialize(value)?;
        let id = PageId::parse(&raw.id).ok_or_else(|| {
            <serde_json::Error as serde::de::Error>::custom("page id must be a non-empty string")
        })?;
        let properties = raw
            .properties
            .iter()
            .map(|(name, v)| (name.clone(), PropertyValue::decode(v)))
            .collect();
        Ok(PageSnapshot { id, properties })
    }

    /// Returns a named property as trimmed plain text.
    pub fn plain_text(&self, property: &str) -> Option<String> {
        self.properties
            .get(property)
            .and_then(PropertyValue::plain_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Returns the page title as trimmed plain text.
    ///
    /// Every Notion page has exactly one title property, whatever its name.
    pub fn title_text(&self) -> Option<String> {
        self.properties
            .values()
            .find_map(|v| match v {
                PropertyValue::Title(t) => Some(t.trim().to_string()),
                _ => None,
            })
            .filter(|t| !t.is_empty())
    }
}

/// Properties to write to a page, keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch(BTreeMap<String, PropertyValue>);

impl PropertyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, property: impl Into<String>, value: PropertyValue) {
        self.0.insert(property.into(), value);
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.0.get(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Builds the `PATCH /v1/pages/{id}` request body.
    pub fn to_request_body(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .0
            .iter()
            .filter_map(|(name, value)| value.encode().map(|v| (name.clone(), v)))
            .collect();
        json!({ "properties": properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_json() -> Value {
        json!({
            "object": "page",
            "id": "page-1",
            "properties": {
                "Name": {
                    "id": "title",
                    "type": "title",
                    "title": [
                        { "type": "text", "plain_text": "2026_W04 ", "text": { "content": "2026_W04 " } },
                        { "type": "text", "plain_text": "planning" }
                    ]
                },
                "Seed": {
                    "type": "rich_text",
                    "rich_text": [{ "type": "text", "text": { "content": " 2026_W05 " } }]
                },
                "Points": { "type": "number", "number": 13 },
                "Status": { "type": "select", "select": { "name": "Active" } },
                "Empty": { "type": "select", "select": null },
                "Due": { "type": "date", "date": { "start": "2026-01-22" } }
            }
        })
    }

    #[test]
    fn decodes_each_kind() {
        let page = PageSnapshot::from_json(&page_json()).unwrap();
        assert_eq!(page.id.as_str(), "page-1");
        assert_eq!(
            page.properties["Name"],
            PropertyValue::Title("2026_W04 planning".to_string())
        );
        assert_eq!(
            page.properties["Seed"],
            PropertyValue::RichText(" 2026_W05 ".to_string())
        );
        assert_eq!(page.properties["Points"], PropertyValue::Number(Some(13.0)));
        assert_eq!(
            page.properties["Status"],
            PropertyValue::Select(Some("Active".to_string()))
        );
        assert_eq!(page.properties["Empty"], PropertyValue::Select(None));
        assert_eq!(
            page.properties["Due"],
            PropertyValue::Unsupported {
                kind: "date".to_string()
            }
        );
    }

    #[test]
    fn plain_text_lookup_trims() {
        let page = PageSnapshot::from_json(&page_json()).unwrap();
        assert_eq!(page.plain_text("Seed").as_deref(), Some("2026_W05"));
        assert_eq!(page.plain_text("Points").as_deref(), Some("13"));
        assert_eq!(page.plain_text("Status").as_deref(), Some("Active"));
        assert_eq!(page.plain_text("Empty"), None);
        assert_eq!(page.plain_text("Due"), None);
        assert_eq!(page.plain_text("Missing"), None);
    }

    #[test]
    fn title_text_finds_title_property() {
        let page = PageSnapshot::from_json(&page_json()).unwrap();
        assert_eq!(page.title_text().as_deref(), Some("2026_W04 planning"));
    }

    #[test]
    fn page_without_properties_decodes() {
        let page = PageSnapshot::from_json(&json!({ "id": "p" })).unwrap();
        assert!(page.properties.is_empty());
        assert!(page.title_text().is_none());
    }

    #[test]
    fn page_without_id_fails() {
        assert!(PageSnapshot::from_json(&json!({ "properties": {} })).is_err());
        assert!(PageSnapshot::from_json(&json!({ "id": "" })).is_err());
    }

    #[test]
    fn patch_body_encodes_title_and_rich_text() {
        let mut patch = PropertyPatch::new();
        patch.insert("Sprint Name", PropertyValue::Title("Sprint bold-fox - 2026_W04".into()));
        patch.insert("Slug", PropertyValue::RichText("bold-fox".into()));
        patch.insert("Ignored", PropertyValue::Unsupported { kind: "date".into() });

        assert_eq!(
            patch.to_request_body(),
            json!({
                "properties": {
                    "Sprint Name": {
                        "title": [{ "type": "text", "text": { "content": "Sprint bold-fox - 2026_W04" } }]
                    },
                    "Slug": {
                        "rich_text": [{ "type": "text", "text": { "content": "bold-fox" } }]
                    }
                }
            })
        );
    }

    #[test]
    fn encoded_values_decode_back_to_same_text() {
        let original = PropertyValue::RichText("bold-fox".into());
        let mut encoded = original.encode().unwrap();
        encoded["type"] = json!("rich_text");
        assert_eq!(PropertyValue::decode(&encoded), original);
    }
}
