use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One upstream catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub base_url: String,
    /// Per-source timeout override in seconds; falls back to the shared timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Source {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { name: name.into(), base_url: base_url.into(), timeout: None }
    }
}

/// Envelope returned by `<base_url>?ac=detail&wd=<keyword>`.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogResponse {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub list: Option<Vec<Value>>,
}

impl CatalogResponse {
    pub(crate) fn is_ok(&self) -> bool {
        matches!(&self.code, Some(Value::Number(n)) if n.as_i64() == Some(1) || n.as_f64() == Some(1.0))
    }
}

/// A catalog record in the upstream's native shape.
///
/// Upstreams disagree on whether ids are numbers or strings, so every field is read
/// leniently: any scalar becomes a string, anything else is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCatalogEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub vod_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vod_pic: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vod_play_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vod_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vod_douban_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub name: String,
    #[serde(rename = "vod_pic")]
    pub cover_image_url: String,
    #[serde(rename = "videos")]
    pub episodes: Vec<Episode>,
    pub vod_id: String,
    #[serde(rename = "vod_douban_id")]
    pub douban_id: String,
}

/// Normalized output of one source for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResult {
    #[serde(rename = "name")]
    pub source_name: String,
    #[serde(rename = "result")]
    pub titles: Vec<Title>,
}

impl SourceResult {
    pub fn is_empty(&self) -> bool { self.titles.is_empty() }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
