use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::core::services::SongSource;
use crate::error::{NetworkError, Result, SongSyncError};

/// A song record as served by the backend API
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiSong {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub ccli_number: Option<String>,
    #[serde(default)]
    pub chorus: Option<String>,
    #[serde(default)]
    pub verses: Option<Verses>,
    #[serde(default)]
    pub lyrics_xml: Option<String>,
}

impl ApiSong {
    /// Backend id exactly as served, if present and non-blank
    pub fn backend_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled",
        }
    }
}

/// Verses arrive either as one text blob or as a list of verse objects
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Verses {
    Text(String),
    List(Vec<Verse>),
    /// Anything else is kept so one odd record cannot fail a whole page
    Other(Value),
}

impl<'de> Deserialize<'de> for Verses {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Verses::Text(text),
            // Entries are decoded one by one; an odd entry is dropped, not the list
            Value::Array(items) => Verses::List(items.into_iter().filter_map(Verse::from_value).collect()),
            other => Verses::Other(other),
        })
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Verse {
    pub label: Option<String>,
    pub order: Option<i64>,
    pub content: Option<String>,
}

impl Verse {
    fn from_value(value: Value) -> Option<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                debug!("Skipping verse entry that is not an object: {}", other);
                return None;
            }
        };

        let label = match fields.remove("label") {
            Some(Value::String(label)) => Some(label),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let order = match fields.remove("order") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        let content = match fields.remove("content") {
            Some(Value::String(content)) => Some(content),
            _ => None,
        };

        Some(Verse { label, order, content })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SongPage {
    #[serde(default)]
    pub data: Vec<ApiSong>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub total_pages: Option<u32>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Clone)]
pub struct SongsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: usize,
}

impl SongsApiClient {
    pub fn new(base_url: &str, api_key: Option<&str>, page_size: usize, timeout: Duration) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("songsync-cli v{}", version);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string).filter(|key| !key.is_empty()),
            page_size: page_size.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self.api_key {
            Some(ref key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            SongSyncError::Validation(format!("Invalid API URL '{}': {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| SongSyncError::Validation(format!("API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn execute<T>(&self, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = request.send().await.map_err(|e| {
            error!("Connection error: {}", e);
            NetworkError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(NetworkError::Http)?;

        if !status.is_success() {
            error!("HTTP error {}: {}", status.as_u16(), body);
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                body
            };
            return Err(NetworkError::Api { status: status.as_u16(), message }.into());
        }

        if body.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Invalid JSON response: {}", e);
            NetworkError::InvalidResponse { reason: format!("invalid JSON from API: {}", e) }.into()
        })
    }

    pub async fn fetch_page(&self, page: u32) -> Result<SongPage> {
        let url = self.endpoint(&["songs"])?;
        let request = self.get(url).query(&[
            ("page", page.to_string()),
            ("limit", self.page_size.to_string()),
        ]);

        debug!("Fetching songs page {}", page);
        self.execute(request).await
    }

    /// Fetch every song, following pagination until the last page
    pub async fn fetch_all_songs(&self) -> Result<Vec<ApiSong>> {
        let mut all_songs = Vec::new();
        let mut page = 1u32;

        loop {
            let SongPage { data, meta } = self.fetch_page(page).await?;
            let received = data.len();
            all_songs.extend(data);

            let total_pages = meta.and_then(|m| m.total_pages).unwrap_or(page);

            if page >= total_pages || received < self.page_size {
                break;
            }

            page += 1;
        }

        info!("Fetched {} songs from API", all_songs.len());
        Ok(all_songs)
    }

    pub async fn get_song_by_id(&self, song_id: &str) -> Result<ApiSong> {
        let url = self.endpoint(&["songs", song_id])?;
        debug!("Fetching song {}", song_id);
        self.execute(self.get(url)).await
    }
}

#[async_trait]
impl SongSource for SongsApiClient {
    async fn fetch_all_songs(&self) -> Result<Vec<ApiSong>> {
        SongsApiClient::fetch_all_songs(self).await
    }
}
