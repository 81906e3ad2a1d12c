//! Remote document store reached over the sync server's HTTP API.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::documents::{ConfigFeed, Document, DocumentStore, ItemsFeed};
use super::subscription::Subscription;
use crate::config::RemoteCredentials;
use crate::error::StoreError;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpDocumentStore {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_credentials(client: Client, creds: &RemoteCredentials, config_url: &str) -> Self {
        Self::new(client, creds.resolve_base_url(config_url), creds.api_key.clone())
    }

    fn endpoint(&self, owner: &str, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "budgets", owner])
            .extend(tail);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, &self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(builder).send().await?;
        check_status(response).await
    }

    fn feed<T>(&self, url: Result<Url, StoreError>) -> Subscription<Result<T, StoreError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = url.map(|u| self.authorized(self.client.get(u)));

        Subscription::spawn(move |tx| async move {
            let response = match request {
                Ok(req) => match req.send().await {
                    Ok(resp) => check_status(resp).await,
                    Err(e) => Err(StoreError::from(e)),
                },
                Err(e) => Err(e),
            };
            let response = match response {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };

            let mut parser = SseParser::default();
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(StoreError::from(e)));
                        return;
                    }
                };
                for event in parser.push(&chunk) {
                    let delivery = match event.event.as_str() {
                        "snapshot" => serde_json::from_str::<T>(&event.data)
                            .map_err(StoreError::from),
                        "error" => Err(StoreError::Status {
                            status: 500,
                            body: event.data,
                        }),
                        _ => continue,
                    };
                    if tx.send(delivery).is_err() {
                        return;
                    }
                }
            }
            // a standing feed never ends on its own
            let _ = tx.send(Err(StoreError::FeedClosed));
        })
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn put_item(&self, owner: &str, key: &str, data: Value) -> Result<(), StoreError> {
        let url = self.endpoint(owner, &["items", key])?;
        self.send(self.client.put(url).json(&data)).await?;
        Ok(())
    }

    async fn delete_item(&self, owner: &str, key: &str) -> Result<(), StoreError> {
        let url = self.endpoint(owner, &["items", key])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn list_items(&self, owner: &str) -> Result<Vec<Document>, StoreError> {
        let url = self.endpoint(owner, &["items"])?;
        Ok(self.send(self.client.get(url)).await?.json().await?)
    }

    async fn get_config(&self, owner: &str) -> Result<Option<Value>, StoreError> {
        let url = self.endpoint(owner, &["config"])?;
        Ok(self.send(self.client.get(url)).await?.json().await?)
    }

    async fn put_config(&self, owner: &str, data: Value, merge: bool) -> Result<(), StoreError> {
        let url = self.endpoint(owner, &["config"])?;
        let builder = if merge {
            self.client.patch(url)
        } else {
            self.client.put(url)
        };
        self.send(builder.json(&data)).await?;
        Ok(())
    }

    async fn watch_items(&self, owner: &str) -> ItemsFeed {
        self.feed(self.endpoint(owner, &["watch", "items"]))
    }

    async fn watch_config(&self, owner: &str) -> ConfigFeed {
        self.feed(self.endpoint(owner, &["watch", "config"]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
#[derive(Default)]
pub(crate) struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        let mut events = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = String::from("message");
    let mut data: Vec<&str> = Vec::new();
    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => event = value.to_string(),
            "data" => data.push(value),
            _ => {}
        }
    }
    if data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_handles_split_chunks_and_keepalives() {
        let mut parser = SseParser::default();
        assert!(parser.push(b"event: snapshot\nda").is_empty());
        let events = parser.push(b"ta: [1,2]\n\n:\n\nevent: error\r\ndata: denied\r\n\r\n");
        assert_eq!(
            events,
            vec![
                SseEvent { event: "snapshot".into(), data: "[1,2]".into() },
                SseEvent { event: "error".into(), data: "denied".into() },
            ]
        );
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut parser = SseParser::default();
        let events = parser.push(b"data: a\ndata: b\n\n");
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let store = HttpDocumentStore::new(Client::new(), "http://localhost:3000/", "k");
        let url = store.endpoint("user 1", &["items", "March-2024"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/budgets/user%201/items/March-2024");
    }
}
