use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::config::DashboardConfig;
use crate::model::{AnnotatePayload, RecordDetail, RecordId, StatusTag};
use crate::{targets, Error};

pub const LIST_PATH: &str = "get_surveys";
pub const DETAIL_PATH: &str = "get_single_report";
pub const UPDATE_STATUS_PATH: &str = "update_report_status";
pub const DELETE_PATH: &str = "delete_report";
pub const ANNOTATE_PATH: &str = "add_to_forum";

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// Remote collection of records. List results are raw JSON objects; callers
/// normalize them through a field mapping.
pub trait RecordGateway: Send + Sync {
    fn list_surveys(&self) -> GatewayFuture<'_, Vec<Value>>;
    fn get_record_detail(&self, id: RecordId) -> GatewayFuture<'_, RecordDetail>;
    fn update_status(&self, id: RecordId, status: StatusTag) -> GatewayFuture<'_, ()>;
    fn delete_record(&self, id: RecordId) -> GatewayFuture<'_, ()>;
    fn annotate(&self, id: RecordId, payload: AnnotatePayload) -> GatewayFuture<'_, String>;
}

#[derive(Debug, Deserialize)]
struct SurveysEnvelope {
    surveys: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ReportEnvelope {
    report: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: StatusTag,
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|error| Error::NetworkFailure {
            url: base_url.to_string(),
            details: format!("invalid base URL: {error}"),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::NetworkFailure {
                url: base_url.to_string(),
                details: error.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, Error> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::NetworkFailure {
                url: self.base_url.to_string(),
                details: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn list_surveys(&self) -> Result<Vec<Value>, Error> {
        let url = self.endpoint(&[LIST_PATH])?;
        debug!(target: targets::GATEWAY, url = %url, "GET surveys");
        let result = async {
            let response = send(self.client.get(url.clone()), &url).await?;
            let envelope: SurveysEnvelope = decode(response, &url).await?;
            Ok::<_, Error>(envelope.surveys)
        }
        .await;
        log_outcome("GET surveys", &url, &result, |surveys| surveys.len());
        result
    }

    pub async fn get_record_detail(&self, id: RecordId) -> Result<RecordDetail, Error> {
        let url = self.endpoint(&[DETAIL_PATH, id.as_str()])?;
        debug!(target: targets::GATEWAY, url = %url, id = %id, "GET report detail");
        let result = async {
            let response = send(self.client.get(url.clone()), &url).await?;
            let envelope: ReportEnvelope = decode(response, &url).await?;
            Ok::<_, Error>(RecordDetail::from_raw(&id, &envelope.report))
        }
        .await;
        log_outcome("GET report detail", &url, &result, |detail| detail.media.len());
        result
    }

    pub async fn update_status(&self, id: RecordId, status: StatusTag) -> Result<(), Error> {
        let url = self.endpoint(&[UPDATE_STATUS_PATH, id.as_str()])?;
        debug!(
            target: targets::GATEWAY,
            url = %url,
            id = %id,
            status = %status,
            "PUT report status"
        );
        let request = self.client.put(url.clone()).json(&StatusBody { status });
        let result = send(request, &url).await.map(|_| ());
        log_outcome("PUT report status", &url, &result, |_| 0);
        result
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<(), Error> {
        let url = self.endpoint(&[DELETE_PATH, id.as_str()])?;
        debug!(target: targets::GATEWAY, url = %url, id = %id, "DELETE report");
        let result = send(self.client.delete(url.clone()), &url).await.map(|_| ());
        log_outcome("DELETE report", &url, &result, |_| 0);
        result
    }

    pub async fn annotate(&self, id: RecordId, payload: AnnotatePayload) -> Result<String, Error> {
        let url = self.endpoint(&[ANNOTATE_PATH, id.as_str()])?;
        debug!(target: targets::GATEWAY, url = %url, id = %id, "POST forum annotation");
        let result = async {
            let response = send(self.client.post(url.clone()).json(&payload), &url).await?;
            let envelope: MessageEnvelope = decode(response, &url).await?;
            Ok::<_, Error>(envelope.message)
        }
        .await;
        log_outcome("POST forum annotation", &url, &result, String::len);
        result
    }
}

impl RecordGateway for HttpGateway {
    fn list_surveys(&self) -> GatewayFuture<'_, Vec<Value>> {
        Box::pin(HttpGateway::list_surveys(self))
    }

    fn get_record_detail(&self, id: RecordId) -> GatewayFuture<'_, RecordDetail> {
        Box::pin(HttpGateway::get_record_detail(self, id))
    }

    fn update_status(&self, id: RecordId, status: StatusTag) -> GatewayFuture<'_, ()> {
        Box::pin(HttpGateway::update_status(self, id, status))
    }

    fn delete_record(&self, id: RecordId) -> GatewayFuture<'_, ()> {
        Box::pin(HttpGateway::delete_record(self, id))
    }

    fn annotate(&self, id: RecordId, payload: AnnotatePayload) -> GatewayFuture<'_, String> {
        Box::pin(HttpGateway::annotate(self, id, payload))
    }
}

async fn send(request: RequestBuilder, url: &Url) -> Result<Response, Error> {
    let response = request.send().await.map_err(|error| Error::NetworkFailure {
        url: url.to_string(),
        details: error.to_string(),
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.ok();
    Err(Error::ServerError {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, Error> {
    let bytes = response.bytes().await.map_err(|error| Error::NetworkFailure {
        url: url.to_string(),
        details: error.to_string(),
    })?;
    trace!(target: targets::GATEWAY, url = %url, bytes = bytes.len(), "Response body");
    serde_json::from_slice(&bytes).map_err(|error| Error::Decode {
        url: url.to_string(),
        details: error.to_string(),
    })
}

fn log_outcome<T>(
    operation: &str,
    url: &Url,
    result: &Result<T, Error>,
    count: impl FnOnce(&T) -> usize,
) {
    match result {
        Ok(value) => debug!(
            target: targets::GATEWAY,
            url = %url,
            count = count(value),
            "{operation} ok"
        ),
        Err(error) => warn!(
            target: targets::GATEWAY,
            url = %url,
            error = %error.technical_detail(),
            "{operation} failed"
        ),
    }
}

/// A gateway call as observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListSurveys,
    GetRecordDetail(RecordId),
    UpdateStatus { id: RecordId, status: StatusTag },
    DeleteRecord(RecordId),
    Annotate { id: RecordId, payload: AnnotatePayload },
}

#[derive(Debug, Default)]
struct MockQueues {
    lists: VecDeque<Result<Vec<Value>, Error>>,
    details: VecDeque<Result<RecordDetail, Error>>,
    updates: VecDeque<Result<(), Error>>,
    deletes: VecDeque<Result<(), Error>>,
    annotations: VecDeque<Result<String, Error>>,
    calls: Vec<GatewayCall>,
}

/// In-memory gateway answering from per-operation queues. An empty queue
/// answers with a network failure.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockQueues>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, result: Result<Vec<Value>, Error>) {
        self.with_state(|state| state.lists.push_back(result));
    }

    pub fn push_detail(&self, result: Result<RecordDetail, Error>) {
        self.with_state(|state| state.details.push_back(result));
    }

    pub fn push_update(&self, result: Result<(), Error>) {
        self.with_state(|state| state.updates.push_back(result));
    }

    pub fn push_delete(&self, result: Result<(), Error>) {
        self.with_state(|state| state.deletes.push_back(result));
    }

    pub fn push_annotation(&self, result: Result<String, Error>) {
        self.with_state(|state| state.annotations.push_back(result));
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.with_state(|state| state.calls.clone())
            .unwrap_or_default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockQueues) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut guard| f(&mut guard))
    }

    fn answer<T>(
        &self,
        call: GatewayCall,
        queue: impl FnOnce(&mut MockQueues) -> Option<Result<T, Error>>,
    ) -> Result<T, Error> {
        let label = format!("{call:?}");
        self.with_state(|state| {
            state.calls.push(call);
            queue(state)
        })
        .flatten()
        .unwrap_or_else(|| {
            Err(Error::NetworkFailure {
                url: "mock://gateway".to_string(),
                details: format!("MockGateway queue is empty for {label}"),
            })
        })
    }
}

impl RecordGateway for MockGateway {
    fn list_surveys(&self) -> GatewayFuture<'_, Vec<Value>> {
        Box::pin(async move {
            self.answer(GatewayCall::ListSurveys, |state| state.lists.pop_front())
        })
    }

    fn get_record_detail(&self, id: RecordId) -> GatewayFuture<'_, RecordDetail> {
        Box::pin(async move {
            self.answer(GatewayCall::GetRecordDetail(id), |state| {
                state.details.pop_front()
            })
        })
    }

    fn update_status(&self, id: RecordId, status: StatusTag) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.answer(GatewayCall::UpdateStatus { id, status }, |state| {
                state.updates.pop_front()
            })
        })
    }

    fn delete_record(&self, id: RecordId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.answer(GatewayCall::DeleteRecord(id), |state| {
                state.deletes.pop_front()
            })
        })
    }

    fn annotate(&self, id: RecordId, payload: AnnotatePayload) -> GatewayFuture<'_, String> {
        Box::pin(async move {
            self.answer(GatewayCall::Annotate { id, payload }, |state| {
                state.annotations.pop_front()
            })
        })
    }
}
