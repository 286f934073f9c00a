//! Transports carrying step requests from the controller to the server.

use async_trait::async_trait;
use reqwest::Url;

use crate::client::error::ClientError;
use crate::forms::{FormData, ValidationErrors};
use crate::rest::dto::{LoadStepResponse, StepValuesRequest};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::wizard::{StepRequestHandler, WizardError};

/// Result of submitting a step form
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved,
    Invalid(ValidationErrors),
}

/// Step request boundary as seen from the client
#[async_trait]
pub trait WizardTransport: Send + Sync {
    async fn load_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
    ) -> Result<LoadStepResponse, ClientError>;

    async fn submit_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<SubmitOutcome, ClientError>;

    /// Re-render a step with `values` applied, saving nothing
    async fn refresh_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<LoadStepResponse, ClientError>;
}

/// Talks to the REST API over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("invalid base url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "invalid base url '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("multistep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn step_url(&self, uniqueid: &str, recordid: i64, step: i64, refresh: bool) -> Url {
        let recordid = recordid.to_string();
        let step = step.to_string();
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "api",
                "v1",
                "wizards",
                uniqueid,
                recordid.as_str(),
                "steps",
                step.as_str(),
            ]);
            if refresh {
                segments.push("refresh");
            }
        }
        url
    }

    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => ClientError::Server {
                status,
                error: parsed.error,
                message: parsed.message,
            },
            Err(_) => ClientError::Server {
                status,
                error: "http_error".to_string(),
                message: body,
            },
        }
    }

    async fn step_response(response: reqwest::Response) -> Result<LoadStepResponse, ClientError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json::<LoadStepResponse>().await?)
    }
}

#[async_trait]
impl WizardTransport for HttpTransport {
    async fn load_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
    ) -> Result<LoadStepResponse, ClientError> {
        let url = self.step_url(uniqueid, recordid, step, false);
        tracing::debug!(%url, "Loading step");
        let response = self.client.get(url).send().await?;
        Self::step_response(response).await
    }

    async fn submit_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<SubmitOutcome, ClientError> {
        let url = self.step_url(uniqueid, recordid, step, false);
        let response = self
            .client
            .post(url)
            .json(&StepValuesRequest { values })
            .send()
            .await?;

        match response.status().as_u16() {
            200..=299 => Ok(SubmitOutcome::Saved),
            422 => {
                let body = response.json::<ErrorResponse>().await?;
                Ok(SubmitOutcome::Invalid(ValidationErrors(body.fields)))
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn refresh_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<LoadStepResponse, ClientError> {
        let url = self.step_url(uniqueid, recordid, step, true);
        let response = self
            .client
            .post(url)
            .json(&StepValuesRequest { values })
            .send()
            .await?;
        Self::step_response(response).await
    }
}

/// Calls a [`StepRequestHandler`] in-process, for embedding without HTTP
#[derive(Clone)]
pub struct LocalTransport {
    handler: StepRequestHandler,
}

impl LocalTransport {
    pub fn new(handler: StepRequestHandler) -> Self {
        Self { handler }
    }
}

fn server_error(err: WizardError) -> ClientError {
    let api = ApiError::from(err);
    let status = api.status().as_u16();
    let body = api.into_body();
    ClientError::Server {
        status,
        error: body.error,
        message: body.message,
    }
}

#[async_trait]
impl WizardTransport for LocalTransport {
    async fn load_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
    ) -> Result<LoadStepResponse, ClientError> {
        self.handler
            .load_step(uniqueid, recordid, step)
            .map(LoadStepResponse::from)
            .map_err(server_error)
    }

    async fn submit_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<SubmitOutcome, ClientError> {
        match self.handler.submit_step(uniqueid, recordid, step, values) {
            Ok(()) => Ok(SubmitOutcome::Saved),
            Err(WizardError::ValidationFailed(errors)) => Ok(SubmitOutcome::Invalid(errors)),
            Err(e) => Err(server_error(e)),
        }
    }

    async fn refresh_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> Result<LoadStepResponse, ClientError> {
        self.handler
            .refresh_step(uniqueid, recordid, step, values)
            .map(LoadStepResponse::from)
            .map_err(server_error)
    }
}
