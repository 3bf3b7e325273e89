//! Browser `fetch` implementation of the collaborator traits.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value, json};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use crate::config::Endpoints;
use crate::drilldown::{DetailSource, GraphSource, PainPointRequest, WorkflowRequest};
use crate::error::FetchError;

fn js_error(err: JsValue) -> FetchError {
	FetchError::Transport(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Posts JSON bodies to the configured endpoints.
#[derive(Clone, Debug)]
pub struct HttpSource {
	endpoints: Endpoints,
}

impl HttpSource {
	/// A source posting to `endpoints`.
	pub fn new(endpoints: Endpoints) -> Self {
		Self { endpoints }
	}

	async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<Value, FetchError> {
		let body = serde_json::to_string(body)?;
		let headers = Headers::new().map_err(js_error)?;
		headers
			.set("Content-Type", "application/json")
			.map_err(js_error)?;

		let init = RequestInit::new();
		init.set_method("POST");
		init.set_headers(&headers);
		init.set_body(&JsValue::from_str(&body));
		let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;

		let window = web_sys::window()
			.ok_or_else(|| FetchError::Transport("no window to fetch from".into()))?;
		debug!("POST {url}");
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(js_error)?
			.dyn_into()
			.map_err(js_error)?;
		if !response.ok() {
			warn!("POST {url} answered {}", response.status());
			return Err(FetchError::Transport(format!(
				"{url} answered {}",
				response.status()
			)));
		}

		let text = JsFuture::from(response.text().map_err(js_error)?)
			.await
			.map_err(js_error)?
			.as_string()
			.ok_or_else(|| FetchError::Format("response body is not text".into()))?;
		Ok(serde_json::from_str(&text)?)
	}
}

#[async_trait(?Send)]
impl GraphSource for HttpSource {
	async fn stakeholders(&self, industry: &str) -> Result<Value, FetchError> {
		self.post(&self.endpoints.graph, &json!({ "industry": industry }))
			.await
	}
}

#[async_trait(?Send)]
impl DetailSource for HttpSource {
	async fn workflow(&self, request: &WorkflowRequest) -> Result<Value, FetchError> {
		self.post(&self.endpoints.workflow, request).await
	}

	async fn pain_points(&self, request: &PainPointRequest) -> Result<Value, FetchError> {
		self.post(&self.endpoints.pain_points, request).await
	}
}
