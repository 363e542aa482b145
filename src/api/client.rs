use crate::api::error::ApiError;
use crate::api::types::{ApiEnvelope, ApiErrorBody, ApiPaginated, EntryBody, ListPage};
use crate::session::Credential;
use color_eyre::{eyre::eyre, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

/// E-Filing API client
#[derive(Clone)]
pub struct EfilingClient {
  http: reqwest::Client,
  base: Url,
}

impl EfilingClient {
  pub fn new(base_url: &str) -> Result<Self> {
    // Treat the base as a directory so joins keep any path prefix
    let normalized = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{}/", base_url)
    };

    let base = Url::parse(&normalized).map_err(|e| eyre!("Invalid API base URL {}: {}", base_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("efiling/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  /// Host shown in the header
  pub fn host(&self) -> &str {
    self.base.host_str().unwrap_or("")
  }

  /// `{base}api/{path}`
  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base
      .join(&format!("api/{}", path))
      .map_err(|e| ApiError::Url(e.to_string()))
  }

  /// `{base}api/{resource}/{id}`, with `id` escaped as a single path segment
  fn item_endpoint(&self, resource: &str, id: &str) -> Result<Url, ApiError> {
    let mut url = self.endpoint(resource)?;
    url
      .path_segments_mut()
      .map_err(|_| ApiError::Url(format!("cannot append to {}", self.base)))?
      .push(id);
    Ok(url)
  }

  /// Fetch the list endpoint of a resource.
  #[instrument(skip(self, credential))]
  pub async fn list<T: DeserializeOwned>(
    &self,
    resource: &str,
    credential: &Credential,
  ) -> Result<ListPage<T>, ApiError> {
    let url = self.endpoint(resource)?;
    debug!(%url, "GET list");

    let response = self
      .http
      .get(url)
      .bearer_auth(credential.token())
      .send()
      .await?;
    let response = check_status(response).await?;

    let envelope: ApiEnvelope<ApiPaginated<T>> = response
      .json()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()))?;

    let data = envelope.into_data()?;
    let records = data
      .paginated_data
      .ok_or(ApiError::UnexpectedEnvelope { message: None })?;

    Ok(ListPage {
      records,
      pagination: data.meta,
    })
  }

  /// Fetch a single record by id.
  #[instrument(skip(self, credential))]
  pub async fn get_one<T: DeserializeOwned>(
    &self,
    resource: &str,
    id: &str,
    credential: &Credential,
  ) -> Result<T, ApiError> {
    let url = self.item_endpoint(resource, id)?;
    debug!(%url, "GET one");

    let response = self
      .http
      .get(url)
      .bearer_auth(credential.token())
      .send()
      .await?;
    let response = check_status(response).await?;

    let envelope: ApiEnvelope<T> = response
      .json()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()))?;

    envelope.into_data()
  }

  /// Create a record. The response body is not interpreted.
  #[instrument(skip(self, body, credential))]
  pub async fn create(
    &self,
    resource: &str,
    body: EntryBody,
    credential: &Credential,
  ) -> Result<(), ApiError> {
    let url = self.endpoint(resource)?;
    let request = self.http.post(url).bearer_auth(credential.token());

    let request = match body {
      EntryBody::Json(map) => request.json(&map),
      EntryBody::Multipart { fields, attachment } => {
        let mut form = Form::new();
        for (name, value) in fields {
          form = form.text(name, value);
        }
        if let Some(file) = attachment {
          let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)?;
          form = form.part(file.field, part);
        }
        request.multipart(form)
      }
    };

    check_status(request.send().await?).await?;
    Ok(())
  }

  /// Delete a record by id.
  #[instrument(skip(self, credential))]
  pub async fn delete(&self, resource: &str, id: &str, credential: &Credential) -> Result<(), ApiError> {
    let url = self.item_endpoint(resource, id)?;

    let response = self
      .http
      .delete(url)
      .bearer_auth(credential.token())
      .send()
      .await?;
    check_status(response).await?;

    Ok(())
  }

  /// End the server-side session.
  pub async fn logout(&self, credential: &Credential) -> Result<(), ApiError> {
    let url = self.endpoint("users/logout")?;

    let response = self
      .http
      .post(url)
      .bearer_auth(credential.token())
      .json(&serde_json::json!({}))
      .send()
      .await?;
    check_status(response).await?;

    Ok(())
  }

  /// Viewer URL for a stored document.
  ///
  /// Documents are stored under object-storage URLs; the API serves them by
  /// the last path segment.
  pub fn file_view_url(&self, stored_url: &str) -> Option<String> {
    let filename = stored_url.trim().rsplit('/').next()?;
    if filename.is_empty() {
      return None;
    }

    let mut url = self.endpoint("files/view").ok()?;
    url.path_segments_mut().ok()?.push(filename);
    Some(url.to_string())
  }
}

/// Map non-success statuses to errors, extracting the server's message.
async fn check_status(response: Response) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  if status == StatusCode::UNAUTHORIZED {
    return Err(ApiError::Unauthorized);
  }

  let body: ApiErrorBody = response.json().await.unwrap_or_default();
  Err(ApiError::Status {
    status: status.as_u16(),
    message: body.message,
  })
}
