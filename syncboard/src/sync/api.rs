//! Request/response half of the sync channel.

use std::time::Duration;

use url::Url;

use syncboard_proto::api::{NewTask, NewUser, TaskUpdate};
use syncboard_proto::task::{OwnerId, Task, TaskId};

use super::SyncError;

/// Persistence client for board state.
///
/// Implementations talk to whatever holds the durable truth. The engine
/// awaits each call exactly once and never retries; retry policy belongs
/// to the caller driving the mutation.
pub trait SyncApi: Send + Sync {
    /// Registers the authenticated user's profile.
    fn register_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;

    /// Fetches every task belonging to `owner`.
    fn list_tasks(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, SyncError>> + Send;

    /// Persists a new task; the service assigns id and creation time.
    fn create_task(
        &self,
        new: &NewTask,
    ) -> impl std::future::Future<Output = Result<Task, SyncError>> + Send;

    /// Replaces the stored fields of the task with the given id.
    fn update_task(
        &self,
        id: &TaskId,
        update: &TaskUpdate,
    ) -> impl std::future::Future<Output = Result<Task, SyncError>> + Send;

    /// Deletes the task with the given id.
    fn delete_task(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;
}

/// JSON-over-HTTP persistence client.
#[derive(Debug)]
pub struct HttpApi {
    base: Url,
    http: reqwest::Client,
}

impl HttpApi {
    /// Builds a client for the service at `base_url` with a per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if the URL does not parse or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let base = Url::parse(base_url)
            .map_err(|e| SyncError::Network(format!("invalid api url {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { base, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base
            .join(path)
            .map_err(|e| SyncError::Network(format!("invalid endpoint {path}: {e}")))
    }
}

/// Maps a transport-level failure onto [`SyncError`].
fn map_send_error(e: &reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Network(e.to_string())
    }
}

/// Turns a non-success response into the matching [`SyncError`], reading
/// the body for context. Client-input statuses become
/// [`SyncError::Rejected`]; everything else is [`SyncError::Network`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::BAD_REQUEST
        || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
    {
        Err(SyncError::Rejected(format!("{status}: {body}")))
    } else {
        Err(SyncError::Network(format!("{status}: {body}")))
    }
}

impl SyncApi for HttpApi {
    async fn register_user(&self, user: &NewUser) -> Result<(), SyncError> {
        let url = self.endpoint("/users")?;
        let response = self
            .http
            .post(url)
            .json(user)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;
        check(response).await?;
        Ok(())
    }

    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, SyncError> {
        let url = self.endpoint("/tasks")?;
        let response = self
            .http
            .get(url)
            .query(&[("uid", owner.as_str())])
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;
        let response = check(response).await?;
        response
            .json::<Vec<Task>>()
            .await
            .map_err(|e| SyncError::Network(format!("malformed task list: {e}")))
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, SyncError> {
        let url = self.endpoint("/tasks")?;
        let response = self
            .http
            .post(url)
            .json(new)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;
        let response = check(response).await?;
        response
            .json::<Task>()
            .await
            .map_err(|e| SyncError::Network(format!("malformed task: {e}")))
    }

    async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, SyncError> {
        let url = self.endpoint(&format!("/tasks/{id}"))?;
        let response = self
            .http
            .put(url)
            .json(update)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;
        let response = check(response).await?;
        response
            .json::<Task>()
            .await
            .map_err(|e| SyncError::Network(format!("malformed task: {e}")))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("/tasks/{id}"))?;
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;
        check(response).await?;
        Ok(())
    }
}
