// API client module: a small blocking HTTP client that talks to the Meritt
// API. Every call is synchronous; the CLI runs one request at a time.

use crate::constants::{APP_VERSION, CRATE_NAME, ENV_PATH, LOGIN_PATH};
use crate::credentials::TokenPair;
use crate::env_file::Environment;
use crate::error::{CliError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the refresh token alongside the access token.
const REFRESH_HEADER: &str = "refresh";

/// API client holding a reqwest blocking client and the base URL of the
/// Meritt API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Login request payload.
#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl ApiClient {
    /// Create a client for the API at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", CRATE_NAME, APP_VERSION))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the Authorization/refresh header pair for a stored session.
    fn auth_headers(tokens: &TokenPair) -> Result<HeaderMap> {
        let bearer = |token: &str| {
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                CliError::Credentials("stored token contains invalid characters".into())
            })
        };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(&tokens.token)?);
        headers.insert(
            HeaderName::from_static(REFRESH_HEADER),
            bearer(&tokens.refresh_token)?,
        );
        Ok(headers)
    }

    /// POST the credentials to the login endpoint and return the token pair.
    pub fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!("POST {}", url);
        // credentials go in a JSON body, never in the URL
        let res = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()?;
        debug!("Login responded with {}", res.status());

        // 401 and 403 both mean wrong email or password here
        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CliError::InvalidCredentials),
            status if status.is_success() => Ok(res.json()?),
            _ => Err(error_from(res)),
        }
    }

    /// Ask the API where the env file for `project`/`environment` can be
    /// downloaded from.
    pub fn env_file_location(
        &self,
        project: &str,
        environment: Environment,
        tokens: &TokenPair,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, ENV_PATH);
        debug!("GET {} project={} environment={}", url, project, environment);
        // both tokens are sent so the server can refresh the session
        let res = self
            .client
            .get(&url)
            .query(&[("project", project), ("environment", environment.as_str())])
            .headers(Self::auth_headers(tokens)?)
            .send()?;
        debug!("Env lookup responded with {}", res.status());

        // anything else keeps its status and body for the error message
        match res.status() {
            StatusCode::NOT_FOUND => Err(CliError::ProjectNotFound(project.to_string())),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(CliError::Unauthorized(status))
            }
            status if status.is_success() => parse_location(&res.text()?),
            _ => Err(error_from(res)),
        }
    }

    /// Download the env file contents from the location returned by
    /// `env_file_location`.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        // the location is a full URL, no auth headers
        let res = self.client.get(url).send()?;
        debug!("Download responded with {}", res.status());
        if !res.status().is_success() {
            return Err(error_from(res));
        }
        // written byte for byte, so no text decoding
        Ok(res.bytes()?.to_vec())
    }
}

/// The location comes back either as a JSON string or as plain text.
fn parse_location(body: &str) -> Result<String> {
    let body = body.trim();
    let location = serde_json::from_str::<String>(body).unwrap_or_else(|_| body.to_string());
    if location.is_empty() {
        return Err(CliError::api(StatusCode::OK, "empty env file location"));
    }
    Ok(location)
}

fn error_from(res: Response) -> CliError {
    let status = res.status();
    let body = res.text().unwrap_or_default();
    CliError::api(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tokens() -> TokenPair {
        TokenPair {
            token: "access".into(),
            refresh_token: "refresh".into(),
        }
    }

    /// reqwest's blocking client must not run on the async test runtime.
    async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(
            parse_location("\"https://files.meritt.dev/a\"").unwrap(),
            "https://files.meritt.dev/a"
        );
        assert_eq!(
            parse_location("https://files.meritt.dev/b\n").unwrap(),
            "https://files.meritt.dev/b"
        );
        assert!(parse_location("  ").is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/auth/login"))
            .and(body_json(serde_json::json!({
                "email": "dev@meritt.dev",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "access",
                "refresh_token": "refresh",
                "user": {"id": 7},
            })))
            .mount(&server)
            .await;

        let base = server.uri();
        let tokens = blocking(move || {
            ApiClient::new(base)
                .unwrap()
                .login("dev@meritt.dev", "hunter2")
        })
        .await
        .unwrap();

        assert_eq!(tokens, self::tokens());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/auth/login"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let base = server.uri();
        let result = blocking(move || ApiClient::new(base).unwrap().login("a@b.c", "nope")).await;

        assert!(matches!(result, Err(CliError::InvalidCredentials)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/auth/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let base = server.uri();
        let result = blocking(move || ApiClient::new(base).unwrap().login("a@b.c", "pw")).await;

        match result {
            Err(CliError::Api { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_env_file_location_sends_both_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cli/env"))
            .and(query_param("project", "storefront"))
            .and(query_param("environment", "staging"))
            .and(header("authorization", "Bearer access"))
            .and(header("refresh", "Bearer refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json("https://files.meritt.dev/env/1"),
            )
            .mount(&server)
            .await;

        let base = server.uri();
        let location = blocking(move || {
            ApiClient::new(base)
                .unwrap()
                .env_file_location("storefront", Environment::Staging, &tokens())
        })
        .await
        .unwrap();

        assert_eq!(location, "https://files.meritt.dev/env/1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_env_file_location_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cli/env"))
            .and(query_param("project", "ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cli/env"))
            .and(query_param("project", "locked"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let base = server.uri();
        let (missing, locked) = blocking(move || {
            let api = ApiClient::new(base).unwrap();
            (
                api.env_file_location("ghost", Environment::Production, &tokens()),
                api.env_file_location("locked", Environment::Production, &tokens()),
            )
        })
        .await;

        assert!(matches!(missing, Err(CliError::ProjectNotFound(p)) if p == "ghost"));
        assert!(matches!(
            locked,
            Err(CliError::Unauthorized(StatusCode::UNAUTHORIZED))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/env-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("DB_URL=postgres://x\n"))
            .mount(&server)
            .await;

        let url = format!("{}/files/env-1", server.uri());
        let base = server.uri();
        let body = blocking(move || ApiClient::new(base).unwrap().download(&url))
            .await
            .unwrap();

        assert_eq!(body, b"DB_URL=postgres://x\n");
    }
}
