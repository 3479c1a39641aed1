use crate::config::GitHubConfig;
use crate::core::{IssueData, IssueSource};
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

pub const GITHUB_URL_PREFIX: &str = "https://github.com/";
pub const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// `owner/repo` pair taken from a `https://github.com/<owner>/<repo>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Surrounding whitespace is ignored. Anything other than exactly two
    /// non-empty path segments after the prefix is rejected.
    pub fn parse(repository_url: &str) -> Result<Self> {
        let trimmed = repository_url.trim();
        let invalid = || TriageError::InvalidRepositoryUrl {
            url: trimmed.to_string(),
        };

        let path = trimmed.strip_prefix(GITHUB_URL_PREFIX).ok_or_else(invalid)?;
        let segments: Vec<&str> = path.split('/').collect();

        match segments.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    comments_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    #[serde(default)]
    body: Option<String>,
}

/// Unauthenticated (unless a token is configured) GitHub REST client. At most
/// two GETs per retrieval, no retries.
#[derive(Debug, Clone)]
pub struct GitHubRetriever {
    client: Client,
    api_base: Url,
    authorization: Option<HeaderValue>,
}

impl GitHubRetriever {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            TriageError::InvalidConfigValueError {
                field: "github.api_base".to_string(),
                value: config.api_base.clone(),
                reason: e.to_string(),
            }
        })?;
        if api_base.cannot_be_a_base() {
            return Err(TriageError::InvalidConfigValueError {
                field: "github.api_base".to_string(),
                value: config.api_base.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON_MEDIA_TYPE));

        let authorization = config
            .token
            .as_ref()
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    TriageError::ConfigError {
                        message: "github.token contains characters not allowed in a header"
                            .to_string(),
                    }
                })
            })
            .transpose()?
            .map(|mut value| {
                value.set_sensitive(true);
                value
            });

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_base,
            authorization,
        })
    }

    pub fn issue_endpoint(&self, repository: &RepositoryRef, issue_number: u64) -> Url {
        let mut url = self.api_base.clone();
        let number = issue_number.to_string();
        // cannot_be_a_base() was ruled out in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                repository.owner.as_str(),
                repository.repo.as_str(),
                "issues",
                number.as_str(),
            ]);
        }
        url
    }

    /// Token only goes to the configured API origin, never to a host named
    /// inside an upstream payload such as `comments_url`.
    fn authorization_for(&self, url: &str) -> Option<HeaderValue> {
        let value = self.authorization.as_ref()?;
        let target = Url::parse(url).ok()?;
        (target.origin() == self.api_base.origin()).then(|| value.clone())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("Making GitHub API request to: {}", url);
        let mut request = self.client.get(url);
        if let Some(value) = self.authorization_for(url) {
            request = request.header(AUTHORIZATION, value);
        }
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("GitHub API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("GitHub API returned {} for {}", status, url);
            return Err(TriageError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TriageError::UpstreamPayload {
            message: format!("{}: {}", url, e),
        })
    }
}

#[async_trait]
impl IssueSource for GitHubRetriever {
    async fn retrieve(&self, repository_url: &str, issue_number: u64) -> Result<IssueData> {
        let repository = RepositoryRef::parse(repository_url)?;
        if issue_number == 0 {
            return Err(TriageError::InvalidIssueNumber {
                value: issue_number,
            });
        }

        let issue_url = self.issue_endpoint(&repository, issue_number);
        let issue: IssuePayload = self.get_json(issue_url.as_str()).await?;

        // 回報的留言數為 0 時不打第二次 API
        let comments = if issue.comments > 0 {
            let comments_url = issue.comments_url.ok_or_else(|| TriageError::UpstreamPayload {
                message: format!(
                    "issue reports {} comments but has no comments_url",
                    issue.comments
                ),
            })?;
            let comments: Vec<CommentPayload> = self.get_json(&comments_url).await?;
            comments
                .into_iter()
                .map(|c| c.body.unwrap_or_default())
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Retrieved {}/{}#{} with {} comments",
            repository.owner,
            repository.repo,
            issue_number,
            comments.len()
        );

        Ok(IssueData {
            title: issue.title.unwrap_or_default(),
            body: issue.body.unwrap_or_default(),
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn retriever_for(server: &MockServer) -> GitHubRetriever {
        let config = GitHubConfig {
            api_base: server.base_url(),
            ..GitHubConfig::default()
        };
        GitHubRetriever::new(&config).unwrap()
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let repository = RepositoryRef::parse("  https://github.com/octo/demo  ").unwrap();
        assert_eq!(repository.owner, "octo");
        assert_eq!(repository.repo, "demo");
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        for url in [
            "http://github.com/octo/demo",
            "https://gitlab.com/octo/demo",
            "github.com/octo/demo",
            "",
            "   ",
        ] {
            let result = RepositoryRef::parse(url);
            assert!(
                matches!(result, Err(TriageError::InvalidRepositoryUrl { .. })),
                "expected rejection for {:?}",
                url
            );
        }
    }

    #[test]
    fn test_parse_rejects_wrong_segment_shapes() {
        for url in [
            "https://github.com/",
            "https://github.com/octo",
            "https://github.com/octo/",
            "https://github.com//demo",
            "https://github.com/octo/demo/",
            "https://github.com/octo/demo/issues",
            "https://github.com/octo/demo/issues/1",
        ] {
            let result = RepositoryRef::parse(url);
            assert!(
                matches!(result, Err(TriageError::InvalidRepositoryUrl { .. })),
                "expected rejection for {:?}",
                url
            );
        }
    }

    #[test]
    fn test_issue_endpoint_respects_base_path() {
        let config = GitHubConfig {
            api_base: "https://github.example.com/api/v3/".to_string(),
            ..GitHubConfig::default()
        };
        let retriever = GitHubRetriever::new(&config).unwrap();
        let repository = RepositoryRef::parse("https://github.com/octo/demo").unwrap();

        assert_eq!(
            retriever.issue_endpoint(&repository, 7).as_str(),
            "https://github.example.com/api/v3/repos/octo/demo/issues/7"
        );
    }

    #[tokio::test]
    async fn test_retrieve_issue_with_comments() {
        let server = MockServer::start_async().await;

        let issue_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/issues/1")
                    .header("accept", GITHUB_JSON_MEDIA_TYPE)
                    .header_exists("user-agent");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!({
                        "title": "App crashes on startup",
                        "body": "Stack trace attached",
                        "comments": 2,
                        "comments_url": server.url("/repos/octo/demo/issues/1/comments")
                    }));
            })
            .await;

        let comments_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/1/comments");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!([
                        {"body": "same here"},
                        {"id": 99}
                    ]));
            })
            .await;

        let issue = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 1)
            .await
            .unwrap();

        issue_mock.assert_async().await;
        comments_mock.assert_async().await;
        assert_eq!(issue.title, "App crashes on startup");
        assert_eq!(issue.body, "Stack trace attached");
        assert_eq!(issue.comments, vec!["same here".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_zero_comments_skips_second_request() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/2");
                then.status(200).json_body(serde_json::json!({
                    "title": "Add dark mode toggle",
                    "body": null,
                    "comments": 0,
                    "comments_url": server.url("/repos/octo/demo/issues/2/comments")
                }));
            })
            .await;

        let comments_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/2/comments");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let issue = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 2)
            .await
            .unwrap();

        comments_mock.assert_hits_async(0).await;
        assert_eq!(issue.body, "");
        assert!(issue.comments.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/3");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let issue = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 3)
            .await
            .unwrap();

        assert_eq!(issue, IssueData::default());
    }

    #[tokio::test]
    async fn test_issue_not_found_is_upstream_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/404");
                then.status(404)
                    .json_body(serde_json::json!({"message": "Not Found"}));
            })
            .await;

        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 404)
            .await;

        match result {
            Err(TriageError::Upstream { status, body, .. }) => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_comments_failure_is_upstream_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/5");
                then.status(200).json_body(serde_json::json!({
                    "title": "t",
                    "comments": 1,
                    "comments_url": server.url("/repos/octo/demo/issues/5/comments")
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/5/comments");
                then.status(403).body("rate limit exceeded");
            })
            .await;

        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 5)
            .await;

        assert!(matches!(
            result,
            Err(TriageError::Upstream { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_request() {
        let server = MockServer::start_async().await;

        let any_mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo/extra", 1)
            .await;

        assert!(matches!(
            result,
            Err(TriageError::InvalidRepositoryUrl { .. })
        ));
        any_mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_issue_number_zero_is_rejected() {
        let server = MockServer::start_async().await;
        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 0)
            .await;

        assert!(matches!(
            result,
            Err(TriageError::InvalidIssueNumber { value: 0 })
        ));
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer() {
        let server = MockServer::start_async().await;

        let issue_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/issues/6")
                    .header("authorization", "Bearer ghp_test");
                then.status(200).json_body(serde_json::json!({"title": "t"}));
            })
            .await;

        let config = GitHubConfig {
            api_base: server.base_url(),
            token: Some("ghp_test".to_string()),
            ..GitHubConfig::default()
        };
        GitHubRetriever::new(&config)
            .unwrap()
            .retrieve("https://github.com/octo/demo", 6)
            .await
            .unwrap();

        issue_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_payload_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/8");
                then.status(200)
                    .header("Content-Type", "text/html")
                    .body("<html>maintenance</html>");
            })
            .await;

        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 8)
            .await;

        assert!(matches!(
            result,
            Err(TriageError::UpstreamPayload { .. })
        ));
    }

    #[tokio::test]
    async fn test_reported_comments_without_url_is_payload_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/9");
                then.status(200)
                    .json_body(serde_json::json!({"title": "t", "comments": 3}));
            })
            .await;

        let result = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 9)
            .await;

        match result {
            Err(TriageError::UpstreamPayload { message }) => {
                assert!(message.contains("comments_url"));
            }
            other => panic!("expected payload error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_comment_list_length_follows_returned_entries() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/10");
                then.status(200).json_body(serde_json::json!({
                    "title": "t",
                    "comments": 5,
                    "comments_url": server.url("/repos/octo/demo/issues/10/comments")
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/10/comments");
                then.status(200)
                    .json_body(serde_json::json!([{"body": "only one"}]));
            })
            .await;

        let issue = retriever_for(&server)
            .retrieve("https://github.com/octo/demo", 10)
            .await
            .unwrap();

        assert_eq!(issue.comments, vec!["only one".to_string()]);
    }

    #[tokio::test]
    async fn test_token_is_not_sent_to_foreign_comments_host() {
        let api = MockServer::start_async().await;
        let other = MockServer::start_async().await;

        let issue_mock = api
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/issues/11")
                    .header("authorization", "Bearer ghp_test");
                then.status(200).json_body(serde_json::json!({
                    "title": "t",
                    "comments": 1,
                    "comments_url": other.url("/elsewhere/comments")
                }));
            })
            .await;
        let foreign_mock = other
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/elsewhere/comments")
                    .header_missing("authorization");
                then.status(200).json_body(serde_json::json!([{"body": "c"}]));
            })
            .await;

        let config = GitHubConfig {
            api_base: api.base_url(),
            token: Some("ghp_test".to_string()),
            ..GitHubConfig::default()
        };
        let issue = GitHubRetriever::new(&config)
            .unwrap()
            .retrieve("https://github.com/octo/demo", 11)
            .await
            .unwrap();

        issue_mock.assert_async().await;
        foreign_mock.assert_async().await;
        assert_eq!(issue.comments, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_token_is_sent_to_same_origin_comments_url() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/issues/12");
                then.status(200).json_body(serde_json::json!({
                    "title": "t",
                    "comments": 1,
                    "comments_url": server.url("/repos/octo/demo/issues/12/comments")
                }));
            })
            .await;
        let comments_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/issues/12/comments")
                    .header("authorization", "Bearer ghp_test");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let config = GitHubConfig {
            api_base: server.base_url(),
            token: Some("ghp_test".to_string()),
            ..GitHubConfig::default()
        };
        GitHubRetriever::new(&config)
            .unwrap()
            .retrieve("https://github.com/octo/demo", 12)
            .await
            .unwrap();

        comments_mock.assert_async().await;
    }
}
