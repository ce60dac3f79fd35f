use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use crate::backend::{AuthorityDecision, ProjectSource};
use crate::models::{NavigationLookup, ProgressSnapshot, ProjectDetail};

/// REST backend source
pub struct HttpSource {
    base_url: Url,
    client: Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailResponse {
    Wrapped { project: ProjectDetail },
    Bare(ProjectDetail),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgressListResponse {
    Wrapped { projects: Vec<ProgressSnapshot> },
    Bare(Vec<ProgressSnapshot>),
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid backend URL: {}", base_url);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }

    /// Join path segments onto the base URL. Each segment is percent-encoded,
    /// so ids containing `/` stay a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Backend URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET and decode JSON; `Ok(None)` on 404
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        log::debug!("GET {}", url);
        let response = self.client
            .get(url.clone())
            .send()
            .with_context(|| format!("Request to {} failed", url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let body = response
            .json::<T>()
            .with_context(|| format!("Malformed response from {}", url))?;
        Ok(Some(body))
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().unwrap_or_default();
    let detail = body.trim();
    if detail.is_empty() {
        anyhow::bail!("{} returned {}", url, status)
    }
    anyhow::bail!("{} returned {}: {}", url, status, detail)
}

impl ProjectSource for HttpSource {
    fn project_detail(&self, project_id: &str) -> Result<ProjectDetail> {
        let url = self.endpoint(&["functional", "projects", project_id])?;
        match self.get_json::<DetailResponse>(url)? {
            Some(DetailResponse::Wrapped { project }) | Some(DetailResponse::Bare(project)) => Ok(project),
            None => anyhow::bail!("Project '{}' not found", project_id),
        }
    }

    fn navigation(&self, project_id: &str) -> Result<NavigationLookup> {
        let url = self.endpoint(&["navigation", "project", project_id])?;
        Ok(self.get_json(url)?.unwrap_or_else(NavigationLookup::not_found))
    }

    fn progress(&self, project_id: &str) -> Result<Option<ProgressSnapshot>> {
        let url = self.endpoint(&["progress", "project", project_id])?;
        let mut snapshot: Option<ProgressSnapshot> = self.get_json(url)?;
        if let Some(snapshot) = snapshot.as_mut() {
            if snapshot.project_id.is_empty() {
                snapshot.project_id = project_id.to_string();
            }
        }
        Ok(snapshot)
    }

    fn progress_list(&self) -> Result<Vec<ProgressSnapshot>> {
        let url = self.endpoint(&["progress", "list"])?;
        let list = match self.get_json::<ProgressListResponse>(url)? {
            Some(ProgressListResponse::Wrapped { projects }) | Some(ProgressListResponse::Bare(projects)) => projects,
            None => Vec::new(),
        };
        Ok(list)
    }

    fn submit_decision(&self, decision: &AuthorityDecision) -> Result<()> {
        let url = self.endpoint(&["tender", "authority-decision"])?;
        log::info!(
            "Submitting authority decision for {} (truth_value={})",
            decision.project_id, decision.truth_value
        );
        let response = self.client
            .post(url.clone())
            .json(decision)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;
        check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> HttpSource {
        HttpSource::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let src = source("http://localhost:8003");
        assert_eq!(
            src.endpoint(&["progress", "list"]).unwrap().as_str(),
            "http://localhost:8003/progress/list"
        );

        // Trailing slash on the base does not double up
        let src = source("http://localhost:8003/api/");
        assert_eq!(
            src.endpoint(&["navigation", "project", "P1"]).unwrap().as_str(),
            "http://localhost:8003/api/navigation/project/P1"
        );
    }

    #[test]
    fn test_endpoint_encodes_project_id_as_one_segment() {
        let src = source("http://localhost:8003");
        let url = src.endpoint(&["functional", "projects", "PSB/PROC/2025/1/12/4"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8003/functional/projects/PSB%2FPROC%2F2025%2F1%2F12%2F4"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(HttpSource::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpSource::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_detail_response_shapes() {
        let wrapped: DetailResponse = serde_json::from_str(
            r#"{"project":{"project_id":"P1","title":"Servers","department":"IT","estimated_amount":10.5},"files":[]}"#,
        ).unwrap();
        let DetailResponse::Wrapped { project } = wrapped else { panic!("expected wrapped") };
        assert_eq!(project.project_id, "P1");
        assert_eq!(project.estimated_amount, 10.5);

        let bare: DetailResponse = serde_json::from_str(
            r#"{"project_id":"P2","title":"Desks","department":"Admin"}"#,
        ).unwrap();
        assert!(matches!(bare, DetailResponse::Bare(ref p) if p.project_id == "P2"));
    }

    #[test]
    fn test_progress_list_shapes() {
        let bare: ProgressListResponse = serde_json::from_str(
            r#"[{"project_id":"P1","current_page":2,"overall_progress":10,"status":"in_progress"}]"#,
        ).unwrap();
        assert!(matches!(bare, ProgressListResponse::Bare(ref v) if v.len() == 1));

        let wrapped: ProgressListResponse = serde_json::from_str(r#"{"projects":[]}"#).unwrap();
        assert!(matches!(wrapped, ProgressListResponse::Wrapped { ref projects } if projects.is_empty()));
    }

    #[test]
    fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) is not expected to be listening
        let src = source("http://127.0.0.1:9");
        assert!(src.project_detail("P1").is_err());
        assert!(src.progress_list().is_err());
    }

    mod wire {
        use super::*;
        use serde_json::json;
        use wiremock::matchers::{body_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        /// Run `f` against a source pointed at `server`. The client is blocking,
        /// so it lives on a blocking thread for its whole life.
        async fn with_source<T, F>(server: &MockServer, f: F) -> T
        where
            T: Send + 'static,
            F: FnOnce(HttpSource) -> T + Send + 'static,
        {
            let uri = server.uri();
            tokio::task::spawn_blocking(move || f(source(&uri)))
                .await
                .unwrap()
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_wrapped_project_detail() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/functional/projects/P-1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "project": {
                        "project_id": "P-1",
                        "title": "Core banking servers",
                        "department": "IT",
                        "priority": "high",
                        "estimated_amount": 2500000.0
                    }
                })))
                .mount(&server)
                .await;

            let detail = with_source(&server, |src| src.project_detail("P-1")).await.unwrap();
            assert_eq!(detail.title, "Core banking servers");
            assert_eq!(detail.priority, "high");

            let err = with_source(&server, |src| src.project_detail("P-2")).await.unwrap_err();
            assert!(err.to_string().contains("not found"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_navigation_absent_on_404_and_not_found() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/navigation/project/P-2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": false})))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/navigation/project/P-3"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "found": true,
                    "current_stage": 7,
                    "current_page_component": "VendorEvaluation"
                })))
                .mount(&server)
                .await;

            let (missing, not_found, found) = with_source(&server, |src| {
                (
                    src.navigation("P-1").unwrap(),
                    src.navigation("P-2").unwrap(),
                    src.navigation("P-3").unwrap(),
                )
            })
            .await;

            assert_eq!(missing, NavigationLookup::not_found());
            assert!(!not_found.found);
            assert!(not_found.into_snapshot("P-2").is_none());
            let snapshot = found.into_snapshot("P-3").unwrap();
            assert_eq!(snapshot.current_stage, 7);
            assert_eq!(snapshot.current_page_component.as_deref(), Some("VendorEvaluation"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_progress_absent_on_404_and_id_filled_in() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/progress/project/P-4"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "current_page": 4,
                    "overall_progress": 30,
                    "status": "In Progress"
                })))
                .mount(&server)
                .await;

            let (missing, present) = with_source(&server, |src| {
                (src.progress("P-1").unwrap(), src.progress("P-4").unwrap())
            })
            .await;

            assert!(missing.is_none());
            let present = present.unwrap();
            assert_eq!(present.project_id, "P-4");
            assert_eq!(present.current_page, 4);
            assert_eq!(present.status, crate::models::ProgressStatus::InProgress);
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_wrapped_progress_list() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/progress/list"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "projects": [
                        {"project_id": "P-1", "current_page": 11, "overall_progress": 100, "status": "completed"},
                        {"project_id": "P-2", "current_page": 3, "overall_progress": 20, "status": "in_progress"}
                    ]
                })))
                .mount(&server)
                .await;

            let list = with_source(&server, |src| src.progress_list()).await.unwrap();
            assert_eq!(list.len(), 2);
            assert!(list[0].is_complete());
            assert_eq!(list[1].project_id, "P-2");
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_decision_posts_truth_value() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/tender/authority-decision"))
                .and(body_json(json!({"project_id": "P-1", "truth_value": 1})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/tender/authority-decision"))
                .and(body_json(json!({"project_id": "P-2", "truth_value": 0})))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;

            with_source(&server, |src| {
                src.submit_decision(&AuthorityDecision::new("P-1", true)).unwrap();
                src.submit_decision(&AuthorityDecision::new("P-2", false)).unwrap();
            })
            .await;
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_decision_error_status_is_an_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/tender/authority-decision"))
                .respond_with(ResponseTemplate::new(500).set_body_string("approval service down"))
                .mount(&server)
                .await;

            let err = with_source(&server, |src| {
                src.submit_decision(&AuthorityDecision::new("P-1", true))
            })
            .await
            .unwrap_err();
            let message = err.to_string();
            assert!(message.contains("500"));
            assert!(message.contains("approval service down"));
        }
    }
}
