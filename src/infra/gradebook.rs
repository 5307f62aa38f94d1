//! [`GradingApi`] over HTTP against the hosted grading service.

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::fetch::auth::{ApiKey, UrlParam};
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::services::grading_api::{
    Assignment, GradingApi, StudentGrades, StudentListing, UniversityClass,
};

/// Transport stack used in production: `buid` query param, then the
/// `x-functions-key` header, then plain reqwest.
pub type AuthenticatedClient = UrlParam<ApiKey<BasicClient>>;

pub struct GradebookClient<C> {
    http: C,
    base_url: Url,
}

impl GradebookClient<AuthenticatedClient> {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let basic = BasicClient::new(config.timeout)?;
        let keyed = ApiKey::functions_key(basic, &config.api_key)?;
        Self::new(UrlParam::buid(keyed, config.buid.clone()), &config.base_url)
    }
}

impl<C: HttpClient> GradebookClient<C> {
    pub fn new(http: C, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("base url '{base_url}': {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    /// Appends percent-encoded `segments` to the base URL's path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::InvalidRequest(format!("base url '{}' cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        debug!(url = %url, "Resolved endpoint");
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> GradingApi for GradebookClient<C> {
    #[tracing::instrument(skip(self))]
    async fn list_classes(&self, semester: &str) -> Result<Vec<UniversityClass>, ApiError> {
        let url = self.endpoint(&["class", "listBySemester", semester])?;
        fetch_json(&self.http, url, "class list").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_assignments(&self, class_id: &str) -> Result<Vec<Assignment>, ApiError> {
        let url = self.endpoint(&["class", "listAssignments", class_id])?;
        fetch_json(&self.http, url, "assignment list").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_students(&self, class_id: &str) -> Result<StudentListing, ApiError> {
        let url = self.endpoint(&["class", "listStudents", class_id])?;
        fetch_json(&self.http, url, "student list").await
    }

    #[tracing::instrument(skip(self))]
    async fn student_grades(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> Result<StudentGrades, ApiError> {
        let url = self.endpoint(&["student", "listGrades", student_id, class_id])?;
        fetch_json(&self.http, url, "student grades").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl HttpClient for Unreachable {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("endpoint tests never send")
        }
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = GradebookClient::new(Unreachable, "https://grades.test/api").unwrap();
        let url = client.endpoint(&["class", "listBySemester", "fall2022"]).unwrap();
        assert_eq!(url.as_str(), "https://grades.test/api/class/listBySemester/fall2022");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = GradebookClient::new(Unreachable, "https://grades.test/api/").unwrap();
        let url = client.endpoint(&["class", "listStudents", "C1"]).unwrap();
        assert_eq!(url.as_str(), "https://grades.test/api/class/listStudents/C1");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = GradebookClient::new(Unreachable, "https://grades.test/api").unwrap();
        let url = client.endpoint(&["student", "listGrades", "U 1/2", "C1"]).unwrap();
        assert_eq!(url.as_str(), "https://grades.test/api/student/listGrades/U%201%2F2/C1");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(GradebookClient::new(Unreachable, "not a url").is_err());
        assert!(GradebookClient::new(Unreachable, "mailto:someone@example.com").is_err());
    }
}
