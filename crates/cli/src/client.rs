//! Signed REST client for the OCI identity, compute and monitoring services

use alarm_lib::services::{async_trait, AlarmQuery, InstanceQuery};
use alarm_lib::{
    AlarmSpec, AlarmSummary, Compartment, ComputeService, CreatedAlarm, IdentityService, Instance,
    MonitoringService, Page, ProvisionError, Result,
};
use reqwest::{Client, Request, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::config::OciProfile;
use crate::signer::RequestSigner;

const IDENTITY: &str = "identity";
const COMPUTE: &str = "compute";
const MONITORING: &str = "monitoring";

const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Base URLs of the services, one per region
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub identity: Url,
    pub compute: Url,
    pub monitoring: Url,
}

impl Endpoints {
    /// Public endpoints of `region`
    pub fn for_region(region: &str) -> Result<Self> {
        let parse = |service: &str| {
            Url::parse(&format!("https://{service}.{region}.oraclecloud.com/")).map_err(|err| {
                ProvisionError::Configuration(format!("invalid region {region:?}: {err}"))
            })
        };

        Ok(Self {
            identity: parse("identity")?,
            compute: parse("iaas")?,
            monitoring: parse("telemetry")?,
        })
    }

    /// Every service behind the same base URL
    pub fn single(base: &str) -> Result<Self> {
        let url = Url::parse(base)
            .map_err(|err| ProvisionError::Configuration(format!("invalid URL {base}: {err}")))?;
        Ok(Self {
            identity: url.clone(),
            compute: url.clone(),
            monitoring: url,
        })
    }
}

/// Error body returned by OCI services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Client for the OCI REST APIs
pub struct OciClient {
    client: Client,
    signer: RequestSigner,
    endpoints: Endpoints,
}

impl OciClient {
    /// Create a client for the region and key of `profile`
    pub fn from_profile(profile: &OciProfile) -> Result<Self> {
        let signer = RequestSigner::from_profile(profile)?;
        Self::new(signer, Endpoints::for_region(&profile.region)?)
    }

    pub fn new(signer: RequestSigner, endpoints: Endpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|err| {
                ProvisionError::Configuration(format!("failed to create HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            signer,
            endpoints,
        })
    }

    fn url(&self, service: &'static str, base: &Url, path: &str) -> Result<Url> {
        base.join(path)
            .map_err(|err| ProvisionError::Configuration(format!("invalid {service} path: {err}")))
    }

    async fn execute(&self, service: &'static str, mut request: Request) -> Result<Response> {
        self.signer.sign(&mut request)?;
        tracing::debug!(service, method = %request.method(), url = %request.url(), "Sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| transport(service, err))?;

        if !response.status().is_success() {
            return Err(upstream_error(service, response).await);
        }
        Ok(response)
    }

    /// GET one page of a listing
    async fn get_page<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: Url,
    ) -> Result<Page<T>> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|err| transport(service, err))?;
        let response = self.execute(service, request).await?;

        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let items: Vec<T> = response.json().await.map_err(|err| decode(service, err))?;

        Ok(Page::new(items, next_page))
    }

    /// POST a JSON body
    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        service: &'static str,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_vec(body).map_err(|err| decode(service, err))?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(|err| transport(service, err))?;
        let response = self.execute(service, request).await?;

        response.json().await.map_err(|err| decode(service, err))
    }
}

fn transport(service: &'static str, err: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::Transport {
        service,
        message: err.to_string(),
    }
}

fn decode(service: &'static str, err: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::Decode {
        service,
        message: err.to_string(),
    }
}

async fn upstream_error(service: &'static str, response: Response) -> ProvisionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let error: ErrorResponse = serde_json::from_str(&body).unwrap_or_else(|_| ErrorResponse {
        code: String::new(),
        message: body,
    });

    ProvisionError::Upstream {
        service,
        status,
        code: error.code,
        message: error.message,
    }
}

fn with_page(url: &mut Url, page: Option<String>) {
    if let Some(page) = page {
        url.query_pairs_mut().append_pair("page", &page);
    }
}

#[async_trait]
impl IdentityService for OciClient {
    async fn list_compartments(
        &self,
        parent_id: &str,
        page: Option<String>,
    ) -> Result<Page<Compartment>> {
        let mut url = self.url(IDENTITY, &self.endpoints.identity, "20160918/compartments")?;
        url.query_pairs_mut()
            .append_pair("compartmentId", parent_id)
            .append_pair("sortBy", "NAME");
        with_page(&mut url, page);

        self.get_page(IDENTITY, url).await
    }
}

#[async_trait]
impl ComputeService for OciClient {
    async fn list_instances(
        &self,
        compartment_id: &str,
        query: &InstanceQuery,
        page: Option<String>,
    ) -> Result<Page<Instance>> {
        let mut url = self.url(COMPUTE, &self.endpoints.compute, "20160918/instances")?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id)
            .append_pair("sortOrder", query.sort_order.as_str())
            .append_pair("lifecycleState", &query.lifecycle_state);
        with_page(&mut url, page);

        self.get_page(COMPUTE, url).await
    }
}

#[async_trait]
impl MonitoringService for OciClient {
    async fn list_alarms(
        &self,
        compartment_id: &str,
        query: &AlarmQuery,
        page: Option<String>,
    ) -> Result<Page<AlarmSummary>> {
        let mut url = self.url(MONITORING, &self.endpoints.monitoring, "20180401/alarms")?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id)
            .append_pair("limit", &query.limit.to_string())
            .append_pair("lifecycleState", &query.lifecycle_state)
            .append_pair("sortBy", &query.sort_by)
            .append_pair("sortOrder", query.sort_order.as_str());
        with_page(&mut url, page);

        self.get_page(MONITORING, url).await
    }

    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<CreatedAlarm> {
        let url = self.url(MONITORING, &self.endpoints.monitoring, "20180401/alarms")?;
        self.post(MONITORING, url, spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::tests::test_key_pem;
    use alarm_lib::inventory::{list_active_alarm_names, list_running_instances};
    use alarm_lib::AlarmKind;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> OciClient {
        let signer = RequestSigner::from_pem(
            "ocid1.tenancy/ocid1.user/aa:bb".to_string(),
            &test_key_pem(),
            None,
        )
        .unwrap();
        OciClient::new(signer, Endpoints::single(&server.url()).unwrap()).unwrap()
    }

    #[test]
    fn test_regional_endpoints() {
        let endpoints = Endpoints::for_region("eu-frankfurt-1").unwrap();
        assert_eq!(
            endpoints.monitoring.as_str(),
            "https://telemetry.eu-frankfurt-1.oraclecloud.com/"
        );
        assert_eq!(
            endpoints.compute.as_str(),
            "https://iaas.eu-frankfurt-1.oraclecloud.com/"
        );
    }

    #[tokio::test]
    async fn test_alarm_listing_follows_next_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/20180401/alarms")
            .match_query(Matcher::Regex(
                "^compartmentId=ocid1.compartment&limit=800&lifecycleState=ACTIVE&sortBy=displayName&sortOrder=ASC$".to_string(),
            ))
            .match_header(
                "authorization",
                Matcher::Regex(r#"^Signature version="1",keyId="ocid1.tenancy/ocid1.user/aa:bb""#.to_string()),
            )
            .with_header("opc-next-page", "page-2")
            .with_body(r#"[{"id":"a1","displayName":"CPU-Above-90%-A","lifecycleState":"ACTIVE"}]"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/20180401/alarms")
            .match_query(Matcher::Regex("&page=page-2$".to_string()))
            .with_body(r#"[{"id":"a2","displayName":"CPU-Above-90%-B","lifecycleState":"ACTIVE"}]"#)
            .create_async()
            .await;

        let client = client(&server);
        let names = list_active_alarm_names(&client, "ocid1.compartment")
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert!(names.contains("CPU-Above-90%-A"));
        assert!(names.contains("CPU-Above-90%-B"));
    }

    #[tokio::test]
    async fn test_instance_listing_filters_running() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/20160918/instances")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sortOrder".into(), "DESC".into()),
                Matcher::UrlEncoded("lifecycleState".into(), "RUNNING".into()),
            ]))
            .with_body(
                r#"[{"displayName":"web-01","lifecycleState":"RUNNING"},
                    {"displayName":"web-02","lifecycleState":"STOPPED"}]"#,
            )
            .create_async()
            .await;

        let client = client(&server);
        let names = list_running_instances(&client, "ocid1.compartment")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(names, vec!["web-01"]);
    }

    #[tokio::test]
    async fn test_create_alarm_posts_spec() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/20180401/alarms")
            .match_header("x-content-sha256", Matcher::Any)
            .match_body(Matcher::PartialJsonString(
                r#"{"displayName":"CPU-Above-90%-web-01","severity":"CRITICAL","messageFormat":"PRETTY_JSON","isEnabled":true}"#.to_string(),
            ))
            .with_body(r#"{"id":"ocid1.alarm.oc1..x","displayName":"CPU-Above-90%-web-01","lifecycleState":"ACTIVE"}"#)
            .create_async()
            .await;

        let client = client(&server);
        let spec = AlarmKind::CpuHigh
            .spec("ocid1.compartment", "web-01", "ocid1.onstopic")
            .unwrap();
        let created = client.create_alarm(&spec).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, "ocid1.alarm.oc1..x");
    }

    #[tokio::test]
    async fn test_error_body_becomes_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/20160918/compartments")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":"NotAuthenticated","message":"The required information to complete authentication was not provided."}"#)
            .create_async()
            .await;

        let client = client(&server);
        let err = client
            .list_compartments("ocid1.tenancy", None)
            .await
            .unwrap_err();

        match err {
            ProvisionError::Upstream {
                service,
                status,
                code,
                ..
            } => {
                assert_eq!(service, "identity");
                assert_eq!(status, 401);
                assert_eq!(code, "NotAuthenticated");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
