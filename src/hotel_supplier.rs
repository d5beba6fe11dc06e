// HTTP hotel supplier speaking the AvailRQ/AvailRS protocol

use crate::offer::ProviderOffer;
use crate::provider::{HotelSearch, ProviderError};
use crate::search::{AccommodationTier, TravelerCounts};
use crate::supplier_xml::{self, SearchParams};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const AVAILABILITY_PATH: &str = "availability";
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub nationality: String,
    /// Currency requested from the supplier. It is fixed per supplier, so offers are
    /// quoted in it whatever `SearchRequest::currency` says, and the composer only
    /// warns about the mismatch without converting.
    pub currency: String,
    pub provider_name: String,
    // Honour HTTP(S)_PROXY from the environment
    pub use_system_proxy: bool,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            timeout_ms: 5_000,
            nationality: "US".to_string(),
            currency: "USD".to_string(),
            provider_name: "xml-supplier".to_string(),
            use_system_proxy: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SupplierStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_throttled: usize,
    pub requests_timeout: usize,
    pub average_response_time_ms: f64,
}

pub struct XmlHotelSupplier {
    client: Client,
    config: SupplierConfig,
    stats: Mutex<SupplierStats>,
}

impl XmlHotelSupplier {
    pub fn new(config: SupplierConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder().timeout(Duration::from_millis(config.timeout_ms));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Other(e.to_string()))?;

        Ok(Self {
            client,
            config,
            stats: Mutex::new(SupplierStats::default()),
        })
    }

    pub fn stats(&self) -> SupplierStats {
        self.stats.lock().clone()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            AVAILABILITY_PATH
        )
    }

    async fn post(&self, body: String) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/xml")
            .header("X-Api-Key", &self.config.api_key)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded(format!(
                "supplier returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::ApiResponseError {
                status_code: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        Ok(text)
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.config.timeout_ms)
        } else {
            ProviderError::NetworkError(error.to_string())
        }
    }

    fn record(&self, started: Instant, result: &Result<Vec<ProviderOffer>, ProviderError>) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut stats = self.stats.lock();
        stats.requests_sent += 1;
        match result {
            Ok(_) => stats.requests_succeeded += 1,
            Err(ProviderError::RateLimitExceeded(_)) => stats.requests_throttled += 1,
            Err(ProviderError::Timeout(_)) => stats.requests_timeout += 1,
            Err(_) => stats.requests_failed += 1,
        }
        let n = stats.requests_sent as f64;
        stats.average_response_time_ms += (elapsed_ms - stats.average_response_time_ms) / n;
    }
}

#[async_trait]
impl HotelSearch for XmlHotelSupplier {
    async fn search(
        &self,
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        travelers: &TravelerCounts,
        budget_hint: Option<AccommodationTier>,
    ) -> Result<Vec<ProviderOffer>, ProviderError> {
        let started = Instant::now();
        let params = SearchParams {
            destination,
            check_in,
            check_out,
            travelers,
            currency: &self.config.currency,
            nationality: &self.config.nationality,
        };
        debug!(destination, ?budget_hint, "querying hotel supplier");

        let result = async {
            let body = supplier_xml::build_request(&params)?;
            let xml = self.post(body).await?;
            let response = supplier_xml::parse_response(&xml)?;
            supplier_xml::normalize(&response, &params, &self.config.provider_name)
        }
        .await;

        if let Err(e) = &result {
            warn!(destination, error = %e, "hotel supplier request failed");
        }
        self.record(started, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::date;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const AVAILABLE: &str = r#"<AvailRS><Hotels>
<Hotel code="77" name="Canal House" category="4">
  <MealPlans><MealPlan code="BB"><Options>
    <Option type="Hotel" status="OK"><Price currency="USD" amount="450.00"/></Option>
  </Options></MealPlan></MealPlans>
</Hotel>
</Hotels></AvailRS>"#;

    // Serves one canned HTTP response and hands back the raw request it received
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buffer = [0u8; 1024];
            while !String::from_utf8_lossy(&received).contains("</AvailRQ>") {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                received.extend_from_slice(&buffer[..read]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&received).into_owned());
        });

        (format!("http://{}", address), rx)
    }

    fn supplier(base_url: String) -> XmlHotelSupplier {
        XmlHotelSupplier::new(SupplierConfig {
            base_url,
            api_key: "secret-key".to_string(),
            timeout_ms: 2_000,
            use_system_proxy: false,
            ..SupplierConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_normalizes_supplier_response() {
        let (base_url, request) = serve_once("200 OK", AVAILABLE).await;
        let supplier = supplier(base_url);

        let offers = supplier
            .search("AMS", date(2025, 6, 1), date(2025, 6, 4), &TravelerCounts::new(2, 0, 0), None)
            .await
            .unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, "xml-supplier-77");
        assert_eq!(offers[0].destination, "AMS");
        assert_eq!(offers[0].nightly_rate(), 150.0);

        let raw = request.await.unwrap().to_lowercase();
        assert!(raw.starts_with("post /availability"));
        assert!(raw.contains("x-api-key: secret-key"));
        assert!(raw.contains("<destination>ams</destination>"));
        assert!(raw.contains(r#"adults="2""#));

        let stats = supplier.stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.requests_succeeded, 1);
    }

    #[tokio::test]
    async fn test_offers_use_supplier_currency_not_request_currency() {
        let (base_url, request) = serve_once("200 OK", AVAILABLE).await;
        let supplier = XmlHotelSupplier::new(SupplierConfig {
            base_url,
            currency: "EUR".to_string(),
            use_system_proxy: false,
            ..SupplierConfig::default()
        })
        .unwrap();

        let offers = supplier
            .search("AMS", date(2025, 6, 1), date(2025, 6, 4), &TravelerCounts::default(), None)
            .await
            .unwrap();

        // The response prices in USD; the request asked for the configured EUR
        assert!(request.await.unwrap().contains("<Currency>EUR</Currency>"));
        assert_eq!(offers[0].price.currency, "USD");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let (base_url, _request) = serve_once("500 Internal Server Error", "supplier down").await;
        let supplier = supplier(base_url);

        let result = supplier
            .search("AMS", date(2025, 6, 1), date(2025, 6, 4), &TravelerCounts::default(), None)
            .await;

        assert_eq!(
            result,
            Err(ProviderError::ApiResponseError {
                status_code: 500,
                message: "supplier down".to_string(),
            })
        );
        assert_eq!(supplier.stats().requests_failed, 1);
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let (base_url, _request) = serve_once("429 Too Many Requests", "").await;
        let supplier = supplier(base_url);

        let result = supplier
            .search("AMS", date(2025, 6, 1), date(2025, 6, 4), &TravelerCounts::default(), None)
            .await;

        assert!(matches!(result, Err(ProviderError::RateLimitExceeded(_))));
        assert_eq!(supplier.stats().requests_throttled, 1);
    }

    #[tokio::test]
    async fn test_unreachable_supplier_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let supplier = supplier(format!("http://{}", address));

        let result = supplier
            .search("AMS", date(2025, 6, 1), date(2025, 6, 4), &TravelerCounts::default(), None)
            .await;

        assert!(matches!(result, Err(ProviderError::NetworkError(_))));
    }
}
