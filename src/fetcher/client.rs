use super::{FitmentService, LookupError, OptionFilters, ProductQuery};
use crate::config::SelectorConfig;
use crate::fields::FieldKind;
use crate::submit::FitmentProduct;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

const PRODUCTS_ENDPOINT: &str = "getFitmentProducts";

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct ProductsPayload {
    #[serde(rename = "fitmentProducts")]
    fitment_products: Vec<FitmentProduct>,
}

/// Endpoint name and the key under `data` holding the option list.
fn options_endpoint(kind: FieldKind) -> (&'static str, &'static str) {
    match kind {
        FieldKind::Type => ("getTypeOptions", "types"),
        FieldKind::Year => ("getYearOptions", "years"),
        FieldKind::Make => ("getMakeOptions", "makes"),
        FieldKind::Model => ("getModelOptions", "models"),
    }
}

/// Fitment API client authenticated with a bearer token.
pub struct HttpFitmentService {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpFitmentService {
    pub fn new(config: &SelectorConfig) -> Result<Self, LookupError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LookupError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/fitment/{}", self.api_url, endpoint)
    }

    /// GETs `endpoint` and returns the `data` object of the response.
    async fn get_data(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Map<String, Value>, LookupError> {
        let response = self
            .client
            .get(self.endpoint_url(endpoint))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else if e.is_connect() {
                    LookupError::Connection(e.to_string())
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED => LookupError::Unauthorized,
                StatusCode::FORBIDDEN => LookupError::Forbidden,
                _ => LookupError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::Network(e.to_string())
            }
        })?;

        let envelope: Envelope<Map<String, Value>> = serde_json::from_str(&text)
            .map_err(|e| LookupError::Malformed(format!("{}: {}", endpoint, e)))?;

        debug!(endpoint, status = status.as_u16(), "Fitment response received");
        Ok(envelope.data)
    }
}

#[async_trait]
impl FitmentService for HttpFitmentService {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip_all, fields(kind = %kind))]
    async fn options(
        &self,
        kind: FieldKind,
        filters: &OptionFilters,
    ) -> Result<Vec<String>, LookupError> {
        let (endpoint, key) = options_endpoint(kind);
        let mut data = self.get_data(endpoint, &filters.query_pairs()).await?;

        let values = data
            .remove(key)
            .ok_or_else(|| LookupError::Malformed(format!("missing data.{}", key)))?;

        serde_json::from_value(values)
            .map_err(|e| LookupError::Malformed(format!("data.{}: {}", key, e)))
    }

    #[instrument(skip_all, fields(make = %query.make, year = %query.year, model = %query.model))]
    async fn products(&self, query: &ProductQuery) -> Result<Vec<FitmentProduct>, LookupError> {
        let data = self
            .get_data(PRODUCTS_ENDPOINT, &query.query_pairs())
            .await?;

        let payload: ProductsPayload = serde_json::from_value(Value::Object(data))
            .map_err(|e| LookupError::Malformed(format!("data.fitmentProducts: {}", e)))?;

        Ok(payload.fitment_products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn service(url: String) -> HttpFitmentService {
        let config = SelectorConfig::new("main", url, "test-token").unwrap();
        HttpFitmentService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_type_options_send_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/fitment/getTypeOptions")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"types":["Car","Truck"]}}"#)
            .create_async()
            .await;

        let types = service(server.url())
            .options(FieldKind::Type, &OptionFilters::none())
            .await
            .unwrap();

        assert_eq!(types, vec!["Car", "Truck"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_model_options_pass_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/fitment/getModelOptions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "Car".into()),
                Matcher::UrlEncoded("year".into(), "2020".into()),
                Matcher::UrlEncoded("make".into(), "Land Rover".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data":{"models":["Defender","Discovery"]}}"#)
            .create_async()
            .await;

        let filters = OptionFilters::for_vehicle("Car", "2020", "Land Rover");
        let models = service(server.url())
            .options(FieldKind::Model, &filters)
            .await
            .unwrap();

        assert_eq!(models, vec!["Defender", "Discovery"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_key_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/fitment/getYearOptions")
            .match_query(Matcher::UrlEncoded("type".into(), "Car".into()))
            .with_status(200)
            .with_body(r#"{"data":{"makes":["Honda"]}}"#)
            .create_async()
            .await;

        let result = service(server.url())
            .options(FieldKind::Year, &OptionFilters::for_type("Car"))
            .await;

        assert!(matches!(result, Err(LookupError::Malformed(msg)) if msg.contains("data.years")));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mut server = Server::new_async().await;
        let _unauthorized = server
            .mock("GET", "/fitment/getTypeOptions")
            .with_status(401)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/fitment/getMakeOptions")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let service = service(server.url());
        assert!(matches!(
            service.options(FieldKind::Type, &OptionFilters::none()).await,
            Err(LookupError::Unauthorized)
        ));
        assert!(matches!(
            service
                .options(FieldKind::Make, &OptionFilters::for_type("Car"))
                .await,
            Err(LookupError::Status { status: 502, body }) if body == "bad gateway"
        ));
    }

    #[tokio::test]
    async fn test_products_keep_extra_attributes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/fitment/getFitmentProducts")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("make".into(), "Honda".into()),
                Matcher::UrlEncoded("year".into(), "2020".into()),
                Matcher::UrlEncoded("model".into(), "Civic".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(
                r#"{"data":{"fitmentProducts":[
                    {"itemNumber":"A1","position":"front"},
                    {"itemNumber":"B2"}
                ]}}"#,
            )
            .create_async()
            .await;

        let query = ProductQuery {
            make: "Honda".into(),
            year: "2020".into(),
            model: "Civic".into(),
        };
        let products = service(server.url()).products(&query).await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].item_number, "A1");
        assert_eq!(products[0].extra.get("position"), Some(&Value::from("front")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Nothing listens on port 9 locally.
        let result = service("http://127.0.0.1:9".to_string())
            .options(FieldKind::Type, &OptionFilters::none())
            .await;
        assert!(matches!(
            result,
            Err(LookupError::Connection(_)) | Err(LookupError::Network(_))
        ));
    }
}
