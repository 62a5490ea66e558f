//! Integration tests for the provider adapters using wiremock HTTP mocks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fareline_core::{
    CitymobilSettings, Deadline, GettSettings, Point, PriceRequest, TariffGroup, UberSettings,
};
use fareline_metrics::Collector;
use fareline_providers::{CallContext, ProviderError, ProviderHttp, TaxiAdapter};
use fareline_providers::{CitymobilApi, GettApi, UberApi};

fn provider_http() -> (ProviderHttp, Arc<Collector>) {
    let collector = Arc::new(Collector::new().expect("collector"));
    (
        ProviderHttp::from_client(reqwest::Client::new(), Arc::clone(&collector)),
        collector,
    )
}

fn request() -> PriceRequest {
    let mut point1 = Point::new(55.750376, 37.610621);
    point1.apply_geo_info("Тверская, 1", 55.750376, 37.610621);
    let mut point2 = Point::new(55.760736, 37.62002);
    point2.apply_geo_info("Петровка, 38", 55.760736, 37.62002);
    PriceRequest {
        req_id: "test-req".to_string(),
        region_id: 32,
        point1,
        point2,
        only_api: false,
    }
}

fn ctx<'a>(name: &'a str) -> CallContext<'a> {
    CallContext {
        api_name: name,
        region_id: 32,
        deadline: Deadline::after(Duration::from_secs(2)),
    }
}

fn citymobil(base: &str) -> TaxiAdapter {
    TaxiAdapter::Citymobil(CitymobilApi::new(CitymobilSettings {
        name: "citymobil".to_string(),
        host: base.to_string(),
        price_method: "/api/price".to_string(),
        price_method_name: "getprice".to_string(),
        tariff_groups: vec![
            TariffGroup {
                id: 2,
                name: "Эконом".to_string(),
            },
            TariffGroup {
                id: 4,
                name: "Комфорт".to_string(),
            },
        ],
        ver: "4.44.0".to_string(),
        hurry: "1".to_string(),
    }))
}

fn uber(base: &str) -> TaxiAdapter {
    TaxiAdapter::Uber(UberApi::new(UberSettings {
        name: "uber".to_string(),
        host: base.to_string(),
        price_method: "/v1.2/estimates/price".to_string(),
        time_method: "/v1.2/estimates/time".to_string(),
        headers: HashMap::from([("Authorization".to_string(), "Token test".to_string())]),
        client_id: "client-1".to_string(),
    }))
}

fn gett(base: &str) -> TaxiAdapter {
    TaxiAdapter::Gett(GettApi::new(GettSettings {
        name: "gett".to_string(),
        host: base.to_string(),
        price_method: "/v1/estimates/price".to_string(),
        time_method: "/v1/estimates/eta".to_string(),
        headers: HashMap::new(),
    }))
}

#[tokio::test]
async fn citymobil_quotes_every_tariff_group() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/price"))
        .and(body_partial_json(serde_json::json!({
            "latitude": "55.750376",
            "del_latitude": "55.760736",
            "tariff_group": [2, 4],
            "method": "getprice"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [
                {"id_tariff_group": 2, "total_price": 180.0},
                {"id_tariff_group": 4, "total_price": 260.0},
                {"id_tariff_group": 9, "total_price": 420.0}
            ]
        })))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let adapter = citymobil(&server.uri());
    let reply = adapter
        .fetch(&http, &ctx("citymobil"), &request())
        .await
        .expect("reply");

    assert!(reply.warning.is_none());
    assert_eq!(reply.offers.len(), 3);
    assert_eq!(reply.offers[0].display_name, "Ситимобил Эконом");
    assert_eq!(reply.offers[1].display_name, "Ситимобил Комфорт");
    assert_eq!(reply.offers[2].display_name, "Ситимобил");
    assert!((reply.offers[0].price_mean - 180.0).abs() < f64::EPSILON);
    assert_eq!(
        reply.offers[0].template_vars["%from.address%"],
        "Тверская, 1"
    );
}

#[tokio::test]
async fn citymobil_rejects_non_positive_price() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [{"id_tariff_group": 2, "total_price": 0.0}]
        })))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let err = citymobil(&server.uri())
        .fetch(&http, &ctx("citymobil"), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidPrice(_)));
}

#[tokio::test]
async fn citymobil_rejects_empty_price_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"prices": []})))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let err = citymobil(&server.uri())
        .fetch(&http, &ctx("citymobil"), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidPrice(_)));
}

#[tokio::test]
async fn uber_combines_prices_and_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/price"))
        .and(query_param("start_latitude", "55.750376"))
        .and(query_param("end_longitude", "37.62002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [
                {
                    "display_name": "uberX",
                    "product_id": "prod-x",
                    "low_estimate": 100.0,
                    "high_estimate": 300.0
                },
                {
                    "display_name": "XL",
                    "product_id": "prod-xl",
                    "low_estimate": 200.0,
                    "high_estimate": 400.0
                }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/time"))
        .and(query_param("start_latitude", "55.750376"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "times": [
                {"product_id": "prod-x", "estimate": 300},
                {"product_id": "prod-xl", "estimate": 45}
            ]
        })))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let reply = uber(&server.uri())
        .fetch(&http, &ctx("uber"), &request())
        .await
        .expect("reply");

    assert!(reply.warning.is_none());
    assert_eq!(reply.offers.len(), 2);

    let x = &reply.offers[0];
    assert_eq!(x.display_name, "Uber X");
    assert_eq!(x.tariff_name, "uberx");
    assert_eq!(x.price_min, 100);
    assert_eq!(x.price_max, 300);
    assert!((x.price_mean - 200.0).abs() < f64::EPSILON);
    assert_eq!(x.eta, 5);
    assert_eq!(x.template_vars["%client.id%"], "client-1");
    assert_eq!(x.template_vars["%product.id%"], "prod-x");

    let xl = &reply.offers[1];
    assert_eq!(xl.tariff_name, "uberxl");
    assert_eq!(xl.eta, 1, "sub-minute estimate rounds up");
}

#[tokio::test]
async fn uber_time_failure_is_non_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [{
                "display_name": "uberX",
                "product_id": "prod-x",
                "low_estimate": 100.0,
                "high_estimate": 300.0
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/time"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let reply = uber(&server.uri())
        .fetch(&http, &ctx("uber"), &request())
        .await
        .expect("offers survive a failed time leg");

    assert_eq!(reply.offers.len(), 1);
    assert_eq!(reply.offers[0].eta, 0);
    assert!(matches!(
        reply.warning,
        Some(ProviderError::UnexpectedStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn uber_price_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [{
                "display_name": "uberX",
                "product_id": "prod-x",
                "low_estimate": 0.0,
                "high_estimate": 0.0
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/estimates/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "times": [{"product_id": "prod-x", "estimate": 120}]
        })))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let err = uber(&server.uri())
        .fetch(&http, &ctx("uber"), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidPrice(_)));
}

#[tokio::test]
async fn gett_matches_eta_case_insensitively() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/price"))
        .and(query_param("pickup_latitude", "55.750376"))
        .and(query_param("destination_latitude", "55.760736"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [{
                "product_id": "gett-1",
                "display_name": "Эконом",
                "low_estimate": 150,
                "high_estimate": 250
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/eta"))
        .and(query_param("latitude", "55.750376"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "etas": [{"display_name": "ЭКОНОМ", "eta": 240}]
        })))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let reply = gett(&server.uri())
        .fetch(&http, &ctx("gett"), &request())
        .await
        .expect("reply");

    assert_eq!(reply.offers.len(), 1);
    let offer = &reply.offers[0];
    assert_eq!(offer.display_name, "Gett Эконом");
    assert_eq!(offer.tariff_name, "gett_economy");
    assert!((offer.price_mean - 200.0).abs() < f64::EPSILON);
    assert_eq!(offer.eta, 4);
}

#[tokio::test]
async fn gett_empty_eta_list_downgrades_to_warning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [{
                "product_id": "gett-1",
                "display_name": "Комфорт",
                "low_estimate": 300,
                "high_estimate": 500
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/eta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"etas": []})))
        .mount(&server)
        .await;

    let (http, _) = provider_http();
    let reply = gett(&server.uri())
        .fetch(&http, &ctx("gett"), &request())
        .await
        .expect("offers survive a missing eta list");

    assert_eq!(reply.offers.len(), 1);
    assert_eq!(reply.offers[0].eta, 0);
    assert!(matches!(reply.warning, Some(ProviderError::InvalidTime(_))));
}

#[tokio::test]
async fn slow_upstream_is_classified_as_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/price"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"prices": [{"id_tariff_group": 2, "total_price": 100.0}]}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (http, collector) = provider_http();
    let tight = CallContext {
        api_name: "citymobil",
        region_id: 32,
        deadline: Deadline::after(Duration::from_millis(50)),
    };
    let err = citymobil(&server.uri())
        .fetch(&http, &tight, &request())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::DeadlineExceeded));
    let text = collector.render();
    assert!(text.contains(
        "fareline_providers_request_timeout{name=\"citymobil\",region=\"32\"} 1"
    ));
}

#[tokio::test]
async fn upstream_errors_feed_the_error_counter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/price"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/estimates/eta"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (http, collector) = provider_http();
    let err = gett(&server.uri())
        .fetch(&http, &ctx("gett"), &request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::UnexpectedStatus { status: 503, .. }
    ));
    let text = collector.render();
    assert!(text.contains("fareline_providers_error_response"));
    assert!(text.contains("code=\"503\""));
}
