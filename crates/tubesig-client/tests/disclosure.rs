//! Integration tests for `DisclosureClient` using wiremock HTTP mocks.

use chrono::NaiveDate;
use tubesig_client::{ClientError, DisclosureClient, DisclosureQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> DisclosureClient {
    DisclosureClient::with_base_url("test-key", 30, &format!("{base_url}/api"))
        .expect("client construction should not fail")
        .with_retry(1, 0)
}

fn query() -> DisclosureQuery {
    DisclosureQuery::for_date(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap())
}

fn entry(rcept_no: &str) -> serde_json::Value {
    serde_json::json!({
        "corp_code": "00126380",
        "corp_name": "삼성전자",
        "stock_code": "005930",
        "corp_cls": "Y",
        "report_nm": "주요사항보고서(자기주식취득결정)",
        "rcept_no": rcept_no,
        "flr_nm": "삼성전자",
        "rcept_dt": "20250307",
        "rm": "유"
    })
}

fn page(page_no: u32, total_page: u32, entries: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "status": "000",
        "message": "정상",
        "page_no": page_no,
        "page_count": 100,
        "total_count": entries.len(),
        "total_page": total_page,
        "list": entries.iter().map(|r| entry(r)).collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn list_returns_parsed_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .and(query_param("crtfc_key", "test-key"))
        .and(query_param("bgn_de", "20250307"))
        .and(query_param("end_de", "20250307"))
        .and(query_param("page_no", "1"))
        .and(query_param("page_count", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, 1, &["20250307000001"])))
        .mount(&server)
        .await;

    let page = test_client(&server.uri()).list(&query()).await.unwrap();

    assert_eq!(page.total_page, 1);
    assert_eq!(page.entries.len(), 1);
    let d = &page.entries[0];
    assert_eq!(d.corp_name, "삼성전자");
    assert_eq!(d.stock_code, "005930");
    assert_eq!(d.rcept_no, "20250307000001");
}

#[tokio::test]
async fn no_data_status_is_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "013",
            "message": "조회된 데이타가 없습니다."
        })))
        .mount(&server)
        .await;

    let page = test_client(&server.uri()).list(&query()).await.unwrap();
    assert!(page.entries.is_empty());
    assert_eq!(page.page_no, 1);
}

#[tokio::test]
async fn other_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "010",
            "message": "등록되지 않은 키입니다."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).list(&query()).await.unwrap_err();
    match err {
        ClientError::Api { message, .. } => assert!(message.starts_with("status 010")),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_all_follows_total_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .and(query_param("page_no", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, 2, &["a1", "a2"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .and(query_param("page_no", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(2, 2, &["b1"])))
        .mount(&server)
        .await;

    let all = test_client(&server.uri()).list_all(&query()).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|d| d.rcept_no.as_str()).collect();
    assert_eq!(ids, ["a1", "a2", "b1"]);
}

#[tokio::test]
async fn corp_code_filter_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .and(query_param("corp_code", "00126380"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, 1, &["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server.uri())
        .list(&query().with_corp_code("00126380"))
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
}

#[tokio::test]
async fn http_error_does_not_leak_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).list(&query()).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert!(!err.to_string().contains("test-key"));
}
