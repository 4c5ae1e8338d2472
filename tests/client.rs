mod common;

use std::time::Duration;

use park_annotate::FromUrl;
use park_annotate::analysis::{AnalysisClientBuilder, AnalyzeError};
use url::Url;

use common::{FakeApi, Reply, SUCCESS_BODY, closed_port_url, write_png};

fn client_for(base_url: &str, timeout: Duration) -> park_annotate::analysis::AnalysisClient {
  AnalysisClientBuilder::from_url(&Url::parse(base_url).unwrap())
    .unwrap()
    .timeout(timeout)
    .build()
    .unwrap()
}

#[test]
fn image_is_posted_as_multipart_to_analyze_endpoint() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");
  let api = FakeApi::ok(SUCCESS_BODY);

  let result = client_for(&api.base_url, Duration::from_secs(10))
    .analyze(&image)
    .unwrap();

  assert!(result.success);
  assert_eq!(result.analysis.elements.len(), 1);
  assert_eq!(result.analysis.elements[0].kind, "tree");

  let requests = api.requests();
  assert_eq!(requests.len(), 1);
  let request = &requests[0];
  assert_eq!(request.method, "POST");
  assert_eq!(request.path, "/api/v1/analyze");
  assert_eq!(request.accept.as_deref(), Some("application/json"));
  assert_eq!(request.parts.len(), 1);
  assert_eq!(request.parts[0].name, "image");
  assert_eq!(request.parts[0].file_name.as_deref(), Some("park.png"));
  assert_eq!(request.parts[0].data, std::fs::read(&image).unwrap());
}

#[test]
fn base_path_prefix_is_kept() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");
  let api = FakeApi::ok(SUCCESS_BODY);

  client_for(&format!("{}/park/", api.base_url), Duration::from_secs(10))
    .analyze(&image)
    .unwrap();

  assert_eq!(api.requests()[0].path, "/park/api/v1/analyze");
}

#[test]
fn server_error_status_is_api_error() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");
  let api = FakeApi::start(Reply::Json(503, "maintenance".to_string()));

  let err = client_for(&api.base_url, Duration::from_secs(10))
    .analyze(&image)
    .unwrap_err();

  match err {
    AnalyzeError::ApiError(msg) => assert_eq!(msg, "HTTP 503 - maintenance"),
    other => panic!("unexpected error: {other:?}"),
  }
}

#[test]
fn unsuccessful_reply_is_api_error() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");
  let api = FakeApi::ok(r#"{"success": false, "error": "quota exceeded"}"#);

  let err = client_for(&api.base_url, Duration::from_secs(10))
    .analyze(&image)
    .unwrap_err();

  assert!(matches!(err, AnalyzeError::ApiError(ref msg) if msg == "quota exceeded"));
}

#[test]
fn slow_server_is_a_timeout() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");
  let api = FakeApi::start(Reply::Stall(Duration::from_secs(5)));
  let timeout = Duration::from_millis(300);

  let err = client_for(&api.base_url, timeout)
    .analyze(&image)
    .unwrap_err();

  match err {
    AnalyzeError::Timeout(reported) => assert_eq!(reported, timeout),
    other => panic!("unexpected error: {other:?}"),
  }
}

#[test]
fn refused_connection_is_a_network_error() {
  let dir = tempfile::tempdir().unwrap();
  let image = write_png(dir.path(), "park.png");

  let err = client_for(&closed_port_url(), Duration::from_secs(10))
    .analyze(&image)
    .unwrap_err();

  assert!(matches!(err, AnalyzeError::NetworkError(_)), "{err:?}");
}
