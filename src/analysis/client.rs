// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/analysis/client.rs - 分析服务客户端
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, multipart};
use reqwest::header::ACCEPT;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl,
  analysis::{AnalysisResult, AnalyzeError},
  task::Analyzer,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const ANALYZE_PATH: &str = "api/v1/analyze";
const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// 由服务根地址拼出分析接口地址
pub fn analyze_endpoint(base: &Url) -> Result<Url, AnalyzeError> {
  let endpoint = format!("{}/{}", base.as_str().trim_end_matches('/'), ANALYZE_PATH);
  Url::parse(&endpoint).map_err(|e| AnalyzeError::InvalidUrl(format!("{}: {}", endpoint, e)))
}

/// 校验 HTTP 状态与响应负载
pub fn interpret_response(status: StatusCode, body: &str) -> Result<AnalysisResult, AnalyzeError> {
  if status != StatusCode::OK {
    return Err(AnalyzeError::api(format!("HTTP {} - {}", status.as_u16(), body)));
  }

  let result: AnalysisResult = serde_json::from_str(body)?;
  if !result.success {
    return Err(AnalyzeError::api(
      result.error.as_deref().unwrap_or("未知错误"),
    ));
  }

  Ok(result)
}

pub struct AnalysisClientBuilder {
  endpoint: Url,
  timeout: Duration,
}

impl FromUrl for AnalysisClientBuilder {
  type Error = AnalyzeError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
      return Err(AnalyzeError::InvalidUrl(format!(
        "期望协议 http 或 https, 实际协议 '{}'",
        url.scheme()
      )));
    }

    Ok(AnalysisClientBuilder {
      endpoint: analyze_endpoint(url)?,
      timeout: DEFAULT_TIMEOUT,
    })
  }
}

impl AnalysisClientBuilder {
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn build(self) -> Result<AnalysisClient, AnalyzeError> {
    let client = Client::builder()
      .timeout(self.timeout)
      .build()
      .map_err(AnalyzeError::NetworkError)?;

    debug!("HTTP 客户端就绪, 超时: {:?}", self.timeout);

    Ok(AnalysisClient {
      client,
      endpoint: self.endpoint,
      timeout: self.timeout,
    })
  }
}

/// 单次上传、无重试的分析客户端
pub struct AnalysisClient {
  client: Client,
  endpoint: Url,
  timeout: Duration,
}

impl AnalysisClient {
  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  pub fn analyze(&self, image_path: &Path) -> Result<AnalysisResult, AnalyzeError> {
    if !image_path.exists() {
      return Err(AnalyzeError::FileNotFound(image_path.to_path_buf()));
    }

    info!("分析图像: {}", image_path.display());
    let form = multipart::Form::new().file("image", image_path)?;

    info!("发送 API 请求...");
    let response = self
      .client
      .post(self.endpoint.clone())
      .header(ACCEPT, "application/json")
      .multipart(form)
      .send()
      .map_err(|e| self.transport_error(e))?;

    let status = response.status();
    let body = response.text().map_err(|e| self.transport_error(e))?;
    debug!("API 响应: HTTP {}, {} 字节", status.as_u16(), body.len());

    let result = interpret_response(status, &body)?;
    info!("API 分析成功");
    Ok(result)
  }

  fn transport_error(&self, err: reqwest::Error) -> AnalyzeError {
    if err.is_timeout() {
      AnalyzeError::Timeout(self.timeout)
    } else {
      AnalyzeError::NetworkError(err)
    }
  }
}

impl Analyzer for AnalysisClient {
  type Error = AnalyzeError;

  fn analyze(&self, image_path: &Path) -> Result<AnalysisResult, Self::Error> {
    AnalysisClient::analyze(self, image_path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn endpoint_is_appended_to_base() {
    let base = Url::parse("https://api.rethinkingpark.com").unwrap();
    assert_eq!(
      analyze_endpoint(&base).unwrap().as_str(),
      "https://api.rethinkingpark.com/api/v1/analyze"
    );

    let prefixed = Url::parse("http://localhost:8080/park/").unwrap();
    assert_eq!(
      analyze_endpoint(&prefixed).unwrap().as_str(),
      "http://localhost:8080/park/api/v1/analyze"
    );
  }

  #[test]
  fn builder_rejects_non_http_scheme() {
    let url = Url::parse("ftp://example.com").unwrap();
    assert!(matches!(
      AnalysisClientBuilder::from_url(&url),
      Err(AnalyzeError::InvalidUrl(_))
    ));
  }

  #[test]
  fn non_200_status_is_api_error() {
    let err = interpret_response(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
    match err {
      AnalyzeError::ApiError(msg) => assert_eq!(msg, "HTTP 502 - upstream down"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn unsuccessful_payload_is_api_error() {
    let err = interpret_response(
      StatusCode::OK,
      r#"{"success": false, "error": "image too large"}"#,
    )
    .unwrap_err();
    assert!(matches!(err, AnalyzeError::ApiError(ref msg) if msg == "image too large"));

    let err = interpret_response(StatusCode::OK, r#"{"success": false}"#).unwrap_err();
    assert!(matches!(err, AnalyzeError::ApiError(ref msg) if msg == "未知错误"));
  }

  #[test]
  fn malformed_body_is_invalid_payload() {
    let err = interpret_response(StatusCode::OK, "<html>oops</html>").unwrap_err();
    assert!(matches!(err, AnalyzeError::InvalidPayload(_)));
  }

  #[test]
  fn successful_payload_is_parsed() {
    let body = r#"{
      "success": true,
      "analysis": {
        "elements": [
          {"type": "tree", "confidence": 0.87, "description": "a tall oak",
           "bbox": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}}
        ],
        "imageInfo": {"width": 1000, "height": 500, "size": 123456},
        "processingTime": "1.2s"
      }
    }"#;
    let result = interpret_response(StatusCode::OK, body).unwrap();
    assert!(result.success);
    assert_eq!(result.analysis.elements[0].kind, "tree");
    assert_eq!(result.analysis.image_info.width_display(), "1000");
    assert_eq!(result.analysis.processing_time_display(), "1.2s");
  }

  #[test]
  fn loosely_typed_image_info_is_accepted() {
    let body = r#"{
      "success": true,
      "analysis": {
        "elements": [],
        "imageInfo": {"width": 1000.0, "height": "500", "size": "12345"}
      }
    }"#;
    let result = interpret_response(StatusCode::OK, body).unwrap();
    let info = &result.analysis.image_info;
    assert_eq!(info.width_display(), "1000.0");
    assert_eq!(info.height_display(), "500");
    assert_eq!(info.size_display(), "12345");
  }

  #[test]
  fn missing_file_fails_before_any_request() {
    // 端口 9 不会被访问：文件检查先于请求
    let url = Url::parse("http://127.0.0.1:9").unwrap();
    let client = AnalysisClientBuilder::from_url(&url).unwrap().build().unwrap();
    let err = client
      .analyze(Path::new("/definitely/not/here.png"))
      .unwrap_err();
    assert!(matches!(err, AnalyzeError::FileNotFound(_)));
  }
}
