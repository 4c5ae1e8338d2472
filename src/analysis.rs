// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/analysis.rs - 分析结果定义
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

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

mod client;
pub use self::client::{
  AnalysisClient, AnalysisClientBuilder, DEFAULT_TIMEOUT, analyze_endpoint, interpret_response,
};

/// 归一化边界框，取值为图像宽高的比例，原点在左上角
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NormalizedBox {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

/// 远程服务返回的单个检测结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
  #[serde(rename = "type")]
  pub kind: String,
  pub confidence: f64,
  pub bbox: NormalizedBox,
  #[serde(default)]
  pub description: String,
}

impl Detection {
  /// 标签文本，例如 `tree 87.0%`
  pub fn label(&self) -> String {
    format!("{} {:.1}%", self.kind, self.confidence * 100.0)
  }
}

/// 服务端回报的图像信息，只用于展示，字段类型不做约束
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageInfo {
  #[serde(default)]
  pub width: Option<serde_json::Value>,
  #[serde(default)]
  pub height: Option<serde_json::Value>,
  #[serde(default)]
  pub size: Option<serde_json::Value>,
}

impl ImageInfo {
  pub fn width_display(&self) -> String {
    display_value(&self.width, "?")
  }

  pub fn height_display(&self) -> String {
    display_value(&self.height, "?")
  }

  pub fn size_display(&self) -> String {
    display_value(&self.size, "?")
  }
}

// 字符串原样输出，缺失或 null 时使用占位符
fn display_value(value: &Option<serde_json::Value>, missing: &str) -> String {
  match value {
    Some(serde_json::Value::String(s)) => s.clone(),
    Some(serde_json::Value::Null) | None => missing.to_string(),
    Some(other) => other.to_string(),
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
  #[serde(default)]
  pub elements: Vec<Detection>,
  #[serde(default)]
  pub image_info: ImageInfo,
  // 服务端可能返回 "1.2s" 或数字，只用于展示
  #[serde(default)]
  pub processing_time: Option<serde_json::Value>,
}

impl Analysis {
  pub fn processing_time_display(&self) -> String {
    display_value(&self.processing_time, "未知")
  }
}

/// API 响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResult {
  pub success: bool,
  #[serde(default)]
  pub analysis: Analysis,
  #[serde(default)]
  pub error: Option<String>,
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
  #[error("图像文件不存在: {}", .0.display())]
  FileNotFound(PathBuf),
  #[error("读取图像文件失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("网络请求失败: {0}")]
  NetworkError(reqwest::Error),
  #[error("API 请求超时（{0:?}）")]
  Timeout(Duration),
  #[error("API 返回错误: {0}")]
  ApiError(String),
  #[error("API 响应解析失败: {0}")]
  InvalidPayload(#[from] serde_json::Error),
  #[error("API 地址无效: {0}")]
  InvalidUrl(String),
}

impl AnalyzeError {
  pub fn api<S: fmt::Display>(msg: S) -> Self {
    AnalyzeError::ApiError(msg.to_string())
  }
}
