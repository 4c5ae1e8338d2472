// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/task.rs - 分析与标注任务
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
  analysis::{AnalysisResult, Detection},
  annotate::Overlay,
};

pub trait Analyzer {
  type Error;
  fn analyze(&self, image_path: &Path) -> Result<AnalysisResult, Self::Error>;
}

pub trait Render {
  type Error;
  fn render(
    &self,
    image_path: &Path,
    detections: &[Detection],
    output_path: &Path,
  ) -> Result<Vec<Overlay>, Self::Error>;
}

pub trait Task<A, R>: Sized {
  type Output;
  type Error;
  fn run_task(self, analyzer: &A, render: &R) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
#[error("用户中断操作")]
pub struct UserInterrupt;

#[derive(Debug)]
pub struct TaskReport {
  pub result: AnalysisResult,
  /// 没有检测结果时不写出文件
  pub output: Option<PathBuf>,
  pub overlays: Vec<Overlay>,
}

/// 单张图像：分析一次，标注一次
pub struct OneShotTask {
  image_path: PathBuf,
  output_path: PathBuf,
}

impl OneShotTask {
  pub fn new(image_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
    Self {
      image_path: image_path.into(),
      output_path: output_path.into(),
    }
  }
}

impl<
  AE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  A: Analyzer<Error = AE>,
  R: Render<Error = RE>,
> Task<A, R> for OneShotTask
{
  type Output = TaskReport;
  type Error = anyhow::Error;

  fn run_task(self, analyzer: &A, render: &R) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let result = analyzer.analyze(&self.image_path)?;
    info!(
      "分析完成，耗时: {:.2?}, 检测到 {} 个对象",
      now.elapsed(),
      result.analysis.elements.len()
    );

    if result.analysis.elements.is_empty() {
      warn!("未检测到任何对象，跳过标注");
      return Ok(TaskReport {
        result,
        output: None,
        overlays: Vec::new(),
      });
    }

    let now = std::time::Instant::now();
    let overlays = render.render(
      &self.image_path,
      &result.analysis.elements,
      &self.output_path,
    )?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(TaskReport {
      result,
      output: Some(self.output_path),
      overlays,
    })
  }
}
