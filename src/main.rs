// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use park_annotate::{
  FromUrl,
  analysis::AnalysisClientBuilder,
  annotate::{Annotator, annotated_output_path, font_sources},
  task::{OneShotTask, Task, TaskReport, UserInterrupt},
};

fn print_report(report: &TaskReport) {
  let analysis = &report.result.analysis;
  let info = &analysis.image_info;

  println!();
  println!("📊 分析结果:");
  println!("   处理时间: {}", analysis.processing_time_display());
  println!(
    "   图像尺寸: {} x {}",
    info.width_display(),
    info.height_display()
  );
  println!("   图像大小: {} bytes", info.size_display());
  println!("   检测到 {} 个对象", analysis.elements.len());

  if analysis.elements.is_empty() {
    println!("❌ 未检测到任何对象");
    return;
  }

  println!();
  println!("📋 检测详情:");
  for (i, element) in analysis.elements.iter().enumerate() {
    let bbox = &element.bbox;
    println!("   {}. {}", i + 1, element.description);
    println!(
      "      位置: ({:.3}, {:.3}) 尺寸: {:.3} x {:.3}",
      bbox.x, bbox.y, bbox.width, bbox.height
    );
  }

  if let Some(output) = &report.output {
    println!();
    println!("💾 标记后的图像已保存到: {}", output.display());
  }
}

fn run(args: args::Args) -> Result<()> {
  let output = args
    .output
    .clone()
    .unwrap_or_else(|| annotated_output_path(&args.image));

  info!("图像文件: {}", args.image.display());
  info!("输出文件: {}", output.display());

  let timeout = Duration::from_secs(args.timeout);
  let client = AnalysisClientBuilder::from_url(&args.api_url)?
    .timeout(timeout)
    .build()?;
  info!("分析服务: {}, 超时: {:?}", client.endpoint(), timeout);
  let annotator = Annotator::new(font_sources(&args.fonts));

  let report = OneShotTask::new(&args.image, output).run_task(&client, &annotator)?;
  print_report(&report);

  Ok(())
}

fn main() -> ExitCode {
  tracing_subscriber::fmt::init();

  if let Err(e) = ctrlc::set_handler(|| {
    eprintln!("\n❌ {}", UserInterrupt);
    std::process::exit(1);
  }) {
    warn!("无法注册中断处理: {}", e);
  }

  // 参数错误同样以状态码 1 退出
  let args = match args::Args::try_parse() {
    Ok(args) => args,
    Err(e) => {
      let _ = e.print();
      return if e.use_stderr() {
        ExitCode::FAILURE
      } else {
        ExitCode::SUCCESS
      };
    }
  };

  println!("🌳 ReThinking Park 图像分析工具");
  println!("{}", "=".repeat(50));

  match run(args) {
    Ok(()) => {
      println!();
      println!("✅ 分析完成!");
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("\n❌ 错误: {:#}", e);
      ExitCode::FAILURE
    }
  }
}
