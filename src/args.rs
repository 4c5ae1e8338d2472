// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// ReThinking Park 图像分析工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 待分析的图像文件
  #[arg(value_name = "IMAGE")]
  pub image: PathBuf,

  /// 分析服务根地址
  #[arg(
    long,
    env = "PARK_ANNOTATE_API_URL",
    default_value = "https://api.rethinkingpark.com",
    value_name = "URL"
  )]
  pub api_url: Url,

  /// 请求超时（秒），至少为 1
  #[arg(
    long,
    default_value = "120",
    value_name = "SECS",
    value_parser = clap::value_parser!(u64).range(1..)
  )]
  pub timeout: u64,

  /// 输出文件路径，默认为 `<原文件名>_annotated.<扩展名>`
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<PathBuf>,

  /// 额外的字体文件，优先于系统字体
  #[arg(long = "font", value_name = "FILE")]
  pub fonts: Vec<PathBuf>,
}
