// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/annotate/palette.rs - 元素颜色配置
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

use image::{Luma, LumaA, Pixel, Rgb, Rgba};
use imageproc::definitions::Clamp;

/// 未知类别使用的颜色（红色）
pub const DEFAULT_COLOR: Rgb<u8> = Rgb([0xFF, 0x00, 0x00]);

/// 类别 -> 颜色
pub const COLOR_TABLE: &[(&str, Rgb<u8>)] = &[
  // 天空和大气
  ("cloud", Rgb([0x87, 0xCE, 0xEB])),
  ("sky", Rgb([0x87, 0xCE, 0xFA])),
  ("light", Rgb([0xFF, 0xFF, 0x99])),
  ("sunshine", Rgb([0xFF, 0xD7, 0x00])),
  ("shadow", Rgb([0x69, 0x69, 0x69])),
  ("rain", Rgb([0x46, 0x82, 0xB4])),
  // 水体
  ("stream", Rgb([0x00, 0xBF, 0xFF])),
  ("river", Rgb([0x00, 0x77, 0xBE])),
  ("pond", Rgb([0x00, 0x8B, 0x8B])),
  // 生物
  ("human", Rgb([0xFF, 0x63, 0x47])),
  ("bird", Rgb([0x1E, 0x90, 0xFF])),
  ("duck", Rgb([0xDA, 0xA5, 0x20])),
  ("squirrel", Rgb([0xD2, 0x69, 0x1E])),
  ("insect", Rgb([0x8B, 0x45, 0x13])),
  ("dog", Rgb([0xFF, 0xA5, 0x00])),
  ("cat", Rgb([0xFF, 0x69, 0xB4])),
  // 植被
  ("tree", Rgb([0x22, 0x8B, 0x22])),
  ("bush", Rgb([0x9A, 0xCD, 0x32])),
  ("leaf", Rgb([0x32, 0xCD, 0x32])),
  ("fallen leaf", Rgb([0xCD, 0x85, 0x3F])),
  ("dead branch", Rgb([0x8B, 0x45, 0x13])),
  ("tree shade", Rgb([0x55, 0x6B, 0x2F])),
  ("flower", Rgb([0xFF, 0x14, 0x93])),
  ("grass", Rgb([0x90, 0xEE, 0x90])),
  // 地形
  ("hill", Rgb([0xDE, 0xB8, 0x87])),
  ("stone", Rgb([0xA9, 0xA9, 0xA9])),
];

pub fn color_for(kind: &str) -> Rgb<u8> {
  COLOR_TABLE
    .iter()
    .find(|(key, _)| *key == kind)
    .map(|(_, color)| *color)
    .unwrap_or(DEFAULT_COLOR)
}

pub fn to_hex(color: Rgb<u8>) -> String {
  let Rgb([r, g, b]) = color;
  format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// 可直接绘制标注的像素类型，颜色按原图的通道布局换算，透明度为不透明
pub trait OverlayPixel: Pixel<Subpixel: Into<f32> + Clamp<f32>> {
  fn from_rgb(color: Rgb<u8>) -> Self;
}

// ITU-R 601 亮度，16 位定点
fn luma_of(Rgb([r, g, b]): Rgb<u8>) -> u8 {
  ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn widen(value: u8) -> u16 {
  value as u16 * 257
}

impl OverlayPixel for Rgb<u8> {
  fn from_rgb(color: Rgb<u8>) -> Self {
    color
  }
}

impl OverlayPixel for Rgba<u8> {
  fn from_rgb(Rgb([r, g, b]): Rgb<u8>) -> Self {
    Rgba([r, g, b, u8::MAX])
  }
}

impl OverlayPixel for Luma<u8> {
  fn from_rgb(color: Rgb<u8>) -> Self {
    Luma([luma_of(color)])
  }
}

impl OverlayPixel for LumaA<u8> {
  fn from_rgb(color: Rgb<u8>) -> Self {
    LumaA([luma_of(color), u8::MAX])
  }
}

impl OverlayPixel for Rgb<u16> {
  fn from_rgb(Rgb([r, g, b]): Rgb<u8>) -> Self {
    Rgb([widen(r), widen(g), widen(b)])
  }
}

impl OverlayPixel for Rgba<u16> {
  fn from_rgb(Rgb([r, g, b]): Rgb<u8>) -> Self {
    Rgba([widen(r), widen(g), widen(b), u16::MAX])
  }
}

impl OverlayPixel for Luma<u16> {
  fn from_rgb(color: Rgb<u8>) -> Self {
    Luma([widen(luma_of(color))])
  }
}

impl OverlayPixel for LumaA<u16> {
  fn from_rgb(color: Rgb<u8>) -> Self {
    LumaA([widen(luma_of(color)), u16::MAX])
  }
}
