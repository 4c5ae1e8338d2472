// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/annotate/font.rs - 标签字体
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

use ab_glyph::{FontVec, PxScale};
use image::ImageBuffer;
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use crate::annotate::palette::OverlayPixel;

/// 系统字体候选，按顺序尝试
pub const SYSTEM_FONTS: [&str; 3] = [
  "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
  "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
  "/System/Library/Fonts/Arial.ttf",
];

// 内置点阵字体：5x7，固定 2 倍放大
const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;
const BUILTIN_SCALE: u32 = 2;
const BUILTIN_SPACING: u32 = 1;

// 无法测量时的宽度估算系数
const ESTIMATE_WIDTH_RATIO: f32 = 0.6;

/// 字体来源，`Builtin` 总能成功
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
  File(PathBuf),
  Builtin,
}

impl FontSource {
  fn acquire(&self, size: f32) -> Option<LabelFont> {
    match self {
      FontSource::File(path) => match load_font_file(path) {
        Ok(font) => Some(LabelFont::Outline {
          font,
          scale: PxScale::from(size),
        }),
        Err(e) => {
          debug!("字体不可用 {}: {}", path.display(), e);
          None
        }
      },
      FontSource::Builtin => Some(LabelFont::Builtin),
    }
  }
}

fn load_font_file(path: &Path) -> Result<FontVec, String> {
  let data = std::fs::read(path).map_err(|e| e.to_string())?;
  FontVec::try_from_vec(data).map_err(|e| e.to_string())
}

/// 默认字体候选：用户指定的字体优先，然后是系统字体
pub fn font_sources(user_fonts: &[PathBuf]) -> Vec<FontSource> {
  user_fonts
    .iter()
    .cloned()
    .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
    .map(FontSource::File)
    .collect()
}

/// 字号：max(12, min(W, H) / 50)
pub fn font_size_for(width: u32, height: u32) -> f32 {
  (width.min(height) / 50).max(12) as f32
}

pub enum LabelFont {
  Outline { font: FontVec, scale: PxScale },
  Builtin,
}

impl LabelFont {
  /// 依次尝试字体来源，最后回退到内置字体
  pub fn select(sources: &[FontSource], size: f32) -> Self {
    sources
      .iter()
      .chain(std::iter::once(&FontSource::Builtin))
      .find_map(|source| {
        let font = source.acquire(size)?;
        debug!("使用字体: {:?}", source);
        Some(font)
      })
      .unwrap_or(LabelFont::Builtin)
  }

  pub fn is_builtin(&self) -> bool {
    matches!(self, LabelFont::Builtin)
  }

  /// 文本尺寸 (宽, 高)
  pub fn measure(&self, text: &str) -> (u32, u32) {
    match self {
      LabelFont::Outline { font, scale } => {
        let (w, h) = text_size(*scale, font, text);
        if (w == 0 || h == 0) && !text.is_empty() {
          estimate_text_size(text, scale.y)
        } else {
          (w, h)
        }
      }
      LabelFont::Builtin => {
        let n = text.chars().count() as u32;
        if n == 0 {
          return (0, 0);
        }
        let advance = (GLYPH_COLS + BUILTIN_SPACING) * BUILTIN_SCALE;
        (n * advance - BUILTIN_SPACING * BUILTIN_SCALE, GLYPH_ROWS * BUILTIN_SCALE)
      }
    }
  }

  pub fn draw<P: OverlayPixel>(
    &self,
    image: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    color: P,
    x: i32,
    y: i32,
    text: &str,
  ) {
    match self {
      LabelFont::Outline { font, scale } => draw_text_mut(image, color, x, y, *scale, font, text),
      LabelFont::Builtin => draw_builtin_text(image, color, x, y, text),
    }
  }
}

pub fn estimate_text_size(text: &str, font_size: f32) -> (u32, u32) {
  let width = text.chars().count() as f32 * font_size * ESTIMATE_WIDTH_RATIO;
  (width.ceil() as u32, font_size.ceil() as u32)
}

fn draw_builtin_text<P: OverlayPixel>(
  image: &mut ImageBuffer<P, Vec<P::Subpixel>>,
  color: P,
  x: i32,
  y: i32,
  text: &str,
) {
  let advance = ((GLYPH_COLS + BUILTIN_SPACING) * BUILTIN_SCALE) as i64;
  let (width, height) = (image.width() as i64, image.height() as i64);

  for (i, ch) in text.chars().enumerate() {
    let origin_x = x as i64 + i as i64 * advance;
    let rows = glyph(ch);
    for (row, bits) in rows.iter().enumerate() {
      for col in 0..GLYPH_COLS {
        if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
          continue;
        }
        for dy in 0..BUILTIN_SCALE {
          for dx in 0..BUILTIN_SCALE {
            let px = origin_x + (col * BUILTIN_SCALE + dx) as i64;
            let py = y as i64 + (row as u32 * BUILTIN_SCALE + dy) as i64;
            if (0..width).contains(&px) && (0..height).contains(&py) {
              image.put_pixel(px as u32, py as u32, color);
            }
          }
        }
      }
    }
  }
}

// 每行 5 位，高位在左
fn glyph(ch: char) -> [u8; 7] {
  match ch.to_ascii_uppercase() {
    ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
    '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
    '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
    '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
    ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
    '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
    'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
    'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
    'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
    'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
    'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
    'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
    'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
    'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
    'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
    'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
    'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
    'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
    'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
    'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
    'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
    'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
    'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
    'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
    'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
    'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
    'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
    'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
    _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
  }
}
