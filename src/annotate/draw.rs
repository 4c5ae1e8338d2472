// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/annotate/draw.rs - 检测结果可视化
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

use image::{ImageBuffer, Rgb};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::{
  analysis::{Detection, NormalizedBox},
  annotate::{
    font::LabelFont,
    palette::{OverlayPixel, color_for, to_hex},
  },
};

/// 任意通道布局的图像缓冲区
pub type Canvas<P> = ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>;

// 标签渲染常量
const LABEL_GAP: i64 = 5;
const LABEL_PAD_X: i64 = 4;
const LABEL_PAD_Y: i64 = 2;
const LABEL_TEXT_OFFSET_X: i64 = 2;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 像素坐标框，两端均包含
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
  pub x1: i64,
  pub y1: i64,
  pub x2: i64,
  pub y2: i64,
}

impl PixelBox {
  /// 归一化坐标 -> 像素坐标，不做裁剪
  pub fn from_normalized(bbox: &NormalizedBox, width: u32, height: u32) -> Self {
    let (w, h) = (width as f64, height as f64);
    PixelBox {
      x1: (bbox.x * w).floor() as i64,
      y1: (bbox.y * h).floor() as i64,
      x2: ((bbox.x + bbox.width) * w).floor() as i64,
      y2: ((bbox.y + bbox.height) * h).floor() as i64,
    }
  }

  /// 宽高为负时交换端点
  pub fn normalized(self) -> Self {
    PixelBox {
      x1: self.x1.min(self.x2),
      y1: self.y1.min(self.y2),
      x2: self.x1.max(self.x2),
      y2: self.y1.max(self.y2),
    }
  }
}

/// 单个检测结果的绘制记录
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
  pub pixel_box: PixelBox,
  pub color: Rgb<u8>,
  pub label: String,
  pub label_box: PixelBox,
}

/// 线宽：max(2, min(W, H) / 200)
pub fn line_width_for(width: u32, height: u32) -> u32 {
  (width.min(height) / 200).max(2)
}

// 填充矩形，先与画布求交，完全在画布外时不绘制
fn fill_clipped<P: OverlayPixel>(image: &mut Canvas<P>, area: PixelBox, color: P) {
  let (w, h) = (image.width() as i64, image.height() as i64);
  let x1 = area.x1.max(0);
  let y1 = area.y1.max(0);
  let x2 = area.x2.min(w - 1);
  let y2 = area.y2.min(h - 1);
  if x1 > x2 || y1 > y2 {
    return;
  }

  let rect = Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32);
  draw_filled_rect_mut(image, rect, color);
}

// 边框向内加粗
fn stroke_box<P: OverlayPixel>(image: &mut Canvas<P>, pixel_box: PixelBox, line_width: u32, color: P) {
  let PixelBox { x1, y1, x2, y2 } = pixel_box;
  let t = line_width as i64 - 1;

  let edges = [
    PixelBox { x1, y1, x2, y2: y1.saturating_add(t) },
    PixelBox { x1, y1: y2.saturating_sub(t), x2, y2 },
    PixelBox { x1, y1, x2: x1.saturating_add(t), y2 },
    PixelBox { x1: x2.saturating_sub(t), y1, x2, y2 },
  ];
  for edge in edges {
    fill_clipped(image, edge.normalized(), color);
  }
}

pub struct Draw<'a> {
  font: &'a LabelFont,
  line_width: u32,
}

impl<'a> Draw<'a> {
  pub fn new(font: &'a LabelFont, line_width: u32) -> Self {
    Self { font, line_width }
  }

  fn draw_detection<P: OverlayPixel>(&self, image: &mut Canvas<P>, detection: &Detection) -> Overlay {
    let pixel_box =
      PixelBox::from_normalized(&detection.bbox, image.width(), image.height()).normalized();
    let color = color_for(&detection.kind);
    let paint = P::from_rgb(color);

    stroke_box(image, pixel_box, self.line_width, paint);

    let label = detection.label();
    let (tw, th) = self.font.measure(&label);
    let (tw, th) = (tw as i64, th as i64);

    let label_x = pixel_box.x1;
    let label_y = pixel_box.y1.saturating_sub(th + LABEL_GAP).max(0);
    let label_box = PixelBox {
      x1: label_x,
      y1: label_y,
      x2: label_x.saturating_add(tw + LABEL_PAD_X),
      y2: label_y.saturating_add(th + LABEL_PAD_Y),
    };
    fill_clipped(image, label_box, paint);

    let text_x = label_x.saturating_add(LABEL_TEXT_OFFSET_X);
    if text_x < image.width() as i64 && label_box.x2 >= 0 && label_y < image.height() as i64 {
      self
        .font
        .draw(image, P::from_rgb(LABEL_TEXT_COLOR), text_x as i32, label_y as i32, &label);
    }

    Overlay {
      pixel_box,
      color,
      label,
      label_box,
    }
  }

  /// 按顺序绘制，后绘制的覆盖先绘制的
  pub fn draw_detections<P: OverlayPixel>(
    &self,
    image: &mut Canvas<P>,
    detections: &[Detection],
  ) -> Vec<Overlay> {
    detections
      .iter()
      .enumerate()
      .map(|(i, detection)| {
        let overlay = self.draw_detection(image, detection);
        let PixelBox { x1, y1, x2, y2 } = overlay.pixel_box;
        debug!(
          "  {}. {} {} at ({},{})-({},{})",
          i + 1,
          detection.description,
          to_hex(overlay.color),
          x1,
          y1,
          x2,
          y2
        );
        overlay
      })
      .collect()
  }
}
