// 该文件是 ParkAnnotate （园景标注） 项目的一部分。
// src/annotate.rs - 图像标注与保存
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

use std::fs::Permissions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::{analysis::Detection, task::Render};

pub mod draw;
pub mod font;
pub mod palette;

pub use self::draw::{Canvas, Draw, Overlay, PixelBox, line_width_for};
pub use self::font::{FontSource, LabelFont, font_size_for, font_sources};
pub use self::palette::OverlayPixel;

const JPEG_QUALITY: u8 = 95;
const ANNOTATED_SUFFIX: &str = "_annotated";
const FALLBACK_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum AnnotateError {
  #[error("图像文件不存在: {}", .0.display())]
  FileNotFound(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// `{dir}/{stem}_annotated.{ext}`，无扩展名时使用 png
pub fn annotated_output_path(image_path: &Path) -> PathBuf {
  let stem = image_path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let ext = image_path
    .extension()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

  image_path.with_file_name(format!("{}{}.{}", stem, ANNOTATED_SUFFIX, ext))
}

pub struct Annotator {
  font_sources: Vec<FontSource>,
}

impl Default for Annotator {
  fn default() -> Self {
    Self::new(font_sources(&[]))
  }
}

impl Annotator {
  pub fn new(font_sources: Vec<FontSource>) -> Self {
    Self { font_sources }
  }

  /// 在内存中的图像上绘制检测结果
  pub fn draw<P: OverlayPixel>(&self, image: &mut Canvas<P>, detections: &[Detection]) -> Vec<Overlay> {
    let (width, height) = image.dimensions();
    let font = LabelFont::select(&self.font_sources, font_size_for(width, height));
    if font.is_builtin() {
      debug!("没有可用的字体文件，使用内置点阵字体");
    }
    let draw = Draw::new(&font, line_width_for(width, height));
    draw.draw_detections(image, detections)
  }

  /// 按原图的通道布局绘制；浮点图像转换为 RGBA8
  pub fn draw_dynamic(&self, image: &mut DynamicImage, detections: &[Detection]) -> Vec<Overlay> {
    match image {
      DynamicImage::ImageLuma8(buf) => self.draw(buf, detections),
      DynamicImage::ImageLumaA8(buf) => self.draw(buf, detections),
      DynamicImage::ImageRgb8(buf) => self.draw(buf, detections),
      DynamicImage::ImageRgba8(buf) => self.draw(buf, detections),
      DynamicImage::ImageLuma16(buf) => self.draw(buf, detections),
      DynamicImage::ImageLumaA16(buf) => self.draw(buf, detections),
      DynamicImage::ImageRgb16(buf) => self.draw(buf, detections),
      DynamicImage::ImageRgba16(buf) => self.draw(buf, detections),
      other => {
        let mut buf = other.to_rgba8();
        let overlays = self.draw(&mut buf, detections);
        *other = DynamicImage::ImageRgba8(buf);
        overlays
      }
    }
  }

  pub fn annotate(
    &self,
    image_path: &Path,
    detections: &[Detection],
    output_path: &Path,
  ) -> Result<Vec<Overlay>, AnnotateError> {
    if !image_path.exists() {
      return Err(AnnotateError::FileNotFound(image_path.to_path_buf()));
    }

    let output_format = ImageFormat::from_path(output_path)?;
    let permissions = std::fs::metadata(image_path)?.permissions();
    let same_format = ImageFormat::from_path(image_path).ok() == Some(output_format);
    if detections.is_empty() && same_format {
      info!("没有检测结果，直接复制图像");
      let data = std::fs::read(image_path)?;
      write_atomic(output_path, permissions, |writer| Ok(writer.write_all(&data)?))?;
      return Ok(Vec::new());
    }

    info!("绘制边界框到图像...");
    let mut image = ImageReader::open(image_path)?
      .with_guessed_format()?
      .decode()?;
    info!(
      "图像尺寸: {} x {} ({:?})",
      image.width(),
      image.height(),
      image.color()
    );

    let overlays = self.draw_dynamic(&mut image, detections);
    info!("处理 {} 个检测结果", overlays.len());

    save_image(&image, output_path, output_format, permissions)?;
    info!("标记后的图像已保存到: {}", output_path.display());
    Ok(overlays)
  }
}

fn save_image(
  image: &DynamicImage,
  path: &Path,
  format: ImageFormat,
  permissions: Permissions,
) -> Result<(), AnnotateError> {
  write_atomic(path, permissions, |writer| {
    match format {
      ImageFormat::Jpeg => {
        let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        jpeg_compatible(image).write_with_encoder(encoder)?
      }
      _ => image.write_to(writer, format)?,
    }
    Ok(())
  })
}

// JPEG 只支持 8 位灰度与 RGB，透明通道被丢弃
fn jpeg_compatible(image: &DynamicImage) -> std::borrow::Cow<'_, DynamicImage> {
  use std::borrow::Cow;
  match image.color() {
    ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
    ColorType::La8 | ColorType::L16 | ColorType::La16 => {
      Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
    }
    _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
  }
}

// 先写入同目录的临时文件，成功后再重命名；输出沿用原图的权限
fn write_atomic<F>(path: &Path, permissions: Permissions, write: F) -> Result<(), AnnotateError>
where
  F: FnOnce(&mut BufWriter<&mut std::fs::File>) -> Result<(), AnnotateError>,
{
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  std::fs::create_dir_all(dir)?;

  let mut file = NamedTempFile::new_in(dir)?;
  {
    let mut writer = BufWriter::new(file.as_file_mut());
    write(&mut writer)?;
    writer.flush()?;
  }
  debug!("临时文件: {}", file.path().display());
  file.persist(path).map_err(|e| e.error)?;
  std::fs::set_permissions(path, permissions)?;
  Ok(())
}

impl Render for Annotator {
  type Error = AnnotateError;

  fn render(
    &self,
    image_path: &Path,
    detections: &[Detection],
    output_path: &Path,
  ) -> Result<Vec<Overlay>, Self::Error> {
    self.annotate(image_path, detections, output_path)
  }
}
