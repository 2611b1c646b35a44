// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor preprocessing for the ONNX strip detector and OCR models

use image::{imageops, Rgb, RgbImage};
use ndarray::{s, Array4};

/// Target size for the PaddleOCR text-line detection model
pub const OCR_INPUT_SIZE: u32 = 640;

/// Recognition model input height (PP-OCRv4/v5 use 48)
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Direction classifier input width (lines are padded to it)
pub const CLS_INPUT_WIDTH: u32 = 192;

/// Mean values for normalization (ImageNet)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Padding colour used by YOLO letterboxing
pub const YOLO_PAD: Rgb<u8> = Rgb([114, 114, 114]);

/// Padding colour used for OCR inputs
pub const OCR_PAD: Rgb<u8> = Rgb([128, 128, 128]);

/// Scale and offsets applied by `letterbox`
///
/// Used to map model-space coordinates back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl LetterboxInfo {
    /// Calculate letterbox geometry for an image of `width` x `height`
    pub fn new(width: u32, height: u32, target_size: u32) -> Self {
        if width == 0 || height == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                original_width: width,
                original_height: height,
            };
        }

        let scale = (target_size as f32 / width as f32).min(target_size as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            original_width: width,
            original_height: height,
        }
    }

    /// Map a coordinate from model space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (orig_x, orig_y)
    }

    /// Map a point back and clip it to the original image
    pub fn map_clipped(&self, x: f32, y: f32) -> (f32, f32) {
        let (ox, oy) = self.map_to_original(x, y);
        (
            ox.clamp(0.0, self.original_width as f32),
            oy.clamp(0.0, self.original_height as f32),
        )
    }
}

/// Resize with aspect ratio preservation and centered padding
pub fn letterbox(image: &RgbImage, target_size: u32, pad: Rgb<u8>) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let info = LetterboxInfo::new(orig_w, orig_h, target_size);

    let mut output = RgbImage::from_pixel(target_size, target_size, pad);
    if orig_w == 0 || orig_h == 0 {
        return (output, info);
    }

    let new_w = ((orig_w as f32 * info.scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h as f32 * info.scale).round() as u32).clamp(1, target_size);
    let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);
    imageops::replace(&mut output, &resized, info.offset_x as i64, info.offset_y as i64);

    (output, info)
}

/// Convert an RGB image into a normalized NCHW tensor `[1, 3, H, W]`
///
/// Each channel is computed as `(pixel / 255 - mean) / std`.
pub fn to_nchw_tensor(image: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let mut tensor = Array4::zeros((1, 3, height, width));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    tensor
}

/// Letterbox to `img_size` and scale to `[0, 1]` for the YOLO strip detector
pub fn preprocess_for_strip_detection(image: &RgbImage, img_size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (padded, info) = letterbox(image, img_size, YOLO_PAD);
    (to_nchw_tensor(&padded, [0.0; 3], [1.0; 3]), info)
}

/// Letterbox to 640 with ImageNet normalization for text-line detection
pub fn preprocess_for_text_detection(image: &RgbImage) -> (Array4<f32>, LetterboxInfo) {
    let (padded, info) = letterbox(image, OCR_INPUT_SIZE, OCR_PAD);
    (to_nchw_tensor(&padded, IMAGENET_MEAN, IMAGENET_STD), info)
}

/// Preprocess a cropped text line for recognition
///
/// Resizes to height 48 with dynamic width (aspect ratio kept, at most 320,
/// at least 4 pixels).
pub fn preprocess_for_recognition(image: &RgbImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32).clamp(4, REC_MAX_WIDTH);

    let resized = imageops::resize(image, new_width, REC_INPUT_HEIGHT, imageops::FilterType::Lanczos3);
    to_nchw_tensor(&resized, IMAGENET_MEAN, IMAGENET_STD)
}

/// Preprocess a text line for the direction classifier
///
/// Resizes to height 48 keeping aspect ratio (width at most 192), scales
/// pixels to `[-1, 1]` and zero-pads on the right to a fixed `[1, 3, 48, 192]`.
pub fn preprocess_for_angle_classification(image: &RgbImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).ceil() as u32).clamp(1, CLS_INPUT_WIDTH);

    let resized = imageops::resize(image, new_width, REC_INPUT_HEIGHT, imageops::FilterType::Triangle);
    let normalized = to_nchw_tensor(&resized, [0.5; 3], [0.5; 3]);

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, CLS_INPUT_WIDTH as usize));
    tensor
        .slice_mut(s![.., .., .., ..new_width as usize])
        .assign(&normalized);
    tensor
}
