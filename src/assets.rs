//! Image loading for logos and cover images.
//!
//! Failures are `AssetError`s: callers log them and leave the image out.

use std::io::Read;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use log::debug;

use crate::error::AssetError;

/// Raw bytes plus the decoded pixels. Backends pick whichever they need.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub decoded: DynamicImage,
}

impl LoadedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Load an image from a data URL, an http(s) URL or a local path.
pub fn load_image(reference: &str) -> Result<LoadedImage, AssetError> {
    let reference = reference.trim();
    debug!("Loading image: {}", preview(reference));

    let data = if reference.starts_with("data:") {
        load_data_url(reference)?
    } else if reference.starts_with("http://") || reference.starts_with("https://") {
        load_remote(reference)?
    } else {
        load_local(reference)?
    };

    decode(data)
}

/// At most the first 100 characters, cut on a char boundary.
fn preview(reference: &str) -> &str {
    reference.char_indices().nth(100).map_or(reference, |(i, _)| &reference[..i])
}

fn decode(data: Vec<u8>) -> Result<LoadedImage, AssetError> {
    if data.is_empty() {
        return Err(AssetError::Decode("image data is empty".to_string()));
    }
    let format = image::guess_format(&data).map_err(|e| AssetError::Decode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(&data, format)
        .map_err(|e| AssetError::Decode(e.to_string()))?;
    Ok(LoadedImage { data, format, decoded })
}

/// `data:image/png;base64,xxxx` or a percent-encoded payload.
fn load_data_url(data_url: &str) -> Result<Vec<u8>, AssetError> {
    let (header, payload) = data_url.split_once(',').ok_or(AssetError::InvalidDataUrl)?;

    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| AssetError::InvalidDataUrl)
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

fn load_remote(url: &str) -> Result<Vec<u8>, AssetError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| AssetError::Fetch(format!("{}: {}", url, e)))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| AssetError::Fetch(format!("{}: {}", url, e)))?;
    Ok(bytes)
}

fn load_local(path: &str) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Read { path: path.to_string(), source })
}
