use std::io::Cursor;

use anyhow::Result;
use image::{ImageFormat, Luma};
use qrcode::QrCode;

/// Pixels per QR module.
const MODULE_SCALE: u32 = 10;

/// Render `url` as a PNG QR code.
pub fn render_png(url: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(url.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_SCALE, MODULE_SCALE)
        .build();

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

/// Only absolute http(s) URLs are encoded.
pub fn is_campaign_url(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace)))
}
