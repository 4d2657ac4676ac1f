use std::io::Cursor;

use anyhow::Context;
use base64::Engine;
use image::RgbaImage;

use crate::decode::decoder::DecodeLimits;
use crate::foundation::core::Size;
use crate::foundation::error::{StampError, StampResult};

/// Output width used when the request does not name one.
pub const DEFAULT_OUT_WIDTH: u32 = 635;
/// Output height used when the request does not name one.
pub const DEFAULT_OUT_HEIGHT: u32 = 215;

/// Which signature layout to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureVariant {
    /// Logo, divider and text.
    #[default]
    Standard,
    /// Standard layout plus a QR square on the right. The QR raster is mandatory.
    WithQr,
}

/// Overlay fields exactly as a client submits them.
///
/// Every field is optional on the wire; [`PayloadFields::into_payload`] enforces what a variant
/// requires. Both the English and the legacy Portuguese field names are accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadFields {
    /// Display name.
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
    /// Job title.
    #[serde(default, alias = "cargo")]
    pub title: Option<String>,
    /// Phone number.
    #[serde(default, alias = "telefone")]
    pub phone: Option<String>,
    /// Department line.
    #[serde(default, alias = "departamento")]
    pub department: Option<String>,
    /// E-mail line.
    #[serde(default, alias = "e-mail")]
    pub email: Option<String>,
    /// Postal address line.
    #[serde(default, alias = "endereco", alias = "endereço")]
    pub address: Option<String>,
    /// QR raster as a `data:` URL.
    #[serde(default)]
    pub qr_code_data: Option<String>,
    /// Location of the source animation, handed to the fetch collaborator.
    #[serde(default, rename = "gifUrl", alias = "gif_url", alias = "gif")]
    pub source: Option<String>,
    /// Output width in pixels; missing or 0 means 635.
    #[serde(default)]
    pub out_width: Option<u32>,
    /// Output height in pixels; missing or 0 means 215.
    #[serde(default)]
    pub out_height: Option<u32>,
}

/// Validated, immutable overlay input for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPayload {
    /// Display name (first text line, bold).
    pub display_name: String,
    /// Job title.
    pub title: String,
    /// Phone number.
    pub phone: String,
    /// Optional department, drawn between name and title.
    pub department: Option<String>,
    /// Optional e-mail, drawn after the phone.
    pub email: Option<String>,
    /// Optional address, drawn last in small type.
    pub address: Option<String>,
    /// Decoded QR raster; present exactly for [`SignatureVariant::WithQr`].
    pub qr: Option<RgbaImage>,
    /// Output raster size.
    pub output: Size,
}

impl PayloadFields {
    /// Check the fields `variant` requires and decode the QR raster.
    ///
    /// Text fields are trimmed; blank counts as absent. The QR raster is only decoded for
    /// [`SignatureVariant::WithQr`] and is ignored otherwise; `limits` bound its size.
    pub fn into_payload(
        self,
        variant: SignatureVariant,
        limits: &DecodeLimits,
    ) -> StampResult<OverlayPayload> {
        let display_name = required(self.name, "name")?;
        let title = required(self.title, "title")?;
        let phone = required(self.phone, "phone")?;

        let qr = match variant {
            SignatureVariant::Standard => None,
            SignatureVariant::WithQr => {
                let data = non_blank(self.qr_code_data).ok_or_else(|| {
                    StampError::missing_input("qrCodeData is required for the with-QR variant")
                })?;
                Some(decode_qr(data.as_bytes(), limits)?)
            }
        };

        let output = Size::new(
            self.out_width.filter(|&w| w > 0).unwrap_or(DEFAULT_OUT_WIDTH),
            self.out_height.filter(|&h| h > 0).unwrap_or(DEFAULT_OUT_HEIGHT),
        )?;

        Ok(OverlayPayload {
            display_name,
            title,
            phone,
            department: non_blank(self.department),
            email: non_blank(self.email),
            address: non_blank(self.address),
            qr,
            output,
        })
    }
}

/// Decode a QR raster from encoded image bytes or a base64 `data:` URL.
///
/// A raster wider or taller than `limits.max_dimension`, or with more than `limits.max_pixels`
/// pixels, is [`StampError::ResourceLimitExceeded`]. Any other failure is
/// [`StampError::MissingRequiredInput`]: an unreadable QR is as unusable as an absent one.
pub fn decode_qr(input: &[u8], limits: &DecodeLimits) -> StampResult<RgbaImage> {
    decode_qr_inner(input, limits).map_err(|err| {
        let over_limit = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<image::ImageError>(),
                Some(image::ImageError::Limits(_))
            )
        });
        if over_limit {
            StampError::limit(format!("qrCodeData image is too large: {err:#}"))
        } else {
            StampError::missing_input(format!("qrCodeData is not a usable image: {err:#}"))
        }
    })
}

fn decode_qr_inner(input: &[u8], limits: &DecodeLimits) -> anyhow::Result<RgbaImage> {
    let bytes = if input.starts_with(b"data:") {
        let text = std::str::from_utf8(input).context("data url is not utf-8")?;
        let (header, body) = text.split_once(',').context("data url has no payload")?;
        if !header.ends_with(";base64") {
            anyhow::bail!("data url payload must be base64");
        }
        base64::engine::general_purpose::STANDARD
            .decode(body.trim())
            .context("decode data url base64")?
    } else {
        input.to_vec()
    };
    let (w, h) = limited_reader(&bytes, limits)?
        .into_dimensions()
        .context("read image dimensions")?;
    if u64::from(w) * u64::from(h) > limits.max_pixels {
        return Err(image::ImageError::Limits(image::error::LimitError::from_kind(
            image::error::LimitErrorKind::DimensionError,
        )))
        .context(format!("{w}x{h} exceeds {} pixels", limits.max_pixels));
    }
    let img = limited_reader(&bytes, limits)?.decode().context("decode image from memory")?;
    Ok(img.to_rgba8())
}

fn limited_reader<'a>(
    bytes: &'a [u8],
    limits: &DecodeLimits,
) -> anyhow::Result<image::ImageReader<Cursor<&'a [u8]>>> {
    let mut reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?;
    let mut bounds = image::Limits::default();
    bounds.max_image_width = Some(limits.max_dimension);
    bounds.max_image_height = Some(limits.max_dimension);
    reader.limits(bounds);
    Ok(reader)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> StampResult<String> {
    non_blank(value).ok_or_else(|| StampError::missing_input(format!("{field} is required")))
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/payload.rs"]
mod tests;
