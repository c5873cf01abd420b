//! Record normalization: fetch every cover image concurrently and decode it
//! into a [`Bitmap`] the PDF writer can embed.
//!
//! A failed fetch or decode only affects its own record. The record is kept
//! with [`ImageSlot::Failed`] and later drawn with a placeholder block.

use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::join_all;
use image::{ColorType, ImageFormat};

use crate::error::{Error, FetchError};
use crate::model::{Bitmap, BitmapData, ImageSlot, Layout, NormalizedRecord, ProjectRecord};

/// Supplies raw image bytes for a record's image reference.
pub trait ImageFetcher {
    fn fetch_image_bytes(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Short form of an image reference for logs and error messages.
/// Data URIs can be megabytes long.
pub(crate) fn display_source(source: &str) -> String {
    const MAX: usize = 64;
    match source.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &source[..idx]),
        None => source.to_string(),
    }
}

/// Fetches `http(s)://` URLs with reqwest, decodes `data:` URIs in place and
/// reads anything else from the local filesystem.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let origin = display_source(url);
        let to_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    origin: origin.clone(),
                    secs: self.timeout.map_or(0, |t| t.as_secs()),
                }
            } else {
                FetchError::Http {
                    origin: origin.clone(),
                    detail: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(to_fetch_error)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                origin: origin.clone(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(to_fetch_error)?;
        Ok(bytes.to_vec())
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch_image_bytes(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(FetchError::MissingSource);
        }
        if source.starts_with("data:") {
            return decode_data_uri(source);
        }
        if is_url(source) {
            return self.fetch_url(source).await;
        }
        tokio::fs::read(Path::new(source))
            .await
            .map_err(|e| FetchError::Io {
                origin: display_source(source),
                detail: e.to_string(),
            })
    }
}

/// Decodes `data:[<mediatype>];base64,<payload>`.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, FetchError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUri("missing data: prefix".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUri("missing ',' separator".into()))?;
    if !meta.ends_with(";base64") {
        return Err(FetchError::InvalidDataUri(format!(
            "only base64 payloads are supported, got '{meta}'"
        )));
    }
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| FetchError::InvalidDataUri(e.to_string()))
}

/// Decodes fetched bytes into a bitmap. RGB and grayscale JPEGs are kept as
/// compressed streams; everything else is expanded to RGB samples with a
/// separate alpha plane when any pixel is translucent.
pub fn decode_bitmap(source: &str, bytes: &[u8]) -> Result<Bitmap, FetchError> {
    let decode_err = |detail: String| FetchError::Decode {
        origin: display_source(source),
        detail,
    };
    let format = image::guess_format(bytes).map_err(|e| decode_err(e.to_string()))?;
    let decoded = image::ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| decode_err(e.to_string()))?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(decode_err(format!("empty image ({w}x{h})")));
    }

    let data = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8) => BitmapData::Jpeg {
            data: bytes.to_vec(),
            gray: false,
        },
        (ImageFormat::Jpeg, ColorType::L8) => BitmapData::Jpeg {
            data: bytes.to_vec(),
            gray: true,
        },
        _ => {
            let rgba = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let samples: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
            BitmapData::Rgb { samples, alpha }
        }
    };

    Ok(Bitmap {
        pixel_width: w,
        pixel_height: h,
        data,
    })
}

async fn load_image<F: ImageFetcher>(fetcher: &F, record: &ProjectRecord) -> ImageSlot {
    let result = if record.image.trim().is_empty() {
        Err(FetchError::MissingSource)
    } else {
        match fetcher.fetch_image_bytes(&record.image).await {
            Ok(bytes) => decode_bitmap(&record.image, &bytes),
            Err(e) => Err(e),
        }
    };
    match result {
        Ok(bitmap) => ImageSlot::Loaded(bitmap),
        Err(e) => {
            log::warn!("Image for project '{}' unavailable: {e}", record.name);
            ImageSlot::Failed(e)
        }
    }
}

/// Pairs every record with its decoded image, in input order.
///
/// All fetches are issued at once and awaited together, so the total time is
/// bounded by the slowest image. Layouts without images skip fetching.
pub async fn normalize<F: ImageFetcher>(
    records: &[ProjectRecord],
    layout: Layout,
    fetcher: &F,
) -> Vec<NormalizedRecord> {
    if !layout.wants_images() {
        log::debug!("{layout} layout: skipping {} image fetches", records.len());
        return records
            .iter()
            .cloned()
            .map(NormalizedRecord::without_image)
            .collect();
    }

    let t0 = Instant::now();
    let slots = join_all(records.iter().map(|r| load_image(fetcher, r))).await;
    let failed = slots
        .iter()
        .filter(|s| matches!(s, ImageSlot::Failed(_)))
        .count();

    log::info!(
        "Normalized {} records in {:.1}ms ({} images unavailable)",
        records.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
        failed,
    );

    records
        .iter()
        .cloned()
        .zip(slots)
        .map(|(record, image)| NormalizedRecord { record, image })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(img: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn opaque_png_has_no_alpha_plane() {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        let bytes = encode(img.into(), ImageFormat::Png);
        let bitmap = decode_bitmap("cover.png", &bytes).unwrap();
        assert_eq!((bitmap.pixel_width, bitmap.pixel_height), (4, 3));
        match bitmap.data {
            BitmapData::Rgb { samples, alpha } => {
                assert_eq!(samples.len(), 4 * 3 * 3);
                assert_eq!(&samples[..3], &[10, 20, 30]);
                assert!(alpha.is_none());
            }
            other => panic!("expected raw samples, got {other:?}"),
        }
    }

    #[test]
    fn translucent_png_keeps_alpha() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 128]));
        let bytes = encode(img.into(), ImageFormat::Png);
        let bitmap = decode_bitmap("a.png", &bytes).unwrap();
        match bitmap.data {
            BitmapData::Rgb { alpha: Some(a), .. } => assert_eq!(a, vec![128; 4]),
            other => panic!("expected alpha plane, got {other:?}"),
        }
    }

    #[test]
    fn rgb_jpeg_passes_through() {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]));
        let bytes = encode(img.into(), ImageFormat::Jpeg);
        let bitmap = decode_bitmap("a.jpg", &bytes).unwrap();
        assert_eq!(
            bitmap.data,
            BitmapData::Jpeg {
                data: bytes,
                gray: false
            }
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_bitmap("x.jpg", b"definitely not an image").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "{err:?}");
    }

    #[test]
    fn data_uri_roundtrip() {
        let uri = format!("data:image/png;base64,{}", BASE64.encode(b"\x89PNG"));
        assert_eq!(decode_data_uri(&uri).unwrap(), b"\x89PNG");
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(FetchError::InvalidDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64"),
            Err(FetchError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn long_sources_are_shortened() {
        let long = "x".repeat(500);
        assert!(display_source(&long).chars().count() <= 65);
        assert_eq!(display_source("a.jpg"), "a.jpg");
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let fetcher = HttpFetcher::new(None).unwrap();
        let err = fetcher
            .fetch_image_bytes("/nonexistent/archifolio/cover.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }), "{err:?}");
    }
}
