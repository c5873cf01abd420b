#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use archifolio_pdf::{FetchError, ImageFetcher, ProjectRecord, ProjectStatus};
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn record(id: usize) -> ProjectRecord {
    ProjectRecord {
        id: format!("p{id}"),
        name: format!("Progetto {id}"),
        image: format!("https://cdn.example/{id}.png"),
        location: "Bergamo".into(),
        start_date: date(2020, 1 + (id % 12) as u32, 1),
        end_date: Some(date(2022, 6, 30)),
        client: "Comune di Bergamo".into(),
        service: "Direzione lavori".into(),
        category: "E.20".into(),
        amount: 125_000.0 + id as f64,
        status: ProjectStatus::Completed,
    }
}

pub fn records(n: usize) -> Vec<ProjectRecord> {
    (0..n).map(record).collect()
}

pub fn ids(records: &[ProjectRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Vec::new();
    image::DynamicImage::from(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Serves canned responses after a per-source delay. Unknown sources answer 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, (Duration, Result<Vec<u8>, FetchError>)>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serving(records: &[ProjectRecord]) -> Self {
        let mut fetcher = Self::new();
        for r in records {
            fetcher = fetcher.with_image(&r.image, Duration::ZERO, png_bytes(4, 3, [90, 120, 150]));
        }
        fetcher
    }

    pub fn with_image(mut self, source: &str, delay: Duration, bytes: Vec<u8>) -> Self {
        self.responses.insert(source.to_string(), (delay, Ok(bytes)));
        self
    }

    pub fn with_error(mut self, source: &str, delay: Duration, error: FetchError) -> Self {
        self.responses.insert(source.to_string(), (delay, Err(error)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageFetcher for MockFetcher {
    async fn fetch_image_bytes(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, response)) = self.responses.get(source).cloned() else {
            return Err(FetchError::Status {
                origin: source.to_string(),
                status: 404,
            });
        };
        tokio::time::sleep(delay).await;
        response
    }
}
