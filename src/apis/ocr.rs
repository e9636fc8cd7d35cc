use crate::config::OcrConfig;
use crate::constants::{LABEL_TEXT_SOURCE, TESSERACT_OCR_SOURCE};
use crate::error::{LookupError, Result};
use crate::metrics::LookupMetrics;
use crate::types::{InputKind, LookupRequest, ProductSource, RawProductRecord};
use image::{DynamicImage, ImageFormat, Luma};
use std::io::Cursor;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Contrast boost passed to `adjust_contrast`; `(1 + c/100)^2` doubles the spread around mid-grey
pub const CONTRAST_BOOST: f32 = 41.42;
/// Luma value above which a pixel becomes white
pub const BINARIZE_THRESHOLD: u8 = 128;
/// 3x3 sharpen kernel, normalized by its sum (16) when applied
pub const SHARPEN_KERNEL: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

/// Clean up a label photo for OCR: grayscale, contrast boost, sharpen, then
/// binarize. Returns the result encoded as PNG.
pub fn preprocess_image(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| LookupError::Ocr(format!("Unreadable image: {}", e)))?;

    let mut luma = img
        .grayscale()
        .adjust_contrast(CONTRAST_BOOST)
        .filter3x3(&SHARPEN_KERNEL)
        .to_luma8();

    for Luma([value]) in luma.pixels_mut() {
        *value = if *value > BINARIZE_THRESHOLD { 255 } else { 0 };
    }

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(luma)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| LookupError::Ocr(format!("Failed to encode preprocessed image: {}", e)))?;
    Ok(png)
}

/// Reject bodies that would grow past `max` bytes
fn ensure_within_limit(size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(LookupError::Ocr(format!(
            "Image is larger than the {} byte limit",
            max
        )));
    }
    Ok(())
}

/// Label OCR backed by the `tesseract` command line tool
pub struct TesseractOcr {
    client: reqwest::Client,
    command: String,
    language: String,
    page_segmentation_mode: u8,
    max_image_bytes: usize,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// Arguments after the input name: text to stdout, configured language and layout mode
    pub fn output_args(&self) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }

    /// OCR a local image file
    #[instrument(skip(self))]
    pub async fn extract_from_path(&self, path: &str) -> Result<String> {
        if !Path::new(path).is_file() {
            return Err(LookupError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Image file not found: {}", path),
            )));
        }

        let size = tokio::fs::metadata(path).await?.len();
        ensure_within_limit(usize::try_from(size).unwrap_or(usize::MAX), self.max_image_bytes)?;

        let _timing = LookupMetrics::time_source(TESSERACT_OCR_SOURCE);
        let bytes = tokio::fs::read(path).await?;
        self.recognize(&bytes).await
    }

    /// Download an image and OCR it. The body is read in chunks and abandoned
    /// once it passes the size limit.
    #[instrument(skip(self))]
    pub async fn extract_from_url(&self, url: &str) -> Result<String> {
        let _timing = LookupMetrics::time_source(TESSERACT_OCR_SOURCE);

        let mut response = self.client.get(url).send().await?.error_for_status()?;
        if let Some(length) = response.content_length() {
            ensure_within_limit(usize::try_from(length).unwrap_or(usize::MAX), self.max_image_bytes)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            ensure_within_limit(bytes.len() + chunk.len(), self.max_image_bytes)?;
            bytes.extend_from_slice(&chunk);
        }
        debug!("Downloaded {} bytes of image data", bytes.len());

        self.recognize(&bytes).await
    }

    /// Preprocess image bytes and run tesseract on the result over stdin
    async fn recognize(&self, bytes: &[u8]) -> Result<String> {
        let owned = bytes.to_vec();
        let png = tokio::task::spawn_blocking(move || preprocess_image(&owned))
            .await
            .map_err(|e| LookupError::Ocr(format!("Preprocessing task failed: {}", e)))??;

        let mut child = Command::new(&self.command)
            .arg("stdin")
            .args(self.output_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LookupError::Ocr(format!("Failed to run '{}': {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).await?;
            // Dropping stdin closes the pipe so tesseract sees EOF
        }

        let output = child.wait_with_output().await?;
        collect_text(output)
    }
}

fn collect_text(output: std::process::Output) -> Result<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LookupError::Ocr(format!(
            "tesseract exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Wrap extracted text as a raw record; blank text means nothing was read
pub fn text_to_records(text: String) -> Vec<RawProductRecord> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![RawProductRecord::FreeText(text)]
    }
}

#[async_trait::async_trait]
impl ProductSource for TesseractOcr {
    fn source_name(&self) -> &'static str {
        TESSERACT_OCR_SOURCE
    }

    fn handles(&self, kind: InputKind) -> bool {
        matches!(kind, InputKind::ImageUrl | InputKind::ImageLocal)
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<Vec<RawProductRecord>> {
        let text = match request {
            LookupRequest::ImageUrl(url) => self.extract_from_url(url).await?,
            LookupRequest::ImagePath(path) => self.extract_from_path(path).await?,
            other => {
                return Err(LookupError::Api {
                    message: format!("{} cannot serve {} requests", TESSERACT_OCR_SOURCE, other.kind()),
                })
            }
        };
        info!("OCR extracted {} characters", text.len());
        Ok(text_to_records(text))
    }
}

/// Reads label text that was already extracted elsewhere, from a file or `-` for stdin
#[derive(Debug, Default)]
pub struct LabelTextFile;

impl LabelTextFile {
    pub fn new() -> Self {
        Self
    }

    pub async fn read(&self, path: &str) -> Result<String> {
        if path == "-" {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        } else {
            Ok(tokio::fs::read_to_string(path).await?)
        }
    }
}

#[async_trait::async_trait]
impl ProductSource for LabelTextFile {
    fn source_name(&self) -> &'static str {
        LABEL_TEXT_SOURCE
    }

    fn handles(&self, kind: InputKind) -> bool {
        kind == InputKind::LabelText
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<Vec<RawProductRecord>> {
        match request {
            LookupRequest::LabelText(path) => Ok(text_to_records(self.read(path).await?)),
            other => Err(LookupError::Api {
                message: format!("{} cannot serve {} requests", LABEL_TEXT_SOURCE, other.kind()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Write;

    fn gradient_png() -> Vec<u8> {
        // Dark on the left, light on the right
        let img = RgbImage::from_fn(8, 8, |x, _| {
            let v = (x * 255 / 7) as u8;
            Rgb([v, v, v])
        });
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn test_preprocess_binarizes_label_image() {
        let processed = preprocess_image(&gradient_png()).unwrap();
        let luma = image::load_from_memory(&processed).unwrap().to_luma8();

        assert_eq!(luma.dimensions(), (8, 8));
        assert!(luma.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(luma.get_pixel(1, 3).0[0], 0);
        assert_eq!(luma.get_pixel(6, 3).0[0], 255);
    }

    #[test]
    fn test_preprocess_rejects_non_image_bytes() {
        let result = preprocess_image(b"Error: not an image");
        assert!(matches!(result, Err(LookupError::Ocr(_))));
    }

    #[test]
    fn test_size_limit() {
        assert!(ensure_within_limit(10, 10).is_ok());
        assert!(matches!(ensure_within_limit(11, 10), Err(LookupError::Ocr(_))));
    }

    #[tokio::test]
    async fn test_oversized_local_image_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&gradient_png()).unwrap();
        let config = OcrConfig {
            max_image_bytes: 16,
            ..Default::default()
        };
        let ocr = TesseractOcr::new(&config).unwrap();

        let result = ocr.extract_from_path(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(LookupError::Ocr(msg)) if msg.contains("byte limit")));
    }

    #[test]
    fn test_output_args_follow_config() {
        let config = OcrConfig {
            language: "deu".to_string(),
            page_segmentation_mode: 4,
            ..Default::default()
        };
        let ocr = TesseractOcr::new(&config).unwrap();
        assert_eq!(ocr.output_args(), vec!["stdout", "-l", "deu", "--psm", "4"]);
    }

    #[test]
    fn test_blank_text_yields_no_records() {
        assert!(text_to_records("  \n ".to_string()).is_empty());
        assert_eq!(
            text_to_records("5g fat".to_string()),
            vec![RawProductRecord::FreeText("5g fat".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_image_is_io_error() {
        let ocr = TesseractOcr::new(&OcrConfig::default()).unwrap();
        let result = ocr.extract_from_path("no/such/label.png").await;
        assert!(matches!(result, Err(LookupError::Io(_))));
    }

    #[tokio::test]
    async fn test_label_text_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Energy 250 kcal, 5g fat").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let source = LabelTextFile::new();
        let records = source.fetch(&LookupRequest::LabelText(path)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], RawProductRecord::FreeText(t) if t.contains("250 kcal")));
    }
}
