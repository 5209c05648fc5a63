//! Image-based text recovery for scanned statements.
//!
//! Pipeline: rasterize every page at 300 DPI with `pdftoppm`, enhance
//! contrast and sharpness, run `tesseract` per page emitting a searchable
//! single-page PDF, and assemble the pages into `<base>_OCR.pdf`.
//!
//! Any failure is logged and swallowed; the caller proceeds with the
//! original document.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;

use tagger_core::{Result, TagError};
use tagger_pdf::PdfDocument;

/// Rasterization resolution for OCR input.
const OCR_DPI: u16 = 300;
/// Tesseract page segmentation mode: single uniform block of text.
const PSM: &str = "6";
const LANGUAGES: &str = "eng+spa";

/// Run OCR on `path`, returning the searchable output path on success.
///
/// `None` means OCR was unavailable or failed; the original document
/// remains the working file.
pub fn force_ocr(path: &Path) -> Option<PathBuf> {
    match run_ocr(path) {
        Ok(output) => {
            log::info!("OCR produced {}", output.display());
            Some(output)
        }
        Err(e) => {
            log::warn!("OCR failed for {}: {}, using original", path.display(), e);
            None
        }
    }
}

fn run_ocr(path: &Path) -> Result<PathBuf> {
    check_tool("pdftoppm")?;
    check_tool("tesseract")?;

    let page_count = PdfDocument::open(path)?.page_count();
    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| TagError::Ocr(format!("failed to create temp dir: {}", e)))?;

    rasterize(path, tmp_dir.path())?;

    let mut page_docs = Vec::with_capacity(page_count);
    for page_num in 1..=page_count as u32 {
        let image_path = find_rendered_page(tmp_dir.path(), page_num)
            .ok_or_else(|| TagError::Ocr(format!("no rendered image for page {}", page_num)))?;

        let enhanced_path = tmp_dir.path().join(format!("enhanced-{}.png", page_num));
        let img = image::open(&image_path)
            .map_err(|e| TagError::Ocr(format!("failed to read page image: {}", e)))?;
        enhance(img)
            .save(&enhanced_path)
            .map_err(|e| TagError::Ocr(format!("failed to write enhanced image: {}", e)))?;

        let page_pdf = recognize_page(&enhanced_path, tmp_dir.path(), page_num)?;
        page_docs.push(PdfDocument::open(&page_pdf)?);
    }

    if page_docs.is_empty() {
        return Err(TagError::Ocr("document has no pages".to_string()));
    }

    let output = ocr_output_path(path);
    let mut merged = PdfDocument::merge(page_docs)?;
    merged.save(&output)?;
    Ok(output)
}

/// Contrast and sharpness enhancement applied before recognition.
/// Mirrors a 1.5x contrast boost plus an unsharp mask.
fn enhance(img: DynamicImage) -> DynamicImage {
    img.adjust_contrast(50.0).unsharpen(1.5, 2)
}

fn rasterize(path: &Path, dir: &Path) -> Result<()> {
    let prefix = dir.join("page");
    let prefix_str = prefix
        .to_str()
        .ok_or_else(|| TagError::Ocr("invalid temp path".to_string()))?;

    log::info!("Rasterizing {} at {} DPI...", path.display(), OCR_DPI);

    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg(OCR_DPI.to_string())
        .arg(path.as_os_str())
        .arg(prefix_str)
        .output()
        .map_err(|e| TagError::Ocr(format!("failed to run pdftoppm: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TagError::Ocr(format!("pdftoppm failed: {}", stderr)));
    }
    Ok(())
}

/// OCR one page image into a single-page searchable PDF, returning its path.
fn recognize_page(image_path: &Path, dir: &Path, page_num: u32) -> Result<PathBuf> {
    let out_base = dir.join(format!("ocr-{}", page_num));
    let out_base_str = out_base
        .to_str()
        .ok_or_else(|| TagError::Ocr("invalid temp path".to_string()))?;

    let mut attempt = Command::new("tesseract");
    attempt
        .arg(image_path.as_os_str())
        .arg(out_base_str)
        .arg("-l")
        .arg(LANGUAGES)
        .arg("--psm")
        .arg(PSM)
        .arg("pdf");

    let result = attempt
        .output()
        .map_err(|e| TagError::Ocr(format!("failed to run tesseract: {}", e)))?;

    if !result.status.success() {
        // language packs may be missing; retry with the engine default
        log::debug!(
            "tesseract with -l {} failed on page {}, retrying with defaults",
            LANGUAGES,
            page_num
        );
        let retry = Command::new("tesseract")
            .arg(image_path.as_os_str())
            .arg(out_base_str)
            .arg("--psm")
            .arg(PSM)
            .arg("pdf")
            .output()
            .map_err(|e| TagError::Ocr(format!("failed to run tesseract: {}", e)))?;
        if !retry.status.success() {
            let stderr = String::from_utf8_lossy(&retry.stderr);
            return Err(TagError::Ocr(format!(
                "tesseract failed on page {}: {}",
                page_num, stderr
            )));
        }
    }

    let pdf_path = PathBuf::from(format!("{}.pdf", out_base_str));
    if !pdf_path.exists() {
        return Err(TagError::Ocr(format!(
            "tesseract produced no output for page {}",
            page_num
        )));
    }
    Ok(pdf_path)
}

/// Find the rendered PNG for a page; pdftoppm zero-pads by total count.
fn find_rendered_page(dir: &Path, page_num: u32) -> Option<PathBuf> {
    for width in 1..=6 {
        let name = format!("page-{:0>width$}.png", page_num, width = width);
        let path = dir.join(&name);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// `statement.pdf` → `statement_OCR.pdf`, beside the original.
fn ocr_output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    path.with_file_name(format!("{}_OCR.pdf", stem))
}

fn check_tool(name: &str) -> Result<()> {
    let which = Command::new("which")
        .arg(name)
        .output()
        .map_err(|e| TagError::Ocr(format!("failed to check for {}: {}", name, e)))?;
    if !which.status.success() {
        return Err(TagError::Ocr(format!(
            "{} is required for OCR. Install poppler-utils and tesseract-ocr.",
            name
        )));
    }
    Ok(())
}
