//! PDF signing pipeline
//!
//! One signing operation is a sequential chain over owned inputs: parse the
//! original bytes, read the page geometry, decode the drawn signature,
//! compute the placement transform, composite, serialize. The original
//! bytes are never mutated; output exists only on full success.

pub mod composite;
pub mod geometry;
pub mod image;

use thiserror::Error;

use geometry::{GeometryError, Placement, UiPoint, ViewportGeometry};
use image::{ImageDecodeError, SignatureImage};

/// Failure kinds for one signing operation. All of them abort the
/// operation with no partial output.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("failed to read PDF document: {0}")]
    DocumentLoad(lopdf::Error),
    #[error("page index {index} out of range for document with {page_count} pages")]
    PageIndex { index: usize, page_count: usize },
    #[error("signature image rejected: {0}")]
    ImageDecode(#[from] ImageDecodeError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("failed to encode image stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs for one signing operation, excluding the viewport measurement.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub pdf: Vec<u8>,
    pub signature_data_url: String,
    /// 0-based target page.
    pub page_index: usize,
    /// Signature overlay top-left, container pixels.
    pub ui_position: UiPoint,
    /// Display zoom factor of the rendered page.
    pub ui_zoom: f64,
    /// User-adjustable overlay scale factor.
    pub signature_scale: f64,
}

/// Result of a signing operation: the re-serialized document plus the
/// placement that was burned in (useful for logging and diagnostics).
#[derive(Debug)]
pub struct SignedPdf {
    pub bytes: Vec<u8>,
    pub placement: Placement,
}

/// Sign a PDF: composite the drawn signature onto the requested page at
/// the UI-derived placement and return the new document bytes.
///
/// Page geometry is taken from page 0, matching the viewer the placement
/// was made against, which renders every page at the first page's size.
pub fn sign_pdf(
    request: &SignRequest,
    viewport: &dyn ViewportGeometry,
) -> Result<SignedPdf, SignError> {
    let mut doc = composite::load_document(&request.pdf)?;

    let target_page = composite::page_at(&doc, request.page_index)?;
    let first_page = composite::page_at(&doc, 0)?;
    let page_size = composite::page_size(&doc, first_page)?;

    let signature = SignatureImage::from_data_url(&request.signature_data_url)?;
    let displayed = geometry::displayed_signature_size(
        signature.width(),
        signature.height(),
        request.signature_scale,
    );

    let placement = geometry::compute_placement(
        request.ui_position,
        displayed,
        request.ui_zoom,
        page_size,
        viewport,
    )?;

    if placement.estimated {
        tracing::warn!(
            page_index = request.page_index,
            "rendering surface not measured, placed signature using estimated geometry"
        );
    }

    composite::draw_signature(&mut doc, target_page, &signature, &placement)?;
    let bytes = composite::save_document(doc)?;

    tracing::debug!(
        page_index = request.page_index,
        x = placement.position.x,
        y = placement.position.y,
        width = placement.size.width,
        height = placement.size.height,
        "signature composited"
    );

    Ok(SignedPdf { bytes, placement })
}

#[cfg(test)]
mod tests {
    use super::geometry::{CanvasGeometry, PageSize, UiSize};
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use lopdf::{Dictionary, Document, Object, Stream};

    fn create_test_pdf(num_pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");

        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..num_pages {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Resources", Object::Dictionary(Dictionary::new())),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(num_pages as i64)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn png_data_url(width: u32, height: u32) -> String {
        let img =
            ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([0, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            ::image::ImageFormat::Png,
        )
        .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&bytes))
    }

    struct MeasuredViewport(CanvasGeometry);

    impl ViewportGeometry for MeasuredViewport {
        fn canvas(&self) -> Option<CanvasGeometry> {
            Some(self.0)
        }

        fn viewport_width(&self) -> Option<f64> {
            None
        }
    }

    fn request(pdf: Vec<u8>, page_index: usize) -> SignRequest {
        SignRequest {
            pdf,
            signature_data_url: png_data_url(300, 120),
            page_index,
            ui_position: UiPoint { x: 100.0, y: 200.0 },
            ui_zoom: 1.0,
            signature_scale: 1.0,
        }
    }

    fn viewport() -> MeasuredViewport {
        MeasuredViewport(CanvasGeometry {
            width: 800.0,
            height: 1035.3,
            offset_x: 0.0,
            offset_y: 0.0,
        })
    }

    #[test]
    fn signing_preserves_page_count_and_sizes() {
        let original = create_test_pdf(3);
        let signed = sign_pdf(&request(original.clone(), 1), &viewport()).unwrap();

        let reopened = Document::load_mem(&signed.bytes).unwrap();
        assert_eq!(reopened.get_pages().len(), 3);

        for (_, page_id) in reopened.get_pages() {
            let size = composite::page_size(&reopened, page_id).unwrap();
            assert_eq!(
                size,
                PageSize {
                    width: 612.0,
                    height: 792.0
                }
            );
        }
    }

    #[test]
    fn placement_matches_us_letter_scenario() {
        let signed = sign_pdf(&request(create_test_pdf(1), 0), &viewport()).unwrap();

        // 300x120 natural image at scale 1.0 displays as 150x60 px.
        let ratio = 612.0 / 800.0;
        let expected = UiSize {
            width: 150.0 * ratio,
            height: 60.0 * ratio,
        };
        assert!((signed.placement.size.width - expected.width).abs() < 1e-9);
        assert!((signed.placement.size.height - expected.height).abs() < 1e-9);
        assert!((signed.placement.position.x - 76.5).abs() < 1e-9);
        assert!((signed.placement.position.y - 593.1).abs() < 1e-9);
    }

    #[test]
    fn signing_twice_yields_same_shape() {
        let original = create_test_pdf(2);
        let first = sign_pdf(&request(original.clone(), 0), &viewport()).unwrap();
        let second = sign_pdf(&request(original, 0), &viewport()).unwrap();

        let a = Document::load_mem(&first.bytes).unwrap();
        let b = Document::load_mem(&second.bytes).unwrap();
        assert_eq!(a.get_pages().len(), b.get_pages().len());
        assert_eq!(first.placement, second.placement);
    }

    #[test]
    fn page_out_of_range_produces_no_output() {
        let err = sign_pdf(&request(create_test_pdf(3), 5), &viewport()).unwrap_err();
        assert!(matches!(
            err,
            SignError::PageIndex {
                index: 5,
                page_count: 3
            }
        ));
    }

    #[test]
    fn malformed_pdf_is_document_load_error() {
        let err = sign_pdf(&request(b"not a pdf".to_vec(), 0), &viewport()).unwrap_err();
        assert!(matches!(err, SignError::DocumentLoad(_)));
    }

    #[test]
    fn bad_signature_is_image_decode_error() {
        let mut req = request(create_test_pdf(1), 0);
        req.signature_data_url = "data:text/plain;base64,aGVsbG8=".to_string();
        let err = sign_pdf(&req, &viewport()).unwrap_err();
        assert!(matches!(err, SignError::ImageDecode(_)));
    }

    #[test]
    fn signed_page_gains_signature_xobject() {
        let signed = sign_pdf(&request(create_test_pdf(1), 0), &viewport()).unwrap();
        let reopened = Document::load_mem(&signed.bytes).unwrap();
        let page_id = composite::page_at(&reopened, 0).unwrap();
        let page_dict = reopened.get_dictionary(page_id).unwrap();
        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.len(), 1);
    }
}
