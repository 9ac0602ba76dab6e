//! Signature compositing
//!
//! Burns a decoded signature raster into one page of an existing PDF. The
//! image lands as a FlateDecode DeviceRGB Image XObject with a DeviceGray
//! SMask carrying the drawing's alpha channel, drawn at full opacity by a
//! content stream appended to the page. Everything else in the document is
//! left untouched.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::geometry::{PageSize, Placement};
use super::image::SignatureImage;
use super::SignError;

/// Parse PDF bytes into a fresh in-memory document.
pub fn load_document(bytes: &[u8]) -> Result<Document, SignError> {
    Document::load_mem(bytes).map_err(SignError::DocumentLoad)
}

/// Serialize the document back to bytes.
pub fn save_document(mut doc: Document) -> Result<Vec<u8>, SignError> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Resolve a 0-based page index to a page object id.
pub fn page_at(doc: &Document, index: usize) -> Result<ObjectId, SignError> {
    let pages = doc.get_pages();
    let number = u32::try_from(index + 1).map_err(|_| SignError::PageIndex {
        index,
        page_count: pages.len(),
    })?;
    pages.get(&number).copied().ok_or(SignError::PageIndex {
        index,
        page_count: pages.len(),
    })
}

/// Read a page's size in points from its MediaBox, following the Parent
/// chain when the box is inherited. Falls back to US Letter when absent,
/// matching common viewer behavior.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize, SignError> {
    let page_dict = doc.get_dictionary(page_id).map_err(SignError::DocumentLoad)?;
    let media_box = resolve_media_box(doc, page_dict).unwrap_or([0.0, 0.0, 612.0, 792.0]);
    Ok(PageSize {
        width: media_box[2] - media_box[0],
        height: media_box[3] - media_box[1],
    })
}

/// Page trees are shallow in practice; anything deeper than this is a
/// malformed document, including Parent reference cycles.
const MAX_PAGE_TREE_DEPTH: usize = 32;

fn resolve_media_box(doc: &Document, page_dict: &lopdf::Dictionary) -> Option<[f64; 4]> {
    let mut dict = page_dict.clone();
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(array) = dict.get(b"MediaBox").and_then(|obj| obj.as_array()) {
            return parse_box_array(array);
        }
        let parent_id = dict.get(b"Parent").and_then(|obj| obj.as_reference()).ok()?;
        dict = doc.get_dictionary(parent_id).ok()?.clone();
    }
    None
}

fn parse_box_array(array: &[Object]) -> Option<[f64; 4]> {
    if array.len() != 4 {
        return None;
    }
    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => return None,
        };
    }
    Some(result)
}

/// Draw the signature image onto `page_id` at the computed placement.
///
/// Splits the RGBA raster into a zlib-compressed RGB stream plus a gray
/// SMask stream for the alpha channel, registers the XObject in the page
/// resources under a name derived from its object id, and appends a
/// `q cm Do Q` content stream so existing page content is preserved.
pub fn draw_signature(
    doc: &mut Document,
    page_id: ObjectId,
    signature: &SignatureImage,
    placement: &Placement,
) -> Result<(), SignError> {
    let pixels = signature.pixels();
    let (width, height) = pixels.dimensions();

    let mut rgb_buf = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha_buf = Vec::with_capacity((width * height) as usize);
    for pixel in pixels.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb_buf.extend_from_slice(&[r, g, b]);
        alpha_buf.push(a);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha_buf)?,
    ));

    let xobject_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        deflate(&rgb_buf)?,
    ));

    let name = format!("Sig{}", xobject_id.0);

    {
        let page = doc.get_object_mut(page_id).map_err(SignError::DocumentLoad)?;
        let dict = page.as_dict_mut().map_err(SignError::DocumentLoad)?;

        if !dict.has(b"Resources") {
            dict.set("Resources", Object::Dictionary(dictionary! {}));
        }
        let resources = dict
            .get_mut(b"Resources")
            .and_then(|obj| obj.as_dict_mut())
            .map_err(SignError::DocumentLoad)?;
        if !resources.has(b"XObject") {
            resources.set("XObject", Object::Dictionary(dictionary! {}));
        }
        let xobjects = resources
            .get_mut(b"XObject")
            .and_then(|obj| obj.as_dict_mut())
            .map_err(SignError::DocumentLoad)?;
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));
    }

    let draw_ops = format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        placement.size.width, placement.size.height, placement.position.x, placement.position.y, name
    );
    let stream_id = doc.add_object(Stream::new(dictionary! {}, draw_ops.into_bytes()));

    {
        let page = doc.get_object_mut(page_id).map_err(SignError::DocumentLoad)?;
        let dict = page.as_dict_mut().map_err(SignError::DocumentLoad)?;

        let new_contents = match dict.remove(b"Contents") {
            Some(Object::Reference(existing)) => Object::Array(vec![
                Object::Reference(existing),
                Object::Reference(stream_id),
            ]),
            Some(Object::Array(mut array)) => {
                array.push(Object::Reference(stream_id));
                Object::Array(array)
            }
            _ => Object::Reference(stream_id),
        };
        dict.set("Contents", new_contents);
    }

    Ok(())
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Dictionary;

    fn insert_dict(doc: &mut Document, id: ObjectId, entries: Vec<(&str, Object)>) {
        doc.objects
            .insert(id, Object::Dictionary(Dictionary::from_iter(entries)));
    }

    fn box_array(x0: i64, y0: i64, x1: i64, y1: i64) -> Object {
        Object::Array(vec![
            Object::Integer(x0),
            Object::Integer(y0),
            Object::Integer(x1),
            Object::Integer(y1),
        ])
    }

    #[test]
    fn media_box_is_inherited_from_parent() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.new_object_id();
        let pages_id = doc.new_object_id();

        insert_dict(
            &mut doc,
            page_id,
            vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
            ],
        );
        insert_dict(
            &mut doc,
            pages_id,
            vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("MediaBox", box_array(0, 0, 595, 842)),
            ],
        );

        let size = page_size(&doc, page_id).unwrap();
        assert_eq!(
            size,
            PageSize {
                width: 595.0,
                height: 842.0
            }
        );
    }

    #[test]
    fn cyclic_parent_chain_falls_back_to_letter_size() {
        // Two nodes naming each other as Parent, neither with a MediaBox.
        // The walk must terminate and fall back instead of spinning.
        let mut doc = Document::with_version("1.7");
        let page_id = doc.new_object_id();
        let pages_id = doc.new_object_id();

        insert_dict(
            &mut doc,
            page_id,
            vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
            ],
        );
        insert_dict(
            &mut doc,
            pages_id,
            vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Parent", Object::Reference(page_id)),
            ],
        );

        let size = page_size(&doc, page_id).unwrap();
        assert_eq!(
            size,
            PageSize {
                width: 612.0,
                height: 792.0
            }
        );
    }
}
