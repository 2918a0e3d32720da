use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::layout::{
    encode_win_ansi, paginate, PlacedLine, BODY_FONT_SIZE, BODY_TOP, BODY_TOP_BELOW_IMAGE,
    IMAGE_BOX, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH, TITLE_FONT_SIZE, TITLE_Y,
};

const BODY_FONT: &str = "F1";
const TITLE_FONT: &str = "F2";
const IMAGE_NAME: &str = "Im1";

/// A baseline JPEG ready to embed with `DCTDecode`.
pub(crate) struct JpegImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn int(value: i64) -> Object {
    Object::Integer(value)
}

fn text_operations(font: &str, size: i64, x: i64, y: i64, text: Vec<u8>) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), int(size)]),
        Operation::new("Td", vec![int(x), int(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn image_operations(width: u32, height: u32) -> Vec<Operation> {
    let placement = IMAGE_BOX.fit(width, height);
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                int(placement.width),
                int(0),
                int(0),
                int(placement.height),
                int(placement.x),
                int(placement.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn body_operations(lines: Vec<PlacedLine>) -> Vec<Operation> {
    lines
        .into_iter()
        .filter(|line| !line.text.is_empty())
        .flat_map(|line| text_operations(BODY_FONT, BODY_FONT_SIZE, MARGIN_X, line.y, line.text))
        .collect()
}

/// Builds the story document: title, optional illustration, then the
/// wrapped and paginated body.
pub(crate) fn build_document(
    title: &str,
    body: &str,
    image: Option<&JpegImage>,
) -> Result<Document, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let title_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = dictionary! {
        "Font" => dictionary! {
            BODY_FONT => body_font_id,
            TITLE_FONT => title_font_id,
        },
    };

    if let Some(image) = image {
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => int(i64::from(image.width)),
                "Height" => int(i64::from(image.height)),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => int(8),
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        );
        let image_id = doc.add_object(image_stream);
        resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
    }
    let resources_id = doc.add_object(resources);

    let first_top = if image.is_some() {
        BODY_TOP_BELOW_IMAGE
    } else {
        BODY_TOP
    };

    let mut kids: Vec<Object> = Vec::new();
    for (index, lines) in paginate(body, first_top).into_iter().enumerate() {
        let mut operations = Vec::new();
        if index == 0 {
            operations.extend(text_operations(
                TITLE_FONT,
                TITLE_FONT_SIZE,
                MARGIN_X,
                TITLE_Y,
                encode_win_ansi(title),
            ));
            if let Some(image) = image {
                operations.extend(image_operations(image.width, image.height));
            }
        }
        operations.extend(body_operations(lines));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = add_page(&mut doc, pages_id, content_id);
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => int(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![int(0), int(0), int(PAGE_WIDTH), int(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content_id: ObjectId) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}
