use super::*;
use crate::SahayError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a small PDF where each entry of `page_texts` becomes one page.
fn write_test_pdf(dir: &TempDir, page_texts: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count =
        i64::try_from(page_texts.len()).expect("page count should fit in i64");
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.path().join("test.pdf");
    doc.save(&path).expect("should save test pdf");
    path
}

#[test]
fn missing_file_is_a_document_read_error() {
    let result = load_pdf_pages(Path::new("/nonexistent/nowhere.pdf"));

    assert!(matches!(result, Err(SahayError::DocumentRead(_))));
    let message = result.expect_err("should fail").to_string();
    assert!(message.contains("not found"));
}

#[test]
fn garbage_bytes_are_a_document_read_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("not_a.pdf");
    std::fs::write(&path, b"this is definitely not a pdf").expect("should write file");

    assert!(matches!(
        load_pdf_pages(&path),
        Err(SahayError::DocumentRead(_))
    ));
}

#[test]
fn extracts_pages_in_order() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_test_pdf(
        &temp_dir,
        &["The scheme pays benefits yearly", "Eligibility rules follow"],
    );

    let pages = load_pdf_pages(&path).expect("extraction should succeed");

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[1].page_number, 2);
    assert!(pages[0].text.contains("The scheme pays benefits yearly"));
    assert!(pages[1].text.contains("Eligibility rules follow"));
}
