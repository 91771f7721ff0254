mod common;

use common::{Bytes, v17_file};
use kenshi_core::{ErrorCode, FileType, ModError, ModFile, ModHeader, ValidationFinding};

fn full_details() -> Bytes {
    Bytes::new()
        .str("author")
        .str("description")
        .str("gamedata.base,rebirth.mod")
        .str("Dialogue.mod")
        .u32(12)
        .u32(34)
        .u8(1)
        .str("merged.mod")
        .u32(5)
        .u32(6)
        .u8(1)
        .str("request")
        .u32(7)
        .str("10-gone.mod")
}

#[test]
fn fully_structured_details_have_no_tail() {
    let bytes = v17_file(&full_details().build(), &[]);
    let file = ModFile::from_bytes(&bytes, "test.mod").expect("parse");
    let header = &file.header;

    assert_eq!(header.author.as_deref(), Some("author"));
    assert_eq!(file.dependencies(), vec!["gamedata.base", "rebirth.mod"]);
    assert_eq!(file.references(), vec!["Dialogue.mod"]);
    assert_eq!(header.save_count, Some(12));
    assert_eq!(header.last_merge, Some(34));
    let merges = header.merge_entries.as_ref().expect("merge entries");
    assert_eq!(merges["merged.mod"].save_count, 5);
    let deletes = header.delete_requests.as_ref().expect("delete requests");
    assert_eq!(deletes["request"].target, "10-gone.mod");
    assert!(header.details_tail.is_empty());

    assert_eq!(file.to_bytes().expect("emit"), bytes);
}

#[test]
fn undecodable_suffix_is_kept_as_opaque_tail() {
    // A string length pointing far past the end of the blob.
    let details = Bytes::new()
        .str("author")
        .str("description")
        .i32(5000)
        .raw(&[1, 2, 3])
        .build();
    let bytes = v17_file(&details, &[]);
    let file = ModFile::from_bytes(&bytes, "test.mod").expect("details failures are recovered");

    assert_eq!(file.header.author.as_deref(), Some("author"));
    assert_eq!(file.header.description.as_deref(), Some("description"));
    assert_eq!(file.header.dependencies, None);
    assert_eq!(file.header.save_count, None);
    assert_eq!(file.header.details_tail.len(), 7);
    assert!(
        file.validate()
            .contains(&ValidationFinding::UnparsedDetailsTail { len: 7 })
    );

    assert_eq!(file.to_bytes().expect("emit"), bytes);
}

#[test]
fn every_truncation_point_round_trips() {
    let details = full_details().build();
    for cut in 0..=details.len() {
        let bytes = v17_file(&details[..cut], &[]);
        let file = ModFile::from_bytes(&bytes, "test.mod")
            .unwrap_or_else(|e| panic!("cut at {cut} failed to parse: {e}"));
        assert_eq!(
            file.to_bytes().expect("emit"),
            bytes,
            "cut at {cut} did not round-trip"
        );
    }
}

#[test]
fn invalid_utf8_stops_details_parsing() {
    let details = Bytes::new().str("ok").i32(2).raw(&[0xff, 0xfe]).build();
    let bytes = v17_file(&details, &[]);
    let file = ModFile::from_bytes(&bytes, "test.mod").expect("parse");
    assert_eq!(file.header.author.as_deref(), Some("ok"));
    assert_eq!(file.header.description, None);
    assert_eq!(file.header.details_tail, details[6..].to_vec());
    assert_eq!(file.to_bytes().expect("emit"), bytes);
}

#[test]
fn adding_a_dependency_rebuilds_the_blob() {
    let details = Bytes::new().str("me").build();
    let mut file = ModFile::from_bytes(&v17_file(&details, &[]), "test.mod").expect("parse");
    file.add_dependencies(&["gamedata.base", "gamedata.base"]);

    let reparsed = ModFile::from_bytes(&file.to_bytes().expect("emit"), "test.mod").expect("reparse");
    assert_eq!(reparsed.header.author.as_deref(), Some("me"));
    assert_eq!(reparsed.header.description.as_deref(), Some(""));
    assert_eq!(reparsed.dependencies(), vec!["gamedata.base"]);
    assert_eq!(reparsed.header.references, None);
}

#[test]
fn empty_v17_header_writes_empty_details() {
    let file = ModFile::new("fresh.mod", ModHeader::new(FileType::V17, 2));
    let bytes = file.to_bytes().expect("emit");
    let expected = Bytes::new().i32(17).i32(0).i32(2).i32(0).build();
    assert_eq!(bytes, expected);
}

#[test]
fn format_16_refuses_details_only_values() {
    let mut header = ModHeader::new(FileType::V16, 1);
    header.save_count = Some(3);
    let file = ModFile::new("old.mod", header);

    let err = file.to_bytes().expect_err("format 16 cannot store a save count");
    assert_eq!(err.code(), ErrorCode::UnsupportedOperation);
    assert!(matches!(err, ModError::Unsupported(_)));

    let plain = ModFile::new("old.mod", ModHeader::new(FileType::V16, 1));
    assert!(plain.to_bytes().is_ok());
}
