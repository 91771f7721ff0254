use kenshi_core::{ChangeStatus, FileType, RecordStatus};
use proptest::prelude::*;

const COUNTER_BITS: i32 = 0xFFFF << 4;

proptest! {
    #[test]
    fn is_new_tracks_bit_zero_only(raw in any::<i32>()) {
        prop_assert_eq!(ChangeStatus::from_raw(raw).is_new(), raw & 1 == 0);
    }

    #[test]
    fn set_change_counter_clamps_and_preserves_other_bits(raw in any::<i32>(), n in any::<i32>()) {
        let mut status = ChangeStatus::from_raw(raw);
        status.set_change_counter(n);

        prop_assert_eq!(status.change_counter(), n.clamp(0, 65535));
        prop_assert_eq!(status.raw() & !COUNTER_BITS, raw & !COUNTER_BITS);
        prop_assert_eq!(status.is_new(), raw & 1 == 0);
    }

    #[test]
    fn add_to_change_counter_saturates(raw in any::<i32>(), delta in any::<i32>()) {
        let mut status = ChangeStatus::from_raw(raw);
        let before = i64::from(status.change_counter());
        status.add_to_change_counter(delta);

        let expected = (before + i64::from(delta)).clamp(0, 65535) as i32;
        prop_assert_eq!(status.change_counter(), expected);
        prop_assert_eq!(status.raw() & !COUNTER_BITS, raw & !COUNTER_BITS);
    }

    #[test]
    fn set_record_status_touches_only_the_status_nibble(raw in any::<i32>()) {
        for file_type in [FileType::V16, FileType::V17] {
            for wanted in [RecordStatus::Existing, RecordStatus::New, RecordStatus::NameChanged] {
                let mut status = ChangeStatus::from_raw(raw);
                status.set_record_status(file_type, wanted);
                prop_assert_eq!(status.raw() & !0xF, raw & !0xF);
            }
        }
    }
}

#[test]
fn known_status_words_decode() {
    let created_v17 = ChangeStatus::from_raw(0x20);
    assert!(created_v17.is_new());
    assert_eq!(created_v17.change_counter(), 2);
    assert!(created_v17.matches_assumptions(FileType::V17));
    assert!(created_v17.has_new_code(FileType::V17));

    let created_v16 = ChangeStatus::from_raw(0x8000_0002_u32 as i32);
    assert!(created_v16.is_new());
    assert_eq!(created_v16.status_code(), 0b0010);
    assert_eq!(created_v16.reserved_bits(), 0x800);
    assert!(created_v16.matches_assumptions(FileType::V16));
    assert!(!created_v16.matches_assumptions(FileType::V17));
}

#[test]
fn name_changed_is_refused_while_new() {
    let mut status = ChangeStatus::from_raw(0x20);
    status.set_record_status(FileType::V17, RecordStatus::NameChanged);
    assert_eq!(status.raw(), 0x20);

    status.set_record_status(FileType::V17, RecordStatus::Existing);
    status.set_record_status(FileType::V17, RecordStatus::NameChanged);
    assert!(status.is_name_changed());
    assert!(!status.is_new());
    assert_eq!(status.change_counter(), 2);
}

#[test]
fn reserved_bits_survive_edits() {
    let raw = 0x7AB0_0021_u32 as i32;
    let mut status = ChangeStatus::from_raw(raw);
    assert!(!status.matches_assumptions(FileType::V17));

    status.add_to_change_counter(5);
    status.set_record_status(FileType::V17, RecordStatus::Existing);
    assert_eq!(status.reserved_bits(), 0x7AB);
    assert_eq!(status.change_counter(), 7);
}

#[test]
fn status_names_parse_case_insensitively() {
    assert_eq!("Existing".parse::<RecordStatus>().expect("existing"), RecordStatus::Existing);
    assert_eq!("NAMECHANGED".parse::<RecordStatus>().expect("namechanged"), RecordStatus::NameChanged);
    assert!("gone".parse::<RecordStatus>().is_err());
}

#[test]
fn describe_mentions_counter_and_state() {
    let text = ChangeStatus::from_raw(0x31).describe();
    assert!(text.contains("Change Counter: 3"), "{text}");
    assert!(text.contains("Existing"), "{text}");
}
