mod common;

use common::{EXISTING_V17, FieldSet, NEW_V17, NO_FIELDS, record_bytes, v17_file};
use kenshi_core::core_api::{ContextConfig, ModContext, merge_records};
use kenshi_core::types::DELETED_TRIPLE;
use kenshi_core::{ErrorCode, FieldValue, ModError, ModFile, Record, RecordType};

const CHARACTER: i32 = 1;

fn file(name: &str, records: &[Vec<u8>]) -> ModFile {
    ModFile::from_bytes(&v17_file(&[], records), name).expect("fixture parses")
}

fn creator_and_patch() -> (ModFile, ModFile) {
    let a = file(
        "a.mod",
        &[record_bytes(
            CHARACTER,
            "Guard",
            "10-a.mod",
            NEW_V17,
            &FieldSet {
                ints: &[("x", 1)],
                extra: &[("items", &[("5-base.mod", [1, 0, 0])])],
                ..NO_FIELDS
            },
        )],
    );
    let b = file(
        "b.mod",
        &[record_bytes(
            CHARACTER,
            "Guard",
            "10-a.mod",
            EXISTING_V17,
            &FieldSet {
                ints: &[("x", 2), ("y", 5)],
                extra: &[("items", &[("5-base.mod", DELETED_TRIPLE), ("6-base.mod", [2, 0, 0])])],
                ..NO_FIELDS
            },
        )],
    );
    (a, b)
}

fn context(files: impl IntoIterator<Item = ModFile>) -> ModContext {
    let mut ctx = ModContext::new();
    for f in files {
        assert!(ctx.add_or_update(f));
    }
    ctx
}

#[test]
fn later_layer_wins_per_field() {
    let (a, b) = creator_and_patch();
    let ctx = context([a, b]);

    let merged = ctx.merge::<&str>(None, RecordType::CHARACTER, None, None);
    assert_eq!(merged.len(), 1);
    let m = &merged[0];
    assert_eq!(m.owner, "a.mod");
    assert_eq!(m.record.string_id, "10-a.mod");
    assert_eq!(m.record.field("x"), Some(FieldValue::Int(2)));
    assert_eq!(m.record.field("y"), Some(FieldValue::Int(5)));
    assert!(m.record.is_new());
}

#[test]
fn retyped_field_moves_to_its_new_container() {
    let a = file(
        "a.mod",
        &[record_bytes(
            CHARACTER,
            "Guard",
            "10-a.mod",
            NEW_V17,
            &FieldSet {
                ints: &[("x", 1)],
                ..NO_FIELDS
            },
        )],
    );
    let b = file(
        "b.mod",
        &[record_bytes(
            CHARACTER,
            "Guard",
            "10-a.mod",
            EXISTING_V17,
            &FieldSet {
                floats: &[("x", 2.5)],
                ..NO_FIELDS
            },
        )],
    );

    let merged = merge_records([&a, &b], RecordType::CHARACTER);
    let record = &merged["10-a.mod"].record;
    assert!(!record.int_fields.contains_key("x"));
    assert_eq!(record.float_fields.get("x"), Some(&2.5));
    assert_eq!(record.field("x"), Some(FieldValue::Float(2.5)));
    assert_eq!(record.all_field_names(), vec!["x"]);
}

#[test]
fn layers_of_one_record_are_the_same_record() {
    let (a, b) = creator_and_patch();
    let creator = &a.records()[0];
    let patch = &b.records()[0];
    assert!(creator.same_record(patch));

    let other = Record::new(RecordType::CHARACTER, "Guard", "11-a.mod");
    assert!(!creator.same_record(&other), "same name, different StringId");
}

#[test]
fn changed_fields_tags_each_container() {
    let (_, b) = creator_and_patch();
    let tags: Vec<String> = b.records()[0].changed_fields().into_iter().collect();
    assert_eq!(tags, vec!["extradata:items", "long:x", "long:y"]);

    let mut record = Record::new(RecordType::CHARACTER, "Guard", "10-a.mod");
    record.insert_field("unique", FieldValue::Bool(true));
    record.insert_field("scale", FieldValue::Float(1.5));
    record.insert_field("offset", FieldValue::Vec3([0.0, 1.0, 0.0]));
    let tags = record.changed_fields();
    assert!(tags.contains("bool:unique"));
    assert!(tags.contains("float:scale"));
    assert!(tags.contains("vec3:offset"));

    record.insert_field("scale", FieldValue::Int(2));
    let tags = record.changed_fields();
    assert!(tags.contains("long:scale"));
    assert!(!tags.contains("float:scale"));
}

#[test]
fn tombstone_merges_over_active_association() {
    let (a, b) = creator_and_patch();
    let ctx = context([a, b]);

    let merged = ctx.merge::<&str>(None, RecordType::CHARACTER, None, None);
    let record = &merged[0].record;
    assert_eq!(record.extra_data_value("items", "5-base.mod"), Some(DELETED_TRIPLE));
    assert!(!record.has_active_extra_data("items", "5-base.mod"));
    assert!(record.has_active_extra_data("items", "6-base.mod"));
    assert_eq!(record.extra_data("items").map(|c| c.len()), Some(2));
}

#[test]
fn sources_are_not_mutated() {
    let (a, b) = creator_and_patch();
    let ctx = context([a, b]);
    ctx.merge::<&str>(None, RecordType::CHARACTER, None, None);

    let original = &ctx.get("a.mod").expect("a loaded").records()[0];
    assert_eq!(original.field("x"), Some(FieldValue::Int(1)));
    assert!(original.field("y").is_none());
}

#[test]
fn group_without_creator_is_dropped() {
    let orphan = file(
        "c.mod",
        &[record_bytes(CHARACTER, "Ghost", "99-missing.mod", EXISTING_V17, &NO_FIELDS)],
    );
    let ctx = context([orphan]);
    assert!(ctx.merge::<&str>(None, RecordType::CHARACTER, None, None).is_empty());
}

#[test]
fn non_creator_layers_apply_in_enumeration_order() {
    let (a, b) = creator_and_patch();
    let c = file(
        "c.mod",
        &[record_bytes(
            CHARACTER,
            "Guard",
            "10-a.mod",
            EXISTING_V17,
            &FieldSet {
                ints: &[("x", 3)],
                ..NO_FIELDS
            },
        )],
    );
    let ctx = context([a, b, c]);

    let forward = ctx.merge(Some(&["a.mod", "b.mod", "c.mod"][..]), RecordType::CHARACTER, None, None);
    assert_eq!(forward[0].record.field("x"), Some(FieldValue::Int(3)));

    let reversed = ctx.merge(Some(&["c.mod", "b.mod", "a.mod"][..]), RecordType::CHARACTER, None, None);
    assert_eq!(reversed[0].record.field("x"), Some(FieldValue::Int(2)));
    assert_eq!(reversed[0].owner, "a.mod");
}

#[test]
fn filter_and_limit_apply_to_merged_records() {
    let records: Vec<Vec<u8>> = (10..15)
        .map(|n| record_bytes(CHARACTER, &format!("npc{n}"), &format!("{n}-a.mod"), NEW_V17, &NO_FIELDS))
        .collect();
    let ctx = context([file("a.mod", &records)]);

    let keep_odd = |r: &Record| r.name.ends_with(['1', '3']);
    let merged = ctx.merge::<&str>(None, RecordType::CHARACTER, Some(&keep_odd), None);
    assert_eq!(merged.len(), 2);

    let limited = ctx.merge::<&str>(None, RecordType::CHARACTER, None, Some(3));
    let names: Vec<_> = limited.iter().map(|m| m.record.name.as_str()).collect();
    assert_eq!(names, vec!["npc10", "npc11", "npc12"]);
}

#[test]
fn merge_cache_needs_explicit_clear() {
    let (a, b) = creator_and_patch();
    let mut ctx = context([a]);
    assert_eq!(
        ctx.all_records_merged(RecordType::CHARACTER)["10-a.mod"].record.field("x"),
        Some(FieldValue::Int(1))
    );

    ctx.add_or_update(b);
    assert_eq!(
        ctx.all_records_merged(RecordType::CHARACTER)["10-a.mod"].record.field("x"),
        Some(FieldValue::Int(1)),
        "stale until cleared"
    );

    ctx.clear_merge_cache();
    assert_eq!(
        ctx.all_records_merged(RecordType::CHARACTER)["10-a.mod"].record.field("x"),
        Some(FieldValue::Int(2))
    );
    assert!(ctx.has_merged_record(RecordType::CHARACTER, "10-a.mod"));
    assert!(!ctx.has_merged_record(RecordType::WEAPON, "10-a.mod"));
}

#[test]
fn ignored_mods_are_refused() {
    let mut ctx = ModContext::with_config(ContextConfig::default());
    let fixer = file("-KenshiFixer_Fix-.mod", &[]);
    assert!(!ctx.add_or_update(fixer));
    assert!(ctx.is_empty());
}

#[test]
fn record_evolution_lists_each_layer() {
    let (a, b) = creator_and_patch();
    let ctx = context([a, b]);
    let layers = ctx.record_evolution("10-a.mod").expect("record is loaded");
    let names: Vec<_> = layers.iter().map(|l| l.mod_name).collect();
    assert_eq!(names, vec!["a.mod", "b.mod"]);

    let err = ctx.record_evolution("nope").expect_err("no file has it");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(matches!(err, ModError::RecordNotFound(id) if id == "nope"));
}

#[test]
fn selectors_include_or_exclude() {
    let ctx = context([file("a.mod", &[]), file("b.mod", &[]), file("c,d.mod", &[])]);
    let names = |sel: &str| -> Vec<String> {
        ctx.select_mods(sel).iter().map(|f| f.name.clone()).collect()
    };

    assert_eq!(names("all"), vec!["a.mod", "b.mod", "c,d.mod"]);
    assert_eq!(names("c,d.mod,a.mod"), vec!["a.mod", "c,d.mod"]);
    assert_eq!(names("*b.mod"), vec!["a.mod", "c,d.mod"]);
}

#[test]
fn assumed_requirements_come_from_base_mods() {
    let base = file(
        "gamedata.base",
        &[
            record_bytes(CHARACTER, "A", "1-gamedata.base", NEW_V17, &NO_FIELDS),
            record_bytes(CHARACTER, "B", "2-gamedata.base", NEW_V17, &NO_FIELDS),
            record_bytes(CHARACTER, "C", "3-rebirth.mod", NEW_V17, &NO_FIELDS),
        ],
    );
    let other = file(
        "other.mod",
        &[record_bytes(CHARACTER, "D", "1-other.mod", NEW_V17, &NO_FIELDS)],
    );
    let ctx = context([base, other]);
    assert_eq!(
        ctx.assumed_required_records(),
        vec!["gamedata.base", "rebirth.mod"]
    );
}
