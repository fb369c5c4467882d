use portrait_bundle::structured::{self, Value};
use portrait_bundle::{
    export, Bundle, Category, ExportError, ExportObserver, LogObserver, Payload, PortraitSet,
    Record, RecordIssue, SequentialIdGenerator, Writer,
};

const DDS_HEADER: &[u8] = &[0x44, 0x44, 0x53, 0x20, 0x7C, 0x00, 0x00, 0x00];

#[derive(Default)]
struct Collect(Vec<RecordIssue>);

impl ExportObserver for Collect {
    fn on_validation_error(&mut self, issues: &[RecordIssue]) {
        self.0.extend_from_slice(issues);
    }
}

#[test]
fn single_human_portrait_produces_three_files() {
    let records = vec![Record::new("aaaaaaaaaa")
        .with_category("HUMAN")
        .with_payload(Payload::from_bytes(DDS_HEADER))];

    let entries = export(&records, &mut LogObserver).expect("export failed");
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "common/portrait_sets/0_portrait_sets.txt",
            "gfx/models/portraits/aaaaaaaaaa/aaaaaaaaaa.dds",
            "gfx/portraits/portraits/aaaaaaaaaa.txt",
        ]
    );
    assert_eq!(entries[1].as_bytes(), DDS_HEADER);

    // humans -> portraits -> "aaaaaaaaaa"
    let manifest = structured::parse(entries[0].as_text().unwrap()).unwrap();
    let humans = manifest.get("humans").and_then(Value::as_mapping).unwrap();
    assert_eq!(humans.get("species_class").and_then(Value::as_str), Some("HUMAN"));
    let portraits = humans.get("portraits").and_then(Value::as_sequence).unwrap();
    assert_eq!(portraits, &[Value::from("aaaaaaaaaa")]);
}

#[test]
fn portrait_config_lists_every_group() {
    let records = vec![Record::new("abc").with_payload(Payload::from_bytes(DDS_HEADER))];
    let entries = export(&records, &mut LogObserver).unwrap();
    let config = structured::parse(entries[2].as_text().unwrap()).unwrap();

    let texture = config
        .get("portraits")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("abc"))
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("texturefile"))
        .and_then(Value::as_str);
    assert_eq!(texture, Some("gfx/models/portraits/abc/abc.dds"));

    let group = config
        .get("portrait_groups")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("abc"))
        .and_then(Value::as_mapping)
        .unwrap();
    assert_eq!(group.get("default").and_then(Value::as_str), Some("abc"));
    for name in ["game_setup", "species", "leader", "ruler"] {
        let added = group
            .get(name)
            .and_then(Value::as_mapping)
            .and_then(|m| m.get("add"))
            .and_then(Value::as_mapping)
            .and_then(|m| m.get("portraits"))
            .and_then(Value::as_sequence)
            .unwrap_or_else(|| panic!("missing group {}", name));
        assert_eq!(added, &[Value::from("abc")]);
    }
}

#[test]
fn every_missing_image_is_reported() {
    let mut ids = SequentialIdGenerator::new("p");
    let mut set = PortraitSet::new();
    let first = set.create(&mut ids).unwrap();
    let second = set.create(&mut ids).unwrap();
    let third = set.create(&mut ids).unwrap();
    set.attach_payload(&second, DDS_HEADER).unwrap();

    let mut observer = Collect::default();
    match export(set.records(), &mut observer) {
        Err(ExportError::MissingPayload(issues)) => {
            let ids: Vec<_> = issues.iter().map(|i| i.record_id.clone()).collect();
            assert_eq!(ids, vec![first.clone(), third.clone()]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(observer.0.len(), 2);
}

#[test]
fn session_to_directory_bundle() {
    let mut ids = SequentialIdGenerator::new("portrait");
    let mut set = PortraitSet::new();
    for category in [Category::Human, Category::Avian, Category::Human] {
        let id = set.create(&mut ids).unwrap();
        set.set_category(&id, category).unwrap();
        set.attach_payload(&id, DDS_HEADER).unwrap();
    }

    let entries = export(set.records(), &mut LogObserver).unwrap();
    assert_eq!(entries.len(), 7);

    let manifest = entries[0].as_text().unwrap();
    let expected = Writer::compact()
        .encode_to_string(&structured::parse(manifest).unwrap())
        .unwrap();
    assert_eq!(
        expected,
        concat!(
            r#"humans={species_class="HUMAN" portraits={"portrait0" "portrait2"}} "#,
            r#"avians={species_class="AVIAN" portraits={"portrait1"}}"#,
        )
    );

    let dir = tempfile::tempdir().unwrap();
    Bundle::from_entries(entries.clone()).unwrap().write_to_dir(dir.path()).unwrap();
    let read = Bundle::read_dir(dir.path()).unwrap();
    assert_eq!(read.len(), entries.len());
    for entry in &entries {
        assert_eq!(read.get(&entry.path).unwrap(), entry);
    }
}

#[test]
fn txtar_bundle_round_trip() {
    let records = vec![
        Record::new("abc").with_category("LITHOID").with_payload(Payload::from_bytes(DDS_HEADER)),
        Record::new("xyz").with_category("PSIONIC").with_payload(Payload::from_bytes(&[0xFF; 64])),
    ];
    let entries = export(&records, &mut LogObserver).unwrap();
    let bundle = Bundle::from_entries(entries).unwrap();

    let decoded = Bundle::decode(&bundle.encode()).unwrap();
    assert_eq!(decoded, bundle);
    assert!(decoded.get("gfx/models/portraits/xyz/xyz.dds").unwrap().is_binary());
}

#[test]
fn ids_that_are_not_safe_path_segments_are_refused() {
    for bad in ["", "a b", "a.txt/x", "../up"] {
        let records = vec![
            Record::new("abc").with_category("HUMAN").with_payload(Payload::from_bytes(DDS_HEADER)),
            Record::new(bad).with_category("HUMAN").with_payload(Payload::from_bytes(DDS_HEADER)),
        ];
        match export(&records, &mut LogObserver) {
            Err(ExportError::InvalidId { id }) => assert_eq!(id, bad),
            other => panic!("unexpected result for {:?}: {:?}", bad, other),
        }

        let mut set = PortraitSet::new();
        assert!(matches!(set.insert(Record::new(bad)), Err(ExportError::InvalidId { .. })));
    }
}

#[test]
fn commented_txtar_bundle_round_trip() {
    let records = vec![Record::new("abc")
        .with_category("AQUATIC")
        .with_payload(Payload::from_bytes(DDS_HEADER))];
    let mut bundle = Bundle::with_comment("Stellaris portraits\n\nbuilt from list.json");
    for entry in export(&records, &mut LogObserver).unwrap() {
        bundle.add(entry).unwrap();
    }

    let decoded = Bundle::decode(&bundle.encode()).unwrap();
    assert_eq!(decoded, bundle);
    assert!(!decoded.get("gfx/portraits/portraits/abc.txt").unwrap().is_binary());
}
