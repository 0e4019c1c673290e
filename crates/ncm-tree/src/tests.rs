//! Engine tests over a small device schema.

use once_cell::sync::Lazy;
use rstest::{fixture, rstest};

use crate::{
    Changes, Field, FieldsBuilder, KeyedList, ListEntry, Node, PathSegment, Scope, Tracked,
    TreeError, ValueError, impl_tracked, parse_path, process_node, put_node,
};

// ---- Schema -------------------------------------------------------------

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<String>,
    fail_on: Option<&'static str>,
}

impl Recorder {
    fn record(&mut self, event: impl Into<String>) -> Result<(), String> {
        let event = event.into();
        let failed = self.fail_on.is_some_and(|target| event.starts_with(target));
        self.events.push(event.clone());
        if failed {
            return Err(format!("{event} failed"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Device {
    changes: Changes,
    name: String,
    config: DeviceConfig,
    ports: KeyedList<Port>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct DeviceConfig {
    changes: Changes,
    hostname: String,
    mtu: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Port {
    changes: Changes,
    slot: u8,
    lane: u8,
    enabled: bool,
}

impl_tracked!(Device, DeviceConfig, Port);

impl Node for Device {
    type Processor = Recorder;
    type Error = String;

    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<Device>>> = Lazy::new(|| {
            FieldsBuilder::new()
                .key("name")
                .notify(|device: &Device, p: &mut Recorder, _: &Scope| {
                    p.record(format!("name:{}", device.name))
                })
                .node("config", |d: &Device| &d.config, |d: &mut Device| &mut d.config)
                .notify(|_: &Device, p: &mut Recorder, scope: &Scope| {
                    p.record(format!("config:{scope}"))
                })
                .list("ports", |d: &Device| &d.ports, |d: &mut Device| &mut d.ports)
                .notify(|_: &Device, p: &mut Recorder, _: &Scope| p.record("ports"))
                .build()
        });
        &FIELDS
    }
}

impl ListEntry for Device {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment.require_attr("device", "name").map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            name: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for DeviceConfig {
    type Processor = Recorder;
    type Error = String;

    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<DeviceConfig>>> = Lazy::new(|| {
            FieldsBuilder::new()
                .leaf("hostname", |c: &mut DeviceConfig, v: &str| {
                    if v.is_empty() {
                        return Err(ValueError::new("empty hostname"));
                    }
                    c.hostname = v.to_owned();
                    Ok(())
                })
                .notify(|c: &DeviceConfig, p: &mut Recorder, _: &Scope| {
                    p.record(format!("hostname:{}", c.hostname))
                })
                .leaf("mtu", |c: &mut DeviceConfig, v: &str| {
                    c.mtu = v.parse()?;
                    Ok(())
                })
                .notify(|c: &DeviceConfig, p: &mut Recorder, _: &Scope| {
                    p.record(format!("mtu:{}", c.mtu))
                })
                .build()
        });
        &FIELDS
    }
}

impl Node for Port {
    type Processor = Recorder;
    type Error = String;

    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<Port>>> = Lazy::new(|| {
            FieldsBuilder::new()
                .key("slot")
                .key("lane")
                .trigger(&["slot", "lane"])
                .notify(|_: &Port, p: &mut Recorder, scope: &Scope| {
                    p.record(format!("port:{scope}"))
                })
                .leaf("enabled", |port: &mut Port, v: &str| {
                    port.enabled = v.parse()?;
                    Ok(())
                })
                .notify(|port: &Port, p: &mut Recorder, scope: &Scope| {
                    p.record(format!("enabled:{}:{}", scope.last(), port.enabled))
                })
                .build()
        });
        &FIELDS
    }
}

impl ListEntry for Port {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        let slot = segment.require_attr("port", "slot")?;
        let lane = segment.require_attr("port", "lane")?;
        for (field, value) in [("slot", slot), ("lane", lane)] {
            value
                .parse::<u8>()
                .map_err(|error| TreeError::parse(field, value, &error.into()))?;
        }
        Ok(format!("{slot}/{lane}"))
    }

    fn with_key(key: &Self::Key) -> Self {
        let (slot, lane) = key.split_once('/').unwrap_or_default();
        Self {
            slot: slot.parse().unwrap_or_default(),
            lane: lane.parse().unwrap_or_default(),
            ..Self::default()
        }
    }
}

// ---- Helpers ------------------------------------------------------------

type Devices = KeyedList<Device>;

fn put(devices: &mut Devices, path: &str, value: &str) -> Result<(), TreeError> {
    let segments = parse_path(path)?;
    let (_, rest) = segments.split_first().expect("module root segment");
    devices.put(rest, value)
}

fn device<'a>(devices: &'a Devices, name: &str) -> &'a Device {
    devices.get(&name.to_owned()).expect("device exists")
}

fn run(device: &Device, reverse: bool, fail_on: Option<&'static str>) -> (Vec<String>, Result<(), String>) {
    let mut recorder = Recorder {
        events: Vec::new(),
        fail_on,
    };
    let result = process_node(&mut recorder, reverse, &Scope::root(&device.name), device);
    (recorder.events, result)
}

#[fixture]
fn populated() -> Devices {
    let mut devices = Devices::new();
    for (path, value) in [
        ("/dev:devices/device[name='R1']/name", "R1"),
        ("/dev:devices/device[name='R1']/config/hostname", "core"),
        ("/dev:devices/device[name='R1']/config/mtu", "1500"),
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/slot", "1"),
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/lane", "2"),
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/enabled", "true"),
    ] {
        put(&mut devices, path, value).expect("put succeeds");
    }
    devices
}

// ---- Changes ------------------------------------------------------------

#[rstest]
#[case(&["a"], &["a"], true, true)]
#[case(&["a"], &["a", "b"], false, true)]
#[case(&["a", "b"], &["a", "b"], true, true)]
#[case(&["a", "b"], &["c"], false, false)]
#[case(&[], &["a"], false, false)]
fn get_changes_is_all_and_one_of_change_is_any(
    #[case] touched: &[&str],
    #[case] query: &[&str],
    #[case] all: bool,
    #[case] any: bool,
) {
    let mut changes = Changes::new();
    changes.set_changes(touched.iter().copied());

    assert_eq!(changes.get_changes(query), all);
    assert_eq!(changes.one_of_change(query), any);
    assert_eq!(
        all,
        query.iter().all(|name| changes.get_change(name)),
        "get_changes must agree with get_change"
    );
}

#[test]
fn empty_queries_follow_set_semantics() {
    let changes = Changes::new();

    assert!(changes.get_changes(&[]));
    assert!(!changes.one_of_change(&[]));
    assert!(changes.compare(&[]));
}

#[rstest]
#[case(&["a", "b"], true)]
#[case(&["b", "a", "a"], true)]
#[case(&["a"], false)]
#[case(&["a", "b", "c"], false)]
fn compare_requires_exact_set(#[case] expected: &[&str], #[case] matches: bool) {
    let mut changes = Changes::new();
    changes.set_change("a");
    changes.set_change("b");
    changes.set_change("a");

    assert_eq!(changes.compare(expected), matches);
    assert_eq!(changes.len(), 2);
}

#[test]
fn changes_render_sorted() {
    let mut changes = Changes::new();
    changes.set_changes(["mtu", "config", "name"]);
    assert_eq!(changes.to_string(), "config|mtu|name");
}

// ---- Populator ----------------------------------------------------------

#[test]
fn touched_sets_match_exactly_what_was_written() {
    let mut devices = Devices::new();
    put(&mut devices, "/dev:devices/device[name='PE1']", "").expect("entry");
    put(&mut devices, "/dev:devices/device[name='PE1']/config/hostname", "pe1").expect("leaf");

    let pe1 = device(&devices, "PE1");
    assert!(pe1.compare(&["config"]));
    assert!(pe1.config.compare(&["hostname"]));
    assert_eq!(pe1.config.hostname, "pe1");
}

#[rstest]
fn write_order_does_not_affect_touched_sets(populated: Devices) {
    let mut reversed = Devices::new();
    for (path, value) in [
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/enabled", "true"),
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/lane", "2"),
        ("/dev:devices/device[name='R1']/ports/port[slot='1'][lane='2']/slot", "1"),
        ("/dev:devices/device[name='R1']/config/mtu", "1500"),
        ("/dev:devices/device[name='R1']/config/hostname", "core"),
        ("/dev:devices/device[name='R1']/name", "R1"),
    ] {
        put(&mut reversed, path, value).expect("put succeeds");
    }

    assert_eq!(reversed, populated);
    assert!(device(&reversed, "R1").compare(&["name", "config", "ports"]));
}

#[rstest]
fn keyed_entries_are_created_once_with_their_key(populated: Devices) {
    let r1 = device(&populated, "R1");
    let port = r1.ports.get(&"1/2".to_owned()).expect("port exists");

    assert_eq!(r1.ports.len(), 1);
    assert_eq!((port.slot, port.lane), (1, 2));
    assert!(port.compare(&["slot", "lane", "enabled"]));
}

#[test]
fn parse_failure_names_field_and_keeps_earlier_writes() {
    let mut devices = Devices::new();
    put(&mut devices, "/dev:devices/device[name='R1']/config/hostname", "edge").expect("leaf");

    let error = put(&mut devices, "/dev:devices/device[name='R1']/config/mtu", "jumbo")
        .expect_err("mtu must be numeric");

    assert!(
        matches!(&error, TreeError::Parse { field, value, .. } if field == "mtu" && value == "jumbo"),
        "unexpected error {error:?}"
    );
    let r1 = device(&devices, "R1");
    assert_eq!(r1.config.hostname, "edge");
    assert!(r1.config.compare(&["hostname"]));
}

#[rstest]
#[case("/dev:devices/device/name", "device", "name")]
#[case("/dev:devices/device[name='R1']/ports/port[slot='1']/enabled", "port", "lane")]
fn missing_key_attribute_is_reported(#[case] path: &str, #[case] list: &str, #[case] key: &str) {
    let mut devices = Devices::new();
    let error = put(&mut devices, path, "true").expect_err("key is missing");

    assert!(
        matches!(&error, TreeError::MissingKey { list: l, key: k, .. } if l == list && k == key),
        "unexpected error {error:?}"
    );
}

#[test]
fn undeclared_segments_are_ignored_without_marking() {
    let mut devices = Devices::new();
    put(&mut devices, "/dev:devices/device[name='R1']/vendor/model", "x").expect("ignored");

    let r1 = device(&devices, "R1");
    assert!(r1.changes().is_empty());
}

// ---- Dispatch -----------------------------------------------------------

#[rstest]
fn forward_dispatch_follows_declared_order(populated: Devices) {
    let (events, result) = run(device(&populated, "R1"), false, None);

    result.expect("dispatch succeeds");
    assert_eq!(
        events,
        [
            "name:R1",
            "config:R1",
            "hostname:core",
            "mtu:1500",
            "ports",
            "port:R1/1/2",
            "enabled:1/2:true",
        ]
    );
}

#[rstest]
fn reverse_dispatch_is_the_exact_mirror(populated: Devices) {
    let (forward, _) = run(device(&populated, "R1"), false, None);
    let (mut reverse, result) = run(device(&populated, "R1"), true, None);

    result.expect("dispatch succeeds");
    reverse.reverse();
    assert_eq!(reverse, forward);
}

#[test]
fn untouched_fields_are_never_visited() {
    let mut devices = Devices::new();
    put(&mut devices, "/dev:devices/device[name='R1']/config/mtu", "9000").expect("leaf");

    let (events, result) = run(device(&devices, "R1"), false, None);

    result.expect("dispatch succeeds");
    assert_eq!(events, ["config:R1", "mtu:9000"]);
}

#[test]
fn trigger_waits_for_every_name() {
    let mut devices = Devices::new();
    put(
        &mut devices,
        "/dev:devices/device[name='R1']/ports/port[slot='3'][lane='0']/slot",
        "3",
    )
    .expect("key leaf");

    let (events, _) = run(device(&devices, "R1"), false, None);
    assert_eq!(events, ["ports"]);
}

#[rstest]
#[case(false, "hostname", &["name:R1", "config:R1", "hostname:core"])]
#[case(true, "mtu", &["enabled:1/2:true", "port:R1/1/2", "ports", "mtu:1500"])]
fn dispatch_stops_at_first_error(
    populated: Devices,
    #[case] reverse: bool,
    #[case] fail_on: &'static str,
    #[case] expected: &[&str],
) {
    let (events, result) = run(device(&populated, "R1"), reverse, Some(fail_on));

    assert!(result.is_err());
    assert_eq!(events, expected);
}
