//! Integration tests for schem_entity

use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use schem_asset::{AssetMeta, AssetRef, LoadedAssetManager, PointerRef};
use schem_core::{EntityIdentity, EntityKey, Guid, NameHash};
use schem_entity::*;

const INTERFACE_GUID: &str = "7d2c1b3a-5f44-4c2e-9a61-0b8e3f5d9c10";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn hash(name: &str) -> NameHash {
    NameHash::from_name(name)
}

// ========== Recorder entity ==========

#[derive(Clone, Debug, PartialEq)]
enum Signal {
    Event(NameHash),
    Property(NameHash, Value),
    Link(NameHash),
}

/// Entity that records every signal routed to it
struct Recorder {
    identity: EntityIdentity,
    received: Mutex<Vec<Signal>>,
    trace: Option<Arc<Mutex<Vec<String>>>>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            identity: EntityIdentity::new(Guid::nil(), Guid::new_random()),
            received: Mutex::new(Vec::new()),
            trace: None,
        }
    }

    fn with_trace(trace: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            trace: Some(trace),
            ..Self::new()
        }
    }

    fn received(&self) -> Vec<Signal> {
        self.received.lock().clone()
    }

    fn record(&self, signal: Signal) {
        if let Some(trace) = &self.trace {
            trace.lock().push(format!("received {:?}", signal));
        }
        self.received.lock().push(signal);
    }
}

impl SchematicsType for Recorder {
    fn on_event(&self, port: NameHash, _router: &dyn SignalRouter) {
        self.record(Signal::Event(port));
    }

    fn on_link_changed(&self, port: NameHash) {
        self.record(Signal::Link(port));
    }

    fn receive_property(&self, port: NameHash, value: Value, _router: &dyn SignalRouter) {
        self.record(Signal::Property(port, value));
    }
}

impl Entity for Recorder {
    fn identity(&self) -> EntityIdentity {
        self.identity
    }

    fn parent(&self) -> Option<EntityKey> {
        None
    }

    fn type_name(&self) -> &'static str {
        "Recorder"
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn spawn_recorder(world: &mut EntityWorld) -> (EntityKey, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::new());
    let key = world.spawn_arc(recorder.clone());
    (key, recorder)
}

fn interface(world: &EntityWorld, key: EntityKey) -> Arc<InterfaceDescriptor> {
    world.get_as::<InterfaceDescriptor>(key).unwrap()
}

fn register(manager: &LoadedAssetManager, name: &str) -> AssetRef {
    let reference = AssetRef::new(Guid::new_random(), Guid::new_random());
    manager.register(reference, AssetMeta::new(name, "MeshAsset"));
    reference
}

// ========== Construction ==========

#[test]
fn test_endpoints_match_record() {
    init_logging();
    let record = InterfaceDescriptorData::from_json(
        r#"{
            "instance_guid": "7d2c1b3a-5f44-4c2e-9a61-0b8e3f5d9c10",
            "fields": [
                { "id": 101, "name": "Speed", "value": "2.5", "value_type": "Float" },
                { "id": -7, "name": "Label", "value": "gate", "value_type": "String" }
            ],
            "input_events": [ { "id": 11, "name": "Open" } ],
            "output_events": [ { "id": 12, "name": "Opened" }, { "id": 13, "name": "Closed" } ],
            "input_links": [ { "id": 21, "name": "Door" } ],
            "output_links": []
        }"#,
    )
    .unwrap();

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    let descriptor = interface(&world, key);

    assert_eq!(descriptor.property_hashes(), vec![NameHash(101), NameHash(-7)]);
    assert_eq!(
        descriptor.event_hashes(),
        vec![NameHash(11), NameHash(12), NameHash(13)]
    );
    assert_eq!(descriptor.link_hashes(), vec![NameHash(21)]);

    assert_eq!(descriptor.event_direction(NameHash(11)), Some(EventDirection::Input));
    assert_eq!(descriptor.event_direction(NameHash(13)), Some(EventDirection::Output));

    // No values are resolved before simulation
    assert_eq!(descriptor.property_value(NameHash(101)), Some(Value::None));
}

#[test]
fn test_construction_does_not_touch_loader() {
    let manager = LoadedAssetManager::new();
    let mesh = register(&manager, "Meshes/Door");

    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Mesh", ValueType::Asset).with_ref(PointerRef::External(mesh)));
    let mut world = EntityWorld::default();
    world.spawn_descriptor(record, None).unwrap();

    assert_eq!(manager.stats().loads, 0);
}

#[test]
fn test_malformed_guid_aborts_spawn() {
    let mut world = EntityWorld::default();
    let err = world
        .spawn_descriptor(InterfaceDescriptorData::new("not-a-guid"), None)
        .unwrap_err();

    assert!(matches!(err, schem_core::Error::MalformedGuid { .. }));
    assert!(world.is_empty());
}

// ========== Simulation ==========

#[test]
fn test_begin_end_balances_loads() {
    init_logging();
    let manager = LoadedAssetManager::new();
    let mesh = register(&manager, "Meshes/Door");
    let sound = register(&manager, "Sounds/Creak");

    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Mesh", ValueType::Asset).with_ref(PointerRef::External(mesh)))
        .with_field(DataField::new("Sound", ValueType::Asset).with_ref(PointerRef::External(sound)))
        .with_field(DataField::new("Speed", ValueType::Float).with_value("2.5"));

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    let descriptor = interface(&world, key);

    world.begin_simulation(&manager);
    assert_eq!(descriptor.state(), SimulationState::Simulating);
    assert_eq!(descriptor.loaded_asset_count(), 2);
    assert_eq!(manager.resident_count(), 2);

    let value = descriptor.property_value(hash("Mesh")).unwrap();
    assert_eq!(value.as_asset().unwrap().reference(), &mesh);
    assert_eq!(descriptor.property_value(hash("Speed")), Some(Value::Float(2.5)));

    world.end_simulation(&manager);
    assert_eq!(descriptor.state(), SimulationState::Stopped);
    assert_eq!(descriptor.loaded_asset_count(), 0);

    let stats = manager.stats();
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.unloads, 2);
    assert_eq!(stats.resident, 0);
}

#[test]
fn test_internal_reference_skips_loader() {
    let manager = LoadedAssetManager::new();
    let record = InterfaceDescriptorData::from_json(
        r#"{
            "instance_guid": "7d2c1b3a-5f44-4c2e-9a61-0b8e3f5d9c10",
            "fields": [
                {
                    "id": 5,
                    "name": "Offset",
                    "value_ref": { "type": "Internal", "target": { "Vec3": [0.0, 1.0, 0.0] } },
                    "value_type": "Vec3"
                }
            ]
        }"#,
    )
    .unwrap();

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    world.begin_simulation(&manager);

    assert_eq!(
        interface(&world, key).property_value(NameHash(5)),
        Some(Value::Vec3([0.0, 1.0, 0.0]))
    );
    assert_eq!(manager.stats().loads, 0);
}

#[test]
fn test_unresolvable_values_stay_empty() {
    init_logging();
    let manager = LoadedAssetManager::new();
    let missing = AssetRef::new(Guid::new_random(), Guid::new_random());

    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Mesh", ValueType::Asset).with_ref(PointerRef::External(missing)))
        .with_field(DataField::new("Count", ValueType::Int).with_value("many"));

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    world.begin_simulation(&manager);

    let descriptor = interface(&world, key);
    assert_eq!(descriptor.property_value(hash("Mesh")), Some(Value::None));
    assert_eq!(descriptor.property_value(hash("Count")), Some(Value::None));
    assert_eq!(descriptor.loaded_asset_count(), 0);
}

#[test]
fn test_resimulation_after_stop() {
    let manager = LoadedAssetManager::new();
    let mesh = register(&manager, "Meshes/Door");
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Mesh", ValueType::Asset).with_ref(PointerRef::External(mesh)));

    let mut world = EntityWorld::default();
    world.spawn_descriptor(record, None).unwrap();

    for _ in 0..2 {
        world.begin_simulation(&manager);
        world.tick();
        world.end_simulation(&manager);
    }

    let stats = manager.stats();
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.unloads, 2);
    assert_eq!(world.frame(), 2);
}

// ========== Event queue ==========

#[test]
fn test_queued_events_run_one_per_tick_in_order() {
    let mut world = EntityWorld::default();
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_input_event("A")
        .with_input_event("B")
        .with_input_event("C");
    let key = world.spawn_descriptor(record, None).unwrap();
    let (recorder_key, recorder) = spawn_recorder(&mut world);

    for name in ["A", "B", "C"] {
        assert!(world.connect_event(key, hash(name), recorder_key, hash(name)));
    }

    let descriptor = interface(&world, key);
    let order = ["B", "A", "C", "A", "B"];
    for name in order {
        descriptor.queue_event(hash(name)).unwrap();
    }

    for (i, _) in order.iter().enumerate() {
        world.tick();
        assert_eq!(recorder.received().len(), i + 1);
    }

    let expected: Vec<_> = order.iter().map(|n| Signal::Event(hash(n))).collect();
    assert_eq!(recorder.received(), expected);
    assert_eq!(descriptor.pending_commands(), 0);
}

#[test]
fn test_empty_pre_frame_is_noop() {
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Count", ValueType::Int).with_value("3"));
    let descriptor =
        InterfaceDescriptor::new(record, &EntityScope::root(Guid::nil())).unwrap();
    let manager = LoadedAssetManager::new();
    descriptor.begin_simulation(&manager);

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    descriptor.on_output_property_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    descriptor.update_pre_frame(&NullRouter);
    descriptor.update_post_frame(&NullRouter);

    assert_eq!(notified.load(Ordering::SeqCst), 0);
    assert_eq!(descriptor.property_value(hash("Count")), Some(Value::Int(3)));
    assert_eq!(descriptor.state(), SimulationState::Simulating);
}

#[test]
fn test_malformed_queued_write_is_dropped() {
    init_logging();
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Speed", ValueType::Float).with_value("1.5"));

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    let manager = LoadedAssetManager::new();
    world.begin_simulation(&manager);

    let descriptor = interface(&world, key);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    descriptor.on_output_property_changed(move |change: &PropertyChanged| sink.lock().push(change.clone()));

    descriptor.queue_property(hash("Speed"), "not-a-number").unwrap();
    world.tick();

    assert_eq!(descriptor.property_value(hash("Speed")), Some(Value::Float(1.5)));
    assert!(changes.lock().is_empty());

    // The queue keeps working after a dropped write
    descriptor.queue_property(hash("Speed"), "4").unwrap();
    world.tick();
    assert_eq!(descriptor.property_value(hash("Speed")), Some(Value::Float(4.0)));
    assert_eq!(changes.lock().len(), 1);
}

#[test]
fn test_concurrent_producers() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Message", ValueType::String));

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    let (recorder_key, recorder) = spawn_recorder(&mut world);
    assert!(world.connect_property(key, hash("Message"), recorder_key, hash("Inbox")));

    let descriptor = interface(&world, key);
    let done = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let sender = descriptor.command_sender();
        let done = done.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                sender
                    .push(QueuedCommand::SetProperty(hash("Message"), format!("{}:{}", producer, i)))
                    .unwrap();
            }
            done.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let total = PRODUCERS * PER_PRODUCER;
    while recorder.received().len() < total {
        world.tick();
        if done.load(Ordering::SeqCst) == PRODUCERS && descriptor.pending_commands() == 0 {
            break;
        }
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let received = recorder.received();
    assert_eq!(received.len(), total);

    let mut seen = HashSet::new();
    let mut last = vec![None; PRODUCERS];
    for signal in received {
        let text = match signal {
            Signal::Property(port, Value::String(text)) if port == hash("Inbox") => text,
            other => panic!("unexpected signal {:?}", other),
        };
        assert!(seen.insert(text.clone()), "duplicate {}", text);

        let (producer, i) = text.split_once(':').unwrap();
        let producer: usize = producer.parse().unwrap();
        let i: usize = i.parse().unwrap();
        // Each producer's items arrive in push order
        assert!(last[producer].map_or(true, |prev| prev < i));
        last[producer] = Some(i);
    }
    assert_eq!(seen.len(), total);
}

#[test]
fn test_bounded_queue_rejects_overflow() {
    let config = WorldConfig::from_json(r#"{ "queue": { "max_depth": 2, "overflow": "reject" } }"#).unwrap();
    let mut world = EntityWorld::new(config);
    let key = world
        .spawn_descriptor(InterfaceDescriptorData::new(INTERFACE_GUID).with_input_event("Go"), None)
        .unwrap();
    let descriptor = interface(&world, key);

    descriptor.queue_event(hash("Go")).unwrap();
    descriptor.queue_event(hash("Go")).unwrap();
    assert!(descriptor.queue_event(hash("Go")).is_err());
    assert_eq!(descriptor.pending_commands(), 2);
}

// ========== Dispatch ==========

#[test]
fn test_output_event_notifies_before_fan_out() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let mut world = EntityWorld::default();
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_input_event("Open")
        .with_output_event("Opened");
    let key = world.spawn_descriptor(record, None).unwrap();

    let recorder = Arc::new(Recorder::with_trace(trace.clone()));
    let recorder_key = world.spawn_arc(recorder.clone());
    world.connect_event(key, hash("Open"), recorder_key, hash("Open"));
    world.connect_event(key, hash("Opened"), recorder_key, hash("Opened"));

    let descriptor = interface(&world, key);
    let sink = trace.clone();
    descriptor.on_output_event_triggered(move |event: &OutputEventTriggered| {
        sink.lock().push(format!("notified {:?}", event.hash));
    });

    descriptor.on_event(hash("Opened"), &world);
    assert_eq!(
        *trace.lock(),
        vec![
            format!("notified {:?}", hash("Opened")),
            format!("received {:?}", Signal::Event(hash("Opened"))),
        ]
    );

    trace.lock().clear();
    descriptor.on_event(hash("Open"), &world);
    assert_eq!(
        *trace.lock(),
        vec![format!("received {:?}", Signal::Event(hash("Open")))]
    );
    assert_eq!(recorder.received().len(), 2);
}

#[test]
fn test_fan_out_preserves_insertion_order() {
    let mut world = EntityWorld::default();
    let key = world
        .spawn_descriptor(InterfaceDescriptorData::new(INTERFACE_GUID).with_output_event("Fire"), None)
        .unwrap();
    let (recorder_key, recorder) = spawn_recorder(&mut world);

    for port in ["Third", "First", "Second"] {
        world.connect_event(key, hash("Fire"), recorder_key, hash(port));
    }
    interface(&world, key).on_event(hash("Fire"), &world);

    let ports: Vec<_> = recorder
        .received()
        .into_iter()
        .map(|signal| match signal {
            Signal::Event(port) => port,
            other => panic!("unexpected signal {:?}", other),
        })
        .collect();
    assert_eq!(ports, vec![hash("Third"), hash("First"), hash("Second")]);
}

#[test]
fn test_property_propagates_to_mesh_entity() {
    let manager = LoadedAssetManager::new();
    let mesh = register(&manager, "Meshes/Flag");

    let mut world = EntityWorld::default();
    let key = world
        .spawn_descriptor(
            InterfaceDescriptorData::new(INTERFACE_GUID).with_field(DataField::new("Anchor", ValueType::Vec3)),
            None,
        )
        .unwrap();

    let scope = world.scope(key).unwrap();
    let data = MeshEntityData {
        instance_guid: "3f0e5a7c-1d2b-4c6e-8f9a-0b1c2d3e4f50".into(),
        mesh: Some(mesh),
        position: [0.0; 3],
    };
    let mesh_key = world.spawn(MeshEntity::new(&data, &scope, &manager).unwrap());
    world.connect_property(key, hash("Anchor"), mesh_key, MeshEntity::position_port());

    world.begin_simulation(&manager);
    interface(&world, key).queue_property(hash("Anchor"), "(1, 2, 3)").unwrap();
    world.tick();

    let mesh_entity = world.get_as::<MeshEntity>(mesh_key).unwrap();
    assert_eq!(mesh_entity.position(), [1.0, 2.0, 3.0]);
    assert_eq!(mesh_entity.parent(), Some(key));

    world.end_simulation(&manager);
    assert!(manager.is_resident(&mesh));

    world.destroy_all(&manager);
    assert!(!manager.is_resident(&mesh));
    assert!(world.is_empty());
}

#[test]
fn test_links_route_to_targets() {
    let mut world = EntityWorld::default();
    let key = world
        .spawn_descriptor(InterfaceDescriptorData::new(INTERFACE_GUID).with_output_link("Target"), None)
        .unwrap();
    let (recorder_key, recorder) = spawn_recorder(&mut world);

    assert!(world.connect_link(key, hash("Target"), recorder_key, hash("Source")));
    interface(&world, key).trigger_link(hash("Target"), &world);

    assert_eq!(recorder.received(), vec![Signal::Link(hash("Source"))]);
}

// ========== Wiring ==========

#[test]
fn test_connection_to_missing_source_is_noop() {
    let mut world = EntityWorld::default();
    let key = world
        .spawn_descriptor(
            InterfaceDescriptorData::new(INTERFACE_GUID).with_field(DataField::new("Speed", ValueType::Float)),
            None,
        )
        .unwrap();
    let (recorder_key, _recorder) = spawn_recorder(&mut world);

    world.connect_property(key, hash("Speed"), recorder_key, hash("In"));
    world.connect_property(key, hash("Missing"), recorder_key, hash("Other"));

    let descriptor = interface(&world, key);
    assert_eq!(
        descriptor.property_connections(hash("Speed")),
        vec![Connection::new(recorder_key, hash("In"))]
    );
    assert!(descriptor.property_connections(hash("Missing")).is_empty());
}

#[test]
fn test_signals_to_despawned_entity_are_dropped() {
    let manager = LoadedAssetManager::new();
    let mut world = EntityWorld::default();
    let key = world
        .spawn_descriptor(InterfaceDescriptorData::new(INTERFACE_GUID).with_output_event("Ping"), None)
        .unwrap();
    let (recorder_key, recorder) = spawn_recorder(&mut world);
    world.connect_event(key, hash("Ping"), recorder_key, hash("Ping"));

    assert!(world.despawn(recorder_key, &manager));
    interface(&world, key).on_event(hash("Ping"), &world);

    assert!(recorder.received().is_empty());
}

#[test]
fn test_signal_cycle_is_cut() {
    init_logging();
    let config = WorldConfig {
        max_signal_depth: 8,
        ..Default::default()
    };
    let mut world = EntityWorld::new(config);
    let field = || DataField::new("Level", ValueType::Int);

    let a = world
        .spawn_descriptor(InterfaceDescriptorData::new(INTERFACE_GUID).with_field(field()), None)
        .unwrap();
    let b = world
        .spawn_descriptor(
            InterfaceDescriptorData::new("11111111-2222-3333-4444-555555555555").with_field(field()),
            None,
        )
        .unwrap();
    world.connect_property(a, hash("Level"), b, hash("Level"));
    world.connect_property(b, hash("Level"), a, hash("Level"));

    let count = |key| {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        interface(&world, key).on_output_property_changed(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        counter
    };
    let a_changes = count(a);
    let b_changes = count(b);

    interface(&world, a).set_property(hash("Level"), Value::Int(1), &world);

    assert_eq!(a_changes.load(Ordering::SeqCst), 5);
    assert_eq!(b_changes.load(Ordering::SeqCst), 4);
}

#[test]
fn test_destroy_during_simulation_releases_assets() {
    let manager = LoadedAssetManager::new();
    let mesh = register(&manager, "Meshes/Door");
    let record = InterfaceDescriptorData::new(INTERFACE_GUID)
        .with_field(DataField::new("Mesh", ValueType::Asset).with_ref(PointerRef::External(mesh)))
        .with_input_event("Open");

    let mut world = EntityWorld::default();
    let key = world.spawn_descriptor(record, None).unwrap();
    world.begin_simulation(&manager);

    let descriptor = interface(&world, key);
    descriptor.queue_event(hash("Open")).unwrap();

    assert!(world.despawn(key, &manager));
    assert_eq!(manager.resident_count(), 0);
    assert_eq!(descriptor.pending_commands(), 0);
    assert_eq!(descriptor.state(), SimulationState::Stopped);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let record = InterfaceDescriptorData::new(INTERFACE_GUID).with_output_event("Done");
    let descriptor =
        InterfaceDescriptor::new(record, &EntityScope::root(Guid::nil())).unwrap();

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    let id = descriptor.on_output_event_triggered(move |_| flag.store(true, Ordering::SeqCst));

    assert!(descriptor.unsubscribe(id));
    descriptor.on_event(hash("Done"), &NullRouter);
    assert!(!fired.load(Ordering::SeqCst));
}
