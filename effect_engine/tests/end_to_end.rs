//! Full lifecycle: load definitions, bind behaviors, build effects and run
//! them through a handler while observers watch the handler's topic.

use std::cell::RefCell;
use std::rc::Rc;

use effect_engine::{AddOutcome, EffectFactory, EffectHandler, EffectRepository, EngineConfig};
use event_bus::{EntityRef, EventData, EventListener, EventStream, EventType};

const DEFINITIONS: &str = r#"[
    {"name": "poison", "type": "dot", "trait": "hp", "power": 3,
     "unique": "true", "refreshable": "false", "description": "slow damage"},
    {"name": "regen", "type": "hot", "trait": "hp", "power": 2,
     "stackable": true, "max_stacks": 3, "description": "heals over time"}
]"#;

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log) -> impl Fn(&EventData) + 'static {
    let log = Rc::clone(log);
    move |data: &EventData| {
        let name = data["self"]["name"].as_str().unwrap_or_default().to_string();
        log.borrow_mut().push(name);
    }
}

#[test]
fn test_poison_lifecycle() {
    let hp = Rc::new(RefCell::new(20.0));
    let effect_log: Log = Rc::default();

    let mut repo = EffectRepository::from_json_str(DEFINITIONS).unwrap();
    let target = Rc::clone(&hp);
    repo.implement("poison", move |effect, _| {
        *target.borrow_mut() -= effect.power;
    })
    .unwrap();
    repo.on("poison", "applied", record(&effect_log)).unwrap();
    repo.on("poison", "removed", record(&effect_log)).unwrap();

    let factory = EffectFactory::new(&repo);
    let mut handler = EffectHandler::new(EntityRef::new("goblin"));

    let observed: Rc<RefCell<Vec<EventType>>> = Rc::default();
    let observer = EventListener::new();
    for status in [EventType::Applied, EventType::Refreshed, EventType::Removed] {
        let sink = Rc::clone(&observed);
        let seen = status.clone();
        observer.on(status, move |_| sink.borrow_mut().push(seen.clone()));
    }
    handler.topic().add_event_listener(&observer);

    let outcome = handler.add(factory.create("poison").unwrap(), EventData::new());
    assert!(matches!(outcome, AddOutcome::Applied));

    let outcome = handler.add(factory.create("poison").unwrap(), EventData::new());
    assert!(matches!(outcome, AddOutcome::UniqueNoRefresh(ref effect) if effect.name == "poison"));
    assert_eq!(handler.bucket_len("dot"), 1);

    handler.execute_all(&EventData::new()).unwrap();
    handler.execute_all(&EventData::new()).unwrap();
    assert_eq!(*hp.borrow(), 14.0);

    let removed = handler.remove("dot", EventData::new()).unwrap();
    assert_eq!(removed.name, "poison");
    assert!(!handler.contains("dot"));
    assert!(handler.is_empty());
    assert!(handler.remove("dot", EventData::new()).is_none());

    assert_eq!(*effect_log.borrow(), vec!["poison", "poison"]);
    assert_eq!(*observed.borrow(), vec![EventType::Applied, EventType::Removed]);
}

#[test]
fn test_regen_stacks_up_to_ceiling() {
    let mut repo = EffectRepository::from_json_str(DEFINITIONS).unwrap();
    repo.implement("regen", |_, _| {}).unwrap();
    let factory = EffectFactory::new(&repo);
    let mut handler = EffectHandler::new(EntityRef::new("cleric"));

    let outcome = handler.add(factory.create("regen").unwrap(), EventData::new());
    assert!(matches!(outcome, AddOutcome::Applied));
    for expected in [2, 3, 3] {
        let outcome = handler.add(factory.create("regen").unwrap(), EventData::new());
        assert!(matches!(outcome, AddOutcome::Stacked { stacks } if stacks == expected));
    }
    assert_eq!(handler.bucket_len("hot"), 1);
    assert_eq!(handler.get("hot").unwrap().stacks, 3);
}

#[test]
fn test_handlers_share_a_stream() {
    let repo = {
        let mut repo = EffectRepository::from_json_str(DEFINITIONS).unwrap();
        repo.implement("poison", |_, _| {}).unwrap();
        repo
    };
    let factory = EffectFactory::new(&repo);

    let mut stream = EventStream::new();
    assert!(stream.add_topic("combat"));

    let mut goblin = EffectHandler::new(EntityRef::new("goblin"));
    let mut orc = EffectHandler::new(EntityRef::new("orc"));
    let combat = stream.topic("combat").unwrap();
    goblin.topic().add_event_listener(combat);
    orc.topic().add_event_listener(combat);

    let targets: Log = Rc::default();
    let watcher = EventListener::new();
    let sink = Rc::clone(&targets);
    watcher.on(EventType::Applied, move |data| {
        let name = data["target"]["name"].as_str().unwrap_or_default().to_string();
        sink.borrow_mut().push(name);
    });
    combat.add_event_listener(&watcher);

    goblin.add(factory.create("poison").unwrap(), EventData::new());
    orc.add(factory.create("poison").unwrap(), EventData::new());

    assert_eq!(*targets.borrow(), vec!["goblin", "orc"]);
}

#[test]
fn test_load_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("effects.json"), DEFINITIONS).unwrap();
    let config_path = dir.path().join("engine.toml");
    std::fs::write(
        &config_path,
        "prioritized = true\nstack_ceiling = 5\ndefinitions = \"effects.json\"\n",
    )
    .unwrap();

    let config = EngineConfig::load(&config_path).unwrap();
    let repo = EffectRepository::from_config(&config).unwrap();
    assert_eq!(repo.names().collect::<Vec<_>>(), vec!["poison", "regen"]);

    let handler = EffectHandler::with_config(EntityRef::new("goblin"), config);
    assert!(handler.config().prioritized);
    assert_eq!(handler.topic().name(), "goblin-EffectHandler");
}
