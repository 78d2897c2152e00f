//! Engine construction, registries and placeholder synthesis.

use conflux::testing::DispatchLog;
use conflux::{CHANGE, Config, CreatorMap, Engine, EngineError, ReactionMap};
use serde_json::{Value, json};
use std::cell::Cell;
use std::rc::Rc;

mod common;
use common::setup_message_store;

#[test]
fn store_with_implicit_actions() {
    let engine = Engine::create(Config::new().stores("message", setup_message_store)).unwrap();

    let store = engine.store("message").unwrap();
    let seen: Rc<Cell<bool>> = Rc::new(Cell::new(false));
    store.on(CHANGE, {
        let seen = Rc::clone(&seen);
        move |state| {
            assert_eq!(**state, json!({ "messages": ["Hello, world!"] }));
            seen.set(true);
        }
    });

    // "add_message" was synthesized from the reaction map.
    let completion = engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("Hello, world!")])
        .unwrap();
    assert!(completion.is_settled(), "no follow-up, resolves immediately");

    assert!(seen.get(), "change subscriber should have fired");
    assert_eq!(store.state()["messages"], json!(["Hello, world!"]));
}

#[test]
fn store_with_explicit_actions() {
    let unique_id = Rc::new(Cell::new(0i64));
    let creators = CreatorMap::new().creator("add_message", {
        let unique_id = Rc::clone(&unique_id);
        move |dispatch, args| {
            unique_id.set(unique_id.get() + 1);
            let content = args.first().cloned().unwrap_or(Value::Null);
            dispatch.dispatch(vec![json!(unique_id.get()), content])?;
            Ok(None)
        }
    });

    let engine = Engine::create(
        Config::new()
            .actions("message", creators)
            .stores("message", |store| {
                store.set_state(json!({ "messages": [] }));
                ReactionMap::new().on("add_message", {
                    let store = store.clone();
                    move |args| {
                        let mut messages = store.state()["messages"]
                            .as_array()
                            .cloned()
                            .unwrap_or_default();
                        messages.push(json!({ "id": args[0], "content": args[1] }));
                        Ok(Some(json!({ "messages": messages })))
                    }
                })
            }),
    )
    .unwrap();

    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("Hello, world!")])
        .unwrap();

    assert_eq!(
        *engine.store("message").unwrap().state(),
        json!({ "messages": [{ "id": 1, "content": "Hello, world!" }] })
    );
}

#[test]
fn explicit_action_is_not_overwritten_by_placeholder() {
    // The creator tags every message; if the placeholder had replaced it,
    // the raw argument would land in the store instead.
    let creators = CreatorMap::new().creator("add_message", |dispatch, args| {
        let content = args.first().cloned().unwrap_or(Value::Null);
        dispatch.dispatch(vec![json!(format!("tagged:{}", content.as_str().unwrap_or("")))])?;
        Ok(None)
    });

    let engine = Engine::create(
        Config::new()
            .actions("message", creators)
            .stores("message", setup_message_store),
    )
    .unwrap();

    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("hi")])
        .unwrap();

    assert_eq!(
        engine.store("message").unwrap().state()["messages"],
        json!(["tagged:hi"])
    );
}

#[test]
fn nested_reactions_synthesize_into_the_nested_namespace() {
    let engine = Engine::create(Config::new().stores("id", |store| {
        store.set_state(json!({ "id": 0 }));
        ReactionMap::new().namespace(
            "message",
            ReactionMap::new().on("add_message", {
                let store = store.clone();
                move |_args| {
                    let next = store.state()["id"].as_i64().unwrap_or(0) + 1;
                    Ok(Some(json!({ "id": next })))
                }
            }),
        )
    }))
    .unwrap();

    // The placeholder belongs to the nested namespace, not the store's own.
    assert!(engine.action("message", "add_message").is_ok());
    assert!(matches!(
        engine.action("id", "add_message"),
        Err(EngineError::UnknownNamespace(_))
    ));

    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![])
        .unwrap();
    assert_eq!(engine.store("id").unwrap().state()["id"], json!(1));
}

#[test]
fn dispatch_event_fires_for_every_payload() {
    let engine = Engine::create(Config::new().stores("message", setup_message_store)).unwrap();
    let log = DispatchLog::attach(&engine);

    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("one")])
        .unwrap();
    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("two")])
        .unwrap();

    assert_eq!(
        log.labels(),
        vec!["message.add_message", "message.add_message"]
    );
    assert_eq!(log.payloads()[0].args(), &[json!("one")][..]);
}

#[test]
fn unknown_lookups_fail() {
    let engine = Engine::create(Config::new().stores("message", setup_message_store)).unwrap();

    assert!(matches!(
        engine.store("missing"),
        Err(EngineError::UnknownStore(_))
    ));
    assert!(matches!(
        engine.actions("missing"),
        Err(EngineError::UnknownNamespace(_))
    ));
    assert!(matches!(
        engine.action("message", "missing"),
        Err(EngineError::UnknownAction { .. })
    ));
}

#[test]
fn duplicate_namespaces_are_rejected() {
    let duplicate_stores = Config::new()
        .stores("message", setup_message_store)
        .stores("message", setup_message_store);
    assert!(matches!(
        Engine::create(duplicate_stores),
        Err(EngineError::DuplicateStore(_))
    ));

    let duplicate_actions = Config::new()
        .actions("message", CreatorMap::new().alias("ping"))
        .actions("message", CreatorMap::new().alias("pong"));
    assert!(matches!(
        Engine::create(duplicate_actions),
        Err(EngineError::DuplicateNamespace(_))
    ));
}

#[test]
fn reaction_maps_nest_one_level_only() {
    let config = Config::new().stores("outer", |_store| {
        ReactionMap::new().namespace(
            "middle",
            ReactionMap::new().namespace("inner", ReactionMap::new().on("x", |_| Ok(None))),
        )
    });
    assert!(matches!(
        Engine::create(config),
        Err(EngineError::ReactionDepth { .. })
    ));
}

#[test]
fn registries_preserve_declaration_order() {
    let engine = Engine::create(
        Config::new()
            .stores("zeta", |_| ReactionMap::new().on("a", |_| Ok(None)))
            .stores("alpha", |_| ReactionMap::new().on("b", |_| Ok(None))),
    )
    .unwrap();

    assert_eq!(engine.store_names(), vec!["zeta", "alpha"]);
    assert_eq!(
        engine.actions("zeta").unwrap().names().unwrap(),
        vec!["a"]
    );
}
