//! Wait-for ordering, cycle detection and the reentrancy guard.

use conflux::{ActionHandle, Config, DispatchError, Engine, EngineError, ReactionMap};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

mod common;
use common::{chain_contains, wait_for_engine};

#[test]
fn stale_read_without_wait_for() {
    let engine = wait_for_engine(false);

    engine
        .action("message", "add_message")
        .unwrap()
        .call(vec![json!("Hello, world!")])
        .unwrap();

    // The message store ran before the id store updated.
    assert_eq!(
        *engine.store("message").unwrap().state(),
        json!({ "messages": [{ "id": 0, "content": "Hello, world!" }] })
    );
}

#[test]
fn wait_for_orders_the_dependency_first() {
    let engine = wait_for_engine(true);

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
fn each_callback_runs_at_most_once_per_cycle() {
    let invocations = Rc::new(Cell::new(0usize));

    // Both "first" and "second" pull "counter" forward; its natural turn
    // comes last and must be skipped.
    let count_store = {
        let invocations = Rc::clone(&invocations);
        move |store: conflux::StoreContext| {
            store.set_state(json!({ "n": 0 }));
            ReactionMap::new().namespace(
                "ping",
                ReactionMap::new().on("fire", {
                    let store = store.clone();
                    let invocations = Rc::clone(&invocations);
                    move |_args| {
                        invocations.set(invocations.get() + 1);
                        let next = store.state()["n"].as_i64().unwrap_or(0) + 1;
                        Ok(Some(json!({ "n": next })))
                    }
                }),
            )
        }
    };

    let waiting_store = |store: conflux::StoreContext| {
        ReactionMap::new().namespace(
            "ping",
            ReactionMap::new().on("fire", {
                let store = store.clone();
                move |_args| {
                    store.wait_for("counter")?;
                    Ok(None)
                }
            }),
        )
    };

    let engine = Engine::create(
        Config::new()
            .stores("first", waiting_store)
            .stores("second", waiting_store)
            .stores("counter", count_store),
    )
    .unwrap();

    engine.action("ping", "fire").unwrap().call(vec![]).unwrap();

    assert_eq!(invocations.get(), 1, "counter reaction must run exactly once");
    assert_eq!(engine.store("counter").unwrap().state()["n"], json!(1));
}

#[test]
fn circular_wait_for_fails_the_dispatch() {
    let waits_on = |other: &'static str| {
        move |store: conflux::StoreContext| {
            ReactionMap::new().namespace(
                "ping",
                ReactionMap::new().on("fire", {
                    let store = store.clone();
                    move |_args| {
                        store.wait_for(other)?;
                        Ok(None)
                    }
                }),
            )
        }
    };

    let engine = Engine::create(
        Config::new()
            .stores("a", waits_on("b"))
            .stores("b", waits_on("a")),
    )
    .unwrap();

    let result = engine.action("ping", "fire").unwrap().call(vec![]);
    let error = result.expect_err("mutual wait_for must fail");
    assert!(
        chain_contains(&error, "circular wait_for dependency"),
        "unexpected error chain: {error:?}"
    );
}

#[test]
fn wait_for_unknown_store_fails() {
    let engine = Engine::create(Config::new().stores("a", |store| {
        ReactionMap::new().on("poke", {
            let store = store.clone();
            move |_args| {
                store.wait_for("missing")?;
                Ok(None)
            }
        })
    }))
    .unwrap();

    let error = engine
        .action("a", "poke")
        .unwrap()
        .call(vec![])
        .expect_err("waiting on an unregistered store must fail");
    assert!(
        chain_contains(&error, "unknown store namespace: missing"),
        "unexpected error chain: {error:?}"
    );
}

#[test]
fn dispatch_inside_a_reaction_fails() {
    let reentrant: Rc<RefCell<Option<ActionHandle>>> = Rc::new(RefCell::new(None));

    let engine = Engine::create(Config::new().stores("a", {
        let reentrant = Rc::clone(&reentrant);
        move |_store| {
            ReactionMap::new().on("poke", move |_args| {
                let action = reentrant
                    .borrow()
                    .clone()
                    .expect("handle is filled in before dispatching");
                // Calling any action from inside a running reaction is a
                // nested dispatch.
                action.call(vec![])?;
                Ok(None)
            })
        }
    }))
    .unwrap();

    *reentrant.borrow_mut() = Some(engine.action("a", "poke").unwrap());

    let error = engine
        .action("a", "poke")
        .unwrap()
        .call(vec![])
        .expect_err("nested dispatch must fail");
    assert!(matches!(
        error,
        EngineError::Dispatch(DispatchError::Callback(_))
    ));
    assert!(
        chain_contains(&error, "another cycle is in progress"),
        "unexpected error chain: {error:?}"
    );
}

#[test]
fn wait_for_accepts_multiple_keys() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let recording = |name: &'static str, order: &Rc<RefCell<Vec<&'static str>>>| {
        let order = Rc::clone(order);
        move |_store: conflux::StoreContext| {
            ReactionMap::new().namespace(
                "ping",
                ReactionMap::new().on("fire", {
                    let order = Rc::clone(&order);
                    move |_args| {
                        order.borrow_mut().push(name);
                        Ok(None)
                    }
                }),
            )
        }
    };

    let engine = Engine::create(
        Config::new()
            .stores("gate", {
                let order = Rc::clone(&order);
                move |store| {
                    ReactionMap::new().namespace(
                        "ping",
                        ReactionMap::new().on("fire", {
                            let store = store.clone();
                            let order = Rc::clone(&order);
                            move |_args| {
                                store.wait_for(["x", "y"])?;
                                order.borrow_mut().push("gate");
                                Ok(None)
                            }
                        }),
                    )
                }
            })
            .stores("x", recording("x", &order))
            .stores("y", recording("y", &order)),
    )
    .unwrap();

    engine.action("ping", "fire").unwrap().call(vec![]).unwrap();

    assert_eq!(
        *order.borrow(),
        vec!["x", "y", "gate"],
        "gate must observe both dependencies before finishing"
    );
}
