use conflux::{Config, Engine, ReactionMap, StoreContext};
use serde_json::{Value, json};

// ============================================================================
// Store Fixtures
// ============================================================================

/// A message store: seeds `{messages: []}` and appends every argument of an
/// `add_message` payload to the list.
pub fn setup_message_store(store: StoreContext) -> ReactionMap {
    store.set_state(json!({ "messages": [] }));
    ReactionMap::new().on("add_message", {
        let store = store.clone();
        move |args| {
            let mut messages = store.state()["messages"]
                .as_array()
                .cloned()
                .unwrap_or_default();
            messages.extend(args.iter().cloned());
            Ok(Some(json!({ "messages": messages })))
        }
    })
}

/// The two-store wait-for pair: `id` counts `message.add_message`
/// occurrences, `message` stamps each entry with the counter it reads from
/// `id`, stale unless it waits.
pub fn wait_for_engine(does_wait: bool) -> Engine {
    Engine::create(
        Config::new()
            .stores("message", move |store| {
                store.set_state(json!({ "messages": [] }));
                ReactionMap::new().on("add_message", {
                    let store = store.clone();
                    move |args| {
                        if does_wait {
                            store.wait_for("id")?;
                        }
                        let id = store.store("id")?.state()["id"].clone();
                        let content = args.first().cloned().unwrap_or(Value::Null);
                        let mut messages = store.state()["messages"]
                            .as_array()
                            .cloned()
                            .unwrap_or_default();
                        messages.push(json!({ "id": id, "content": content }));
                        Ok(Some(json!({ "messages": messages })))
                    }
                })
            })
            .stores("id", |store| {
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
            }),
    )
    .expect("fixture config is valid")
}

// ============================================================================
// Error Helpers
// ============================================================================

/// Whether any error in the source chain mentions `needle`.
pub fn chain_contains(error: &dyn std::error::Error, needle: &str) -> bool {
    let mut current: Option<&dyn std::error::Error> = Some(error);
    while let Some(err) = current {
        if err.to_string().contains(needle) {
            return true;
        }
        current = err.source();
    }
    false
}
