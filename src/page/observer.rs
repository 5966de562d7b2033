/// Re-running the archiver when the host swaps page content over PJAX

use wasm_bindgen::prelude::*;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord, Node};

/// The parts of a mutation record that decide whether to re-augment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationSignal {
    pub child_list: bool,
    pub added_nodes: u32,
    pub targets_container: bool,
}

/// Only new children of the container itself count. Our own edits land on
/// rows and cells deeper in the subtree and must not retrigger a pass.
pub fn should_reaugment<I>(signals: I) -> bool
where
    I: IntoIterator<Item = MutationSignal>,
{
    signals
        .into_iter()
        .any(|s| s.child_list && s.added_nodes > 0 && s.targets_container)
}

/// Watch `container` and call `on_change` once per batch of mutations that
/// replaces its content
pub fn observe_container<F>(container: &Element, on_change: F) -> Result<MutationObserver, JsValue>
where
    F: Fn() + 'static,
{
    let target: Node = container.clone().into();

    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |records: js_sys::Array, _observer: MutationObserver| {
            let signals = records
                .iter()
                .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
                .map(|record| MutationSignal {
                    child_list: record.type_() == "childList",
                    added_nodes: record.added_nodes().length(),
                    targets_container: record
                        .target()
                        .is_some_and(|node| node.is_same_node(Some(&target))),
                });

            if should_reaugment(signals) {
                log::debug!("Page content replaced, re-running archiver");
                on_change();
            }
        },
    );

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(container, &options)?;

    // The observer lives as long as the page
    callback.forget();

    Ok(observer)
}
