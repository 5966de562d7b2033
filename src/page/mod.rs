/// Content script: wires the archive synchronizer into the host page
pub mod controls;
pub mod gate;
pub mod merge;
pub mod observer;
pub mod store;
pub mod table;

use crate::config::{ArchiverConfig, RemovalMode};
use crate::identity::{RowIdentity, extract_identity};
use crate::storage::ArchiveRecordSet;
use crate::sync::{ArchiveSynchronizer, RecordChange, plan_reconciliation};
use controls::{RowAction, ViewMode};
use std::cell::Cell;
use std::rc::Rc;
use store::BrowserStore;
use table::{DomRow, PagePass};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlTableRowElement};

fn document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

pub struct ContentScript {
    config: ArchiverConfig,
    sync: ArchiveSynchronizer<BrowserStore>,
    mode: Cell<ViewMode>,
}

impl ContentScript {
    pub fn new(config: ArchiverConfig) -> Rc<ContentScript> {
        let sync = ArchiveSynchronizer::new(BrowserStore, config.storage_key.clone())
            .with_dedupe(config.dedupe_on_write);
        Rc::new(ContentScript {
            config,
            sync,
            mode: Cell::new(ViewMode::default()),
        })
    }

    /// Augment the page if it is a ticket queue and keep augmenting it
    /// after every PJAX navigation
    pub fn start(self: &Rc<Self>) {
        let Some(document) = document() else {
            log::warn!("No document available");
            return;
        };
        if !gate::page_allows(&document, &self.config) {
            log::info!("Not an osTicket queue page, archiver inactive");
            return;
        }

        self.augment();

        match document.get_element_by_id(&self.config.container_id) {
            Some(container) => {
                let this = Rc::clone(self);
                if let Err(e) = observer::observe_container(&container, move || this.augment()) {
                    log::error!("Failed to observe page changes: {:?}", e);
                }
            }
            None => log::warn!("No #{} container, PJAX navigation will not be followed", self.config.container_id),
        }
    }

    /// One augmentation pass: locate columns, attach controls to new rows,
    /// then reconcile against the stored record set
    fn augment(self: &Rc<Self>) {
        let Some(document) = document() else {
            return;
        };
        let Some(pass) = PagePass::begin(&document, &self.config) else {
            log::debug!("No #{} table on this page", self.config.table_id);
            return;
        };

        for role in self.config.identity.required_roles() {
            if let Err(e) = pass.columns.require(*role) {
                log::warn!("{}, archive controls disabled", e);
                return;
            }
        }

        if self.config.merge_dates {
            if let Err(e) = merge::merge_dates(&document, &pass) {
                log::error!("Failed to merge date columns: {:?}", e);
            }
        }

        if let Err(e) = self.attach(&document, &pass) {
            log::error!("Failed to attach archive controls: {:?}", e);
        }

        self.refresh();
    }

    fn attach(self: &Rc<Self>, document: &Document, pass: &PagePass) -> Result<(), JsValue> {
        if let Some(counter) = controls::ensure_counter(document, &pass.table)? {
            let this = Rc::clone(self);
            let on_click = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_| this.toggle_review());
            counter.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
            on_click.forget();
        }

        for row in pass.table.rows() {
            let Some(button) = controls::ensure_row_control(document, &row)? else {
                continue;
            };
            let this = Rc::clone(self);
            let element = row.element().clone();
            let on_click = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_| {
                this.on_row_action(&element);
            });
            button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
            on_click.forget();
        }

        Ok(())
    }

    fn on_row_action(self: &Rc<Self>, element: &HtmlTableRowElement) {
        let row = DomRow::new(element.clone());
        let Some(action) = controls::row_action(&row) else {
            return;
        };
        let Some(pass) = document().and_then(|document| PagePass::begin(&document, &self.config)) else {
            return;
        };
        let identity = match extract_identity(&row, &pass.columns, self.config.identity) {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("Ignoring {:?} click: {}", action, e);
                return;
            }
        };

        let this = Rc::clone(self);
        spawn_local(async move {
            this.run_action(action, identity).await;
        });
    }

    /// Persist the action, then update the page from the committed set
    async fn run_action(&self, action: RowAction, identity: RowIdentity) {
        let change = match action {
            RowAction::Archive => RecordChange::Archive(identity),
            RowAction::Restore => RecordChange::Restore(identity),
        };

        if let Err(e) = self.sync.commit(change, |records| self.apply(records)).await {
            log::error!("{:?} failed: {}", action, e);
        }
    }

    fn toggle_review(self: &Rc<Self>) {
        if self.config.removal == RemovalMode::Remove {
            return;
        }
        self.mode.set(self.mode.get().toggled());
        self.refresh();
    }

    /// Reload the stored set and reconcile the page with it
    fn refresh(self: &Rc<Self>) {
        let this = Rc::clone(self);
        spawn_local(async move {
            match this.sync.load().await {
                Ok(records) => this.apply(&records),
                Err(e) => log::error!("Failed to load archived tickets: {}", e),
            }
        });
    }

    fn apply(&self, records: &ArchiveRecordSet) {
        let Some(document) = document() else {
            return;
        };
        let Some(pass) = PagePass::begin(&document, &self.config) else {
            return;
        };
        if let Err(e) = self.apply_to(&document, &pass, records) {
            log::error!("Failed to update archived rows: {:?}", e);
        }
    }

    fn apply_to(&self, document: &Document, pass: &PagePass, records: &ArchiveRecordSet) -> Result<(), JsValue> {
        let rows = pass.table.rows();
        let plan = plan_reconciliation(&pass.identities(&rows, self.config.identity), records);
        let mode = self.mode.get();

        let archived = match self.config.removal {
            RemovalMode::Hide => {
                for (index, row) in rows.iter().enumerate() {
                    let archived = plan.is_hidden(index);
                    let hidden = archived && mode == ViewMode::Archiving;
                    if row.is_hidden() != hidden {
                        row.set_hidden(hidden)?;
                    }
                    controls::set_row_action(row, controls::action_for(mode, archived))?;
                }
                plan.hidden.len()
            }
            RemovalMode::Remove => {
                for index in &plan.hidden {
                    rows[*index].element().remove();
                }
                records.len()
            }
        };

        controls::set_counter(document, &controls::counter_label(mode, archived));
        log::debug!("{} rows archived, {} records not on this page", plan.hidden.len(), plan.stale);
        Ok(())
    }
}
