/// Archive/restore buttons and the archive counter

use crate::page::table::{DomRow, TicketTable};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

pub const COUNTER_ID: &str = "archiveCounter";
pub const CONTROL_CELL_CLASS: &str = "button-container";
pub const ACTION_ATTRIBUTE: &str = "data-archive-action";

/// Whether archived rows are hidden or shown for review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Archiving,
    Reviewing,
}

impl ViewMode {
    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::Archiving => ViewMode::Reviewing,
            ViewMode::Reviewing => ViewMode::Archiving,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Archive,
    Restore,
}

impl RowAction {
    pub fn attribute_value(self) -> &'static str {
        match self {
            RowAction::Archive => "archive",
            RowAction::Restore => "restore",
        }
    }

    pub fn from_attribute(value: &str) -> Option<RowAction> {
        match value {
            "archive" => Some(RowAction::Archive),
            "restore" => Some(RowAction::Restore),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowAction::Archive => "📥",
            RowAction::Restore => "📤",
        }
    }

    fn style(self) -> &'static str {
        match self {
            RowAction::Archive => "margin: 5px;",
            RowAction::Restore => "margin: 5px; background-color: lightcoral;",
        }
    }
}

/// Button a row should carry: restore only for archived rows under review
pub fn action_for(mode: ViewMode, archived: bool) -> RowAction {
    if mode == ViewMode::Reviewing && archived {
        RowAction::Restore
    } else {
        RowAction::Archive
    }
}

pub fn counter_label(mode: ViewMode, archived: usize) -> String {
    match mode {
        ViewMode::Archiving => format!("📥 ({})", archived),
        ViewMode::Reviewing => "👁️".to_string(),
    }
}

/// Give `row` a control cell with an archive button.
///
/// Returns the new button, or `None` when the row already carries one.
pub fn ensure_row_control(document: &Document, row: &DomRow) -> Result<Option<Element>, JsValue> {
    let selector = format!(".{} button", CONTROL_CELL_CLASS);
    if row.query(&selector).is_some() {
        return Ok(None);
    }

    let cell = match row.query(&format!(".{}", CONTROL_CELL_CLASS)) {
        Some(cell) => cell,
        None => {
            let cell = document.create_element("td")?;
            cell.set_class_name(CONTROL_CELL_CLASS);
            cell.set_attribute("style", "text-align: center; vertical-align: middle;")?;
            row.element().append_child(&cell)?;
            cell
        }
    };

    let button = document.create_element("button")?;
    button.set_attribute("type", "button")?;
    set_button_action(&button, RowAction::Archive)?;
    cell.append_child(&button)?;

    Ok(Some(button))
}

fn set_button_action(button: &Element, action: RowAction) -> Result<(), JsValue> {
    button.set_attribute(ACTION_ATTRIBUTE, action.attribute_value())?;
    button.set_attribute("style", action.style())?;
    button.set_text_content(Some(action.label()));
    Ok(())
}

/// Action currently offered by the row's button
pub fn row_action(row: &DomRow) -> Option<RowAction> {
    row.query(&format!(".{} button", CONTROL_CELL_CLASS))
        .and_then(|button| button.get_attribute(ACTION_ATTRIBUTE))
        .and_then(|value| RowAction::from_attribute(&value))
}

pub fn set_row_action(row: &DomRow, action: RowAction) -> Result<(), JsValue> {
    match row.query(&format!(".{} button", CONTROL_CELL_CLASS)) {
        Some(button) if row_action(row) != Some(action) => set_button_action(&button, action),
        _ => Ok(()),
    }
}

/// Add the counter header cell if the page has none yet
pub fn ensure_counter(document: &Document, table: &TicketTable) -> Result<Option<Element>, JsValue> {
    if document.get_element_by_id(COUNTER_ID).is_some() {
        return Ok(None);
    }
    let Some(header_row) = table.header_row() else {
        return Ok(None);
    };

    let counter = document.create_element("th")?;
    counter.set_id(COUNTER_ID);
    counter.set_attribute(
        "style",
        "cursor: pointer; text-align: center; vertical-align: middle;",
    )?;
    header_row.append_child(&counter)?;

    Ok(Some(counter))
}

pub fn set_counter(document: &Document, label: &str) {
    if let Some(counter) = document.get_element_by_id(COUNTER_ID) {
        counter.set_text_content(Some(label));
    }
}
