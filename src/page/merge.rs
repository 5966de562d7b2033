/// "Last Change" column: one cell with the most recent of a ticket's dates,
/// replacing the last-updated, last-message and last-response columns.
///
/// The replaced columns are hidden rather than removed so that header
/// positions stay valid for identity extraction.

use crate::columns::{ColumnIndexMap, ColumnRole};
use crate::error::ArchiveError;
use crate::identity::TableRow;
use crate::page::controls::{CONTROL_CELL_CLASS, COUNTER_ID};
use crate::page::table::{DomRow, PagePass};
use crate::timestamp::{format_instant, latest_of, relative_time};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

pub const LAST_CHANGE_CLASS: &str = "last-change";

struct MergeColumns {
    date_created: usize,
    last_updated: usize,
    last_message: usize,
    last_response: usize,
}

impl MergeColumns {
    fn from_map(columns: &ColumnIndexMap) -> Result<MergeColumns, ArchiveError> {
        Ok(MergeColumns {
            date_created: columns.require(ColumnRole::DateCreated)?,
            last_updated: columns.require(ColumnRole::LastUpdated)?,
            last_message: columns.require(ColumnRole::LastMessage)?,
            last_response: columns.require(ColumnRole::LastResponse)?,
        })
    }

    fn merged(&self) -> [usize; 3] {
        [self.last_updated, self.last_message, self.last_response]
    }
}

pub fn merge_dates(document: &Document, pass: &PagePass) -> Result<(), JsValue> {
    let columns = match MergeColumns::from_map(&pass.columns) {
        Ok(columns) => columns,
        Err(e) => {
            log::warn!("Not merging dates: {}", e);
            return Ok(());
        }
    };

    add_header(document, pass, &columns)?;

    let now = js_sys::Date::now() as i64;
    for row in pass.table.rows() {
        if row.query(&format!(".{}", LAST_CHANGE_CLASS)).is_some() {
            continue;
        }
        let candidates = [
            row.cell_text(columns.date_created),
            row.cell_text(columns.last_updated),
            row.cell_datetime(columns.last_message),
            row.cell_datetime(columns.last_response),
        ]
        .map(Option::unwrap_or_default);

        let cell = last_change_cell(document, &candidates, now)?;
        insert_before_controls(&row, &cell)?;
        for index in columns.merged() {
            if let Some(merged) = row.cell(index) {
                merged.set_attribute("hidden", "")?;
            }
        }
    }

    Ok(())
}

fn add_header(document: &Document, pass: &PagePass, columns: &MergeColumns) -> Result<(), JsValue> {
    let Some(header_row) = pass.table.header_row() else {
        return Ok(());
    };
    if header_row.query_selector(&format!(".{}", LAST_CHANGE_CLASS))?.is_some() {
        return Ok(());
    }

    let th = document.create_element("th")?;
    th.set_class_name(LAST_CHANGE_CLASS);
    th.set_text_content(Some("Last Change"));
    match document.get_element_by_id(COUNTER_ID) {
        Some(counter) => {
            header_row.insert_before(&th, Some(counter.as_ref()))?;
        }
        None => {
            header_row.append_child(&th)?;
        }
    }

    let headers = pass.table.header_cells();
    for index in columns.merged() {
        if let Some(header) = headers.get(index) {
            header.set_attribute("hidden", "")?;
        }
    }
    Ok(())
}

fn last_change_cell(document: &Document, candidates: &[String], now: i64) -> Result<Element, JsValue> {
    let cell = document.create_element("td")?;
    cell.set_class_name(LAST_CHANGE_CLASS);

    let Some(latest) = latest_of(candidates) else {
        return Ok(cell);
    };

    let absolute = document.create_element("span")?;
    absolute.set_text_content(format_instant(latest).as_deref());
    let relative = document.create_element("span")?;
    relative.set_text_content(Some(&format!("({})", relative_time(now, latest))));

    let br = document.create_element("br")?;
    cell.append_child(&absolute)?;
    cell.append_child(&br)?;
    cell.append_child(&relative)?;
    Ok(cell)
}

fn insert_before_controls(row: &DomRow, cell: &Element) -> Result<(), JsValue> {
    match row.query(&format!(".{}", CONTROL_CELL_CLASS)) {
        Some(controls) => row.element().insert_before(cell, Some(controls.as_ref()))?,
        None => row.element().append_child(cell)?,
    };
    Ok(())
}
