/// Access to the host page's tickets table

use crate::columns::{ColumnIndexMap, MARKER_ATTRIBUTE};
use crate::config::{ArchiverConfig, IdentityScheme};
use crate::identity::{RowIdentity, TableRow, extract_identity};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlTableRowElement, NodeList};

pub(crate) fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub struct TicketTable {
    element: Element,
}

impl TicketTable {
    pub fn find(document: &Document, table_id: &str) -> Option<TicketTable> {
        document
            .get_element_by_id(table_id)
            .map(|element| TicketTable { element })
    }

    pub fn header_row(&self) -> Option<Element> {
        self.element.query_selector("thead tr").ok().flatten()
    }

    pub fn header_cells(&self) -> Vec<Element> {
        self.element
            .query_selector_all("thead th")
            .map(elements)
            .unwrap_or_default()
    }

    /// Current body rows, queried fresh on every call
    pub fn rows(&self) -> Vec<DomRow> {
        self.element
            .query_selector_all("tbody tr")
            .map(elements)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlTableRowElement>().ok())
            .map(DomRow::new)
            .collect()
    }
}

/// A `<tr>` of the tickets body
pub struct DomRow {
    element: HtmlTableRowElement,
}

impl DomRow {
    pub fn new(element: HtmlTableRowElement) -> DomRow {
        DomRow { element }
    }

    pub fn element(&self) -> &HtmlTableRowElement {
        &self.element
    }

    pub fn cell(&self, index: usize) -> Option<Element> {
        u32::try_from(index)
            .ok()
            .and_then(|i| self.element.cells().item(i))
    }

    /// `datetime` attribute of the `<time>` inside a cell, falling back to
    /// the cell's text
    pub fn cell_datetime(&self, index: usize) -> Option<String> {
        let cell = self.cell(index)?;
        cell.query_selector("time")
            .ok()
            .flatten()
            .and_then(|time| time.get_attribute("datetime"))
            .or_else(|| cell.text_content())
    }

    pub fn query(&self, selector: &str) -> Option<Element> {
        self.element.query_selector(selector).ok().flatten()
    }

    pub fn is_hidden(&self) -> bool {
        self.element.has_attribute("hidden")
    }

    pub fn set_hidden(&self, hidden: bool) -> Result<(), JsValue> {
        if hidden {
            self.element.set_attribute("hidden", "")
        } else {
            self.element.remove_attribute("hidden")
        }
    }
}

impl TableRow for DomRow {
    fn cell_text(&self, index: usize) -> Option<String> {
        self.cell(index).and_then(|cell| cell.text_content())
    }
}

/// State for one augmentation pass: the located table and the column
/// positions read from its header. Built fresh for every pass and click.
pub struct PagePass {
    pub table: TicketTable,
    pub columns: ColumnIndexMap,
}

impl PagePass {
    pub fn begin(document: &Document, config: &ArchiverConfig) -> Option<PagePass> {
        let table = TicketTable::find(document, &config.table_id)?;
        let columns = ColumnIndexMap::locate(
            table
                .header_cells()
                .iter()
                .map(|th| th.get_attribute(MARKER_ATTRIBUTE)),
        );
        Some(PagePass { table, columns })
    }

    pub fn identities(&self, rows: &[DomRow], scheme: IdentityScheme) -> Vec<Option<RowIdentity>> {
        rows.iter()
            .map(|row| extract_identity(row, &self.columns, scheme).ok())
            .collect()
    }
}
