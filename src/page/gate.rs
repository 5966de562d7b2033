/// Activation gate: only run on the ticket queue of an osTicket instance

use crate::config::ArchiverConfig;
use web_sys::Document;

pub fn activation_allowed(title: &str, meta_content: Option<&str>, config: &ArchiverConfig) -> bool {
    title.contains(&config.title_marker) && meta_content == Some(config.meta_value.as_str())
}

pub fn page_allows(document: &Document, config: &ArchiverConfig) -> bool {
    let selector = format!("meta[name=\"{}\"]", config.meta_name);
    let meta_content = document
        .query_selector(&selector)
        .ok()
        .flatten()
        .and_then(|meta| meta.get_attribute("content"));

    activation_allowed(&document.title(), meta_content.as_deref(), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_both_markers() {
        let config = ArchiverConfig::default();

        assert!(activation_allowed("Open Tickets :: osTicket", Some("tickets.queue"), &config));
        assert!(!activation_allowed("Open Tickets :: osTicket", Some("tickets.view"), &config));
        assert!(!activation_allowed("Open Tickets :: osTicket", None, &config));
        assert!(!activation_allowed("Open Tickets", Some("tickets.queue"), &config));
    }
}
