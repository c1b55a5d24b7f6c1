//! Client and campaign attribution carried on the submission
//!
//! UTM parameters and the click id come from the landing URL; referrer and
//! entry page from the first navigation; session/visitor ids from cookies.
//! Everything funnels through the session store so later steps read one
//! source of truth instead of re-parsing the URL.

use serde::Serialize;

use super::session::{SessionKey, SessionStore};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Attribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gclid: Option<String>,
    pub referrer: String,
    pub entry_page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    /// Path of the page hosting the form
    #[serde(rename = "pagePath")]
    pub page_path: String,
    /// Two-letter language of the form that produced the submission
    pub language: String,
    /// BCP 47 tag of that form
    pub locale: String,
}

impl Attribution {
    /// Capture attribution from the landing request: the raw query string,
    /// the document referrer and the entry path. The entry page doubles as
    /// the hosting page path until [`Attribution::set_page_path`] moves it.
    pub fn from_landing(query: &str, referrer: &str, entry_page: &str) -> Self {
        let mut att = Self {
            referrer: referrer.to_string(),
            entry_page: entry_page.to_string(),
            page_path: entry_page.to_string(),
            ..Self::default()
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();
            match key.as_ref() {
                "utm_source" => att.utm_source = Some(value),
                "utm_medium" => att.utm_medium = Some(value),
                "utm_campaign" => att.utm_campaign = Some(value),
                "utm_term" => att.utm_term = Some(value),
                "utm_content" => att.utm_content = Some(value),
                "gclid" => att.gclid = Some(value),
                _ => {}
            }
        }

        att
    }

    /// Record the path of the page currently hosting the form. The entry
    /// page stays what it was; only `pagePath` follows the navigation.
    pub fn set_page_path(&mut self, path: &str) {
        self.page_path = path.to_string();
    }

    /// Persist the durable parts into the session store.
    pub fn remember(&self, session: &mut SessionStore) {
        if !self.entry_page.is_empty() {
            session.set(SessionKey::EntryPage, self.entry_page.clone());
        }
        if let Some(id) = &self.session_id {
            session.set(SessionKey::SessionId, id.clone());
        }
        if let Some(id) = &self.visitor_id {
            session.set(SessionKey::VisitorId, id.clone());
        }
    }

    /// Fill identity fields from the session store when they were not carried
    /// on this navigation.
    pub fn restore(&mut self, session: &SessionStore) {
        if self.entry_page.is_empty() {
            if let Some(page) = session.get(SessionKey::EntryPage) {
                self.entry_page = page.to_string();
            }
        }
        if self.session_id.is_none() {
            self.session_id = session.get(SessionKey::SessionId).map(str::to_string);
        }
        if self.visitor_id.is_none() {
            self.visitor_id = session.get(SessionKey::VisitorId).map(str::to_string);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_and_gclid_parsed_from_query() {
        let att = Attribution::from_landing(
            "utm_source=instagram&utm_medium=social&utm_campaign=spring&gclid=abc123&foo=bar",
            "https://instagram.com/",
            "/portfolio",
        );
        assert_eq!(att.utm_source.as_deref(), Some("instagram"));
        assert_eq!(att.utm_medium.as_deref(), Some("social"));
        assert_eq!(att.utm_campaign.as_deref(), Some("spring"));
        assert_eq!(att.utm_term, None);
        assert_eq!(att.gclid.as_deref(), Some("abc123"));
        assert_eq!(att.referrer, "https://instagram.com/");
        assert_eq!(att.entry_page, "/portfolio");
        assert_eq!(att.page_path, "/portfolio");
    }

    #[test]
    fn test_page_path_follows_navigation_entry_page_does_not() {
        let mut att = Attribution::from_landing("", "", "/portfolio");
        att.set_page_path("/questionnaire");
        assert_eq!(att.page_path, "/questionnaire");
        assert_eq!(att.entry_page, "/portfolio");
    }

    #[test]
    fn test_empty_params_are_ignored() {
        let att = Attribution::from_landing("utm_source=&utm_medium=email", "", "/");
        assert_eq!(att.utm_source, None);
        assert_eq!(att.utm_medium.as_deref(), Some("email"));
    }

    #[test]
    fn test_remember_and_restore_round_trip() {
        let mut session = SessionStore::new();
        let mut first = Attribution::from_landing("", "", "/landing");
        first.visitor_id = Some("v-9".to_string());
        first.remember(&mut session);

        let mut later = Attribution::from_landing("", "", "");
        later.restore(&session);
        assert_eq!(later.entry_page, "/landing");
        assert_eq!(later.visitor_id.as_deref(), Some("v-9"));
        assert_eq!(later.session_id, None);
    }
}
