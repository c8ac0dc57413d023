use serde::{Deserialize, Serialize};

pub mod entry {
    use super::*;

    /// Body of `POST /submit` (url-encoded form).
    ///
    /// Every field is optional so a missing one can be reported as a plain
    /// validation error instead of an extractor rejection.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryForm {
        pub date: Option<String>,
        pub amount: Option<String>,
        pub description: Option<String>,
        pub category: Option<String>,
    }

    /// Body of `POST /update/{id}` (JSON).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryUpdate {
        pub date: Option<String>,
        pub amount: Option<Amount>,
        pub description: Option<String>,
        pub category: Option<String>,
    }

    /// An amount as sent by a client: either a JSON number or its text.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Amount {
        Number(f64),
        Text(String),
    }

    impl Amount {
        /// The textual form fed to amount validation.
        pub fn into_text(self) -> String {
            match self {
                Amount::Number(value) => value.to_string(),
                Amount::Text(text) => text,
            }
        }
    }

    /// One element of `GET /entries`: `[id, date, amount, description, category]`.
    pub type EntryRow = (i64, String, f64, String, String);

    /// One element of `GET /hist_data`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct HistoryPoint {
        pub date: String,
        pub amount: f64,
        pub category: String,
    }
}

pub mod session {
    use super::*;

    /// Body of `POST /` in snapshot mode.
    #[derive(Default, Serialize, Deserialize)]
    pub struct Login {
        #[serde(default)]
        pub password: String,
    }
}
