//! JSON rendering of a [`Report`], for consumers that post-process the
//! digest instead of reading it.

use crate::models::Report;

pub fn report_to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
