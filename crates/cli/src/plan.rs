//! YAML intake plans for `pims intake --plan`.
//!
//! ```yaml
//! prisoner: 1
//! visitor: 1
//! items:
//!   - { visitor_item: 10, property_type: 1, property_status: 1, bag_no: B-100 }
//!   - visitor_item: 11
//!     property_type: 2
//!     property_status: 1
//!     bag_no: B-101
//!     note: Screen cracked
//! ```

use anyhow::{bail, Context, Result};
use api_shared::{
    NextOfKinId, PrisonerId, PropertyStatusId, PropertyTypeId, VisitorId, VisitorItemId,
};
use pims_core::{DraftEdit, IntakeSession, RecordsApi};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakePlan {
    pub prisoner: PrisonerId,
    pub visitor: VisitorId,
    pub items: Vec<PlannedItem>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedItem {
    pub visitor_item: VisitorItemId,
    pub property_type: PropertyTypeId,
    pub property_status: PropertyStatusId,
    pub bag_no: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub next_of_kin: Option<NextOfKinId>,
}

impl PlannedItem {
    fn edits(&self) -> Vec<DraftEdit> {
        vec![
            DraftEdit::PropertyType(Some(self.property_type)),
            DraftEdit::PropertyStatus(Some(self.property_status)),
            DraftEdit::Bag(self.bag_no.clone()),
            DraftEdit::Destination(self.destination.clone().unwrap_or_default()),
            DraftEdit::Note(self.note.clone().unwrap_or_default()),
            DraftEdit::NextOfKin(self.next_of_kin),
        ]
    }
}

impl IntakePlan {
    pub fn parse(text: &str) -> Result<Self> {
        let plan: IntakePlan = serde_yaml::from_str(text).context("invalid intake plan")?;
        if plan.items.is_empty() {
            bail!("intake plan lists no items");
        }
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read intake plan {}", path.display()))?;
        Self::parse(&text)
    }

    /// Drive `session` through the selections and edits the plan describes, one draft row per
    /// planned item.
    pub async fn fill<A: RecordsApi + ?Sized>(&self, session: &mut IntakeSession<A>) -> Result<()> {
        session.select_prisoner(self.prisoner).await;
        if session.form().visitors().visitors().is_empty() {
            let reason = session.form().visitors().blocking_reason().unwrap_or_default();
            bail!("cannot select visitor {}: {reason}", self.visitor);
        }
        session.select_visitor(self.visitor).await?;
        if let Some(reason) = session.form().visitors().blocking_reason() {
            bail!("{reason}");
        }

        for (index, item) in self.items.iter().enumerate() {
            let draft = match index {
                0 => session.form().drafts().first().id(),
                _ => session.add_draft()?,
            };
            session
                .select_visitor_item(draft, item.visitor_item)
                .await
                .with_context(|| format!("item {}", index + 1))?;
            for edit in item.edits() {
                session
                    .edit_draft(draft, edit)
                    .with_context(|| format!("item {}", index + 1))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{ClientConfig, HttpApi, DEFAULT_TIMEOUT};
    use api_rest::{AppState, Seed};
    use pims_core::StatusChannel;
    use std::io::Write;
    use std::sync::Arc;

    const PLAN: &str = "\
prisoner: 1
visitor: 1
items:
  - { visitor_item: 10, property_type: 1, property_status: 1, bag_no: P-1 }
  - visitor_item: 11
    property_type: 2
    property_status: 1
    bag_no: P-2
    note: Screen cracked
";

    async fn stub_api() -> Arc<HttpApi> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr should resolve");
        let seed = Seed::bundled().expect("bundled seed should parse");
        tokio::spawn(api_rest::serve(listener, AppState::new(seed, "t")));
        let cfg = ClientConfig::new(format!("http://{addr}"), "t", DEFAULT_TIMEOUT)
            .expect("config should be valid");
        Arc::new(HttpApi::new(cfg).expect("client should build"))
    }

    #[test]
    fn test_load_reads_plan_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        file.write_all(PLAN.as_bytes())
            .expect("write should succeed");

        let plan = IntakePlan::load(file.path()).expect("plan should load");
        assert_eq!(plan.prisoner, PrisonerId(1));
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[1].note.as_deref(), Some("Screen cracked"));
    }

    #[test]
    fn test_plan_without_items_is_rejected() {
        assert!(IntakePlan::parse("prisoner: 1\nvisitor: 1\nitems: []\n").is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let text = "prisoner: 1\nvisitor: 1\ncolour: red\nitems: []\n";
        assert!(IntakePlan::parse(text).is_err());
    }

    #[tokio::test]
    async fn test_fill_builds_one_row_per_item() {
        let api = stub_api().await;
        let mut session = IntakeSession::new(api, StatusChannel::new());
        let plan = IntakePlan::parse(PLAN).expect("plan should parse");

        plan.fill(&mut session).await.expect("fill should succeed");

        let drafts = session.form().drafts();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts.last().bag_no(), "P-2");
        assert!(session.form().can_submit());
    }

    #[tokio::test]
    async fn test_fill_stops_when_prisoner_has_no_visitors() {
        let api = stub_api().await;
        let mut session = IntakeSession::new(api, StatusChannel::new());
        let plan = IntakePlan::parse(&PLAN.replace("prisoner: 1", "prisoner: 2"))
            .expect("plan should parse");

        let err = plan
            .fill(&mut session)
            .await
            .expect_err("no visitors are registered");
        assert!(err.to_string().contains("cannot select visitor 1"));
    }
}
