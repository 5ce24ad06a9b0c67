//! Runs the HTTP client against the in-memory stub backend on an ephemeral port.

use api_client::{ClientConfig, HttpApi, DEFAULT_TIMEOUT};
use api_rest::{AppState, Seed};
use api_shared::{
    CategoryId, LocationId, LocationLevel, LookupKind, NewProperty, PrisonerId, PropertyStatusId,
    PropertyTypeId, PropertyUpdate, UnitId, UserId, VisitorId, VisitorItemId,
};
use pims_core::{
    Actor, ApiError, DraftEdit, IntakeSession, Notice, RecordsApi, StatusChannel,
    SubmissionOutcome,
};
use pims_types::BagNumber;
use rust_decimal::Decimal;
use std::sync::Arc;

const TOKEN: &str = "integration-token";

async fn start_stub() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr should resolve");
    let seed = Seed::bundled().expect("bundled seed should parse");
    tokio::spawn(api_rest::serve(listener, AppState::new(seed, TOKEN)));
    format!("http://{addr}")
}

fn client(base_url: &str, token: &str) -> HttpApi {
    let cfg = ClientConfig::new(base_url, token, DEFAULT_TIMEOUT).expect("config should be valid");
    HttpApi::new(cfg).expect("client should build")
}

fn cash(bag: &str) -> NewProperty {
    NewProperty {
        prisoner: PrisonerId(1),
        visitor: VisitorId(1),
        visitor_item: VisitorItemId(10),
        category: CategoryId(1),
        measurement_unit: UnitId(1),
        quantity: Decimal::ONE,
        amount: Some(Decimal::new(50000, 0)),
        property_type: PropertyTypeId(1),
        property_status: PropertyStatusId(1),
        bag_no: BagNumber::parse(bag).expect("bag should be valid"),
        destination: None,
        note: None,
        next_of_kin: None,
        created_by: UserId(7),
    }
}

#[tokio::test]
async fn test_health_and_scoped_lists() {
    let base = start_stub().await;
    let api = client(&base, TOKEN);

    let health = api.health().await.expect("health should succeed");
    assert!(health.ok);

    let districts = api
        .list_locations(LocationLevel::District, Some(LocationId(1)))
        .await
        .expect("districts should load")
        .into_results();
    assert_eq!(districts.len(), 2);

    let units = api
        .list_lookups(LookupKind::Units)
        .await
        .expect("units should load");
    assert_eq!(units.count, Some(2));

    let statuses = api
        .list_property_statuses(Some(CategoryId(3)))
        .await
        .expect("statuses should load");
    assert!(statuses.is_empty());
}

#[tokio::test]
async fn test_wrong_token_is_a_401_status() {
    let base = start_stub().await;
    let api = client(&base, "not-the-token");

    let err = api
        .list_visitors(PrisonerId(1))
        .await
        .expect_err("request should be rejected");
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid API token"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_prisoner_without_visitors_reads_as_empty() {
    let base = start_stub().await;
    let api = client(&base, TOKEN);

    let page = api
        .list_visitors(PrisonerId(2))
        .await
        .expect("visitors should load");
    assert!(page.results.is_none());
    assert!(page.into_results().is_empty());
}

#[tokio::test]
async fn test_property_create_update_delete() {
    let base = start_stub().await;
    let api = client(&base, TOKEN);

    let created = api
        .create_property(&cash("C-1"))
        .await
        .expect("create should succeed");
    assert_eq!(created.bag_no, "C-1");

    let duplicate = api
        .create_property(&cash("C-1"))
        .await
        .expect_err("bag numbers are unique");
    assert!(matches!(duplicate, ApiError::Status { status: 400, .. }));

    let updated = api
        .update_property(
            created.id,
            &PropertyUpdate {
                property_type: PropertyTypeId(1),
                property_status: PropertyStatusId(1),
                bag_no: BagNumber::parse("C-2").expect("bag should be valid"),
                destination: Some("Store room".into()),
                note: None,
                next_of_kin: None,
            },
        )
        .await
        .expect("update should succeed");
    assert_eq!(updated.bag_no, "C-2");
    assert_eq!(updated.destination.as_deref(), Some("Store room"));

    api.delete_property(created.id)
        .await
        .expect("delete should succeed");
    let gone = api
        .get_property(created.id)
        .await
        .expect_err("deleted property should be gone");
    assert!(matches!(gone, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_intake_session_saves_every_row() {
    let base = start_stub().await;
    let api = Arc::new(client(&base, TOKEN));
    let actor = Actor::new(UserId(7), "Officer Okello").expect("actor should be valid");
    let mut session = IntakeSession::new(Arc::clone(&api), StatusChannel::new());

    session.select_prisoner(PrisonerId(1)).await;
    session
        .select_visitor(VisitorId(1))
        .await
        .expect("select visitor should succeed");

    let first = session.form().drafts().first().id();
    let second = session.add_draft().expect("add draft should succeed");
    let rows = [
        (first, 10, PropertyTypeId(1), "S-1"),
        (second, 11, PropertyTypeId(2), "S-2"),
    ];
    for (draft, item, property_type, bag) in rows {
        session
            .select_visitor_item(draft, VisitorItemId(item))
            .await
            .expect("select item should succeed");
        for edit in [
            DraftEdit::PropertyType(Some(property_type)),
            DraftEdit::PropertyStatus(Some(PropertyStatusId(1))),
            DraftEdit::Bag(bag.to_string()),
        ] {
            session.edit_draft(draft, edit).expect("edit should succeed");
        }
    }

    let outcome = session.submit(&actor).await.expect("submit should succeed");
    match outcome {
        SubmissionOutcome::Completed(created) => assert_eq!(created.len(), 2),
        SubmissionOutcome::Partial(report) => panic!("unexpected partial submission: {report}"),
    }
    assert_eq!(
        session.status().snapshot().notice,
        Some(Notice::Success("2 items saved".to_string()))
    );
}
