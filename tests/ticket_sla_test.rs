//! Helpdesk SLA behavior: policy resolution, due-date computation, first
//! response stamping and the breach sweep.

mod common;

use backoffice_api::entities::helpdesk::ticket::{TicketPriority, TicketStatus};
use backoffice_api::services::helpdesk::{AddCommentInput, CreateSlaPolicyInput, CreateTicketInput};
use chrono::{Duration, Utc};

fn ticket_input(subject: &str, priority: TicketPriority, category_id: Option<i64>) -> CreateTicketInput {
    CreateTicketInput {
        subject: subject.to_string(),
        description: None,
        client_id: None,
        requester_email: Some("customer@example.com".into()),
        priority: Some(priority),
        category_id,
        queue_id: None,
    }
}

#[tokio::test]
async fn matching_policy_sets_due_timestamps() {
    let ctx = common::setup().await;
    ctx.helpdesk
        .create_policy(CreateSlaPolicyInput {
            name: "High priority".into(),
            priority: TicketPriority::High,
            category_id: None,
            first_response_minutes: 30,
            resolution_minutes: 240,
        })
        .await
        .unwrap();

    let before = Utc::now();
    let ticket = ctx
        .helpdesk
        .create_ticket(ticket_input("Printer on fire", TicketPriority::High, None))
        .await
        .unwrap();

    assert_eq!(ticket.ticket_number, "TCK-000001");
    let first_due = ticket.first_response_due_at.expect("first response due set");
    let resolution_due = ticket.resolution_due_at.expect("resolution due set");
    assert!(first_due >= before + Duration::minutes(29));
    assert!(first_due <= Utc::now() + Duration::minutes(31));
    assert!(resolution_due >= before + Duration::minutes(239));

    // No policy for normal priority: no deadlines.
    let unmatched = ctx
        .helpdesk
        .create_ticket(ticket_input("Question", TicketPriority::Normal, None))
        .await
        .unwrap();
    assert!(unmatched.first_response_due_at.is_none());
    assert!(unmatched.sla_policy_id.is_none());
}

#[tokio::test]
async fn category_specific_policy_wins_over_priority_wide() {
    let ctx = common::setup().await;
    let billing = ctx
        .helpdesk
        .create_category("Billing".into(), None)
        .await
        .unwrap();

    ctx.helpdesk
        .create_policy(CreateSlaPolicyInput {
            name: "High default".into(),
            priority: TicketPriority::High,
            category_id: None,
            first_response_minutes: 60,
            resolution_minutes: 480,
        })
        .await
        .unwrap();
    let specific = ctx
        .helpdesk
        .create_policy(CreateSlaPolicyInput {
            name: "High billing".into(),
            priority: TicketPriority::High,
            category_id: Some(billing.id),
            first_response_minutes: 15,
            resolution_minutes: 120,
        })
        .await
        .unwrap();

    let ticket = ctx
        .helpdesk
        .create_ticket(ticket_input(
            "Refund missing",
            TicketPriority::High,
            Some(billing.id),
        ))
        .await
        .unwrap();
    assert_eq!(ticket.sla_policy_id, Some(specific.id));
}

#[tokio::test]
async fn first_public_staff_comment_stamps_first_response() {
    let ctx = common::setup().await;
    let ticket = ctx
        .helpdesk
        .create_ticket(ticket_input("Slow site", TicketPriority::Normal, None))
        .await
        .unwrap();

    // Internal notes do not count as a response.
    ctx.helpdesk
        .add_comment(
            ticket.id,
            AddCommentInput {
                author_employee_id: Some(7),
                author_name: None,
                body: "investigating".into(),
                is_internal: true,
            },
        )
        .await
        .unwrap();
    let after_internal = ctx.helpdesk.get_ticket(ticket.id).await.unwrap();
    assert!(after_internal.first_response_at.is_none());

    ctx.helpdesk
        .add_comment(
            ticket.id,
            AddCommentInput {
                author_employee_id: Some(7),
                author_name: None,
                body: "we are on it".into(),
                is_internal: false,
            },
        )
        .await
        .unwrap();
    let after_public = ctx.helpdesk.get_ticket(ticket.id).await.unwrap();
    assert!(after_public.first_response_at.is_some());

    // Public comment listing hides internal notes.
    let public = ctx.helpdesk.list_comments(ticket.id, false).await.unwrap();
    assert_eq!(public.len(), 1);
    let all = ctx.helpdesk.list_comments(ticket.id, true).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn breach_sweep_stamps_only_overdue_unstamped_tickets() {
    let ctx = common::setup().await;
    ctx.helpdesk
        .create_policy(CreateSlaPolicyInput {
            name: "Urgent".into(),
            priority: TicketPriority::Urgent,
            category_id: None,
            first_response_minutes: 30,
            resolution_minutes: 120,
        })
        .await
        .unwrap();

    let answered = ctx
        .helpdesk
        .create_ticket(ticket_input("Answered quickly", TicketPriority::Urgent, None))
        .await
        .unwrap();
    ctx.helpdesk
        .add_comment(
            answered.id,
            AddCommentInput {
                author_employee_id: Some(3),
                author_name: None,
                body: "done".into(),
                is_internal: false,
            },
        )
        .await
        .unwrap();

    let ignored = ctx
        .helpdesk
        .create_ticket(ticket_input("Never answered", TicketPriority::Urgent, None))
        .await
        .unwrap();

    // Sweep as if 31 minutes have passed: only the unanswered ticket's first
    // response is breached; neither resolution deadline has passed.
    let stamped = ctx
        .helpdesk
        .sweep_sla_breaches(Utc::now() + Duration::minutes(31))
        .await
        .unwrap();
    assert_eq!(stamped, 1);

    let answered = ctx.helpdesk.get_ticket(answered.id).await.unwrap();
    assert!(answered.first_response_breached_at.is_none());
    let ignored_after = ctx.helpdesk.get_ticket(ignored.id).await.unwrap();
    assert!(ignored_after.first_response_breached_at.is_some());
    assert!(ignored_after.resolution_breached_at.is_none());

    // Two hours later the resolution deadline is also gone; the sweep must
    // not double-stamp the first response.
    let stamped = ctx
        .helpdesk
        .sweep_sla_breaches(Utc::now() + Duration::minutes(121))
        .await
        .unwrap();
    assert_eq!(stamped, 2);

    let ignored_after = ctx.helpdesk.get_ticket(ignored.id).await.unwrap();
    assert!(ignored_after.resolution_breached_at.is_some());
}

#[tokio::test]
async fn ticket_status_machine_guards_transitions() {
    let ctx = common::setup().await;
    let ticket = ctx
        .helpdesk
        .create_ticket(ticket_input("Lifecycle", TicketPriority::Normal, None))
        .await
        .unwrap();

    let ticket_model = ctx
        .helpdesk
        .change_status(ticket.id, TicketStatus::Resolved)
        .await
        .unwrap();
    assert!(ticket_model.resolved_at.is_some());

    let ticket_model = ctx
        .helpdesk
        .change_status(ticket.id, TicketStatus::Closed)
        .await
        .unwrap();
    assert!(ticket_model.closed_at.is_some());

    let err = ctx
        .helpdesk
        .change_status(ticket.id, TicketStatus::Open)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn watchers_and_tags_are_idempotent() {
    let ctx = common::setup().await;
    let ticket = ctx
        .helpdesk
        .create_ticket(ticket_input("Tagged", TicketPriority::Low, None))
        .await
        .unwrap();

    ctx.helpdesk.add_watcher(ticket.id, 11).await.unwrap();
    ctx.helpdesk.add_watcher(ticket.id, 11).await.unwrap();
    assert_eq!(ctx.helpdesk.list_watchers(ticket.id).await.unwrap().len(), 1);

    let tag = ctx
        .helpdesk
        .create_tag("hardware".into(), Some("#ff0000".into()))
        .await
        .unwrap();
    ctx.helpdesk.tag_ticket(ticket.id, tag.id).await.unwrap();
    ctx.helpdesk.tag_ticket(ticket.id, tag.id).await.unwrap();
    ctx.helpdesk.untag_ticket(ticket.id, tag.id).await.unwrap();
}
