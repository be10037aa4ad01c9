//! End-to-end checks for the leave-request workflow: the two-stage approval
//! chain, the action audit log, balance debiting and illegal transitions.

mod common;

use backoffice_api::services::hr::EmployeeInput;
use backoffice_api::services::leave::SubmitLeaveInput;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

struct LeaveFixture {
    employee_id: i64,
    manager_id: i64,
    hr_id: i64,
    leave_type_id: i64,
}

async fn seed_hr(ctx: &common::TestCtx) -> LeaveFixture {
    let engineering = ctx
        .hr
        .create_department("Engineering".into(), None)
        .await
        .unwrap();

    let manager = ctx
        .hr
        .create_employee(EmployeeInput {
            first_name: "Marta".into(),
            last_name: "Lindqvist".into(),
            email: "marta@example.com".into(),
            phone: None,
            job_title: Some("Engineering Manager".into()),
            department_id: Some(engineering.id),
            manager_id: None,
            hired_at: None,
            is_active: None,
        })
        .await
        .unwrap();

    let employee = ctx
        .hr
        .create_employee(EmployeeInput {
            first_name: "Jonas".into(),
            last_name: "Baier".into(),
            email: "jonas@example.com".into(),
            phone: None,
            job_title: Some("Developer".into()),
            department_id: Some(engineering.id),
            manager_id: Some(manager.id),
            hired_at: None,
            is_active: None,
        })
        .await
        .unwrap();

    let hr_member = ctx
        .hr
        .create_employee(EmployeeInput {
            first_name: "Petra".into(),
            last_name: "Nagy".into(),
            email: "petra@example.com".into(),
            phone: None,
            job_title: Some("HR".into()),
            department_id: None,
            manager_id: None,
            hired_at: None,
            is_active: None,
        })
        .await
        .unwrap();

    let annual = ctx
        .hr
        .create_leave_type("Annual leave".into(), 25, true)
        .await
        .unwrap();

    ctx.hr
        .set_balance(employee.id, annual.id, 2024, dec!(25))
        .await
        .unwrap();

    LeaveFixture {
        employee_id: employee.id,
        manager_id: manager.id,
        hr_id: hr_member.id,
        leave_type_id: annual.id,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn full_approval_chain_debits_the_balance() {
    let ctx = common::setup().await;
    let fx = seed_hr(&ctx).await;

    // Mon 2024-07-01 .. Fri 2024-07-05 = 5 working days
    let request = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 7, 1),
            end_date: date(2024, 7, 5),
            reason: Some("summer".into()),
        })
        .await
        .unwrap();
    assert_eq!(request.status, "pending_manager");
    assert_eq!(request.working_days, dec!(5));
    assert_eq!(request.manager_id, Some(fx.manager_id));

    let request = ctx
        .leave
        .manager_decide(request.id, fx.manager_id, true, None)
        .await
        .unwrap();
    assert_eq!(request.status, "pending_hr");
    assert!(request.manager_decided_at.is_some());

    let request = ctx
        .leave
        .hr_decide(request.id, fx.hr_id, true, Some("enjoy".into()))
        .await
        .unwrap();
    assert_eq!(request.status, "approved");
    assert!(request.hr_decided_at.is_some());

    let balances = ctx
        .hr
        .list_balances(Some(fx.employee_id), Some(2024))
        .await
        .unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].used_days, dec!(5));
    assert_eq!(balances[0].remaining_days(), dec!(20));

    let actions = ctx.leave.actions(request.id).await.unwrap();
    let kinds: Vec<_> = actions.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(kinds, vec!["submitted", "manager_approved", "hr_approved"]);
    assert_eq!(actions[2].to_status, "approved");
}

#[tokio::test]
async fn transitions_outside_the_state_machine_are_rejected() {
    let ctx = common::setup().await;
    let fx = seed_hr(&ctx).await;

    let request = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 8, 5),
            end_date: date(2024, 8, 6),
            reason: None,
        })
        .await
        .unwrap();

    // HR cannot decide before the manager stage.
    let err = ctx
        .leave
        .hr_decide(request.id, fx.hr_id, true, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    // Reject at the manager stage, then nothing further is possible.
    ctx.leave
        .manager_decide(request.id, fx.manager_id, false, Some("coverage".into()))
        .await
        .unwrap();
    let err = ctx
        .leave
        .cancel(request.id, fx.employee_id, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    // The balance was never touched.
    let balances = ctx
        .hr
        .list_balances(Some(fx.employee_id), Some(2024))
        .await
        .unwrap();
    assert_eq!(balances[0].used_days, dec!(0));
}

#[tokio::test]
async fn submission_requires_balance_and_working_days() {
    let ctx = common::setup().await;
    let fx = seed_hr(&ctx).await;

    // Weekend-only span: no working days.
    let err = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 7, 6),
            end_date: date(2024, 7, 7),
            reason: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

    // More days than the yearly allocation.
    let err = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 3, 31),
            reason: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn holidays_are_excluded_from_working_days() {
    let ctx = common::setup().await;
    let fx = seed_hr(&ctx).await;

    ctx.hr
        .create_holiday("Summer day".into(), date(2024, 7, 3))
        .await
        .unwrap();

    let request = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 7, 1),
            end_date: date(2024, 7, 5),
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(request.working_days, dec!(4));
}

#[tokio::test]
async fn pending_requests_can_be_cancelled_by_the_employee() {
    let ctx = common::setup().await;
    let fx = seed_hr(&ctx).await;

    let request = ctx
        .leave
        .submit(SubmitLeaveInput {
            employee_id: fx.employee_id,
            leave_type_id: fx.leave_type_id,
            start_date: date(2024, 9, 2),
            end_date: date(2024, 9, 3),
            reason: None,
        })
        .await
        .unwrap();

    let request = ctx
        .leave
        .cancel(request.id, fx.employee_id, Some("changed plans".into()))
        .await
        .unwrap();
    assert_eq!(request.status, "cancelled");
    assert!(request.cancelled_at.is_some());

    let actions = ctx.leave.actions(request.id).await.unwrap();
    assert_eq!(actions.last().unwrap().action, "cancelled");
}
