use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use payroll_desk::models::{ComponentKind, ResultStatus, UploadFile};
use payroll_desk::server::{router, AppState};
use payroll_desk::workflow::{breakdown, AdapterState, Provenance, UploadTarget};
use payroll_desk::{DeskConfig, DeskError, HttpBackend, Ledger, PayrollBackend, Workbench};
use rust_decimal::Decimal;
use tokio::net::TcpListener;

async fn start_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = router(AppState { ledger: Arc::new(Ledger::new()) });
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.expect("serve");
    });
    addr
}

async fn desk(addr: SocketAddr) -> Workbench<HttpBackend> {
    let config = DeskConfig::default().with_api_root(format!("http://{addr}/api"));
    let backend = HttpBackend::new(config.clone()).expect("client");
    let mut desk = Workbench::new(Arc::new(backend), config);
    desk.mount().await;
    desk
}

fn csv(name: &str, body: &str) -> UploadFile {
    UploadFile { name: name.into(), bytes: body.as_bytes().to_vec() }
}

async fn seed(desk: &mut Workbench<HttpBackend>) {
    let state = desk
        .upload(
            UploadTarget::EmployeeMaster,
            vec![csv("master.csv", "employee_id,name,base_salary\nA,Jane Archer,4000\nB,Bob Stone,3200\n")],
        )
        .await
        .expect("upload master");
    assert_eq!(state, AdapterState::Success);
    let state = desk
        .upload(
            UploadTarget::Components(ComponentKind::Incentive),
            vec![csv("june-bonus.csv", "employee_id,amount,reason\nA,1000,Quarterly bonus\n")],
        )
        .await
        .expect("upload incentives");
    assert_eq!(state, AdapterState::Success);
}

fn id_of(desk: &Workbench<HttpBackend>, emp: &str) -> i64 {
    desk.results()
        .iter()
        .find(|r| r.employee.employee_id == emp)
        .map(|r| r.id)
        .expect("result present")
}

#[tokio::test]
async fn review_and_archive_over_http() {
    let addr = start_backend().await;
    let mut desk = desk(addr).await;
    seed(&mut desk).await;

    assert!(desk.open_archive().await.unwrap_err().is_validation());

    desk.generate().await.expect("generate");
    assert_eq!(desk.results().len(), 2);
    let (a, b) = (id_of(&desk, "A"), id_of(&desk, "B"));
    assert_eq!(desk.store().get(a).unwrap().final_salary, Decimal::from(5000));
    assert_eq!(desk.store().get(b).unwrap().final_salary, Decimal::from(3200));

    desk.approve(a).await.expect("approve A");
    assert!(desk.reject(b).await.unwrap_err().is_validation());
    desk.edit_reason(b, "policy violation");
    desk.reject(b).await.expect("reject B");

    assert_eq!(desk.store().get(a).unwrap().status, ResultStatus::Approved);
    let rb = desk.store().get(b).unwrap();
    assert_eq!(rb.status, ResultStatus::Rejected);
    assert_eq!(rb.rejection_reason.as_deref(), Some("policy violation"));

    desk.open_archive().await.expect("open archive");
    desk.set_archive_name("June 2025").unwrap();
    let msg = desk.confirm_archive().await.expect("archive");
    assert!(msg.contains("June 2025"));
    assert!(desk.results().is_empty());

    let run = desk.history().runs()[0].clone();
    assert_eq!(run.label(), "June 2025");
    desk.toggle_run(run.id).await;
    let lines = desk.history().details();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.employee_id == "A" && l.final_salary == Decimal::from(5000)));
    assert!(lines.iter().any(|l| l.employee_id == "B"
        && l.rejection_reason.as_deref() == Some("policy violation")));
}

#[tokio::test]
async fn service_messages_reach_the_operator() {
    let addr = start_backend().await;
    let desk = desk(addr).await;

    let err = desk.backend().archive("").await.unwrap_err();
    assert!(matches!(err, DeskError::Service { status: 400, .. }));
    assert_eq!(err.user_message("generic"), "No payroll results to archive.");

    let err = desk.backend().reject(99, "late").await.unwrap_err();
    assert!(matches!(err, DeskError::Service { status: 404, .. }));

    let err = desk.backend().run_detail(42).await.unwrap_err();
    assert!(matches!(err, DeskError::Service { status: 404, .. }));
}

#[tokio::test]
async fn search_facet_and_run_deletion_over_http() {
    let addr = start_backend().await;
    let mut desk = desk(addr).await;
    seed(&mut desk).await;
    desk.generate().await.expect("generate");
    let a = id_of(&desk, "A");
    desk.approve(a).await.expect("approve");

    desk.set_search("jane").await;
    desk.set_status_filter(Some(ResultStatus::Approved)).await;
    assert_eq!(desk.results().len(), 1);
    desk.set_status_filter(Some(ResultStatus::Pending)).await;
    assert!(desk.results().is_empty());
    desk.set_status_filter(None).await;
    assert_eq!(desk.results().len(), 1);
    assert_eq!(desk.results()[0].employee.name, "Jane Archer");

    desk.open_archive().await.expect("open");
    desk.confirm_archive().await.expect("archive");
    let run_id = desk.history().runs()[0].id;
    assert!(desk.history().runs()[0].label().starts_with("Payroll Run - "));

    let confirmation = desk.request_delete_run(run_id).expect("listed");
    desk.confirm_delete_run(confirmation).await.expect("delete");
    assert!(desk.history().runs().is_empty());
    assert!(desk.backend().run_detail(run_id).await.is_err());
}

#[tokio::test]
async fn warnings_and_media_links_round_trip() {
    let addr = start_backend().await;
    let mut desk = desk(addr).await;
    seed(&mut desk).await;

    // sheets arrive from disk in the CLI; do the same here
    let mut sheet = tempfile::Builder::new().suffix(".csv").tempfile().expect("tempfile");
    writeln!(sheet, "employee_id,amount,reason\nA,150,Loan\nZZ,10,Ghost").unwrap();
    let bytes = tokio::fs::read(sheet.path()).await.unwrap();
    let state = desk
        .upload(
            UploadTarget::Components(ComponentKind::Deduction),
            vec![UploadFile { name: "loans.csv".into(), bytes }],
        )
        .await
        .unwrap();
    assert_eq!(state, AdapterState::Warning);
    let card = desk.upload_card(UploadTarget::Components(ComponentKind::Deduction));
    assert_eq!(card.status().warnings().len(), 1);
    assert!(card.status().warnings()[0].contains("ZZ"));

    desk.reload_employees().await;
    let form = desk.manual_entry_mut();
    form.selected_employee = Some("B".into());
    form.amount = "75".into();
    form.remark = "Holiday Gift".into();
    assert_eq!(desk.submit_manual_entry().await.unwrap(), AdapterState::Success);

    desk.generate().await.expect("generate");
    let a = desk.store().get(id_of(&desk, "A")).unwrap().clone();
    assert_eq!(a.final_salary, Decimal::from(4850));
    let lines = breakdown(&a, ComponentKind::Deduction, desk.config());
    let Provenance::SourceFile { url, .. } = &lines[0].provenance else {
        panic!("expected a sheet link, got {:?}", lines[0].provenance);
    };
    let body = reqwest::get(url).await.unwrap().text().await.unwrap();
    assert!(body.contains("ZZ,10,Ghost"));

    let b = desk.store().get(id_of(&desk, "B")).unwrap().clone();
    let lines = breakdown(&b, ComponentKind::Incentive, desk.config());
    assert_eq!(lines[0].provenance, Provenance::Text("Manual Entry".into()));
    assert_eq!(lines[0].amount, "$75.00");
}
