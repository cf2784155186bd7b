//! Integration tests for the invoice workflow.
//!
//! Run with: `cargo test -p pettycash-db --test invoice_test`

#![allow(clippy::uninlined_format_args)]

mod common;

use chrono::NaiveDate;

use pettycash_core::{DocumentKind, LedgerError};
use pettycash_core::workflow::{InvoiceApproval, PaymentStatus, VoucherApproval};
use pettycash_db::entities::bkk_headers;
use pettycash_db::repositories::{
    CreateInvoiceInput, CreateVoucherInput, InvoiceFilter, UpdateInvoiceInput, VoucherLineInput,
};
use pettycash_db::{CounterRepository, InvoiceRepository, SaldoRepository, VoucherRepository};
use pettycash_shared::types::PageRequest;
use uuid::Uuid;

use common::{ACTOR, Fixture, TZ};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

/// Issues and approves one voucher per amount.
async fn approved_vouchers(
    repo: &VoucherRepository,
    fixture: &Fixture,
    amounts: &[i64],
) -> Vec<bkk_headers::Model> {
    let mut ids = Vec::new();
    for amount in amounts {
        let created = repo
            .create(CreateVoucherInput {
                company_id: fixture.company_id,
                branch_id: fixture.branch_id,
                kasbon_id: None,
                release_date: None,
                lines: vec![VoucherLineInput {
                    trx_id: None,
                    description: "Fuel".to_string(),
                    date: date(),
                    amount: *amount,
                    file: None,
                }],
                created_by: ACTOR.to_string(),
            })
            .await
            .unwrap();
        ids.push(created.header.id);
    }
    repo.update_approve(fixture.scope(), &ids, VoucherApproval::Approved, ACTOR)
        .await
        .unwrap()
}

fn invoice(fixture: &Fixture, sisa: i64, voucher_ids: Vec<Uuid>) -> CreateInvoiceInput {
    CreateInvoiceInput {
        company_id: fixture.company_id,
        branch_id: fixture.branch_id,
        invoice_type: "Reimbursement".to_string(),
        amount: 3_000,
        sisa_amount: sisa,
        description: "March claims".to_string(),
        invoice_date: date(),
        file: None,
        status: "Open".to_string(),
        voucher_ids,
        created_by: ACTOR.to_string(),
    }
}

async fn payment_of(repo: &VoucherRepository, fixture: &Fixture, id: Uuid) -> bkk_headers::Model {
    repo.get(fixture.scope(), id).await.unwrap().header
}

#[tokio::test]
async fn test_create_marks_vouchers_invoiced() {
    let Some(db) = common::connect().await else {
        return;
    };
    let Some(fixture) = common::setup_funded_branch(&db, 10_000, 8_000).await else {
        return;
    };
    let vouchers = VoucherRepository::new(db.clone(), TZ);
    let invoices = InvoiceRepository::new(db.clone(), TZ);

    let v = approved_vouchers(&vouchers, &fixture, &[1_000, 2_000]).await;
    let created = invoices
        .create(invoice(&fixture, 0, vec![v[0].id, v[1].id]))
        .await
        .unwrap();

    assert_eq!(created.header.num, format!("INV{}0001", fixture.short));
    assert_eq!(created.header.approval().unwrap(), InvoiceApproval::Pending);
    assert_eq!(created.details.len(), 2);
    assert!(
        created
            .details
            .iter()
            .all(|d| d.invoice_header_id == created.header.id)
    );
    assert_eq!(
        created.details.iter().map(|d| d.total_amount).sum::<i64>(),
        3_000
    );

    for voucher in &v {
        let header = payment_of(&vouchers, &fixture, voucher.id).await;
        assert_eq!(header.payment().unwrap(), PaymentStatus::Invoiced);
        assert_eq!(header.invoice_id, Some(created.header.id));
    }

    // A voucher already claimed cannot be claimed again.
    let err = invoices
        .create(invoice(&fixture, 0, vec![v[0].id]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {:?}", err);

    let fetched = invoices.get(fixture.scope(), created.header.id).await.unwrap();
    assert_eq!(fetched.details.len(), 2);

    common::cleanup(&db, &fixture).await.unwrap();
}

#[tokio::test]
async fn test_create_requires_approved_vouchers() {
    let Some(db) = common::connect().await else {
        return;
    };
    let Some(fixture) = common::setup_funded_branch(&db, 10_000, 8_000).await else {
        return;
    };
    let vouchers = VoucherRepository::new(db.clone(), TZ);
    let invoices = InvoiceRepository::new(db.clone(), TZ);

    let pending = vouchers
        .create(CreateVoucherInput {
            company_id: fixture.company_id,
            branch_id: fixture.branch_id,
            kasbon_id: None,
            release_date: None,
            lines: vec![VoucherLineInput {
                trx_id: None,
                description: "Parking".to_string(),
                date: date(),
                amount: 100,
                file: None,
            }],
            created_by: ACTOR.to_string(),
        })
        .await
        .unwrap()
        .header;

    let err = invoices
        .create(invoice(&fixture, 0, vec![pending.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));

    let err = invoices
        .create(invoice(&fixture, 0, vec![Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));

    let err = invoices.create(invoice(&fixture, -1, vec![pending.id])).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Failed creates leave no header and no consumed number.
    let key = DocumentKind::Invoice.sequence_key(&fixture.short);
    assert_eq!(CounterRepository::new(db.clone()).peek(&key).await.unwrap(), 0);
    let listed = invoices
        .list(
            InvoiceFilter {
                company_id: Some(fixture.company_id),
                branch_id: Some(fixture.branch_id),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 0);

    common::cleanup(&db, &fixture).await.unwrap();
}

#[tokio::test]
async fn test_final_approval_returns_sisa() {
    let Some(db) = common::connect().await else {
        return;
    };
    let Some(fixture) = common::setup_funded_branch(&db, 10_000, 8_000).await else {
        return;
    };
    let saldo = SaldoRepository::new(db.clone(), TZ);
    let vouchers = VoucherRepository::new(db.clone(), TZ);
    let invoices = InvoiceRepository::new(db.clone(), TZ);

    let v = approved_vouchers(&vouchers, &fixture, &[5_000]).await;
    assert_eq!(
        saldo.get_by_company_branch(fixture.scope()).await.unwrap().closing_balance,
        5_000
    );
    let created = invoices
        .create(invoice(&fixture, 1_200, vec![v[0].id]))
        .await
        .unwrap();
    let id = created.header.id;

    // Final approval straight from pending is not allowed.
    let err = invoices
        .update_approve(fixture.scope(), &[id], InvoiceApproval::FinalApproved, ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));

    invoices
        .update_approve(fixture.scope(), &[id], InvoiceApproval::Approved, ACTOR)
        .await
        .unwrap();
    let done = invoices
        .update_approve(fixture.scope(), &[id], InvoiceApproval::FinalApproved, ACTOR)
        .await
        .unwrap();
    assert_eq!(done[0].approval().unwrap(), InvoiceApproval::FinalApproved);

    let snapshot = saldo.get_by_company_branch(fixture.scope()).await.unwrap();
    assert_eq!(snapshot.closing_balance, 6_200);
    assert!(snapshot.figures().is_consistent());

    let tag = format!("Pengembalian Dana Invoice: {}", created.header.num);
    let history = common::history_tagged(&db, &fixture, &tag).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].in_amount, 1_200);
    assert_eq!(history[0].opening_balance, 5_000);
    assert_eq!(history[0].closing_balance, 6_200);

    // Vouchers stay on the invoice.
    let header = payment_of(&vouchers, &fixture, v[0].id).await;
    assert_eq!(header.payment().unwrap(), PaymentStatus::Invoiced);

    common::cleanup(&db, &fixture).await.unwrap();
}

#[tokio::test]
async fn test_rejection_releases_vouchers() {
    let Some(db) = common::connect().await else {
        return;
    };
    let Some(fixture) = common::setup_funded_branch(&db, 10_000, 8_000).await else {
        return;
    };
    let saldo = SaldoRepository::new(db.clone(), TZ);
    let vouchers = VoucherRepository::new(db.clone(), TZ);
    let invoices = InvoiceRepository::new(db.clone(), TZ);

    let v = approved_vouchers(&vouchers, &fixture, &[1_000, 1_000]).await;
    let created = invoices
        .create(invoice(&fixture, 500, vec![v[0].id, v[1].id]))
        .await
        .unwrap();

    invoices
        .update_approve(
            fixture.scope(),
            &[created.header.id],
            InvoiceApproval::Rejected,
            ACTOR,
        )
        .await
        .unwrap();

    for voucher in &v {
        let header = payment_of(&vouchers, &fixture, voucher.id).await;
        assert_eq!(header.payment().unwrap(), PaymentStatus::Unpaid);
        assert_eq!(header.invoice_id, None);
    }
    // No refund on rejection.
    assert_eq!(
        saldo.get_by_company_branch(fixture.scope()).await.unwrap().closing_balance,
        8_000
    );

    // Released vouchers can be claimed by a new invoice.
    let again = invoices
        .create(invoice(&fixture, 0, vec![v[0].id]))
        .await
        .unwrap();
    assert_eq!(again.header.num, format!("INV{}0002", fixture.short));

    common::cleanup(&db, &fixture).await.unwrap();
}

#[tokio::test]
async fn test_update_relinks_vouchers() {
    let Some(db) = common::connect().await else {
        return;
    };
    let Some(fixture) = common::setup_funded_branch(&db, 10_000, 8_000).await else {
        return;
    };
    let vouchers = VoucherRepository::new(db.clone(), TZ);
    let invoices = InvoiceRepository::new(db.clone(), TZ);

    let v = approved_vouchers(&vouchers, &fixture, &[1_000, 2_000, 3_000]).await;
    let created = invoices
        .create(invoice(&fixture, 0, vec![v[0].id, v[1].id]))
        .await
        .unwrap();
    let id = created.header.id;
    invoices
        .update_approve(fixture.scope(), &[id], InvoiceApproval::Approved, ACTOR)
        .await
        .unwrap();

    let updated = invoices
        .update(
            fixture.scope(),
            id,
            UpdateInvoiceInput {
                invoice_type: "Reimbursement".to_string(),
                amount: 5_000,
                sisa_amount: 0,
                description: "March claims, revised".to_string(),
                invoice_date: date(),
                file: None,
                status: "Open".to_string(),
                voucher_ids: vec![v[1].id, v[2].id],
                updated_by: ACTOR.to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.header.approval().unwrap(), InvoiceApproval::Pending);
    assert_eq!(updated.details.len(), 2);

    let dropped = payment_of(&vouchers, &fixture, v[0].id).await;
    assert_eq!(dropped.payment().unwrap(), PaymentStatus::Unpaid);
    assert_eq!(dropped.invoice_id, None);
    for kept in [&v[1], &v[2]] {
        let header = payment_of(&vouchers, &fixture, kept.id).await;
        assert_eq!(header.payment().unwrap(), PaymentStatus::Invoiced);
        assert_eq!(header.invoice_id, Some(id));
    }

    let listed = invoices
        .list(
            InvoiceFilter {
                company_id: Some(fixture.company_id),
                branch_id: Some(fixture.branch_id),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 1);

    // Terminal invoices are frozen.
    invoices
        .update_approve(fixture.scope(), &[id], InvoiceApproval::Rejected, ACTOR)
        .await
        .unwrap();
    let err = invoices
        .update(
            fixture.scope(),
            id,
            UpdateInvoiceInput {
                invoice_type: "Reimbursement".to_string(),
                amount: 0,
                sisa_amount: 0,
                description: "late edit".to_string(),
                invoice_date: date(),
                file: None,
                status: "Open".to_string(),
                voucher_ids: vec![v[0].id],
                updated_by: ACTOR.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));

    common::cleanup(&db, &fixture).await.unwrap();
}
